//! Job pipeline tests against a scripted transport.

mod support;

use std::sync::{Arc, Mutex};

use gapi::calendar::{Calendar, CalendarService, Event, EventService};
use gapi::drive::{AboutService, ChangeService, FileService};
use gapi::job::{CreateJob, DeleteJob, FetchJob, ModifyJob};
use gapi::people::PersonService;
use gapi::tasks::{Task, TaskService};
use gapi::transport::Reply;
use gapi::{Account, ErrorCode, GoogleClient, JobState};
use reqwest::header::{AUTHORIZATION, IF_MATCH};
use reqwest::{Method, StatusCode};
use serde_json::json;

use support::{account, ScriptedTransport};

fn json_reply(value: serde_json::Value) -> Reply {
    Reply::json(value.to_string())
}

fn calendar(id: &str, title: &str) -> Calendar {
    Calendar {
        id: Some(id.to_string()),
        ..Calendar::new(title)
    }
}

fn query_value(request: &gapi::Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

mod batch {
    use super::*;

    #[tokio::test]
    async fn modify_returns_echoed_objects_in_input_order() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"id": "A", "summary": "Work", "etag": "e1"})),
            json_reply(json!({"id": "B", "summary": "Home", "etag": "e2"})),
        ]);

        let outcome = ModifyJob::modify(
            account(),
            transport.clone(),
            CalendarService::new(),
            vec![calendar("A", "Work"), calendar("B", "Home")],
        )
        .exec()
        .await;

        assert_eq!(outcome.error(), ErrorCode::NoError);
        assert_eq!(
            outcome.items(),
            &[
                Calendar {
                    etag: Some("e1".to_string()),
                    ..calendar("A", "Work")
                },
                Calendar {
                    etag: Some("e2".to_string()),
                    ..calendar("B", "Home")
                },
            ]
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::PUT);
        assert!(requests[0].url.path().ends_with("/calendars/A"));
        assert!(requests[1].url.path().ends_with("/calendars/B"));
        assert_eq!(
            requests[0].headers.get(AUTHORIZATION).unwrap(),
            "Bearer test-token"
        );
        assert!(requests[0].headers.get(IF_MATCH).is_none());
    }

    #[tokio::test]
    async fn create_aborts_remaining_items_on_first_error() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"id": "T1", "title": "one"})),
            Reply::new(
                StatusCode::NOT_FOUND,
                json!({"error": {"code": 404, "message": "Task list not found"}}).to_string(),
            )
            .with_content_type("application/json"),
            json_reply(json!({"id": "T3", "title": "three"})),
        ]);

        let outcome = CreateJob::create(
            account(),
            transport.clone(),
            TaskService::new("L1"),
            ["one", "two", "three"].map(Task::new),
        )
        .exec()
        .await;

        assert_eq!(outcome.error(), ErrorCode::NotFound);
        assert_eq!(outcome.error_string(), "Task list not found");
        assert_eq!(outcome.items().len(), 1);
        assert_eq!(outcome.items()[0].id.as_deref(), Some("T1"));
        assert_eq!(outcome.requests_sent(), 2);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.requests()[0].method, Method::POST);
    }

    #[tokio::test]
    async fn modify_stops_on_non_json_reply() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"id": "A", "summary": "Work"})),
            Reply::new(StatusCode::OK, "<html/>").with_content_type("text/html"),
        ]);

        let outcome = ModifyJob::modify(
            account(),
            transport.clone(),
            CalendarService::new(),
            vec![calendar("A", "Work"), calendar("B", "Home"), calendar("C", "Gym")],
        )
        .exec()
        .await;

        assert_eq!(outcome.error(), ErrorCode::InvalidResponse);
        assert_eq!(outcome.error_string(), "Invalid response content type");
        assert_eq!(outcome.items().len(), 1);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn modify_without_id_fails_before_sending() {
        let transport = ScriptedTransport::empty();

        let outcome = ModifyJob::modify(
            account(),
            transport.clone(),
            CalendarService::new(),
            vec![Calendar::new("No id")],
        )
        .exec()
        .await;

        assert_eq!(outcome.error(), ErrorCode::BadRequest);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn etag_check_sends_if_match() {
        let transport =
            ScriptedTransport::new([json_reply(json!({"id": "A", "summary": "Work", "etag": "e2"}))]);
        let input = Calendar {
            etag: Some("\"e1\"".to_string()),
            ..calendar("A", "Work")
        };

        let outcome = ModifyJob::modify(account(), transport.clone(), CalendarService::new(), vec![input])
            .with_etag_check(true)
            .exec()
            .await;

        assert!(outcome.is_success());
        assert_eq!(transport.requests()[0].headers.get(IF_MATCH).unwrap(), "\"e1\"");
    }

    #[tokio::test]
    async fn precondition_failure_is_a_conflict() {
        let transport = ScriptedTransport::new([Reply::new(StatusCode::PRECONDITION_FAILED, "")]);

        let outcome = ModifyJob::modify(
            account(),
            transport,
            CalendarService::new(),
            vec![calendar("A", "Work")],
        )
        .with_etag_check(true)
        .exec()
        .await;

        assert_eq!(outcome.error(), ErrorCode::Conflict);
        assert_eq!(outcome.error_string(), "Precondition Failed");
    }

    #[tokio::test]
    async fn create_reports_progress_per_item() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"id": "T1", "title": "one"})),
            json_reply(json!({"id": "T2", "title": "two"})),
        ]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let outcome = CreateJob::create(
            account(),
            transport,
            TaskService::new("L1"),
            vec![Task::new("one"), Task::new("two")],
        )
        .on_progress(move |done, total| sink.lock().unwrap().push((done, total)))
        .exec()
        .await;

        assert!(outcome.is_success());
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn empty_batch_finishes_without_requests() {
        let transport = ScriptedTransport::empty();

        let outcome = CreateJob::create(account(), transport.clone(), TaskService::new("L1"), Vec::<Task>::new())
            .exec()
            .await;

        assert!(outcome.is_success());
        assert!(outcome.items().is_empty());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn delete_yields_deleted_ids() {
        let transport = ScriptedTransport::new([
            Reply::new(StatusCode::NO_CONTENT, ""),
            Reply::new(StatusCode::NO_CONTENT, ""),
        ]);

        let outcome = DeleteJob::delete(
            account(),
            transport.clone(),
            EventService::new("primary"),
            vec!["ev1".to_string(), "ev2".to_string()],
        )
        .exec()
        .await;

        assert_eq!(outcome.into_result().unwrap(), vec!["ev1", "ev2"]);
        let requests = transport.requests();
        assert!(requests.iter().all(|r| r.method == Method::DELETE));
        assert!(requests[1].url.path().ends_with("/events/ev2"));
    }

    #[tokio::test]
    async fn delete_of_missing_object_is_an_error() {
        let transport = ScriptedTransport::new([
            Reply::new(StatusCode::NO_CONTENT, ""),
            Reply::new(StatusCode::GONE, ""),
        ]);

        let outcome = DeleteJob::delete(
            account(),
            transport,
            EventService::new("primary"),
            vec!["ev1".to_string(), "ev2".to_string(), "ev3".to_string()],
        )
        .exec()
        .await;

        assert_eq!(outcome.error(), ErrorCode::NotFound);
        assert_eq!(outcome.items(), &["ev1".to_string()]);
        assert_eq!(outcome.requests_sent(), 2);
    }
}

mod fetch {
    use super::*;

    #[tokio::test]
    async fn follows_page_tokens_until_the_last_page() {
        let transport = ScriptedTransport::new([
            json_reply(json!({
                "kind": "calendar#events",
                "items": [{"id": "e1"}, {"id": "e2"}],
                "nextPageToken": "tok2"
            })),
            json_reply(json!({"kind": "calendar#events", "items": [{"id": "e3"}]})),
        ]);

        let outcome = FetchJob::fetch_all(account(), transport.clone(), EventService::new("primary"))
            .with_page_size(2)
            .exec()
            .await;

        assert!(outcome.is_success());
        let ids: Vec<_> = outcome
            .items()
            .iter()
            .map(|e: &Event| e.id.clone().unwrap())
            .collect();
        assert_eq!(ids, ["e1", "e2", "e3"]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(query_value(&requests[0], "pageToken"), None);
        assert_eq!(query_value(&requests[1], "pageToken").as_deref(), Some("tok2"));
        assert_eq!(query_value(&requests[1], "maxResults").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn keeps_items_of_pages_before_a_bad_reply() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"items": [{"id": "e1"}, {"id": "e2"}], "nextPageToken": "tok2"})),
            Reply::new(StatusCode::OK, "<feed/>").with_content_type("application/atom+xml"),
        ]);

        let outcome = FetchJob::fetch_all(account(), transport, EventService::new("primary"))
            .exec()
            .await;

        assert_eq!(outcome.error(), ErrorCode::InvalidResponse);
        assert_eq!(outcome.items().len(), 2);
        assert_eq!(outcome.requests_sent(), 2);
    }

    #[tokio::test]
    async fn next_link_is_used_verbatim() {
        let transport = ScriptedTransport::new([
            json_reply(json!({
                "files": [{"id": "f1", "name": "a"}],
                "nextLink": "https://example.com/next?cursor=9"
            })),
            json_reply(json!({"files": []})),
        ]);

        let outcome = FetchJob::fetch_all(account(), transport.clone(), FileService::new())
            .exec()
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.items().len(), 1);
        assert_eq!(
            transport.requests()[1].url.as_str(),
            "https://example.com/next?cursor=9"
        );
    }

    #[tokio::test]
    async fn continuation_replaces_the_start_token() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"changes": [{"fileId": "f1", "removed": true}], "nextPageToken": "200"})),
            json_reply(json!({"changes": [], "newStartPageToken": "201"})),
        ]);

        let outcome = FetchJob::fetch_all(account(), transport.clone(), ChangeService::new("100"))
            .exec()
            .await;

        assert!(outcome.is_success());
        assert!(outcome.items()[0].removed);
        let second = &transport.requests()[1];
        let tokens: Vec<_> = second
            .url
            .query_pairs()
            .filter(|(k, _)| k == "pageToken")
            .collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].1, "200");
    }

    #[tokio::test]
    async fn max_results_truncates_and_stops() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"items": [{"id": "e1"}, {"id": "e2"}], "nextPageToken": "tok2"})),
            json_reply(json!({"items": [{"id": "e3"}, {"id": "e4"}], "nextPageToken": "tok3"})),
        ]);

        let outcome = FetchJob::fetch_all(account(), transport.clone(), EventService::new("primary"))
            .with_max_results(3)
            .exec()
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.items().len(), 3);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn zero_max_results_sends_nothing() {
        let transport = ScriptedTransport::empty();

        let outcome = FetchJob::fetch_all(account(), transport.clone(), EventService::new("primary"))
            .with_max_results(0)
            .exec()
            .await;

        assert!(outcome.is_success());
        assert!(outcome.items().is_empty());
        assert_eq!(outcome.requests_sent(), 0);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn about_is_a_single_object() {
        let transport = ScriptedTransport::new([json_reply(json!({
            "user": {"displayName": "Ada", "emailAddress": "ada@example.com", "me": true},
            "storageQuota": {"limit": "16106127360", "usage": "1073741824"},
            "maxUploadSize": "5242880000000"
        }))]);

        let outcome =
            FetchJob::fetch_one(account(), transport.clone(), AboutService::new(), AboutService::ID)
                .exec()
                .await;

        let about = outcome.into_result().unwrap().remove(0);
        assert_eq!(about.user.unwrap().email_address.as_deref(), Some("ada@example.com"));
        assert_eq!(about.storage_quota.unwrap().remaining(), Some(15_032_385_536));
        assert_eq!(about.max_upload_size, Some(5_242_880_000_000));

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url.path(), "/drive/v3/about");
        assert!(query_value(request, "fields").unwrap().contains("storageQuota"));
    }

    #[tokio::test]
    async fn start_page_token_starts_a_change_listing() {
        let transport = ScriptedTransport::new([
            json_reply(json!({"kind": "drive#startPageToken", "startPageToken": "4711"})),
            json_reply(json!({"changes": [{"fileId": "f9", "removed": false}], "newStartPageToken": "4712"})),
        ]);
        let client = GoogleClient::with_transport(
            Account::new("ada@example.com", "test-token"),
            transport.clone(),
        );

        let token = client.start_page_token().await.unwrap();
        assert_eq!(token, "4711");
        let changes = client.list_changes(&token).await.unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file_id.as_deref(), Some("f9"));
        let requests = transport.requests();
        assert_eq!(requests[0].url.path(), "/drive/v3/changes/startPageToken");
        assert_eq!(requests[1].url.path(), "/drive/v3/changes");
        assert_eq!(query_value(&requests[1], "pageToken").as_deref(), Some("4711"));
    }

    #[tokio::test]
    async fn fetch_one_decodes_a_single_object() {
        let transport = ScriptedTransport::new([json_reply(json!({
            "resourceName": "people/c1",
            "etag": "%EgU",
            "names": [{"displayName": "Ada Lovelace"}]
        }))]);

        let outcome = FetchJob::fetch_one(account(), transport.clone(), PersonService::new(), "people/c1")
            .exec()
            .await;

        let people = outcome.into_result().unwrap();
        assert_eq!(people[0].display_name(), Some("Ada Lovelace"));
        assert!(transport.requests()[0].url.path().ends_with("/people/c1"));
    }

    #[tokio::test]
    async fn query_items_are_sent() {
        let transport = ScriptedTransport::new([json_reply(json!({"files": []}))]);

        let outcome = FetchJob::fetch_all(account(), transport.clone(), FileService::new())
            .with_query_item("q", "trashed = false")
            .exec()
            .await;

        assert!(outcome.is_success());
        assert_eq!(
            query_value(&transport.requests()[0], "q").as_deref(),
            Some("trashed = false")
        );
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn unauthorized_reply_is_an_auth_error() {
        let transport = ScriptedTransport::new([Reply::new(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"code": 401, "message": "Invalid Credentials", "status": "UNAUTHENTICATED"}})
                .to_string(),
        )]);

        let outcome = FetchJob::fetch_all(account(), transport, CalendarService::new())
            .exec()
            .await;

        assert_eq!(outcome.error(), ErrorCode::AuthError);
        assert_eq!(outcome.error_string(), "Invalid Credentials");
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthError);
    }

    #[tokio::test]
    async fn rate_limit_is_reported_without_retry() {
        let transport = ScriptedTransport::new([Reply::new(StatusCode::TOO_MANY_REQUESTS, "")]);

        let outcome = FetchJob::fetch_all(account(), transport.clone(), CalendarService::new())
            .exec()
            .await;

        assert_eq!(outcome.error(), ErrorCode::QuotaExceeded);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_a_network_error() {
        let transport = ScriptedTransport::empty().then_fail("connection reset");

        let outcome = FetchJob::fetch_all(account(), transport, CalendarService::new())
            .exec()
            .await;

        assert_eq!(outcome.error(), ErrorCode::NetworkError);
        assert!(outcome.error_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn unsupported_operation_fails_without_requests() {
        let transport = ScriptedTransport::empty();

        let outcome = FetchJob::fetch_one(account(), transport.clone(), ChangeService::new("1"), "x")
            .exec()
            .await;

        assert_eq!(outcome.error(), ErrorCode::BadRequest);
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn idle_job_sends_nothing() {
        let transport = ScriptedTransport::new([json_reply(json!({"items": []}))]);

        let job = FetchJob::fetch_all(account(), transport.clone(), CalendarService::new());
        assert_eq!(job.state(), JobState::Idle);
        drop(job);

        assert_eq!(transport.request_count(), 0);
    }
}
