//! Tests for the client façade, models and credentials loading.

use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

mod models {
    use super::*;
    use gapi::drive::{Change, File};
    use gapi::people::Person;

    #[test]
    fn test_file_deserialization() {
        let json = json!({
            "id": "file123",
            "name": "document.pdf",
            "mimeType": "application/pdf",
            "webViewLink": "https://drive.google.com/file/d/file123/view",
            "size": "2048",
            "parents": ["folder1"]
        });

        let file: File = serde_json::from_value(json).unwrap();

        assert_eq!(file.id.as_deref(), Some("file123"));
        assert_eq!(file.name, "document.pdf");
        assert_eq!(file.size, Some(2048));
        assert_eq!(file.parents, vec!["folder1".to_string()]);
    }

    #[test]
    fn test_folder_without_size() {
        let json = json!({
            "id": "folder123",
            "name": "My Folder",
            "mimeType": "application/vnd.google-apps.folder"
        });

        let file: File = serde_json::from_value(json).unwrap();

        assert!(file.is_folder());
        assert_eq!(file.size, None);
        let display = file.to_string();
        assert!(display.contains("folder123"));
        assert!(display.contains("-"));
    }

    #[test]
    fn test_file_display_with_size() {
        let file = File {
            id: Some("abc123".to_string()),
            mime_type: Some("application/pdf".to_string()),
            size: Some(1048576),
            ..File::new("document.pdf", "root")
        };

        let display = format!("{}", file);
        assert!(display.contains("abc123"));
        assert!(display.contains("document.pdf"));
        assert!(display.contains("1.00 MB"));
        assert!(display.contains("application/pdf"));
    }

    #[test]
    fn test_change_for_removed_file() {
        let change: Change = serde_json::from_value(json!({
            "changeType": "file",
            "fileId": "f1",
            "removed": true,
            "time": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();

        assert!(change.removed);
        assert!(change.file.is_none());
        assert_eq!(gapi::service::Resource::id(&change), Some("f1"));
    }

    #[test]
    fn test_person_round_trip_keeps_type_field() {
        let value = json!({
            "resourceName": "people/c7",
            "emailAddresses": [{"value": "ada@example.com", "type": "work"}]
        });

        let person: Person = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(person.primary_email(), Some("ada@example.com"));
        assert_eq!(serde_json::to_value(&person).unwrap()["emailAddresses"][0]["type"], "work");
    }
}

mod credentials {
    use super::*;
    use gapi::models::ServiceAccountCredentials;
    use gapi::Authenticator;

    #[test]
    fn test_credentials_from_json() {
        let json = json!({
            "client_email": "test@project.iam.gserviceaccount.com",
            "private_key": "key",
            "token_uri": "https://oauth2.googleapis.com/token"
        });

        let creds: ServiceAccountCredentials = serde_json::from_value(json).unwrap();

        assert_eq!(creds.client_email, "test@project.iam.gserviceaccount.com");
        assert_eq!(
            creds.token_uri,
            Some("https://oauth2.googleapis.com/token".to_string())
        );
    }

    #[test]
    fn test_authenticator_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let creds_json = json!({
            "client_email": "test@project.iam.gserviceaccount.com",
            "private_key": "key"
        });
        temp_file.write_all(creds_json.to_string().as_bytes()).unwrap();

        let auth = Authenticator::from_file(temp_file.path()).unwrap();
        assert_eq!(auth.scopes().len(), 4);
    }

    #[test]
    fn test_authenticator_from_invalid_file() {
        let err = Authenticator::from_file("/nonexistent/path/credentials.json").err().unwrap();
        assert!(err.to_string().contains("credentials file"));
    }

    #[test]
    fn test_authenticator_from_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not valid json").unwrap();

        assert!(Authenticator::from_file(temp_file.path()).is_err());
    }

    #[tokio::test]
    async fn test_invalid_private_key_is_an_auth_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let creds_json = json!({
            "client_email": "test@project.iam.gserviceaccount.com",
            "private_key": "not a pem key"
        });
        temp_file.write_all(creds_json.to_string().as_bytes()).unwrap();

        let auth = Authenticator::from_file(temp_file.path()).unwrap();
        let err = auth.account().await.unwrap_err();
        assert_eq!(err.code(), gapi::ErrorCode::AuthError);
    }
}

mod error_handling {
    use gapi::{ErrorCode, GapiError};

    #[test]
    fn test_error_display() {
        let err = GapiError::Unsupported {
            service: "drive change",
            operation: "create",
        };

        assert_eq!(
            err.to_string(),
            "Operation not supported by drive change: create"
        );
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }

    #[test]
    fn test_job_failure_display() {
        let err = GapiError::JobFailed {
            code: ErrorCode::QuotaExceeded,
            message: "Rate Limit Exceeded".to_string(),
        };

        assert_eq!(err.to_string(), "Job failed (quota exceeded): Rate Limit Exceeded");
    }
}

mod google_client {
    use super::*;
    use gapi::{Account, GoogleClient};

    fn client() -> GoogleClient {
        GoogleClient::new(Account::new("ada@example.com", "test-token")).unwrap()
    }

    #[tokio::test]
    async fn test_list_files_in_folder() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "'folder1' in parents and trashed = false".into(),
            ))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "files": [
                        {"id": "f1", "name": "file1.txt"},
                        {"id": "f2", "name": "file2.txt"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let service = gapi::drive::FileService::new()
            .with_base_url(format!("{}/drive/v3", server.url()));
        let files = client()
            .fetch_all(service)
            .with_query_item("q", "'folder1' in parents and trashed = false")
            .exec()
            .await
            .into_result()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].name, "file2.txt");
    }

    #[tokio::test]
    async fn test_delete_through_client() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/tasks/v1/lists/L1/tasks/T1")
            .with_status(204)
            .create_async()
            .await;

        let service = gapi::tasks::TaskService::new("L1")
            .with_base_url(format!("{}/tasks/v1", server.url()));
        let outcome = client()
            .delete(service, vec!["T1".to_string()])
            .exec()
            .await;

        mock.assert_async().await;
        assert_eq!(outcome.into_result().unwrap(), vec!["T1".to_string()]);
    }
}
