//! Service account authentication for Google APIs.
//!
//! Produces [`Account`]s carrying a fresh access token. Jobs never refresh
//! tokens themselves; callers fetch a new account when a job reports
//! `AuthError`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::account::Account;
use crate::error::{GapiError, Result};
use crate::models::{ServiceAccountCredentials, TokenResponse};

/// Google OAuth2 token endpoint.
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// Scopes of the services this crate talks to.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const CONTACTS_SCOPE: &str = "https://www.googleapis.com/auth/contacts";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const TASKS_SCOPE: &str = "https://www.googleapis.com/auth/tasks";

/// JWT claims for service account authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: u64,
    iat: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

/// Token source backed by service account credentials.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<ServiceAccountCredentials>,
    scopes: Vec<String>,
    subject: Option<String>,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl Authenticator {
    /// Create an authenticator from a service account JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let credentials: ServiceAccountCredentials = serde_json::from_str(&content)?;
        Ok(Self::new(credentials))
    }

    /// Create an authenticator requesting every scope this crate uses.
    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
            scopes: [CALENDAR_SCOPE, CONTACTS_SCOPE, DRIVE_SCOPE, TASKS_SCOPE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            subject: None,
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Request exactly `scopes` instead of the defaults.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Impersonate `subject` through domain-wide delegation.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// An account holding a valid access token.
    pub async fn account(&self) -> Result<Account> {
        let token = self.access_token().await?;
        let name = self
            .subject
            .clone()
            .unwrap_or_else(|| self.credentials.client_email.clone());
        Ok(Account::with_tokens(name, token, "", self.scopes.clone()))
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                // 60 second margin before expiration
                let buffer = Duration::from_secs(60);
                if token.expires_at > SystemTime::now() + buffer {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.exchange_token().await?;
        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token.clone());
        }
        Ok(new_token.access_token)
    }

    fn token_uri(&self) -> &str {
        self.credentials.token_uri.as_deref().unwrap_or(TOKEN_URI)
    }

    fn claims(&self, now: u64) -> Claims {
        Claims {
            iss: self.credentials.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.token_uri().to_string(),
            iat: now,
            exp: now + 3600,
            sub: self.subject.clone(),
        }
    }

    /// Exchange a signed JWT assertion for an access token.
    async fn exchange_token(&self) -> Result<CachedToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GapiError::AuthenticationError(e.to_string()))?
            .as_secs();

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        let jwt = encode(&header, &self.claims(now), &key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];

        debug!(account = %self.credentials.client_email, "exchanging token");
        let response = self
            .client
            .post(self.token_uri())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GapiError::TokenExchangeError(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        let expires_at = SystemTime::now() + Duration::from_secs(token_response.expires_in);

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}
