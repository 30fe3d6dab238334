//! Google account holding the OAuth tokens used by jobs.

/// An authenticated Google account.
///
/// Jobs share an account through `Arc<Account>` and only ever read the
/// access token from it. Obtaining and refreshing tokens is the caller's
/// business (see [`crate::Authenticator`] for a service-account source).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    account_name: String,
    access_token: String,
    refresh_token: String,
    scopes: Vec<String>,
    scopes_changed: bool,
}

impl Account {
    pub fn new(account_name: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Create an account with a refresh token and a set of granted scopes.
    pub fn with_tokens(
        account_name: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            scopes,
            scopes_changed: false,
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn set_account_name(&mut self, account_name: impl Into<String>) {
        self.account_name = account_name.into();
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = access_token.into();
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn set_refresh_token(&mut self, refresh_token: impl Into<String>) {
        self.refresh_token = refresh_token.into();
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn set_scopes(&mut self, scopes: Vec<String>) {
        self.scopes = scopes;
        self.scopes_changed = true;
    }

    /// Add a scope if it is not granted yet.
    pub fn add_scope(&mut self, scope: impl Into<String>) {
        let scope = scope.into();
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
            self.scopes_changed = true;
        }
    }

    pub fn remove_scope(&mut self, scope: &str) {
        if let Some(pos) = self.scopes.iter().position(|s| s == scope) {
            self.scopes.remove(pos);
            self.scopes_changed = true;
        }
    }

    /// Whether the scope list changed since construction, meaning the
    /// tokens must be re-authorized before they cover the new scopes.
    pub fn scopes_changed(&self) -> bool {
        self.scopes_changed
    }
}
