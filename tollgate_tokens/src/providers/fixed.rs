//! An identity provider that always issues the same token

use async_trait::async_trait;

use super::{AuthenticationResult, IdentityProvider, ProviderError};
use crate::{AccessToken, Account, AuthRequest, InteractiveMode};

/// An identity provider that hands out a fixed access token
///
/// Silent acquisition and popup interaction both return the configured
/// token. A redirect reports that control has left the application.
///
/// Useful for local development against services that accept a
/// pre-issued token, and for tests.
#[derive(Clone, Debug)]
pub struct StaticIdentityProvider {
    access_token: AccessToken,
    accounts: Vec<Account>,
    active_account: Option<Account>,
}

impl StaticIdentityProvider {
    /// Constructs a provider that issues `access_token`
    pub fn new(access_token: impl Into<AccessToken>) -> Self {
        Self {
            access_token: access_token.into(),
            accounts: Vec::new(),
            active_account: None,
        }
    }

    /// Adds an account to the set of known accounts
    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    /// Selects the active account, adding it to the known accounts if needed
    pub fn with_active_account(mut self, account: Account) -> Self {
        if !self.accounts.contains(&account) {
            self.accounts.push(account.clone());
        }
        self.active_account = Some(account);
        self
    }

    fn issue(&self, request: &AuthRequest) -> AuthenticationResult {
        AuthenticationResult {
            access_token: Some(self.access_token.clone()),
            account: request.account.clone(),
            scopes: request.scopes.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn acquire_token_silent(
        &self,
        request: &AuthRequest,
    ) -> Result<AuthenticationResult, ProviderError> {
        tracing::trace!(scopes = request.scopes.len(), "issuing static access token");
        Ok(self.issue(request))
    }

    async fn acquire_token_interactive(
        &self,
        mode: InteractiveMode,
        request: &AuthRequest,
    ) -> Result<Option<AuthenticationResult>, ProviderError> {
        match mode {
            InteractiveMode::Popup => Ok(Some(self.issue(request))),
            InteractiveMode::Redirect => Ok(None),
        }
    }

    fn active_account(&self) -> Option<Account> {
        self.active_account.clone()
    }

    fn all_accounts(&self) -> Vec<Account> {
        self.accounts.clone()
    }
}

#[cfg(test)]
mod tests {
    use tollgate_resources::Scope;

    use super::*;
    use crate::TenantId;

    fn account(id: &str) -> Account {
        Account {
            home_account_id: id.to_owned(),
            local_account_id: id.to_owned(),
            environment: "login.example.com".to_owned(),
            tenant_id: TenantId::from_static("tenant"),
            username: format!("{id}@example.com"),
            name: None,
        }
    }

    #[tokio::test]
    async fn issues_the_configured_token_silently() {
        let provider = StaticIdentityProvider::new(AccessToken::from_static("static-token"));
        let request = AuthRequest::new(vec![Scope::from_static("user.read")]);

        let result = provider.acquire_token_silent(&request).await.unwrap();

        assert_eq!(
            result.into_access_token(),
            Some(AccessToken::from_static("static-token"))
        );
    }

    #[tokio::test]
    async fn redirect_leaves_without_a_result() {
        let provider = StaticIdentityProvider::new(AccessToken::from_static("static-token"));
        let request = AuthRequest::default();

        let result = provider
            .acquire_token_interactive(InteractiveMode::Redirect, &request)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn active_account_is_also_known() {
        let provider = StaticIdentityProvider::new(AccessToken::from_static("static-token"))
            .with_account(account("first"))
            .with_active_account(account("second"));

        assert_eq!(provider.active_account(), Some(account("second")));
        assert_eq!(provider.all_accounts(), vec![account("first"), account("second")]);
    }
}
