//! Token acquisition with interactive fallback

use std::{error, fmt, sync::Arc};

use thiserror::Error;
use tollgate_resources::Scope;

use crate::{
    providers::ProviderError, AccessToken, Account, AuthRequest, AuthRequestCustomizer,
    AuthRequestOverrides, IdentityProvider, InteractionType, InteractiveMode,
    InvalidInteractionType,
};

/// The outcome of acquiring a token for an outgoing request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Acquisition {
    /// A token was obtained and should be attached to the request
    Token(AccessToken),
    /// Control has passed to the identity provider through a navigation
    ///
    /// The outgoing request is superseded and must not be completed.
    Redirected,
}

/// An error while acquiring a token for an outgoing request
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The configured interaction type cannot be used as a fallback
    #[error(transparent)]
    InvalidInteractionType(#[from] InvalidInteractionType),
    /// The identity provider failed the interactive attempt
    #[error("interactive token acquisition failed")]
    Interactive(#[source] ProviderError),
    /// The interactive attempt completed without issuing a token
    #[error("interactive token acquisition completed without an access token")]
    MissingAccessToken,
}

enum Attempt {
    Acquired(AccessToken),
    NeedsInteraction,
}

/// Acquires access tokens, silently where possible
///
/// Each acquisition first asks the identity provider for a token without
/// user interaction. If that fails, or produces no token, a single
/// interactive attempt is made using the configured [`InteractionType`].
///
/// `R` is the type of the outgoing request, which is made available to a
/// dynamic [`AuthRequestCustomizer`].
pub struct TokenAcquirer<P, R> {
    provider: Arc<P>,
    interaction_type: InteractionType,
    static_request: AuthRequestOverrides,
    customizer: Option<Arc<dyn AuthRequestCustomizer<R>>>,
}

impl<P, R> TokenAcquirer<P, R>
where
    P: IdentityProvider + 'static,
    R: 'static,
{
    /// Constructs a new acquirer
    ///
    /// The interaction type is not validated here. An unusable interaction
    /// type is reported by [`acquire_token()`][Self::acquire_token()] before
    /// the identity provider is consulted.
    pub fn new(provider: Arc<P>, interaction_type: InteractionType) -> Self {
        Self {
            provider,
            interaction_type,
            static_request: AuthRequestOverrides::default(),
            customizer: None,
        }
    }

    /// Sets static overrides applied to every token request
    pub fn with_auth_request(mut self, overrides: AuthRequestOverrides) -> Self {
        self.static_request = overrides;
        self
    }

    /// Sets a function that produces the final token request
    ///
    /// The function receives the identity provider, the outgoing request, and
    /// the request built from defaults and static overrides. Its result is
    /// used verbatim.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// use tollgate_tokens::{
    ///     AccessToken, AuthRequest, Authority, InteractionType, StaticIdentityProvider,
    ///     TokenAcquirer,
    /// };
    ///
    /// let provider = Arc::new(StaticIdentityProvider::new(AccessToken::from_static("token")));
    ///
    /// let acquirer = TokenAcquirer::<_, String>::new(provider, InteractionType::Popup)
    ///     .with_customizer(|_provider, _url: &String, base: AuthRequest| {
    ///         let authority = base
    ///             .account
    ///             .as_ref()
    ///             .map(|a| format!("https://login.example.com/{}", a.tenant_id));
    ///
    ///         AuthRequest {
    ///             authority: authority.map(Authority::new).or(base.authority),
    ///             ..base
    ///         }
    ///     });
    /// # let _ = acquirer;
    /// ```
    pub fn with_customizer<F>(self, customizer: F) -> Self
    where
        F: Fn(&dyn IdentityProvider, &R, AuthRequest) -> AuthRequest + Send + Sync + 'static,
    {
        self.with_customizer_strategy(customizer)
    }

    /// Sets a strategy that produces the final token request
    pub fn with_customizer_strategy<C>(mut self, customizer: C) -> Self
    where
        C: AuthRequestCustomizer<R> + 'static,
    {
        self.customizer = Some(Arc::new(customizer));
        self
    }

    /// The identity provider used by this acquirer
    #[inline]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// The interaction type used when silent acquisition fails
    #[inline]
    pub fn interaction_type(&self) -> InteractionType {
        self.interaction_type
    }

    /// Acquires a token carrying `scopes` on behalf of `outgoing`
    ///
    /// # Errors
    ///
    /// * [`AcquireError::InvalidInteractionType`] if the configured
    ///   interaction type is unusable. This is reported before any call to
    ///   the identity provider.
    /// * [`AcquireError::Interactive`] or [`AcquireError::MissingAccessToken`]
    ///   if silent acquisition did not produce a token and the interactive
    ///   fallback did not either.
    ///
    /// Failures of the silent attempt are never reported.
    pub async fn acquire_token(
        &self,
        scopes: Vec<Scope>,
        outgoing: &R,
    ) -> Result<Acquisition, AcquireError>
    where
        R: Sync,
    {
        let mode = self.interaction_type.interactive_mode()?;

        let request = self.build_request(scopes, outgoing);

        match self.acquire_silently(&request).await {
            Attempt::Acquired(token) => Ok(Acquisition::Token(token)),
            Attempt::NeedsInteraction => self.acquire_interactively(mode, &request).await,
        }
    }

    /// Builds the token request for an outgoing request
    ///
    /// Defaults are the required scopes and the resolved account. Static
    /// overrides are applied next, and the dynamic customizer, if any, has
    /// the final word.
    pub fn build_request(&self, scopes: Vec<Scope>, outgoing: &R) -> AuthRequest {
        let provider: &dyn IdentityProvider = &*self.provider;

        let mut request = AuthRequest::new(scopes);
        request.account = self.resolve_account();

        let request = self.static_request.apply(request);

        match &self.customizer {
            Some(customizer) => customizer.customize(provider, outgoing, request),
            None => request,
        }
    }

    fn resolve_account(&self) -> Option<Account> {
        if let Some(account) = self.provider.active_account() {
            return Some(account);
        }

        let account = self.provider.all_accounts().into_iter().next();
        if account.is_none() {
            tracing::debug!("no accounts available, attempting silent acquisition without one");
        }
        account
    }

    async fn acquire_silently(&self, request: &AuthRequest) -> Attempt {
        match self.provider.acquire_token_silent(request).await {
            Ok(result) => match result.into_access_token() {
                Some(token) => {
                    tracing::trace!("acquired access token silently");
                    Attempt::Acquired(token)
                }
                None => {
                    tracing::debug!(
                        "silent acquisition produced no access token, falling back to interaction"
                    );
                    Attempt::NeedsInteraction
                }
            },
            Err(error) => {
                tracing::debug!(
                    error = (&*error as &dyn error::Error),
                    "silent acquisition failed, falling back to interaction"
                );
                Attempt::NeedsInteraction
            }
        }
    }

    async fn acquire_interactively(
        &self,
        mode: InteractiveMode,
        request: &AuthRequest,
    ) -> Result<Acquisition, AcquireError> {
        let result = self
            .provider
            .acquire_token_interactive(mode, request)
            .await
            .map_err(|error| {
                tracing::warn!(
                    ?mode,
                    error = (&*error as &dyn error::Error),
                    "interactive acquisition failed"
                );
                AcquireError::Interactive(error)
            })?;

        match mode {
            InteractiveMode::Redirect => {
                tracing::info!("redirecting to identity provider, outgoing request superseded");
                Ok(Acquisition::Redirected)
            }
            InteractiveMode::Popup => match result.and_then(|r| r.into_access_token()) {
                Some(token) => {
                    tracing::trace!("acquired access token interactively");
                    Ok(Acquisition::Token(token))
                }
                None => {
                    tracing::warn!(?mode, "interactive acquisition produced no access token");
                    Err(AcquireError::MissingAccessToken)
                }
            },
        }
    }
}

impl<P, R> Clone for TokenAcquirer<P, R> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            interaction_type: self.interaction_type,
            static_request: self.static_request.clone(),
            customizer: self.customizer.clone(),
        }
    }
}

impl<P, R> fmt::Debug for TokenAcquirer<P, R>
where
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenAcquirer")
            .field("provider", &self.provider)
            .field("interaction_type", &self.interaction_type)
            .field("static_request", &self.static_request)
            .field("customizer", &self.customizer.as_ref().map(|_| "…"))
            .finish()
    }
}
