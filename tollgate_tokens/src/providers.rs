//! Identity providers

use std::{error, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tollgate_resources::Scope;

use crate::{AccessToken, Account, AuthRequest, InteractiveMode};

pub mod fixed;

pub use fixed::StaticIdentityProvider;

/// An error reported by an identity provider
pub type ProviderError = Box<dyn error::Error + Send + Sync + 'static>;

/// The outcome of a successful exchange with an identity provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResult {
    /// The issued access token, if any
    pub access_token: Option<AccessToken>,
    /// The account the token was issued for
    #[serde(default)]
    pub account: Option<Account>,
    /// The scopes granted
    #[serde(default)]
    pub scopes: Vec<Scope>,
}

impl AuthenticationResult {
    /// Constructs a result carrying an access token
    pub fn with_access_token(access_token: AccessToken) -> Self {
        Self {
            access_token: Some(access_token),
            ..Self::default()
        }
    }

    /// Takes the access token, treating an empty token as absent
    pub fn into_access_token(self) -> Option<AccessToken> {
        self.access_token.filter(|token| !token.as_str().is_empty())
    }
}

/// A client of an identity provider able to issue access tokens
///
/// Implementations are shared between concurrent requests. Account lookups
/// should be cheap and must not block. If an implementation supports
/// [`InteractiveMode::Popup`], it is responsible for serializing concurrent
/// prompts.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Attempts to obtain a token without user interaction
    async fn acquire_token_silent(
        &self,
        request: &AuthRequest,
    ) -> Result<AuthenticationResult, ProviderError>;

    /// Obtains a token by interacting with the user
    ///
    /// Returns `None` when control has been handed to the identity provider
    /// by navigating away, as happens with [`InteractiveMode::Redirect`].
    async fn acquire_token_interactive(
        &self,
        mode: InteractiveMode,
        request: &AuthRequest,
    ) -> Result<Option<AuthenticationResult>, ProviderError>;

    /// The currently selected account, if one has been chosen
    fn active_account(&self) -> Option<Account>;

    /// Every account known to the provider
    fn all_accounts(&self) -> Vec<Account>;
}

macro_rules! delegate_impls {
    ($($ty:ty)*) => {
        $(
            #[async_trait]
            impl<T> IdentityProvider for $ty
            where
                T: IdentityProvider + ?Sized,
            {
                #[inline]
                async fn acquire_token_silent(
                    &self,
                    request: &AuthRequest,
                ) -> Result<AuthenticationResult, ProviderError> {
                    T::acquire_token_silent(self, request).await
                }

                #[inline]
                async fn acquire_token_interactive(
                    &self,
                    mode: InteractiveMode,
                    request: &AuthRequest,
                ) -> Result<Option<AuthenticationResult>, ProviderError> {
                    T::acquire_token_interactive(self, mode, request).await
                }

                #[inline]
                fn active_account(&self) -> Option<Account> {
                    T::active_account(self)
                }

                #[inline]
                fn all_accounts(&self) -> Vec<Account> {
                    T::all_accounts(self)
                }
            }
        )*
    }
}

delegate_impls!(
    &'_ T
    Box<T>
    Arc<T>
);
