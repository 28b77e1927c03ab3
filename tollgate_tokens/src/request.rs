use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tollgate_resources::Scope;

use crate::{Account, Authority, IdentityProvider};

/// A request for an access token, as handed to an identity provider
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// The scopes the token must carry
    pub scopes: Vec<Scope>,
    /// The account to acquire the token for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    /// The authority to request the token from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<Authority>,
    /// Provider-specific fields passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthRequest {
    /// Constructs a request for the given scopes
    pub fn new(scopes: Vec<Scope>) -> Self {
        Self {
            scopes,
            ..Self::default()
        }
    }

    /// Sets the account
    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    /// Sets the authority
    pub fn with_authority(mut self, authority: Authority) -> Self {
        self.authority = Some(authority);
        self
    }
}

/// Statically configured fields that override the default request
///
/// Every field that is set replaces the corresponding field of the default
/// request. Passthrough fields are merged key by key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequestOverrides {
    /// Replaces the scopes determined from the protected resource table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<Scope>>,
    /// Replaces the resolved account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    /// Replaces the default authority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<Authority>,
    /// Additional provider-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthRequestOverrides {
    /// Applies these overrides on top of `base`
    pub fn apply(&self, mut base: AuthRequest) -> AuthRequest {
        if let Some(scopes) = &self.scopes {
            base.scopes = scopes.clone();
        }
        if let Some(account) = &self.account {
            base.account = Some(account.clone());
        }
        if let Some(authority) = &self.authority {
            base.authority = Some(authority.clone());
        }
        for (key, value) in &self.extra {
            base.extra.insert(key.clone(), value.clone());
        }
        base
    }
}

/// A strategy that shapes the token request for an outgoing request
///
/// `R` is the type of the outgoing request. The strategy receives the
/// identity provider, the outgoing request, and the request built so far,
/// and returns the request to use in its place.
///
/// Static [`AuthRequestOverrides`] are the constant form of this strategy.
/// Any `Fn(&dyn IdentityProvider, &R, AuthRequest) -> AuthRequest` closure
/// is a dynamic form.
pub trait AuthRequestCustomizer<R>: Send + Sync {
    /// Produces the token request to use
    fn customize(
        &self,
        provider: &dyn IdentityProvider,
        outgoing: &R,
        base: AuthRequest,
    ) -> AuthRequest;
}

impl<R> AuthRequestCustomizer<R> for AuthRequestOverrides {
    #[inline]
    fn customize(&self, _: &dyn IdentityProvider, _: &R, base: AuthRequest) -> AuthRequest {
        self.apply(base)
    }
}

impl<R, F> AuthRequestCustomizer<R> for F
where
    F: Fn(&dyn IdentityProvider, &R, AuthRequest) -> AuthRequest + Send + Sync,
{
    #[inline]
    fn customize(
        &self,
        provider: &dyn IdentityProvider,
        outgoing: &R,
        base: AuthRequest,
    ) -> AuthRequest {
        self(provider, outgoing, base)
    }
}
