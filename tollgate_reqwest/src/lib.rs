//! Middleware to attach access tokens to requests bound for protected resources
//!
//! When using [`ClientWithMiddleware`](reqwest_middleware::ClientWithMiddleware),
//! include the [`AccessTokenMiddleware`] in the middleware stack. For each
//! outbound request, the middleware consults the configured
//! [`ProtectedResourceMap`]. Requests that match a protected resource have
//! a token carrying the required scopes acquired from an
//! [`IdentityProvider`] and attached as an `Authorization: Bearer` header.
//! All other requests are forwarded unchanged.
//!
//! If a request for a protected resource already has specified an
//! `Authorization` header value by the time that the middleware executes,
//! the existing value will be left in place, allowing overrides to be
//! specified as required. A misconfigured interaction type is still
//! reported for such requests.
//!
//! ```
//! use std::sync::Arc;
//! use reqwest::Client;
//! use reqwest_middleware::ClientBuilder;
//! use tollgate_reqwest::{AccessTokenMiddleware, InterceptorConfig};
//! use tollgate_resources::{ProtectedResourceMap, Scope};
//! use tollgate_tokens::{AccessToken, InteractionType, StaticIdentityProvider};
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let provider = Arc::new(StaticIdentityProvider::new(AccessToken::from_static("token")));
//!
//! let config = InterceptorConfig::new(InteractionType::Popup).with_protected_resource_map(
//!     ProtectedResourceMap::new()
//!         .with_resource("https://graph.microsoft.com/v1.0/me", vec![Scope::from_static("user.read")]),
//! );
//!
//! let client = ClientBuilder::new(Client::default())
//!     .with(AccessTokenMiddleware::new(provider, config))
//!     .build();
//!
//! let req = client
//!     .get("https://graph.microsoft.com/v1.0/me");
//! # async move { req
//!     .send()
//!     .await
//!     .unwrap();
//! # };
//! # }
//! ```
//!
//! The middleware can also be configured to intercept requests only
//! conditionally. A request that does not satisfy the predicate is forwarded
//! unchanged, regardless of the resource map.
//!
//! ```
//! use std::sync::Arc;
//! use tollgate_reqwest::{AccessTokenMiddleware, HttpsOnly, InterceptorConfig};
//! use tollgate_tokens::{AccessToken, InteractionType, StaticIdentityProvider};
//! # let provider = Arc::new(StaticIdentityProvider::new(AccessToken::from_static("token")));
//!
//! AccessTokenMiddleware::new(provider, InterceptorConfig::new(InteractionType::Redirect))
//!     .with_predicate(HttpsOnly);
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use std::{fmt, future, sync::Arc};

use bytes::{BufMut, BytesMut};
use predicates::{constant::BooleanPredicate, prelude::*, reflection};
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use thiserror::Error;
use tollgate_resources::{match_scopes_to_endpoint, ProtectedResourceMap, Scope};
use tollgate_tokens::{
    AccessToken, AcquireError, Acquisition, AuthRequest, AuthRequestCustomizer, IdentityProvider,
    TokenAcquirer,
};
use url::Url;

mod config;

pub use config::{ConfigError, InterceptorConfig};

/// A middleware that injects access tokens into requests for protected resources
pub struct AccessTokenMiddleware<P, Q = BooleanPredicate> {
    acquirer: TokenAcquirer<P, Request>,
    resources: Arc<ProtectedResourceMap>,
    origin: Option<Url>,
    predicate: Q,
}

impl<P> AccessTokenMiddleware<P>
where
    P: IdentityProvider + 'static,
{
    /// Construct a new middleware from an identity provider and configuration
    ///
    /// By default, every request is considered for interception. To narrow
    /// this, provide a predicate with [`with_predicate()`][Self::with_predicate()].
    pub fn new(provider: Arc<P>, config: InterceptorConfig) -> Self {
        let mut acquirer = TokenAcquirer::new(provider, config.interaction_type);
        if let Some(overrides) = config.auth_request {
            acquirer = acquirer.with_auth_request(overrides);
        }

        Self {
            acquirer,
            resources: Arc::new(config.protected_resource_map),
            origin: config.origin,
            predicate: predicate::always(),
        }
    }
}

impl<P, Q> AccessTokenMiddleware<P, Q>
where
    P: IdentityProvider + 'static,
{
    /// Replaces the current predicate with a custom predicate
    pub fn with_predicate<R>(self, predicate: R) -> AccessTokenMiddleware<P, R> {
        AccessTokenMiddleware {
            acquirer: self.acquirer,
            resources: self.resources,
            origin: self.origin,
            predicate,
        }
    }

    /// Sets a function that produces the token request for each outgoing request
    ///
    /// The function has the final word over the token request, after the
    /// static `authRequest` overrides from the configuration are applied.
    pub fn with_customizer<F>(mut self, customizer: F) -> Self
    where
        F: Fn(&dyn IdentityProvider, &Request, AuthRequest) -> AuthRequest
            + Send
            + Sync
            + 'static,
    {
        self.acquirer = self.acquirer.with_customizer(customizer);
        self
    }

    /// Sets a strategy that produces the token request for each outgoing request
    pub fn with_customizer_strategy<C>(mut self, customizer: C) -> Self
    where
        C: AuthRequestCustomizer<Request> + 'static,
    {
        self.acquirer = self.acquirer.with_customizer_strategy(customizer);
        self
    }

    /// The token acquirer used by this middleware
    #[inline]
    pub fn acquirer(&self) -> &TokenAcquirer<P, Request> {
        &self.acquirer
    }

    /// The protected resources known to this middleware
    #[inline]
    pub fn protected_resources(&self) -> &ProtectedResourceMap {
        &self.resources
    }

    /// The scopes a token for `req` must carry, if it requires one at all
    pub fn required_scopes(&self, req: &Request) -> Option<Vec<Scope>> {
        let candidates = self.candidate_urls(req.url());
        match_scopes_to_endpoint(&self.resources, &candidates, req.method().as_str())
    }

    /// The forms of `url` to test against the protected resource map
    ///
    /// These are the absolute URL, and its path and query when the URL is
    /// on the configured application origin. Each form is given both with
    /// and without a trailing slash on its path.
    pub fn candidate_urls(&self, url: &Url) -> Vec<String> {
        let mut absolute = url.clone();
        absolute.set_fragment(None);

        let mut forms = vec![String::from(absolute)];

        if self
            .origin
            .as_ref()
            .is_some_and(|origin| origin.origin() == url.origin())
        {
            let mut relative = url.path().to_owned();
            if let Some(query) = url.query() {
                relative.push('?');
                relative.push_str(query);
            }
            forms.push(relative);
        }

        let mut candidates = Vec::with_capacity(forms.len() * 2);
        for form in forms {
            let toggled = toggle_trailing_slash(&form);
            for candidate in std::iter::once(form).chain(toggled) {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }
}

fn toggle_trailing_slash(form: &str) -> Option<String> {
    let (path, query) = match form.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (form, None),
    };

    let mut toggled = match path.strip_suffix('/') {
        Some("") => return None,
        Some(trimmed) => trimmed.to_owned(),
        None => format!("{path}/"),
    };

    if let Some(query) = query {
        toggled.push('?');
        toggled.push_str(query);
    }

    Some(toggled)
}

fn bearer_header(token: &AccessToken) -> std::result::Result<header::HeaderValue, InterceptError> {
    let mut header_value = BytesMut::with_capacity(token.as_str().len() + 7);
    header_value.put_slice(b"Bearer ");
    header_value.put_slice(token.as_str().as_bytes());
    let mut value = header::HeaderValue::from_maybe_shared(header_value.freeze())?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait::async_trait]
impl<P, Q> Middleware for AccessTokenMiddleware<P, Q>
where
    P: IdentityProvider + 'static,
    Q: Predicate<Request> + Send + Sync + 'static,
{
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if !self.predicate.eval(&req) {
            return next.run(req, extensions).await;
        }

        let Some(scopes) = self.required_scopes(&req) else {
            tracing::trace!(url = %req.url(), "not a protected resource");
            return next.run(req, extensions).await;
        };

        if let Err(err) = self.acquirer.interaction_type().interactive_mode() {
            tracing::warn!(url = %req.url(), error = %err, "rejecting protected request");
            return Err(reqwest_middleware::Error::middleware(
                InterceptError::from(AcquireError::from(err)),
            ));
        }

        if req.headers().contains_key(header::AUTHORIZATION) {
            tracing::trace!(url = %req.url(), "request already carries authorization");
            return next.run(req, extensions).await;
        }

        tracing::trace!(
            url = %req.url(),
            method = %req.method(),
            ?scopes,
            "request targets a protected resource"
        );

        let acquisition = self
            .acquirer
            .acquire_token(scopes, &req)
            .await
            .map_err(|err| reqwest_middleware::Error::middleware(InterceptError::from(err)))?;

        match acquisition {
            Acquisition::Token(token) => {
                let value = bearer_header(&token).map_err(reqwest_middleware::Error::middleware)?;
                req.headers_mut().insert(header::AUTHORIZATION, value);
                tracing::trace!(url = %req.url(), "attached access token");
            }
            Acquisition::Redirected => {
                // Navigation to the identity provider supersedes this request
                return future::pending().await;
            }
        }

        next.run(req, extensions).await
    }
}

impl<P, Q> Clone for AccessTokenMiddleware<P, Q>
where
    Q: Clone,
{
    fn clone(&self) -> Self {
        Self {
            acquirer: self.acquirer.clone(),
            resources: Arc::clone(&self.resources),
            origin: self.origin.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<P, Q> fmt::Debug for AccessTokenMiddleware<P, Q>
where
    P: fmt::Debug,
    Q: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenMiddleware")
            .field("acquirer", &self.acquirer)
            .field("resources", &self.resources)
            .field("origin", &self.origin)
            .field("predicate", &self.predicate)
            .finish()
    }
}

/// An error that prevented a request for a protected resource from being sent
#[derive(Debug, Error)]
pub enum InterceptError {
    /// No access token could be acquired
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    /// The acquired access token cannot be represented in a header
    #[error("access token is not a valid header value")]
    InvalidHeader(#[from] header::InvalidHeaderValue),
}

impl InterceptError {
    /// The stable code identifying a misconfiguration, if this is one
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Acquire(AcquireError::InvalidInteractionType(err)) => Some(err.error_code()),
            _ => None,
        }
    }
}

/// Only attach an access token if the request is being sent over HTTPS
#[derive(Clone, Copy, Debug)]
pub struct HttpsOnly;

impl Predicate<Request> for HttpsOnly {
    #[inline]
    fn eval(&self, req: &Request) -> bool {
        req.url().scheme() == "https"
    }

    fn find_case(&self, expected: bool, req: &Request) -> Option<reflection::Case> {
        let result = self.eval(req);
        if result != expected {
            Some(
                reflection::Case::new(Some(self), result).add_product(reflection::Product::new(
                    "scheme",
                    req.url().scheme().to_owned(),
                )),
            )
        } else {
            None
        }
    }
}

impl reflection::PredicateReflection for HttpsOnly {}
impl fmt::Display for HttpsOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scheme is https")
    }
}
