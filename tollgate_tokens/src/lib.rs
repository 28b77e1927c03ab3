//! Silent-first acquisition of access tokens for outgoing requests
//!
//! An application that calls protected APIs on behalf of a signed-in user
//! generally wants to obtain tokens without bothering that user. Most of the
//! time the identity provider can issue a token silently, from a cache or a
//! refresh token. When it can't, the user has to be involved, either in a
//! popup that hands control back once a token is issued, or by navigating
//! away to the identity provider altogether.
//!
//! This crate captures that flow in a [`TokenAcquirer`]. It resolves the
//! account to act for, builds an [`AuthRequest`] from defaults, static
//! [`AuthRequestOverrides`] and an optional dynamic
//! [`AuthRequestCustomizer`], and asks an [`IdentityProvider`] for a token.
//! Silent failures are never surfaced; they only trigger the interactive
//! fallback configured through [`InteractionType`].
//!
//! ```
//! use std::sync::Arc;
//! use tollgate_resources::Scope;
//! use tollgate_tokens::{
//!     AccessToken, Acquisition, InteractionType, StaticIdentityProvider, TokenAcquirer,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(StaticIdentityProvider::new(AccessToken::from_static("token")));
//! let acquirer = TokenAcquirer::<_, ()>::new(provider, InteractionType::Popup);
//!
//! let acquisition = acquirer
//!     .acquire_token(vec![Scope::from_static("user.read")], &())
//!     .await?;
//!
//! assert_eq!(acquisition, Acquisition::Token(AccessToken::from_static("token")));
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod account;
mod acquire;
mod braids;
mod interaction;
pub mod providers;
mod request;

pub use account::Account;
pub use acquire::{AcquireError, Acquisition, TokenAcquirer};
pub use braids::*;
pub use interaction::{InteractionType, InteractiveMode, InvalidInteractionType};
pub use providers::{AuthenticationResult, IdentityProvider, StaticIdentityProvider};
pub use request::{AuthRequest, AuthRequestCustomizer, AuthRequestOverrides};
