//! Protected resource tables for outgoing requests
//!
//! A [`ProtectedResourceMap`] declares which outgoing URLs require an access
//! token, and which OAuth2 scopes that token must carry. Patterns may be
//! absolute or relative URLs, may contain `*` wildcards for host labels or
//! path segments, and may restrict some scopes to specific HTTP methods.
//!
//! ```
//! use tollgate_resources::{ProtectedResourceMap, Scope, ScopeItem};
//!
//! let map = ProtectedResourceMap::new()
//!     .with_unprotected("https://api.example.com/health")
//!     .with_resource("https://api.example.com/*", vec![
//!         ScopeItem::from(Scope::from_static("api.read")),
//!         ScopeItem::for_method("POST", vec![Scope::from_static("api.write")]),
//!     ]);
//!
//! assert_eq!(
//!     map.required_scopes(["https://api.example.com/orders"], "POST"),
//!     Some(vec![Scope::from_static("api.read"), Scope::from_static("api.write")]),
//! );
//! assert_eq!(map.required_scopes(["https://api.example.com/health"], "GET"), None);
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

mod map;
mod pattern;
mod scope;

pub use map::{match_scopes_to_endpoint, ProtectedResourceMap};
pub use pattern::pattern_matches;
pub use scope::{Scope, ScopeItem, ScopeRef, ScopeSpec};
