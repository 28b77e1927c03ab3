use std::collections::BTreeMap;

use aliri_braid::braid;
use serde::{Deserialize, Serialize};

/// An OAuth2 scope requested for a protected resource
#[braid(serde)]
pub struct Scope;

/// A single entry in the scope list of a protected resource
///
/// A plain scope is always requested. A method-restricted item only
/// contributes its scopes when the outgoing request uses that exact
/// HTTP method.
///
/// In configuration, a plain scope is written as a string and a
/// method-restricted item as an object keyed by method name:
///
/// ```
/// use tollgate_resources::ScopeItem;
///
/// let items: Vec<ScopeItem> =
///     serde_json::from_str(r#"["all.scope", { "GET": ["read.scope"] }]"#).unwrap();
/// assert_eq!(items.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeItem {
    /// A scope requested for every method
    Plain(Scope),
    /// Scopes requested only for the keyed HTTP method
    ByMethod(BTreeMap<String, Vec<Scope>>),
}

impl ScopeItem {
    /// Constructs a method-restricted item for a single method
    pub fn for_method<M, I>(method: M, scopes: I) -> Self
    where
        M: Into<String>,
        I: IntoIterator<Item = Scope>,
    {
        let mut by_method = BTreeMap::new();
        by_method.insert(method.into(), scopes.into_iter().collect());
        Self::ByMethod(by_method)
    }

    /// Appends the scopes this item contributes to a request using `method`
    ///
    /// Method names are compared case-sensitively.
    pub fn collect_for_method(&self, method: &str, scopes: &mut Vec<Scope>) {
        match self {
            Self::Plain(scope) => scopes.push(scope.clone()),
            Self::ByMethod(by_method) => {
                if let Some(method_scopes) = by_method.get(method) {
                    scopes.extend(method_scopes.iter().cloned());
                }
            }
        }
    }
}

impl From<Scope> for ScopeItem {
    #[inline]
    fn from(scope: Scope) -> Self {
        Self::Plain(scope)
    }
}

/// The scope specification attached to a protected resource pattern
///
/// `None` marks the resource as explicitly unprotected, which overrides
/// any other pattern that would match the same request.
pub type ScopeSpec = Option<Vec<ScopeItem>>;
