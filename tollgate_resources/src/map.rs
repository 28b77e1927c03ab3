use std::{fmt, marker::PhantomData};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{pattern_matches, Scope, ScopeItem, ScopeSpec};

/// An ordered table of protected resource patterns and their scopes
///
/// Declaration order is significant: when several patterns match the same
/// request, the first declared pattern that contributes scopes wins. A
/// matching pattern declared with no scopes (`null`) marks the request as
/// unprotected, regardless of where it appears in the table.
///
/// The table deserializes from an object and retains the order in which
/// the keys appear in the source document.
///
/// ```
/// use tollgate_resources::{ProtectedResourceMap, Scope};
///
/// let map: ProtectedResourceMap = serde_json::from_str(r#"{
///     "http://localhost:3000/unprotect": null,
///     "http://localhost:3000/": ["base.scope"]
/// }"#).unwrap();
///
/// assert_eq!(
///     map.required_scopes(["http://localhost:3000/details"], "GET"),
///     Some(vec![Scope::from_static("base.scope")]),
/// );
/// assert_eq!(map.required_scopes(["http://localhost:3000/unprotect"], "GET"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtectedResourceMap {
    entries: Vec<(String, ScopeSpec)>,
}

impl ProtectedResourceMap {
    /// Constructs an empty table
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declares a protected resource with the given scope items
    pub fn with_resource<K, I, S>(mut self, pattern: K, items: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<ScopeItem>,
    {
        self.insert(pattern, Some(items.into_iter().map(Into::into).collect()));
        self
    }

    /// Declares a resource that must never receive a token
    pub fn with_unprotected<K>(mut self, pattern: K) -> Self
    where
        K: Into<String>,
    {
        self.insert(pattern, None);
        self
    }

    /// Declares a pattern with a scope specification
    ///
    /// Re-declaring a pattern replaces its specification while keeping its
    /// original position in the table.
    pub fn insert<K>(&mut self, pattern: K, spec: ScopeSpec)
    where
        K: Into<String>,
    {
        let pattern = pattern.into();
        match self.entries.iter_mut().find(|(key, _)| *key == pattern) {
            Some((_, existing)) => *existing = spec,
            None => self.entries.push((pattern, spec)),
        }
    }

    /// The number of declared patterns
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table declares no patterns
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the declared patterns in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[ScopeItem]>)> {
        self.entries
            .iter()
            .map(|(key, spec)| (key.as_str(), spec.as_deref()))
    }

    /// Determines the scopes required for a request
    ///
    /// `endpoints` holds every equivalent form of the request URL that should
    /// be tested. See [`match_scopes_to_endpoint`] for the matching rules.
    #[inline]
    pub fn required_scopes<I, E>(&self, endpoints: I, method: &str) -> Option<Vec<Scope>>
    where
        I: IntoIterator<Item = E>,
        E: AsRef<str>,
    {
        match_scopes_to_endpoint(self, endpoints, method)
    }
}

/// Determines the scopes required for a request, if any
///
/// Each pattern in the table is tested, in declaration order, against
/// every form in `endpoints`. Then:
///
/// * if any matching pattern is declared with no scopes, the request is
///   unprotected and `None` is returned;
/// * otherwise, the scopes of the first matching pattern that contributes
///   at least one scope for `method` are returned, in declaration order;
/// * if nothing matches, or no match contributes a scope for `method`, the
///   request is unprotected.
pub fn match_scopes_to_endpoint<I, E>(
    map: &ProtectedResourceMap,
    endpoints: I,
    method: &str,
) -> Option<Vec<Scope>>
where
    I: IntoIterator<Item = E>,
    E: AsRef<str>,
{
    let endpoints: Vec<E> = endpoints.into_iter().collect();
    let mut required: Option<Vec<Scope>> = None;

    for (pattern, spec) in &map.entries {
        let matched = endpoints
            .iter()
            .any(|endpoint| pattern_matches(pattern, endpoint.as_ref()));

        if !matched {
            continue;
        }

        let Some(items) = spec else {
            tracing::trace!(%pattern, "endpoint matched an unprotected resource");
            return None;
        };

        if required.is_none() {
            let mut scopes = Vec::new();
            for item in items {
                item.collect_for_method(method, &mut scopes);
            }

            if scopes.is_empty() {
                tracing::trace!(%pattern, %method, "protected resource declares no scopes for method");
            } else {
                tracing::trace!(%pattern, %method, scopes = scopes.len(), "endpoint matched protected resource");
                required = Some(scopes);
            }
        }
    }

    required
}

impl<K> FromIterator<(K, ScopeSpec)> for ProtectedResourceMap
where
    K: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, ScopeSpec)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (pattern, spec) in iter {
            map.insert(pattern, spec);
        }
        map
    }
}

impl Serialize for ProtectedResourceMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (pattern, spec) in &self.entries {
            map.serialize_entry(pattern, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProtectedResourceMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

struct OrderedVisitor(PhantomData<fn() -> ProtectedResourceMap>);

impl<'de> Visitor<'de> for OrderedVisitor {
    type Value = ProtectedResourceMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of resource patterns to scope lists or null")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = ProtectedResourceMap {
            entries: Vec::with_capacity(access.size_hint().unwrap_or(0)),
        };

        while let Some((pattern, spec)) = access.next_entry::<String, ScopeSpec>()? {
            map.insert(pattern, spec);
        }

        Ok(map)
    }
}
