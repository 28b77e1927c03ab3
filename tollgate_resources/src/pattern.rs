//! Comparison of protected resource patterns against outgoing URLs
//!
//! Patterns are compared structurally rather than as regular expressions.
//! A URL is split into its scheme, authority, path, and query. Schemes and
//! authorities compare without regard to ASCII case, paths and queries
//! compare exactly.
//!
//! | pattern                          | matches                                   |
//! |----------------------------------|-------------------------------------------|
//! | `https://api.test.com`           | `https://api.test.com`, `https://api.test.com/` |
//! | `http://localhost:3000/`         | any path on `http://localhost:3000`       |
//! | `https://myapplication.com/user/*` | `…/user`, `…/user/1`, `…/user/1/2/3`    |
//! | `https://*.test.com/*`           | any path on any subdomain of `test.com`   |
//! | `http://apps.com/tenant?abc`     | only `http://apps.com/tenant?abc`         |
//! | `/api/*`                         | relative URLs under `/api`                |
//!
//! A relative URL also matches an absolute pattern without wildcards that
//! names the same path and query, so `/v1.0/me` matches
//! `https://graph.microsoft.com/v1.0/me`. Patterns with wildcards, and base
//! URL patterns such as `http://localhost:3000/`, do not claim relative URLs.

const WILDCARD: char = '*';

/// A URL split into the components relevant for matching
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Components<'a> {
    origin: Option<Origin<'a>>,
    path: &'a str,
    query: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Origin<'a> {
    scheme: &'a str,
    host: &'a str,
    port: Option<&'a str>,
}

impl<'a> Components<'a> {
    fn split(url: &'a str) -> Self {
        let url = url.split_once('#').map_or(url, |(before, _)| before);
        let (rest, query) = match url.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (url, None),
        };

        let (origin, path) = match rest.split_once("://") {
            Some((scheme, remainder)) => {
                let (authority, path) = match remainder.find('/') {
                    Some(idx) => remainder.split_at(idx),
                    None => (remainder, ""),
                };
                (Some(Origin::split(scheme, authority)), path)
            }
            None => (None, rest),
        };

        Self {
            origin,
            path,
            query,
        }
    }
}

impl<'a> Origin<'a> {
    fn split(scheme: &'a str, authority: &'a str) -> Self {
        let authority = authority
            .rsplit_once('@')
            .map_or(authority, |(_, host)| host);

        let (host, port) = match authority.rfind(':') {
            Some(idx)
                if idx + 1 < authority.len()
                    && authority[idx + 1..].bytes().all(|b| b.is_ascii_digit())
                    && (!authority.starts_with('[') || authority[..idx].ends_with(']')) =>
            {
                (&authority[..idx], Some(&authority[idx + 1..]))
            }
            _ => (authority, None),
        };

        Self { scheme, host, port }
    }

    /// The explicit port, or the scheme's well-known port
    fn effective_port(&self) -> Option<&'a str> {
        self.port.or_else(|| {
            if self.scheme.eq_ignore_ascii_case("https") || self.scheme.eq_ignore_ascii_case("wss") {
                Some("443")
            } else if self.scheme.eq_ignore_ascii_case("http")
                || self.scheme.eq_ignore_ascii_case("ws")
            {
                Some("80")
            } else {
                None
            }
        })
    }

    fn matches(&self, candidate: &Origin<'_>) -> bool {
        if !self.scheme.eq_ignore_ascii_case(candidate.scheme)
            || self.effective_port() != candidate.effective_port()
        {
            return false;
        }

        if self.host.contains(WILDCARD) {
            let pattern: Vec<&str> = self.host.split('.').collect();
            let labels: Vec<&str> = candidate.host.split('.').collect();
            glob_components(&pattern, &labels, false, |p, c| {
                component_matches(p, c, |a, b| a.eq_ignore_ascii_case(b))
            })
        } else {
            self.host.eq_ignore_ascii_case(candidate.host)
        }
    }
}

/// Determines whether a protected resource pattern matches a candidate URL
///
/// A single trailing `/` on either side is ignored. A pattern containing no
/// wildcard whose path is exactly `/` is treated as a base URL and matches
/// every path beneath its origin. If the pattern carries a query string, the
/// candidate must carry exactly the same query; otherwise the candidate's
/// query is not considered.
///
/// Relative patterns only match relative candidates. Absolute patterns
/// without wildcards also match relative candidates with the same path and
/// query.
///
/// ```
/// use tollgate_resources::pattern_matches;
///
/// assert!(pattern_matches("https://*.test.com/*", "https://a.b.test.com/x/y"));
/// assert!(pattern_matches("http://applicationA/slash/", "http://applicationa/slash"));
/// assert!(!pattern_matches("https://*.test.com", "https://test.com"));
/// ```
pub fn pattern_matches(pattern: &str, candidate: &str) -> bool {
    let pattern = Components::split(pattern);
    let candidate = Components::split(candidate);

    let both_absolute = match (&pattern.origin, &candidate.origin) {
        (Some(p), Some(c)) => {
            if !p.matches(c) {
                return false;
            }
            true
        }
        (Some(p), None) => {
            if p.host.contains(WILDCARD)
                || pattern.path.contains(WILDCARD)
                || trim_trailing_slash(pattern.path).is_empty()
            {
                return false;
            }
            false
        }
        (None, None) => false,
        (None, Some(_)) => return false,
    };

    if let Some(query) = pattern.query {
        if candidate.query != Some(query) {
            return false;
        }
    }

    if both_absolute && pattern.path == "/" {
        return true;
    }

    if pattern.path.contains(WILDCARD) {
        let pattern_segments = segments(pattern.path);
        let candidate_segments = segments(candidate.path);
        glob_components(&pattern_segments, &candidate_segments, true, |p, c| {
            component_matches(p, c, |a, b| a == b)
        })
    } else {
        trim_trailing_slash(pattern.path) == trim_trailing_slash(candidate.path)
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

fn segments(path: &str) -> Vec<&str> {
    let path = trim_trailing_slash(path);
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

/// Matches a sequence of components against a pattern sequence
///
/// A lone `*` component consumes one or more candidate components. When it
/// is the final pattern component and `trailing_may_be_empty` is set, it
/// may also consume nothing at all.
///
/// Runs in time proportional to the product of both lengths, regardless of
/// how many wildcards the pattern holds.
fn glob_components<F>(
    pattern: &[&str],
    candidate: &[&str],
    trailing_may_be_empty: bool,
    eq: F,
) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    // consumed[j]: the pattern so far can consume exactly `candidate[..j]`
    let mut consumed = vec![false; candidate.len() + 1];
    consumed[0] = true;

    for (idx, component) in pattern.iter().enumerate() {
        let mut next = vec![false; candidate.len() + 1];

        if *component == "*" {
            if idx + 1 == pattern.len() && trailing_may_be_empty {
                next.copy_from_slice(&consumed);
            }
            let mut reachable = false;
            for j in 1..=candidate.len() {
                reachable |= consumed[j - 1];
                next[j] |= reachable;
            }
        } else {
            for j in 1..=candidate.len() {
                next[j] = consumed[j - 1] && eq(*component, candidate[j - 1]);
            }
        }

        if !next.contains(&true) {
            return false;
        }
        consumed = next;
    }

    consumed[candidate.len()]
}

/// Compares a single component, allowing `*` as a prefix/suffix glob
fn component_matches<F>(pattern: &str, candidate: &str, eq: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    if !pattern.contains(WILDCARD) {
        return eq(pattern, candidate);
    }

    let mut pieces = pattern.split(WILDCARD);
    let first = pieces.next().unwrap_or_default();
    let mut pieces: Vec<&str> = pieces.collect();
    let last = pieces.pop().unwrap_or_default();

    if candidate.len() < first.len() + last.len() {
        return false;
    }

    let split_tail = candidate.len() - last.len();
    let (Some(head), Some(middle), Some(tail)) = (
        candidate.get(..first.len()),
        candidate.get(first.len()..split_tail),
        candidate.get(split_tail..),
    ) else {
        return false;
    };

    if !eq(head, first) || !eq(tail, last) {
        return false;
    }

    let mut middle = middle;
    for piece in pieces.into_iter().filter(|p| !p.is_empty()) {
        let found = (0..=middle.len().saturating_sub(piece.len())).find(|&idx| {
            middle.is_char_boundary(idx)
                && middle.is_char_boundary(idx + piece.len())
                && eq(&middle[idx..idx + piece.len()], piece)
        });
        match found {
            Some(idx) => middle = &middle[idx + piece.len()..],
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    mod exact_patterns {
        use super::*;

        #[test]
        fn match_identical_urls() {
            assert!(pattern_matches(
                "https://graph.microsoft.com/v1.0/me",
                "https://graph.microsoft.com/v1.0/me"
            ));
        }

        #[test]
        fn ignore_a_single_trailing_slash_on_the_pattern() {
            assert!(pattern_matches(
                "http://applicationA/slash/",
                "http://applicationA/slash"
            ));
        }

        #[test]
        fn ignore_a_single_trailing_slash_on_the_candidate() {
            assert!(pattern_matches(
                "http://applicationB/noSlash",
                "http://applicationB/noSlash/"
            ));
        }

        #[test]
        fn compare_hosts_without_case() {
            assert!(pattern_matches(
                "http://applicationC.com",
                "http://applicationc.com/"
            ));
        }

        #[test]
        fn compare_paths_with_case() {
            assert!(!pattern_matches(
                "http://applicationB/noSlash",
                "http://applicationb/noslash"
            ));
        }

        #[test]
        fn do_not_match_deeper_paths() {
            assert!(!pattern_matches(
                "http://localhost:4200/details",
                "http://localhost:4200/details/more"
            ));
        }

        #[test]
        fn do_not_match_other_ports() {
            assert!(!pattern_matches(
                "http://localhost:3000/details",
                "http://localhost:4200/details"
            ));
            assert!(!pattern_matches(
                "http://localhost/details",
                "http://localhost:4200/details"
            ));
        }

        #[test]
        fn do_not_match_other_schemes() {
            assert!(!pattern_matches(
                "https://api.test.com",
                "http://api.test.com"
            ));
        }

        #[test]
        fn treat_default_ports_as_implied() {
            assert!(pattern_matches(
                "https://api.example.com:443/x",
                "https://api.example.com/x"
            ));
            assert!(pattern_matches(
                "http://localhost/details",
                "http://localhost:80/details"
            ));
            assert!(!pattern_matches(
                "https://api.example.com:80/x",
                "https://api.example.com/x"
            ));
        }

        #[test]
        fn host_without_path_does_not_match_deeper_paths() {
            assert!(!pattern_matches("https://api.test.com", "https://api.test.com/x"));
        }
    }

    mod base_url_patterns {
        use super::*;

        #[test]
        fn match_any_path_beneath_the_origin() {
            assert!(pattern_matches(
                "http://localhost:3000/",
                "http://localhost:3000/details"
            ));
            assert!(pattern_matches(
                "http://localhost:3000/",
                "http://localhost:3000/a/b/c?d=e"
            ));
        }

        #[test]
        fn match_the_origin_itself() {
            assert!(pattern_matches("http://localhost:3000/", "http://localhost:3000"));
        }

        #[test]
        fn do_not_match_another_origin() {
            assert!(!pattern_matches(
                "http://localhost:3000/",
                "http://localhost:4200/details"
            ));
        }
    }

    mod wildcard_patterns {
        use super::*;

        #[test]
        fn trailing_segment_matches_any_depth() {
            let pattern = "https://myapplication.com/user/*";
            assert!(pattern_matches(pattern, "https://myapplication.com/user/1"));
            assert!(pattern_matches(pattern, "https://myapplication.com/user/1/2/3"));
            assert!(pattern_matches(pattern, "https://myapplication.com/user"));
            assert!(!pattern_matches(pattern, "https://myapplication.com/users/1"));
        }

        #[test]
        fn subdomain_label_matches_one_or_more_labels() {
            let pattern = "https://*.myapplication.com/*";
            assert!(pattern_matches(pattern, "https://mail.myapplication.com/me"));
            assert!(pattern_matches(pattern, "https://a.b.myapplication.com/me/too"));
            assert!(pattern_matches(pattern, "https://mail.myapplication.com"));
            assert!(!pattern_matches(pattern, "https://myapplication.com/me"));
        }

        #[test]
        fn subdomain_without_path_matches_only_the_root() {
            let pattern = "https://*.test.com";
            assert!(pattern_matches(pattern, "https://api.test.com"));
            assert!(pattern_matches(pattern, "https://api.test.com/"));
            assert!(!pattern_matches(pattern, "https://api.test.com/deeper"));
        }

        #[test]
        fn interior_segment_matches_one_or_more_segments() {
            let pattern = "https://example.com/tenants/*/users";
            assert!(pattern_matches(pattern, "https://example.com/tenants/a/users"));
            assert!(pattern_matches(pattern, "https://example.com/tenants/a/b/users"));
            assert!(!pattern_matches(pattern, "https://example.com/tenants/users"));
        }

        #[test]
        fn many_interior_segments_against_a_deep_path() {
            let pattern = format!("/a{}/z", "/*".repeat(12));
            let deep = format!("/a{}", "/x".repeat(200));

            assert!(!pattern_matches(&pattern, &deep));
            assert!(pattern_matches(&pattern, &format!("{deep}/z")));
        }

        #[test]
        fn partial_segment_globs_within_the_segment() {
            let pattern = "https://example.com/v*/items";
            assert!(pattern_matches(pattern, "https://example.com/v1/items"));
            assert!(pattern_matches(pattern, "https://example.com/v2.1/items"));
            assert!(!pattern_matches(pattern, "https://example.com/x1/items"));
            assert!(!pattern_matches(pattern, "https://example.com/v1/x/items"));
        }

        #[test]
        fn partial_label_globs_within_the_label() {
            let pattern = "https://api-*.example.com/*";
            assert!(pattern_matches(pattern, "https://api-eu.example.com/orders"));
            assert!(!pattern_matches(pattern, "https://web-eu.example.com/orders"));
        }
    }

    mod query_patterns {
        use super::*;

        #[test]
        fn require_the_exact_query() {
            let pattern = "http://apps.com/tenant?abc";
            assert!(pattern_matches(pattern, "http://apps.com/tenant?abc"));
            assert!(!pattern_matches(pattern, "http://apps.com/tenant?abd"));
            assert!(!pattern_matches(pattern, "http://apps.com/tenant"));
        }

        #[test]
        fn patterns_without_query_ignore_the_candidate_query() {
            assert!(pattern_matches(
                "https://graph.microsoft.com/v1.0/me",
                "https://graph.microsoft.com/v1.0/me?$select=id"
            ));
        }

        #[test]
        fn fragments_are_ignored() {
            assert!(pattern_matches(
                "https://graph.microsoft.com/v1.0/me",
                "https://graph.microsoft.com/v1.0/me#section"
            ));
        }
    }

    mod relative_patterns {
        use super::*;

        #[test]
        fn match_relative_candidates() {
            assert!(pattern_matches("/v1.0/me", "/v1.0/me"));
            assert!(pattern_matches("/v1.0/me/", "/v1.0/me"));
            assert!(pattern_matches("/tenant?abc", "/tenant?abc"));
            assert!(pattern_matches("/api/*", "/api/orders/1"));
        }

        #[test]
        fn never_match_absolute_candidates() {
            assert!(!pattern_matches("/v1.0/me", "https://graph.microsoft.com/v1.0/me"));
        }

        #[test]
        fn absolute_patterns_match_relative_candidates_by_path() {
            assert!(pattern_matches("https://graph.microsoft.com/v1.0/me", "/v1.0/me"));
            assert!(pattern_matches("https://graph.microsoft.com/v1.0/me", "/v1.0/me/"));
            assert!(pattern_matches("http://apps.com/tenant?abc", "/tenant?abc"));
        }

        #[test]
        fn wildcard_patterns_never_match_relative_candidates() {
            assert!(!pattern_matches("https://myapplication.com/user/*", "/user/1"));
            assert!(!pattern_matches("https://*.myapplication.com/*", "/tenant"));
            assert!(!pattern_matches("https://*.test.com", "/"));
        }

        #[test]
        fn absolute_patterns_compare_relative_paths_and_queries_exactly() {
            assert!(!pattern_matches("https://graph.microsoft.com/v1.0/me", "/v1.0/you"));
            assert!(!pattern_matches("http://apps.com/tenant?abc", "/tenant?xyz"));
            assert!(!pattern_matches("http://apps.com/tenant?abc", "/tenant"));
        }

        #[test]
        fn base_url_patterns_do_not_claim_every_relative_candidate() {
            assert!(!pattern_matches("http://localhost:3000/", "/details"));
            assert!(!pattern_matches("http://localhost:3000/", "/"));
            assert!(!pattern_matches("https://api.test.com", "/"));
        }
    }

    #[test]
    fn origin_splits_userinfo_and_port() {
        let components = Components::split("https://user:pw@example.com:8443/a?b#c");
        assert_eq!(
            components,
            Components {
                origin: Some(Origin {
                    scheme: "https",
                    host: "example.com",
                    port: Some("8443"),
                }),
                path: "/a",
                query: Some("b"),
            }
        );
    }
}
