//! Interceptor configuration

use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tollgate_resources::ProtectedResourceMap;
use tollgate_tokens::{AuthRequestOverrides, InteractionType};
use url::Url;

/// Static configuration for an [`AccessTokenMiddleware`][crate::AccessTokenMiddleware]
///
/// ```
/// use tollgate_reqwest::InterceptorConfig;
/// use tollgate_tokens::InteractionType;
///
/// let config = InterceptorConfig::from_json_str(r#"{
///     "interactionType": "Popup",
///     "protectedResourceMap": {
///         "https://graph.microsoft.com/v1.0/me": ["user.read"],
///         "https://graph.microsoft.com/v1.0/health": null
///     },
///     "origin": "https://app.example.com"
/// }"#).unwrap();
///
/// assert_eq!(config.interaction_type, InteractionType::Popup);
/// assert_eq!(config.protected_resource_map.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptorConfig {
    /// How to obtain a token when silent acquisition fails
    pub interaction_type: InteractionType,

    /// The resources that require a token, in order of precedence
    #[serde(default)]
    pub protected_resource_map: ProtectedResourceMap,

    /// Static overrides applied to every token request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_request: Option<AuthRequestOverrides>,

    /// The application's own origin
    ///
    /// Requests to this origin are also matched by their relative form,
    /// allowing relative patterns such as `/api/*` in the resource map. The
    /// relative form also matches absolute patterns without wildcards by
    /// their path and query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Url>,
}

impl InterceptorConfig {
    /// Constructs a configuration with an empty resource map
    pub fn new(interaction_type: InteractionType) -> Self {
        Self {
            interaction_type,
            protected_resource_map: ProtectedResourceMap::new(),
            auth_request: None,
            origin: None,
        }
    }

    /// Sets the protected resource map
    pub fn with_protected_resource_map(mut self, map: ProtectedResourceMap) -> Self {
        self.protected_resource_map = map;
        self
    }

    /// Sets static overrides applied to every token request
    pub fn with_auth_request(mut self, overrides: AuthRequestOverrides) -> Self {
        self.auth_request = Some(overrides);
        self
    }

    /// Sets the application's own origin
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Parses a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json_str(&json)?;

        tracing::debug!(
            path = %path.display(),
            resources = config.protected_resource_map.len(),
            interaction_type = ?config.interaction_type,
            "loaded interceptor configuration"
        );

        Ok(config)
    }
}

/// An error loading an [`InterceptorConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be read
    #[error("unable to read interceptor configuration")]
    Io(#[from] io::Error),
    /// The configuration is not valid
    #[error("invalid interceptor configuration")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use tollgate_resources::Scope;
    use tollgate_tokens::Authority;

    use super::*;

    #[test]
    fn minimal_configuration_protects_nothing() {
        let config = InterceptorConfig::from_json_str(r#"{"interactionType": "Redirect"}"#)
            .unwrap();

        assert_eq!(config, InterceptorConfig::new(InteractionType::Redirect));
        assert!(config.protected_resource_map.is_empty());
    }

    #[test]
    fn silent_interaction_type_is_accepted_when_loading() {
        let config =
            InterceptorConfig::from_json_str(r#"{"interactionType": "Silent"}"#).unwrap();

        assert_eq!(config.interaction_type, InteractionType::Silent);
    }

    #[test]
    fn parses_static_auth_request() {
        let config = InterceptorConfig::from_json_str(
            r#"{
                "interactionType": "Popup",
                "authRequest": {
                    "authority": "https://login.microsoftonline.com/common",
                    "prompt": "select_account"
                }
            }"#,
        )
        .unwrap();

        let overrides = config.auth_request.unwrap();
        assert_eq!(
            overrides.authority,
            Some(Authority::from_static(
                "https://login.microsoftonline.com/common"
            ))
        );
        assert_eq!(overrides.extra["prompt"], "select_account");
    }

    #[test]
    fn resource_map_keeps_declaration_order() {
        let config = InterceptorConfig::from_json_str(
            r#"{
                "interactionType": "Popup",
                "protectedResourceMap": {
                    "https://b.example.com": ["b.read"],
                    "https://a.example.com": null
                }
            }"#,
        )
        .unwrap();

        let keys: Vec<_> = config
            .protected_resource_map
            .iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["https://b.example.com", "https://a.example.com"]);
        assert_eq!(
            config
                .protected_resource_map
                .required_scopes(["https://b.example.com"], "GET"),
            Some(vec![Scope::from_static("b.read")])
        );
    }

    #[test]
    fn rejects_unknown_interaction_type() {
        let err =
            InterceptorConfig::from_json_str(r#"{"interactionType": "Telepathy"}"#).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn rejects_invalid_origin() {
        let err = InterceptorConfig::from_json_str(
            r#"{"interactionType": "Popup", "origin": "not a url"}"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn load_reports_missing_files() {
        let err = InterceptorConfig::load("this/file/does/not/exist.json")
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[tokio::test]
    async fn load_reads_json_files() {
        let path = std::env::temp_dir().join(format!(
            "tollgate-interceptor-config-{}.json",
            std::process::id()
        ));
        tokio::fs::write(
            &path,
            r#"{"interactionType": "Popup", "origin": "https://app.example.com"}"#,
        )
        .await
        .unwrap();

        let config = InterceptorConfig::load(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();

        let config = config.unwrap();
        assert_eq!(
            config.origin.as_ref().map(Url::as_str),
            Some("https://app.example.com/")
        );
    }
}
