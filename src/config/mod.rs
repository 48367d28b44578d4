//! Configuration for the SCIM search client.
//!
//! The client is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! endpoint = "https://idp.example.com/scim/v2"
//! access_token = "${SCIM_TOKEN}"
//! timeout_secs = 30
//!
//! [paging]
//! default_count = 50
//! max_pages = 200
//! ```

use std::{path::Path, sync::LazyLock};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::scim::{Query, QueryBuilder, ResourceType};

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Root configuration for the search client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the SCIM service, e.g. `https://idp.example.com/scim/v2`.
    pub endpoint: String,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub paging: PagingConfig,
}

/// Paging defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    /// `count` applied to queries that don't set one. Unset leaves it to the server.
    #[serde(default)]
    pub default_count: Option<u32>,

    /// Upper bound on pages fetched by a single `fetch_all`.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_count: None,
            max_pages: default_max_pages(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_pages() -> u32 {
    1000
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing variables cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: ClientConfig = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;

        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be at least 1".into(),
            ));
        }
        if self.paging.default_count == Some(0) {
            return Err(ConfigError::Validation(
                "paging.default_count must be at least 1".into(),
            ));
        }
        if self.paging.max_pages == 0 {
            return Err(ConfigError::Validation(
                "paging.max_pages must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The endpoint as a URL. Only `http` and `https` are accepted.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::Validation(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "endpoint '{}' must use http or https",
                self.endpoint
            )));
        }
        Ok(url)
    }

    /// A query builder preloaded with the configured page size.
    pub fn query_builder(&self, resource: ResourceType) -> QueryBuilder {
        let mut builder = Query::builder(resource);
        builder.count_per_page = self.paging.default_count;
        builder
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR_NAME}` references line by line.
/// Anything after a `#` on the line is left alone.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut lines = Vec::new();

    for line in input.split('\n') {
        let (code, comment) = match line.find('#') {
            Some(pos) => line.split_at(pos),
            None => (line, ""),
        };

        let mut missing = None;
        let expanded = ENV_VAR.replace_all(code, |cap: &Captures<'_>| {
            std::env::var(&cap[1]).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| cap[1].to_string());
                String::new()
            })
        });
        if let Some(name) = missing {
            return Err(ConfigError::EnvVarNotFound(name));
        }

        lines.push(format!("{}{}", expanded, comment));
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = ClientConfig::from_str(r#"endpoint = "https://idp.example.com/scim/v2""#)
            .unwrap();

        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.access_token, None);
        assert_eq!(config.paging.default_count, None);
        assert_eq!(config.paging.max_pages, 1000);
        assert_eq!(
            config.endpoint_url().unwrap().as_str(),
            "https://idp.example.com/scim/v2"
        );
    }

    #[test]
    fn test_full_config() {
        let config = ClientConfig::from_str(
            r#"
            endpoint = "http://localhost:8080/scim/v2/"
            access_token = "secret"
            timeout_secs = 5

            [paging]
            default_count = 25
            max_pages = 10
        "#,
        )
        .unwrap();

        assert_eq!(config.access_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.paging.default_count, Some(25));
        assert_eq!(config.paging.max_pages, 10);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"endpoint = \"https://idp.example.com/scim/v2\"\n[paging]\nmax_pages = 3\n",
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.paging.max_pages, 3);

        let err = ClientConfig::from_file("/nonexistent/scim.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ClientConfig::from_str(
            r#"
            endpoint = "https://idp.example.com/scim/v2"
            page_size = 10
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            (r#"endpoint = "not a url""#, "invalid endpoint"),
            (r#"endpoint = "ftp://idp.example.com""#, "must use http or https"),
            (
                "endpoint = \"https://idp.example.com\"\ntimeout_secs = 0",
                "timeout_secs",
            ),
            (
                "endpoint = \"https://idp.example.com\"\n[paging]\ndefault_count = 0",
                "default_count",
            ),
            (
                "endpoint = \"https://idp.example.com\"\n[paging]\nmax_pages = 0",
                "max_pages",
            ),
        ];

        for (input, expected) in cases {
            match ClientConfig::from_str(input) {
                Err(ConfigError::Validation(msg)) => {
                    assert!(msg.contains(expected), "{msg} should mention {expected}")
                }
                other => panic!("expected validation error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_query_builder_uses_default_count() {
        let config = ClientConfig::from_str(
            "endpoint = \"https://idp.example.com\"\n[paging]\ndefault_count = 3",
        )
        .unwrap();
        let query = config.query_builder(ResourceType::Group).build().unwrap();

        assert_eq!(query.count_per_page(), Some(3));
        assert_eq!(query.next_page().start_index(), 4);
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_SCIM_TOKEN", Some("tok-123"), || {
            let result = expand_env_vars("access_token = \"${TEST_SCIM_TOKEN}\"").unwrap();
            assert_eq!(result, "access_token = \"tok-123\"");
        });
    }

    #[test]
    fn test_env_var_missing() {
        temp_env::with_var_unset("TEST_SCIM_MISSING", || {
            let err = expand_env_vars("access_token = \"${TEST_SCIM_MISSING}\"").unwrap_err();
            assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "TEST_SCIM_MISSING"));
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# access_token = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# access_token = \"${NONEXISTENT_VAR}\"");

        let result = expand_env_vars("timeout_secs = 5 # ${NONEXISTENT_VAR}").unwrap();
        assert_eq!(result, "timeout_secs = 5 # ${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_multiline_with_comments() {
        temp_env::with_var("TEST_SCIM_ENDPOINT", Some("https://idp.example.com"), || {
            let input = "endpoint = \"${TEST_SCIM_ENDPOINT}\"\n# access_token = \"${NONEXISTENT}\"\n";
            let result = expand_env_vars(input).unwrap();
            assert_eq!(
                result,
                "endpoint = \"https://idp.example.com\"\n# access_token = \"${NONEXISTENT}\"\n"
            );

            let config = ClientConfig::from_str(input).unwrap();
            assert_eq!(config.endpoint, "https://idp.example.com");
        });
    }
}
