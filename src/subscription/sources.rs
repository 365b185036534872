use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;

use super::helpers::expand_tilde;

// ============================================================================
// Subscription Source
// ============================================================================

/// A named subscription feed
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionSource {
    /// Name shown to the user
    pub name: String,

    /// URL to fetch the feed from
    pub url: String,
}

impl SubscriptionSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Checks that the URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url)
            .with_context(|| format!("Invalid URL for source '{}': {}", self.name, self.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "Unsupported URL scheme '{}' for source '{}'",
                url.scheme(),
                self.name
            );
        }
        Ok(())
    }
}

/// Public feeds used when no sources are configured
pub fn default_sources() -> Vec<SubscriptionSource> {
    vec![
        SubscriptionSource::new(
            "Epodonios VMess",
            "https://raw.githubusercontent.com/Epodonios/v2ray-configs/main/Splitted-By-Protocol/vmess.txt",
        ),
        SubscriptionSource::new(
            "Epodonios VLESS",
            "https://raw.githubusercontent.com/Epodonios/v2ray-configs/main/Splitted-By-Protocol/vless.txt",
        ),
        SubscriptionSource::new(
            "Barry-Far All",
            "https://raw.githubusercontent.com/barry-far/V2ray-Configs/main/Sub1.txt",
        ),
        SubscriptionSource::new(
            "Barry-Far Sub2",
            "https://raw.githubusercontent.com/barry-far/V2ray-Configs/main/Sub2.txt",
        ),
    ]
}

// ============================================================================
// Sources Config
// ============================================================================

/// Sources configuration parsed from a TOML file
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SourcesConfig {
    /// Maximum number of servers taken from one feed, default 20
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Engine config output path, default "./out/config.json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Feeds to choose from; empty means the built-in list
    #[serde(default)]
    pub sources: Vec<SubscriptionSource>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            output: default_output(),
            sources: default_sources(),
        }
    }
}

impl SourcesConfig {
    /// Parse sources config from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: SourcesConfig =
            toml::from_str(content).context("Failed to parse sources config TOML")?;

        if config.sources.is_empty() {
            config.sources = default_sources();
        }

        for source in &config.sources {
            source.validate()?;
        }

        Ok(config)
    }

    /// Load sources config from file path
    pub async fn from_file(path: &str) -> Result<Self> {
        let expanded = expand_tilde(path);
        let content = tokio::fs::read_to_string(Path::new(&expanded))
            .await
            .with_context(|| format!("Failed to read sources config from {:?}", expanded))?;
        Self::from_toml(&content)
    }
}

fn default_limit() -> usize {
    20
}

fn default_output() -> String {
    "./out/config.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources() {
        let sources = default_sources();
        assert_eq!(sources.len(), 4);
        assert!(sources.iter().all(|s| s.validate().is_ok()));
    }

    #[test]
    fn test_parse_sources_config() {
        let toml_str = r#"
            limit = 5
            output = "/tmp/engine.json"

            [[sources]]
            name = "Mine"
            url = "https://example.com/sub"
        "#;

        let config = SourcesConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.limit, 5);
        assert_eq!(config.output, "/tmp/engine.json");
        assert_eq!(
            config.sources,
            vec![SubscriptionSource::new("Mine", "https://example.com/sub")]
        );
    }

    #[test]
    fn test_parse_sources_config_defaults() {
        let config = SourcesConfig::from_toml("").unwrap();
        assert_eq!(config.limit, 20);
        assert_eq!(config.output, "./out/config.json");
        assert_eq!(config.sources, default_sources());
    }

    #[test]
    fn test_parse_sources_config_rejects_bad_url() {
        let toml_str = r#"
            [[sources]]
            name = "Broken"
            url = "ftp://example.com/sub"
        "#;
        assert!(SourcesConfig::from_toml(toml_str).is_err());

        let toml_str = r#"
            [[sources]]
            name = "Broken"
            url = "not a url"
        "#;
        assert!(SourcesConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_parse_sources_config_invalid_toml() {
        assert!(SourcesConfig::from_toml("limit = [").is_err());
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        assert!(SourcesConfig::from_file("/nonexistent/v2sub/sources.toml").await.is_err());
    }
}
