//! Subscription service module
//!
//! Glues a [`FeedFetcher`] to the feed parser. The service is constructed
//! explicitly with its fetcher and source list; nothing here is global.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, warn};

use crate::config::{ServerConfig, StreamType, TransportProtocol};
use crate::parser::{decode_feed_body, parse_feed_report};

pub mod helpers;
pub mod sources;

pub use helpers::{FeedFetcher, HttpFetcher, expand_tilde, is_remote, prompt_server_choice};
pub use sources::{SourcesConfig, SubscriptionSource, default_sources};

// ============================================================================
// Subscription Service
// ============================================================================

/// Fetches subscription feeds and decodes them into server configs
pub struct SubscriptionService<F> {
    fetcher: F,
    sources: Vec<SubscriptionSource>,
}

impl<F: FeedFetcher> SubscriptionService<F> {
    /// Create a new service with the given fetcher and sources
    pub fn new(fetcher: F, sources: Vec<SubscriptionSource>) -> Self {
        Self { fetcher, sources }
    }

    /// Configured sources, in index order
    pub fn sources(&self) -> &[SubscriptionSource] {
        &self.sources
    }

    /// Fetches the source at `source_index` and parses up to `limit` servers
    ///
    /// A feed without any usable link yields an empty list, not an error.
    pub async fn fetch_servers(
        &self,
        source_index: usize,
        limit: usize,
    ) -> Result<Vec<ServerConfig>> {
        let source = self.sources.get(source_index).ok_or_else(|| {
            anyhow!(
                "Source index {} out of range ({} sources configured)",
                source_index,
                self.sources.len()
            )
        })?;

        info!("Fetching servers from: {}", source.name);
        self.fetch_url(&source.url, limit)
            .await
            .with_context(|| format!("Failed to load subscription '{}'", source.name))
    }

    /// Fetches an arbitrary feed URL and parses up to `limit` servers
    pub async fn fetch_url(&self, url: &str, limit: usize) -> Result<Vec<ServerConfig>> {
        let body = self.fetcher.fetch(url).await?;
        Ok(parse_body(&body, limit))
    }

    /// Loads a feed from a URL or a local file path
    pub async fn load(&self, path_or_url: &str, limit: usize) -> Result<Vec<ServerConfig>> {
        if is_remote(path_or_url) {
            self.fetch_url(path_or_url, limit).await
        } else {
            let expanded = expand_tilde(path_or_url);
            let body = tokio::fs::read_to_string(Path::new(&expanded))
                .await
                .with_context(|| format!("Failed to read feed from {:?}", expanded))?;
            Ok(parse_body(&body, limit))
        }
    }

    /// Loads servers from `input` (file or URL), or from the source at
    /// `source_index` when no input is given
    ///
    /// A failed network fetch falls back to [`fallback_servers`]. A local
    /// file that cannot be read and an unknown source index are errors.
    pub async fn load_servers(
        &self,
        input: Option<&str>,
        source_index: usize,
        limit: usize,
    ) -> Result<Vec<ServerConfig>> {
        let fetched = match input {
            Some(path) if !is_remote(path) => return self.load(path, limit).await,
            Some(url) => self.fetch_url(url, limit).await,
            None => {
                if source_index >= self.sources.len() {
                    bail!(
                        "Source index {} out of range ({} sources configured)",
                        source_index,
                        self.sources.len()
                    );
                }
                self.fetch_servers(source_index, limit).await
            }
        };

        match fetched {
            Ok(servers) => Ok(servers),
            Err(e) => {
                warn!("{:#}; using pre-loaded servers", e);
                Ok(fallback_servers())
            }
        }
    }
}

/// Unwraps and parses a feed body, logging what was skipped
fn parse_body(body: &str, limit: usize) -> Vec<ServerConfig> {
    let decoded = decode_feed_body(body);
    let report = parse_feed_report(&decoded, limit);

    if report.servers.is_empty() {
        warn!(
            "No usable servers in feed ({} lines, {} malformed, {} unrecognized)",
            report.lines_seen, report.malformed, report.unrecognized
        );
    } else {
        info!("Parsed {} server configs", report.servers.len());
        debug!(
            "Skipped {} malformed and {} unrecognized lines",
            report.malformed, report.unrecognized
        );
    }

    report.servers
}

// ============================================================================
// Fallback Servers
// ============================================================================

/// Pre-loaded VMess servers, offered when no feed can be fetched
pub fn fallback_servers() -> Vec<ServerConfig> {
    let mut first = ServerConfig::new(
        TransportProtocol::VMess,
        "159.69.102.131",
        8080,
        "3c67bb79-8b96-43d1-c576-c01dff9178ff",
    );
    first.display_name = "Tel: @free_vmess1".to_string();
    first.cipher = "auto".to_string();
    first.stream_type = StreamType::WebSocket;
    first.host_header = "Bmi.ir".to_string();

    let mut second = ServerConfig::new(
        TransportProtocol::VMess,
        "104.238.162.76",
        20086,
        "6cf93fe6-0062-4212-95aa-2aabca8b11bf",
    );
    second.display_name = "V2Ray Vmess-US-11069242".to_string();
    second.cipher = "auto".to_string();
    second.stream_type = StreamType::WebSocket;

    vec![first, second]
}
