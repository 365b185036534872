//! Subscription utility functions
//!
//! This module provides the helpers the subscription service leans on:
//! path expansion, HTTP fetching and the interactive server picker.

use std::future::Future;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::get_version;

// ============================================================================
// Path Utilities
// ============================================================================

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = dirs_home()
    {
        return path.replacen("~", &home, 1);
    }
    path.to_string()
}

/// Get home directory path
pub fn dirs_home() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok()
    }
}

/// Returns `true` when `input` should be fetched rather than read from disk
pub fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

// ============================================================================
// HTTP Utilities
// ============================================================================

/// Source of subscription bodies
///
/// The parsing core never performs I/O itself; whoever embeds it supplies
/// a fetcher that hands back the complete, UTF-8 decoded body.
pub trait FeedFetcher: Send + Sync {
    /// Fetches the full text body behind `url`
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// [`FeedFetcher`] backed by a `reqwest` client
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the crate's user agent
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("v2sub/{}", get_version()))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP request failed with status {}: {}", status, url);
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {}", url))?;

        debug!("Fetched {} bytes from {}", text.len(), url);
        Ok(text)
    }
}

// ============================================================================
// User Prompts
// ============================================================================

/// Prompt user to pick one of `servers`.
///
/// Returns the selected index, or `None` if the list is empty or the prompt
/// could not be shown.
pub fn prompt_server_choice(servers: &[ServerConfig]) -> Option<usize> {
    use dialoguer::{Select, theme::ColorfulTheme};

    if servers.is_empty() {
        return None;
    }

    let items: Vec<String> = servers
        .iter()
        .map(|s| {
            format!(
                "{} [{}] {}",
                s.display_name,
                s.transport_protocol,
                s.endpoint()
            )
        })
        .collect();

    println!();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a server")
        .items(&items)
        .default(0)
        .interact();

    match selection {
        Ok(idx) => {
            info!("User selected server: {}", servers[idx].display_name);
            Some(idx)
        }
        Err(e) => {
            warn!("Failed to get user selection: {}", e);
            None
        }
    }
}
