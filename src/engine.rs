//! Engine configuration module
//!
//! Maps one [`ServerConfig`] onto the JSON document the proxy engine reads
//! at startup: a fixed log section, a fixed local SOCKS5 inbound and one
//! outbound describing the selected server.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ServerConfig;

pub mod inbound;
pub mod log;
pub mod outbound;

pub use inbound::{Inbound, LOCAL_SOCKS_PORT};
pub use log::{Log, LogLevel};
pub use outbound::{Outbound, StreamSettings, WsHeaders, WsSettings};

/// Complete engine configuration document
///
/// Field order is fixed by declaration order, so the same input always
/// serializes to the same bytes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub log: Log,
    pub inbounds: Vec<Inbound>,
    pub outbounds: Vec<Outbound>,
}

impl EngineConfig {
    /// Serializes to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize engine config")
    }

    /// Serializes to single-line JSON
    pub fn to_json_compact(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize engine config")
    }
}

impl From<&ServerConfig> for EngineConfig {
    fn from(config: &ServerConfig) -> Self {
        build_engine_config(config)
    }
}

/// Builds the engine configuration for one server
pub fn build_engine_config(config: &ServerConfig) -> EngineConfig {
    debug!(
        "Building engine config for {} server '{}' at {}",
        config.transport_protocol,
        config.display_name,
        config.endpoint()
    );

    EngineConfig {
        log: Log::default(),
        inbounds: vec![Inbound::local_socks()],
        outbounds: vec![Outbound::from(config)],
    }
}

/// Writes the engine configuration for `config` to `path`
///
/// Parent directories are created as needed.
pub async fn write_engine_config(config: &ServerConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = build_engine_config(config).to_json()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write engine config: {}", path.display()))?;

    info!("Engine config written to: {}", path.display());
    Ok(())
}
