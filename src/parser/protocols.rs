//! Protocol parsers module
//!
//! This module contains parsers for the supported proxy link formats.
//! Each parser implements the `ProtocolParser` trait so the registry can
//! dispatch a line to whichever parser claims its scheme.

mod shadowsocks;
mod trojan;
mod vless;
mod vmess;

pub use shadowsocks::ShadowsocksParser;
pub use trojan::TrojanParser;
pub use vless::VLessParser;
pub use vmess::VMessParser;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::debug;

use crate::config::{DEFAULT_PORT, ServerConfig, TransportProtocol};

// ============================================================================
// Protocol Parser Trait
// ============================================================================

/// Trait for parsing individual protocol links
pub trait ProtocolParser: Send + Sync {
    /// Returns the protocol scheme this parser handles (e.g., "ss", "vmess")
    fn scheme(&self) -> &str;

    /// Parses a link into a server config
    fn parse(&self, uri: &str) -> Result<ServerConfig>;

    /// Checks if this parser can handle the given link
    fn can_parse(&self, uri: &str) -> bool {
        uri.strip_prefix(self.scheme())
            .is_some_and(|rest| rest.starts_with("://"))
    }
}

// ============================================================================
// Protocol Registry
// ============================================================================

/// Result of routing one line through the registry
#[derive(Debug)]
pub enum Dispatch {
    /// A parser claimed the line and decoded it
    Decoded(ServerConfig),
    /// A parser claimed the line but the link was malformed
    Rejected(anyhow::Error),
    /// No registered scheme matches the line
    Unrecognized,
}

/// Registry of protocol parsers, consulted in registration order
#[derive(Default)]
pub struct ProtocolRegistry {
    parsers: Vec<Arc<dyn ProtocolParser>>,
}

impl ProtocolRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Creates a registry with all built-in parsers registered
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(VMessParser));
        registry.register(Arc::new(VLessParser));
        registry.register(Arc::new(TrojanParser));
        registry.register(Arc::new(ShadowsocksParser));
        registry
    }

    /// Registers a protocol parser, replacing any parser for the same scheme
    pub fn register(&mut self, parser: Arc<dyn ProtocolParser>) {
        match self
            .parsers
            .iter_mut()
            .find(|p| p.scheme() == parser.scheme())
        {
            Some(existing) => *existing = parser,
            None => self.parsers.push(parser),
        }
    }

    /// Gets a parser for the given scheme
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn ProtocolParser>> {
        self.parsers.iter().find(|p| p.scheme() == scheme)
    }

    /// Schemes in dispatch order
    pub fn schemes(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.scheme()).collect()
    }

    /// Routes a trimmed line to the first parser whose scheme prefixes it
    pub fn dispatch(&self, line: &str) -> Dispatch {
        let Some(parser) = self.parsers.iter().find(|p| p.can_parse(line)) else {
            return Dispatch::Unrecognized;
        };

        match parser.parse(line) {
            Ok(config) => {
                debug!(
                    "Parsed {} link -> '{}' ({})",
                    parser.scheme(),
                    config.display_name,
                    config.endpoint()
                );
                Dispatch::Decoded(config)
            }
            Err(e) => {
                debug!("Failed to parse {} link: {:#}", parser.scheme(), e);
                Dispatch::Rejected(e)
            }
        }
    }

    /// Parses a link, discarding the reason when it cannot be decoded
    pub fn parse_link(&self, line: &str) -> Option<ServerConfig> {
        match self.dispatch(line) {
            Dispatch::Decoded(config) => Some(config),
            Dispatch::Rejected(_) | Dispatch::Unrecognized => None,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Splits off the text after the first `#`
pub fn split_fragment(s: &str) -> (&str, Option<&str>) {
    match s.split_once('#') {
        Some((main, fragment)) => (main, Some(fragment)),
        None => (s, None),
    }
}

/// Splits off the text after the first `?`
pub fn split_query(s: &str) -> (&str, Option<&str>) {
    match s.split_once('?') {
        Some((main, query)) => (main, Some(query)),
        None => (s, None),
    }
}

/// Splits `secret@rest` on the first `@`
pub fn split_credential(s: &str) -> Result<(&str, &str)> {
    s.split_once('@')
        .ok_or_else(|| anyhow!("Invalid link: missing '@' separator"))
}

/// Parses `key=value&...` into a map
///
/// Only the first `=` separates key from value, values are percent-decoded,
/// and pairs without `=` are ignored. Keys keep their case.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| {
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            (key.to_string(), value)
        })
        .collect()
}

/// Percent-decodes a link fragment into a display name, falling back to the
/// protocol default when the fragment is absent, empty or undecodable.
pub fn decode_display_name(fragment: Option<&str>, protocol: TransportProtocol) -> String {
    fragment
        .and_then(|f| urlencoding::decode(f).ok())
        .map(|name| name.into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| protocol.default_display_name().to_string())
}

/// Parses a port, defaulting to 443 when it is missing, invalid or zero
pub fn parse_port(s: &str) -> u16 {
    s.trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT)
}

/// Parses `host[:port]`, handling IPv6 addresses in brackets
///
/// A missing or unparsable port becomes 443. An empty host is an error.
pub fn parse_host_port(hostport: &str) -> Result<(String, u16)> {
    let hostport = hostport.trim().trim_end_matches('/');

    // Handle IPv6 addresses: [::1]:8080
    if let Some(bracketed) = hostport.strip_prefix('[') {
        let (host, rest) = bracketed
            .split_once(']')
            .ok_or_else(|| anyhow!("Invalid IPv6 address: missing closing bracket"))?;
        if host.is_empty() {
            bail!("Invalid link: empty host");
        }
        let port = rest.strip_prefix(':').map_or(DEFAULT_PORT, parse_port);
        return Ok((host.to_string(), port));
    }

    let (host, port) = match hostport.split_once(':') {
        Some((host, port)) => (host, parse_port(port)),
        None => (hostport, DEFAULT_PORT),
    };

    if host.is_empty() {
        bail!("Invalid link: empty host");
    }

    Ok((host.to_string(), port))
}
