//! Trojan protocol parser
//!
//! This module provides parsing for Trojan (trojan://) links.
//! Format: trojan://password@host:port?params#tag

use anyhow::{Result, anyhow, bail};
use tracing::trace;

use crate::config::{ServerConfig, TransportProtocol};

use super::{
    ProtocolParser, decode_display_name, parse_host_port, split_credential, split_fragment,
    split_query,
};

// ============================================================================
// Trojan Parser
// ============================================================================

/// Parser for Trojan (trojan://) links
///
/// Format: trojan://password@host:port?params#tag
///
/// Trojan always runs over TLS; query parameters are accepted but none of
/// them change the decoded record.
pub struct TrojanParser;

impl ProtocolParser for TrojanParser {
    fn scheme(&self) -> &str {
        "trojan"
    }

    fn parse(&self, uri: &str) -> Result<ServerConfig> {
        trace!("Parsing Trojan link");

        let body = uri
            .trim()
            .strip_prefix("trojan://")
            .ok_or_else(|| anyhow!("Invalid Trojan link: missing trojan:// prefix"))?;

        let (password, rest) = split_credential(body)?;
        if password.is_empty() {
            bail!("Trojan link missing password");
        }

        let (rest, fragment) = split_fragment(rest);
        let (hostport, query) = split_query(rest);
        if let Some(query) = query {
            trace!("Ignoring Trojan query parameters: {}", query);
        }
        let (server, port) = parse_host_port(hostport)?;

        let mut config = ServerConfig::new(TransportProtocol::Trojan, server, port, password);
        config.display_name = decode_display_name(fragment, TransportProtocol::Trojan);
        config.tls_enabled = true;
        Ok(config)
    }
}
