//! Shadowsocks protocol parser
//!
//! This module provides parsing for Shadowsocks (ss://) links.
//! Supports the SIP002 format and the legacy all-in-one Base64 format.

use anyhow::{Context, Result, anyhow, bail};
use tracing::trace;

use crate::config::{ServerConfig, TransportProtocol};
use crate::parser::base64::decode_base64_with;

use super::{ProtocolParser, decode_display_name, parse_host_port, split_fragment, split_query};

// ============================================================================
// Shadowsocks Parser
// ============================================================================

/// Parser for Shadowsocks (ss://) links
///
/// - SIP002: ss://BASE64(method:password)@host:port#tag
/// - SIP002 with plain userinfo: ss://method:password@host:port#tag
/// - SIP002 with SIP003 plugin: ss://userinfo@host:port/?plugin=...#tag (plugin ignored)
/// - Legacy: ss://BASE64(method:password@host:port)#tag
pub struct ShadowsocksParser;

impl ProtocolParser for ShadowsocksParser {
    fn scheme(&self) -> &str {
        "ss"
    }

    fn parse(&self, uri: &str) -> Result<ServerConfig> {
        trace!("Parsing Shadowsocks link");

        let without_scheme = uri
            .trim()
            .strip_prefix("ss://")
            .ok_or_else(|| anyhow!("Invalid Shadowsocks link: missing ss:// prefix"))?;

        let (main_part, fragment) = split_fragment(without_scheme);
        let display_name = decode_display_name(fragment, TransportProtocol::Shadowsocks);

        let (method, password, hostport) = match main_part.split_once('@') {
            Some((userinfo, hostpart)) => {
                trace!("Parsing as SIP002 format (found @ separator)");
                let (hostport, query) = split_query(hostpart);
                if let Some(query) = query {
                    trace!("Ignoring Shadowsocks query parameters: {}", query);
                }
                let (method, password) = self.parse_userinfo(userinfo)?;
                (method, password, hostport.to_string())
            }
            None => {
                trace!("Parsing as legacy Base64 format");
                self.parse_legacy(split_query(main_part).0)?
            }
        };

        if method.is_empty() {
            bail!("Shadowsocks link has an empty method");
        }
        if password.is_empty() {
            bail!("Shadowsocks link has an empty password");
        }

        let (server, port) = parse_host_port(&hostport)?;

        let mut config = ServerConfig::new(TransportProtocol::Shadowsocks, server, port, password);
        config.display_name = display_name;
        config.cipher = method;
        Ok(config)
    }
}

impl ShadowsocksParser {
    /// Parses userinfo which can be Base64(method:password) or method:password
    fn parse_userinfo(&self, userinfo: &str) -> Result<(String, String)> {
        // ':' never appears in Base64, so its presence means plain userinfo
        let plain = urlencoding::decode(userinfo)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| userinfo.to_string());
        if let Some((method, password)) = plain.split_once(':') {
            trace!("Shadowsocks userinfo is plain method:password");
            return Ok((method.to_string(), password.to_string()));
        }

        decode_base64_with(userinfo, |bytes| {
            let decoded = String::from_utf8(bytes).context("Invalid UTF-8 in Shadowsocks userinfo")?;
            let (method, password) = decoded
                .split_once(':')
                .ok_or_else(|| anyhow!("Invalid Shadowsocks userinfo: missing ':' separator"))?;
            Ok((method.to_string(), password.to_string()))
        })
        .context("Failed to decode Shadowsocks userinfo")
    }

    /// Parses legacy format: BASE64(method:password@host:port)
    fn parse_legacy(&self, main_part: &str) -> Result<(String, String, String)> {
        decode_base64_with(main_part, |bytes| {
            let decoded = String::from_utf8(bytes).context("Invalid UTF-8 in Shadowsocks link")?;
            let (userinfo, hostport) = decoded
                .rsplit_once('@')
                .ok_or_else(|| anyhow!("Invalid legacy Shadowsocks format: missing @"))?;
            let (method, password) = userinfo.split_once(':').ok_or_else(|| {
                anyhow!("Invalid Shadowsocks userinfo: missing method:password separator")
            })?;
            Ok((
                method.to_string(),
                password.to_string(),
                hostport.to_string(),
            ))
        })
        .context("Failed to decode legacy Shadowsocks link")
    }
}
