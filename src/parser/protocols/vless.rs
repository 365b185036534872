//! VLESS protocol parser
//!
//! This module provides parsing for VLESS (vless://) links.
//! Format: vless://uuid@host:port?params#tag

use anyhow::{Result, anyhow, bail};
use tracing::trace;

use crate::config::{DEFAULT_PATH, NO_CIPHER, ServerConfig, StreamType, TransportProtocol};

use super::{
    ProtocolParser, decode_display_name, parse_host_port, parse_query, split_credential,
    split_fragment, split_query,
};

// ============================================================================
// VLESS Parser
// ============================================================================

/// Parser for VLESS (vless://) links
///
/// Format: vless://uuid@host:port?params#tag
pub struct VLessParser;

impl ProtocolParser for VLessParser {
    fn scheme(&self) -> &str {
        "vless"
    }

    fn parse(&self, uri: &str) -> Result<ServerConfig> {
        trace!("Parsing VLESS link");

        let body = uri
            .trim()
            .strip_prefix("vless://")
            .ok_or_else(|| anyhow!("Invalid VLESS link: missing vless:// prefix"))?;

        let (uuid, rest) = split_credential(body)?;
        if uuid.is_empty() {
            bail!("VLESS link missing UUID");
        }

        let (rest, fragment) = split_fragment(rest);
        let (hostport, query) = split_query(rest);
        let params = query.map(parse_query).unwrap_or_default();
        let (server, port) = parse_host_port(hostport)?;

        trace!(
            "VLESS config: server={}:{}, params={:?}",
            server, port, params
        );

        let security = params.get("security").map(String::as_str);

        let mut config = ServerConfig::new(TransportProtocol::VLess, server, port, uuid);
        config.display_name = decode_display_name(fragment, TransportProtocol::VLess);
        config.cipher = params
            .get("encryption")
            .cloned()
            .unwrap_or_else(|| NO_CIPHER.to_string());
        config.stream_type = params
            .get("type")
            .map_or(StreamType::Tcp, |t| StreamType::from_network(t));
        config.path = params
            .get("path")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        config.host_header = params.get("host").cloned().unwrap_or_default();
        config.tls_enabled = matches!(security, Some("tls" | "xtls"));
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vless_full_link() {
        let uri = "vless://11111111-1111-1111-1111-111111111111@example.com:8443?type=ws&security=tls&path=%2Fapi#My%20Server";
        let config = VLessParser.parse(uri).unwrap();

        assert_eq!(config.transport_protocol, TransportProtocol::VLess);
        assert_eq!(config.secret, "11111111-1111-1111-1111-111111111111");
        assert_eq!(config.server_address, "example.com");
        assert_eq!(config.port, 8443);
        assert_eq!(config.stream_type, StreamType::WebSocket);
        assert!(config.tls_enabled);
        assert_eq!(config.path, "/api");
        assert_eq!(config.display_name, "My Server");
        assert_eq!(config.cipher, "none");
        assert_eq!(config.alter_id, 0);
    }

    #[test]
    fn test_vless_defaults() {
        let config = VLessParser.parse("vless://uuid@example.com").unwrap();
        assert_eq!(config.port, 443);
        assert_eq!(config.display_name, "VLESS Server");
        assert_eq!(config.stream_type, StreamType::Tcp);
        assert_eq!(config.path, "/");
        assert_eq!(config.host_header, "");
        assert_eq!(config.cipher, "none");
        assert!(!config.tls_enabled);
    }

    #[test]
    fn test_vless_unparsable_port() {
        let config = VLessParser.parse("vless://uuid@example.com:abc#n").unwrap();
        assert_eq!(config.port, 443);
    }

    #[test]
    fn test_vless_security_values() {
        let tls = VLessParser
            .parse("vless://uuid@example.com:443?security=tls")
            .unwrap();
        assert!(tls.tls_enabled);

        let xtls = VLessParser
            .parse("vless://uuid@example.com:443?security=xtls")
            .unwrap();
        assert!(xtls.tls_enabled);

        let reality = VLessParser
            .parse("vless://uuid@example.com:443?security=reality")
            .unwrap();
        assert!(!reality.tls_enabled);

        let none = VLessParser
            .parse("vless://uuid@example.com:443?security=none")
            .unwrap();
        assert!(!none.tls_enabled);
    }

    #[test]
    fn test_vless_grpc_and_http() {
        let grpc = VLessParser
            .parse("vless://uuid@example.com:443?type=grpc&serviceName=svc")
            .unwrap();
        assert_eq!(grpc.stream_type, StreamType::Grpc);

        let h2 = VLessParser
            .parse("vless://uuid@example.com:443?type=h2")
            .unwrap();
        assert_eq!(h2.stream_type, StreamType::Http);

        let upper = VLessParser
            .parse("vless://uuid@example.com:443?type=WS")
            .unwrap();
        assert_eq!(upper.stream_type, StreamType::WebSocket);
    }

    #[test]
    fn test_vless_host_and_encryption() {
        let config = VLessParser
            .parse("vless://uuid@example.com:443?type=ws&host=cdn.example.com&encryption=aes#n")
            .unwrap();
        assert_eq!(config.host_header, "cdn.example.com");
        assert_eq!(config.cipher, "aes");
    }

    #[test]
    fn test_vless_query_keys_are_case_sensitive() {
        let config = VLessParser
            .parse("vless://uuid@example.com:443?TYPE=ws&Security=tls")
            .unwrap();
        assert_eq!(config.stream_type, StreamType::Tcp);
        assert!(!config.tls_enabled);
    }

    #[test]
    fn test_vless_fragment_before_query_markers() {
        // '?' inside the fragment is part of the name
        let config = VLessParser
            .parse("vless://uuid@example.com:2083#name?type=ws")
            .unwrap();
        assert_eq!(config.display_name, "name?type=ws");
        assert_eq!(config.stream_type, StreamType::Tcp);
        assert_eq!(config.port, 2083);
    }

    #[test]
    fn test_vless_trailing_slash_before_query() {
        let config = VLessParser
            .parse("vless://uuid@example.com:2053/?type=ws&path=/ws")
            .unwrap();
        assert_eq!(config.port, 2053);
        assert_eq!(config.path, "/ws");
    }

    #[test]
    fn test_vless_ipv6_host() {
        let config = VLessParser.parse("vless://uuid@[::1]:8443#v6").unwrap();
        assert_eq!(config.server_address, "::1");
        assert_eq!(config.port, 8443);
    }

    #[test]
    fn test_vless_failures() {
        assert!(VLessParser.parse("vless://").is_err());
        assert!(VLessParser.parse("vless://example.com:443").is_err());
        assert!(VLessParser.parse("vless://uuid@:443").is_err());
        assert!(VLessParser.parse("vless://uuid@?type=ws").is_err());
        assert!(VLessParser.parse("vless://@example.com:443").is_err());
        assert!(VLessParser.parse("trojan://pw@example.com").is_err());
    }

    #[test]
    fn test_scheme() {
        assert_eq!(VLessParser.scheme(), "vless");
        assert!(VLessParser.can_parse("vless://uuid@host"));
        assert!(!VLessParser.can_parse("vmess://abc"));
    }
}
