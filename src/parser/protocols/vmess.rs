//! VMess protocol parser
//!
//! This module provides parsing for VMess (vmess://) links.
//! VMess links are Base64 encoded JSON containing connection details.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::trace;

use crate::config::{
    DEFAULT_PATH, DEFAULT_PORT, DEFAULT_VMESS_CIPHER, ServerConfig, StreamType, TransportProtocol,
};
use crate::parser::base64::decode_base64_with;

use super::ProtocolParser;

/// Protocol names some feeds append to otherwise valid payloads
const STRAY_SUFFIXES: [&str; 2] = ["vmess", "vless"];

// ============================================================================
// VMess Parser
// ============================================================================

/// Parser for VMess (vmess://) links
///
/// VMess links are Base64 encoded JSON:
/// vmess://BASE64({ "v": "2", "ps": "name", "add": "host", "port": 443, ... })
pub struct VMessParser;

/// VMess link JSON structure
///
/// Every field is optional and tolerant of the wrong JSON type, which is
/// then treated as absent. Only `add` and `id` are required, and that is
/// checked after deserialization.
#[derive(Deserialize, Debug, Default)]
struct VMessJson {
    /// Remark/name
    #[serde(default, deserialize_with = "lenient_string")]
    ps: Option<String>,
    /// Server address
    #[serde(default, deserialize_with = "lenient_string")]
    add: Option<String>,
    /// Server port (can be string or number)
    #[serde(default, deserialize_with = "lenient_port")]
    port: Option<u16>,
    /// UUID
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    /// Alter ID (can be string or number)
    #[serde(default, deserialize_with = "lenient_u32")]
    aid: Option<u32>,
    /// Security/encryption method
    #[serde(default, deserialize_with = "lenient_string")]
    scy: Option<String>,
    /// Network type (tcp, ws, etc.)
    #[serde(default, deserialize_with = "lenient_string")]
    net: Option<String>,
    /// TLS setting
    #[serde(default, deserialize_with = "lenient_string")]
    tls: Option<String>,
    /// WebSocket/HTTP host header
    #[serde(default, deserialize_with = "lenient_string")]
    host: Option<String>,
    /// WebSocket/HTTP path
    #[serde(default, deserialize_with = "lenient_string")]
    path: Option<String>,
}

impl ProtocolParser for VMessParser {
    fn scheme(&self) -> &str {
        "vmess"
    }

    fn parse(&self, uri: &str) -> Result<ServerConfig> {
        trace!("Parsing VMess link");

        let encoded = uri
            .trim()
            .strip_prefix("vmess://")
            .ok_or_else(|| anyhow!("Invalid VMess link: missing vmess:// prefix"))?;

        let cleaned = strip_stray_suffixes(encoded);

        let json = decode_base64_with(&cleaned, parse_vmess_json)
            .context("Failed to decode VMess link")?;

        trace!(
            "VMess config: server={:?}:{:?}, net={:?}, tls={:?}",
            json.add, json.port, json.net, json.tls
        );

        self.build_config(json)
    }
}

impl VMessParser {
    fn build_config(&self, json: VMessJson) -> Result<ServerConfig> {
        let address = match json.add {
            Some(add) if !add.is_empty() => add,
            Some(_) => bail!("VMess link has an empty address"),
            None => bail!("VMess link missing 'add' field"),
        };
        let id = match json.id {
            Some(id) if !id.is_empty() => id,
            Some(_) => bail!("VMess link has an empty id"),
            None => bail!("VMess link missing 'id' field"),
        };

        let display_name = match json.ps {
            Some(ps) if ps.is_empty() => format!("VMess {}", address),
            Some(ps) => ps,
            None => TransportProtocol::VMess.default_display_name().to_string(),
        };

        let path = json
            .path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let mut config = ServerConfig::new(
            TransportProtocol::VMess,
            address,
            json.port.unwrap_or(DEFAULT_PORT),
            id,
        );
        config.display_name = display_name;
        config.alter_id = json.aid.unwrap_or(0);
        config.cipher = json.scy.unwrap_or_else(|| DEFAULT_VMESS_CIPHER.to_string());
        config.stream_type = json
            .net
            .as_deref()
            .map_or(StreamType::Tcp, StreamType::from_network);
        config.path = path;
        config.host_header = json.host.unwrap_or_default();
        config.tls_enabled = json.tls.is_some_and(|tls| !tls.is_empty());
        Ok(config)
    }
}

/// Parses the decoded payload, which must be a JSON object
///
/// Going through a map rejects arrays, which serde would otherwise bind to
/// the struct fields by position, and lets a repeated key overwrite the
/// earlier one.
fn parse_vmess_json(bytes: Vec<u8>) -> Result<VMessJson> {
    let object: Map<String, Value> =
        serde_json::from_slice(&bytes).context("VMess payload is not a JSON object")?;
    VMessJson::deserialize(Value::Object(object)).context("Failed to parse VMess JSON")
}

/// Removes every occurrence of the stray protocol names, then trims
///
/// This also hits legitimate payloads that happen to contain those
/// substrings; such links fail to decode and are skipped.
fn strip_stray_suffixes(payload: &str) -> String {
    STRAY_SUFFIXES
        .iter()
        .fold(payload.to_string(), |acc, suffix| acc.replace(suffix, ""))
        .trim()
        .to_string()
}

// ============================================================================
// Deserialization Helpers
// ============================================================================

/// Any JSON value, keeping only the shapes the link fields can take
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(u64),
    String(String),
    Other(serde::de::IgnoredAny),
}

/// Keeps strings, treats every other JSON type as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match LooseValue::deserialize(deserializer)? {
        LooseValue::String(s) => Ok(Some(s)),
        LooseValue::Number(_) | LooseValue::Other(_) => Ok(None),
    }
}

/// Accepts a port as number or numeric string; anything else is absent
fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let port = match LooseValue::deserialize(deserializer)? {
        LooseValue::Number(n) => u16::try_from(n).ok(),
        LooseValue::String(s) => s.trim().parse().ok(),
        LooseValue::Other(_) => None,
    };
    Ok(port.filter(|p| *p != 0))
}

/// Accepts a u32 as number or numeric string; anything else is absent
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match LooseValue::deserialize(deserializer)? {
        LooseValue::Number(n) => Ok(u32::try_from(n).ok()),
        LooseValue::String(s) => Ok(s.trim().parse().ok()),
        LooseValue::Other(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

    fn encode_vmess_json(json: &str) -> String {
        format!("vmess://{}", STANDARD.encode(json))
    }

    #[test]
    fn test_vmess_basic() {
        let json = r#"{"v":"2","ps":"test-node","add":"example.com","port":8443,"id":"uuid-here","aid":0}"#;
        let config = VMessParser.parse(&encode_vmess_json(json)).unwrap();

        assert_eq!(config.transport_protocol, TransportProtocol::VMess);
        assert_eq!(config.display_name, "test-node");
        assert_eq!(config.server_address, "example.com");
        assert_eq!(config.port, 8443);
        assert_eq!(config.secret, "uuid-here");
        assert_eq!(config.alter_id, 0);
        assert_eq!(config.cipher, "auto");
        assert_eq!(config.stream_type, StreamType::Tcp);
        assert_eq!(config.path, "/");
        assert_eq!(config.host_header, "");
        assert!(!config.tls_enabled);
    }

    #[test]
    fn test_vmess_with_websocket_and_tls() {
        let json = r#"{"v":"2","ps":"ws-node","add":"example.com","port":"443","id":"uuid","aid":"2","net":"WS","path":"/ws","host":"ws.example.com","tls":"tls","scy":"aes-128-gcm"}"#;
        let config = VMessParser.parse(&encode_vmess_json(json)).unwrap();

        assert_eq!(config.stream_type, StreamType::WebSocket);
        assert_eq!(config.path, "/ws");
        assert_eq!(config.host_header, "ws.example.com");
        assert!(config.tls_enabled);
        assert_eq!(config.alter_id, 2);
        assert_eq!(config.cipher, "aes-128-gcm");
    }

    #[test]
    fn test_vmess_network_mapping() {
        for (net, expected) in [
            ("grpc", StreamType::Grpc),
            ("h2", StreamType::Http),
            ("http", StreamType::Http),
            ("tcp", StreamType::Tcp),
            ("quic", StreamType::Tcp),
        ] {
            let json = format!(r#"{{"add":"example.com","id":"uuid","net":"{}"}}"#, net);
            let config = VMessParser.parse(&encode_vmess_json(&json)).unwrap();
            assert_eq!(config.stream_type, expected, "net={}", net);
        }
    }

    #[test]
    fn test_vmess_missing_port_defaults_to_443() {
        let json = r#"{"add":"example.com","id":"uuid"}"#;
        let config = VMessParser.parse(&encode_vmess_json(json)).unwrap();
        assert_eq!(config.port, 443);
    }

    #[test]
    fn test_vmess_unparsable_port_defaults_to_443() {
        for port in [r#""abc""#, "70000", "null", "true", r#""""#] {
            let json = format!(r#"{{"add":"example.com","id":"uuid","port":{}}}"#, port);
            let config = VMessParser.parse(&encode_vmess_json(&json)).unwrap();
            assert_eq!(config.port, 443, "port={}", port);
        }
    }

    #[test]
    fn test_vmess_missing_padding() {
        let json = r#"{"add":"example.com","port":443,"id":"uuid","ps":"x"}"#;
        let encoded = STANDARD_NO_PAD.encode(json);
        assert_ne!(encoded.len() % 4, 0);
        let config = VMessParser.parse(&format!("vmess://{}", encoded)).unwrap();
        assert_eq!(config.server_address, "example.com");
    }

    #[test]
    fn test_vmess_strips_stray_suffix() {
        let json = r#"{"add":"example.com","port":443,"id":"uuid"}"#;
        let uri = format!("{}vless", encode_vmess_json(json));
        let config = VMessParser.parse(&uri).unwrap();
        assert_eq!(config.server_address, "example.com");

        let uri = format!("{}vmess  ", encode_vmess_json(json));
        assert!(VMessParser.parse(&uri).is_ok());
    }

    #[test]
    fn test_vmess_name_defaults() {
        let json = r#"{"ps":"","add":"example.com","id":"uuid"}"#;
        let config = VMessParser.parse(&encode_vmess_json(json)).unwrap();
        assert_eq!(config.display_name, "VMess example.com");

        let json = r#"{"add":"example.com","id":"uuid"}"#;
        let config = VMessParser.parse(&encode_vmess_json(json)).unwrap();
        assert_eq!(config.display_name, "VMess Server");
    }

    #[test]
    fn test_vmess_wrong_types_treated_as_absent() {
        let json = r#"{"ps":42,"add":"example.com","id":"uuid","tls":false,"net":["ws"],"path":null}"#;
        let config = VMessParser.parse(&encode_vmess_json(json)).unwrap();
        assert_eq!(config.display_name, "VMess Server");
        assert!(!config.tls_enabled);
        assert_eq!(config.stream_type, StreamType::Tcp);
        assert_eq!(config.path, "/");
    }

    #[test]
    fn test_vmess_missing_required_fields() {
        for json in [
            r#"{"port":443,"id":"uuid"}"#,
            r#"{"add":"example.com","port":443}"#,
            r#"{"add":"","id":"uuid"}"#,
            r#"{"add":"example.com","id":""}"#,
            r#"{"add":1234,"id":"uuid"}"#,
        ] {
            assert!(
                VMessParser.parse(&encode_vmess_json(json)).is_err(),
                "json={}",
                json
            );
        }
    }

    #[test]
    fn test_vmess_invalid_payloads() {
        assert!(VMessParser.parse("vmess://").is_err());
        assert!(VMessParser.parse("vmess://not-base64!@#$").is_err());
        assert!(VMessParser.parse(&encode_vmess_json("not json")).is_err());
        assert!(VMessParser.parse(&encode_vmess_json("[1,2,3]")).is_err());
        assert!(VMessParser.parse("ss://wrong-scheme").is_err());
    }

    #[test]
    fn test_vmess_rejects_json_array() {
        let json = r#"["n","evil.example.com",8443,"uuid-from-array"]"#;
        assert!(VMessParser.parse(&encode_vmess_json(json)).is_err());
        assert!(crate::parser::parse_link(&encode_vmess_json(json)).is_none());
    }

    #[test]
    fn test_vmess_repeated_key_last_wins() {
        let json = r#"{"add":"a.example.com","add":"b.example.com","id":"uuid"}"#;
        let config = VMessParser.parse(&encode_vmess_json(json)).unwrap();
        assert_eq!(config.server_address, "b.example.com");
    }

    #[test]
    fn test_strip_stray_suffixes() {
        assert_eq!(strip_stray_suffixes("abcvmess"), "abc");
        assert_eq!(strip_stray_suffixes("abvlessc vmess "), "abc");
        assert_eq!(strip_stray_suffixes("  abc  "), "abc");
    }

    #[test]
    fn test_scheme() {
        assert_eq!(VMessParser.scheme(), "vmess");
        assert!(VMessParser.can_parse("vmess://abc"));
        assert!(!VMessParser.can_parse("vless://abc"));
    }
}
