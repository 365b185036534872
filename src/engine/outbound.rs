use serde::{Deserialize, Serialize};

use crate::config::{ServerConfig, StreamType};

// ============================================================================
// Outbound
// ============================================================================

/// Outbound configuration pointing the engine at one remote server
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Outbound {
    /// Lower-case protocol name: vmess, vless, trojan or shadowsocks
    pub protocol: String,
    pub settings: OutboundSettings,
    #[serde(rename = "streamSettings")]
    pub stream_settings: StreamSettings,
}

/// Server list of an outbound
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutboundSettings {
    pub vnext: Vec<ServerEndpoint>,
}

/// One remote server and the users allowed on it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerEndpoint {
    pub address: String,
    pub port: u16,
    pub users: Vec<User>,
}

/// Credential block
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    /// User id, or the password for Trojan and Shadowsocks
    pub id: String,
    #[serde(rename = "alterId")]
    pub alter_id: u32,
    /// Cipher name
    pub security: String,
}

// ============================================================================
// Stream Settings
// ============================================================================

/// Transport settings of an outbound
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StreamSettings {
    /// tcp, ws, http or grpc
    pub network: String,
    /// `tls` or `none`
    pub security: String,
    /// Only present for WebSocket streams
    #[serde(
        rename = "wsSettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ws_settings: Option<WsSettings>,
}

/// WebSocket transport settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WsSettings {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<WsHeaders>,
}

/// Headers sent with the WebSocket upgrade
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WsHeaders {
    #[serde(rename = "Host")]
    pub host: String,
}

impl From<&ServerConfig> for Outbound {
    fn from(config: &ServerConfig) -> Self {
        Self {
            protocol: config.transport_protocol.as_str().to_string(),
            settings: OutboundSettings {
                vnext: vec![ServerEndpoint {
                    address: config.server_address.clone(),
                    port: config.port,
                    users: vec![User {
                        id: config.secret.clone(),
                        alter_id: config.alter_id,
                        security: config.cipher.clone(),
                    }],
                }],
            },
            stream_settings: StreamSettings::from(config),
        }
    }
}

impl From<&ServerConfig> for StreamSettings {
    fn from(config: &ServerConfig) -> Self {
        let ws_settings = (config.stream_type == StreamType::WebSocket).then(|| WsSettings {
            path: config.path.clone(),
            headers: (!config.host_header.is_empty()).then(|| WsHeaders {
                host: config.host_header.clone(),
            }),
        });

        Self {
            network: config.stream_type.as_str().to_string(),
            security: if config.tls_enabled { "tls" } else { "none" }.to_string(),
            ws_settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportProtocol;
    use serde_json::json;

    #[test]
    fn test_outbound_from_vmess() {
        let mut config = ServerConfig::new(TransportProtocol::VMess, "example.com", 8443, "uuid");
        config.alter_id = 4;
        config.cipher = "auto".to_string();
        let outbound = Outbound::from(&config);

        assert_eq!(outbound.protocol, "vmess");
        let server = &outbound.settings.vnext[0];
        assert_eq!(server.address, "example.com");
        assert_eq!(server.port, 8443);
        assert_eq!(server.users[0].id, "uuid");
        assert_eq!(server.users[0].alter_id, 4);
        assert_eq!(server.users[0].security, "auto");
    }

    #[test]
    fn test_stream_settings_tcp_has_no_ws_settings() {
        let mut config = ServerConfig::new(TransportProtocol::Trojan, "example.com", 443, "pw");
        config.tls_enabled = true;
        config.host_header = "ignored.example.com".to_string();
        let json = serde_json::to_value(StreamSettings::from(&config)).unwrap();
        assert_eq!(json, json!({"network": "tcp", "security": "tls"}));
    }

    #[test]
    fn test_stream_settings_ws_without_host() {
        let mut config = ServerConfig::new(TransportProtocol::VLess, "example.com", 443, "id");
        config.stream_type = StreamType::WebSocket;
        config.path = "/ws".to_string();
        let json = serde_json::to_value(StreamSettings::from(&config)).unwrap();
        assert_eq!(
            json,
            json!({"network": "ws", "security": "none", "wsSettings": {"path": "/ws"}})
        );
    }

    #[test]
    fn test_stream_settings_ws_with_host() {
        let mut config = ServerConfig::new(TransportProtocol::VLess, "example.com", 443, "id");
        config.stream_type = StreamType::WebSocket;
        config.host_header = "cdn.example.com".to_string();
        let json = serde_json::to_value(StreamSettings::from(&config)).unwrap();
        assert_eq!(
            json["wsSettings"],
            json!({"path": "/", "headers": {"Host": "cdn.example.com"}})
        );
    }

    #[test]
    fn test_stream_settings_roundtrip() {
        let json = r#"{"network":"ws","security":"tls","wsSettings":{"path":"/a","headers":{"Host":"h"}}}"#;
        let settings: StreamSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.ws_settings.unwrap().headers.unwrap().host, "h");
    }
}
