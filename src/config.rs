//! Canonical server configuration model
//!
//! Every supported link format decodes into a single [`ServerConfig`]
//! record, which the engine serializer consumes without caring which
//! scheme it came from.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Defaults
// ============================================================================

/// Port used when a link carries no port or an unparsable one
pub const DEFAULT_PORT: u16 = 443;

/// Stream path used when a link does not specify one
pub const DEFAULT_PATH: &str = "/";

/// VMess cipher used when the `scy` field is absent
pub const DEFAULT_VMESS_CIPHER: &str = "auto";

/// Cipher for protocols without an encryption setting
pub const NO_CIPHER: &str = "none";

// ============================================================================
// Enumerations
// ============================================================================

/// Proxy protocol a link encodes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    #[serde(rename = "vmess")]
    VMess,
    #[serde(rename = "vless")]
    VLess,
    Trojan,
    Shadowsocks,
}

impl TransportProtocol {
    /// Lower-case protocol name as the engine expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportProtocol::VMess => "vmess",
            TransportProtocol::VLess => "vless",
            TransportProtocol::Trojan => "trojan",
            TransportProtocol::Shadowsocks => "shadowsocks",
        }
    }

    /// Name used when a link carries no display name
    pub fn default_display_name(&self) -> &'static str {
        match self {
            TransportProtocol::VMess => "VMess Server",
            TransportProtocol::VLess => "VLESS Server",
            TransportProtocol::Trojan => "Trojan Server",
            TransportProtocol::Shadowsocks => "Shadowsocks Server",
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Stream framing layered under the proxy protocol
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StreamType {
    #[default]
    #[serde(rename = "tcp")]
    Tcp,
    #[serde(rename = "ws")]
    WebSocket,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "grpc")]
    Grpc,
}

impl StreamType {
    /// Maps a link's network field (`net` / `type`) to a stream type.
    ///
    /// Matching is case-insensitive; unknown values fall back to TCP.
    pub fn from_network(network: &str) -> Self {
        match network.to_lowercase().as_str() {
            "ws" => StreamType::WebSocket,
            "tcp" => StreamType::Tcp,
            "grpc" => StreamType::Grpc,
            "h2" | "http" => StreamType::Http,
            _ => StreamType::Tcp,
        }
    }

    /// Network name as the engine expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Tcp => "tcp",
            StreamType::WebSocket => "ws",
            StreamType::Http => "http",
            StreamType::Grpc => "grpc",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// One decoded server descriptor
///
/// `secret` is overloaded per protocol: a user id for VMess/VLESS, the
/// password for Trojan and the password half of `method:password` for
/// Shadowsocks. `cipher` likewise carries `scy`, `encryption` or the
/// Shadowsocks method.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Fresh per decode, used by callers as a lookup key
    pub identity: Uuid,
    pub display_name: String,
    pub server_address: String,
    pub port: u16,
    pub transport_protocol: TransportProtocol,
    pub secret: String,
    /// Only meaningful for VMess
    pub alter_id: u32,
    pub cipher: String,
    pub stream_type: StreamType,
    pub path: String,
    pub host_header: String,
    pub tls_enabled: bool,
}

impl ServerConfig {
    /// Creates a record for `protocol` with a fresh identity and the
    /// protocol-neutral defaults; decoders fill in the rest.
    pub fn new(
        protocol: TransportProtocol,
        server_address: impl Into<String>,
        port: u16,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            identity: Uuid::new_v4(),
            display_name: protocol.default_display_name().to_string(),
            server_address: server_address.into(),
            port,
            transport_protocol: protocol,
            secret: secret.into(),
            alter_id: 0,
            cipher: NO_CIPHER.to_string(),
            stream_type: StreamType::Tcp,
            path: DEFAULT_PATH.to_string(),
            host_header: String::new(),
            tls_enabled: false,
        }
    }

    /// `host:port`, with IPv6 literals in brackets
    pub fn endpoint(&self) -> String {
        if self.server_address.contains(':') {
            format!("[{}]:{}", self.server_address, self.port)
        } else {
            format!("{}:{}", self.server_address, self.port)
        }
    }
}

impl Default for ServerConfig {
    /// Template record offered when the user has nothing saved yet
    fn default() -> Self {
        Self {
            identity: Uuid::new_v4(),
            display_name: "USA Server".to_string(),
            server_address: "your-server.example.com".to_string(),
            port: DEFAULT_PORT,
            transport_protocol: TransportProtocol::VMess,
            secret: "YOUR-UUID-HERE".to_string(),
            alter_id: 0,
            cipher: DEFAULT_VMESS_CIPHER.to_string(),
            stream_type: StreamType::WebSocket,
            path: DEFAULT_PATH.to_string(),
            host_header: String::new(),
            tls_enabled: true,
        }
    }
}
