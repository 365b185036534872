use serde::{Deserialize, Serialize};

/// Port of the local SOCKS5 listener the engine exposes
pub const LOCAL_SOCKS_PORT: u16 = 1080;

/// Inbound listener configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Inbound {
    pub port: u16,
    pub protocol: String,
    pub settings: SocksSettings,
}

/// SOCKS inbound settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SocksSettings {
    /// `noauth` or `password`
    pub auth: String,
    pub udp: bool,
}

impl Inbound {
    /// The no-auth, UDP-enabled SOCKS5 listener on [`LOCAL_SOCKS_PORT`]
    pub fn local_socks() -> Self {
        Self {
            port: LOCAL_SOCKS_PORT,
            protocol: "socks".to_string(),
            settings: SocksSettings {
                auth: "noauth".to_string(),
                udp: true,
            },
        }
    }
}
