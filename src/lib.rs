pub mod cli;
pub mod config;
pub mod engine;
pub mod parser;
pub mod subscription;

pub use config::{ServerConfig, StreamType, TransportProtocol};
pub use engine::{EngineConfig, build_engine_config};
pub use parser::{parse_feed, parse_link};

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
