//! Subscription and Link Parsing Module
//!
//! This module provides functionality for:
//! - Detecting subscription body formats (plain or Base64 wrapped link lists)
//! - Decoding lenient Base64 payloads
//! - Parsing proxy links (vmess://, vless://, trojan://, ss://)
//! - Turning a whole subscription body into server configs

pub mod base64;
pub mod detection;
pub mod feed;
pub mod protocols;

use std::sync::LazyLock;

pub use detection::{FeedFormat, detect_feed_format};
pub use feed::{FeedReport, decode_feed_body, parse_feed, parse_feed_report};
pub use protocols::{Dispatch, ProtocolParser, ProtocolRegistry};

use crate::config::ServerConfig;

static BUILTIN_REGISTRY: LazyLock<ProtocolRegistry> =
    LazyLock::new(ProtocolRegistry::with_builtin_parsers);

/// Registry holding the four built-in parsers
pub fn builtin_registry() -> &'static ProtocolRegistry {
    &BUILTIN_REGISTRY
}

/// Decodes one trimmed link line with the built-in parsers
///
/// Returns `None` both for lines no parser recognizes and for malformed
/// links; use [`ProtocolRegistry::dispatch`] to tell the two apart.
pub fn parse_link(line: &str) -> Option<ServerConfig> {
    builtin_registry().parse_link(line)
}
