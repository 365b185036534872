//! Subscription feed parsing
//!
//! A feed is a text body with one candidate link per line. Lines that no
//! parser recognizes, or that fail to decode, are skipped; they never fail
//! the whole feed.

use tracing::{debug, warn};

use crate::config::ServerConfig;

use super::base64::decode_base64;
use super::detection::{FeedFormat, detect_feed_format};
use super::protocols::{Dispatch, ProtocolRegistry};
use super::builtin_registry;

// ============================================================================
// Feed Report
// ============================================================================

/// Outcome of parsing one feed
#[derive(Debug, Default)]
pub struct FeedReport {
    /// Decoded servers, in line order
    pub servers: Vec<ServerConfig>,
    /// Non-empty lines that were evaluated
    pub lines_seen: usize,
    /// Lines without a supported scheme
    pub unrecognized: usize,
    /// Lines with a supported scheme that failed to decode
    pub malformed: usize,
}

// ============================================================================
// Feed Parsing
// ============================================================================

/// Characters treated as line breaks in a feed body
fn is_newline(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Parses up to `limit` servers from a feed body
pub fn parse_feed(content: &str, limit: usize) -> Vec<ServerConfig> {
    parse_feed_report(content, limit).servers
}

/// Parses up to `limit` servers and counts what was skipped
pub fn parse_feed_report(content: &str, limit: usize) -> FeedReport {
    parse_feed_with_registry(builtin_registry(), content, limit)
}

/// Parses a feed with a caller-supplied registry
///
/// Scanning stops as soon as `limit` servers have been collected; later
/// lines are never evaluated.
pub fn parse_feed_with_registry(
    registry: &ProtocolRegistry,
    content: &str,
    limit: usize,
) -> FeedReport {
    let mut report = FeedReport::default();

    for line in content.split(is_newline) {
        if report.servers.len() >= limit {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.lines_seen += 1;

        match registry.dispatch(line) {
            Dispatch::Decoded(config) => report.servers.push(config),
            Dispatch::Rejected(_) => report.malformed += 1,
            Dispatch::Unrecognized => report.unrecognized += 1,
        }
    }

    debug!(
        "Feed parsing complete: {} lines, {} servers, {} malformed, {} unrecognized",
        report.lines_seen,
        report.servers.len(),
        report.malformed,
        report.unrecognized
    );

    report
}

/// Unwraps a Base64 wrapped feed body; other bodies are returned unchanged
pub fn decode_feed_body(content: &str) -> String {
    match detect_feed_format(content) {
        FeedFormat::Base64LinkList => match decode_base64(content.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(decoded) => decoded,
            None => {
                warn!("Feed looked Base64 encoded but could not be decoded");
                content.to_string()
            }
        },
        FeedFormat::PlainLinkList | FeedFormat::Unknown => content.to_string(),
    }
}
