//! Feed format detection
//!
//! Subscription bodies arrive either as a plain list of links or as the
//! same list wrapped in one base64 blob. This module tells the two apart.

use tracing::debug;

use super::base64::decode_base64;

/// Link prefixes understood by the dispatcher, in dispatch order
pub const SUPPORTED_SCHEMES: [&str; 4] = ["vmess://", "vless://", "trojan://", "ss://"];

// ============================================================================
// Feed Format Detection
// ============================================================================

/// Detected subscription body format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    /// One link per line
    PlainLinkList,
    /// A link list wrapped in base64
    Base64LinkList,
    /// Neither of the above
    Unknown,
}

impl std::fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedFormat::PlainLinkList => write!(f, "Plain Link List"),
            FeedFormat::Base64LinkList => write!(f, "Base64 Link List"),
            FeedFormat::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Detects the format of a subscription body
pub fn detect_feed_format(content: &str) -> FeedFormat {
    let trimmed = content.trim();
    let content_preview: String = trimmed.chars().take(100).collect();
    debug!(
        "Detecting feed format, content length: {} bytes, preview: {:?}...",
        content.len(),
        content_preview
    );

    if is_plain_link_list(trimmed) {
        debug!("Detected plain link list");
        return FeedFormat::PlainLinkList;
    }

    if is_base64_content(trimmed) {
        debug!("Detected base64 encoded link list");
        return FeedFormat::Base64LinkList;
    }

    debug!("Unable to detect feed format");
    FeedFormat::Unknown
}

/// Checks if any line of the content is a supported link
pub fn is_plain_link_list(content: &str) -> bool {
    content.lines().any(|line| is_proxy_link(line.trim()))
}

/// Checks if a string starts with one of the supported schemes
pub fn is_proxy_link(s: &str) -> bool {
    SUPPORTED_SCHEMES.iter().any(|scheme| s.starts_with(scheme))
}

/// Checks if content is a base64 blob that decodes to a link list
pub fn is_base64_content(content: &str) -> bool {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.len() < 4 {
        return false;
    }

    let is_valid_base64 = cleaned.chars().all(|c| {
        c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=' || c == '-' || c == '_'
    });

    if !is_valid_base64 {
        return false;
    }

    if let Ok(decoded) = decode_base64(&cleaned)
        && let Ok(decoded_str) = String::from_utf8(decoded)
    {
        return is_plain_link_list(&decoded_str);
    }

    false
}
