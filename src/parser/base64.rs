//! Base64 decoding utilities
//!
//! Links in public feeds are rarely canonical base64: padding is often
//! missing, the URL-safe alphabet shows up next to the standard one, and
//! stray characters get glued onto payloads. The helpers here tolerate all
//! of that and leave it to the caller to decide whether the decoded bytes
//! make sense.

use anyhow::{Result, bail};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::trace;

// ============================================================================
// Engines
// ============================================================================

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

/// Standard alphabet, padding optional
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// URL-safe alphabet, padding optional
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

// ============================================================================
// Base64 Decoding
// ============================================================================

/// Returns `true` for characters of either base64 alphabet, or padding
fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_' | '=')
}

/// Drops whitespace and any character outside the base64 alphabets
pub fn strip_unknown_characters(content: &str) -> String {
    content.chars().filter(|c| is_base64_char(*c)).collect()
}

/// Decodes Base64 content, ignoring unknown characters
///
/// Attempts the standard alphabet first, then the URL-safe one. Padding may
/// be present or missing.
pub fn decode_base64(content: &str) -> Result<Vec<u8>> {
    let cleaned = strip_unknown_characters(content);
    trace!(
        "Attempting Base64 decode, cleaned length: {} bytes",
        cleaned.len()
    );

    if let Ok(decoded) = STANDARD_LENIENT.decode(&cleaned) {
        trace!("Decoded using standard Base64");
        return Ok(decoded);
    }

    if let Ok(decoded) = URL_SAFE_LENIENT.decode(&cleaned) {
        trace!("Decoded using URL-safe Base64");
        return Ok(decoded);
    }

    bail!("Failed to decode Base64 content")
}

/// Decodes after right-padding the content with `=` to a multiple of four
pub fn decode_base64_padded(content: &str) -> Result<Vec<u8>> {
    let cleaned = strip_unknown_characters(content);
    let padded = add_base64_padding(cleaned.trim_end_matches('='));
    trace!("Retrying Base64 decode with padding: {} bytes", padded.len());
    decode_base64(&padded)
}

/// Decodes `content` and hands the bytes to `parse`, retrying with padding
/// added when either the decode or the parse step fails.
pub fn decode_base64_with<T>(content: &str, parse: impl Fn(Vec<u8>) -> Result<T>) -> Result<T> {
    let direct = decode_base64(content).and_then(&parse);
    match direct {
        Ok(value) => Ok(value),
        Err(first) => {
            trace!("Direct Base64 attempt failed: {}", first);
            decode_base64_padded(content).and_then(&parse)
        }
    }
}

/// Adds proper padding to Base64 string if missing
///
/// Base64 strings should have a length that is a multiple of 4.
/// This function adds '=' padding characters as needed.
pub fn add_base64_padding(s: &str) -> String {
    let mut result = s.to_string();
    while !result.len().is_multiple_of(4) {
        result.push('=');
    }
    result
}
