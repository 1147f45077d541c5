// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload encoding for captured fragment values

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Base64 of the UTF-8 JSON text
pub fn encode(json: &str) -> String {
    STANDARD.encode(json.as_bytes())
}

/// Decode a payload back to JSON text
///
/// Returns an empty string for empty, invalid base64, or non-UTF-8 input.
pub fn decode(payload: &str) -> String {
    if payload.is_empty() {
        return String::new();
    }
    STANDARD
        .decode(payload.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

/// Uppercase hex SHA-256 of the JSON text
pub fn hash(json: &str) -> String {
    hex::encode_upper(Sha256::digest(json.as_bytes()))
}

/// Short name of a qualified type: last `.` segment before the first `,`
pub fn short_type_name(qualified: &str) -> &str {
    let full = type_full_name(qualified);
    full.rsplit('.').next().unwrap_or(full)
}

/// Part of a qualified type name before the first `,`
pub fn type_full_name(qualified: &str) -> &str {
    qualified.split(',').next().unwrap_or(qualified).trim()
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
