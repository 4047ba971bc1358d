//! Status codes returned in the API's JSON envelope.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Server-side codes that are expected to clear up on an immediate retry.
pub const TRANSIENT_CODES: &[i64] = &[500, 502, 503, 504];

static STATUS_MESSAGES: LazyLock<HashMap<i64, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (200, "Request succeeded but no image was returned"),
        (
            401,
            "Invalid API key, please check that it is correct. Manage keys at https://www.koukoutu.com/user/dev",
        ),
        (403, "API key rejected or quota exhausted"),
        (404, "Not found"),
        (406, "File size exceeds 15MB"),
        (407, "Image resolution is below 70px"),
        (409, "Insufficient credit balance"),
        (413, "File too large"),
        (415, "Unsupported file format"),
        (422, "Invalid parameters"),
        (429, "Too many requests"),
        (500, "Internal server error"),
        (502, "Service temporarily unavailable"),
        (503, "Service temporarily unavailable"),
    ])
});

pub fn is_transient(code: i64) -> bool {
    TRANSIENT_CODES.contains(&code)
}

/// The fixed message for `code`, if the API documents one.
pub fn status_message(code: i64) -> Option<&'static str> {
    STATUS_MESSAGES.get(&code).copied()
}
