//! Cache hint for the host's re-execution decision.
//!
//! The host asks every node whether its inputs changed since the last run.
//! This node answers with a **content hash**: identical pixels plus identical
//! options produce the same key, so the host may reuse the previous cut-out
//! instead of paying for another API call.
//!
//! # Key contents
//!
//! SHA-256 over, in order:
//! - the image shape and its raw `f32` values (little-endian)
//! - the first 8 characters of the API key, so switching accounts re-runs
//! - every request field's wire value
//!
//! The key is advisory. Nothing in the removal path consults it.

use crate::imaging::HostImage;
use crate::removal::RemovalRequest;
use sha2::{Digest, Sha256};

/// Characters of the API key folded into the key.
const KEY_PREFIX_CHARS: usize = 8;

/// SHA-256 of an image's shape and pixel values, returned as a hex string.
pub fn hash_image(image: &HostImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"image\0");
    hasher.update((image.ndim() as u64).to_le_bytes());
    for dim in image.shape() {
        hasher.update((*dim as u64).to_le_bytes());
    }
    match image.as_slice() {
        Some(values) => {
            for value in values {
                hasher.update(value.to_le_bytes());
            }
        }
        None => {
            for value in image.iter() {
                hasher.update(value.to_le_bytes());
            }
        }
    }
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of the request options.
pub fn hash_request(request: &RemovalRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"request\0");
    hasher.update(request.api_key().prefix(KEY_PREFIX_CHARS).as_bytes());
    for (name, value) in request.form_fields() {
        hasher.update(b"\0");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Stable cache key for running `request` on `image`.
pub fn cache_key(image: &HostImage, request: &RemovalRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash_image(image).as_bytes());
    hasher.update(b":");
    hasher.update(hash_request(request).as_bytes());
    format!("{:x}", hasher.finalize())
}
