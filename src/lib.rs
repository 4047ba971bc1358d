//! # Koukoutu Node
//!
//! Background removal for an image-graph editor, delegated to the Koukoutu
//! HTTP API. The node takes one host image plus a handful of options and
//! returns one RGBA cut-out.
//!
//! # Architecture: One Call, Two Stages
//!
//! ```text
//! 1. Codec    host tensor  →  PNG upload artifact   (ndarray → image)
//! 2. Client   artifact     →  API  →  image bytes   (multipart POST, retry)
//! 1. Codec    image bytes  →  host tensor           (image → ndarray, RGBA)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Host tensor ⇄ pixel buffer conversion and the temporary upload file |
//! | [`removal`] | Request options, HTTP transport, response classification, retry |
//! | [`cache`] | Content-derived cache key for the host's re-execution check |
//! | [`config`] | `koukoutu.toml` loading, validation, and merging over stock defaults |
//!
//! # Design Decisions
//!
//! ## Immediate, Bounded Retry
//!
//! Transient server codes (500, 502, 503, 504 in the status envelope) and
//! transport failures are retried straight away, up to `max_retries` extra
//! attempts (5 by default, so 6 attempts in total). There is no backoff.
//! The retry is a loop with an explicit counter, not recursion.
//!
//! ## Transport Seam
//!
//! All network I/O goes through [`removal::Transport`]. Production uses the
//! blocking reqwest client; tests use a scripted mock that records every
//! upload, which is how the retry counts and temp-file cleanup are checked
//! without a server.
//!
//! ## Content-Hash Caching
//!
//! [`cache::cache_key`] hashes the pixels and every option, so the host only
//! re-runs the node (and spends API credit) when something actually changed.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod removal;

pub use imaging::HostImage;
pub use removal::{RemovalClient, RemovalError, RemovalRequest};
