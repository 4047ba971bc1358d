//! Removal client — one host image in, one cut-out back.
//!
//! The module is split into:
//! - **Parameters**: [`RemovalRequest`] and the label/wire lookup tables
//! - **Messages**: fixed status-code texts and the transient-code set
//! - **Transport**: [`Transport`] trait + [`HttpTransport`]
//! - **Client**: [`RemovalClient`], which drives upload, classification and retry

mod client;
mod error;
mod messages;
mod params;
pub mod transport;

pub use client::{Reply, RemovalClient, StatusEnvelope, classify};
pub use error::RemovalError;
pub use messages::{TRANSIENT_CODES, is_transient, status_message};
pub use params::{
    ApiKey, BorderLevel, Model, NodeInputs, OutputFormat, RemovalRequest, ResponseMode,
};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError, Upload};
