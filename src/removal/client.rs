//! The removal call: upload, classify, retry, decode.
//!
//! ```text
//! host image ─decode─▶ PNG artifact ─POST─▶ response
//!                                              │
//!          ┌───────────────────────────────────┤
//!          ▼                ▼                  ▼
//!      image/*      JSON envelope        JSON with url
//!          │         │          │              │
//!          │    transient   permanent       GET url
//!          │      code        code             │
//!          │         │          │              │
//!          │   retry (≤ max)  RemoteApi        │
//!          ▼                                   ▼
//!     load_bytes ─encode─▶ host image ◀────────┘
//! ```
//!
//! Retries are immediate: no backoff between attempts. Transport failures
//! share the same attempt counter as transient status codes. A result link
//! is fetched once; a failed download is reported, not retried.

use super::error::RemovalError;
use super::messages::{is_transient, status_message};
use super::params::{NodeInputs, RemovalRequest, ResponseMode};
use super::transport::{HttpTransport, RawResponse, Transport, TransportError, Upload};
use crate::config::ClientConfig;
use crate::imaging::{self, HostImage, UploadArtifact};
use serde::Deserialize;
use serde_json::Value;

/// JSON body the API returns instead of an image.
///
/// Only `code` has to be well-formed. The text fields are kept as raw JSON
/// and read only when they hold a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusEnvelope {
    pub code: Option<i64>,
    pub message: Option<Value>,
    pub error: Option<Value>,
    pub url: Option<Value>,
}

impl StatusEnvelope {
    /// The envelope's code, treating a missing one as success.
    pub fn code(&self) -> i64 {
        self.code.unwrap_or(200)
    }

    /// Human-readable text for this envelope: the fixed message for its code,
    /// else whatever the server said.
    pub fn resolved_message(&self) -> String {
        if let Some(known) = status_message(self.code()) {
            return known.to_string();
        }
        text(&self.message)
            .or(text(&self.error))
            .unwrap_or("Unknown error")
            .to_string()
    }

    /// The result link, when the server sent one.
    pub fn link(&self) -> Option<&str> {
        text(&self.url)
    }
}

fn text(field: &Option<Value>) -> Option<&str> {
    field.as_ref().and_then(Value::as_str)
}

/// What a response turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Image(Vec<u8>),
    Status(StatusEnvelope),
    Link(String),
}

/// Sort a raw response into a [`Reply`] for the given response mode.
pub fn classify(response: RawResponse, mode: ResponseMode) -> Result<Reply, RemovalError> {
    if response.is_json() {
        let envelope: StatusEnvelope = serde_json::from_slice(&response.body).map_err(|e| {
            RemovalError::UnrecognizedResponse(format!("{} ({e})", response.content_type))
        })?;
        return Ok(match (mode, envelope.link()) {
            (ResponseMode::Url, Some(url)) => Reply::Link(url.to_string()),
            _ => Reply::Status(envelope),
        });
    }
    if response.is_image() {
        return Ok(Reply::Image(response.body));
    }
    Err(RemovalError::UnrecognizedResponse(response.content_type))
}

/// Sends host images to the removal API.
#[derive(Debug, Clone)]
pub struct RemovalClient<T: Transport = HttpTransport> {
    transport: T,
    max_retries: u32,
}

impl RemovalClient<HttpTransport> {
    /// Client talking to the endpoint named in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, RemovalError> {
        let transport = HttpTransport::new(
            &config.api.endpoint,
            config.api.timeout(),
            config.api.download_timeout(),
        )
        .map_err(|e| RemovalError::Client(e.to_string()))?;
        Ok(Self::with_transport(transport, config.api.max_retries))
    }
}

impl<T: Transport> RemovalClient<T> {
    pub fn with_transport(transport: T, max_retries: u32) -> Self {
        Self {
            transport,
            max_retries,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Total attempts a call may make: the first plus `max_retries`.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run the node with raw host inputs. The key is validated before any
    /// image or network work happens.
    pub fn remove_background_with_inputs(
        &self,
        image: &HostImage,
        inputs: &NodeInputs<'_>,
    ) -> Result<HostImage, RemovalError> {
        let request = RemovalRequest::from_inputs(inputs)?;
        self.remove_background(image, &request)
    }

    /// Remove the background from `image`.
    ///
    /// Returns a `[1, H, W, 4]` host image. The temporary upload file is gone
    /// by the time this returns, whatever the outcome.
    pub fn remove_background(
        &self,
        image: &HostImage,
        request: &RemovalRequest,
    ) -> Result<HostImage, RemovalError> {
        let pixels = imaging::decode(image)?;
        let artifact = UploadArtifact::create(&pixels)?;
        let png = read_artifact(&artifact)?;
        let upload = Upload {
            api_key: request.api_key().expose(),
            fields: request.form_fields(),
            artifact: &artifact,
            image: &png,
        };

        let bytes = self.send_with_retry(&upload, request.response())?;
        let result = imaging::load_bytes(&bytes)?;
        log::info!(
            "Background removed: {}x{} result",
            result.width(),
            result.height()
        );
        Ok(imaging::encode(&result))
    }

    /// POST until an image arrives, a permanent error is reported, or the
    /// attempts run out.
    fn send_with_retry(
        &self,
        upload: &Upload<'_>,
        mode: ResponseMode,
    ) -> Result<Vec<u8>, RemovalError> {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            log::debug!("Removal attempt {attempt}/{max_attempts}");
            let retries_left = attempt < max_attempts;

            let response = match self.transport.post(upload) {
                Ok(response) => response,
                Err(e) if retries_left => {
                    log::warn!("Attempt {attempt} failed: {e}; retrying");
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(network_error(e)),
            };

            match classify(response, mode)? {
                Reply::Image(bytes) => return Ok(bytes),
                Reply::Link(url) => return self.download(&url),
                Reply::Status(envelope) => {
                    let code = envelope.code();
                    if is_transient(code) && retries_left {
                        log::warn!("Attempt {attempt} got transient code {code}; retrying");
                        attempt += 1;
                        continue;
                    }
                    return Err(RemovalError::RemoteApi {
                        code,
                        message: envelope.resolved_message(),
                    });
                }
            }
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, RemovalError> {
        log::debug!("Downloading result from {url}");
        let response = self.transport.download(url).map_err(network_error)?;
        if !response.is_success() {
            return Err(RemovalError::RemoteApi {
                code: i64::from(response.status),
                message: "Failed to download processed image".to_string(),
            });
        }
        Ok(response.body)
    }
}

/// Local file trouble is an image error, never a network one.
fn read_artifact(artifact: &UploadArtifact) -> Result<Vec<u8>, RemovalError> {
    artifact
        .read()
        .map_err(|e| RemovalError::Image(image::ImageError::IoError(e)))
}

fn network_error(error: TransportError) -> RemovalError {
    RemovalError::Network(error.to_string())
}
