//! HTTP transport trait and the reqwest-backed implementation.
//!
//! The [`Transport`] trait is the only place the client touches the network:
//! one multipart POST to the create endpoint, and one GET for result links.
//! [`HttpTransport`] is the production implementation; tests substitute a
//! recording mock.

use crate::imaging::UploadArtifact;
use reqwest::blocking::{Client, RequestBuilder, multipart};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A multipart upload ready to send.
#[derive(Debug)]
pub struct Upload<'a> {
    /// Sent as `Authorization: Bearer <key>`.
    pub api_key: &'a str,
    /// Text fields of the multipart form.
    pub fields: Vec<(&'static str, &'static str)>,
    /// Temporary file the PNG was written to.
    pub artifact: &'a UploadArtifact,
    /// The artifact's bytes, sent as the `image_file` part.
    pub image: &'a [u8],
}

/// An HTTP response reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_json(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .contains("application/json")
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network operations needed by the removal client.
pub trait Transport {
    /// POST the upload to the create endpoint.
    fn post(&self, upload: &Upload<'_>) -> Result<RawResponse, TransportError>;

    /// GET a result link returned in `url` response mode.
    fn download(&self, url: &str) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, upload: &Upload<'_>) -> Result<RawResponse, TransportError> {
        (**self).post(upload)
    }

    fn download(&self, url: &str) -> Result<RawResponse, TransportError> {
        (**self).download(url)
    }
}

/// Blocking reqwest transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    download_timeout: Duration,
}

impl HttpTransport {
    pub fn new(
        endpoint: &str,
        timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("koukoutu-node/", env!("CARGO_PKG_VERSION")))
            .build()?;
        log::debug!(
            "HTTP transport configured: endpoint={}, timeout={:?}",
            endpoint,
            timeout
        );
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            download_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn execute(request: RequestBuilder) -> Result<RawResponse, TransportError> {
        let response = request.send()?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes()?.to_vec();
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn post(&self, upload: &Upload<'_>) -> Result<RawResponse, TransportError> {
        let image_part = multipart::Part::bytes(upload.image.to_vec())
            .file_name(UploadArtifact::FILE_NAME)
            .mime_str(UploadArtifact::MIME)?;
        let form = upload
            .fields
            .iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(*name, *value)
            })
            .part("image_file", image_part);

        Self::execute(
            self.client
                .post(&self.endpoint)
                .bearer_auth(upload.api_key)
                .multipart(form),
        )
    }

    fn download(&self, url: &str) -> Result<RawResponse, TransportError> {
        Self::execute(self.client.get(url).timeout(self.download_timeout))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// One `post` as seen by [`MockTransport`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedPost {
        pub api_key: String,
        pub fields: Vec<(&'static str, &'static str)>,
        pub artifact_path: PathBuf,
        pub artifact_existed: bool,
        pub artifact_bytes: usize,
    }

    /// Mock transport that replays scripted responses and records calls.
    /// The last scripted post reply repeats once the script runs out.
    #[derive(Default)]
    pub struct MockTransport {
        pub post_replies: Mutex<VecDeque<Result<RawResponse, String>>>,
        pub download_replies: Mutex<VecDeque<RawResponse>>,
        pub posts: Mutex<Vec<RecordedPost>>,
        pub downloads: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub fn replying(replies: Vec<Result<RawResponse, String>>) -> Self {
            Self {
                post_replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        pub fn with_download(self, reply: RawResponse) -> Self {
            self.download_replies.lock().unwrap().push_back(reply);
            self
        }

        pub fn post_count(&self) -> usize {
            self.posts.lock().unwrap().len()
        }

        pub fn recorded_posts(&self) -> Vec<RecordedPost> {
            self.posts.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn post(&self, upload: &Upload<'_>) -> Result<RawResponse, TransportError> {
            let path = upload.artifact.path().to_path_buf();
            self.posts.lock().unwrap().push(RecordedPost {
                api_key: upload.api_key.to_string(),
                fields: upload.fields.clone(),
                artifact_existed: path.exists(),
                artifact_bytes: upload.image.len(),
                artifact_path: path,
            });

            let mut replies = self.post_replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            };
            match reply.expect("mock transport has no scripted reply") {
                Ok(response) => Ok(response),
                Err(message) => Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    message,
                ))),
            }
        }

        fn download(&self, url: &str) -> Result<RawResponse, TransportError> {
            self.downloads.lock().unwrap().push(url.to_string());
            self.download_replies.lock().unwrap().pop_front().ok_or_else(|| {
                TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no scripted download",
                ))
            })
        }
    }

    pub fn json(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            content_type: "application/json; charset=utf-8".into(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn png(width: u32, height: u32) -> RawResponse {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut body = std::io::Cursor::new(Vec::new());
        img.write_to(&mut body, image::ImageFormat::Png).unwrap();
        RawResponse {
            status: 200,
            content_type: "image/png".into(),
            body: body.into_inner(),
        }
    }

    #[test]
    fn content_type_classification() {
        assert!(json("{}").is_json());
        assert!(!json("{}").is_image());
        assert!(png(1, 1).is_image());
        let html = RawResponse {
            status: 502,
            content_type: "text/html".into(),
            body: Vec::new(),
        };
        assert!(!html.is_json());
        assert!(!html.is_image());
        assert!(!html.is_success());
    }

    #[test]
    fn http_transport_keeps_endpoint() {
        let transport = HttpTransport::new(
            "https://sync.koukoutu.com/v1/create",
            Duration::from_secs(60),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(transport.endpoint(), "https://sync.koukoutu.com/v1/create");
    }
}
