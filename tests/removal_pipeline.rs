//! End-to-end removal calls against a scripted transport.
//!
//! Drives the public API the way the host does: a float tensor goes in, the
//! client uploads a real PNG, the transport answers with canned responses,
//! and the result comes back as an RGBA tensor.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use koukoutu_node::imaging::{self, HostImage};
use koukoutu_node::removal::{
    NodeInputs, RawResponse, RemovalClient, RemovalError, Transport, TransportError, Upload,
    status_message,
};
use ndarray::Array4;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Mutex;

/// Answers every post with the same response and remembers each upload.
struct ScriptedApi {
    reply: Result<RawResponse, String>,
    uploads: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl ScriptedApi {
    fn new(reply: Result<RawResponse, String>) -> Self {
        Self {
            reply,
            uploads: Mutex::new(Vec::new()),
        }
    }

    fn attempts(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    fn upload_paths(&self) -> Vec<PathBuf> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl Transport for ScriptedApi {
    fn post(&self, upload: &Upload<'_>) -> Result<RawResponse, TransportError> {
        self.uploads
            .lock()
            .unwrap()
            .push((upload.artifact.path().to_path_buf(), upload.image.to_vec()));
        self.reply.clone().map_err(|message| {
            TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                message,
            ))
        })
    }

    fn download(&self, _url: &str) -> Result<RawResponse, TransportError> {
        panic!("file mode never downloads")
    }
}

fn host_image(height: usize, width: usize) -> HostImage {
    Array4::from_shape_fn((1, height, width, 3), |(_, y, x, c)| {
        ((y * 31 + x * 17 + c * 5) % 256) as f32 / 255.0
    })
    .into_dyn()
}

fn png_response(width: u32, height: u32) -> RawResponse {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([9, 8, 7, 0])));
    let mut body = Cursor::new(Vec::new());
    img.write_to(&mut body, ImageFormat::Png).unwrap();
    RawResponse {
        status: 200,
        content_type: "image/png".into(),
        body: body.into_inner(),
    }
}

fn json_response(body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        content_type: "application/json".into(),
        body: body.as_bytes().to_vec(),
    }
}

fn inputs(api_key: &str) -> NodeInputs<'_> {
    NodeInputs {
        api_key,
        ..NodeInputs::default()
    }
}

fn assert_no_leftover_uploads(api: &ScriptedApi) {
    for path in api.upload_paths() {
        assert!(!path.exists(), "upload {} still on disk", path.display());
    }
}

#[test]
fn png_reply_becomes_rgba_host_image() {
    let api = ScriptedApi::new(Ok(png_response(40, 25)));
    let client = RemovalClient::with_transport(&api, 5);

    let result = client
        .remove_background_with_inputs(&host_image(10, 12), &inputs("sk-live"))
        .unwrap();

    assert_eq!(result.shape(), &[1, 25, 40, 4]);
    assert_eq!(result[[0, 0, 0, 3]], 0.0);
    assert_eq!(api.attempts(), 1);
    assert_no_leftover_uploads(&api);
}

#[test]
fn uploaded_png_matches_the_input_pixels() {
    let api = ScriptedApi::new(Ok(png_response(1, 1)));
    let client = RemovalClient::with_transport(&api, 5);
    let host = host_image(6, 9);

    client
        .remove_background_with_inputs(&host, &inputs("sk-live"))
        .unwrap();

    let uploads = api.uploads.lock().unwrap();
    let sent = image::load_from_memory(&uploads[0].1).unwrap();
    assert_eq!(sent.dimensions(), (9, 6));
    assert_eq!(imaging::encode(&sent), imaging::encode(&imaging::decode(&host).unwrap()));
}

#[test]
fn blank_keys_never_reach_the_network() {
    let api = ScriptedApi::new(Ok(png_response(1, 1)));
    let client = RemovalClient::with_transport(&api, 5);

    for key in ["", "   "] {
        let err = client
            .remove_background_with_inputs(&host_image(2, 2), &inputs(key))
            .unwrap_err();
        assert!(matches!(err, RemovalError::InvalidCredential));
    }
    assert_eq!(api.attempts(), 0);
}

#[test]
fn unauthorized_envelope_fails_on_first_attempt() {
    let api = ScriptedApi::new(Ok(json_response(r#"{"code": 401}"#)));
    let client = RemovalClient::with_transport(&api, 5);

    let err = client
        .remove_background_with_inputs(&host_image(2, 2), &inputs("sk-bad"))
        .unwrap_err();

    match &err {
        RemovalError::RemoteApi { code, message } => {
            assert_eq!(*code, 401);
            assert_eq!(message, status_message(401).unwrap());
        }
        other => panic!("expected RemoteApi, got {other:?}"),
    }
    assert!(err.to_string().contains("Invalid API key"));
    assert_eq!(api.attempts(), 1);
    assert_no_leftover_uploads(&api);
}

#[test]
fn unavailable_envelope_exhausts_six_attempts() {
    let api = ScriptedApi::new(Ok(json_response(r#"{"code": 503, "message": "busy"}"#)));
    let client = RemovalClient::with_transport(&api, 5);

    let err = client
        .remove_background_with_inputs(&host_image(2, 2), &inputs("sk-live"))
        .unwrap_err();

    assert!(matches!(err, RemovalError::RemoteApi { code: 503, .. }));
    assert_eq!(api.attempts(), 6);
    assert_no_leftover_uploads(&api);
}

#[test]
fn refused_connection_exhausts_six_attempts() {
    let api = ScriptedApi::new(Err("connection refused".into()));
    let client = RemovalClient::with_transport(&api, 5);

    let err = client
        .remove_background_with_inputs(&host_image(2, 2), &inputs("sk-live"))
        .unwrap_err();

    assert!(matches!(err, RemovalError::Network(ref m) if m.contains("connection refused")));
    assert_eq!(api.attempts(), 6);
    assert_no_leftover_uploads(&api);
}

#[test]
fn unknown_code_uses_server_message() {
    let api = ScriptedApi::new(Ok(json_response(
        r#"{"code": 460, "message": "image contains no subject"}"#,
    )));
    let client = RemovalClient::with_transport(&api, 5);

    let err = client
        .remove_background_with_inputs(&host_image(2, 2), &inputs("sk-live"))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Background removal failed: API error 460: image contains no subject"
    );
}
