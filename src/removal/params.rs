//! Request configuration for a single removal call.
//!
//! These types describe *what* to ask the API for. Each enum owns two fixed
//! tables: the host labels it is selected by, and the wire value sent in the
//! multipart form. Unrecognized labels fall back to the API's defaults rather
//! than failing, matching how the node has always behaved.
//!
//! ## Wire fields
//!
//! | Form field | Source | Values |
//! |---|---|---|
//! | `model_key` | [`Model`] | `background-removal`, `stamp-background-removal` |
//! | `output_format` | [`OutputFormat`] | `png`, `webp` |
//! | `crop` | `crop` flag | `1`, `0` |
//! | `stamp_crop` | `stamp_crop` flag | `1`, `0` |
//! | `border` | [`BorderLevel`] | `0`, `1`, `2` |
//! | `response` | [`ResponseMode`] | `file`, `url` |

use super::error::RemovalError;
use std::fmt;

/// Looks `label` up in a fixed label table.
fn lookup<T: Copy>(table: &[(&str, T)], label: &str) -> Option<T> {
    let label = label.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label))
        .map(|(_, value)| *value)
}

/// Segmentation model run by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    /// General-purpose cut-out.
    #[default]
    General,
    /// Tuned for printed stamps and patterns.
    Stamp,
}

const MODEL_LABELS: &[(&str, Model)] = &[
    ("general", Model::General),
    ("通用抠图模型", Model::General),
    ("background-removal", Model::General),
    ("stamp", Model::Stamp),
    ("印花专抠模型", Model::Stamp),
    ("stamp-background-removal", Model::Stamp),
];

impl Model {
    /// Resolve a host label; anything unknown selects [`Model::General`].
    pub fn from_label(label: &str) -> Self {
        lookup(MODEL_LABELS, label).unwrap_or_default()
    }

    pub fn wire_id(self) -> &'static str {
        match self {
            Model::General => "background-removal",
            Model::Stamp => "stamp-background-removal",
        }
    }
}

/// Encoding of the returned cut-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Webp,
}

const OUTPUT_FORMAT_LABELS: &[(&str, OutputFormat)] =
    &[("png", OutputFormat::Png), ("webp", OutputFormat::Webp)];

impl OutputFormat {
    pub fn from_label(label: &str) -> Self {
        lookup(OUTPUT_FORMAT_LABELS, label).unwrap_or_default()
    }

    pub fn wire_id(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

/// Edge refinement strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderLevel {
    #[default]
    None,
    Standard,
    High,
}

const BORDER_LABELS: &[(&str, BorderLevel)] = &[
    ("none", BorderLevel::None),
    ("不增强", BorderLevel::None),
    ("standard", BorderLevel::Standard),
    ("标准增强", BorderLevel::Standard),
    ("high", BorderLevel::High),
    ("高度增强", BorderLevel::High),
];

impl BorderLevel {
    /// Resolve a host label; anything unknown selects [`BorderLevel::None`].
    pub fn from_label(label: &str) -> Self {
        lookup(BORDER_LABELS, label).unwrap_or_default()
    }

    pub fn wire_code(self) -> &'static str {
        match self {
            BorderLevel::None => "0",
            BorderLevel::Standard => "1",
            BorderLevel::High => "2",
        }
    }
}

/// How the API delivers the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Raw image bytes in the response body.
    #[default]
    File,
    /// A JSON envelope carrying a download link.
    Url,
}

const RESPONSE_MODE_LABELS: &[(&str, ResponseMode)] =
    &[("file", ResponseMode::File), ("url", ResponseMode::Url)];

impl ResponseMode {
    pub fn from_label(label: &str) -> Self {
        lookup(RESPONSE_MODE_LABELS, label).unwrap_or_default()
    }

    pub fn wire_id(self) -> &'static str {
        match self {
            ResponseMode::File => "file",
            ResponseMode::Url => "url",
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// A validated API key.
///
/// Whitespace is trimmed on construction. `Debug` only shows a short prefix so
/// keys never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: &str) -> Result<Self, RemovalError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RemovalError::InvalidCredential);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The first `n` characters of the key.
    pub fn prefix(&self, n: usize) -> &str {
        match self.0.char_indices().nth(n) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}…)", self.prefix(4))
    }
}

/// Everything the API needs besides the image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    api_key: ApiKey,
    model: Model,
    output_format: OutputFormat,
    crop: bool,
    stamp_crop: bool,
    border: BorderLevel,
    response: ResponseMode,
}

impl RemovalRequest {
    /// Start a request with default options. Fails on a blank key.
    pub fn new(api_key: &str) -> Result<Self, RemovalError> {
        Ok(Self {
            api_key: ApiKey::new(api_key)?,
            model: Model::default(),
            output_format: OutputFormat::default(),
            crop: false,
            stamp_crop: false,
            border: BorderLevel::default(),
            response: ResponseMode::default(),
        })
    }

    /// Build a request from the node's raw inputs, resolving every label
    /// through its lookup table.
    pub fn from_inputs(inputs: &NodeInputs<'_>) -> Result<Self, RemovalError> {
        Ok(Self::new(inputs.api_key)?
            .with_model(Model::from_label(inputs.model))
            .with_output_format(OutputFormat::from_label(inputs.output_format))
            .with_crop(inputs.crop)
            .with_stamp_crop(inputs.stamp_crop)
            .with_border(BorderLevel::from_label(inputs.border))
            .with_response(ResponseMode::from_label(inputs.response)))
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn with_crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_stamp_crop(mut self, stamp_crop: bool) -> Self {
        self.stamp_crop = stamp_crop;
        self
    }

    pub fn with_border(mut self, border: BorderLevel) -> Self {
        self.border = border;
        self
    }

    pub fn with_response(mut self, response: ResponseMode) -> Self {
        self.response = response;
        self
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn crop(&self) -> bool {
        self.crop
    }

    pub fn stamp_crop(&self) -> bool {
        self.stamp_crop
    }

    pub fn border(&self) -> BorderLevel {
        self.border
    }

    pub fn response(&self) -> ResponseMode {
        self.response
    }

    /// Multipart text fields, in the order the API documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("model_key", self.model.wire_id()),
            ("output_format", self.output_format.wire_id()),
            ("crop", flag(self.crop)),
            ("stamp_crop", flag(self.stamp_crop)),
            ("border", self.border.wire_code()),
            ("response", self.response.wire_id()),
        ]
    }
}

/// The node's inputs exactly as the host hands them over.
#[derive(Debug, Clone, Copy)]
pub struct NodeInputs<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub output_format: &'a str,
    pub crop: bool,
    pub stamp_crop: bool,
    pub border: &'a str,
    pub response: &'a str,
}

impl Default for NodeInputs<'_> {
    fn default() -> Self {
        Self {
            api_key: "",
            model: "通用抠图模型",
            output_format: "webp",
            crop: false,
            stamp_crop: false,
            border: "不增强",
            response: "file",
        }
    }
}
