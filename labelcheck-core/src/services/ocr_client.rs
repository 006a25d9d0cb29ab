//! OCR collaborator client
//!
//! Sends a label image to a Vision-style `images:annotate` endpoint with
//! `DOCUMENT_TEXT_DETECTION` and turns the recognized words into [`Token`]s.
//! Calls carry an explicit timeout and run under a bounded retry policy;
//! only timeouts, connection failures and 5xx responses are retried.

use crate::label::structure_label;
use crate::models::{BoundingBox, LabelDraft, Token};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use labelcheck_common::config::{resolve_ocr_api_key, OcrConfig};
use labelcheck_common::{retry_with_policy, Error, RetryPolicy};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("labelcheck/", env!("CARGO_PKG_VERSION"));

/// OCR client errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("OCR service error: HTTP {0}")]
    Server(u16),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// The service answered but recognized no text
    #[error("OCR returned no text")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed request or redirect policy violation; retrying cannot help
    #[error("Request error: {0}")]
    Request(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OcrError {
    /// Timeouts, connection failures and 5xx are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OcrError::Timeout | OcrError::Connection(_) | OcrError::Server(_)
        )
    }
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OcrError::Timeout
        } else if err.is_decode() {
            OcrError::Parse(err.to_string())
        } else if err.is_builder() || err.is_redirect() {
            OcrError::Request(err.to_string())
        } else {
            OcrError::Connection(err.to_string())
        }
    }
}

/// Image handed to the OCR service
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Inline image bytes
    Bytes(Vec<u8>),
    /// URL the service can fetch
    Url(String),
}

impl ImageSource {
    /// Treat `http(s)://` arguments as URLs and anything else as a file path
    pub async fn from_arg(arg: &str) -> labelcheck_common::Result<Self> {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Ok(ImageSource::Url(arg.to_string()))
        } else {
            Ok(ImageSource::Bytes(tokio::fs::read(arg).await?))
        }
    }

    fn to_request_json(&self) -> serde_json::Value {
        match self {
            ImageSource::Bytes(bytes) => json!({ "content": BASE64.encode(bytes) }),
            ImageSource::Url(url) => json!({ "source": { "imageUri": url } }),
        }
    }
}

/// Recognized text of one image
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub tokens: Vec<Token>,
    pub full_text: String,
}

/// Anything that can turn an image into tokens
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, image: &ImageSource) -> Result<OcrOutput, OcrError>;

    /// Attempts made per call before giving up
    fn max_attempts(&self) -> u32 {
        1
    }
}

// Vision response shape (only the fields used)

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<StatusBody>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Word {
    bounding_box: Option<Poly>,
    #[serde(default)]
    symbols: Vec<Symbol>,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Poly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

#[derive(Debug, Default, Deserialize)]
struct Vertex {
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    #[serde(default)]
    text: String,
}

impl Word {
    fn to_token(&self) -> Option<Token> {
        let text: String = self.symbols.iter().map(|s| s.text.as_str()).collect();
        if text.trim().is_empty() {
            return None;
        }

        let vertices = self.bounding_box.as_ref().map(|p| p.vertices.as_slice()).unwrap_or(&[]);
        let xs = vertices.iter().map(|v| v.x.unwrap_or(0.0));
        let ys = vertices.iter().map(|v| v.y.unwrap_or(0.0));
        let bbox = if vertices.is_empty() {
            BoundingBox::new(0.0, 0.0, 0.0, 0.0)
        } else {
            BoundingBox::new(
                xs.clone().fold(f64::INFINITY, f64::min),
                xs.fold(f64::NEG_INFINITY, f64::max),
                ys.clone().fold(f64::INFINITY, f64::min),
                ys.fold(f64::NEG_INFINITY, f64::max),
            )
        };

        Some(Token::new(text, bbox, self.confidence.unwrap_or(1.0)))
    }
}

/// Convert an `images:annotate` response body into tokens.
///
/// A response without any text annotation is [`OcrError::EmptyResponse`].
pub fn parse_vision_response(body: &str) -> Result<OcrOutput, OcrError> {
    let parsed: AnnotateResponse =
        serde_json::from_str(body).map_err(|e| OcrError::Parse(e.to_string()))?;

    let Some(first) = parsed.responses.into_iter().next() else {
        return Err(OcrError::EmptyResponse);
    };
    if let Some(status) = first.error {
        if status.code != 0 || !status.message.is_empty() {
            return Err(OcrError::Api(status.code, status.message));
        }
    }
    let Some(annotation) = first.full_text_annotation else {
        return Err(OcrError::EmptyResponse);
    };

    let tokens: Vec<Token> = annotation
        .pages
        .iter()
        .flat_map(|p| &p.blocks)
        .flat_map(|b| &b.paragraphs)
        .flat_map(|p| &p.words)
        .filter_map(Word::to_token)
        .collect();

    if tokens.is_empty() && annotation.text.trim().is_empty() {
        return Err(OcrError::EmptyResponse);
    }

    Ok(OcrOutput {
        tokens,
        full_text: annotation.text,
    })
}

/// Google Vision OCR client
pub struct VisionOcrClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    retry_policy: RetryPolicy,
}

impl VisionOcrClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> Result<Self, OcrError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            retry_policy,
        })
    }

    /// Build from configuration; fails when no API key is available
    pub fn from_config(config: &OcrConfig) -> labelcheck_common::Result<Self> {
        let api_key = resolve_ocr_api_key(config)?;
        Self::new(
            config.endpoint.clone(),
            api_key,
            config.timeout(),
            config.retry_policy(),
        )
        .map_err(|e| Error::Config(e.to_string()))
    }

    async fn annotate_once(&self, image: &ImageSource) -> Result<OcrOutput, OcrError> {
        let body = json!({
            "requests": [{
                "image": image.to_request_json(),
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }],
            }]
        });

        debug!(endpoint = %self.endpoint, "Requesting text detection");

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(OcrError::Server(status.as_u16()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OcrError::Api(status.as_u16(), error_text));
        }

        let text = response.text().await?;
        parse_vision_response(&text)
    }
}

#[async_trait]
impl OcrProvider for VisionOcrClient {
    async fn recognize(&self, image: &ImageSource) -> Result<OcrOutput, OcrError> {
        let output = retry_with_policy(
            "ocr.recognize",
            &self.retry_policy,
            OcrError::is_retryable,
            || self.annotate_once(image),
        )
        .await?;

        info!(
            tokens = output.tokens.len(),
            chars = output.full_text.len(),
            "Text detection complete"
        );
        Ok(output)
    }

    fn max_attempts(&self) -> u32 {
        self.retry_policy.max_attempts
    }
}

/// Recognize an image and structure it into a label draft.
///
/// An empty OCR result degrades to an empty draft that needs confirmation;
/// any other failure is a transport error carrying the OCR cause.
pub async fn scan_label(
    provider: &dyn OcrProvider,
    image: &ImageSource,
) -> labelcheck_common::Result<LabelDraft> {
    match provider.recognize(image).await {
        Ok(output) => Ok(structure_label(&output.tokens)),
        Err(OcrError::EmptyResponse) => {
            warn!("OCR found no text on the label image");
            Ok(structure_label(&[]))
        }
        Err(OcrError::Config(message)) => Err(Error::Config(message)),
        Err(err) => {
            // Non-retryable failures stop the policy on their first occurrence
            let attempts = if err.is_retryable() {
                provider.max_attempts()
            } else {
                1
            };
            Err(Error::transport("ocr.recognize", attempts, err))
        }
    }
}
