use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

pub mod analyze;
pub mod encode;
pub mod recommend;
pub mod vocab;

pub use analyze::{Analyzer, AnalyzerConfig};
pub use encode::{encode, EncodedInput};
pub use recommend::{recommend, Report, ReportLocale, ScoreBand};
pub use vocab::Vocabulary;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("data error: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the operation (network + body read).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// The body hit `max_bytes` and was cut short.
    pub truncated: bool,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Turns a URL into the visible text of the page body.
///
/// An empty string means the page had no body text; transport and HTTP
/// failures are errors, never text.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn page_text(&self, url: &str) -> Result<String>;
}

/// A sequence-classification model producing one relevance score per input token.
#[async_trait::async_trait]
pub trait ScoreModel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn score(&self, input: &EncodedInput) -> Result<Vec<f32>>;
}

/// Wire shape of one analysis request.
///
/// Missing and `null` fields deserialize as empty strings so that they fail
/// validation instead of JSON extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keyword: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub keyword: String,
    /// HTML report on success, a short human-readable message otherwise.
    pub recommendations: String,
    pub is_optimized: bool,
}

impl AnalysisResult {
    /// A failure-shaped result: carries `message` and is never optimized.
    pub fn degraded(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            recommendations: message.into(),
            is_optimized: false,
        }
    }
}
