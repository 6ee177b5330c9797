//! validate → fetch → encode + infer → recommend.
//!
//! Every stage failure short-circuits into a degraded [`AnalysisResult`];
//! `analyze` itself never returns an error.

use crate::encode::encode;
use crate::recommend::{recommend, ReportLocale};
use crate::vocab::Vocabulary;
use crate::{AnalysisResult, Error, PageFetcher, Result, ScoreModel};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

pub const MSG_MISSING_FIELDS: &str = "URL and Keyword are required.";
pub const MSG_INVALID_URL: &str = "Invalid URL provided.";
pub const MSG_FETCH_FAILED: &str = "Unable to fetch the page content.";

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Upper bound on one forward pass.
    pub inference_timeout: Duration,
    pub locale: ReportLocale,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            inference_timeout: Duration::from_secs(60),
            locale: ReportLocale::English,
        }
    }
}

#[derive(Clone)]
pub struct Analyzer {
    fetcher: Arc<dyn PageFetcher>,
    model: Arc<dyn ScoreModel>,
    vocab: Arc<Vocabulary>,
    cfg: AnalyzerConfig,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("model", &self.model.name())
            .field("vocab_tokens", &self.vocab.len())
            .field("cfg", &self.cfg)
            .finish()
    }
}

/// Both fields must carry non-whitespace text.
pub fn validate(url: &str, keyword: &str) -> Result<()> {
    if url.trim().is_empty() || keyword.trim().is_empty() {
        return Err(Error::Validation(MSG_MISSING_FIELDS.to_string()));
    }
    Ok(())
}

/// Absolute URL check; no network.
///
/// The input must already be written the way it goes on the wire: whitespace,
/// backslashes and other characters that need escaping are rejected rather
/// than silently repaired by the parser. Non-ASCII letters (IRIs) pass.
pub fn parse_url(url: &str) -> Result<url::Url> {
    let raw = url.trim();
    if let Some((i, c)) = raw.char_indices().find(|&(_, c)| !is_uri_char(c)) {
        return Err(Error::InvalidUrl(format!(
            "{url}: character {c:?} at offset {i} must be percent-encoded"
        )));
    }
    if let Some(i) = bad_percent_escape(raw) {
        return Err(Error::InvalidUrl(format!(
            "{url}: malformed percent-escape at offset {i}"
        )));
    }
    url::Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))
}

// RFC 3986 unreserved, reserved and `%`.
fn is_uri_char(c: char) -> bool {
    if !c.is_ascii() {
        return !c.is_whitespace() && !c.is_control();
    }
    c.is_ascii_alphanumeric() || "-._~:/?#[]@!$&'()*+,;=%".contains(c)
}

fn bad_percent_escape(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    b.iter().enumerate().find_map(|(i, &c)| {
        let ok = c != b'%'
            || (b.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && b.get(i + 2).is_some_and(u8::is_ascii_hexdigit));
        (!ok).then_some(i)
    })
}

impl Analyzer {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        model: Arc<dyn ScoreModel>,
        vocab: Arc<Vocabulary>,
        cfg: AnalyzerConfig,
    ) -> Self {
        Self {
            fetcher,
            model,
            vocab,
            cfg,
        }
    }

    pub async fn analyze(&self, url: &str, keyword: &str) -> AnalysisResult {
        let span = tracing::info_span!("analyze", url = %url, keyword = %keyword);
        self.analyze_inner(url, keyword).instrument(span).await
    }

    async fn analyze_inner(&self, url: &str, keyword: &str) -> AnalysisResult {
        if let Err(e) = validate(url, keyword) {
            tracing::warn!(error = %e, "rejected request");
            return AnalysisResult::degraded(keyword, MSG_MISSING_FIELDS);
        }
        let parsed = match parse_url(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(error = %e, "rejected url");
                return AnalysisResult::degraded(keyword, MSG_INVALID_URL);
            }
        };

        let page_text = match self.fetcher.page_text(parsed.as_str()).await {
            Ok(t) if !t.trim().is_empty() => t,
            Ok(_) => {
                tracing::warn!("page body has no text");
                return AnalysisResult::degraded(keyword, MSG_FETCH_FAILED);
            }
            Err(e) => {
                tracing::warn!(error = %e, "page fetch failed");
                return AnalysisResult::degraded(keyword, MSG_FETCH_FAILED);
            }
        };

        match self.score_and_recommend(keyword, &page_text).await {
            Ok(res) => {
                tracing::info!(is_optimized = res.is_optimized, "analysis complete");
                res
            }
            Err(e) => {
                tracing::warn!(error = %e, "analysis failed");
                AnalysisResult::degraded(keyword, format!("Error during analysis: {e}"))
            }
        }
    }

    async fn score_and_recommend(&self, keyword: &str, page_text: &str) -> Result<AnalysisResult> {
        let encoded = encode(&self.vocab, keyword, page_text);
        tracing::debug!(tokens = encoded.len(), model = self.model.name(), "encoded page");

        let scores = tokio::time::timeout(self.cfg.inference_timeout, self.model.score(&encoded))
            .await
            .map_err(|_| {
                Error::Inference(format!(
                    "timed out after {} ms",
                    self.cfg.inference_timeout.as_millis()
                ))
            })??;
        if scores.len() != encoded.len() {
            // The score vector is averaged as-is; a length mismatch is only worth noting.
            tracing::debug!(
                scores = scores.len(),
                tokens = encoded.len(),
                "score vector length differs from token count"
            );
        }

        recommend(&scores, keyword, self.cfg.locale)
    }
}
