use seoscan_core::{Error, FetchBackend, FetchRequest, FetchResponse, PageFetcher, Result};
use std::time::Duration;

pub mod extract;
pub mod inference;

pub use inference::{OnnxScorer, OnnxScorerConfig};

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("seoscan/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Avoid "hang forever" on DNS/TLS/body stalls.
            // Per-request timeouts (FetchRequest.timeout_ms) can still override this.
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let t_req = std::time::Instant::now();
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        let resp = rb.send().await.map_err(|e| Error::Fetch(e.to_string()))?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %req.url,
            status,
            bytes = bytes.len(),
            truncated,
            elapsed_ms = t_req.elapsed().as_millis() as u64,
            "fetched"
        );
        Ok(FetchResponse {
            final_url,
            status,
            content_type,
            bytes,
            truncated,
        })
    }
}

/// Knobs applied to every page fetch.
#[derive(Debug, Clone)]
pub struct PageFetchConfig {
    pub timeout_ms: Option<u64>,
    pub max_bytes: Option<u64>,
}

impl Default for PageFetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(20_000),
            max_bytes: Some(5_000_000),
        }
    }
}

/// [`PageFetcher`] over any [`FetchBackend`]: GET, require 2xx, return `<body>` text.
#[derive(Debug, Clone)]
pub struct BodyTextFetcher<B> {
    backend: B,
    cfg: PageFetchConfig,
}

impl<B: FetchBackend> BodyTextFetcher<B> {
    pub fn new(backend: B, cfg: PageFetchConfig) -> Self {
        Self { backend, cfg }
    }

    fn request(&self, url: &str) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            timeout_ms: self.cfg.timeout_ms,
            max_bytes: self.cfg.max_bytes,
        }
    }
}

impl BodyTextFetcher<LocalFetcher> {
    pub fn local(cfg: PageFetchConfig) -> Result<Self> {
        Ok(Self::new(LocalFetcher::new()?, cfg))
    }
}

#[async_trait::async_trait]
impl<B: FetchBackend> PageFetcher for BodyTextFetcher<B> {
    async fn page_text(&self, url: &str) -> Result<String> {
        let resp = self.backend.fetch(&self.request(url)).await?;
        if !(200..300).contains(&resp.status) {
            return Err(Error::Fetch(format!(
                "{} responded with status {}",
                resp.final_url, resp.status
            )));
        }
        if resp.truncated {
            tracing::warn!(url, bytes = resp.bytes.len(), "page body truncated at max_bytes");
        }
        let text = extract::body_text(&resp.text_lossy());
        if !extract::has_any_text(&text) {
            tracing::debug!(url, content_type = ?resp.content_type, "no body text");
        }
        Ok(text)
    }
}
