use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::Router;
use seoscan::{app, AppState, ANALYZE_PATH};
use seoscan_core::{
    Analyzer, AnalyzerConfig, EncodedInput, ReportLocale, Result, ScoreModel, Vocabulary,
};
use seoscan_local::{BodyTextFetcher, PageFetchConfig};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scores 0.9 for the vocabulary's "shoes" id and 0.1 for everything else.
struct KeywordModel {
    shoes_id: i64,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ScoreModel for KeywordModel {
    fn name(&self) -> &'static str {
        "keyword-fixture"
    }

    async fn score(&self, input: &EncodedInput) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(input
            .input_ids
            .iter()
            .map(|&id| if id == self.shoes_id { 0.9 } else { 0.1 })
            .collect())
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn fixture_site() -> SocketAddr {
    let router = Router::new()
        .route(
            "/shoes",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    "<html><body><h1>shoes shoes shoes</h1></body></html>",
                )
            }),
        )
        .route(
            "/sparse",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    "<html><body><p>buy our great products today</p></body></html>",
                )
            }),
        )
        .route(
            "/blank",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    "<html><head><title>only a title</title></head><body>  </body></html>",
                )
            }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "<html><body>not found</body></html>") }),
        );
    serve(router).await
}

async fn api() -> (SocketAddr, Arc<KeywordModel>) {
    let vocab = Vocabulary::from_lines(["[PAD]", "[UNK]", "shoes", "buy"]).unwrap();
    let model = Arc::new(KeywordModel {
        shoes_id: vocab.id("shoes"),
        calls: AtomicUsize::new(0),
    });
    let fetcher = BodyTextFetcher::local(PageFetchConfig {
        timeout_ms: Some(5_000),
        ..PageFetchConfig::default()
    })
    .unwrap();
    let analyzer = Analyzer::new(
        Arc::new(fetcher),
        model.clone(),
        Arc::new(vocab),
        AnalyzerConfig {
            inference_timeout: Duration::from_secs(5),
            locale: ReportLocale::English,
        },
    );
    let addr = serve(app(AppState::new(analyzer))).await;
    (addr, model)
}

async fn post(addr: SocketAddr, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}{ANALYZE_PATH}"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn blank_fields_are_a_plain_text_client_error() {
    let (addr, model) = api().await;
    for body in [
        serde_json::json!({ "url": "", "keyword": "shoes" }),
        serde_json::json!({ "url": "https://example.com", "keyword": "   " }),
        serde_json::json!({ "url": "https://example.com" }),
        serde_json::json!({ "url": null, "keyword": "shoes" }),
        serde_json::json!({ "url": "https://example.com", "keyword": null }),
    ] {
        let resp = post(addr, body).await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let ct = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        assert!(ct.starts_with("text/plain"), "content-type={ct}");
        assert_eq!(resp.text().await.unwrap(), "URL and Keyword are required.");
    }
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_url_is_a_degraded_success() {
    let (addr, model) = api().await;
    let resp = post(
        addr,
        serde_json::json!({ "url": "not a url", "keyword": "shoes" }),
    )
    .await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let v: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(v["keyword"], "shoes");
    assert_eq!(v["recommendations"], "Invalid URL provided.");
    assert_eq!(v["isOptimized"], false);

    let resp = post(
        addr,
        serde_json::json!({ "url": "https://example.com/a b", "keyword": "shoes" }),
    )
    .await;
    let v: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(v["recommendations"], "Invalid URL provided.");
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn keyword_heavy_page_is_optimized() {
    let site = fixture_site().await;
    let (addr, model) = api().await;
    let resp = post(
        addr,
        serde_json::json!({ "url": format!("http://{site}/shoes"), "keyword": "shoes" }),
    )
    .await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let v: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(v["isOptimized"], true);
    let html = v["recommendations"].as_str().unwrap();
    assert!(html.contains("Average score: 0.90"), "{html}");
    assert!(html.contains("H1: 'shoes - The complete guide'"));
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn keyword_poor_page_gets_very_low_density_section() {
    let site = fixture_site().await;
    let (addr, _model) = api().await;
    let resp = post(
        addr,
        serde_json::json!({ "url": format!("http://{site}/sparse"), "keyword": "shoes" }),
    )
    .await;
    let v: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(v["isOptimized"], false);
    // "shoes" + 5 page words: (0.9 + 5 * 0.1) / 6 ≈ 0.23
    let html = v["recommendations"].as_str().unwrap();
    assert!(html.contains("Keyword density is very low"), "{html}");
    assert!(html.contains("Average score: 0.23"), "{html}");
}

#[tokio::test]
async fn unusable_pages_report_unavailable_content() {
    let site = fixture_site().await;
    let (addr, model) = api().await;
    for path in ["/blank", "/missing"] {
        let resp = post(
            addr,
            serde_json::json!({ "url": format!("http://{site}{path}"), "keyword": "shoes" }),
        )
        .await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let v: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(
            v["recommendations"], "Unable to fetch the page content.",
            "path={path}"
        );
        assert_eq!(v["isOptimized"], false);
    }
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn healthz_is_ok() {
    let (addr, _model) = api().await;
    let resp = reqwest::get(format!("http://{addr}/healthz")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}
