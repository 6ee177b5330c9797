use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seoscan::{app, AppState, ANALYZE_PATH};
use seoscan_core::analyze::validate;
use seoscan_core::{Analyzer, AnalyzerConfig, ReportLocale, Vocabulary};
use seoscan_local::{BodyTextFetcher, OnnxScorer, OnnxScorerConfig, PageFetchConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "seoscan")]
#[command(about = "Keyword SEO analysis of a single page (HTTP API + CLI)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API.
    Serve(ServeCmd),
    /// Analyze one URL and print the JSON result (no server).
    Analyze(AnalyzeCmd),
    /// Check that the vocabulary and model load (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

/// Vocabulary, model and fetch knobs shared by every command that analyzes.
#[derive(clap::Args, Debug, Clone)]
struct ResourceArgs {
    /// Newline-delimited token vocabulary (must contain `[UNK]`).
    #[arg(long, env = "SEOSCAN_VOCAB_PATH", default_value = "models/vocab.txt")]
    vocab_path: PathBuf,
    /// ONNX token-classification model.
    #[arg(long, env = "SEOSCAN_MODEL_PATH", default_value = "models/model.onnx")]
    model_path: PathBuf,
    /// Timeout for the page fetch (network + body).
    #[arg(long, env = "SEOSCAN_FETCH_TIMEOUT_MS", default_value_t = 20_000)]
    fetch_timeout_ms: u64,
    /// Hard cap on page bytes read.
    #[arg(long, env = "SEOSCAN_MAX_PAGE_BYTES", default_value_t = 5_000_000)]
    max_page_bytes: u64,
    /// Upper bound on one forward pass.
    #[arg(long, env = "SEOSCAN_INFERENCE_TIMEOUT_MS", default_value_t = 60_000)]
    inference_timeout_ms: u64,
    /// ONNX Runtime intra-op threads.
    #[arg(long, env = "SEOSCAN_INTRA_THREADS", default_value_t = 4)]
    intra_threads: usize,
    /// Report language. Allowed: en, pl
    #[arg(long, env = "SEOSCAN_LOCALE", default_value = "en")]
    locale: ReportLocale,
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "SEOSCAN_BIND", default_value = "127.0.0.1:8080")]
    bind: String,
    #[command(flatten)]
    resources: ResourceArgs,
}

#[derive(clap::Args, Debug)]
struct AnalyzeCmd {
    #[arg(long)]
    url: String,
    #[arg(long)]
    keyword: String,
    #[command(flatten)]
    resources: ResourceArgs,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
    #[command(flatten)]
    resources: ResourceArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn load_env_file() {
    // Opt-in only (SEOSCAN_ENV_FILE); never overrides explicit process env.
    let Ok(p) = std::env::var("SEOSCAN_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_vocab(args: &ResourceArgs) -> Result<Vocabulary> {
    Vocabulary::load(&args.vocab_path)
        .with_context(|| format!("loading vocabulary {}", args.vocab_path.display()))
}

fn load_model(args: &ResourceArgs) -> Result<OnnxScorer> {
    let cfg = OnnxScorerConfig {
        intra_threads: args.intra_threads,
    };
    OnnxScorer::load(&args.model_path, &cfg)
        .with_context(|| format!("loading model {}", args.model_path.display()))
}

fn build_analyzer(args: &ResourceArgs) -> Result<Analyzer> {
    let vocab = load_vocab(args)?;
    let model = load_model(args)?;
    let fetcher = BodyTextFetcher::local(PageFetchConfig {
        timeout_ms: Some(args.fetch_timeout_ms),
        max_bytes: Some(args.max_page_bytes),
        ..PageFetchConfig::default()
    })?;
    Ok(Analyzer::new(
        Arc::new(fetcher),
        Arc::new(model),
        Arc::new(vocab),
        AnalyzerConfig {
            inference_timeout: Duration::from_millis(args.inference_timeout_ms.max(1)),
            locale: args.locale,
        },
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Serve(args) => {
            let analyzer = build_analyzer(&args.resources)?;
            tracing::info!(?analyzer, "resources loaded");
            let addr: SocketAddr = args
                .bind
                .parse()
                .with_context(|| format!("invalid bind address {}", args.bind))?;
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            tracing::info!("seoscan listening on http://{addr}{ANALYZE_PATH}");
            axum::serve(listener, app(AppState::new(analyzer)))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server shutdown")?;
        }
        Commands::Analyze(args) => {
            validate(&args.url, &args.keyword)?;
            let analyzer = build_analyzer(&args.resources)?;
            let result = analyzer.analyze(&args.url, &args.keyword).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Doctor(args) => {
            let t0 = std::time::Instant::now();
            let mut checks: Vec<serde_json::Value> = Vec::new();

            let vocab = load_vocab(&args.resources);
            checks.push(serde_json::json!({
                "name": "vocab_loadable",
                "ok": vocab.is_ok(),
                "message": match &vocab {
                    Ok(v) => format!("{} tokens", v.len()),
                    Err(e) => format!("{e:#}"),
                },
                "hint": if vocab.is_ok() { "" } else { "Set SEOSCAN_VOCAB_PATH to a vocab.txt containing [UNK]." },
            }));

            let model = load_model(&args.resources);
            checks.push(serde_json::json!({
                "name": "model_loadable",
                "ok": model.is_ok(),
                "message": match &model {
                    Ok(_) => "model loaded".to_string(),
                    Err(e) => format!("{e:#}"),
                },
                "hint": if model.is_ok() { "" } else { "Set SEOSCAN_MODEL_PATH to an ONNX model file." },
            }));

            let ok = checks.iter().all(|c| c["ok"].as_bool() == Some(true));
            let payload = serde_json::json!({
                "schema_version": 1,
                "kind": "doctor",
                "ok": ok,
                "name": "seoscan",
                "version": env!("CARGO_PKG_VERSION"),
                "elapsed_ms": t0.elapsed().as_millis() as u64,
                "configured": {
                    "vocab_path": args.resources.vocab_path.display().to_string(),
                    "model_path": args.resources.model_path.display().to_string(),
                    "locale": args.resources.locale,
                },
                "checks": checks,
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    println!("seoscan doctor: {}", if ok { "ok" } else { "fail" });
                    for c in &checks {
                        let name = c["name"].as_str().unwrap_or("");
                        let ok = c["ok"].as_bool().unwrap_or(false);
                        println!("- {}: {}", name, if ok { "ok" } else { "fail" });
                    }
                }
                _ => println!("{payload}"),
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "seoscan",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("seoscan {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }

    Ok(())
}
