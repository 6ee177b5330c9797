use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use seoscan_core::{EncodedInput, Error, Result, ScoreModel};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct OnnxScorerConfig {
    pub intra_threads: usize,
}

impl Default for OnnxScorerConfig {
    fn default() -> Self {
        Self { intra_threads: 4 }
    }
}

/// Token-classification model loaded once and shared across requests.
///
/// Feeds `input_ids`, `attention_mask` and `token_type_ids` as `[1, N]` i64
/// tensors and returns the first output flattened.
///
/// One forward pass runs at a time. Callers queue on `gate` before a blocking
/// thread is taken, so a caller that gives up while queued costs nothing; a
/// pass that outlives its caller keeps the gate until it finishes.
pub struct OnnxScorer {
    session: Arc<Mutex<Session>>,
    gate: Arc<Semaphore>,
    path: PathBuf,
}

impl std::fmt::Debug for OnnxScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxScorer")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl OnnxScorer {
    pub fn load(model_path: impl AsRef<Path>, cfg: &OnnxScorerConfig) -> Result<Self> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(Error::Configuration(format!(
                "model file not found: {}",
                path.display()
            )));
        }
        let session = build_session(path, cfg).map_err(|e| {
            Error::Configuration(format!("cannot load model {}: {e}", path.display()))
        })?;
        tracing::info!(
            path = %path.display(),
            inputs = ?session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            outputs = session.outputs.len(),
            "model loaded"
        );
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            gate: Arc::new(Semaphore::new(1)),
            path: path.to_path_buf(),
        })
    }
}

fn build_session(path: &Path, cfg: &OnnxScorerConfig) -> std::result::Result<Session, BoxError> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(cfg.intra_threads.max(1))?
        .commit_from_file(path)?;
    Ok(session)
}

fn as_row(values: &[i64]) -> std::result::Result<Tensor<i64>, BoxError> {
    let arr = Array2::from_shape_vec((1, values.len()), values.to_vec())?;
    Ok(Tensor::from_array(arr)?)
}

fn run(session: &mut Session, input: &EncodedInput) -> std::result::Result<Vec<f32>, BoxError> {
    let outputs = session.run(ort::inputs![
        "input_ids" => as_row(&input.input_ids)?,
        "attention_mask" => as_row(&input.attention_mask)?,
        "token_type_ids" => as_row(&input.token_type_ids)?,
    ])?;
    let scores = outputs[0].try_extract_array::<f32>()?;
    Ok(scores.iter().copied().collect())
}

#[async_trait::async_trait]
impl ScoreModel for OnnxScorer {
    fn name(&self) -> &'static str {
        "onnx"
    }

    async fn score(&self, input: &EncodedInput) -> Result<Vec<f32>> {
        let t0 = std::time::Instant::now();
        let permit = match Arc::clone(&self.gate).try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(
                    model = %self.path.display(),
                    "model busy with an earlier pass; queueing"
                );
                Arc::clone(&self.gate)
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Inference(e.to_string()))?
            }
        };
        let session = Arc::clone(&self.session);
        let input = input.clone();
        let scores = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut guard = session
                .lock()
                .map_err(|_| Error::Inference("model session lock poisoned".to_string()))?;
            run(&mut guard, &input).map_err(|e| Error::Inference(e.to_string()))
        })
        .await
        .map_err(|e| Error::Inference(format!("inference join failed: {e}")))??;
        tracing::debug!(
            scores = scores.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "inference done"
        );
        Ok(scores)
    }
}
