//! `token_sum.onnx` computes `float(input_ids + attention_mask + token_type_ids)`
//! over `[1, sequence]` i64 inputs, so each score is predictable from the encoding.

use seoscan_core::{encode, EncodedInput, ScoreModel, Vocabulary};
use seoscan_local::{OnnxScorer, OnnxScorerConfig};
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/token_sum.onnx")
}

fn scorer() -> OnnxScorer {
    OnnxScorer::load(fixture(), &OnnxScorerConfig { intra_threads: 1 }).unwrap()
}

#[tokio::test]
async fn encoded_page_gets_one_score_per_token() {
    let vocab = Vocabulary::from_lines(["[PAD]", "[UNK]", "shoes", "buy"]).unwrap();
    let input = encode(&vocab, "shoes", "Buy shoes today.");
    assert_eq!(input.input_ids, vec![2, 3, 2, 1]);

    let scores = scorer().score(&input).await.unwrap();
    assert_eq!(scores.len(), input.len());
    assert_eq!(scores, vec![3.0, 4.0, 3.0, 2.0]);
}

#[tokio::test]
async fn every_input_tensor_reaches_the_graph() {
    let input = EncodedInput {
        input_ids: vec![5, 7, 11],
        attention_mask: vec![1, 0, 1],
        token_type_ids: vec![0, 10, 100],
    };
    let scores = scorer().score(&input).await.unwrap();
    assert_eq!(scores, vec![6.0, 17.0, 112.0]);
}

#[tokio::test]
async fn sequence_length_is_not_fixed() {
    let model = scorer();
    for n in [1usize, 9, 300] {
        let input = EncodedInput {
            input_ids: vec![1; n],
            attention_mask: vec![1; n],
            token_type_ids: vec![0; n],
        };
        let scores = model.score(&input).await.unwrap();
        assert_eq!(scores.len(), n);
        assert!(scores.iter().all(|&s| s == 2.0));
    }
}
