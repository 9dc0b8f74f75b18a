use anyhow::{Context, Result};

use crate::corpus::CorpusSource;
use crate::telemetry;
use crate::telemetry::ops::probe::Phase as ProbePhase;
use crate::tokenizer::TokenCodec;

use super::chunk::split_text;
use super::sample::tail_range;

/// Sample the corpus tail and cut every sampled text into full windows of
/// `chunk_tokens` tokens. One inner `Vec` per sampled record.
pub async fn collect_data(
    corpus: &dyn CorpusSource,
    codec: &dyn TokenCodec,
    tail_fraction: f64,
    chunk_tokens: usize,
) -> Result<Vec<Vec<String>>> {
    let log = telemetry::probe();

    let texts = {
        let _s = log.span(&ProbePhase::Sample).entered();
        let n = corpus.num_records().await.context("count corpus records")?;
        log.info_kv(&format!("Full dataset: {}", n), [("records", n.to_string())]);

        let range = tail_range(n, tail_fraction);
        let texts = corpus
            .texts(range.clone())
            .await
            .with_context(|| format!("read records {:?}", range))?;
        log.info_kv(&format!("Split dataset: {}", texts.len()), [("records", texts.len().to_string())]);
        texts
    };

    let _c = log.span(&ProbePhase::Chunk).entered();
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            split_text(codec, text, chunk_tokens, false)
                .with_context(|| format!("chunk sampled record {}", i))
        })
        .collect()
}

pub fn flatten(matrix: Vec<Vec<String>>) -> Vec<String> {
    matrix.into_iter().flatten().collect()
}
