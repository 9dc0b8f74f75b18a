use anyhow::{Context, Result};
use serde::Serialize;

use crate::llm::{CompletionRequest, Oracle};
use crate::telemetry;
use crate::telemetry::ops::probe::Phase as ProbePhase;
use crate::tokenizer::TokenCodec;

use super::pairs::build_pair;
use super::score::{score, ScoreTally};

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictOptions {
    pub prompt_tokens: usize,
    pub max_new_tokens: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictOutcome {
    #[serde(flatten)]
    pub tally: ScoreTally,
    /// Samples whose re-chunk did not give exactly a prompt and a truth.
    pub skipped: usize,
}

/// Ask the oracle for the continuation of `prompt`; only new text comes back.
pub async fn generate(oracle: &dyn Oracle, prompt: &str, max_new_tokens: u32) -> Result<String> {
    let resp = oracle
        .complete(CompletionRequest::new(prompt, max_new_tokens))
        .await?;
    if let Some(usage) = &resp.usage {
        telemetry::probe().debug_kv("oracle usage", [
            ("prompt_tokens", format!("{:?}", usage.prompt_tokens)),
            ("completion_tokens", format!("{:?}", usage.completion_tokens)),
            ("total_tokens", format!("{:?}", usage.total_tokens)),
        ]);
    }
    Ok(resp.text)
}

/// Score every sample in order. Oracle failures abort the whole pass.
pub async fn predict(
    samples: &[String],
    codec: &dyn TokenCodec,
    oracle: &dyn Oracle,
    opts: PredictOptions,
) -> Result<PredictOutcome> {
    let log = telemetry::probe();
    let _p = log.span(&ProbePhase::Predict).entered();

    let mut outcome = PredictOutcome::default();
    for (i, sample) in samples.iter().enumerate() {
        let pair = build_pair(codec, sample, opts.prompt_tokens)
            .with_context(|| format!("re-chunk sample {}", i))?;
        let Some(pair) = pair else {
            outcome.skipped += 1;
            log.debug_kv("sample skipped: re-chunk did not yield prompt+truth", [("sample", i.to_string())]);
            continue;
        };

        let prediction = generate(oracle, &pair.prompt, opts.max_new_tokens)
            .await
            .with_context(|| format!("generate continuation for sample {}", i))?;
        let hit = score(&prediction, &pair.truth);
        outcome.tally.record(hit);
        log.debug_kv("scored", [
            ("sample", i.to_string()),
            ("hit", hit.to_string()),
            ("prediction", format!("{:?}", prediction)),
            ("truth", format!("{:?}", pair.truth)),
        ]);

        if (i + 1) % PROGRESS_EVERY == 0 {
            log.info(format!(
                "scored {}/{} (correct={} skipped={})",
                i + 1, samples.len(), outcome.tally.correct, outcome.skipped
            ));
        }
    }
    Ok(outcome)
}
