use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::corpus::{self, CorpusConfig, CorpusSource};
use crate::llm::openai::seed_from_env;
use crate::llm::{CompletionClient, CompletionClientConfig, Oracle};
use crate::output::types::Meta;
use crate::pipeline::chunk::DEFAULT_CHUNK_TOKENS;
use crate::pipeline::collect::{collect_data, flatten};
use crate::pipeline::pairs::DEFAULT_PROMPT_TOKENS;
use crate::pipeline::predict::{predict, PredictOptions, PredictOutcome};
use crate::pipeline::sample::DEFAULT_TAIL_FRACTION;
use crate::telemetry;
use crate::telemetry::ops::probe::Phase as ProbePhase;
use crate::tokenizer::{HfTokenizer, TokenCodec};

#[derive(Args, Debug)]
pub struct ProbeCmd {
    /// Model identifier served by the completion endpoint
    #[arg(long)]
    model: String,
    /// Path to a tokenizer.json, a directory holding one, or a Hugging Face Hub repo id
    /// whose files include tokenizer.json (vocab.json/merges.txt-only repos are not supported)
    #[arg(long)]
    tokenizer: String,
}

/// Fixed knobs of one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeSettings {
    pub tail_fraction: f64,
    pub chunk_tokens: usize,
    pub prompt_tokens: usize,
    pub max_new_tokens: u32,
    pub seed: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            tail_fraction: DEFAULT_TAIL_FRACTION,
            chunk_tokens: DEFAULT_CHUNK_TOKENS,
            prompt_tokens: DEFAULT_PROMPT_TOKENS,
            max_new_tokens: 1,
            seed: 0,
        }
    }
}

impl ProbeSettings {
    pub fn from_env() -> Self {
        Self { seed: seed_from_env(), ..Self::default() }
    }
}

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub model: String,
    pub tokenizer: String,
    pub corpus: String,
    pub num_samples: usize,
    #[serde(flatten)]
    pub outcome: PredictOutcome,
    pub fraction: f64,
    pub settings: ProbeSettings,
}

pub async fn run(args: ProbeCmd) -> Result<()> {
    let t0 = Instant::now();
    let settings = ProbeSettings::from_env();
    let log = telemetry::probe();
    let _g = log.root_span_kv([
        ("model", args.model.clone()),
        ("tokenizer", args.tokenizer.clone()),
        ("seed", settings.seed.to_string()),
    ]).entered();

    log.info(format!("Model: {}", args.model));
    log.info(format!("Tokenizer: {}", args.tokenizer));

    let codec = {
        let _s = log.span(&ProbePhase::LoadTokenizer).entered();
        HfTokenizer::load(&args.tokenizer)
            .with_context(|| format!("load tokenizer {}", args.tokenizer))?
    };

    let corpus = {
        let _s = log.span(&ProbePhase::LoadCorpus).entered();
        corpus::open(&CorpusConfig::from_env()).context("open corpus")?
    };

    // seed once, before any generation call
    let oracle = CompletionClient::new(CompletionClientConfig::from_env(), args.model.as_str())
        .context("build completion client")?
        .with_seed(settings.seed);
    log.info_kv(
        &format!("generation seeded with {}", settings.seed),
        [("model", oracle.model().to_string()), ("seed", settings.seed.to_string())],
    );

    let (outcome, num_samples) = evaluate(corpus.as_ref(), &codec, &oracle, &settings).await?;

    let fraction = {
        let _s = log.span(&ProbePhase::Aggregate).entered();
        outcome.tally.average()?
    };
    log.info_kv(
        &format!("Fraction extractable: {}", fraction),
        [
            ("total", outcome.tally.total.to_string()),
            ("correct", outcome.tally.correct.to_string()),
            ("skipped", outcome.skipped.to_string()),
        ],
    );

    let report = ProbeReport {
        model: args.model,
        tokenizer: args.tokenizer,
        corpus: corpus.describe(),
        num_samples,
        outcome,
        fraction,
        settings,
    };
    log.result(&report, Some(Meta { duration_ms: Some(t0.elapsed().as_millis()) }))?;
    Ok(())
}

/// Sample, chunk and score; returns the outcome and the number of chunks scored.
pub async fn evaluate(
    corpus: &dyn CorpusSource,
    codec: &dyn TokenCodec,
    oracle: &dyn Oracle,
    settings: &ProbeSettings,
) -> Result<(PredictOutcome, usize)> {
    let log = telemetry::probe();

    let data = collect_data(corpus, codec, settings.tail_fraction, settings.chunk_tokens).await?;
    let flattened = flatten(data);
    log.info_kv(&format!("Num samples: {}", flattened.len()), [("samples", flattened.len().to_string())]);

    let outcome = predict(&flattened, codec, oracle, PredictOptions {
        prompt_tokens: settings.prompt_tokens,
        max_new_tokens: settings.max_new_tokens,
    }).await?;
    Ok((outcome, flattened.len()))
}
