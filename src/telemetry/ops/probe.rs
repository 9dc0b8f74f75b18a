use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Probe;

#[derive(Copy, Clone, Debug)]
pub enum Phase { LoadTokenizer, LoadCorpus, Sample, Chunk, Predict, Aggregate }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::LoadTokenizer => "load_tokenizer",
        Phase::LoadCorpus => "load_corpus",
        Phase::Sample => "sample",
        Phase::Chunk => "chunk",
        Phase::Predict => "predict",
        Phase::Aggregate => "aggregate",
    }}
    fn span(&self) -> Span { match self {
        Phase::LoadTokenizer => info_span!("load_tokenizer"),
        Phase::LoadCorpus => info_span!("load_corpus"),
        Phase::Sample => info_span!("sample"),
        Phase::Chunk => info_span!("chunk"),
        Phase::Predict => info_span!("predict"),
        Phase::Aggregate => info_span!("aggregate"),
    }}
}

impl OpMarker for Probe {
    const NAME: &'static str = "probe";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("probe") }
}
