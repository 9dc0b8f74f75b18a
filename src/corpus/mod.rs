pub mod hub;
pub mod jsonl;

use std::ops::Range;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

pub use hub::HubRowsCorpus;
pub use jsonl::JsonlCorpus;

const DEFAULT_DATASET: &str = "graelo/wikipedia";
const DEFAULT_DATASET_CONFIG: &str = "20230601.fi";
const DEFAULT_SPLIT: &str = "train";
const DEFAULT_DATASETS_SERVER_URL: &str = "https://datasets-server.huggingface.co";

/// Ordered, read-only sequence of text records. Only the `text` field is used.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Human readable identifier used in logs and the final report.
    fn describe(&self) -> String;
    async fn num_records(&self) -> Result<usize>;
    /// Texts for `range`, in corpus order.
    async fn texts(&self, range: Range<usize>) -> Result<Vec<String>>;
}

#[derive(Clone, Debug)]
pub struct CorpusConfig {
    pub dataset: String,
    pub config: String,
    pub split: String,
    pub server_url: String,
    pub hf_token: Option<String>,
    pub file: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            config: DEFAULT_DATASET_CONFIG.to_string(),
            split: DEFAULT_SPLIT.to_string(),
            server_url: DEFAULT_DATASETS_SERVER_URL.to_string(),
            hf_token: None,
            file: None,
        }
    }
}

impl CorpusConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("PROBE_DATASET") { cfg.dataset = v; }
        if let Ok(v) = std::env::var("PROBE_DATASET_CONFIG") { cfg.config = v; }
        if let Ok(v) = std::env::var("PROBE_DATASET_SPLIT") { cfg.split = v; }
        if let Ok(v) = std::env::var("PROBE_DATASETS_SERVER_URL") { cfg.server_url = v; }
        cfg.hf_token = std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty());
        cfg.file = std::env::var("PROBE_CORPUS_FILE").ok().filter(|p| !p.is_empty()).map(PathBuf::from);
        cfg
    }
}

/// Local JSONL when `file` is set, otherwise the datasets-server rows API.
pub fn open(cfg: &CorpusConfig) -> Result<Box<dyn CorpusSource>> {
    match &cfg.file {
        Some(path) => {
            let corpus = JsonlCorpus::open(path)
                .with_context(|| format!("open corpus file {}", path.display()))?;
            Ok(Box::new(corpus))
        }
        None => Ok(Box::new(HubRowsCorpus::new(cfg)?)),
    }
}
