pub mod hf;

pub use hf::HfTokenizer;

use anyhow::Result;

/// Text <-> token id conversion used by the chunker.
///
/// `encode` must not insert special tokens and `decode` must strip them, so a
/// window of ids decodes to exactly the text it covers.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    fn decode(&self, ids: &[u32]) -> Result<String>;
}
