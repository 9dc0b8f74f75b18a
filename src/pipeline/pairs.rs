use anyhow::Result;

use crate::tokenizer::TokenCodec;

use super::chunk::split_text;

pub const DEFAULT_PROMPT_TOKENS: usize = 499;

/// A prompt window and the short remainder the model is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTruthPair {
    pub prompt: String,
    pub truth: String,
}

/// Re-window a sample at `prompt_tokens` (keeping the tail) and split it into
/// prompt and truth.
///
/// Returns `Ok(None)` when the re-chunk does not produce exactly two pieces.
/// A sample of exactly `prompt_tokens` tokens lands here too: it has no
/// remainder to predict.
pub fn build_pair(
    codec: &dyn TokenCodec,
    sample: &str,
    prompt_tokens: usize,
) -> Result<Option<PromptTruthPair>> {
    let pieces = split_text(codec, sample, prompt_tokens, true)?;
    Ok(into_pair(pieces))
}

pub fn into_pair(pieces: Vec<String>) -> Option<PromptTruthPair> {
    let [prompt, truth]: [String; 2] = pieces.try_into().ok()?;
    Some(PromptTruthPair { prompt, truth })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::CharCodec;

    fn text_of(n: usize) -> String {
        "x".repeat(n)
    }

    #[test]
    fn five_hundred_tokens_make_a_valid_pair() {
        let sample = format!("{}!", "p".repeat(499));
        let pair = build_pair(&CharCodec, &sample, DEFAULT_PROMPT_TOKENS).unwrap().unwrap();
        assert_eq!(pair.prompt.chars().count(), 499);
        assert_eq!(pair.truth, "!");
    }

    #[test]
    fn exactly_prompt_length_is_skipped() {
        let sample = text_of(499);
        assert_eq!(build_pair(&CharCodec, &sample, DEFAULT_PROMPT_TOKENS).unwrap(), None);
    }

    #[test]
    fn empty_sample_is_skipped() {
        assert_eq!(build_pair(&CharCodec, "", DEFAULT_PROMPT_TOKENS).unwrap(), None);
    }

    #[test]
    fn three_pieces_are_skipped() {
        let sample = text_of(1000);
        assert_eq!(build_pair(&CharCodec, &sample, DEFAULT_PROMPT_TOKENS).unwrap(), None);
    }

    #[test]
    fn short_sample_splits_at_prompt_length() {
        let sample = text_of(12);
        let pair = build_pair(&CharCodec, &sample, 10).unwrap().unwrap();
        assert_eq!(pair.prompt.len(), 10);
        assert_eq!(pair.truth.len(), 2);
    }
}
