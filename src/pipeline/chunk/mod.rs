pub mod logic;

use anyhow::{Context, Result};

use crate::tokenizer::TokenCodec;

use self::logic::window_token_ids;

pub const DEFAULT_CHUNK_TOKENS: usize = 500;

/// Tokenize `text`, cut the ids into `max_chunk_length` windows and decode each
/// window back to text. The trailing undersized window is dropped unless
/// `include_partials` is set.
pub fn split_text(
    codec: &dyn TokenCodec,
    text: &str,
    max_chunk_length: usize,
    include_partials: bool,
) -> Result<Vec<String>> {
    let ids = codec.encode(text).context("tokenize text")?;

    window_token_ids(&ids, max_chunk_length, include_partials)
        .into_iter()
        .enumerate()
        .map(|(i, window)| {
            codec
                .decode(window)
                .with_context(|| format!("decode chunk {} ({} tokens)", i, window.len()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::testing::CharCodec;

    fn text_of(n: usize) -> String {
        // cycle through a small alphabet so windows are distinguishable
        (0..n).map(|i| (b'a' + (i % 26) as u8) as char).collect()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_text(&CharCodec, "", 500, true).unwrap().is_empty());
        assert!(split_text(&CharCodec, "", 500, false).unwrap().is_empty());
    }

    #[test]
    fn thousand_tokens_split_into_two_full_chunks() {
        let text = text_of(1000);
        let chunks = split_text(&CharCodec, &text, DEFAULT_CHUNK_TOKENS, false).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], text[..500]);
        assert_eq!(chunks[1], text[500..]);
    }

    #[test]
    fn partial_tail_dropped_unless_requested() {
        let text = text_of(1200);
        assert_eq!(split_text(&CharCodec, &text, 500, false).unwrap().len(), 2);

        let with_tail = split_text(&CharCodec, &text, 500, true).unwrap();
        assert_eq!(with_tail.len(), 3);
        assert_eq!(with_tail[2].chars().count(), 200);
    }

    #[test]
    fn full_chunk_rechunks_to_itself() {
        let text = text_of(500);
        let chunks = split_text(&CharCodec, &text, 500, false).unwrap();
        let again = split_text(&CharCodec, &chunks[0], 500, false).unwrap();
        assert_eq!(again, chunks);
    }

    #[test]
    fn split_is_deterministic() {
        let text = text_of(1337);
        let a = split_text(&CharCodec, &text, 499, true).unwrap();
        let b = split_text(&CharCodec, &text, 499, true).unwrap();
        assert_eq!(a, b);
    }
}
