use std::path::Path;

use anyhow::{anyhow, Context, Result};
use hf_hub::api::sync::Api;
use tokenizers::Tokenizer;

use super::TokenCodec;

const TOKENIZER_FILE: &str = "tokenizer.json";

#[derive(Debug, Clone)]
pub struct HfTokenizer {
    inner: Tokenizer,
}

impl HfTokenizer {
    /// Load from a `tokenizer.json` path, a directory holding one, or a Hub repo id.
    pub fn load(spec: &str) -> Result<Self> {
        let path = Path::new(spec);
        let file = if path.is_file() {
            path.to_path_buf()
        } else if path.join(TOKENIZER_FILE).is_file() {
            path.join(TOKENIZER_FILE)
        } else {
            let api = Api::new()?;
            api.model(spec.to_string())
                .get(TOKENIZER_FILE)
                .with_context(|| {
                    format!(
                        "fetch {} for {} (repos with only vocab.json/merges.txt are not supported)",
                        TOKENIZER_FILE, spec
                    )
                })?
        };

        let mut tok = Tokenizer::from_file(&file).map_err(|e| anyhow!("{}", e))?;

        // windows are cut by token count, so the codec itself must never truncate or pad
        tok.with_truncation(None).map_err(|e| anyhow!("{}", e))?;
        tok.with_padding(None);

        Ok(Self::from_tokenizer(tok))
    }

    pub fn from_tokenizer(inner: Tokenizer) -> Self {
        Self { inner }
    }
}

impl TokenCodec for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self.inner
            .encode(text, false)
            .map_err(|e| anyhow!("{}", e))?;
        Ok(enc.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner.decode(ids, true)
            .map_err(|e| anyhow!("{}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const WORD_LEVEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 0, "content": "<eos>", "single_word": false, "lstrip": false,
             "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"<eos>": 0, "[UNK]": 1, "hello": 2, "world": 3},
            "unk_token": "[UNK]"
        }
    }"#;

    fn word_level() -> HfTokenizer {
        HfTokenizer::from_tokenizer(Tokenizer::from_str(WORD_LEVEL).unwrap())
    }

    #[test]
    fn encode_adds_no_special_tokens() {
        let tok = word_level();
        assert_eq!(tok.encode("hello world").unwrap(), vec![2, 3]);
    }

    #[test]
    fn decode_strips_special_tokens() {
        let tok = word_level();
        assert_eq!(tok.decode(&[2, 3, 0]).unwrap(), "hello world");
    }
}
