use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::CorpusSource;

#[derive(Deserialize)]
struct Record {
    text: String,
}

/// Corpus held in memory, read from a JSON Lines file of `{"text": ...}` records.
#[derive(Debug, Clone, Default)]
pub struct JsonlCorpus {
    label: String,
    texts: Vec<String>,
}

impl JsonlCorpus {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut corpus = Self::from_reader(BufReader::new(file))?;
        corpus.label = path.display().to_string();
        Ok(corpus)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut texts = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line)
                .with_context(|| format!("parse record on line {}", i + 1))?;
            texts.push(record.text);
        }
        Ok(Self { label: "jsonl".to_string(), texts })
    }

    #[cfg(test)]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { label: "memory".to_string(), texts: texts.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl CorpusSource for JsonlCorpus {
    fn describe(&self) -> String { self.label.clone() }

    async fn num_records(&self) -> Result<usize> {
        Ok(self.texts.len())
    }

    async fn texts(&self, range: Range<usize>) -> Result<Vec<String>> {
        if range.end > self.texts.len() || range.start > range.end {
            bail!("range {:?} out of bounds for {} records", range, self.texts.len());
        }
        Ok(self.texts[range].to_vec())
    }
}
