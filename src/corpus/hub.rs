use std::ops::Range;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::telemetry;

use super::{CorpusConfig, CorpusSource};

// datasets-server caps `length` at 100 rows per request
const MAX_PAGE_ROWS: usize = 100;

/// Reads a dataset split through the Hugging Face datasets-server `/rows` API.
pub struct HubRowsCorpus {
    http: Client,
    base_url: String,
    dataset: String,
    config: String,
    split: String,
    hf_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row_idx: usize,
    row: RowFields,
    #[serde(default)]
    truncated_cells: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RowFields {
    text: String,
}

impl HubRowsCorpus {
    pub fn new(cfg: &CorpusConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: cfg.server_url.trim_end_matches('/').to_string(),
            dataset: cfg.dataset.clone(),
            config: cfg.config.clone(),
            split: cfg.split.clone(),
            hf_token: cfg.hf_token.clone(),
        })
    }

    async fn fetch_page(&self, offset: usize, length: usize) -> Result<RowsPage> {
        let url = format!("{}/rows", self.base_url);
        let offset_s = offset.to_string();
        let length_s = length.to_string();
        let mut req = self.http.get(url).query(&[
            ("dataset", self.dataset.as_str()),
            ("config", self.config.as_str()),
            ("split", self.split.as_str()),
            ("offset", offset_s.as_str()),
            ("length", length_s.as_str()),
        ]);
        if let Some(token) = &self.hf_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            bail!("datasets-server {} at offset={}: {}", status, offset, body);
        }
        parse_page(&body).with_context(|| format!("parse rows page at offset={}", offset))
    }

    // a cut-off text would silently shrink the windows cut from it
    async fn fetch_full_text(&self, row_idx: usize) -> Result<String> {
        let page = self.fetch_page(row_idx, 1).await?;
        let Some(entry) = page.rows.into_iter().next() else {
            bail!("datasets-server returned no row for row_idx={}", row_idx);
        };
        if entry.text_truncated() {
            bail!(
                "datasets-server truncates the text of row {} even when fetched alone; \
                 export the split to JSONL and point PROBE_CORPUS_FILE at it",
                row_idx
            );
        }
        Ok(entry.row.text)
    }
}

impl RowEntry {
    fn text_truncated(&self) -> bool {
        self.truncated_cells.iter().any(|c| c == "text")
    }
}

fn parse_page(body: &str) -> Result<RowsPage> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl CorpusSource for HubRowsCorpus {
    fn describe(&self) -> String {
        format!("{}/{}[{}]", self.dataset, self.config, self.split)
    }

    async fn num_records(&self) -> Result<usize> {
        let page = self.fetch_page(0, 1).await?;
        Ok(page.num_rows_total)
    }

    async fn texts(&self, range: Range<usize>) -> Result<Vec<String>> {
        let log = telemetry::probe();
        let mut out = Vec::with_capacity(range.len());
        let mut offset = range.start;

        while offset < range.end {
            let length = MAX_PAGE_ROWS.min(range.end - offset);
            let page = self.fetch_page(offset, length).await?;
            if page.rows.is_empty() {
                bail!("datasets-server returned no rows at offset={} (total={})", offset, page.num_rows_total);
            }
            for entry in page.rows {
                let text = if entry.text_truncated() {
                    log.warn_kv("text cell truncated in page; refetching row alone", [("row_idx", entry.row_idx.to_string())]);
                    self.fetch_full_text(entry.row_idx).await?
                } else {
                    entry.row.text
                };
                out.push(text);
            }
            offset = range.start + out.len();
            log.debug(format!("fetched rows {}..{}", range.start, offset));
        }

        out.truncate(range.len());
        Ok(out)
    }
}
