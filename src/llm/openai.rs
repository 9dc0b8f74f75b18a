#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";
const DEFAULT_SEED: u64 = 0;

/// Connection settings for an OpenAI-compatible text completion server
/// (vLLM, TGI, llama.cpp server, ...).
#[derive(Clone, Debug)]
pub struct CompletionClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for CompletionClientConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("PROBE_ORACLE_API_KEY").ok(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl CompletionClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("PROBE_ORACLE_URL") {
            cfg.base_url = base;
        }
        if let Ok(timeout) = std::env::var("PROBE_ORACLE_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.timeout = Some(Duration::from_secs(parsed));
            }
        }
        cfg
    }
}

/// Seed from `PROBE_SEED`, falling back to 0.
pub fn seed_from_env() -> u64 {
    std::env::var("PROBE_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SEED)
}

#[derive(Clone)]
pub struct CompletionClient {
    http: HttpClient,
    cfg: CompletionClientConfig,
    model: String,
    seed: Option<u64>,
}

impl CompletionClient {
    pub fn new(cfg: CompletionClientConfig, model: impl Into<String>) -> Result<Self, OracleError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OracleError::http)?;
        Ok(Self { http, cfg, model: model.into(), seed: None })
    }

    /// Fix the sampling seed for every request this client sends.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn model(&self) -> &str { &self.model }

    fn endpoint(&self) -> String {
        format!(
            "{}/completions",
            self.cfg.base_url.trim_end_matches('/')
        )
    }

    fn build_api_request(&self, req: &CompletionRequest) -> ApiCompletionRequest {
        ApiCompletionRequest {
            model: self.model.clone(),
            prompt: req.prompt.clone(),
            max_tokens: req.max_new_tokens,
            // greedy decoding; the seed pins whatever sampling the server still does
            temperature: 0.0,
            seed: self.seed,
            echo: false,
        }
    }
}

/// Generation oracle: continues a prompt and returns only the new text.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, OracleError>;
}

#[async_trait]
impl Oracle for CompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, OracleError> {
        let api_request = self.build_api_request(&request);
        let endpoint = self.endpoint();

        let mut http_req = self.http.post(endpoint).json(&api_request);
        if let Some(key) = &self.cfg.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(OracleError::from_reqwest)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(OracleError::from_reqwest)?;

        if !status.is_success() {
            let api_err = serde_json::from_slice::<ApiErrorEnvelope>(&bytes)
                .ok()
                .map(|env| env.error);
            return Err(OracleError::Api {
                status,
                error: api_err.unwrap_or_default(),
            });
        }

        parse_completion(&bytes)
    }
}

fn parse_completion(bytes: &[u8]) -> Result<CompletionResponse, OracleError> {
    let parsed: ApiCompletionResponse =
        serde_json::from_slice(bytes).map_err(OracleError::Decode)?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or(OracleError::EmptyChoices)?;

    Ok(CompletionResponse {
        text,
        usage: parsed.usage.map(|usage| UsageMetrics {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_new_tokens: u32) -> Self {
        Self { prompt: prompt.into(), max_new_tokens }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionResponse {
    /// Continuation only; the prompt is never echoed back.
    pub text: String,
    pub usage: Option<UsageMetrics>,
}

#[cfg(test)]
impl CompletionResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into(), usage: None }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UsageMetrics {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug)]
pub enum OracleError {
    Http(reqwest::Error),
    Timeout,
    Api {
        status: StatusCode,
        error: ApiErrorBody,
    },
    EmptyChoices,
    #[cfg(test)]
    MockQueueEmpty,
    Decode(serde_json::Error),
}

impl OracleError {
    fn http(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::Http(err)
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        Self::http(err)
    }
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Http(err) => write!(f, "http error: {err}"),
            OracleError::Timeout => write!(f, "request timed out"),
            OracleError::Api { status, error } => {
                write!(f, "api error {status}: {}", error.message)
            }
            OracleError::EmptyChoices => {
                write!(f, "completion response contained no choices")
            }
            #[cfg(test)]
            OracleError::MockQueueEmpty => {
                write!(f, "mock oracle response queue is empty")
            }
            OracleError::Decode(err) => write!(f, "decode error: {err}"),
        }
    }
}

impl std::error::Error for OracleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OracleError::Http(err) => Some(err),
            OracleError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
}

impl Default for ApiErrorBody {
    fn default() -> Self {
        Self {
            message: "unknown error".to_string(),
            r#type: None,
            code: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockOracle {
    responses: Mutex<VecDeque<Result<CompletionResponse, OracleError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

#[cfg(test)]
impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(
        &self,
        resp: Result<CompletionResponse, OracleError>,
    ) {
        self.responses.lock().unwrap().push_back(resp);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push_response(Ok(CompletionResponse::from_text(text)));
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Oracle for MockOracle {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, OracleError> {
        self.calls.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleError::MockQueueEmpty))
    }
}

#[derive(Debug, Clone, Serialize)]
struct ApiCompletionRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    echo: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiCompletionResponse {
    choices: Vec<ApiCompletionChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiCompletionChoice {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> CompletionClient {
        CompletionClient::new(
            CompletionClientConfig {
                api_key: None,
                base_url: "http://oracle.local/v1/".to_string(),
                timeout: Some(Duration::from_secs(30)),
            },
            "TurkuNLP/gpt3-finnish-small",
        )
        .unwrap()
    }

    #[test]
    fn build_request_pins_greedy_single_token() {
        let client = client().with_seed(0);
        let api_request = client.build_api_request(&CompletionRequest::new("Suomi on", 1));
        let value = serde_json::to_value(&api_request).unwrap();

        assert_eq!(value["model"], "TurkuNLP/gpt3-finnish-small");
        assert_eq!(value["prompt"], "Suomi on");
        assert_eq!(value["max_tokens"], 1);
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["seed"], 0);
        assert_eq!(value["echo"], false);
    }

    #[test]
    fn unseeded_request_omits_seed() {
        let api_request = client().build_api_request(&CompletionRequest::new("x", 1));
        let value = serde_json::to_value(&api_request).unwrap();
        assert!(value.get("seed").is_none());
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(client().endpoint(), "http://oracle.local/v1/completions");
    }

    #[test]
    fn parse_completion_takes_first_choice_text() {
        let body = json!({
            "id": "cmpl-1",
            "object": "text_completion",
            "choices": [{"index": 0, "text": " maa", "finish_reason": "length"}],
            "usage": {"prompt_tokens": 499, "completion_tokens": 1, "total_tokens": 500}
        });
        let resp = parse_completion(body.to_string().as_bytes()).unwrap();
        assert_eq!(resp.text, " maa");
        assert_eq!(resp.usage.unwrap().completion_tokens, Some(1));
    }

    #[test]
    fn parse_completion_without_choices_fails() {
        let body = json!({"choices": []});
        let err = parse_completion(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, OracleError::EmptyChoices));
    }

    #[tokio::test]
    async fn mock_oracle_returns_enqueued_response() {
        let mock = MockOracle::new();
        mock.push_text(" maa");

        let req = CompletionRequest::new("Suomi on", 1);
        let out = mock.complete(req.clone()).await.unwrap();

        assert_eq!(out.text, " maa");
        assert_eq!(mock.calls(), vec![req]);
        assert!(matches!(
            mock.complete(CompletionRequest::new("x", 1)).await,
            Err(OracleError::MockQueueEmpty)
        ));
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = OracleError::Api {
            status: StatusCode::NOT_FOUND,
            error: ApiErrorBody {
                message: "model not found".into(),
                r#type: Some("NotFoundError".into()),
                code: None,
            },
        };

        assert_eq!(
            format!("{err}"),
            "api error 404 Not Found: model not found"
        );
    }
}
