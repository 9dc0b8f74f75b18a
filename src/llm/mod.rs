pub mod openai;

pub use openai::{CompletionClient, CompletionClientConfig, CompletionRequest, Oracle};
