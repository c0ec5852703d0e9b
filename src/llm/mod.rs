//! Content generation: prompts, backends and response repair

pub mod backend;
pub mod client;
pub mod context;
pub mod offline;
pub mod repair;

pub use backend::{
    select_backend, CompletionEndpoint, CompletionRequest, ContentBackend, LiveBackend,
    RetryPolicy,
};
pub use client::LlmClient;
pub use context::{Prompt, PromptKind};
pub use offline::OfflineBackend;
