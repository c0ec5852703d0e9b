//! Content backends and backend selection
//!
//! The engine only ever sees `ContentBackend`, whose `generate` cannot fail.
//! `LiveBackend` turns a fallible `CompletionEndpoint` into that contract by
//! retrying with exponential backoff and, when every attempt fails, answering
//! with offline content for the same prompt.

use crate::core::config::BackendConfig;
use crate::core::error::{DuelError, Result};
use crate::core::types::Mode;
use crate::llm::client::LlmClient;
use crate::llm::context::Prompt;
use crate::llm::offline::OfflineBackend;
use std::time::Duration;

/// Produces text for a prompt
pub trait ContentBackend: Send {
    /// Generate a reply. Never fails; degraded backends return offline text.
    fn generate(&self, prompt: &Prompt, temperature: f32) -> String;

    /// Which variant is answering
    fn mode(&self) -> Mode;
}

/// One completion call
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A remote text-completion endpoint
pub trait CompletionEndpoint: Send + Sync {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Wait after failed attempt `attempt` (0-based): `base * 2^attempt`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// A live endpoint with retries and offline fallback
pub struct LiveBackend<E: CompletionEndpoint = LlmClient> {
    endpoint: E,
    policy: RetryPolicy,
    max_tokens: u32,
    probe_max_tokens: u32,
    offline: OfflineBackend,
}

impl<E: CompletionEndpoint> LiveBackend<E> {
    pub fn new(endpoint: E, config: &BackendConfig) -> Self {
        Self {
            endpoint,
            policy: RetryPolicy::from_config(config),
            max_tokens: config.max_tokens,
            probe_max_tokens: config.probe_max_tokens,
            offline: OfflineBackend::new(),
        }
    }

    /// Single connectivity check, no retries
    ///
    /// An error or an empty reply means the endpoint is unusable.
    pub fn probe(&self) -> Result<()> {
        let prompt = Prompt::probe();
        let request = CompletionRequest {
            prompt: &prompt.text,
            temperature: 0.0,
            max_tokens: self.probe_max_tokens,
        };
        match self.endpoint.complete(&request) {
            Ok(reply) if !reply.trim().is_empty() => Ok(()),
            Ok(_) => Err(DuelError::BackendUnavailable(
                "probe returned an empty reply".into(),
            )),
            Err(e) => Err(DuelError::BackendUnavailable(e.to_string())),
        }
    }

    /// Build and probe in one step
    pub fn connect(endpoint: E, config: &BackendConfig) -> Result<Self> {
        let backend = Self::new(endpoint, config);
        backend.probe()?;
        Ok(backend)
    }

    fn attempt(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let reply = self.endpoint.complete(request)?;
        if reply.trim().is_empty() {
            return Err(DuelError::BackendCallFailed("empty completion".into()));
        }
        Ok(reply)
    }
}

impl<E: CompletionEndpoint> ContentBackend for LiveBackend<E> {
    fn generate(&self, prompt: &Prompt, temperature: f32) -> String {
        let request = CompletionRequest {
            prompt: &prompt.text,
            temperature,
            max_tokens: self.max_tokens,
        };

        for attempt in 0..self.policy.max_attempts {
            match self.attempt(&request) {
                Ok(reply) => {
                    tracing::debug!(
                        "{} prompt ({} chars) answered with {} chars",
                        prompt.label(),
                        prompt.text.len(),
                        reply.len()
                    );
                    return reply;
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} prompt failed: {}",
                        attempt + 1,
                        self.policy.max_attempts,
                        prompt.label(),
                        e
                    );
                    if attempt + 1 < self.policy.max_attempts {
                        std::thread::sleep(self.policy.delay_after(attempt));
                    }
                }
            }
        }

        tracing::warn!(
            "All attempts failed for {} prompt, using offline content",
            prompt.label()
        );
        self.offline.generate(prompt, temperature)
    }

    fn mode(&self) -> Mode {
        Mode::Live
    }
}

/// Pick the backend for a session
///
/// Offline when forced or when no key is configured. Otherwise the live
/// client is built and probed; any failure there downgrades the whole
/// session to offline and is returned as the diagnostic.
pub fn select_backend(config: &BackendConfig) -> (Box<dyn ContentBackend>, Option<DuelError>) {
    if config.force_offline {
        tracing::info!("Offline mode forced by configuration");
        return (Box::new(OfflineBackend::new()), None);
    }

    let key = match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => key,
        _ => {
            let err = DuelError::BackendUnavailable("no API key configured".into());
            tracing::warn!("{}; running offline", err);
            return (Box::new(OfflineBackend::new()), Some(err));
        }
    };

    let live = LlmClient::new(key, config).and_then(|client| LiveBackend::connect(client, config));
    match live {
        Ok(backend) => {
            tracing::info!("Connected to {} ({})", config.api_url, config.model);
            (Box::new(backend), None)
        }
        Err(e) => {
            tracing::warn!("{}; running offline", e);
            (Box::new(OfflineBackend::new()), Some(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::context::InitContext;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        replies: Vec<Result<String>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CompletionEndpoint for Scripted {
        fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(n) {
                Some(Ok(text)) => Ok(text.clone()),
                _ => Err(DuelError::BackendCallFailed("scripted failure".into())),
            }
        }
    }

    fn fast_config() -> BackendConfig {
        BackendConfig {
            backoff_base_ms: 0,
            ..Default::default()
        }
    }

    fn init_prompt() -> Prompt {
        Prompt::init(InitContext {
            player_name: "A".into(),
            enemy_name: "B".into(),
        })
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_after(0), Duration::from_secs(1));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_then_success() {
        let endpoint = Scripted::new(vec![
            Err(DuelError::BackendCallFailed("timeout".into())),
            Ok("{\"ok\": true}".into()),
        ]);
        let backend = LiveBackend::new(endpoint, &fast_config());
        assert_eq!(backend.generate(&init_prompt(), 0.8), "{\"ok\": true}");
        assert_eq!(backend.endpoint.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_reply_counts_as_failure() {
        let endpoint = Scripted::new(vec![Ok("  ".into()), Ok("real".into())]);
        let backend = LiveBackend::new(endpoint, &fast_config());
        assert_eq!(backend.generate(&init_prompt(), 0.8), "real");
    }

    #[test]
    fn test_exhausted_attempts_fall_back_offline() {
        let backend = LiveBackend::new(Scripted::new(vec![]), &fast_config());
        let reply = backend.generate(&init_prompt(), 0.8);
        assert_eq!(backend.endpoint.calls.load(Ordering::SeqCst), 3);
        assert_eq!(reply, OfflineBackend.generate(&init_prompt(), 0.8));
        assert_eq!(backend.mode(), Mode::Live);
    }

    #[test]
    fn test_probe_rejects_empty() {
        let result = LiveBackend::connect(Scripted::new(vec![Ok(String::new())]), &fast_config());
        assert!(matches!(result, Err(DuelError::BackendUnavailable(_))));

        let endpoint = Scripted::new(vec![Ok("connected".into())]);
        let result = LiveBackend::connect(endpoint, &fast_config());
        assert!(result.is_ok());
    }

    #[test]
    fn test_select_forced_offline() {
        let config = BackendConfig {
            force_offline: true,
            api_key: Some("sk-0123456789abcdef".into()),
            ..Default::default()
        };
        let (backend, diagnostic) = select_backend(&config);
        assert_eq!(backend.mode(), Mode::Offline);
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_select_without_key_reports() {
        let (backend, diagnostic) = select_backend(&BackendConfig::default());
        assert_eq!(backend.mode(), Mode::Offline);
        assert!(matches!(diagnostic, Some(DuelError::BackendUnavailable(_))));
    }

    #[test]
    fn test_select_short_key_reports() {
        let config = BackendConfig {
            api_key: Some(" short ".into()),
            ..Default::default()
        };
        let (backend, diagnostic) = select_backend(&config);
        assert_eq!(backend.mode(), Mode::Offline);
        assert!(matches!(diagnostic, Some(DuelError::BackendUnavailable(_))));
    }
}
