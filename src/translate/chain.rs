//! Ordered backend chain with per-backend retry and cross-backend fallback

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use crate::config::Settings;
use crate::error::BackendError;

use super::backend::Backend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub original: String,
    pub translated: String,
    pub succeeded: bool,
}

impl TranslationResult {
    fn failed(original: &str) -> Self {
        Self {
            original: original.to_string(),
            translated: original.to_string(),
            succeeded: false,
        }
    }
}

pub struct BackendChain {
    backends: Vec<Box<dyn Backend>>,
    delay: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl BackendChain {
    /// Build a chain in the given order, collapsing duplicates and dropping
    /// backends that report themselves unavailable.
    pub fn new(backends: Vec<Box<dyn Backend>>, settings: &Settings) -> Self {
        let mut seen = HashSet::new();
        let mut kept: Vec<Box<dyn Backend>> = Vec::with_capacity(backends.len());

        for backend in backends {
            if !seen.insert(backend.name().to_string()) {
                tracing::debug!("Collapsing duplicate backend entry: {}", backend.name());
                continue;
            }
            if !backend.is_available() {
                tracing::warn!("Backend {} is not available, skipping", backend.name());
                continue;
            }
            kept.push(backend);
        }

        Self {
            backends: kept,
            delay: settings.delay,
            max_retries: settings.max_retries.max(1),
            retry_base_delay: settings.retry_base_delay,
        }
    }

    /// Like [`BackendChain::new`], then moves the first backend with a healthy
    /// self-hosted endpoint to the front.
    pub fn with_self_hosted_probe(
        backends: Vec<Box<dyn Backend>>,
        settings: &Settings,
        timeout: Duration,
    ) -> Self {
        let mut chain = Self::new(backends, settings);

        let preferred = chain
            .backends
            .iter_mut()
            .position(|b| b.prefer_self_hosted(timeout));

        match preferred {
            Some(idx) => {
                let backend = chain.backends.remove(idx);
                tracing::info!("Self-hosted {} prioritized", backend.name());
                chain.backends.insert(0, backend);
            }
            None => tracing::info!("Using configured backend order (no self-hosted instance)"),
        }

        chain
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Translate with the first backend that succeeds; the original text is
    /// returned when every backend fails.
    pub fn translate_with_fallback(&self, text: &str) -> String {
        self.translate(text).translated
    }

    pub fn translate(&self, text: &str) -> TranslationResult {
        for backend in &self.backends {
            match self.attempt(backend.as_ref(), text) {
                Ok(translated) => {
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    return TranslationResult {
                        original: text.to_string(),
                        translated,
                        succeeded: true,
                    };
                }
                Err(BackendError::RateLimited) => {
                    tracing::warn!("{} rate limit hit, falling back to next backend", backend.name());
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", backend.name(), e);
                }
            }
        }

        tracing::warn!(
            "All translation backends failed for: {}",
            preview(text)
        );
        TranslationResult::failed(text)
    }

    fn attempt(&self, backend: &dyn Backend, text: &str) -> Result<String, BackendError> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                thread::sleep(self.backoff(attempt));
            }

            match backend.translate(text) {
                Ok(result) if !result.trim().is_empty() => return Ok(result),
                Ok(_) => return Err(BackendError::EmptyResult),
                Err(e) if e.is_retryable() => {
                    tracing::debug!("{} attempt {} failed: {}", backend.name(), attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(BackendError::EmptyResult))
    }

    /// `base * 2^attempt`
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay * 2u32.pow(attempt)
    }
}

pub(crate) fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 50;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(MAX_CHARS).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::backend::testing::{AlwaysFails, Identity, Tagged, Uppercase};

    fn chain(backends: Vec<Box<dyn Backend>>) -> BackendChain {
        BackendChain::new(backends, &Settings::immediate())
    }

    #[test]
    fn test_falls_back_to_next_backend() {
        let chain = chain(vec![Box::new(AlwaysFails::new("broken")), Box::new(Uppercase)]);
        assert_eq!(chain.translate_with_fallback("hello"), "HELLO");
    }

    #[test]
    fn test_all_failing_returns_original() {
        let chain = chain(vec![
            Box::new(AlwaysFails::new("a")),
            Box::new(AlwaysFails::new("b")),
        ]);
        let result = chain.translate("hello");
        assert_eq!(result.translated, "hello");
        assert!(!result.succeeded);
    }

    #[test]
    fn test_empty_chain_returns_original() {
        let chain = chain(Vec::new());
        assert!(chain.is_empty());
        assert_eq!(chain.translate_with_fallback("hello"), "hello");
    }

    #[test]
    fn test_duplicates_collapsed() {
        let chain = chain(vec![
            Box::new(Identity),
            Box::new(Uppercase),
            Box::new(Identity),
        ]);
        assert_eq!(chain.names(), vec!["identity", "uppercase"]);
    }

    #[test]
    fn test_self_hosted_moves_to_front() {
        let chain = BackendChain::with_self_hosted_probe(
            vec![
                Box::new(Uppercase),
                Box::new(Tagged::new("remote")),
                Box::new(Tagged::self_hosted("local")),
            ],
            &Settings::immediate(),
            Duration::from_millis(10),
        );
        assert_eq!(chain.names(), vec!["local", "uppercase", "remote"]);
        assert_eq!(chain.translate_with_fallback("hi"), "local:hi");
    }

    #[test]
    fn test_retryable_errors_retry_within_backend() {
        let settings = Settings {
            max_retries: 3,
            ..Settings::immediate()
        };
        let flaky = std::sync::Arc::new(AlwaysFails::retryable("flaky"));

        struct Shared(std::sync::Arc<AlwaysFails>);
        impl Backend for Shared {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn translate(&self, text: &str) -> Result<String, BackendError> {
                self.0.translate(text)
            }
        }

        let chain = BackendChain::new(
            vec![Box::new(Shared(flaky.clone())), Box::new(Uppercase)],
            &settings,
        );
        assert_eq!(chain.translate_with_fallback("abc"), "ABC");
        assert_eq!(flaky.calls(), 3);
    }

    #[test]
    fn test_rate_limit_is_not_retried() {
        let settings = Settings {
            max_retries: 3,
            ..Settings::immediate()
        };
        let limited = std::sync::Arc::new(AlwaysFails::new("limited"));

        struct Shared(std::sync::Arc<AlwaysFails>);
        impl Backend for Shared {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn translate(&self, text: &str) -> Result<String, BackendError> {
                self.0.translate(text)
            }
        }

        let chain = BackendChain::new(vec![Box::new(Shared(limited.clone()))], &settings);
        assert_eq!(chain.translate_with_fallback("abc"), "abc");
        assert_eq!(limited.calls(), 1);
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        let settings = Settings {
            retry_base_delay: Duration::from_millis(20),
            ..Settings::immediate()
        };
        let chain = chain_with(&settings);
        assert_eq!(chain.backoff(1), Duration::from_millis(40));
        assert_eq!(chain.backoff(2), Duration::from_millis(80));
    }

    fn chain_with(settings: &Settings) -> BackendChain {
        BackendChain::new(vec![Box::new(Identity)], settings)
    }

    #[test]
    fn test_preview_truncates() {
        let long = "a".repeat(80);
        assert_eq!(preview(&long).chars().count(), 53);
        assert_eq!(preview("short"), "short");
    }
}
