//! Translation backend contract

use std::time::Duration;

use crate::error::BackendError;

/// A single translation provider.
///
/// Implementations must never panic on provider failure; every problem is
/// reported through [`BackendError`] so the chain can decide whether to retry
/// or move on.
pub trait Backend: Send + Sync {
    /// Stable identifier, used to collapse duplicate entries in a chain.
    fn name(&self) -> &str;

    fn translate(&self, text: &str) -> Result<String, BackendError>;

    fn is_available(&self) -> bool {
        true
    }

    /// Probe a self-hosted endpoint and switch to it when it answers within `timeout`.
    ///
    /// Returns `true` when the backend is now talking to a self-hosted instance,
    /// which makes the chain move it to the front.
    fn prefer_self_hosted(&mut self, _timeout: Duration) -> bool {
        false
    }
}

#[cfg(test)]
pub mod testing {
    //! Deterministic backends for tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Returns the input unchanged.
    pub struct Identity;

    impl Backend for Identity {
        fn name(&self) -> &str {
            "identity"
        }

        fn translate(&self, text: &str) -> Result<String, BackendError> {
            Ok(text.to_string())
        }
    }

    /// Upper-cases the input.
    pub struct Uppercase;

    impl Backend for Uppercase {
        fn name(&self) -> &str {
            "uppercase"
        }

        fn translate(&self, text: &str) -> Result<String, BackendError> {
            Ok(text.to_uppercase())
        }
    }

    /// Fails every call and counts them.
    pub struct AlwaysFails {
        pub name: String,
        pub calls: AtomicUsize,
        pub retryable: bool,
    }

    impl AlwaysFails {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                retryable: false,
            }
        }

        pub fn retryable(name: &str) -> Self {
            Self {
                retryable: true,
                ..Self::new(name)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Backend for AlwaysFails {
        fn name(&self) -> &str {
            &self.name
        }

        fn translate(&self, _text: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.retryable {
                Err(BackendError::Network("connection reset".into()))
            } else {
                Err(BackendError::RateLimited)
            }
        }
    }

    /// Prefixes translated text with a tag and records every request.
    pub struct Tagged {
        pub tag: String,
        pub seen: Mutex<Vec<String>>,
        pub self_hosted: bool,
    }

    impl Tagged {
        pub fn new(tag: &str) -> Self {
            Self {
                tag: tag.to_string(),
                seen: Mutex::new(Vec::new()),
                self_hosted: false,
            }
        }

        pub fn self_hosted(tag: &str) -> Self {
            Self {
                self_hosted: true,
                ..Self::new(tag)
            }
        }

        pub fn seen(&self) -> Vec<String> {
            self.seen.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    impl Backend for Tagged {
        fn name(&self) -> &str {
            &self.tag
        }

        fn translate(&self, text: &str) -> Result<String, BackendError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(text.to_string());
            }
            Ok(format!("{}:{}", self.tag, text))
        }

        fn prefer_self_hosted(&mut self, _timeout: Duration) -> bool {
            self.self_hosted
        }
    }
}
