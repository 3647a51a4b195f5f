//! Injected platform capabilities.
//!
//! Host storage and wall-clock time are explicit ports rather than ambient
//! facilities, injected into the components that use them, so the session
//! core is testable without a host environment.

use std::time::{SystemTime, UNIX_EPOCH};

/// Key-value persistence scoped by the host (tab-scoped or cross-tab).
///
/// Two instances are injected: a tab-scoped store (invisible to other tabs,
/// survives reloads within the tab) and a shared store (visible across tabs).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait StorageProvider: Send + Sync {
    /// Save a string value with the given key.
    fn save(&self, key: &str, value: &str);

    /// Load a string value by key, returns None if not found.
    fn load(&self, key: &str) -> Option<String>;

    /// Remove a value by key.
    fn remove(&self, key: &str);
}

/// Wall-clock time source.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Default [`TimeProvider`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeProvider for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! In-memory fakes for the platform ports.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::StorageProvider;

    /// HashMap-backed [`StorageProvider`].
    #[derive(Default)]
    pub struct InMemoryStorage {
        entries: Mutex<HashMap<String, String>>,
    }

    impl InMemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl StorageProvider for InMemoryStorage {
        fn save(&self, key: &str, value: &str) {
            if let Ok(mut entries) = self.entries.lock() {
                entries.insert(key.to_owned(), value.to_owned());
            }
        }

        fn load(&self, key: &str) -> Option<String> {
            self.entries.lock().ok()?.get(key).cloned()
        }

        fn remove(&self, key: &str) {
            if let Ok(mut entries) = self.entries.lock() {
                entries.remove(key);
            }
        }
    }
}
