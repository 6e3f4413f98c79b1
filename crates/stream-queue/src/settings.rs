//! Runtime playback settings.
//!
//! The process-wide values live behind a `SettingsHandle`; operations take a
//! cloned `QueueSettings` snapshot so a call sees one consistent view.

use std::sync::{Arc, RwLock};

/// Settings read by the queue, resolver and navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    /// Shuffle on forward navigation.
    pub shuffle: bool,
    /// Shuffle on backward navigation, independent of `shuffle`.
    pub shuffle_when_going_back: bool,
    /// Name of the stream provider used for new resolutions.
    pub selected_provider: Option<String>,
    /// Connectivity flag; remote items cannot be queued while offline.
    pub online: bool,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            shuffle_when_going_back: false,
            selected_provider: None,
            online: true,
        }
    }
}

/// Shared, mutable settings.
#[derive(Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<QueueSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> QueueSettings {
        self.inner
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    /// Apply an in-place update.
    pub fn update(&self, f: impl FnOnce(&mut QueueSettings)) {
        let mut settings = self.inner.write().unwrap_or_else(|err| err.into_inner());
        f(&mut settings);
    }

    pub fn set_online(&self, online: bool) {
        self.update(|settings| settings.online = online);
    }

    /// Switch the provider used by subsequent resolutions.
    pub fn select_provider(&self, name: Option<String>) {
        tracing::info!(provider = ?name, "stream provider selected");
        self.update(|settings| settings.selected_provider = name);
    }
}
