//! Stream provider trait and registry.
//!
//! Routes resolution requests to the provider selected in settings.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use stream_queue_types::TrackStream;

use crate::settings::QueueSettings;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// No provider is selected in settings.
    #[error("no stream provider selected")]
    NoneSelected,
    /// The selected name has no registered provider.
    #[error("stream provider {0:?} is not registered")]
    NotRegistered(String),
    /// The provider backend is offline or unavailable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// The provider call failed.
    #[error("{0}")]
    Failed(String),
}

/// Search query sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamQuery {
    pub artist: String,
    pub track: String,
}

#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Registry name, also used in error messages.
    fn name(&self) -> &str;
    /// Find candidate streams; `None` or an empty list means "not found".
    async fn search(&self, query: &StreamQuery) -> Result<Option<Vec<TrackStream>>, ProviderError>;
    /// Refresh a single stream by its provider id.
    async fn stream_for_id(&self, stream_id: &str) -> Result<Option<TrackStream>, ProviderError>;
}

/// Name → provider mapping; providers may be registered at any time.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn StreamProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from an explicit provider list.
    pub fn with_providers(providers: Vec<Arc<dyn StreamProvider>>) -> Self {
        let registry = Self::new();
        for provider in providers {
            registry.register(provider);
        }
        registry
    }

    /// Register a provider under its name, returning any provider it replaced.
    pub fn register(&self, provider: Arc<dyn StreamProvider>) -> Option<Arc<dyn StreamProvider>> {
        let name = provider.name().to_string();
        tracing::debug!(provider = %name, "registering stream provider");
        self.providers
            .write()
            .unwrap_or_else(|err| err.into_inner())
            .insert(name, provider)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn StreamProvider>> {
        self.providers
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .get(name)
            .cloned()
    }

    /// Provider currently selected in `settings`.
    pub fn selected(
        &self,
        settings: &QueueSettings,
    ) -> Result<Arc<dyn StreamProvider>, ProviderError> {
        let name = settings
            .selected_provider
            .as_deref()
            .ok_or(ProviderError::NoneSelected)?;
        self.get(name)
            .ok_or_else(|| ProviderError::NotRegistered(name.to_string()))
    }
}
