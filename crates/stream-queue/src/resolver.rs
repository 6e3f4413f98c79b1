//! Deferred stream resolution for queue items.
//!
//! A remote item is claimed (guard check + `loading=true`) in one locked step,
//! the selected provider is called without holding the lock, and the result
//! is applied back by id. Failures are captured on the item, never returned.

use std::sync::Arc;

use crate::events::EventBus;
use crate::models::QueueItemError;
use crate::providers::{ProviderRegistry, StreamProvider, StreamQuery};
use crate::queue_store::QueueStore;
use crate::settings::QueueSettings;
use crate::state::ResolveClaim;

/// What a resolution request ended up doing to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Streams were stored on the item.
    Resolved,
    /// The provider had nothing; the item was removed.
    Dropped,
    /// The provider call failed; the error was recorded on the item.
    Failed,
    /// The guard rejected the request; no provider call was made.
    Skipped,
    /// The item was removed while the provider call was in flight.
    Orphaned,
}

#[derive(Clone)]
pub struct StreamResolver {
    queue: QueueStore,
    providers: Arc<ProviderRegistry>,
    events: EventBus,
}

impl StreamResolver {
    pub fn new(queue: QueueStore, providers: Arc<ProviderRegistry>) -> Self {
        let events = queue.events().clone();
        Self {
            queue,
            providers,
            events,
        }
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    /// Resolve the item at `index` if it still needs streams.
    pub async fn resolve_at(&self, index: usize, settings: &QueueSettings) -> ResolutionOutcome {
        let Some(claim) = self.queue.claim_resolution(index) else {
            return ResolutionOutcome::Skipped;
        };
        self.run(claim, settings).await
    }

    /// Resolve the item with `id` if it still needs streams.
    pub async fn resolve_id(&self, id: &str, settings: &QueueSettings) -> ResolutionOutcome {
        let Some(claim) = self.queue.claim_resolution_by_id(id) else {
            return ResolutionOutcome::Skipped;
        };
        self.run(claim, settings).await
    }

    async fn run(&self, claim: ResolveClaim, settings: &QueueSettings) -> ResolutionOutcome {
        self.events.resolution_started(&claim.id);
        let outcome = self.search(&claim, settings).await;
        tracing::debug!(item_id = %claim.id, outcome = ?outcome, "resolution finished");
        self.events.resolution_finished(&claim.id, outcome);
        outcome
    }

    async fn search(&self, claim: &ResolveClaim, settings: &QueueSettings) -> ResolutionOutcome {
        let provider = match self.providers.selected(settings) {
            Ok(provider) => provider,
            Err(err) => {
                let name = selected_name(settings);
                return self.record_failure(claim, name, &err.to_string());
            }
        };
        let query = StreamQuery {
            artist: claim.artist.clone(),
            track: claim.name.clone(),
        };
        tracing::debug!(
            item_id = %claim.id,
            provider = %provider.name(),
            artist = %claim.artist,
            title = %claim.name,
            "resolving streams"
        );

        match provider.search(&query).await {
            Ok(Some(streams)) if !streams.is_empty() => {
                if self.queue.apply_streams(&claim.id, streams) {
                    ResolutionOutcome::Resolved
                } else {
                    ResolutionOutcome::Orphaned
                }
            }
            Ok(_) => {
                tracing::info!(
                    item_id = %claim.id,
                    provider = %provider.name(),
                    artist = %claim.artist,
                    title = %claim.name,
                    "no streams found; dropping queue item"
                );
                self.drop_item(&claim.id)
            }
            Err(err) => self.record_failure(claim, provider.name(), &err.to_string()),
        }
    }

    /// Refresh one alternate stream picked by the user.
    ///
    /// The refreshed entry moves to the front and the other alternates are
    /// kept. If the provider no longer knows the id, the item is dropped.
    pub async fn select_stream(
        &self,
        item_id: &str,
        stream_id: &str,
        settings: &QueueSettings,
    ) -> ResolutionOutcome {
        let Some(item) = self.queue.item(item_id) else {
            tracing::debug!(item_id = %item_id, "stream selection ignored; item not queued");
            return ResolutionOutcome::Skipped;
        };
        if item.stream(stream_id).is_none() {
            tracing::warn!(
                item_id = %item_id,
                stream_id = %stream_id,
                "stream selection ignored; unknown stream id"
            );
            return ResolutionOutcome::Skipped;
        }
        let claim = ResolveClaim {
            id: item.id,
            artist: item.artist,
            name: item.name,
        };

        self.events.resolution_started(&claim.id);
        let outcome = self.refresh(&claim, stream_id, settings).await;
        tracing::debug!(item_id = %claim.id, outcome = ?outcome, "stream selection finished");
        self.events.resolution_finished(&claim.id, outcome);
        outcome
    }

    async fn refresh(
        &self,
        claim: &ResolveClaim,
        stream_id: &str,
        settings: &QueueSettings,
    ) -> ResolutionOutcome {
        let provider: Arc<dyn StreamProvider> = match self.providers.selected(settings) {
            Ok(provider) => provider,
            Err(err) => {
                return self.refresh_failed(claim, selected_name(settings), &err.to_string());
            }
        };

        match provider.stream_for_id(stream_id).await {
            Ok(Some(fresh)) => {
                if self.queue.replace_stream(&claim.id, stream_id, fresh) {
                    ResolutionOutcome::Resolved
                } else {
                    ResolutionOutcome::Orphaned
                }
            }
            Ok(None) => {
                tracing::info!(
                    item_id = %claim.id,
                    provider = %provider.name(),
                    stream_id = %stream_id,
                    "stream no longer available; dropping queue item"
                );
                self.drop_item(&claim.id)
            }
            Err(err) => self.refresh_failed(claim, provider.name(), &err.to_string()),
        }
    }

    /// A failed refresh leaves the item as it was: its current streams are
    /// still playable, so no error is recorded on it.
    fn refresh_failed(
        &self,
        claim: &ResolveClaim,
        provider: &str,
        details: &str,
    ) -> ResolutionOutcome {
        tracing::warn!(
            item_id = %claim.id,
            provider = %provider,
            artist = %claim.artist,
            title = %claim.name,
            error = %details,
            "stream refresh failed"
        );
        if self.queue.item(&claim.id).is_some() {
            ResolutionOutcome::Failed
        } else {
            ResolutionOutcome::Orphaned
        }
    }

    fn drop_item(&self, id: &str) -> ResolutionOutcome {
        if self.queue.remove(id).is_some() {
            ResolutionOutcome::Dropped
        } else {
            ResolutionOutcome::Orphaned
        }
    }

    fn record_failure(
        &self,
        claim: &ResolveClaim,
        provider: &str,
        details: &str,
    ) -> ResolutionOutcome {
        tracing::warn!(
            item_id = %claim.id,
            provider = %provider,
            artist = %claim.artist,
            title = %claim.name,
            error = %details,
            "stream resolution failed"
        );
        let error = QueueItemError {
            message: format!("resolution failed via {provider}"),
            details: details.to_string(),
        };
        if self.queue.apply_failure(&claim.id, error) {
            ResolutionOutcome::Failed
        } else {
            ResolutionOutcome::Orphaned
        }
    }
}

fn selected_name(settings: &QueueSettings) -> &str {
    settings.selected_provider.as_deref().unwrap_or("none")
}
