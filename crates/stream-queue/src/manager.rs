//! Queue coordination for UI and CLI callers.
//!
//! Wraps the queue store, resolver and navigator, and snapshots the shared
//! settings once per call so each operation sees one consistent view.

use std::sync::Arc;

use anyhow::Result;

use crate::error::QueueError;
use crate::models::{QueueItem, Track};
use crate::navigator::{Navigation, Navigator};
use crate::persistence::{KvStore, load_snapshot};
use crate::playback_transport::PlaybackTransport;
use crate::providers::ProviderRegistry;
use crate::queue_store::QueueStore;
use crate::resolver::{ResolutionOutcome, StreamResolver};
use crate::settings::SettingsHandle;

/// Result of adding a single track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    pub id: String,
    pub index: usize,
    /// `Skipped` for local tracks, which never need a provider.
    pub outcome: ResolutionOutcome,
}

#[derive(Clone)]
pub struct QueueManager {
    queue: QueueStore,
    resolver: StreamResolver,
    navigator: Arc<Navigator>,
    settings: SettingsHandle,
}

impl QueueManager {
    pub fn new(
        queue: QueueStore,
        providers: Arc<ProviderRegistry>,
        transport: Arc<dyn PlaybackTransport>,
        settings: SettingsHandle,
    ) -> Self {
        let resolver = StreamResolver::new(queue.clone(), providers);
        let navigator = Navigator::new(queue.clone(), resolver.clone(), transport);
        Self::with_navigator(queue, resolver, navigator, settings)
    }

    /// Manager with an explicitly built navigator (seeded shuffle in tests).
    pub fn with_navigator(
        queue: QueueStore,
        resolver: StreamResolver,
        navigator: Navigator,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            queue,
            resolver,
            navigator: Arc::new(navigator),
            settings,
        }
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn resolver(&self) -> &StreamResolver {
        &self.resolver
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Registered provider names, each flagged when it is the selected one.
    pub fn providers(&self) -> Vec<(String, bool)> {
        let selected = self.settings.snapshot().selected_provider;
        self.resolver
            .providers()
            .names()
            .into_iter()
            .map(|name| {
                let is_selected = selected.as_deref() == Some(name.as_str());
                (name, is_selected)
            })
            .collect()
    }

    /// Append a track and resolve it right away when it is remote.
    pub async fn add_to_queue(&self, track: Track) -> Option<Added> {
        let settings = self.settings.snapshot();
        let item = QueueItem::from_track(track);
        let id = item.id.clone();
        let index = self.queue.append(item, &settings)?;
        let outcome = self.resolver.resolve_id(&id, &settings).await;
        Some(Added { id, index, outcome })
    }

    /// Insert a track right after the selection and resolve it.
    pub async fn play_next(&self, track: Track) -> Option<Added> {
        let settings = self.settings.snapshot();
        let item = QueueItem::from_track(track);
        let id = item.id.clone();
        let index = self.queue.insert_next(item, &settings)?;
        let outcome = self.resolver.resolve_id(&id, &settings).await;
        Some(Added { id, index, outcome })
    }

    /// Replace the queue with a single track and resolve it.
    pub async fn play_now(&self, track: Track) -> Option<Added> {
        let settings = self.settings.snapshot();
        let item = QueueItem::from_track(track);
        let id = item.id.clone();
        let index = self.queue.play_now(item, &settings)?;
        let outcome = self.resolver.resolve_id(&id, &settings).await;
        Some(Added { id, index, outcome })
    }

    /// Append a batch of tracks; only the selected item is resolved eagerly.
    pub async fn add_tracks(&self, tracks: Vec<Track>) -> Vec<String> {
        let settings = self.settings.snapshot();
        let ids = self.queue.add_tracks(tracks, &settings);
        let current = self.queue.snapshot().current().map(|item| item.id.clone());
        if let Some(id) = current {
            self.resolver.resolve_id(&id, &settings).await;
        }
        ids
    }

    pub async fn next(&self) -> Option<Navigation> {
        self.navigator.next(&self.settings.snapshot()).await
    }

    pub async fn previous(&self) -> Option<Navigation> {
        self.navigator.previous(&self.settings.snapshot()).await
    }

    pub async fn jump_to(&self, index: usize) -> Result<Navigation, QueueError> {
        self.navigator
            .jump_to(index, &self.settings.snapshot())
            .await
    }

    pub async fn select_stream(&self, item_id: &str, stream_id: &str) -> ResolutionOutcome {
        self.resolver
            .select_stream(item_id, stream_id, &self.settings.snapshot())
            .await
    }

    pub fn remove(&self, id: &str) -> Option<QueueItem> {
        self.queue.remove(id)
    }

    pub fn reposition(&self, from: usize, to: usize) -> Result<(), QueueError> {
        self.queue.reposition(from, to)
    }

    pub fn clear(&self) {
        self.queue.clear();
    }

    /// Load the persisted snapshot from `store` into the live queue.
    ///
    /// Returns whether a snapshot was found.
    pub fn restore_from(&self, store: &dyn KvStore) -> Result<bool> {
        match load_snapshot(store)? {
            Some(snapshot) => {
                self.queue.restore(snapshot);
                Ok(true)
            }
            None => {
                tracing::info!("no persisted queue; starting empty");
                Ok(false)
            }
        }
    }

    /// Block until pending snapshot writes have landed.
    pub fn flush(&self) {
        self.queue.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::persistence::MemoryKvStore;
    use crate::playback_transport::LoggingTransport;
    use crate::queue_store::tests::make_store;
    use crate::resolver::tests::{ScriptedProvider, SearchReply, settings_with, stream};
    use crate::settings::QueueSettings;

    fn make_manager(reply: SearchReply) -> (QueueManager, Arc<ScriptedProvider>, Arc<MemoryKvStore>) {
        let (store, kv) = make_store();
        let provider = Arc::new(ScriptedProvider::new("scripted", reply));
        let registry = Arc::new(ProviderRegistry::with_providers(vec![provider.clone()]));
        let manager = QueueManager::new(
            store,
            registry,
            Arc::new(LoggingTransport),
            SettingsHandle::new(settings_with("scripted")),
        );
        (manager, provider, kv)
    }

    #[tokio::test]
    async fn add_to_queue_resolves_remote_tracks() {
        let (manager, provider, _kv) =
            make_manager(SearchReply::Found(vec![stream("a", "https://a")]));

        let added = manager
            .add_to_queue(Track::remote("X", "Y"))
            .await
            .expect("added");

        assert_eq!(added.index, 0);
        assert_eq!(added.outcome, ResolutionOutcome::Resolved);
        assert_eq!(provider.searches.load(Ordering::SeqCst), 1);
        let item = manager.queue().item(&added.id).expect("item");
        assert_eq!(item.streams.len(), 1);
    }

    #[tokio::test]
    async fn local_tracks_never_reach_the_provider() {
        let (manager, provider, _kv) = make_manager(SearchReply::Missing);

        let added = manager
            .add_to_queue(Track::local("A", "a", "/music/a.mp3", Some(10)))
            .await
            .expect("added");

        assert_eq!(added.outcome, ResolutionOutcome::Skipped);
        assert_eq!(provider.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_remote_add_is_ignored() {
        let (manager, provider, _kv) = make_manager(SearchReply::Missing);
        manager.settings().set_online(false);

        assert!(manager.add_to_queue(Track::remote("X", "Y")).await.is_none());
        assert!(manager.play_next(Track::remote("X", "Y")).await.is_none());
        assert!(manager.queue().snapshot().is_empty());
        assert_eq!(provider.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn play_next_lands_after_selection() {
        let (manager, _provider, _kv) =
            make_manager(SearchReply::Found(vec![stream("a", "https://a")]));
        manager
            .add_tracks(vec![
                Track::local("A", "first", "/music/1.mp3", None),
                Track::local("A", "last", "/music/2.mp3", None),
            ])
            .await;

        let added = manager
            .play_next(Track::remote("B", "inserted"))
            .await
            .expect("added");

        assert_eq!(added.index, 1);
        let names: Vec<String> = manager
            .queue()
            .snapshot()
            .items
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["first", "inserted", "last"]);
    }

    #[tokio::test]
    async fn play_now_replaces_and_resolves() {
        let (manager, _provider, _kv) =
            make_manager(SearchReply::Found(vec![stream("a", "https://a")]));
        manager
            .add_tracks(vec![Track::remote("A", "a"), Track::remote("B", "b")])
            .await;

        let added = manager
            .play_now(Track::remote("C", "c"))
            .await
            .expect("added");

        assert_eq!(added.outcome, ResolutionOutcome::Resolved);
        let state = manager.queue().snapshot();
        assert_eq!(state.len(), 1);
        assert_eq!(state.selected_index, Some(0));
    }

    #[tokio::test]
    async fn provider_switch_applies_to_next_call() {
        let (manager, first, _kv) = make_manager(SearchReply::Missing);
        let second = Arc::new(ScriptedProvider::new(
            "other",
            SearchReply::Found(vec![stream("b", "https://b")]),
        ));
        manager.resolver().providers().register(second.clone());
        manager.settings().select_provider(Some("other".to_string()));

        let added = manager
            .add_to_queue(Track::remote("X", "Y"))
            .await
            .expect("added");

        assert_eq!(added.outcome, ResolutionOutcome::Resolved);
        assert_eq!(first.searches.load(Ordering::SeqCst), 0);
        assert_eq!(second.searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn providers_listing_marks_selection() {
        let (manager, _provider, _kv) = make_manager(SearchReply::Missing);
        manager
            .resolver()
            .providers()
            .register(Arc::new(ScriptedProvider::new("alt", SearchReply::Missing)));

        assert_eq!(
            manager.providers(),
            vec![("alt".to_string(), false), ("scripted".to_string(), true)]
        );
        manager.settings().select_provider(None);
        assert!(manager.providers().iter().all(|(_, selected)| !selected));
    }

    #[tokio::test]
    async fn restore_from_round_trips_through_store() {
        let (manager, _provider, kv) =
            make_manager(SearchReply::Found(vec![stream("a", "https://a")]));
        manager
            .add_tracks(vec![
                Track::local("A", "a", "/music/a.mp3", Some(1)),
                Track::local("B", "b", "/music/b.mp3", Some(2)),
            ])
            .await;
        manager.jump_to(1).await.expect("jump");
        manager.flush();
        let saved = manager.queue().snapshot();

        let (restored, _provider, _kv) = manager_with_empty_queue();
        assert!(restored.restore_from(kv.as_ref()).expect("restore"));
        assert_eq!(restored.queue().snapshot(), saved);

        let (empty, _provider, _kv) = manager_with_empty_queue();
        assert!(!empty.restore_from(&MemoryKvStore::default()).expect("restore"));
    }

    fn manager_with_empty_queue() -> (QueueManager, Arc<ScriptedProvider>, Arc<MemoryKvStore>) {
        make_manager(SearchReply::Missing)
    }

    #[tokio::test]
    async fn edits_go_through_the_store() {
        let (manager, _provider, _kv) = make_manager(SearchReply::Missing);
        let settings = QueueSettings::default();
        let ids = manager
            .queue()
            .add_tracks(
                vec![
                    Track::local("A", "a", "/music/a.mp3", None),
                    Track::local("B", "b", "/music/b.mp3", None),
                    Track::local("C", "c", "/music/c.mp3", None),
                ],
                &settings,
            );

        manager.reposition(0, 2).expect("move");
        assert_eq!(manager.queue().snapshot().items[2].id, ids[0]);
        assert!(manager.reposition(0, 9).is_err());

        assert!(manager.remove(&ids[1]).is_some());
        assert!(manager.remove(&ids[1]).is_none());
        assert_eq!(manager.queue().snapshot().len(), 2);

        manager.clear();
        assert!(manager.queue().snapshot().is_empty());
        assert!(manager.next().await.is_none());
    }
}
