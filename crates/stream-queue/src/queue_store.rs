//! Shared queue store.
//!
//! Owns queue mutations. Each mutation runs under a single lock acquisition
//! and, while still holding it, persists the post-mutation state and notifies
//! subscribers.

use std::sync::{Arc, Mutex, MutexGuard};

use stream_queue_types::{QueueSnapshot, TrackStream};

use crate::error::QueueError;
use crate::events::EventBus;
use crate::models::{QueueItem, QueueItemError, Track};
use crate::persistence::PersistenceSink;
use crate::settings::QueueSettings;
use crate::state::{QueueState, ResolveClaim};

#[derive(Clone)]
pub struct QueueStore {
    queue: Arc<Mutex<QueueState>>,
    sink: PersistenceSink,
    events: EventBus,
}

impl QueueStore {
    /// Create a store backed by the shared queue state.
    pub fn new(queue: Arc<Mutex<QueueState>>, sink: PersistenceSink, events: EventBus) -> Self {
        Self {
            queue,
            sink,
            events,
        }
    }

    /// Return the shared queue state (for inspection/testing).
    pub fn queue(&self) -> &Arc<Mutex<QueueState>> {
        &self.queue
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Block until scheduled snapshot writes have landed.
    pub fn flush(&self) {
        self.sink.flush();
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn commit(&self, queue: &QueueState) {
        self.sink.persist(queue);
        self.events.queue_changed();
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> QueueState {
        self.lock().clone()
    }

    pub fn item(&self, id: &str) -> Option<QueueItem> {
        self.lock().get(id).cloned()
    }

    pub fn item_at(&self, index: usize) -> Option<QueueItem> {
        self.lock().items.get(index).cloned()
    }

    /// Add at the end. Remote items are ignored while offline.
    pub fn append(&self, item: QueueItem, settings: &QueueSettings) -> Option<usize> {
        if !accepts(&item, settings) {
            return None;
        }
        let mut queue = self.lock();
        let index = queue.append(item);
        self.commit(&queue);
        Some(index)
    }

    /// Add right after the selection. Remote items are ignored while offline.
    pub fn insert_next(&self, item: QueueItem, settings: &QueueSettings) -> Option<usize> {
        if !accepts(&item, settings) {
            return None;
        }
        let mut queue = self.lock();
        let index = queue.insert_next(item);
        self.commit(&queue);
        Some(index)
    }

    /// Append a batch of tracks (playlist/album add) with a single snapshot.
    ///
    /// Returns the ids of the items that were actually queued.
    pub fn add_tracks(&self, tracks: Vec<Track>, settings: &QueueSettings) -> Vec<String> {
        let items: Vec<QueueItem> = tracks
            .into_iter()
            .map(QueueItem::from_track)
            .filter(|item| accepts(item, settings))
            .collect();
        if items.is_empty() {
            return Vec::new();
        }
        let ids = items.iter().map(|item| item.id.clone()).collect();
        let mut queue = self.lock();
        for item in items {
            queue.append(item);
        }
        self.commit(&queue);
        ids
    }

    /// Replace the queue with a single item and select it.
    pub fn play_now(&self, item: QueueItem, settings: &QueueSettings) -> Option<usize> {
        if !accepts(&item, settings) {
            return None;
        }
        let mut queue = self.lock();
        queue.clear();
        let index = queue.append(item);
        self.commit(&queue);
        Some(index)
    }

    /// Overwrite an item by id; a missing id is a lost update, not an error.
    pub fn replace(&self, item: QueueItem) -> bool {
        let mut queue = self.lock();
        if !queue.replace(item) {
            tracing::debug!("replace ignored; item no longer queued");
            return false;
        }
        self.commit(&queue);
        true
    }

    pub fn remove(&self, id: &str) -> Option<QueueItem> {
        let mut queue = self.lock();
        let removed = queue.remove(id)?;
        self.commit(&queue);
        Some(removed)
    }

    pub fn reposition(&self, from: usize, to: usize) -> Result<(), QueueError> {
        let mut queue = self.lock();
        queue.reposition(from, to)?;
        self.commit(&queue);
        Ok(())
    }

    pub fn clear(&self) {
        let mut queue = self.lock();
        queue.clear();
        self.commit(&queue);
    }

    /// Select a position, returning the id of the item now selected.
    pub fn select(&self, index: usize) -> Result<String, QueueError> {
        let mut queue = self.lock();
        queue.select(index)?;
        let id = queue.items[index].id.clone();
        self.commit(&queue);
        Ok(id)
    }

    /// Pick and select a position atomically against the current state.
    ///
    /// Returns the position and the id of the item selected there, so
    /// follow-up work can address the item even if the queue shifts.
    pub fn select_with(
        &self,
        pick: impl FnOnce(&QueueState) -> Option<usize>,
    ) -> Option<(usize, String)> {
        let mut queue = self.lock();
        let index = pick(&queue)?;
        queue.select(index).ok()?;
        let id = queue.items[index].id.clone();
        self.commit(&queue);
        Some((index, id))
    }

    /// Atomically check the resolution guard at `index` and mark it loading.
    pub fn claim_resolution(&self, index: usize) -> Option<ResolveClaim> {
        let mut queue = self.lock();
        let claim = queue.claim_resolution(index)?;
        self.commit(&queue);
        Some(claim)
    }

    /// As [`QueueStore::claim_resolution`], looking the item up by id.
    pub fn claim_resolution_by_id(&self, id: &str) -> Option<ResolveClaim> {
        let mut queue = self.lock();
        let index = queue.position(id)?;
        let claim = queue.claim_resolution(index)?;
        self.commit(&queue);
        Some(claim)
    }

    pub fn apply_streams(&self, id: &str, streams: Vec<TrackStream>) -> bool {
        let mut queue = self.lock();
        if !queue.apply_streams(id, streams) {
            return false;
        }
        self.commit(&queue);
        true
    }

    pub fn apply_failure(&self, id: &str, error: QueueItemError) -> bool {
        let mut queue = self.lock();
        if !queue.apply_failure(id, error) {
            return false;
        }
        self.commit(&queue);
        true
    }

    pub fn replace_stream(&self, id: &str, stream_id: &str, fresh: TrackStream) -> bool {
        let mut queue = self.lock();
        if !queue.replace_stream(id, stream_id, fresh) {
            return false;
        }
        self.commit(&queue);
        true
    }

    /// Replace the whole queue from a persisted snapshot.
    pub fn restore(&self, snapshot: QueueSnapshot) {
        let restored = QueueState::from_snapshot(snapshot);
        tracing::info!(
            items = restored.len(),
            selected = ?restored.selected_index,
            "restored queue from snapshot"
        );
        let mut queue = self.lock();
        *queue = restored;
        self.commit(&queue);
    }
}

fn accepts(item: &QueueItem, settings: &QueueSettings) -> bool {
    if item.is_local || settings.online {
        return true;
    }
    tracing::debug!(
        artist = %item.artist,
        title = %item.name,
        "offline; ignoring remote queue add"
    );
    false
}
