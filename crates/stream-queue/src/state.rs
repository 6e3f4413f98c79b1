//! Queue state and its pure mutation primitives.
//!
//! Every method here is synchronous and side-effect free apart from the
//! mutation itself; persistence and events are layered on by `QueueStore`.

use stream_queue_types::{QueueSnapshot, TrackStream};

use crate::error::QueueError;
use crate::models::{QueueItem, QueueItemError};

/// Ordered queue plus the selected position.
///
/// `selected_index` is `None` iff `items` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueState {
    /// Items in playback order.
    pub items: Vec<QueueItem>,
    /// Currently selected position.
    pub selected_index: Option<usize>,
}

/// Data captured when an item is claimed for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveClaim {
    pub id: String,
    pub artist: String,
    pub name: String,
}

impl QueueState {
    /// Rebuild state from a persisted snapshot, clamping the selection.
    pub fn from_snapshot(snapshot: QueueSnapshot) -> Self {
        let items: Vec<QueueItem> = snapshot
            .items
            .into_iter()
            .map(QueueItem::from_snapshot)
            .collect();
        let selected_index = if items.is_empty() {
            None
        } else {
            Some(snapshot.selected_index.unwrap_or(0).min(items.len() - 1))
        };
        Self {
            items,
            selected_index,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at the selected position.
    pub fn current(&self) -> Option<&QueueItem> {
        self.selected_index.and_then(|index| self.items.get(index))
    }

    /// Position of the item with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&QueueItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut QueueItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Add at the end; the first item of an empty queue becomes selected.
    pub fn append(&mut self, item: QueueItem) -> usize {
        self.items.push(item);
        if self.selected_index.is_none() {
            self.selected_index = Some(0);
        }
        self.items.len() - 1
    }

    /// Add immediately after the selected item.
    pub fn insert_next(&mut self, item: QueueItem) -> usize {
        match self.selected_index {
            Some(selected) => {
                let index = (selected + 1).min(self.items.len());
                self.items.insert(index, item);
                index
            }
            None => self.append(item),
        }
    }

    /// Overwrite the item with the same id. Returns `false` if it is gone.
    pub fn replace(&mut self, item: QueueItem) -> bool {
        match self.get_mut(&item.id) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        }
    }

    /// Remove by id, keeping the selection valid.
    ///
    /// Removing the selected item leaves the numeric position in place
    /// (clamped); removing an earlier item shifts the selection back so the
    /// selected item does not change.
    pub fn remove(&mut self, id: &str) -> Option<QueueItem> {
        let position = self.position(id)?;
        let removed = self.items.remove(position);
        self.selected_index = if self.items.is_empty() {
            None
        } else {
            let last = self.items.len() - 1;
            match self.selected_index {
                Some(selected) if position < selected => Some(selected - 1),
                Some(selected) => Some(selected.min(last)),
                None => Some(0),
            }
        };
        Some(removed)
    }

    /// Move an item, preserving the relative order of all others.
    ///
    /// The selection follows the selected item.
    pub fn reposition(&mut self, from: usize, to: usize) -> Result<(), QueueError> {
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                return Err(QueueError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        if let Some(selected) = self.selected_index {
            let selected = if selected == from {
                to
            } else if from < selected && selected <= to {
                selected - 1
            } else if to <= selected && selected < from {
                selected + 1
            } else {
                selected
            };
            self.selected_index = Some(selected);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected_index = None;
    }

    pub fn select(&mut self, index: usize) -> Result<(), QueueError> {
        if index >= self.items.len() {
            return Err(QueueError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.selected_index = Some(index);
        Ok(())
    }

    /// Check the resolution guard and mark the item loading in one step.
    ///
    /// Returns `None` when there is no item at `index` or it does not need
    /// resolution (local, already resolved, or already in flight).
    pub fn claim_resolution(&mut self, index: usize) -> Option<ResolveClaim> {
        let item = self.items.get_mut(index)?;
        if !item.needs_resolution() {
            return None;
        }
        item.loading = true;
        Some(ResolveClaim {
            id: item.id.clone(),
            artist: item.artist.clone(),
            name: item.name.clone(),
        })
    }

    /// Record a successful resolution.
    pub fn apply_streams(&mut self, id: &str, streams: Vec<TrackStream>) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.loading = false;
        item.error = None;
        item.streams = streams;
        true
    }

    /// Record a failed resolution; streams are left untouched.
    pub fn apply_failure(&mut self, id: &str, error: QueueItemError) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.loading = false;
        item.error = Some(error);
        true
    }

    /// Put a refreshed stream first, keeping the other alternates.
    ///
    /// Fields the provider left empty are taken from the old entry, and the
    /// old `stream_id` is kept. Returns `false` if the item or the old stream
    /// is gone.
    pub fn replace_stream(&mut self, id: &str, stream_id: &str, fresh: TrackStream) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        let Some(old) = item.stream(stream_id).cloned() else {
            return false;
        };
        let refreshed = merge_stream(old, fresh);
        let mut streams = Vec::with_capacity(item.streams.len());
        streams.push(refreshed);
        streams.extend(
            item.streams
                .iter()
                .filter(|stream| stream.stream_id.as_deref() != Some(stream_id))
                .cloned(),
        );
        item.streams = streams;
        item.error = None;
        true
    }
}

fn merge_stream(old: TrackStream, fresh: TrackStream) -> TrackStream {
    TrackStream {
        source: if fresh.source.is_empty() {
            old.source
        } else {
            fresh.source
        },
        stream_url: fresh.stream_url,
        duration: fresh.duration.or(old.duration),
        stream_id: old.stream_id,
        title: fresh.title.or(old.title),
        thumbnail: fresh.thumbnail.or(old.thumbnail),
    }
}
