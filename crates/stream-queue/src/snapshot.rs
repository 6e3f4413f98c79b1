//! Queue projection into its persisted form.

use stream_queue_types::{QueueItemSnapshot, QueueSnapshot};

use crate::state::QueueState;

/// Project the live queue into its serializable snapshot.
///
/// Pure: the same state always yields the same snapshot.
pub fn project(state: &QueueState) -> QueueSnapshot {
    QueueSnapshot {
        items: state
            .items
            .iter()
            .map(|item| QueueItemSnapshot {
                id: item.id.clone(),
                name: item.name.clone(),
                artist: item.artist.clone(),
                thumbnail: item.thumbnail.clone(),
                local: item.is_local,
                streams: item.streams.clone(),
            })
            .collect(),
        selected_index: state.selected_index,
    }
}
