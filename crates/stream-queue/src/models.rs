//! Queue item and track models.
//!
//! `Track` is the metadata-only input from search results, playlists and the
//! local library; `QueueItem` is the live queue entry built from it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stream_queue_types::{LOCAL_SOURCE, QueueItemSnapshot, TrackStream};

use crate::stream_url::local_stream_url;

/// Artist as delivered by a metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtistRef {
    /// Plain artist name.
    Name(String),
    /// Structured artist object; only the name is used by the queue.
    Structured { name: String },
}

impl ArtistRef {
    /// Display name of the artist.
    pub fn name(&self) -> &str {
        match self {
            ArtistRef::Name(name) => name,
            ArtistRef::Structured { name } => name,
        }
    }
}

impl From<&str> for ArtistRef {
    fn from(value: &str) -> Self {
        ArtistRef::Name(value.to_string())
    }
}

/// Local library entry backing a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Duration in seconds from the library index.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Metadata-only track that can be added to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artist: ArtistRef,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Present for tracks that live in the local library.
    #[serde(default)]
    pub local: Option<LocalFile>,
}

impl Track {
    /// Track that must be resolved through a stream provider.
    pub fn remote(artist: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: ArtistRef::Name(artist.into()),
            thumbnail: None,
            local: None,
        }
    }

    /// Track backed by a file on disk.
    pub fn local(
        artist: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        duration: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            artist: ArtistRef::Name(artist.into()),
            thumbnail: None,
            local: Some(LocalFile {
                path: path.into(),
                duration,
            }),
        }
    }
}

/// Structured failure recorded on an item whose resolution raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItemError {
    pub message: String,
    pub details: String,
}

/// Display state of a queue item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// Playable from a file on disk.
    LocalFile,
    /// Resolved to this many provider streams.
    Streams(usize),
    /// A provider call is in flight.
    Resolving,
    /// The last resolution failed with this message.
    Failed(String),
    /// Remote item waiting to become current.
    Unresolved,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::LocalFile => f.write_str("local file"),
            ItemStatus::Streams(count) => write!(f, "{count} stream(s)"),
            ItemStatus::Resolving => f.write_str("resolving"),
            ItemStatus::Failed(message) => write!(f, "error: {message}"),
            ItemStatus::Unresolved => f.write_str("unresolved"),
        }
    }
}

/// One entry in the playback queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Stable id assigned at creation.
    pub id: String,
    pub name: String,
    /// Plain artist name.
    pub artist: String,
    pub thumbnail: Option<String>,
    /// Local items are never sent to a provider.
    pub is_local: bool,
    /// Candidate streams; empty means "not yet resolved" for remote items.
    pub streams: Vec<TrackStream>,
    /// A resolution attempt is in flight.
    pub loading: bool,
    /// Last failed resolution; only ever set while `streams` is empty.
    pub error: Option<QueueItemError>,
}

impl QueueItem {
    /// Build a queue item from a track, assigning a fresh id.
    ///
    /// Local tracks get their single stream synthesized immediately.
    pub fn from_track(track: Track) -> Self {
        let streams = match track.local.as_ref() {
            Some(local) => vec![TrackStream {
                source: LOCAL_SOURCE.to_string(),
                stream_url: local_stream_url(&local.path),
                duration: local.duration,
                stream_id: None,
                title: None,
                thumbnail: None,
            }],
            None => Vec::new(),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            name: track.name,
            artist: track.artist.name().to_string(),
            thumbnail: track.thumbnail,
            is_local: track.local.is_some(),
            streams,
            loading: false,
            error: None,
        }
    }

    /// Rebuild an item from its persisted projection.
    pub fn from_snapshot(snapshot: QueueItemSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            artist: snapshot.artist,
            thumbnail: snapshot.thumbnail,
            is_local: snapshot.local,
            streams: snapshot.streams,
            loading: false,
            error: None,
        }
    }

    /// Resolution guard: remote, unresolved, and not already in flight.
    pub fn needs_resolution(&self) -> bool {
        !self.is_local && self.streams.is_empty() && !self.loading
    }

    pub fn status(&self) -> ItemStatus {
        if self.streams.first().is_some_and(TrackStream::is_local) {
            return ItemStatus::LocalFile;
        }
        if !self.streams.is_empty() {
            return ItemStatus::Streams(self.streams.len());
        }
        if self.loading {
            return ItemStatus::Resolving;
        }
        match &self.error {
            Some(error) => ItemStatus::Failed(error.message.clone()),
            None => ItemStatus::Unresolved,
        }
    }

    /// Stream with the given provider id, if present.
    pub fn stream(&self, stream_id: &str) -> Option<&TrackStream> {
        self.streams
            .iter()
            .find(|stream| stream.stream_id.as_deref() == Some(stream_id))
    }
}
