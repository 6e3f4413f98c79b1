use serde::{Deserialize, Serialize};

/// `source` value carried by streams synthesized from on-disk files.
pub const LOCAL_SOURCE: &str = "Local";

/// One playable candidate for a queue item.
///
/// Values are immutable once produced by a provider; a refresh yields a new
/// value with the same `stream_id`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackStream {
    /// Provider display name, or [`LOCAL_SOURCE`] for files on disk.
    pub source: String,
    /// Playable URL (`file://` for local items).
    pub stream_url: String,
    /// Duration in seconds, when the provider knows it.
    pub duration: Option<u64>,
    /// Provider-scoped id used for refreshes. Local streams have none.
    pub stream_id: Option<String>,
    /// Provider-supplied title of the matched stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Provider-supplied artwork URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl TrackStream {
    /// `true` when this stream was synthesized from a local file.
    pub fn is_local(&self) -> bool {
        self.source == LOCAL_SOURCE
    }
}

/// Persisted projection of a single queue item.
///
/// Only stable fields are kept; in-flight resolution state is not persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueItemSnapshot {
    pub id: String,
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub local: bool,
    #[serde(default)]
    pub streams: Vec<TrackStream>,
}

/// Persisted projection of the whole queue.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Items in playback order.
    pub items: Vec<QueueItemSnapshot>,
    /// Selected position, absent when the queue is empty.
    #[serde(default)]
    pub selected_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_source_marks_stream_as_local() {
        let stream = TrackStream {
            source: LOCAL_SOURCE.to_string(),
            stream_url: "file:///music/a.mp3".to_string(),
            duration: Some(180),
            ..TrackStream::default()
        };
        assert!(stream.is_local());
        assert!(!TrackStream::default().is_local());
    }

    #[test]
    fn snapshot_accepts_missing_optional_fields() {
        let raw = r#"{"items":[{"id":"a","name":"Song","artist":"Band","local":false}]}"#;
        let snapshot: QueueSnapshot = serde_json::from_str(raw).expect("parse snapshot");
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.items[0].streams.is_empty());
        assert_eq!(snapshot.selected_index, None);
    }

    #[test]
    fn stream_omits_empty_optional_metadata() {
        let stream = TrackStream {
            source: "yt".to_string(),
            stream_url: "https://cdn/x".to_string(),
            duration: None,
            stream_id: Some("x".to_string()),
            title: None,
            thumbnail: None,
        };
        let raw = serde_json::to_string(&stream).expect("serialize");
        assert!(!raw.contains("title"));
        assert!(!raw.contains("thumbnail"));
    }
}
