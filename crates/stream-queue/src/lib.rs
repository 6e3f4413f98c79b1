//! Stream queue core: a persisted play queue whose remote items are resolved
//! to playable streams on demand.
//!
//! ## Flow
//! 1. **Queue**: `QueueStore` owns every mutation and snapshots the queue after each one.
//! 2. **Resolve**: `StreamResolver` asks the selected `StreamProvider` for streams when an
//!    item becomes current, at most once per item at a time.
//! 3. **Navigate**: `Navigator` picks next/previous positions and restarts playback once the
//!    new item has been resolved.

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod models;
pub mod navigator;
pub mod persistence;
pub mod playback_transport;
pub mod providers;
pub mod queue_store;
pub mod resolver;
pub mod settings;
pub mod snapshot;
pub mod state;
pub mod stream_url;

pub use error::QueueError;
pub use events::{EventBus, QueueEvent};
pub use manager::QueueManager;
pub use models::{ArtistRef, ItemStatus, LocalFile, QueueItem, QueueItemError, Track};
pub use navigator::{Navigation, Navigator};
pub use persistence::{KvStore, MemoryKvStore, PersistenceSink, SqliteKvStore};
pub use playback_transport::{LoggingTransport, PlaybackTransport, PlaybackTransportError};
pub use providers::{ProviderError, ProviderRegistry, StreamProvider, StreamQuery};
pub use queue_store::QueueStore;
pub use resolver::{ResolutionOutcome, StreamResolver};
pub use settings::{QueueSettings, SettingsHandle};
pub use state::QueueState;
