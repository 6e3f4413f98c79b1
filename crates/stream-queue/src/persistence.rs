//! Durable queue snapshots.
//!
//! `PersistenceSink` projects the queue synchronously and hands the serialized
//! snapshot to a writer thread, so callers never wait on storage. Writes are
//! applied in order and each one replaces the previous value.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};

use stream_queue_types::QueueSnapshot;

use crate::snapshot::project;
use crate::state::QueueState;

/// Key under which the queue snapshot is stored.
pub const QUEUE_KEY: &str = "queue";

const SCHEMA_VERSION: i32 = 1;

/// Minimal key-value store used for snapshots.
pub trait KvStore: Send + Sync {
    /// Store `value`, replacing any previous value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<String>>;
}

/// SQLite-backed key-value store.
#[derive(Clone)]
pub struct SqliteKvStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteKvStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create snapshot dir {:?}", parent))?;
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .context("create snapshot db pool")?;

        {
            let conn = pool.get().context("open snapshot db")?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }
}

impl KvStore for SqliteKvStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.pool.get().context("open snapshot db")?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .with_context(|| format!("write key {key}"))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.pool.get().context("open snapshot db")?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("read key {key}"))?;
        Ok(value)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .context("create snapshot schema")?;

    conn.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
        params![SCHEMA_VERSION.to_string()],
    )
    .context("insert schema version")?;
    Ok(())
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryKvStore {
    values: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryKvStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|err| err.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|err| err.into_inner());
        Ok(values.get(key).cloned())
    }
}

enum SinkCommand {
    Write { key: String, value: String },
    Flush(Sender<()>),
}

/// Fire-and-forget snapshot writer.
#[derive(Clone)]
pub struct PersistenceSink {
    tx: Sender<SinkCommand>,
}

impl PersistenceSink {
    /// Start the writer thread for `store`.
    ///
    /// The thread exits once every clone of the sink is dropped.
    pub fn spawn(store: Arc<dyn KvStore>) -> Result<Self> {
        let (tx, rx) = unbounded();
        std::thread::Builder::new()
            .name("queue-persist".to_string())
            .spawn(move || writer_loop(store, rx))
            .context("spawn queue persistence writer")?;
        Ok(Self { tx })
    }

    /// Snapshot the queue and schedule the write.
    pub fn persist(&self, state: &QueueState) {
        let value = match serde_json::to_string(&project(state)) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize queue snapshot");
                return;
            }
        };
        let cmd = SinkCommand::Write {
            key: QUEUE_KEY.to_string(),
            value,
        };
        if self.tx.send(cmd).is_err() {
            tracing::warn!("queue persistence writer stopped; snapshot dropped");
        }
    }

    /// Block until every write scheduled so far has been applied.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = bounded(1);
        if self.tx.send(SinkCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

fn writer_loop(store: Arc<dyn KvStore>, rx: Receiver<SinkCommand>) {
    for cmd in rx.iter() {
        match cmd {
            SinkCommand::Write { key, value } => {
                if let Err(err) = store.set(&key, &value) {
                    tracing::warn!(key = %key, error = %err, "failed to persist queue snapshot");
                }
            }
            SinkCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::debug!("queue persistence writer exiting");
}

/// Read the persisted queue snapshot, if one was written.
pub fn load_snapshot(store: &dyn KvStore) -> Result<Option<QueueSnapshot>> {
    let Some(raw) = store.get(QUEUE_KEY)? else {
        return Ok(None);
    };
    let snapshot = serde_json::from_str(&raw).context("parse queue snapshot")?;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QueueItem, Track};

    fn temp_db_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!(
                "stream-queue-{tag}-{}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_nanos()
            ))
            .join("queue.sqlite")
    }

    #[test]
    fn sqlite_store_overwrites_previous_value() {
        let path = temp_db_path("kv");
        let store = SqliteKvStore::open(&path).expect("open store");
        assert_eq!(store.get(QUEUE_KEY).expect("get"), None);

        store.set(QUEUE_KEY, "one").expect("set");
        store.set(QUEUE_KEY, "two").expect("set");
        assert_eq!(store.get(QUEUE_KEY).expect("get").as_deref(), Some("two"));

        let reopened = SqliteKvStore::open(&path).expect("reopen store");
        assert_eq!(reopened.get(QUEUE_KEY).expect("get").as_deref(), Some("two"));
    }

    #[test]
    fn sink_writes_latest_snapshot_in_order() {
        let store = Arc::new(MemoryKvStore::default());
        let sink = PersistenceSink::spawn(store.clone()).expect("spawn sink");

        let mut state = QueueState::default();
        state.append(QueueItem::from_track(Track::remote("A", "first")));
        sink.persist(&state);
        state.append(QueueItem::from_track(Track::remote("B", "second")));
        sink.persist(&state);
        sink.flush();

        let snapshot = load_snapshot(store.as_ref())
            .expect("load")
            .expect("snapshot present");
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[1].name, "second");
        assert_eq!(snapshot.selected_index, Some(0));
    }

    #[test]
    fn replaying_same_state_stores_same_value() {
        let store = Arc::new(MemoryKvStore::default());
        let sink = PersistenceSink::spawn(store.clone()).expect("spawn sink");
        let mut state = QueueState::default();
        state.append(QueueItem::from_track(Track::local("A", "a", "/music/a.mp3", Some(1))));

        sink.persist(&state);
        sink.flush();
        let first = store.get(QUEUE_KEY).expect("get");
        sink.persist(&state);
        sink.flush();
        let second = store.get(QUEUE_KEY).expect("get");
        assert_eq!(first, second);
    }

    #[test]
    fn load_snapshot_reports_corrupt_data() {
        let store = MemoryKvStore::default();
        store.set(QUEUE_KEY, "not json").expect("set");
        assert!(load_snapshot(&store).is_err());
        assert!(load_snapshot(&MemoryKvStore::default()).expect("load").is_none());
    }
}
