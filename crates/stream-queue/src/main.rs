//! queuectl: inspect and edit a persisted stream queue from the shell.
//!
//! Each invocation restores the queue snapshot, applies one command, and
//! waits for the resulting snapshot write before exiting.

mod cli;

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stream_queue::config::QueueConfig;
use stream_queue::{
    EventBus, KvStore, LoggingTransport, MemoryKvStore, PersistenceSink, ProviderRegistry,
    QueueManager, QueueState, QueueStore, SettingsHandle, SqliteKvStore, Track,
};

use crate::cli::{Args, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,stream_queue=info")
        }))
        .init();

    let cfg = match args.config.as_ref() {
        Some(path) => QueueConfig::load(path)?,
        None => QueueConfig::default(),
    };

    let kv: Arc<dyn KvStore> = if args.in_memory {
        Arc::new(MemoryKvStore::default())
    } else {
        let db_path = match args.db.clone() {
            Some(path) => path,
            None => {
                let data_dir = std::env::current_dir().context("resolve working directory")?;
                cfg.db_path(&data_dir)
            }
        };
        tracing::info!(db = %db_path.display(), "opening queue snapshot store");
        Arc::new(SqliteKvStore::open(&db_path)?)
    };

    let sink = PersistenceSink::spawn(kv.clone())?;
    let queue = QueueStore::new(
        Arc::new(Mutex::new(QueueState::default())),
        sink,
        EventBus::new(),
    );
    let manager = QueueManager::new(
        queue,
        Arc::new(ProviderRegistry::new()),
        Arc::new(LoggingTransport),
        SettingsHandle::new(cfg.settings()),
    );
    manager.restore_from(kv.as_ref())?;

    run(&manager, args.cmd).await?;
    manager.flush();
    Ok(())
}

async fn run(manager: &QueueManager, cmd: Command) -> Result<()> {
    match cmd {
        Command::List => print_queue(manager),
        Command::AddLocal {
            path,
            artist,
            title,
            duration,
        } => {
            let title = title.unwrap_or_else(|| file_stem(&path));
            let path = std::fs::canonicalize(&path)
                .with_context(|| format!("resolve {:?}", path))?;
            let added = manager
                .add_to_queue(Track::local(artist, title, path, duration))
                .await
                .context("track was not queued")?;
            println!("{} {}", added.index, added.id);
        }
        Command::Remove { id } => {
            if manager.remove(&id).is_none() {
                anyhow::bail!("no queue item with id {id}");
            }
        }
        Command::Move { from, to } => manager.reposition(from, to)?,
        Command::Select { index } => {
            let nav = manager.jump_to(index).await?;
            tracing::info!(index = nav.index, outcome = ?nav.outcome, "selected");
        }
        Command::Clear => manager.clear(),
        Command::Next => match manager.next().await {
            Some(nav) => tracing::info!(index = nav.index, outcome = ?nav.outcome, "next"),
            None => tracing::info!("queue is empty"),
        },
        Command::Previous => match manager.previous().await {
            Some(nav) => tracing::info!(index = nav.index, outcome = ?nav.outcome, "previous"),
            None => tracing::info!("queue is empty"),
        },
        Command::Providers => print_providers(manager),
    }
    Ok(())
}

fn print_queue(manager: &QueueManager) {
    let state = manager.queue().snapshot();
    if state.is_empty() {
        println!("(empty)");
        return;
    }
    for (index, item) in state.items.iter().enumerate() {
        let marker = if state.selected_index == Some(index) { ">" } else { " " };
        println!(
            "{marker} {index:>3}  {} - {}  [{}]  {}",
            item.artist,
            item.name,
            item.status(),
            item.id
        );
    }
}

fn print_providers(manager: &QueueManager) {
    let providers = manager.providers();
    if providers.is_empty() {
        println!("(no stream providers registered)");
        return;
    }
    for (name, selected) in providers {
        let marker = if selected { ">" } else { " " };
        println!("{marker} {name}");
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
