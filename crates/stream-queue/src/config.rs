//! Configuration loading and parsing.
//!
//! Defines the TOML config schema and resolves defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::settings::QueueSettings;

const DEFAULT_DB_FILE: &str = "queue.sqlite";

/// Top-level configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct QueueConfig {
    /// Optional full path to the SQLite snapshot store.
    pub db_path: Option<String>,
    /// Stream provider selected at startup.
    pub selected_provider: Option<String>,
    /// Initial connectivity flag (defaults to online).
    pub online: Option<bool>,
    /// Navigation settings.
    pub playback: Option<PlaybackConfig>,
}

/// Navigation config from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct PlaybackConfig {
    /// Shuffle on "next".
    pub shuffle: Option<bool>,
    /// Shuffle on "previous".
    pub shuffle_when_going_back: Option<bool>,
}

impl QueueConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parse config {:?}", path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str::<QueueConfig>(raw)?)
    }

    /// Resolve the initial runtime settings.
    pub fn settings(&self) -> QueueSettings {
        let defaults = QueueSettings::default();
        let playback = self.playback.as_ref();
        QueueSettings {
            shuffle: playback
                .and_then(|p| p.shuffle)
                .unwrap_or(defaults.shuffle),
            shuffle_when_going_back: playback
                .and_then(|p| p.shuffle_when_going_back)
                .unwrap_or(defaults.shuffle_when_going_back),
            selected_provider: self
                .selected_provider
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            online: self.online.unwrap_or(defaults.online),
        }
    }

    /// Snapshot DB path from config, falling back to `<data_dir>/queue.sqlite`.
    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        self.db_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DEFAULT_DB_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = QueueConfig::parse("").expect("parse");
        assert_eq!(cfg.settings(), QueueSettings::default());
        assert_eq!(
            cfg.db_path(Path::new("/data")),
            PathBuf::from("/data/queue.sqlite")
        );
    }

    #[test]
    fn parses_playback_and_provider() {
        let cfg = QueueConfig::parse(
            r#"
            db_path = "/tmp/q.sqlite"
            selected_provider = " youtube "
            online = false

            [playback]
            shuffle = true
            shuffle_when_going_back = false
            "#,
        )
        .expect("parse");
        let settings = cfg.settings();
        assert!(settings.shuffle);
        assert!(!settings.shuffle_when_going_back);
        assert_eq!(settings.selected_provider.as_deref(), Some("youtube"));
        assert!(!settings.online);
        assert_eq!(
            cfg.db_path(Path::new("/data")),
            PathBuf::from("/tmp/q.sqlite")
        );
    }

    #[test]
    fn blank_provider_is_none() {
        let cfg = QueueConfig::parse(r#"selected_provider = "  ""#).expect("parse");
        assert_eq!(cfg.settings().selected_provider, None);
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(QueueConfig::parse("online = \"yes\"").is_err());
    }
}
