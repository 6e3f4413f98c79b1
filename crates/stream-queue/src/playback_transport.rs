//! Playback transport abstraction.
//!
//! The queue only pauses and restarts playback around navigation; transport
//! state is never read back.

#[derive(Debug, thiserror::Error)]
pub enum PlaybackTransportError {
    #[error("playback transport offline")]
    Offline,
}

pub trait PlaybackTransport: Send + Sync {
    fn pause(&self) -> Result<(), PlaybackTransportError>;
    fn start(&self) -> Result<(), PlaybackTransportError>;
}

/// Transport that only records commands in the log.
#[derive(Debug, Default)]
pub struct LoggingTransport;

impl PlaybackTransport for LoggingTransport {
    fn pause(&self) -> Result<(), PlaybackTransportError> {
        tracing::info!("transport pause");
        Ok(())
    }

    fn start(&self) -> Result<(), PlaybackTransportError> {
        tracing::info!("transport start");
        Ok(())
    }
}
