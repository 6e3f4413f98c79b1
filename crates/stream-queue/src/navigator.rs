//! Next/previous selection.
//!
//! Index picking is a pure function of the current selection, the queue
//! length and the shuffle flag. `Navigator` applies the pick, resolves the
//! newly selected item, and only restarts playback once that resolution has
//! an outcome.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::error::QueueError;
use crate::events::QueueEvent;
use crate::playback_transport::PlaybackTransport;
use crate::queue_store::QueueStore;
use crate::resolver::{ResolutionOutcome, StreamResolver};
use crate::settings::QueueSettings;

/// Pick the position selected by "next".
///
/// Sequential wraps from the last item back to the first; shuffle draws
/// uniformly from the whole queue and may repeat the current position.
pub fn next_index<R: Rng + ?Sized>(
    current: Option<usize>,
    len: usize,
    shuffle: bool,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        return Some(rng.gen_range(0..len));
    }
    Some(match current {
        Some(index) if index + 1 < len => index + 1,
        _ => 0,
    })
}

/// Pick the position selected by "previous".
///
/// Sequential stops at the first item.
pub fn previous_index<R: Rng + ?Sized>(
    current: Option<usize>,
    len: usize,
    shuffle: bool,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        return Some(rng.gen_range(0..len));
    }
    Some(current.map_or(0, |index| index.saturating_sub(1).min(len - 1)))
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    /// Newly selected position.
    pub index: usize,
    /// Resolver outcome for the item at that position.
    pub outcome: ResolutionOutcome,
}

pub struct Navigator {
    queue: QueueStore,
    resolver: StreamResolver,
    transport: Arc<dyn PlaybackTransport>,
    rng: Mutex<StdRng>,
}

impl Navigator {
    pub fn new(
        queue: QueueStore,
        resolver: StreamResolver,
        transport: Arc<dyn PlaybackTransport>,
    ) -> Self {
        Self::with_rng(queue, resolver, transport, StdRng::from_entropy())
    }

    /// Navigator with a fixed shuffle seed.
    pub fn with_seed(
        queue: QueueStore,
        resolver: StreamResolver,
        transport: Arc<dyn PlaybackTransport>,
        seed: u64,
    ) -> Self {
        Self::with_rng(queue, resolver, transport, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        queue: QueueStore,
        resolver: StreamResolver,
        transport: Arc<dyn PlaybackTransport>,
        rng: StdRng,
    ) -> Self {
        Self {
            queue,
            resolver,
            transport,
            rng: Mutex::new(rng),
        }
    }

    /// Advance the selection, then restart playback once the new item's
    /// resolution has finished (resolved, dropped or failed).
    ///
    /// If another caller is already resolving the new item, playback waits
    /// for that resolution and reports its outcome.
    pub async fn next(&self, settings: &QueueSettings) -> Option<Navigation> {
        // Subscribe before selecting so a finish event cannot slip past.
        let mut events = self.queue.events().subscribe();
        let (index, id) = self.queue.select_with(|state| {
            let mut rng = self.rng.lock().unwrap_or_else(|err| err.into_inner());
            next_index(state.selected_index, state.len(), settings.shuffle, &mut *rng)
        })?;
        tracing::debug!(index, item_id = %id, shuffle = settings.shuffle, "next");

        self.pause();
        let outcome = match self.resolver.resolve_id(&id, settings).await {
            ResolutionOutcome::Skipped => self.wait_in_flight(&id, &mut events).await,
            outcome => outcome,
        };
        self.start();
        Some(Navigation { index, outcome })
    }

    /// Step the selection back and resolve the newly selected item.
    pub async fn previous(&self, settings: &QueueSettings) -> Option<Navigation> {
        let shuffle = settings.shuffle_when_going_back;
        let (index, id) = self.queue.select_with(|state| {
            let mut rng = self.rng.lock().unwrap_or_else(|err| err.into_inner());
            previous_index(state.selected_index, state.len(), shuffle, &mut *rng)
        })?;
        tracing::debug!(index, item_id = %id, shuffle, "previous");

        let outcome = self.resolver.resolve_id(&id, settings).await;
        Some(Navigation { index, outcome })
    }

    /// Select a position directly and resolve the item there.
    pub async fn jump_to(
        &self,
        index: usize,
        settings: &QueueSettings,
    ) -> Result<Navigation, QueueError> {
        let id = self.queue.select(index)?;
        let outcome = self.resolver.resolve_id(&id, settings).await;
        Ok(Navigation { index, outcome })
    }

    /// Wait for a resolution of `id` started by another caller.
    ///
    /// Returns `Skipped` straight away when the item is not loading (local,
    /// already resolved, or gone).
    async fn wait_in_flight(
        &self,
        id: &str,
        events: &mut broadcast::Receiver<QueueEvent>,
    ) -> ResolutionOutcome {
        loop {
            if !self.queue.item(id).is_some_and(|item| item.loading) {
                return ResolutionOutcome::Skipped;
            }
            tracing::debug!(item_id = %id, "waiting for in-flight resolution");
            loop {
                match events.recv().await {
                    Ok(QueueEvent::ResolutionFinished { item_id, outcome }) if item_id == id => {
                        return outcome;
                    }
                    Ok(_) => {}
                    // Missed events; re-check the item itself.
                    Err(RecvError::Lagged(_)) => break,
                    Err(RecvError::Closed) => return ResolutionOutcome::Skipped,
                }
            }
        }
    }

    fn pause(&self) {
        if let Err(err) = self.transport.pause() {
            tracing::warn!(error = %err, "transport pause failed");
        }
    }

    fn start(&self) {
        if let Err(err) = self.transport.start() {
            tracing::warn!(error = %err, "transport start failed");
        }
    }
}
