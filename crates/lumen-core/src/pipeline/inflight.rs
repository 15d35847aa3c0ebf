//! Per-key request coalescing.
//!
//! When enabled, only one request per cache key runs the transform at a
//! time. Later arrivals wait for the leader to finish and then re-check the
//! cache, which the leader has filled by then.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, PipelineResult};

type Flights = Arc<Mutex<HashMap<String, watch::Receiver<()>>>>;

/// Registry of keys currently being computed.
#[derive(Debug, Default, Clone)]
pub struct InflightRegistry {
    flights: Flights,
}

/// Leadership of one key. Dropping it wakes every waiter.
#[derive(Debug)]
pub struct FlightGuard {
    key: String,
    flights: Flights,
    _done: watch::Sender<()>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
        // `_done` drops after this body, closing the channel
    }
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the leader for `key`, waiting behind any current leader.
    pub async fn join(&self, key: &str, cancel: &CancellationToken) -> PipelineResult<FlightGuard> {
        loop {
            let mut waiting = {
                let mut flights = self
                    .flights
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match flights.get(key) {
                    Some(rx) => rx.clone(),
                    None => {
                        let (tx, rx) = watch::channel(());
                        flights.insert(key.to_string(), rx);
                        return Ok(FlightGuard {
                            key: key.to_string(),
                            flights: Arc::clone(&self.flights),
                            _done: tx,
                        });
                    }
                }
            };

            tracing::trace!("Waiting on in-flight request for {}", key);
            tokio::select! {
                // Resolves with an error once the leader's sender is gone
                _ = waiting.changed() => {}
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            }
        }
    }

    /// Number of keys with a leader right now.
    pub fn len(&self) -> usize {
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
