//! Observation sources and at-most-once detach
//!
//! A source stands for the capture session's repeating request plus its
//! result listener. The driver pulls observations from it in arrival order
//! and detaches it as soon as the machine reports a terminal result.

use crate::convergence::CancelFlag;
use crate::types::Observation;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Stream of capture-result observations for one session
#[async_trait]
pub trait ObservationSource: Send {
    /// Next observation, or `None` once the source has ended
    async fn next_observation(&mut self) -> Option<Observation>;

    /// Stop delivering observations (remove listener, stop repeating request)
    fn detach(&mut self);
}

/// Observation source backed by a bounded tokio channel
pub struct ChannelSource {
    receiver: mpsc::Receiver<Observation>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<Observation>) -> Self {
        Self { receiver }
    }

    /// Create a sender/source pair with the given channel capacity
    pub fn channel(capacity: usize) -> (mpsc::Sender<Observation>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl ObservationSource for ChannelSource {
    async fn next_observation(&mut self) -> Option<Observation> {
        self.receiver.recv().await
    }

    fn detach(&mut self) {
        // Senders see a closed channel from here on.
        self.receiver.close();
    }
}

/// Observation source replaying a recorded trace
///
/// Observations are handed out only when the driver asks for the next one,
/// so a cancel armed with [`TraceSource::cancel_after`] is raised after the
/// first `count` observations were processed and reaches the machine
/// together with observation `count + 1`.
pub struct TraceSource {
    observations: std::vec::IntoIter<Observation>,
    delivered: usize,
    cancel_at: Option<(usize, CancelFlag)>,
}

impl TraceSource {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations: observations.into_iter(),
            delivered: 0,
            cancel_at: None,
        }
    }

    /// Raise `cancel` once `count` observations have been delivered
    pub fn cancel_after(mut self, count: usize, cancel: CancelFlag) -> Self {
        self.cancel_at = Some((count, cancel));
        self
    }

    /// Observations handed out so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

#[async_trait]
impl ObservationSource for TraceSource {
    async fn next_observation(&mut self) -> Option<Observation> {
        if let Some((count, cancel)) = &self.cancel_at {
            if self.delivered == *count {
                debug!(delivered = self.delivered, "replay requesting cancellation");
                cancel.cancel();
            }
        }
        let obs = self.observations.next()?;
        self.delivered += 1;
        Some(obs)
    }

    fn detach(&mut self) {
        self.observations = Vec::new().into_iter();
    }
}

/// Owns a source for the lifetime of one session and detaches it exactly once
pub struct Subscription<S: ObservationSource> {
    source: S,
    detached: bool,
}

impl<S: ObservationSource> Subscription<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            detached: false,
        }
    }

    /// Next observation; always `None` after detach
    pub async fn next(&mut self) -> Option<Observation> {
        if self.detached {
            return None;
        }
        self.source.next_observation().await
    }

    /// Detach the source. Returns `false` when it was already detached.
    pub fn detach(&mut self) -> bool {
        if self.detached {
            return false;
        }
        self.detached = true;
        self.source.detach();
        debug!("observation source detached");
        true
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

impl<S: ObservationSource> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.detach();
    }
}
