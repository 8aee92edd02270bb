//! Bounded event waiting.
//!
//! One `EventWaiter` owns one subscription to a peer's event stream. Every
//! wait consumes from its own logical cursor: events that arrive while a
//! wait is looking for something else are kept in a backlog, so a later
//! wait targeting a different event kind still observes them in arrival
//! order. A timed-out wait cancels only itself; the subscription stays
//! usable.

use std::collections::VecDeque;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use troth_proto::SecurityEvent;

/// Why a wait resolved without a matching event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The bounded window elapsed.
    #[error("no matching event within {window:?}")]
    Timeout {
        /// The window that elapsed.
        window: Duration,
    },

    /// The peer's event stream closed.
    #[error("event stream closed")]
    Closed,
}

/// Consumes one peer's event stream with bounded, predicate-driven waits.
#[derive(Debug)]
pub struct EventWaiter {
    rx: mpsc::UnboundedReceiver<SecurityEvent>,
    backlog: VecDeque<SecurityEvent>,
}

impl EventWaiter {
    /// Wrap a subscription.
    #[must_use]
    pub fn new(rx: mpsc::UnboundedReceiver<SecurityEvent>) -> Self {
        Self { rx, backlog: VecDeque::new() }
    }

    /// Wait until an event matching `matches` arrives, or `window` elapses.
    ///
    /// Scans the backlog first, then the live stream. Non-matching live
    /// events are retained for later waits, never dropped.
    ///
    /// # Errors
    ///
    /// [`WaitError::Timeout`] when the window elapses, [`WaitError::Closed`]
    /// when the stream ends first.
    pub async fn wait_for<F>(
        &mut self,
        window: Duration,
        mut matches: F,
    ) -> Result<SecurityEvent, WaitError>
    where
        F: FnMut(&SecurityEvent) -> bool,
    {
        if let Some(pos) = self.backlog.iter().position(&mut matches) {
            // remove() is Some by construction: pos came from this backlog.
            if let Some(event) = self.backlog.remove(pos) {
                return Ok(event);
            }
        }

        let deadline = tokio::time::Instant::now() + window;
        loop {
            let recv = tokio::time::timeout_at(deadline, self.rx.recv());
            match recv.await {
                Err(_) => return Err(WaitError::Timeout { window }),
                Ok(None) => return Err(WaitError::Closed),
                Ok(Some(event)) if matches(&event) => return Ok(event),
                Ok(Some(event)) => self.backlog.push_back(event),
            }
        }
    }

    /// Pull every already-delivered event into the backlog, then return the
    /// first backlogged event matching `matches`, removing it.
    ///
    /// Non-blocking; used to assert that something did *not* happen.
    pub fn take_buffered<F>(&mut self, mut matches: F) -> Option<SecurityEvent>
    where
        F: FnMut(&SecurityEvent) -> bool,
    {
        while let Ok(event) = self.rx.try_recv() {
            self.backlog.push_back(event);
        }
        let pos = self.backlog.iter().position(&mut matches)?;
        self.backlog.remove(pos)
    }

    /// Close the subscription and drop all retained events.
    pub fn close(&mut self) {
        self.rx.close();
        self.backlog.clear();
    }
}
