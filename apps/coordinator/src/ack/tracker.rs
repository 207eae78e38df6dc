//! Registry of expected acknowledgments.
//!
//! Each registered entry races its own timer against a completion channel.
//! Whichever side removes the entry from the registry first decides the
//! outcome, and the removal happens under the registry lock, so every entry
//! resolves exactly once: acked or timed out.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::ack_id::Ack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Acked,
    TimedOut,
}

struct PendingAck {
    serial: u64,
    ack: Ack,
    enqueued_at: Instant,
    timeout: Duration,
    received: oneshot::Sender<()>,
}

#[derive(Default)]
struct Registry {
    next_serial: u64,
    entries: Vec<PendingAck>,
}

/// Cloneable handle to one ack registry.
#[derive(Clone, Default)]
pub struct AckTracker {
    registry: Arc<Mutex<Registry>>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `ack` within `timeout`. Exactly one of the callbacks runs, on
    /// the entry's timer task.
    ///
    /// Registering the same (ack id, acker) twice is allowed; each entry is
    /// matched and resolved on its own, oldest first.
    pub fn add_pending<A, T>(&self, ack: Ack, timeout: Duration, on_ack: A, on_timeout: T)
    where
        A: FnOnce() + Send + 'static,
        T: FnOnce() + Send + 'static,
    {
        self.register(ack, timeout, move |outcome| match outcome {
            AckOutcome::Acked => on_ack(),
            AckOutcome::TimedOut => on_timeout(),
        });
    }

    /// Register `ack` and get a future that resolves with its outcome.
    pub fn expect(&self, ack: Ack, timeout: Duration) -> AckWaiter {
        let (tx, rx) = oneshot::channel();
        let waited = ack.clone();
        self.register(ack, timeout, move |outcome| {
            let _ = tx.send(outcome);
        });
        AckWaiter { ack: waited, rx }
    }

    /// Resolve the oldest pending entry equal to `ack`. Returns false (and
    /// logs) when nothing matches, e.g. an ack that arrives after its entry
    /// timed out.
    pub fn notify_ack(&self, ack: &Ack) -> bool {
        let mut registry = self.registry.lock();
        let Some(pos) = registry.entries.iter().position(|e| e.ack == *ack) else {
            warn!(ack_id = %ack.ack_id, acker = %ack.acker, "Ack matched no pending entry; dropped");
            return false;
        };
        let entry = registry.entries.remove(pos);
        debug!(
            ack_id = %ack.ack_id,
            acker = %ack.acker,
            waited_ms = entry.enqueued_at.elapsed().as_millis() as u64,
            "Ack received"
        );
        // Sent under the lock: a timer that finds its entry gone always
        // finds the signal already queued.
        let _ = entry.received.send(());
        true
    }

    /// Ack ids still outstanding, oldest first.
    pub fn list_pending_ids(&self) -> Vec<String> {
        self.registry
            .lock()
            .entries
            .iter()
            .map(|e| e.ack.ack_id.clone())
            .collect()
    }

    pub fn list_pending(&self) -> Vec<Ack> {
        self.registry
            .lock()
            .entries
            .iter()
            .map(|e| e.ack.clone())
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.registry.lock().entries.len()
    }

    pub fn pending_count_where<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&Ack) -> bool,
    {
        self.registry
            .lock()
            .entries
            .iter()
            .filter(|e| pred(&e.ack))
            .count()
    }

    /// Drop every pending entry. Their timer tasks resolve them as timed out
    /// right away, without a timeout warning.
    pub fn clear(&self) -> usize {
        let dropped = std::mem::take(&mut self.registry.lock().entries);
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "Pending acks cleared");
        }
        dropped.len()
    }

    fn register<F>(&self, ack: Ack, timeout: Duration, resolve: F)
    where
        F: FnOnce(AckOutcome) + Send + 'static,
    {
        let (tx, mut rx) = oneshot::channel();
        let serial = {
            let mut registry = self.registry.lock();
            if registry.entries.iter().any(|e| e.ack == ack) {
                warn!(ack_id = %ack.ack_id, acker = %ack.acker, "Duplicate pending ack registered");
            }
            let serial = registry.next_serial;
            registry.next_serial += 1;
            registry.entries.push(PendingAck {
                serial,
                ack: ack.clone(),
                enqueued_at: Instant::now(),
                timeout,
                received: tx,
            });
            serial
        };
        debug!(ack_id = %ack.ack_id, acker = %ack.acker, timeout_ms = timeout.as_millis() as u64, "Ack expected");

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            tokio::select! {
                received = &mut rx => {
                    resolve(if received.is_ok() { AckOutcome::Acked } else { AckOutcome::TimedOut });
                }
                _ = tokio::time::sleep(timeout) => {
                    let claimed = {
                        let mut registry = registry.lock();
                        registry
                            .entries
                            .iter()
                            .position(|e| e.serial == serial)
                            .map(|pos| registry.entries.remove(pos))
                    };
                    match claimed {
                        Some(entry) => {
                            warn!(
                                ack_id = %entry.ack.ack_id,
                                acker = %entry.ack.acker,
                                timeout_ms = entry.timeout.as_millis() as u64,
                                "Ack timed out"
                            );
                            resolve(AckOutcome::TimedOut);
                        }
                        // Lost the race to notify_ack (or clear).
                        None => {
                            let outcome = match rx.await {
                                Ok(()) => AckOutcome::Acked,
                                Err(_) => AckOutcome::TimedOut,
                            };
                            resolve(outcome);
                        }
                    }
                }
            }
        });
    }
}

impl std::fmt::Debug for AckTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AckTracker")
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Outcome of one expected ack. Resolves exactly once.
pub struct AckWaiter {
    ack: Ack,
    rx: oneshot::Receiver<AckOutcome>,
}

impl AckWaiter {
    pub fn ack(&self) -> &Ack {
        &self.ack
    }
}

impl Future for AckWaiter {
    type Output = AckOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(AckOutcome::TimedOut))
    }
}
