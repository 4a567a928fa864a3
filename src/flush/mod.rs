//! Debounced, serialized flush scheduling.
//!
//! A single spawned task owns the debounce timer and executes flush
//! bodies one at a time. Requests that arrive while a flush is in
//! flight queue on the channel and collapse into one trailing debounced
//! flush once the running body resolves, so bursts never fan out into
//! per-request flushes. The loop holds only a weak reference to its
//! target and exits when the target is dropped.

pub mod debounce;

pub use debounce::DebounceState;

use async_trait::async_trait;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// The flush body executed by the scheduler. Guard conditions (enabled,
/// session expiry, minimum duration) live inside the implementation.
#[async_trait]
pub trait FlushTarget: Send + Sync + 'static {
    /// Run one flush. `force` bypasses the enabled check; used during
    /// shutdown.
    async fn run_flush(&self, force: bool);
}

enum FlushMsg {
    Request,
    Immediate {
        force: bool,
        ack: oneshot::Sender<()>,
    },
    Cancel,
}

/// Cloneable handle to the flush loop.
#[derive(Clone)]
pub struct FlushHandle {
    tx: mpsc::UnboundedSender<FlushMsg>,
}

impl FlushHandle {
    /// Arm (or re-arm) the debounce timer.
    pub fn request_flush(&self) {
        let _ = self.tx.send(FlushMsg::Request);
    }

    /// Run the flush body now, resolving once that run completes. Any
    /// pending debounced request is folded into this run.
    pub async fn flush_immediate(&self, force: bool) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .tx
            .send(FlushMsg::Immediate {
                force,
                ack: ack_tx,
            })
            .is_err()
        {
            return;
        }
        // A dropped ack means the loop shut down mid-request; there is
        // nothing left to wait for.
        let _ = ack_rx.await;
    }

    /// Clear a pending debounced flush without running it. An in-flight
    /// flush is unaffected.
    pub fn cancel(&self) {
        let _ = self.tx.send(FlushMsg::Cancel);
    }
}

/// Spawn the flush loop for `target`.
pub fn spawn_flush_loop<T: FlushTarget>(
    target: Weak<T>,
    min_delay: Duration,
    max_delay: Duration,
) -> FlushHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(flush_loop(target, rx, min_delay, max_delay));
    FlushHandle { tx }
}

async fn flush_loop<T: FlushTarget>(
    target: Weak<T>,
    mut rx: mpsc::UnboundedReceiver<FlushMsg>,
    min_delay: Duration,
    max_delay: Duration,
) {
    let mut state = DebounceState::default();

    loop {
        let msg = match state.deadline(min_delay, max_delay) {
            Some(deadline) => tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => Some(msg),
                    None => return,
                },
                () = tokio::time::sleep_until(deadline) => None,
            },
            None => match rx.recv().await {
                Some(msg) => Some(msg),
                None => return,
            },
        };

        let mut force = false;
        let mut ack = None;
        let fire = match msg {
            // Debounce timer elapsed.
            None => true,
            Some(FlushMsg::Request) => {
                state.note_request(Instant::now());
                false
            }
            Some(FlushMsg::Cancel) => {
                state.reset();
                false
            }
            Some(FlushMsg::Immediate {
                force: forced,
                ack: ack_tx,
            }) => {
                force = forced;
                ack = Some(ack_tx);
                true
            }
        };

        if !fire {
            continue;
        }

        state.reset();
        let Some(target) = target.upgrade() else {
            return;
        };
        target.run_flush(force).await;
        drop(target);
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }
}
