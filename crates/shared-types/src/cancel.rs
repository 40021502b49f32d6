//! # Cancellation
//!
//! A caller-held handle that aborts a coordinator wait, optionally combined
//! with a deadline. Cancellation only reaches the wait it is passed to.

use std::fmt;
use std::future::pending;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a wait ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The handle was triggered.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "cancelled by caller"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Triggering side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel every token cloned from this pair.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observing side, passed into the call that should be cancellable.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Create a linked handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx },
        CancelToken {
            rx: Some(rx),
            deadline: None,
        },
    )
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        Self {
            rx: None,
            deadline: None,
        }
    }

    /// Add a deadline; the earlier of any existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Whether the handle has already been triggered.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolve once the handle fires or the deadline passes.
    ///
    /// A dropped handle means cancellation can no longer happen, so only the
    /// deadline remains.
    pub async fn cancelled(&self) -> CancelReason {
        let deadline = self.deadline;
        let mut rx = self.rx.clone();

        let signal = async move {
            match rx.as_mut() {
                Some(rx) => loop {
                    if *rx.borrow_and_update() {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        pending::<()>().await;
                    }
                },
                None => pending::<()>().await,
            }
        };

        match deadline {
            Some(deadline) => tokio::select! {
                _ = signal => CancelReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                signal.await;
                CancelReason::Cancelled
            }
        }
    }
}
