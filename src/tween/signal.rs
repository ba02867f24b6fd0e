//! Completion signals for finite animations.
//!
//! Every director operation with a finite duration hands back a
//! [`Completion`]. The producing side keeps a [`CompletionSource`] inside a
//! queued `Call` step; when the step is reached the source resolves the
//! signal. Dropping an unresolved source (queue replacement, registry
//! flush) cancels the handle, so a signal can never be left permanently
//! pending.
//!
//! The engine is single-threaded, so the shared state is a plain
//! `Rc<RefCell<..>>`. [`Completion`] also implements [`Future`] for hosts
//! that drive the wall from an async loop; polling never blocks the frame
//! tick.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::errors::WallError;

/// Observable state of a completion signal.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalState {
    /// The animation is still queued or in flight.
    Pending,
    /// The animation reached its natural finish.
    Resolved,
    /// The animation's channel was flushed before finishing.
    Cancelled,
    /// An external collaborator reported a failure.
    Failed(WallError),
}

#[derive(Debug)]
struct Shared {
    state: SignalState,
    waker: Option<Waker>,
}

impl Shared {
    fn settle(&mut self, state: SignalState) {
        if self.state == SignalState::Pending {
            self.state = state;
            if let Some(waker) = self.waker.take() {
                waker.wake();
            }
        }
    }
}

/// Producer half of a completion signal.
///
/// Owned by the `Call` step that terminates an animation's step queue.
/// If the step never fires because the channel was cancelled, dropping
/// the source settles the signal as [`SignalState::Cancelled`].
#[derive(Debug)]
pub struct CompletionSource(Rc<RefCell<Shared>>);

impl CompletionSource {
    /// Creates a connected producer/consumer pair.
    #[must_use]
    pub fn new() -> (Self, Completion) {
        let shared = Rc::new(RefCell::new(Shared {
            state: SignalState::Pending,
            waker: None,
        }));
        (Self(Rc::clone(&shared)), Completion(shared))
    }

    /// Settles the signal as finished normally.
    pub fn resolve(self) {
        self.0.borrow_mut().settle(SignalState::Resolved);
    }

    /// Settles the signal with a collaborator failure.
    ///
    /// The engine performs no corrective action; the error only surfaces
    /// through the consumer half.
    pub fn reject(self, error: WallError) {
        self.0.borrow_mut().settle(SignalState::Failed(error));
    }
}

impl Drop for CompletionSource {
    fn drop(&mut self) {
        self.0.borrow_mut().settle(SignalState::Cancelled);
    }
}

/// Consumer half of a completion signal.
#[derive(Debug, Clone)]
pub struct Completion(Rc<RefCell<Shared>>);

impl Completion {
    /// A signal that is already resolved (no-op operations).
    #[must_use]
    pub fn resolved() -> Self {
        let (source, completion) = CompletionSource::new();
        source.resolve();
        completion
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SignalState {
        self.0.borrow().state.clone()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == SignalState::Pending
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state() == SignalState::Resolved
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() == SignalState::Cancelled
    }
}

impl Future for Completion {
    type Output = crate::errors::Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.0.borrow_mut();
        match &shared.state {
            SignalState::Pending => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
            SignalState::Resolved => Poll::Ready(Ok(())),
            SignalState::Cancelled => Poll::Ready(Err(WallError::Cancelled)),
            SignalState::Failed(err) => Poll::Ready(Err(err.clone())),
        }
    }
}
