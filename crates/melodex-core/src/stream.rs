// ── Controller state stream ──
//
// Subscription handle over one controller's state channel.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::ControllerState;

/// A subscription to one controller's state.
///
/// Offers the snapshot taken at subscription time, the latest state, and
/// change notification via [`changed`](Self::changed) or as a `Stream`.
pub struct StateStream {
    current: ControllerState,
    receiver: watch::Receiver<ControllerState>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<ControllerState>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// State captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &ControllerState {
        &self.current
    }

    pub fn latest(&self) -> ControllerState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<ControllerState> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = state.clone();
        Some(state)
    }

    /// Convert into a `Stream` yielding the current state, then every change.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by the controller's `watch::Receiver`.
pub struct StateWatchStream {
    inner: WatchStream<ControllerState>,
}

impl Stream for StateWatchStream {
    type Item = ControllerState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
