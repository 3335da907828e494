// src/fetch/context.rs
// =============================================================================
// FetchContext: a deadline plus a cancel button for one page fetch.
//
// Every page gets one context. Both places where a fetch can sit and wait
// (the rate limiter and the network request) watch it, so when the
// deadline passes or someone calls cancel(), whatever is waiting wakes up
// and gives up.
//
// Rust concepts:
// - CancellationToken (tokio-util): A cheap, cloneable "stop" signal
// - tokio::select!: Wait on several futures, take whichever finishes first
// =============================================================================

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

// Why a context stopped being usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    Cancelled,
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct FetchContext {
    started: Instant,
    deadline: Instant,
    token: CancellationToken,
}

impl FetchContext {
    // Creates a context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            started: Instant::now(),
            deadline,
            token: CancellationToken::new(),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    // Time left before the deadline (zero once it has passed)
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    // Cancels the context; clones share the same token, so they see it too
    pub fn cancel(&self) {
        self.token.cancel();
    }

    // Returns why the context is done, or None if it is still live
    pub fn done_reason(&self) -> Option<DoneReason> {
        if self.token.is_cancelled() {
            Some(DoneReason::Cancelled)
        } else if Instant::now() >= self.deadline {
            Some(DoneReason::DeadlineExceeded)
        } else {
            None
        }
    }

    // Resolves as soon as the context is cancelled or its deadline passes
    //
    // Cancellation is checked first, so a context that is both cancelled
    // and expired reports Cancelled.
    pub async fn done(&self) -> DoneReason {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => DoneReason::Cancelled,
            _ = time::sleep_until(self.deadline) => DoneReason::DeadlineExceeded,
        }
    }
}
