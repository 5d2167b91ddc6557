//! Per-invocation cancellation context.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The token was cancelled explicitly.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

/// Deadline and cancellation signal carried by every client operation.
///
/// Clones share the same token; [`OpContext::child`] derives a token that is
/// cancelled with its parent but can be cancelled on its own.
///
/// ```rust
/// use std::time::Duration;
/// use surreal_link::OpContext;
///
/// let ctx = OpContext::with_timeout(Duration::from_secs(5));
/// assert!(!ctx.is_done());
/// ctx.cancel();
/// assert!(ctx.is_done());
/// ```
#[derive(Debug, Clone)]
pub struct OpContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl OpContext {
    /// A context with no deadline that only ends when cancelled.
    pub fn background() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    /// A context ending `timeout` from now. A timeout too large to
    /// represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    /// Wrap an existing token, e.g. one tied to process shutdown.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            deadline: None,
            token,
        }
    }

    /// Tighten the deadline. A later deadline than the current one is ignored.
    pub fn deadline_in(mut self, timeout: Duration) -> Self {
        let Some(candidate) = Instant::now().checked_add(timeout) else {
            return self;
        };
        self.deadline = Some(match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        });
        self
    }

    /// Derive a context for a single invocation.
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` without one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The interrupt that has already happened, if any.
    pub fn interrupted(&self) -> Option<Interrupt> {
        if self.token.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.interrupted().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Interrupt {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Interrupt::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Interrupt::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Interrupt::Cancelled
            }
        }
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::background()
    }
}
