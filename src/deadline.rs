//! Caller-supplied deadline propagated to every external call.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};

use crate::error::FixtureError;

/// Optional point in time after which pending external calls are abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never expires.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    #[must_use]
    pub fn after(duration: Duration) -> Self {
        Self(Instant::now().checked_add(duration))
    }

    #[must_use]
    pub const fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// The earlier of the two deadlines.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Self(Some(a.min(b))),
            (a, b) => Self(a.or(b)),
        }
    }

    /// Await `fut`, failing with [`FixtureError::DeadlineExceeded`] if the
    /// deadline elapses first. `stage` describes the call for the error.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::DeadlineExceeded`] on expiry.
    pub async fn run<F: Future>(
        self,
        stage: impl FnOnce() -> String,
        fut: F,
    ) -> Result<F::Output, FixtureError> {
        match self.0 {
            None => Ok(fut.await),
            Some(at) => timeout_at(at, fut)
                .await
                .map_err(|_| FixtureError::DeadlineExceeded { stage: stage() }),
        }
    }
}
