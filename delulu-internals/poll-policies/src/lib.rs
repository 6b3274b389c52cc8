//! Delulu Poll Policies
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! delulu-internals/poll-policies
//! Bounded polling of an external service until it reports a terminal state,
//! with a fixed delay between attempts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a single poll attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// Terminal success, stop polling
    Ready(T),
    /// Not there yet, try again after the delay
    Pending,
}

/// Custom error for the polling loop
#[derive(Debug, Error)]
pub enum PollError<E> {
    #[error("still pending after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("attempt {attempt} failed: {error}")]
    Aborted { attempt: u32, error: E },
}

/// Suspends the poller between attempts.
///
/// Production code sleeps on the tokio timer, tests inject a
/// [`RecordingSleeper`] so that a 30 × 10s policy runs instantly.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested delay
#[derive(Clone, Debug, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        match self.slept.lock() {
            Ok(slept) => slept.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn total(&self) -> Duration {
        self.recorded().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        match self.slept.lock() {
            Ok(mut slept) => slept.push(duration),
            Err(poisoned) => poisoned.into_inner().push(duration),
        }
    }
}

/// Bounded polling policy: a fixed number of requests, a fixed delay apart.
///
/// `max_attempts` counts requests, so a policy of 30 attempts issues at most
/// 30 calls and sleeps at most 29 times.
///
/// ```ignore
/// let policy = PollPolicy::fixed(30, Duration::from_secs(10));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(30, Duration::from_secs(10))
    }
}

impl PollPolicy {
    /// At least one attempt is always made
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Upper bound on the time spent sleeping
    pub fn worst_case_wait(&self) -> Duration {
        self.delay.saturating_mul(self.max_attempts - 1)
    }

    /// Call `step` until it returns [`PollStep::Ready`], an error, or the
    /// attempt budget runs out. `step` receives the 1-based attempt number.
    ///
    /// Errors are terminal: the loop never retries after `step` fails.
    pub async fn poll_until<T, E, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut step: F,
    ) -> Result<T, PollError<E>>
    where
        F: FnMut(u32) -> Fut + Send,
        Fut: std::future::Future<Output = Result<PollStep<T>, E>> + Send,
    {
        for attempt in 1..=self.max_attempts {
            match step(attempt).await {
                Ok(PollStep::Ready(value)) => return Ok(value),
                Ok(PollStep::Pending) if attempt < self.max_attempts => {
                    sleeper.sleep(self.delay).await;
                }
                Ok(PollStep::Pending) => {}
                Err(error) => return Err(PollError::Aborted { attempt, error }),
            }
        }

        Err(PollError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
