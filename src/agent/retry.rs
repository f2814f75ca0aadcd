//! Bounded retry around a single remote call
//!
//! A failing call runs at most `max_retries + 1` times. Verbose mode traces
//! every attempt; tracing never changes the outcome.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::core::{MedscribeError, Result, Task};

/// Exponential backoff bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first retry
    pub base: Duration,
    /// Cap for any single delay, before jitter
    pub max: Duration,
}

impl Backoff {
    /// Delay before retry number `retry` (1-based), without jitter
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Retry settings shared by every agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Trace each attempt
    pub verbose: bool,
    /// Per-call deadline; expiry counts as a failed attempt
    pub timeout: Option<Duration>,
    /// Sleep between attempts
    pub backoff: Option<Backoff>,
}

impl RetryPolicy {
    /// Policy with no timeout and no delay between attempts
    pub fn new(max_retries: u32, verbose: bool) -> Self {
        Self {
            max_retries,
            verbose,
            timeout: None,
            backoff: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff = Some(Backoff { base, max });
        self
    }

    /// Total number of calls a persistently failing operation gets
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, true)
    }
}

/// Runs an operation under a [`RetryPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `operation` until it succeeds or the policy is used up.
    ///
    /// Caller errors (unknown role, bad input) are returned at once. Any other
    /// failure is retried; after the last attempt it is wrapped in
    /// [`MedscribeError::RetriesExhausted`] with the final error as source.
    pub async fn execute<T, F, Fut>(&self, role: Task, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            if self.policy.verbose {
                info!(role = %role, attempt, max_attempts, "Calling model");
            }

            let error = match self.run_once(role, operation()).await {
                Ok(value) => {
                    if self.policy.verbose && attempt > 1 {
                        info!(role = %role, attempt, "Model call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_contract_violation() => return Err(e),
                Err(e) => e,
            };

            if self.policy.verbose {
                warn!(role = %role, attempt, max_attempts, error = %error, "Model call failed");
            }

            if attempt >= max_attempts {
                return Err(MedscribeError::RetriesExhausted {
                    role,
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            if let Some(delay) = self.next_delay(attempt) {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    async fn run_once<T, Fut>(&self, role: Task, call: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match self.policy.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| {
                    Err(MedscribeError::Timeout {
                        role,
                        secs: limit.as_secs(),
                    })
                }),
            None => call.await,
        }
    }

    /// Backoff delay after `attempt` failed, with up to 10% jitter
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        let backoff = self.policy.backoff?;
        let delay = backoff.delay_for(attempt);
        let jitter_ms = (delay.as_millis() / 10) as u64;
        let jitter = if jitter_ms > 0 {
            rand::rng().random_range(0..=jitter_ms)
        } else {
            0
        };
        Some(delay + Duration::from_millis(jitter))
    }
}
