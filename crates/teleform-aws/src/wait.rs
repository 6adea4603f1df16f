//! Waiting for eventually consistent remote state.
//!
//! A [`StateChange`] repeatedly calls a refresh function until the status it
//! reports lands in a set of target states. Statuses in the pending set keep
//! the wait going; anything else is a failure.
//!
//! ```ignore
//! let endpoint = StateChange::new(|| status_resolver_endpoint(api, &id))
//!     .pending(["CREATING"])
//!     .target(["OPERATIONAL"])
//!     .timeout(Duration::from_secs(600))
//!     .wait(&ctx.cancel)
//!     .await?;
//! ```
//!
//! An empty target set means "wait until the object is gone": a `NotFound`
//! poll then counts as reaching the target.
use std::{future::Future, time::Duration};

use rand::Rng;
use snafu::prelude::*;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;

pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;
pub const DEFAULT_JITTER: f64 = 0.1;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
/// Stands in for deadlines past what `Instant` can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// The result of one status refresh.
#[derive(Clone, Debug, PartialEq)]
pub enum Poll<T> {
    /// The object exists and is in `status`.
    Found { object: T, status: String },
    /// The object does not exist.
    NotFound,
}

impl<T> Poll<T> {
    pub fn found(object: T, status: impl Into<String>) -> Self {
        Poll::Found {
            object,
            status: status.into(),
        }
    }

    /// Builds a poll from the result of a `find_*` function.
    pub fn from_found(found: Option<T>, status: impl FnOnce(&T) -> String) -> Self {
        match found {
            Some(object) => {
                let status = status(&object);
                Poll::Found { object, status }
            }
            None => Poll::NotFound,
        }
    }

    /// The observed status label, empty when the object was not found.
    pub fn status(&self) -> &str {
        match self {
            Poll::Found { status, .. } => status,
            Poll::NotFound => "",
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!(": {reason}"),
        _ => String::new(),
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WaitError {
    #[snafu(display(
        "timeout while waiting for state to become '{}' (last state: '{}', timeout: {timeout:?}){}",
        expected.join(", "),
        last_state.as_deref().unwrap_or_default(),
        reason_suffix(reason)
    ))]
    Timeout {
        timeout: Duration,
        last_state: Option<String>,
        expected: Vec<String>,
        reason: Option<String>,
    },

    #[snafu(display(
        "unexpected state '{state}', wanted target '{}'{}",
        expected.join(", "),
        reason_suffix(reason)
    ))]
    UnexpectedState {
        state: String,
        expected: Vec<String>,
        reason: Option<String>,
    },

    #[snafu(display("couldn't find resource ({checks} retries)"))]
    NotFound { checks: u32 },

    #[snafu(display("wait cancelled"))]
    Cancelled,

    #[snafu(display("refreshing state: {source}"))]
    Refresh { source: ApiError },
}

type ReasonFn<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Waits for a remote object to reach a target state.
pub struct StateChange<F, T> {
    refresh: F,
    pending: Vec<String>,
    target: Vec<String>,
    timeout: Duration,
    delay: Duration,
    min_timeout: Duration,
    poll_interval: Option<Duration>,
    not_found_checks: u32,
    continuous_target_occurrence: u32,
    jitter: f64,
    reason: Option<ReasonFn<T>>,
}

impl<F, Fut, T> StateChange<F, T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>, ApiError>>,
{
    /// Creates a waiter with no pending or target states and a 5 minute
    /// timeout.
    pub fn new(refresh: F) -> Self {
        Self {
            refresh,
            pending: vec![],
            target: vec![],
            timeout: Duration::from_secs(300),
            delay: Duration::ZERO,
            min_timeout: Duration::ZERO,
            poll_interval: None,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurrence: 1,
            jitter: DEFAULT_JITTER,
            reason: None,
        }
    }

    pub fn pending<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = states.into_iter().map(Into::into).collect();
        self
    }

    /// States that end the wait successfully. Leave empty to wait for the
    /// object to disappear.
    pub fn target<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = states.into_iter().map(Into::into).collect();
        self
    }

    /// Waits for the object to disappear.
    pub fn target_gone(mut self) -> Self {
        self.target.clear();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Time to sleep before the first refresh. Counts against the timeout.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Lower bound for the backoff interval.
    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Fixed interval between refreshes, replacing the backoff.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Number of consecutive target observations required. `0` means `1`.
    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences;
        self
    }

    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Extracts a human readable reason (eg a vendor status message) from
    /// the last observed object, reported with failures.
    pub fn reason(mut self, f: impl Fn(&T) -> Option<String> + Send + Sync + 'static) -> Self {
        self.reason = Some(Box::new(f));
        self
    }

    fn timeout_error(&self, last_state: Option<String>, reason: Option<String>) -> WaitError {
        WaitError::Timeout {
            timeout: self.timeout,
            last_state,
            expected: self.target.clone(),
            reason,
        }
    }

    /// Computes the next sleep, advancing the backoff unless the target
    /// is being re-observed.
    fn next_interval(&self, backoff: &mut Duration, in_streak: bool) -> Duration {
        let base = match self.poll_interval {
            Some(interval) => interval,
            None => {
                let current = (*backoff).max(self.min_timeout);
                if !in_streak {
                    *backoff = (*backoff * 2).min(MAX_BACKOFF);
                }
                current
            }
        };
        jittered(base, self.jitter)
    }

    /// Runs the wait to completion.
    ///
    /// Returns the last observed object, or `None` when the target was the
    /// object's disappearance.
    pub async fn wait(mut self, cancel: &CancellationToken) -> Result<Option<T>, WaitError> {
        let start = Instant::now();
        let deadline = instant_after(start, self.timeout);
        let required = self.continuous_target_occurrence.max(1);
        log::debug!(
            "waiting for state to become {:?} (pending {:?}, timeout {:?})",
            self.target,
            self.pending,
            self.timeout
        );

        if !self.delay.is_zero() {
            log::trace!("waiting {:?} before the first refresh", self.delay);
            sleep_until(instant_after(start, self.delay).min(deadline), cancel).await?;
        }

        let mut backoff = INITIAL_BACKOFF;
        let mut streak = 0u32;
        let mut not_found = 0u32;
        let mut last_state: Option<String> = None;
        let mut last_reason: Option<String> = None;

        loop {
            let refreshed = tokio::select! {
                biased;
                _ = cancel.cancelled() => return CancelledSnafu.fail(),
                refreshed = tokio::time::timeout_at(deadline, (self.refresh)()) => refreshed,
            };
            let poll = match refreshed {
                Ok(result) => result.context(RefreshSnafu)?,
                Err(_elapsed) => return Err(self.timeout_error(last_state, last_reason)),
            };

            match poll {
                Poll::NotFound if self.target.is_empty() => {
                    streak += 1;
                    log::trace!("object is gone ({streak}/{required})");
                    if streak >= required {
                        return Ok(None);
                    }
                }
                Poll::NotFound => {
                    streak = 0;
                    not_found += 1;
                    log::trace!("object not found ({not_found}/{})", self.not_found_checks);
                    if not_found > self.not_found_checks {
                        return NotFoundSnafu {
                            checks: self.not_found_checks,
                        }
                        .fail();
                    }
                }
                Poll::Found { object, status } => {
                    not_found = 0;
                    last_reason = self.reason.as_ref().and_then(|f| f(&object));
                    if self.target.contains(&status) {
                        streak += 1;
                        log::trace!("reached '{status}' ({streak}/{required})");
                        if streak >= required {
                            return Ok(Some(object));
                        }
                    } else if self.pending.contains(&status) {
                        streak = 0;
                        log::trace!("still '{status}'");
                    } else {
                        return UnexpectedStateSnafu {
                            state: status,
                            expected: self.target.clone(),
                            reason: last_reason,
                        }
                        .fail();
                    }
                    last_state = Some(status);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.timeout_error(last_state, last_reason));
            }
            let interval = self.next_interval(&mut backoff, streak > 0);
            sleep_until(instant_after(now, interval).min(deadline), cancel).await?;
        }
    }
}

/// `start + duration`, saturating at a far future instant instead of
/// overflowing.
fn instant_after(start: Instant, duration: Duration) -> Instant {
    start
        .checked_add(duration)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

async fn sleep_until(until: Instant, cancel: &CancellationToken) -> Result<(), WaitError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => CancelledSnafu.fail(),
        _ = tokio::time::sleep_until(until) => Ok(()),
    }
}

/// Add jitter to a duration to prevent thundering herd.
fn jittered(base: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return base;
    }
    let factor = rand::thread_rng().gen_range(0.0..jitter);
    Duration::try_from_secs_f64(base.as_secs_f64() * (1.0 + factor)).unwrap_or(base)
}
