//! The switch → verify → retry protocol.
//!
//! There is no synchronous, verifiable OS call that switches spaces; every
//! mechanism is an indirect simulation.  So every switch follows the same
//! shape: act, let the system settle, re-query, and either stop, retry, or
//! give up after a bounded number of attempts.
//!
//! Only one switch may be in flight.  Each switch holds a [`SwitchToken`];
//! starting a newer switch invalidates every older token, and the older
//! loop abandons its remaining attempts at the next checkpoint (latest
//! request wins).

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of cancellable waits.
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Bounds and delays for one mechanism's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay between acting and re-querying state.
    pub settle: Duration,
    /// Extra delay before the next attempt after a failed verification.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, settle: Duration, retry_delay: Duration) -> Self {
        Self {
            attempts,
            settle,
            retry_delay,
        }
    }

    /// Same attempt count with no delays, for tests.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO, Duration::ZERO)
    }
}

/// How a retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryResult {
    /// The post-condition held after the given attempt (1-based).
    Verified { attempt: u32 },
    /// Every attempt ran and none verified.
    Exhausted,
    /// A newer switch superseded this one.
    Cancelled,
}

/// Hands out [`SwitchToken`]s from one shared generation counter.
#[derive(Debug, Clone, Default)]
pub struct SwitchTokens {
    generation: Arc<AtomicU64>,
}

impl SwitchTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new switch, invalidating every token handed out before.
    pub fn begin(&self) -> SwitchToken {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        SwitchToken {
            generation: Some(self.generation.clone()),
            mine,
        }
    }
}

/// Cancellation handle for one in-flight switch.
#[derive(Debug, Clone)]
pub struct SwitchToken {
    generation: Option<Arc<AtomicU64>>,
    mine: u64,
}

impl SwitchToken {
    /// A token that is never cancelled.
    pub fn detached() -> Self {
        Self {
            generation: None,
            mine: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.generation {
            Some(g) => g.load(Ordering::SeqCst) != self.mine,
            None => false,
        }
    }

    /// Sleep for `duration`, waking early if cancelled.  Returns `false` when
    /// the wait was cut short.
    pub fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }
}

/// Run `act` up to `policy.attempts` times, checking `verify` after each
/// attempt has settled.
///
/// `act` receives the 1-based attempt number and returns whether the action
/// could be issued at all; an action that could not be issued still consumes
/// its attempt but skips verification.
pub fn run_verified<A, V>(policy: &RetryPolicy, token: &SwitchToken, mut act: A, mut verify: V) -> RetryResult
where
    A: FnMut(u32) -> bool,
    V: FnMut() -> bool,
{
    for attempt in 1..=policy.attempts {
        if token.is_cancelled() {
            return RetryResult::Cancelled;
        }
        if act(attempt) {
            if !token.wait(policy.settle) {
                return RetryResult::Cancelled;
            }
            if verify() {
                debug!("verified after attempt {}", attempt);
                return RetryResult::Verified { attempt };
            }
        } else {
            debug!("attempt {} could not be issued", attempt);
        }
        if attempt < policy.attempts && !token.wait(policy.retry_delay) {
            return RetryResult::Cancelled;
        }
    }
    RetryResult::Exhausted
}
