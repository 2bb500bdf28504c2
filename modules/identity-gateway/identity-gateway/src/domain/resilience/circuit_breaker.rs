//! Consecutive-failure circuit breaker.
//!
//! `Closed` lets everything through and counts consecutive failures inside a
//! rolling window: a failure older than the window no longer counts. Reaching the threshold opens the circuit for the cooldown.
//! After the cooldown a bounded number of trial calls run in `HalfOpen`; their
//! outcome either closes the circuit or opens it again.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub window: Duration,
    pub cooldown: Duration,
    pub half_open_max_calls: u32,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
            half_open_max_calls: 1,
            success_threshold: 1,
        }
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Success,
    Failure,
    Ignored,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// Times of the current run of failures, oldest first
    recent_failures: VecDeque<Instant>,
    open_until: Option<Instant>,
    half_open_in_flight: u32,
    half_open_successes: u32,
}

impl Inner {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            recent_failures: VecDeque::new(),
            open_until: None,
            half_open_in_flight: 0,
            half_open_successes: 0,
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: CircuitBreakerSettings,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>, settings: CircuitBreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            inner: Mutex::new(Inner::closed()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An open circuit whose cooldown has elapsed still reports
    /// `Open` until the next call moves it to `HalfOpen`.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Ask to run one call sequence.
    ///
    /// # Errors
    /// Returns the remaining cooldown when the call must be rejected.
    pub fn try_acquire(&self) -> Result<Permit<'_>, Duration> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        if inner.state == CircuitState::Open {
            let open_until = inner.open_until.unwrap_or(now);
            if now < open_until {
                return Err(open_until.saturating_duration_since(now));
            }
            inner.state = CircuitState::HalfOpen;
            inner.open_until = None;
            inner.half_open_in_flight = 0;
            inner.half_open_successes = 0;
            tracing::info!(circuit = %self.name, "circuit half-open; allowing trial calls");
        }

        match inner.state {
            CircuitState::Closed => Ok(Permit::new(self, false)),
            CircuitState::HalfOpen if inner.half_open_in_flight < self.settings.half_open_max_calls => {
                inner.half_open_in_flight += 1;
                Ok(Permit::new(self, true))
            }
            CircuitState::HalfOpen | CircuitState::Open => Err(Duration::ZERO),
        }
    }

    fn record(&self, trial: bool, outcome: Outcome) {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        if trial {
            // Trial results only matter while still half-open
            if inner.state != CircuitState::HalfOpen {
                return;
            }
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
            match outcome {
                Outcome::Success => {
                    inner.half_open_successes += 1;
                    if inner.half_open_successes >= self.settings.success_threshold {
                        *inner = Inner::closed();
                        tracing::info!(circuit = %self.name, "circuit closed");
                    }
                }
                Outcome::Failure => self.trip(&mut inner, now),
                Outcome::Ignored => {}
            }
            return;
        }

        // Late results from calls admitted before the circuit opened are dropped
        if inner.state != CircuitState::Closed {
            return;
        }
        match outcome {
            Outcome::Success => inner.recent_failures.clear(),
            Outcome::Failure => {
                while inner
                    .recent_failures
                    .front()
                    .is_some_and(|&at| now.saturating_duration_since(at) > self.settings.window)
                {
                    inner.recent_failures.pop_front();
                }
                inner.recent_failures.push_back(now);
                let failures = u32::try_from(inner.recent_failures.len()).unwrap_or(u32::MAX);
                tracing::debug!(
                    circuit = %self.name,
                    failures,
                    threshold = self.settings.failure_threshold,
                    "recorded failure"
                );
                if failures >= self.settings.failure_threshold {
                    self.trip(&mut inner, now);
                }
            }
            Outcome::Ignored => {}
        }
    }

    fn trip(&self, inner: &mut Inner, now: Instant) {
        *inner = Inner::closed();
        inner.state = CircuitState::Open;
        inner.open_until = Some(now + self.settings.cooldown);
        tracing::warn!(
            circuit = %self.name,
            cooldown_ms = u64::try_from(self.settings.cooldown.as_millis()).unwrap_or(u64::MAX),
            "circuit opened"
        );
    }
}

/// Admission for one call sequence. Report the outcome exactly once;
/// dropping the permit unreported counts as neither success nor failure.
#[must_use = "the outcome of an admitted call must be reported"]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    /// Whether this permit is a half-open trial.
    #[must_use]
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.settle(Outcome::Success);
    }

    pub fn failure(mut self) {
        self.settle(Outcome::Failure);
    }

    pub fn ignore(mut self) {
        self.settle(Outcome::Ignored);
    }

    fn settle(&mut self, outcome: Outcome) {
        if !self.settled {
            self.settled = true;
            self.breaker.record(self.trial, outcome);
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.settle(Outcome::Ignored);
    }
}
