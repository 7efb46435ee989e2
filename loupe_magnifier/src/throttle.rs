// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leading-edge throttle with a deferred trailing run.

/// Rate limiter for a repeated check.
///
/// A request runs immediately when at least `interval_ms` has passed since the
/// last run. Otherwise it is remembered, and [`Throttle::poll_trailing`] reports
/// it once the interval has elapsed, so the final request in a burst is never lost.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Throttle {
    interval_ms: f64,
    last_run: Option<f64>,
    trailing: bool,
}

impl Throttle {
    /// Create a throttle that allows one run per `interval_ms`.
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_run: None,
            trailing: false,
        }
    }

    /// Request a run at `now_ms`. Returns `true` if the caller should run now.
    pub fn request(&mut self, now_ms: f64) -> bool {
        if self.ready(now_ms) {
            self.mark(now_ms);
            true
        } else {
            self.trailing = true;
            false
        }
    }

    /// Returns `true` if a deferred request is due at `now_ms`. Consumes it.
    pub fn poll_trailing(&mut self, now_ms: f64) -> bool {
        if self.trailing && self.ready(now_ms) {
            self.mark(now_ms);
            true
        } else {
            false
        }
    }

    /// Record an unthrottled run at `now_ms`, absorbing any deferred request.
    pub fn mark(&mut self, now_ms: f64) {
        self.last_run = Some(now_ms);
        self.trailing = false;
    }

    /// True if a deferred request is waiting.
    pub fn has_trailing(&self) -> bool {
        self.trailing
    }

    /// Drop any deferred request and forget the last run.
    pub fn reset(&mut self) {
        self.last_run = None;
        self.trailing = false;
    }

    fn ready(&self, now_ms: f64) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now_ms - last >= self.interval_ms,
        }
    }
}
