// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime seam: animation frames, one-shot timers, and image loading.
//!
//! ## Overview
//!
//! The magnifier never owns a clock or a thread. It asks the [`Host`] to schedule
//! callbacks and the host calls back into [`Magnifier`](crate::Magnifier):
//!
//! | Request | Delivered with |
//! |---------|----------------|
//! | [`Host::request_animation_frame`] | [`Magnifier::on_frame`](crate::Magnifier::on_frame) |
//! | [`Host::set_timeout`] | [`Magnifier::on_timer`](crate::Magnifier::on_timer) |
//! | [`Host::load_image`] | [`Magnifier::on_image_loaded`](crate::Magnifier::on_image_loaded) |
//!
//! Everything runs on one cooperative thread: a callback runs to completion before
//! the next one starts, so no locking is involved.
//!
//! [`ManualHost`] is a deterministic implementation with a virtual clock, used by
//! tests, demos, and benches.

use alloc::string::String;
use alloc::vec::Vec;

use crate::registry::ImageKey;

/// Handle of a requested animation frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameId(pub u64);

/// Handle of a one-shot timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TimerId(pub u64);

/// Scheduling and loading services provided by the embedding runtime.
pub trait Host {
    /// Schedule a single call to [`Magnifier::on_frame`](crate::Magnifier::on_frame)
    /// before the next repaint.
    fn request_animation_frame(&mut self) -> FrameId;

    /// Cancel a frame request. Unknown or already-delivered ids are ignored.
    fn cancel_animation_frame(&mut self, id: FrameId);

    /// Schedule a single call to [`Magnifier::on_timer`](crate::Magnifier::on_timer)
    /// after `delay_ms` milliseconds.
    fn set_timeout(&mut self, delay_ms: f64) -> TimerId;

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn clear_timeout(&mut self, id: TimerId);

    /// Start loading `url` in the background. The result, if it ever arrives, is
    /// delivered through [`Magnifier::on_image_loaded`](crate::Magnifier::on_image_loaded).
    fn load_image(&mut self, image: ImageKey, url: &str);
}

/// A deterministic [`Host`] driven by hand.
///
/// Frame requests and image loads are queued until taken; timers fire when the
/// virtual clock is advanced past their deadline.
///
/// ```
/// use loupe_magnifier::{Host, ManualHost};
///
/// let mut host = ManualHost::new();
/// let t = host.set_timeout(100.0);
/// assert!(host.advance(99.0).is_empty());
/// assert_eq!(host.advance(1.0), vec![t]);
/// assert_eq!(host.now(), 100.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualHost {
    now: f64,
    next_id: u64,
    frames: Vec<FrameId>,
    timers: Vec<(TimerId, f64)>,
    loads: Vec<(ImageKey, String)>,
}

impl ManualHost {
    /// Create a host with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Outstanding frame requests, oldest first.
    pub fn pending_frames(&self) -> &[FrameId] {
        &self.frames
    }

    /// Remove and return the oldest outstanding frame request.
    pub fn take_frame(&mut self) -> Option<FrameId> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    /// Number of timers that have not fired or been cleared.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Move the clock forward by `ms` and return the timers that came due, in
    /// deadline order. Returned timers are consumed.
    pub fn advance(&mut self, ms: f64) -> Vec<TimerId> {
        self.now += ms;
        let now = self.now;
        let mut due: Vec<(TimerId, f64)> = Vec::new();
        self.timers.retain(|&(id, deadline)| {
            if deadline <= now {
                due.push((id, deadline));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.1.total_cmp(&b.1));
        due.into_iter().map(|(id, _)| id).collect()
    }

    /// Remove and return every queued image load.
    pub fn take_loads(&mut self) -> Vec<(ImageKey, String)> {
        core::mem::take(&mut self.loads)
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for ManualHost {
    fn request_animation_frame(&mut self) -> FrameId {
        let id = FrameId(self.next());
        self.frames.push(id);
        id
    }

    fn cancel_animation_frame(&mut self, id: FrameId) {
        self.frames.retain(|f| *f != id);
    }

    fn set_timeout(&mut self, delay_ms: f64) -> TimerId {
        let id = TimerId(self.next());
        self.timers.push((id, self.now + delay_ms.max(0.0)));
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.retain(|(t, _)| *t != id);
    }

    fn load_image(&mut self, image: ImageKey, url: &str) {
        self.loads.push((image, url.into()));
    }
}
