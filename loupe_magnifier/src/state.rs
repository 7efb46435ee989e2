// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lens states and the transitions between them.
//!
//! ## States
//!
//! - [`LensState::Idle`]: no image nearby; the lens is a small cursor.
//! - [`LensState::Approaching`]: some image center is within the proximity distance.
//! - [`LensState::Zooming`]: the pointer is over an image; the lens magnifies it.
//! - [`LensState::SmartZoom`]: the pointer has rested on the image for the dwell period.
//!
//! The two zoom states always carry their target image; the other two never do.
//! Proximity only moves between `Idle` and `Approaching` and is ignored while zooming.
//!
//! ## Dwell
//!
//! Entering an image anchors the pointer and arms a one-shot timer. A move of at
//! least the jitter threshold on either axis re-anchors and re-arms it (leaving
//! smart zoom if it was active). When the timer fires while still zooming, the
//! state becomes `SmartZoom`. At most one dwell timer is outstanding.

use kurbo::Point;

use crate::host::{Host, TimerId};
use crate::registry::ImageKey;

/// Externally visible lens state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LensState {
    /// Nothing nearby.
    #[default]
    Idle,
    /// Close to an image.
    Approaching,
    /// Over an image.
    Zooming,
    /// Over an image after the dwell period.
    SmartZoom,
}

impl LensState {
    /// CSS class applied to the lens in this state.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Idle => "loupe-idle",
            Self::Approaching => "loupe-approaching",
            Self::Zooming => "loupe-zooming",
            Self::SmartZoom => "loupe-smart-zoom",
        }
    }

    /// All class names, for clearing a previous state.
    pub const CLASS_NAMES: [&'static str; 4] = [
        "loupe-idle",
        "loupe-approaching",
        "loupe-zooming",
        "loupe-smart-zoom",
    ];

    /// True for `Zooming` and `SmartZoom`.
    pub fn is_zoomed(self) -> bool {
        matches!(self, Self::Zooming | Self::SmartZoom)
    }
}

/// Classify the smallest pointer-to-image distance.
///
/// Distances within `threshold` (inclusive) are `Approaching`; everything else,
/// including an infinite distance (no measurable images), is `Idle`.
///
/// ```
/// use loupe_magnifier::{LensState, classify_distance};
///
/// assert_eq!(classify_distance(140.0, 150.0), LensState::Approaching);
/// assert_eq!(classify_distance(160.0, 150.0), LensState::Idle);
/// assert_eq!(classify_distance(f64::INFINITY, 150.0), LensState::Idle);
/// ```
pub fn classify_distance(min_distance: f64, threshold: f64) -> LensState {
    if min_distance.is_finite() && min_distance <= threshold {
        LensState::Approaching
    } else {
        LensState::Idle
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Idle,
    Approaching,
    Zooming(ImageKey),
    SmartZoom(ImageKey),
}

impl Mode {
    fn state(self) -> LensState {
        match self {
            Self::Idle => LensState::Idle,
            Self::Approaching => LensState::Approaching,
            Self::Zooming(_) => LensState::Zooming,
            Self::SmartZoom(_) => LensState::SmartZoom,
        }
    }

    fn target(self) -> Option<ImageKey> {
        match self {
            Self::Zooming(k) | Self::SmartZoom(k) => Some(k),
            Self::Idle | Self::Approaching => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct Dwell {
    timer: Option<TimerId>,
    anchor: Point,
}

/// Mode plus dwell bookkeeping.
#[derive(Clone, Debug)]
pub(crate) struct StateMachine {
    mode: Mode,
    dwell: Dwell,
    dwell_delay_ms: f64,
    jitter: f64,
}

impl StateMachine {
    pub(crate) fn new(dwell_delay_ms: f64, jitter: f64) -> Self {
        Self {
            mode: Mode::Idle,
            dwell: Dwell::default(),
            dwell_delay_ms,
            jitter,
        }
    }

    pub(crate) fn state(&self) -> LensState {
        self.mode.state()
    }

    pub(crate) fn active_target(&self) -> Option<ImageKey> {
        self.mode.target()
    }

    pub(crate) fn dwell_timer(&self) -> Option<TimerId> {
        self.dwell.timer
    }

    /// The pointer entered `target`: zoom it unconditionally and start dwelling.
    pub(crate) fn enter(&mut self, host: &mut impl Host, target: ImageKey, pointer: Point) {
        self.set_mode(Mode::Zooming(target));
        self.arm(host, pointer);
    }

    /// The pointer left `target`. Returns `true` if it was the active target.
    pub(crate) fn leave(&mut self, host: &mut impl Host, target: ImageKey) -> bool {
        if self.mode.target() != Some(target) {
            return false;
        }
        self.cancel(host);
        self.set_mode(Mode::Idle);
        true
    }

    /// Track pointer motion for dwell purposes.
    pub(crate) fn pointer_moved(&mut self, host: &mut impl Host, pointer: Point) {
        let Some(target) = self.mode.target() else {
            return;
        };
        let d = pointer - self.dwell.anchor;
        if d.x.abs() < self.jitter && d.y.abs() < self.jitter {
            return;
        }
        if matches!(self.mode, Mode::SmartZoom(_)) {
            self.set_mode(Mode::Zooming(target));
        }
        self.arm(host, pointer);
    }

    /// A timer fired. Returns `true` if it was the dwell timer and smart zoom engaged.
    pub(crate) fn timer_fired(&mut self, id: TimerId) -> bool {
        if self.dwell.timer != Some(id) {
            log::trace!("ignoring stale timer {id:?}");
            return false;
        }
        self.dwell.timer = None;
        match self.mode {
            Mode::Zooming(target) => {
                self.set_mode(Mode::SmartZoom(target));
                true
            }
            _ => false,
        }
    }

    /// Apply a proximity classification. Ignored while an image is targeted.
    pub(crate) fn apply_proximity(&mut self, next: LensState) {
        if self.mode.target().is_some() {
            return;
        }
        match next {
            LensState::Approaching => self.set_mode(Mode::Approaching),
            _ => self.set_mode(Mode::Idle),
        }
    }

    /// Return to `Idle` and cancel any dwell.
    pub(crate) fn reset(&mut self, host: &mut impl Host) {
        self.cancel(host);
        self.set_mode(Mode::Idle);
    }

    fn arm(&mut self, host: &mut impl Host, pointer: Point) {
        self.cancel(host);
        self.dwell.anchor = pointer;
        self.dwell.timer = Some(host.set_timeout(self.dwell_delay_ms));
    }

    fn cancel(&mut self, host: &mut impl Host) {
        if let Some(id) = self.dwell.timer.take() {
            host.clear_timeout(id);
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            log::debug!("lens {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ManualHost;
    use crate::registry::ImageRegistry;
    use kurbo::Rect;
    use loupe_dom::{Document, Element, SelectorSet};

    fn some_key() -> ImageKey {
        let mut doc = Document::new();
        let body = doc.body();
        let _ = doc.insert(
            Some(body),
            Element::new("img")
                .with_attr("src", "a.jpg")
                .with_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)),
        );
        let mut reg = ImageRegistry::new(SelectorSet::parse(&["img"]).unwrap(), None);
        reg.scan(&doc, body, &mut ManualHost::new())[0]
    }

    fn machine() -> StateMachine {
        StateMachine::new(1500.0, 5.0)
    }

    fn assert_invariant(m: &StateMachine) {
        assert_eq!(m.active_target().is_some(), m.state().is_zoomed());
    }

    #[test]
    fn classification_is_monotonic() {
        let mut last = LensState::Approaching;
        for d in (0..400).map(f64::from) {
            let s = classify_distance(d, 150.0);
            if last == LensState::Idle {
                assert_eq!(s, LensState::Idle, "{d} flipped back to approaching");
            }
            last = s;
        }
        assert_eq!(classify_distance(150.0, 150.0), LensState::Approaching);
        assert_eq!(classify_distance(f64::NAN, 150.0), LensState::Idle);
    }

    #[test]
    fn enter_zooms_from_any_state() {
        let key = some_key();
        let mut host = ManualHost::new();
        for start in [LensState::Idle, LensState::Approaching] {
            let mut m = machine();
            m.apply_proximity(start);
            m.enter(&mut host, key, Point::new(5.0, 5.0));
            assert_eq!(m.state(), LensState::Zooming);
            assert_eq!(m.active_target(), Some(key));
            assert_invariant(&m);
        }
    }

    #[test]
    fn proximity_is_ignored_while_zooming() {
        let key = some_key();
        let mut host = ManualHost::new();
        let mut m = machine();
        m.enter(&mut host, key, Point::ZERO);
        m.apply_proximity(LensState::Idle);
        assert_eq!(m.state(), LensState::Zooming);
        assert_invariant(&m);
    }

    #[test]
    fn dwell_fires_exactly_once() {
        let key = some_key();
        let mut host = ManualHost::new();
        let mut m = machine();
        m.enter(&mut host, key, Point::new(50.0, 50.0));
        assert!(host.advance(1499.0).is_empty());
        let due = host.advance(1.0);
        assert_eq!(due.len(), 1);
        assert!(m.timer_fired(due[0]));
        assert_eq!(m.state(), LensState::SmartZoom);
        assert!(!m.timer_fired(due[0]));
        assert!(host.advance(10_000.0).is_empty());
        assert_invariant(&m);
    }

    #[test]
    fn jitter_below_threshold_keeps_the_timer() {
        let key = some_key();
        let mut host = ManualHost::new();
        let mut m = machine();
        m.enter(&mut host, key, Point::new(50.0, 50.0));
        let armed = m.dwell_timer();
        m.pointer_moved(&mut host, Point::new(54.9, 45.1));
        assert_eq!(m.dwell_timer(), armed);
        assert_eq!(host.pending_timers(), 1);
    }

    #[test]
    fn large_move_rearms_and_leaves_smart_zoom() {
        let key = some_key();
        let mut host = ManualHost::new();
        let mut m = machine();
        m.enter(&mut host, key, Point::new(50.0, 50.0));
        let first = m.dwell_timer();
        let due = host.advance(1500.0);
        assert!(m.timer_fired(due[0]));
        assert_eq!(m.state(), LensState::SmartZoom);

        m.pointer_moved(&mut host, Point::new(50.0, 55.0));
        assert_eq!(m.state(), LensState::Zooming);
        assert_ne!(m.dwell_timer(), first);
        assert_eq!(host.pending_timers(), 1);
        assert_invariant(&m);
    }

    #[test]
    fn move_before_deadline_cancels_the_pending_timer() {
        let key = some_key();
        let mut host = ManualHost::new();
        let mut m = machine();
        m.enter(&mut host, key, Point::new(50.0, 50.0));
        assert!(host.advance(1000.0).is_empty());
        m.pointer_moved(&mut host, Point::new(60.0, 50.0));
        // The original deadline passes without a smart zoom.
        assert!(host.advance(500.0).is_empty());
        assert_eq!(m.state(), LensState::Zooming);
        let due = host.advance(1000.0);
        assert_eq!(due.len(), 1);
        assert!(m.timer_fired(due[0]));
    }

    #[test]
    fn leaving_the_active_target_cancels_dwell() {
        let key = some_key();
        let mut host = ManualHost::new();
        let mut m = machine();
        m.enter(&mut host, key, Point::ZERO);
        assert!(m.leave(&mut host, key));
        assert!(!m.leave(&mut host, key));
        assert_eq!(m.state(), LensState::Idle);
        assert_eq!(host.pending_timers(), 0);
        assert_invariant(&m);
    }

    #[test]
    fn reset_clears_everything() {
        let key = some_key();
        let mut host = ManualHost::new();
        let mut m = machine();
        m.enter(&mut host, key, Point::ZERO);
        m.reset(&mut host);
        assert_eq!(m.state(), LensState::Idle);
        assert_eq!(m.dwell_timer(), None);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn class_names_are_distinct() {
        let states = [
            LensState::Idle,
            LensState::Approaching,
            LensState::Zooming,
            LensState::SmartZoom,
        ];
        for (s, name) in states.iter().zip(LensState::CLASS_NAMES) {
            assert_eq!(s.class_name(), name);
        }
    }
}
