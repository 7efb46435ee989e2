// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damped spring that moves the lens toward the pointer.

use kurbo::{Point, Vec2};

/// Offsets and speeds below this many pixels count as settled.
pub const REST_EPSILON: f64 = 0.01;

/// Lens position and velocity, advanced once per frame.
///
/// Each [`step`](Follower::step) applies
/// `v += (target - p) * stiffness; v *= damping; p += v`.
/// With `stiffness` in `(0, 1]` and `damping` in `[0, 1)` the lens converges on a
/// fixed target without oscillating indefinitely.
///
/// ```
/// use kurbo::Point;
/// use loupe_magnifier::Follower;
///
/// let mut f = Follower::new(Point::ZERO, 0.15, 0.85);
/// for _ in 0..200 {
///     f.step(Point::new(100.0, 50.0));
/// }
/// assert!(f.is_at_rest());
/// assert_eq!(f.position(), Point::new(100.0, 50.0));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Follower {
    position: Point,
    velocity: Vec2,
    stiffness: f64,
    damping: f64,
    at_rest: bool,
}

impl Follower {
    /// Create a follower resting at `position`.
    pub fn new(position: Point, stiffness: f64, damping: f64) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            stiffness,
            damping,
            at_rest: true,
        }
    }

    /// Advance one frame toward `target`. Returns the new position.
    pub fn step(&mut self, target: Point) -> Point {
        let offset = target - self.position;
        self.velocity += offset * self.stiffness;
        self.velocity *= self.damping;
        self.position += self.velocity;

        let remaining = target - self.position;
        if remaining.hypot() < REST_EPSILON && self.velocity.hypot() < REST_EPSILON {
            self.position = target;
            self.velocity = Vec2::ZERO;
            self.at_rest = true;
        } else {
            self.at_rest = false;
        }
        self.position
    }

    /// Jump to `position` and stop.
    pub fn teleport(&mut self, position: Point) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.at_rest = true;
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Current velocity, in pixels per frame.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// True once the last step snapped onto its target.
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }
}
