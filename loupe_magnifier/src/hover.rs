// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover tracking: turn successive hit paths into enter/leave transitions.
//!
//! Each pointer move produces a hit path (outer → inner). The magnifier keeps only
//! the registered images along that path and hands them to [`HoverState::update_path`],
//! which reports what the pointer entered and left since the previous move.
//!
//! ```
//! use loupe_magnifier::hover::{HoverEvent, HoverState};
//!
//! let mut h: HoverState<u32> = HoverState::new();
//! assert_eq!(h.update_path(&[7]), vec![HoverEvent::Enter(7)]);
//! assert_eq!(h.update_path(&[9]), vec![HoverEvent::Leave(7), HoverEvent::Enter(9)]);
//! assert_eq!(h.clear(), vec![HoverEvent::Leave(9)]);
//! ```

use alloc::vec::Vec;

/// The currently hovered path.
///
/// Leaves are reported inner → outer, then enters outer → inner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoverState<K: Copy + Eq> {
    current: Vec<K>,
}

/// A hover transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoverEvent<K> {
    /// The pointer entered `K`.
    Enter(K),
    /// The pointer left `K`.
    Leave(K),
}

impl<K: Copy + Eq> HoverState<K> {
    /// Create an empty hover state.
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
        }
    }

    /// The hovered path, outer → inner.
    pub fn current_path(&self) -> &[K] {
        &self.current
    }

    /// Innermost hovered entry.
    pub fn innermost(&self) -> Option<K> {
        self.current.last().copied()
    }

    /// Forget the hovered path, returning a leave for every entry (inner → outer).
    pub fn clear(&mut self) -> Vec<HoverEvent<K>> {
        let out = self.current.iter().rev().map(|&k| HoverEvent::Leave(k)).collect();
        self.current.clear();
        out
    }

    /// Drop `k` from the hovered path without reporting a transition.
    ///
    /// Used when the entry stops existing rather than being left.
    pub fn forget(&mut self, k: K) -> bool {
        let before = self.current.len();
        self.current.retain(|&c| c != k);
        before != self.current.len()
    }

    /// Replace the hovered path and return the transitions from the old one.
    pub fn update_path(&mut self, new_path: &[K]) -> Vec<HoverEvent<K>> {
        let shared = self
            .current
            .iter()
            .zip(new_path)
            .take_while(|(a, b)| a == b)
            .count();

        let mut out = Vec::new();
        for &k in self.current[shared..].iter().rev() {
            out.push(HoverEvent::Leave(k));
        }
        for &k in &new_path[shared..] {
            out.push(HoverEvent::Enter(k));
        }

        self.current.clear();
        self.current.extend_from_slice(new_path);
        out
    }
}
