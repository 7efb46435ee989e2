// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunables for the magnifier.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use loupe_dom::{DomError, SelectorSet};
use thiserror::Error;

/// Magnifier configuration.
///
/// All lengths are CSS pixels and all durations are milliseconds.
/// With the `serde` feature, missing fields deserialize to their defaults.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MagnifierConfig {
    /// Selectors identifying eligible images.
    pub selectors: Vec<String>,
    /// Attribute naming an explicit high-resolution source. Checked before `srcset`.
    pub high_res_attribute: Option<String>,
    /// Lens diameter while idle.
    pub idle_size: f64,
    /// Lens diameter while approaching an image.
    pub approach_size: f64,
    /// Lens diameter while zooming.
    pub zoom_size: f64,
    /// Multiplier applied to `zoom_size` in smart zoom. Affects the lens size only.
    pub smart_zoom_multiplier: f64,
    /// Zoom factor while zooming.
    pub zoom_factor: f64,
    /// Added to `zoom_factor` in smart zoom. Affects the zoom factor only.
    pub smart_zoom_bonus: f64,
    /// How long the pointer must rest before smart zoom engages.
    pub dwell_delay_ms: f64,
    /// Pointer-to-image-center distance that counts as approaching.
    pub proximity_distance: f64,
    /// Per-axis movement tolerated while dwelling.
    pub jitter_threshold: f64,
    /// Spring stiffness of the lens follower, in `(0, 1]`.
    pub stiffness: f64,
    /// Velocity damping of the lens follower, in `[0, 1)`.
    pub damping: f64,
    /// Minimum spacing between proximity scans.
    pub proximity_interval_ms: f64,
    /// Narrowest viewport the magnifier activates on.
    pub desktop_breakpoint: f64,
}

impl Default for MagnifierConfig {
    fn default() -> Self {
        Self {
            selectors: vec![
                "img[data-zoom]".into(),
                ".product-image img".into(),
                ".cms-image img".into(),
            ],
            high_res_attribute: Some("data-zoom-src".into()),
            idle_size: 24.0,
            approach_size: 48.0,
            zoom_size: 180.0,
            smart_zoom_multiplier: 1.5,
            zoom_factor: 2.5,
            smart_zoom_bonus: 1.0,
            dwell_delay_ms: 1500.0,
            proximity_distance: 150.0,
            jitter_threshold: 5.0,
            stiffness: 0.15,
            damping: 0.85,
            proximity_interval_ms: 16.0,
            desktop_breakpoint: 1024.0,
        }
    }
}

/// Problems found by [`MagnifierConfig::validate`].
#[derive(Error, Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// No selectors were configured.
    #[error("at least one image selector is required")]
    NoSelectors,

    /// A selector failed to parse.
    #[error(transparent)]
    Selector(#[from] DomError),

    /// A numeric field is NaN or infinite.
    #[error("`{field}` must be finite")]
    NotFinite {
        /// Field name.
        field: &'static str,
    },

    /// A numeric field is outside its allowed range.
    #[error("`{field}` = {value} is out of range: {expected}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f64,
        /// Human-readable description of the allowed range.
        expected: &'static str,
    },
}

impl MagnifierConfig {
    /// Check every field and parse the selectors.
    pub fn validate(&self) -> Result<SelectorSet, ConfigError> {
        if self.selectors.is_empty() {
            return Err(ConfigError::NoSelectors);
        }
        let selectors = SelectorSet::parse(&self.selectors)?;

        let positive = [
            ("idle_size", self.idle_size),
            ("approach_size", self.approach_size),
            ("zoom_size", self.zoom_size),
            ("smart_zoom_multiplier", self.smart_zoom_multiplier),
            ("zoom_factor", self.zoom_factor),
        ];
        let non_negative = [
            ("smart_zoom_bonus", self.smart_zoom_bonus),
            ("dwell_delay_ms", self.dwell_delay_ms),
            ("proximity_distance", self.proximity_distance),
            ("jitter_threshold", self.jitter_threshold),
            ("proximity_interval_ms", self.proximity_interval_ms),
            ("desktop_breakpoint", self.desktop_breakpoint),
        ];
        for &(field, value) in positive.iter().chain(&non_negative).chain(&[
            ("stiffness", self.stiffness),
            ("damping", self.damping),
        ]) {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "greater than zero",
                });
            }
        }
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "zero or greater",
                });
            }
        }
        if !(self.stiffness > 0.0 && self.stiffness <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "stiffness",
                value: self.stiffness,
                expected: "in (0, 1]",
            });
        }
        if !(0.0..1.0).contains(&self.damping) {
            return Err(ConfigError::OutOfRange {
                field: "damping",
                value: self.damping,
                expected: "in [0, 1)",
            });
        }
        Ok(selectors)
    }

    /// Lens diameter in smart zoom.
    pub fn smart_zoom_size(&self) -> f64 {
        self.zoom_size * self.smart_zoom_multiplier
    }

    /// Zoom factor in smart zoom.
    pub fn smart_zoom_factor(&self) -> f64 {
        self.zoom_factor + self.smart_zoom_bonus
    }
}
