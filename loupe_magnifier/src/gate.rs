// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability gate: decide once, at start-up, whether the magnifier runs at all.

use thiserror::Error;

use crate::config::{ConfigError, MagnifierConfig};

bitflags::bitflags! {
    /// Input capabilities of the device, as reported by the host.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct InputCapabilities: u8 {
        /// The primary pointer can hover (a mouse or trackpad).
        const HOVER         = 0b0000_0001;
        /// The primary pointer is precise.
        const FINE_POINTER  = 0b0000_0010;
        /// The primary input is touch.
        const TOUCH_PRIMARY = 0b0000_0100;
    }
}

impl Default for InputCapabilities {
    fn default() -> Self {
        Self::HOVER | Self::FINE_POINTER
    }
}

/// What the host knows about the device when the magnifier starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Environment {
    /// Input capabilities.
    pub capabilities: InputCapabilities,
    /// Viewport width in CSS pixels.
    pub viewport_width: f64,
}

impl Environment {
    /// A desktop environment with a mouse and the given viewport width.
    pub fn desktop(viewport_width: f64) -> Self {
        Self {
            capabilities: InputCapabilities::default(),
            viewport_width,
        }
    }
}

/// Reasons the magnifier declined to start.
///
/// None of these are failures from the page's point of view: the caller simply
/// leaves the page without a magnifier.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Declined {
    /// The primary input is touch, or cannot hover.
    #[error("primary input cannot hover")]
    TouchPrimary,

    /// The viewport is narrower than the desktop breakpoint.
    #[error("viewport {width}px is narrower than the {breakpoint}px breakpoint")]
    NarrowViewport {
        /// Viewport width.
        width: f64,
        /// Configured breakpoint.
        breakpoint: f64,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Check the environment against the configuration.
pub fn check(env: &Environment, config: &MagnifierConfig) -> Result<(), Declined> {
    let caps = env.capabilities;
    if caps.contains(InputCapabilities::TOUCH_PRIMARY) || !caps.contains(InputCapabilities::HOVER)
    {
        return Err(Declined::TouchPrimary);
    }
    if env.viewport_width < config.desktop_breakpoint {
        return Err(Declined::NarrowViewport {
            width: env.viewport_width,
            breakpoint: config.desktop_breakpoint,
        });
    }
    Ok(())
}
