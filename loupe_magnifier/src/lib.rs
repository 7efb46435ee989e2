// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=loupe_magnifier --heading-base-level=0

//! Loupe Magnifier: a headless, proximity-aware zoom lens.
//!
//! A circular lens follows the pointer with a damped spring. It grows as the
//! pointer approaches an eligible image, magnifies the image once the pointer is
//! over it, and switches to a stronger "smart zoom" after the pointer rests for a
//! while. High-resolution sources are warmed in the background as images are found.
//!
//! ## Shape
//!
//! The widget owns no clock, thread, or window. It operates on a
//! [`loupe_dom::Document`] and asks a [`Host`] for animation frames, timers and
//! image loads. The embedder forwards pointer motion, frames, timers, mutation
//! records and load results back into the [`Magnifier`].
//!
//! ## States
//!
//! | State | Lens | Zoom |
//! |-------|------|------|
//! | [`LensState::Idle`] | `idle_size` | none |
//! | [`LensState::Approaching`] | `approach_size` | none |
//! | [`LensState::Zooming`] | `zoom_size` | `zoom_factor` |
//! | [`LensState::SmartZoom`] | `zoom_size * smart_zoom_multiplier` | `zoom_factor + smart_zoom_bonus` |
//!
//! ## Gate
//!
//! [`Magnifier::new`] declines with [`Declined`] on touch-first devices, on narrow
//! viewports, and on invalid configuration. A declined magnifier touches nothing.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use loupe_dom::{Document, Element};
//! use loupe_magnifier::{Environment, LensState, Magnifier, MagnifierConfig, ManualHost};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let _img = doc.insert(
//!     Some(body),
//!     Element::new("img")
//!         .with_attr("data-zoom", "")
//!         .with_attr("src", "shoe.jpg")
//!         .with_bounds(Rect::new(100.0, 100.0, 400.0, 400.0)),
//! );
//!
//! let mut host = ManualHost::new();
//! let mut m = Magnifier::new(
//!     MagnifierConfig::default(),
//!     &Environment::desktop(1280.0),
//!     &mut doc,
//!     &mut host,
//! )
//! .unwrap();
//! assert_eq!(m.registry().len(), 1);
//!
//! m.pointer_move(&doc, &mut host, Point::new(250.0, 250.0), 0.0);
//! assert_eq!(m.state(), LensState::Zooming);
//!
//! // Rest on the image until the dwell timer fires.
//! for timer in host.advance(1500.0) {
//!     m.on_timer(timer);
//! }
//! assert_eq!(m.state(), LensState::SmartZoom);
//!
//! m.dispose(&mut doc, &mut host);
//! assert!(m.lens().element().is_none());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod gate;
mod host;
pub mod hover;
pub mod lens;
mod magnifier;
mod physics;
mod registry;
pub mod srcset;
mod state;
mod throttle;
pub mod zoom;

pub use config::{ConfigError, MagnifierConfig};
pub use gate::{Declined, Environment, InputCapabilities, check as check_environment};
pub use host::{FrameId, Host, ManualHost, TimerId};
pub use lens::{LENS_STYLESHEET_MARKER, LensPresentation};
pub use magnifier::Magnifier;
pub use physics::{Follower, REST_EPSILON};
pub use registry::{ImageKey, ImageLoadError, ImageRegistry, MutationOutcome, TrackedImage};
pub use state::{LensState, classify_distance};
pub use throttle::Throttle;
pub use zoom::{ZoomParams, ZoomTransform, compute_zoom};
