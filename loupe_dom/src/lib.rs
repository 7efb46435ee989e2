// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=loupe_dom --heading-base-level=0

//! Loupe DOM: a Kurbo-native document model for headless widgets.
//!
//! Loupe DOM is the stand-in for a browser document that headless widgets (like
//! `loupe_magnifier`) are written against.
//!
//! - Represents a hierarchy of elements with tags, classes, attributes, viewport bounds, z-order, and flags.
//! - Answers selector queries, bounding-box queries, and point hit tests.
//! - Records structural mutations per observer, so widgets can pick up content inserted after start-up.
//!
//! ## Not a layout engine
//!
//! This crate does not perform layout or styling.
//! The host computes where things are on screen and writes the resulting viewport boxes into the document.
//! Stylesheets are stored as opaque text keyed by a marker so that shared styling can be inserted exactly once.
//!
//! ## Identity
//!
//! Elements are addressed by [`ElementId`], a generational handle.
//! Removing an element frees its slot; a later insert reuses the slot with a higher generation,
//! so a stale id never aliases a new element.
//! Queries on stale or detached ids fail softly: [`Document::bounding_rect`] returns
//! [`DomError::Detached`], and everything else returns `None`, an empty list, or does nothing.
//!
//! ## API overview
//!
//! - [`Document`]: the arena, rooted at [`Document::body`].
//! - [`Element`]: per-element data, with builder helpers.
//! - [`NodeFlags`]: visibility, picking, and overlay controls.
//! - [`SelectorSet`]: parsed CSS-like selectors for [`Document::query_selector_all`].
//! - [`MutationRecord`]: what an observer saw between two [`Document::take_mutations`] calls.
//!
//! ### Minimal usage
//!
//! ```
//! use loupe_dom::{Document, Element, SelectorSet};
//! use kurbo::{Point, Rect};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let watcher = doc.observe(body);
//!
//! let gallery = doc.insert(Some(body), Element::new("div").with_class("gallery"));
//! let img = doc.insert(
//!     Some(gallery),
//!     Element::new("img")
//!         .with_attr("src", "shoe.jpg")
//!         .with_bounds(Rect::new(0.0, 0.0, 300.0, 300.0)),
//! );
//!
//! // The gallery and its image arrive as a single added subtree.
//! let records = doc.take_mutations();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].observer, watcher);
//! assert_eq!(records[0].added, vec![gallery]);
//!
//! // Search the added subtree, descendants included.
//! let images = SelectorSet::parse(&["img"]).unwrap();
//! assert_eq!(doc.query_selector_all(gallery, &images), vec![img]);
//!
//! // Hit-test and query geometry.
//! assert_eq!(doc.hit_test_point(Point::new(10.0, 10.0)).map(|h| h.element), Some(img));
//! doc.remove(img);
//! assert!(doc.bounding_rect(img).is_err());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod document;
mod error;
mod selector;
mod types;

pub use document::Document;
pub use error::DomError;
pub use selector::{Selector, SelectorSet};
pub use types::{Element, ElementId, Hit, MutationRecord, NodeFlags, ObserverId};
