// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document: element identifiers, flags, and element data.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;

/// Identifier for an element in the [`Document`](crate::Document).
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ElementId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `ElementId`.
///
/// ### Liveness
///
/// Use [`Document::is_alive`](crate::Document::is_alive) to check whether an `ElementId` still
/// refers to a live element. Stale ids never alias a different live element because the
/// generation must match.
///
/// Ordering is by slot, then generation. It is only meaningful as a map key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Element flags controlling visibility, picking, and layout participation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Element is rendered.
        const VISIBLE  = 0b0000_0001;
        /// Element receives pointer input (participates in hit testing).
        const PICKABLE = 0b0000_0010;
        /// Element floats above the page and is never part of layout flow.
        ///
        /// Selector queries skip overlay subtrees.
        const OVERLAY  = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// Element data: tag, classes, attributes, and viewport geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    /// Lowercase tag name, e.g. `img` or `div`.
    pub tag: String,
    /// Class list in insertion order.
    pub classes: Vec<String>,
    /// Attributes such as `src`, `srcset`, or `data-*`.
    pub attributes: BTreeMap<String, String>,
    /// Bounding box in viewport (client) coordinates.
    pub bounds: Rect,
    /// Stacking order. Higher is on top.
    pub z_index: i32,
    /// Visibility, picking, and overlay flags.
    pub flags: NodeFlags,
}

impl Element {
    /// Create an element with the given tag and default flags.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Add a class.
    pub fn with_class(mut self, class: &str) -> Self {
        if !self.has_class(class) {
            self.classes.push(class.into());
        }
        self
    }

    /// Set an attribute.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the viewport bounds.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the stacking order.
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Replace the flags.
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// True if the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Attribute value, if set.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Result of a hit test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    /// The matched element.
    pub element: ElementId,
    /// Path from the body to the element (inclusive).
    pub path: Vec<ElementId>,
}

/// Handle of a mutation observer installed with
/// [`Document::observe`](crate::Document::observe).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// A batch of structural changes seen by one observer.
///
/// Produced by [`Document::take_mutations`](crate::Document::take_mutations).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    /// Observer the record belongs to.
    pub observer: ObserverId,
    /// Roots of subtrees attached since the last batch.
    ///
    /// Descendants attached together with an ancestor are not listed separately.
    pub added: Vec<ElementId>,
    /// Roots of subtrees removed since the last batch.
    pub removed: Vec<ElementId>,
}

impl MutationRecord {
    /// True if nothing was added or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
