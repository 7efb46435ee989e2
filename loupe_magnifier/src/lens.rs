// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The lens element: a floating overlay with a magnified image inside.
//!
//! The lens is a `div.loupe-lens` appended to the body with an `img` child. Both
//! are [`NodeFlags::OVERLAY`] and never pickable, so the lens neither shows up in
//! selector queries nor steals hit tests from the image underneath it.
//!
//! The widget describes what the lens should look like with a [`LensPresentation`]
//! and [`Lens::apply`] writes it into the document.

use alloc::string::String;

use kurbo::{Point, Rect, Size, Vec2};
use loupe_dom::{Document, Element, ElementId, NodeFlags};

use crate::state::LensState;

/// Marker of the shared lens stylesheet. Inserted at most once per document.
pub const LENS_STYLESHEET_MARKER: &str = "loupe-lens-styles";

/// Class of the lens root element.
pub const LENS_CLASS: &str = "loupe-lens";

/// Attribute carrying the zoom-factor label, e.g. `2.5x`.
pub const ZOOM_LABEL_ATTRIBUTE: &str = "data-zoom-label";

const LENS_CSS: &str = "\
.loupe-lens{position:fixed;pointer-events:none;border-radius:50%;overflow:hidden;\
z-index:2147483647;transform:translate(-50%,-50%);transition:width .2s,height .2s}\
.loupe-lens img{position:absolute;max-width:none;display:none}\
.loupe-lens.loupe-zooming img,.loupe-lens.loupe-smart-zoom img{display:block}\
.loupe-lens.loupe-smart-zoom[data-zoom-label]::after{content:attr(data-zoom-label)}";

/// The magnified image drawn inside the lens.
#[derive(Clone, Debug, PartialEq)]
pub struct InnerImage {
    /// Source URL.
    pub src: String,
    /// Top-left relative to the lens' top-left.
    pub offset: Vec2,
    /// Drawn size.
    pub size: Size,
}

/// Everything the lens shows for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LensPresentation {
    /// Center of the lens in viewport coordinates.
    pub center: Point,
    /// Lens diameter.
    pub diameter: f64,
    /// State the lens is styled for.
    pub state: LensState,
    /// Whether the lens is shown.
    pub visible: bool,
    /// Zoom-factor label while zooming.
    pub zoom_label: Option<String>,
    /// Magnified image while zooming and the target box is measurable.
    pub inner: Option<InnerImage>,
}

impl LensPresentation {
    /// A hidden idle lens at `center`.
    pub fn hidden(center: Point, diameter: f64) -> Self {
        Self {
            center,
            diameter,
            state: LensState::Idle,
            visible: false,
            zoom_label: None,
            inner: None,
        }
    }

    /// Lens bounds in viewport coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, Size::new(self.diameter, self.diameter))
    }
}

/// Format a zoom factor for display.
///
/// ```
/// use loupe_magnifier::lens::zoom_label;
///
/// assert_eq!(zoom_label(2.5), "2.5x");
/// assert_eq!(zoom_label(3.0), "3x");
/// ```
pub fn zoom_label(factor: f64) -> String {
    alloc::format!("{factor}x")
}

/// Handles of the mounted lens elements.
#[derive(Clone, Debug, Default)]
pub struct Lens {
    root: Option<ElementId>,
    inner: Option<ElementId>,
}

impl Lens {
    /// Insert the stylesheet (once) and a hidden lens under the body.
    pub fn mount(doc: &mut Document) -> Self {
        if doc.insert_stylesheet(LENS_STYLESHEET_MARKER, LENS_CSS) {
            log::debug!("inserted lens stylesheet");
        }
        let body = doc.body();
        let root = doc.insert(
            Some(body),
            Element::new("div")
                .with_class(LENS_CLASS)
                .with_class(LensState::Idle.class_name())
                .with_flags(NodeFlags::OVERLAY),
        );
        let inner = doc.insert(
            Some(root),
            Element::new("img")
                .with_attr("alt", "")
                .with_flags(NodeFlags::OVERLAY),
        );
        Self {
            root: Some(root),
            inner: Some(inner),
        }
    }

    /// True until [`Lens::unmount`].
    pub fn is_mounted(&self) -> bool {
        self.root.is_some()
    }

    /// The lens root element.
    pub fn element(&self) -> Option<ElementId> {
        self.root
    }

    /// The inner image element.
    pub fn inner_element(&self) -> Option<ElementId> {
        self.inner
    }

    /// Write `p` into the document.
    pub fn apply(&self, doc: &mut Document, p: &LensPresentation) {
        let (Some(root), Some(inner)) = (self.root, self.inner) else {
            return;
        };
        let bounds = p.bounds();
        doc.set_bounds(root, bounds);
        doc.set_flags(root, overlay_flags(p.visible));
        let class = p.state.class_name();
        for name in LensState::CLASS_NAMES {
            if name != class {
                doc.remove_class(root, name);
            }
        }
        doc.add_class(root, class);
        match &p.zoom_label {
            Some(label) => doc.set_attribute(root, ZOOM_LABEL_ATTRIBUTE, label),
            None => doc.remove_attribute(root, ZOOM_LABEL_ATTRIBUTE),
        }

        match &p.inner {
            Some(image) => {
                let origin = bounds.origin() + image.offset;
                doc.set_bounds(inner, Rect::from_origin_size(origin, image.size));
                doc.set_attribute(inner, "src", &image.src);
                doc.set_flags(inner, overlay_flags(p.visible));
            }
            None => doc.set_flags(inner, NodeFlags::OVERLAY),
        }
    }

    /// Remove the lens from the document. Safe to call repeatedly.
    pub fn unmount(&mut self, doc: &mut Document) {
        self.inner = None;
        if let Some(root) = self.root.take() {
            doc.remove(root);
            log::debug!("lens unmounted");
        }
    }
}

fn overlay_flags(visible: bool) -> NodeFlags {
    if visible {
        NodeFlags::OVERLAY | NodeFlags::VISIBLE
    } else {
        NodeFlags::OVERLAY
    }
}
