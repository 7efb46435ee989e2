// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Zoom geometry: place a scaled copy of the image so the point under the
//! pointer sits at the lens center.

use kurbo::{Point, Rect, Size, Vec2};

/// Inputs for one zoom computation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomParams {
    /// Magnification relative to the rendered box.
    pub zoom_factor: f64,
    /// Half the lens diameter.
    pub lens_radius: f64,
}

/// Where to draw the magnified image inside the lens.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomTransform {
    /// Pointer position inside the image box, each axis clamped to `[0, 1]`.
    pub fraction: Vec2,
    /// Size of the magnified image.
    pub scaled: Size,
    /// Top-left of the magnified image relative to the lens' top-left.
    pub offset: Vec2,
}

/// Compute the zoom transform for `pointer` over `image_box`.
///
/// `offset = -(fraction * scaled) + lens_radius` on each axis. A degenerate box
/// (zero width or height) maps that axis to fraction `0`.
///
/// Geometry always derives from the rendered box. The natural size of a loaded
/// high-resolution source only decides which URL the lens shows; a larger
/// source is drawn at the same scaled size, just sharper.
///
/// ```
/// use kurbo::{Point, Rect, Size, Vec2};
/// use loupe_magnifier::zoom::{ZoomParams, compute_zoom};
///
/// let t = compute_zoom(
///     Rect::new(0.0, 0.0, 300.0, 300.0),
///     Point::new(150.0, 150.0),
///     ZoomParams { zoom_factor: 2.5, lens_radius: 90.0 },
/// );
/// assert_eq!(t.scaled, Size::new(750.0, 750.0));
/// assert_eq!(t.offset, Vec2::new(-375.0 + 90.0, -375.0 + 90.0));
/// ```
pub fn compute_zoom(image_box: Rect, pointer: Point, params: ZoomParams) -> ZoomTransform {
    let fraction = Vec2::new(
        axis_fraction(pointer.x - image_box.x0, image_box.width()),
        axis_fraction(pointer.y - image_box.y0, image_box.height()),
    );
    let scaled = image_box.size() * params.zoom_factor;
    let offset = Vec2::new(
        -(fraction.x * scaled.width) + params.lens_radius,
        -(fraction.y * scaled.height) + params.lens_radius,
    );
    ZoomTransform {
        fraction,
        scaled,
        offset,
    }
}

fn axis_fraction(delta: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        (delta / extent).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
