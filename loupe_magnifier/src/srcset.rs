// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Responsive image source sets: pick the largest candidate.

use alloc::vec::Vec;

/// A `srcset` descriptor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Descriptor {
    /// Intrinsic width in pixels (`480w`).
    Width(f64),
    /// Pixel density (`2x`). A candidate without a descriptor is `1x`.
    Density(f64),
}

/// One entry of a source set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate<'a> {
    /// Image URL.
    pub url: &'a str,
    /// Size descriptor.
    pub descriptor: Descriptor,
}

/// Parse a `srcset` attribute value.
///
/// Malformed entries (empty URLs, unparsable or non-positive descriptors) are skipped.
pub fn parse(srcset: &str) -> Vec<Candidate<'_>> {
    let mut out = Vec::new();
    for entry in srcset.split(',') {
        let mut parts = entry.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let descriptor = match parts.next() {
            None => Some(Descriptor::Density(1.0)),
            Some(token) => parse_descriptor(token),
        };
        if let Some(descriptor) = descriptor {
            out.push(Candidate { url, descriptor });
        }
    }
    out
}

fn parse_descriptor(token: &str) -> Option<Descriptor> {
    let kind = token.chars().last()?;
    let number = &token[..token.len() - kind.len_utf8()];
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    match kind {
        'w' | 'W' => Some(Descriptor::Width(value)),
        'x' | 'X' => Some(Descriptor::Density(value)),
        _ => None,
    }
}

/// URL of the largest candidate in `srcset`.
///
/// Width descriptors take precedence: if any candidate has one, the widest wins.
/// Otherwise the densest wins. Ties keep the first candidate.
///
/// ```
/// use loupe_magnifier::srcset::largest;
///
/// assert_eq!(largest("s.jpg 480w, l.jpg 1600w, m.jpg 960w"), Some("l.jpg"));
/// assert_eq!(largest("a.jpg, b.jpg 2x"), Some("b.jpg"));
/// assert_eq!(largest(""), None);
/// ```
pub fn largest(srcset: &str) -> Option<&str> {
    let candidates = parse(srcset);
    let widest = candidates
        .iter()
        .filter_map(|c| match c.descriptor {
            Descriptor::Width(w) => Some((c.url, w)),
            Descriptor::Density(_) => None,
        })
        .fold(None, pick_larger);
    if widest.is_some() {
        return widest.map(|(url, _)| url);
    }
    candidates
        .iter()
        .filter_map(|c| match c.descriptor {
            Descriptor::Density(x) => Some((c.url, x)),
            Descriptor::Width(_) => None,
        })
        .fold(None, pick_larger)
        .map(|(url, _)| url)
}

fn pick_larger<'a>(best: Option<(&'a str, f64)>, next: (&'a str, f64)) -> Option<(&'a str, f64)> {
    match best {
        Some(b) if b.1 >= next.1 => Some(b),
        _ => Some(next),
    }
}
