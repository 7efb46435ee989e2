// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Image registry: discover eligible images and warm their high-resolution sources.
//!
//! ## Identity
//!
//! Every registered image gets an [`ImageKey`], a generational handle into the
//! registry's arena. An element is registered at most once: the registry keeps an
//! element → key map and skips elements it already knows, so scanning the same
//! subtree twice is harmless.
//!
//! ## Discovery
//!
//! [`ImageRegistry::scan`] searches a subtree (descendants included) for elements
//! matching the configured selectors. [`ImageRegistry::observe`] installs a document
//! observer; feeding its records to [`ImageRegistry::apply_mutations`] scans each
//! added subtree and forgets images whose elements are gone.
//!
//! ## Sources
//!
//! The high-resolution URL is, in order: the configured override attribute, the
//! largest `srcset` candidate, the rendered `src`. Each new image triggers one
//! fire-and-forget [`Host::load_image`]; the result arrives through
//! [`ImageRegistry::on_image_loaded`]. Failures leave the image un-preloaded.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Size};
use loupe_dom::{Document, Element, ElementId, MutationRecord, ObserverId, SelectorSet};
use thiserror::Error;

use crate::host::Host;
use crate::srcset;

/// Generational handle of a [`TrackedImage`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageKey(u32, u32);

impl ImageKey {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Image keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A registered image.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedImage {
    /// The image element.
    pub element: ElementId,
    /// Best available source, loaded in the background.
    pub high_res_url: String,
    /// Source the page currently renders.
    pub rendered_url: String,
    /// True once the high-resolution source finished loading.
    pub preloaded: bool,
    /// Natural dimensions of the high-resolution source, once known.
    ///
    /// Informational: zoom geometry uses the rendered box, see [`crate::zoom::compute_zoom`].
    pub natural_size: Option<Size>,
}

impl TrackedImage {
    /// Source to show inside the lens: the high-resolution one once it is ready.
    pub fn display_url(&self) -> &str {
        if self.preloaded {
            &self.high_res_url
        } else {
            &self.rendered_url
        }
    }
}

/// Why an image failed to load, as reported by the host.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("image load failed: {reason}")]
pub struct ImageLoadError {
    /// Host-provided description.
    pub reason: String,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    image: Option<TrackedImage>,
}

/// Result of [`ImageRegistry::apply_mutations`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Images registered from added subtrees.
    pub registered: Vec<ImageKey>,
    /// Images dropped because their element left the document.
    pub forgotten: Vec<ImageKey>,
}

/// The set of images the magnifier can zoom.
#[derive(Debug)]
pub struct ImageRegistry {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    by_element: BTreeMap<ElementId, ImageKey>,
    selectors: SelectorSet,
    high_res_attribute: Option<String>,
    observer: Option<ObserverId>,
}

impl ImageRegistry {
    /// Create an empty registry.
    pub fn new(selectors: SelectorSet, high_res_attribute: Option<String>) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            by_element: BTreeMap::new(),
            selectors,
            high_res_attribute,
            observer: None,
        }
    }

    /// Register every new eligible image in `root`'s subtree, `root` included.
    ///
    /// Returns the keys of newly registered images. Known elements and elements
    /// without any usable source are skipped.
    pub fn scan(&mut self, doc: &Document, root: ElementId, host: &mut impl Host) -> Vec<ImageKey> {
        let mut added = Vec::new();
        for element in doc.query_selector_all(root, &self.selectors) {
            if self.by_element.contains_key(&element) {
                continue;
            }
            let Some(el) = doc.element(element) else {
                continue;
            };
            let Some((high_res_url, rendered_url)) =
                resolve_sources(el, self.high_res_attribute.as_deref())
            else {
                log::debug!("skipping {element:?}: no usable image source");
                continue;
            };
            let key = self.insert(TrackedImage {
                element,
                high_res_url,
                rendered_url,
                preloaded: false,
                natural_size: None,
            });
            if let Some(image) = self.get(key) {
                log::debug!("registered {element:?} as {key:?} ({})", image.high_res_url);
                host.load_image(key, &image.high_res_url);
            }
            added.push(key);
        }
        added
    }

    /// Watch `root`'s subtree for inserted content. Does nothing if already observing.
    pub fn observe(&mut self, doc: &mut Document, root: ElementId) -> ObserverId {
        if let Some(id) = self.observer {
            return id;
        }
        let id = doc.observe(root);
        self.observer = Some(id);
        id
    }

    /// Stop watching. Idempotent.
    pub fn disconnect(&mut self, doc: &mut Document) {
        if let Some(id) = self.observer.take() {
            doc.disconnect(id);
        }
    }

    /// The installed observer, if any.
    pub fn observer(&self) -> Option<ObserverId> {
        self.observer
    }

    /// Apply this registry's mutation records: scan added subtrees, forget
    /// images whose elements were removed. Records for other observers are ignored.
    pub fn apply_mutations(
        &mut self,
        doc: &Document,
        host: &mut impl Host,
        records: &[MutationRecord],
    ) -> MutationOutcome {
        let mut outcome = MutationOutcome::default();
        let Some(observer) = self.observer else {
            return outcome;
        };
        let mut saw_removal = false;
        for record in records.iter().filter(|r| r.observer == observer) {
            saw_removal |= !record.removed.is_empty();
            for &root in &record.added {
                outcome.registered.extend(self.scan(doc, root, host));
            }
        }
        if saw_removal {
            outcome.forgotten = self.forget_dead(doc);
        }
        outcome
    }

    /// Drop every image whose element is no longer alive. Returns the dropped keys.
    pub fn forget_dead(&mut self, doc: &Document) -> Vec<ImageKey> {
        let dead: Vec<(ElementId, ImageKey)> = self
            .by_element
            .iter()
            .filter(|(element, _)| !doc.is_alive(**element))
            .map(|(e, k)| (*e, *k))
            .collect();
        for &(element, key) in &dead {
            let _ = self.by_element.remove(&element);
            if let Some(slot) = self.slots.get_mut(key.idx())
                && slot.image.take().is_some()
            {
                self.free_list.push(key.idx());
            }
            log::debug!("forgot {key:?}: element {element:?} left the document");
        }
        dead.into_iter().map(|(_, k)| k).collect()
    }

    /// Record the outcome of a background load. Stale keys are ignored.
    ///
    /// Returns `true` if an image was updated.
    pub fn on_image_loaded(&mut self, key: ImageKey, result: Result<Size, ImageLoadError>) -> bool {
        let Some(image) = self.get_mut(key) else {
            log::trace!("load result for stale {key:?} ignored");
            return false;
        };
        match result {
            Ok(size) => {
                image.preloaded = true;
                image.natural_size = Some(size);
                log::debug!("preloaded {key:?} at {}x{}", size.width, size.height);
            }
            Err(err) => {
                image.preloaded = false;
                log::warn!("{err} ({}); zoom will use the rendered source", image.high_res_url);
            }
        }
        true
    }

    /// Image for `key`, if it is still registered.
    pub fn get(&self, key: ImageKey) -> Option<&TrackedImage> {
        let slot = self.slots.get(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.image.as_ref()
    }

    fn get_mut(&mut self, key: ImageKey) -> Option<&mut TrackedImage> {
        let slot = self.slots.get_mut(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.image.as_mut()
    }

    /// Key of the image registered for `element`.
    pub fn key_for(&self, element: ElementId) -> Option<ImageKey> {
        self.by_element.get(&element).copied()
    }

    /// Number of registered images.
    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }

    /// Iterate registered images.
    pub fn iter(&self) -> impl Iterator<Item = (ImageKey, &TrackedImage)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.image
                .as_ref()
                .map(|image| (ImageKey::new(i, slot.generation), image))
        })
    }

    /// Smallest distance from `pt` to the center of any registered image's box.
    ///
    /// Images whose box cannot be measured count as infinitely far away.
    /// Returns `f64::INFINITY` when nothing is measurable.
    pub fn min_center_distance(&self, doc: &Document, pt: Point) -> f64 {
        self.iter()
            .map(|(_, image)| match doc.bounding_rect(image.element) {
                Ok(rect) => rect.center().distance(pt),
                Err(_) => f64::INFINITY,
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Forget everything. The observer, if any, stays installed.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.image.take().is_some() {
                self.free_list.push(i);
            }
        }
        self.by_element.clear();
    }

    fn insert(&mut self, image: TrackedImage) -> ImageKey {
        let element = image.element;
        let key = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.image = Some(image);
            ImageKey::new(idx, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                image: Some(image),
            });
            ImageKey::new(self.slots.len() - 1, 1)
        };
        let _ = self.by_element.insert(element, key);
        key
    }
}

/// Resolve `(high_res_url, rendered_url)` for an image element.
fn resolve_sources(el: &Element, high_res_attribute: Option<&str>) -> Option<(String, String)> {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| String::from(s))
    };
    let rendered = el.attr("src").and_then(non_empty);
    let high_res = high_res_attribute
        .and_then(|name| el.attr(name))
        .and_then(non_empty)
        .or_else(|| el.attr("srcset").and_then(srcset::largest).map(String::from))
        .or_else(|| rendered.clone())?;
    let rendered = rendered.unwrap_or_else(|| high_res.clone());
    Some((high_res, rendered))
}
