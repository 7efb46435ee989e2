// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Document`] arena: structure, queries, stylesheets, and mutation records.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::error::DomError;
use crate::selector::SelectorSet;
use crate::types::{Element, ElementId, Hit, MutationRecord, NodeFlags, ObserverId};

#[derive(Clone, Debug)]
struct Node {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    element: Element,
}

impl Node {
    fn new(element: Element) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            element,
        }
    }
}

/// A generational slot. The generation outlives the node so reuse can bump it.
#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Clone, Debug)]
struct Observer {
    id: ObserverId,
    root: ElementId,
    pending: MutationRecord,
}

/// A minimal document: a generational arena of [`Element`]s rooted at a body.
///
/// Elements inserted without a parent are detached (like a freshly created
/// DOM node) until they are appended somewhere under [`Document::body`].
pub struct Document {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    body: ElementId,
    stylesheets: Vec<(String, String)>,
    observers: Vec<Observer>,
    next_observer: u32,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|s| s.node.is_some()).count();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("stylesheets", &self.stylesheets.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only an empty `body`.
    pub fn new() -> Self {
        let body = Element::new("body").with_flags(NodeFlags::VISIBLE);
        Self {
            slots: alloc::vec![Slot {
                generation: 1,
                node: Some(Node::new(body)),
            }],
            free_list: Vec::new(),
            body: ElementId::new(0, 1),
            stylesheets: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// The root element every connected element descends from.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Insert a new element as the last child of `parent`, or detached if `None`.
    pub fn insert(&mut self, parent: Option<ElementId>, element: Element) -> ElementId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(Node::new(element));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            (idx as u32, slot.generation)
        } else {
            let generation = 1_u32;
            self.slots.push(Slot {
                generation,
                node: Some(Node::new(element)),
            });
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            ((self.slots.len() - 1) as u32, generation)
        };
        let id = ElementId::new(idx, generation);
        if let Some(p) = parent {
            self.append(p, id);
        }
        id
    }

    /// Attach `child` (and its subtree) as the last child of `parent`.
    ///
    /// If `child` is already attached elsewhere it is moved. Does nothing if either
    /// id is stale, if `child` is the body, or if `parent` lies inside `child`'s subtree.
    pub fn append(&mut self, parent: ElementId, child: ElementId) {
        if !self.is_alive(parent) || !self.is_alive(child) || child == self.body {
            return;
        }
        if self.path_to_root(parent).contains(&child) {
            return;
        }
        if let Some(old) = self.node(child).and_then(|n| n.parent) {
            self.unlink_parent(child, old);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        self.record_added(child);
    }

    /// Remove an element (and its subtree) from the document.
    ///
    /// Stale ids and the body are ignored, so removing twice is harmless.
    pub fn remove(&mut self, id: ElementId) {
        if !self.is_alive(id) || id == self.body {
            return;
        }
        self.record_removed(id);
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
        }
        self.free_subtree(id);
    }

    /// Element data, if `id` is alive.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.node(id).map(|n| &n.element)
    }

    /// Mutable element data, if `id` is alive.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.node_mut(id).map(|n| &mut n.element)
    }

    /// Update viewport bounds.
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) {
        if let Some(el) = self.element_mut(id) {
            el.bounds = bounds;
        }
    }

    /// Update flags.
    pub fn set_flags(&mut self, id: ElementId, flags: NodeFlags) {
        if let Some(el) = self.element_mut(id) {
            el.flags = flags;
        }
    }

    /// Set or replace an attribute.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(name.into(), value.into());
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.remove(name);
        }
    }

    /// Add a class if not already present.
    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.element_mut(id)
            && !el.has_class(class)
        {
            el.classes.push(class.into());
        }
    }

    /// Remove a class if present.
    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.classes.retain(|c| c != class);
        }
    }

    /// True if `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.node(id).is_some()
    }

    /// True if `id` is alive and descends from the body (or is the body).
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.is_alive(id) && self.path_to_root(id).first() == Some(&self.body)
    }

    /// Parent of `id`, if any.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children of `id` in insertion order. Empty for stale ids.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Path from the outermost ancestor to `id` (inclusive). Empty for stale ids.
    pub fn path_to_root(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(node) = self.node(c) else {
                break;
            };
            out.push(c);
            cur = node.parent;
        }
        out.reverse();
        out
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    pub fn contains(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    /// All descendants of `root` in pre-order, excluding `root` itself.
    pub fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Viewport bounding box of a connected element.
    ///
    /// Returns [`DomError::Detached`] for removed or disconnected elements.
    pub fn bounding_rect(&self, id: ElementId) -> Result<Rect, DomError> {
        if !self.is_connected(id) {
            return Err(DomError::Detached(id));
        }
        self.element(id)
            .map(|e| e.bounds)
            .ok_or(DomError::Detached(id))
    }

    /// Elements matching `selectors` within `root`, including `root` itself, in pre-order.
    ///
    /// Searches every descendant, not just direct children. Subtrees rooted at an
    /// [`NodeFlags::OVERLAY`] element are skipped.
    pub fn query_selector_all(&self, root: ElementId, selectors: &SelectorSet) -> Vec<ElementId> {
        let mut out = Vec::new();
        if !self.is_alive(root) {
            return out;
        }
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            let Some(el) = self.element(id) else {
                continue;
            };
            if el.flags.contains(NodeFlags::OVERLAY) {
                continue;
            }
            if selectors.matches(self, id) {
                out.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Topmost connected element under a viewport point.
    ///
    /// Only elements marked both [`NodeFlags::VISIBLE`] and [`NodeFlags::PICKABLE`]
    /// are considered. Higher `z_index` wins; on equal z the later slot wins.
    pub fn hit_test_point(&self, pt: Point) -> Option<Hit> {
        let wanted = NodeFlags::VISIBLE | NodeFlags::PICKABLE;
        let mut best: Option<(ElementId, i32)> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(node) = &slot.node else {
                continue;
            };
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            let id = ElementId::new(i as u32, slot.generation);
            let el = &node.element;
            if !el.flags.contains(wanted) || !el.bounds.contains(pt) {
                continue;
            }
            if !self.is_connected(id) {
                continue;
            }
            match best {
                None => best = Some((id, el.z_index)),
                Some((_, z_best)) if el.z_index >= z_best => best = Some((id, el.z_index)),
                _ => {}
            }
        }
        best.map(|(element, _)| Hit {
            element,
            path: self.path_to_root(element),
        })
    }

    /// True if a stylesheet with this marker has been inserted.
    pub fn has_stylesheet(&self, marker: &str) -> bool {
        self.stylesheets.iter().any(|(m, _)| m == marker)
    }

    /// Insert a stylesheet unless one with the same marker exists.
    ///
    /// Returns `true` if the stylesheet was inserted.
    pub fn insert_stylesheet(&mut self, marker: &str, css: &str) -> bool {
        if self.has_stylesheet(marker) {
            return false;
        }
        self.stylesheets.push((marker.into(), css.into()));
        true
    }

    /// Number of inserted stylesheets.
    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    /// Watch `root`'s subtree for attached and removed elements.
    ///
    /// Changes accumulate until [`Document::take_mutations`] drains them.
    pub fn observe(&mut self, root: ElementId) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer = self.next_observer.wrapping_add(1);
        self.observers.push(Observer {
            id,
            root,
            pending: MutationRecord {
                observer: id,
                added: Vec::new(),
                removed: Vec::new(),
            },
        });
        id
    }

    /// Stop an observer and drop its pending records. Unknown ids are ignored.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.retain(|o| o.id != observer);
    }

    /// Number of installed observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Drain pending mutation records, one per observer that saw changes.
    ///
    /// Added elements whose ancestor was also added in the same batch are folded
    /// into that ancestor, and elements removed again before the drain are dropped.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        let mut out = Vec::new();
        for i in 0..self.observers.len() {
            let id = self.observers[i].id;
            let pending = core::mem::replace(
                &mut self.observers[i].pending,
                MutationRecord {
                    observer: id,
                    added: Vec::new(),
                    removed: Vec::new(),
                },
            );
            let added = self.coalesce_added(&pending.added);
            let record = MutationRecord {
                observer: id,
                added,
                removed: pending.removed,
            };
            if !record.is_empty() {
                out.push(record);
            }
        }
        out
    }

    // --- internals ---

    fn node(&self, id: ElementId) -> Option<&Node> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    fn unlink_parent(&mut self, id: ElementId, parent: ElementId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    fn free_subtree(&mut self, id: ElementId) {
        // Depth-first free children
        let children = self.children(id).to_vec();
        for child in children {
            self.free_subtree(child);
        }
        if let Some(slot) = self.slots.get_mut(id.idx())
            && slot.node.take().is_some()
        {
            self.free_list.push(id.idx());
        }
    }

    fn record_added(&mut self, id: ElementId) {
        let path = self.path_to_root(id);
        for o in &mut self.observers {
            if path.contains(&o.root) {
                o.pending.added.push(id);
            }
        }
    }

    fn record_removed(&mut self, id: ElementId) {
        let path = self.path_to_root(id);
        let mut subtree: BTreeSet<ElementId> = self.descendants(id).into_iter().collect();
        let _ = subtree.insert(id);
        for o in &mut self.observers {
            if !path.contains(&o.root) || o.root == id {
                continue;
            }
            // Pending additions inside the subtree are gone, but the removal is
            // always reported: the element may have existed before the batch.
            o.pending.added.retain(|a| !subtree.contains(a));
            if !o.pending.removed.contains(&id) {
                o.pending.removed.push(id);
            }
        }
    }

    fn coalesce_added(&self, added: &[ElementId]) -> Vec<ElementId> {
        let set: BTreeSet<ElementId> = added.iter().copied().filter(|a| self.is_alive(*a)).collect();
        let mut out: Vec<ElementId> = Vec::new();
        for &id in added {
            if !set.contains(&id) || out.contains(&id) {
                continue;
            }
            let mut cur = self.parent(id);
            let mut folded = false;
            while let Some(p) = cur {
                if set.contains(&p) {
                    folded = true;
                    break;
                }
                cur = self.parent(p);
            }
            if !folded {
                out.push(id);
            }
        }
        out
    }
}
