// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Magnifier`] widget: wires the registry, state machine, follower, zoom and
//! lens together and exposes the host-facing entry points.

use alloc::vec::Vec;

use kurbo::{Point, Size};
use loupe_dom::{Document, MutationRecord};

use crate::config::MagnifierConfig;
use crate::gate::{self, Declined, Environment};
use crate::host::{FrameId, Host, TimerId};
use crate::hover::{HoverEvent, HoverState};
use crate::lens::{InnerImage, Lens, LensPresentation, zoom_label};
use crate::physics::Follower;
use crate::registry::{ImageKey, ImageLoadError, ImageRegistry};
use crate::state::{LensState, StateMachine, classify_distance};
use crate::throttle::Throttle;
use crate::zoom::{ZoomParams, compute_zoom};

/// A running smart magnifier.
///
/// Create it with [`Magnifier::new`], forward host events to it, and call
/// [`Magnifier::dispose`] when the page goes away. After disposal every entry
/// point does nothing.
#[derive(Debug)]
pub struct Magnifier {
    config: MagnifierConfig,
    registry: ImageRegistry,
    machine: StateMachine,
    hover: HoverState<ImageKey>,
    follower: Follower,
    throttle: Throttle,
    lens: Lens,
    frame: Option<FrameId>,
    pointer: Option<Point>,
    presentation: LensPresentation,
    disposed: bool,
}

impl Magnifier {
    /// Start the magnifier on `doc`.
    ///
    /// Checks the environment and configuration, mounts the lens, registers the
    /// images already in the body, starts watching for new ones and requests the
    /// first frame. On [`Declined`] nothing has been touched.
    pub fn new(
        config: MagnifierConfig,
        env: &Environment,
        doc: &mut Document,
        host: &mut impl Host,
    ) -> Result<Self, Declined> {
        if let Err(reason) = gate::check(env, &config) {
            log::debug!("magnifier declined: {reason}");
            return Err(reason);
        }
        let selectors = config.validate().map_err(|err| {
            log::debug!("magnifier declined: {err}");
            Declined::from(err)
        })?;

        let lens = Lens::mount(doc);
        let mut registry = ImageRegistry::new(selectors, config.high_res_attribute.clone());
        let body = doc.body();
        let found = registry.scan(doc, body, host);
        let _ = registry.observe(doc, body);
        log::debug!("magnifier started with {} image(s)", found.len());

        let frame = Some(host.request_animation_frame());
        Ok(Self {
            machine: StateMachine::new(config.dwell_delay_ms, config.jitter_threshold),
            hover: HoverState::new(),
            follower: Follower::new(Point::ZERO, config.stiffness, config.damping),
            throttle: Throttle::new(config.proximity_interval_ms),
            presentation: LensPresentation::hidden(Point::ZERO, config.idle_size),
            lens,
            registry,
            frame,
            pointer: None,
            disposed: false,
            config,
        })
    }

    /// The pointer moved to `pt` (viewport coordinates) at `now_ms`.
    pub fn pointer_move(&mut self, doc: &Document, host: &mut impl Host, pt: Point, now_ms: f64) {
        if self.disposed {
            return;
        }
        if self.pointer.is_none() {
            self.follower.teleport(pt);
        }
        self.pointer = Some(pt);

        let hovered: Vec<ImageKey> = doc
            .hit_test_point(pt)
            .map(|hit| {
                hit.path
                    .iter()
                    .filter_map(|&e| self.registry.key_for(e))
                    .collect()
            })
            .unwrap_or_default();

        let mut left_active = false;
        for event in self.hover.update_path(&hovered) {
            match event {
                HoverEvent::Leave(key) => left_active |= self.machine.leave(host, key),
                HoverEvent::Enter(key) => self.machine.enter(host, key, pt),
            }
        }
        // Leaving a nested image falls back to the image still under the pointer.
        if self.machine.active_target().is_none()
            && let Some(key) = self.hover.innermost()
        {
            self.machine.enter(host, key, pt);
        }
        self.machine.pointer_moved(host, pt);

        if self.machine.active_target().is_none() {
            if left_active {
                self.throttle.mark(now_ms);
                self.check_proximity(doc, pt);
            } else if self.throttle.request(now_ms) {
                self.check_proximity(doc, pt);
            }
        }
        self.ensure_frame(host);
    }

    /// The pointer left the document: go idle and hide the lens.
    pub fn pointer_leave_document(&mut self, doc: &mut Document, host: &mut impl Host) {
        if self.disposed {
            return;
        }
        let _ = self.hover.clear();
        self.machine.reset(host);
        self.throttle.reset();
        self.pointer = None;
        self.presentation = LensPresentation::hidden(self.follower.position(), self.config.idle_size);
        self.lens.apply(doc, &self.presentation);
    }

    /// An animation frame requested by this magnifier arrived.
    ///
    /// Stale or foreign frame ids are ignored.
    pub fn on_frame(&mut self, doc: &mut Document, host: &mut impl Host, id: FrameId, now_ms: f64) {
        if self.disposed || self.frame != Some(id) {
            log::trace!("ignoring frame {id:?}");
            return;
        }
        self.frame = None;

        if let Some(pt) = self.pointer
            && self.machine.active_target().is_none()
            && self.throttle.poll_trailing(now_ms)
        {
            self.check_proximity(doc, pt);
        }

        let target = self.pointer.unwrap_or_else(|| self.follower.position());
        let center = self.follower.step(target);
        self.presentation = self.present(doc, center);
        self.lens.apply(doc, &self.presentation);
        log::trace!(
            "frame {id:?}: {:?} at ({:.1}, {:.1})",
            self.presentation.state,
            center.x,
            center.y
        );
        self.ensure_frame(host);
    }

    /// A timer set by this magnifier fired.
    pub fn on_timer(&mut self, id: TimerId) {
        if self.disposed {
            return;
        }
        let _ = self.machine.timer_fired(id);
    }

    /// Mutation records drained from the document.
    ///
    /// Added subtrees are scanned for new images. If the active image was
    /// removed, the magnifier behaves as if the pointer left it.
    pub fn on_mutations(&mut self, doc: &Document, host: &mut impl Host, records: &[MutationRecord]) {
        if self.disposed {
            return;
        }
        let outcome = self.registry.apply_mutations(doc, host, records);
        let mut left_active = false;
        for key in outcome.forgotten {
            let _ = self.hover.forget(key);
            left_active |= self.machine.leave(host, key);
        }
        if left_active && let Some(pt) = self.pointer {
            match self.hover.innermost() {
                Some(key) => self.machine.enter(host, key, pt),
                None => self.check_proximity(doc, pt),
            }
        }
    }

    /// Result of a background image load requested through [`Host::load_image`].
    pub fn on_image_loaded(&mut self, key: ImageKey, result: Result<Size, ImageLoadError>) -> bool {
        if self.disposed {
            return false;
        }
        self.registry.on_image_loaded(key, result)
    }

    /// Scan the whole body for images again. Returns how many were newly registered.
    pub fn rescan(&mut self, doc: &Document, host: &mut impl Host) -> usize {
        if self.disposed {
            return 0;
        }
        self.registry.scan(doc, doc.body(), host).len()
    }

    /// Tear everything down. Safe to call more than once.
    pub fn dispose(&mut self, doc: &mut Document, host: &mut impl Host) {
        if self.disposed {
            return;
        }
        if let Some(frame) = self.frame.take() {
            host.cancel_animation_frame(frame);
        }
        self.machine.reset(host);
        self.registry.disconnect(doc);
        self.lens.unmount(doc);
        self.registry.clear();
        let _ = self.hover.clear();
        self.pointer = None;
        self.disposed = true;
        log::debug!("magnifier disposed");
    }

    /// Current lens state.
    pub fn state(&self) -> LensState {
        self.machine.state()
    }

    /// Image being zoomed, if any. Present exactly in the zoom states.
    pub fn active_target(&self) -> Option<ImageKey> {
        self.machine.active_target()
    }

    /// Last pointer position, or `None` outside the document.
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    /// Lens position and velocity.
    pub fn kinematics(&self) -> &Follower {
        &self.follower
    }

    /// What the lens showed on the last frame.
    pub fn presentation(&self) -> &LensPresentation {
        &self.presentation
    }

    /// Registered images.
    pub fn registry(&self) -> &ImageRegistry {
        &self.registry
    }

    /// The lens element handles.
    pub fn lens(&self) -> &Lens {
        &self.lens
    }

    /// The active configuration.
    pub fn config(&self) -> &MagnifierConfig {
        &self.config
    }

    /// True after [`Magnifier::dispose`].
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn check_proximity(&mut self, doc: &Document, pt: Point) {
        let distance = self.registry.min_center_distance(doc, pt);
        self.machine
            .apply_proximity(classify_distance(distance, self.config.proximity_distance));
    }

    fn ensure_frame(&mut self, host: &mut impl Host) {
        if self.frame.is_none() {
            self.frame = Some(host.request_animation_frame());
        }
    }

    fn present(&self, doc: &Document, center: Point) -> LensPresentation {
        let state = self.machine.state();
        let (diameter, factor) = match state {
            LensState::Idle => (self.config.idle_size, None),
            LensState::Approaching => (self.config.approach_size, None),
            LensState::Zooming => (self.config.zoom_size, Some(self.config.zoom_factor)),
            LensState::SmartZoom => (
                self.config.smart_zoom_size(),
                Some(self.config.smart_zoom_factor()),
            ),
        };

        let inner = match (self.machine.active_target(), factor, self.pointer) {
            (Some(key), Some(zoom_factor), Some(pointer)) => {
                self.registry.get(key).and_then(|image| {
                    match doc.bounding_rect(image.element) {
                        Ok(image_box) => {
                            let t = compute_zoom(
                                image_box,
                                pointer,
                                ZoomParams {
                                    zoom_factor,
                                    lens_radius: diameter / 2.0,
                                },
                            );
                            Some(InnerImage {
                                src: image.display_url().into(),
                                offset: t.offset,
                                size: t.scaled,
                            })
                        }
                        Err(err) => {
                            log::trace!("skipping zoom: {err}");
                            None
                        }
                    }
                })
            }
            _ => None,
        };

        LensPresentation {
            center,
            diameter,
            state,
            visible: self.pointer.is_some(),
            zoom_label: factor.map(zoom_label),
            inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::InputCapabilities;
    use crate::host::ManualHost;
    use kurbo::{Rect, Vec2};
    use loupe_dom::{Element, ElementId, NodeFlags};

    fn zoomable(doc: &mut Document, rect: Rect) -> ElementId {
        let body = doc.body();
        doc.insert(
            Some(body),
            Element::new("img")
                .with_attr("data-zoom", "")
                .with_attr("src", "page.jpg")
                .with_attr("data-zoom-src", "huge.jpg")
                .with_bounds(rect),
        )
    }

    fn start(doc: &mut Document, host: &mut ManualHost) -> Magnifier {
        Magnifier::new(
            MagnifierConfig::default(),
            &Environment::desktop(1440.0),
            doc,
            host,
        )
        .unwrap()
    }

    fn run_frame(m: &mut Magnifier, doc: &mut Document, host: &mut ManualHost) {
        let id = host.take_frame().expect("a frame should be pending");
        let now = host.now();
        m.on_frame(doc, host, id, now);
    }

    fn assert_invariant(m: &Magnifier) {
        assert_eq!(
            m.active_target().is_some(),
            m.state().is_zoomed(),
            "target must exist exactly in the zoom states"
        );
    }

    #[test]
    fn proximity_scenario() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(50.0, 50.0, 150.0, 150.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(100.0, 260.0), 0.0);
        assert_eq!(m.state(), LensState::Idle);
        m.pointer_move(&doc, &mut host, Point::new(100.0, 240.0), 20.0);
        assert_eq!(m.state(), LensState::Approaching);
        assert_invariant(&m);
    }

    #[test]
    fn throttled_check_runs_on_a_later_frame() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(50.0, 50.0, 150.0, 150.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(100.0, 260.0), 0.0);
        m.pointer_move(&doc, &mut host, Point::new(100.0, 240.0), 4.0);
        assert_eq!(m.state(), LensState::Idle, "second check is deferred");

        let _ = host.advance(16.0);
        run_frame(&mut m, &mut doc, &mut host);
        assert_eq!(m.state(), LensState::Approaching);
    }

    #[test]
    fn entering_an_image_zooms_immediately() {
        let mut doc = Document::new();
        let img = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        // From far away straight onto the image.
        m.pointer_move(&doc, &mut host, Point::new(2000.0, 2000.0), 0.0);
        assert_eq!(m.state(), LensState::Idle);
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 1.0);
        assert_eq!(m.state(), LensState::Zooming);
        let key = m.active_target().unwrap();
        assert_eq!(m.registry().get(key).unwrap().element, img);
        assert_invariant(&m);
    }

    #[test]
    fn zoom_scenario_centers_the_enlarged_image() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);
        run_frame(&mut m, &mut doc, &mut host);

        let p = m.presentation();
        assert_eq!(p.state, LensState::Zooming);
        assert_eq!(p.diameter, 180.0);
        assert_eq!(p.zoom_label.as_deref(), Some("2.5x"));
        let inner = p.inner.as_ref().unwrap();
        assert_eq!(inner.size, Size::new(750.0, 750.0));
        assert_eq!(inner.offset, Vec2::new(-375.0 + 90.0, -375.0 + 90.0));
        // Not preloaded yet: the rendered source is shown.
        assert_eq!(inner.src, "page.jpg");
    }

    #[test]
    fn preloaded_source_is_used_once_ready() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        let loads = host.take_loads();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].1, "huge.jpg");
        assert!(m.on_image_loaded(loads[0].0, Ok(Size::new(3000.0, 1000.0))));

        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);
        run_frame(&mut m, &mut doc, &mut host);
        let inner = m.presentation().inner.as_ref().unwrap();
        assert_eq!(inner.src, "huge.jpg");
        // The rendered box still drives the geometry, whatever the source's aspect.
        assert_eq!(inner.size, Size::new(750.0, 750.0));
        let image = m.registry().iter().next().unwrap().1;
        assert_eq!(image.natural_size, Some(Size::new(3000.0, 1000.0)));
    }

    #[test]
    fn smart_zoom_enlarges_lens_and_factor() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);
        let due = host.advance(1500.0);
        assert_eq!(due.len(), 1);
        m.on_timer(due[0]);
        assert_eq!(m.state(), LensState::SmartZoom);

        run_frame(&mut m, &mut doc, &mut host);
        let p = m.presentation();
        assert_eq!(p.diameter, 270.0);
        assert_eq!(p.zoom_label.as_deref(), Some("3.5x"));
        let inner = p.inner.as_ref().unwrap();
        assert_eq!(inner.size, Size::new(1050.0, 1050.0));
        assert_eq!(inner.offset, Vec2::new(-525.0 + 135.0, -525.0 + 135.0));
        assert_invariant(&m);
    }

    #[test]
    fn jitter_before_deadline_postpones_smart_zoom() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);
        let _ = host.advance(1000.0);
        m.pointer_move(&doc, &mut host, Point::new(152.0, 152.0), 1000.0);
        m.pointer_move(&doc, &mut host, Point::new(156.0, 150.0), 1010.0);
        for t in host.advance(600.0) {
            m.on_timer(t);
        }
        assert_eq!(m.state(), LensState::Zooming);
        assert_eq!(host.pending_timers(), 1);
        for t in host.advance(1000.0) {
            m.on_timer(t);
        }
        assert_eq!(m.state(), LensState::SmartZoom);
    }

    #[test]
    fn leaving_an_image_reruns_proximity() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 200.0, 200.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(100.0, 100.0), 0.0);
        assert_eq!(m.state(), LensState::Zooming);
        // Just outside the box, well within 150px of the center.
        m.pointer_move(&doc, &mut host, Point::new(100.0, 210.0), 1.0);
        assert_eq!(m.state(), LensState::Approaching);
        assert_eq!(host.pending_timers(), 0);
        assert_invariant(&m);
    }

    #[test]
    fn moving_between_images_switches_target() {
        let mut doc = Document::new();
        let a = zoomable(&mut doc, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = zoomable(&mut doc, Rect::new(100.0, 0.0, 200.0, 100.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(50.0, 50.0), 0.0);
        let ka = m.active_target().unwrap();
        m.pointer_move(&doc, &mut host, Point::new(150.0, 50.0), 1.0);
        let kb = m.active_target().unwrap();
        assert_ne!(ka, kb);
        assert_eq!(m.registry().get(ka).unwrap().element, a);
        assert_eq!(m.registry().get(kb).unwrap().element, b);
        assert_eq!(m.state(), LensState::Zooming);
        assert_eq!(host.pending_timers(), 1);
    }

    #[test]
    fn lens_never_blocks_the_image() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);
        for _ in 0..5 {
            run_frame(&mut m, &mut doc, &mut host);
        }
        // The lens now covers the pointer but is not pickable.
        m.pointer_move(&doc, &mut host, Point::new(151.0, 151.0), 100.0);
        assert_eq!(m.state(), LensState::Zooming);
        let lens = m.lens().element().unwrap();
        assert!(!doc.element(lens).unwrap().flags.contains(NodeFlags::PICKABLE));
    }

    #[test]
    fn images_added_later_are_zoomable() {
        let mut doc = Document::new();
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        assert!(m.registry().is_empty());

        m.pointer_move(&doc, &mut host, Point::new(50.0, 50.0), 0.0);
        assert_eq!(m.state(), LensState::Idle, "empty registry stays idle");

        let body = doc.body();
        let card = doc.insert(None, Element::new("div").with_class("product-image"));
        let _ = doc.insert(
            Some(card),
            Element::new("img")
                .with_attr("src", "late.jpg")
                .with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
        );
        doc.append(body, card);
        let records = doc.take_mutations();
        m.on_mutations(&doc, &mut host, &records);
        assert_eq!(m.registry().len(), 1);

        m.pointer_move(&doc, &mut host, Point::new(50.0, 51.0), 20.0);
        assert_eq!(m.state(), LensState::Zooming);
    }

    #[test]
    fn removing_the_active_image_acts_like_leaving_it() {
        let mut doc = Document::new();
        let img = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);

        doc.remove(img);
        let records = doc.take_mutations();
        m.on_mutations(&doc, &mut host, &records);
        assert_eq!(m.state(), LensState::Idle);
        assert_eq!(m.active_target(), None);
        assert_eq!(host.pending_timers(), 0);
        assert!(m.registry().is_empty());

        run_frame(&mut m, &mut doc, &mut host);
        assert!(m.presentation().inner.is_none());
    }

    #[test]
    fn moving_then_removing_the_active_image_in_one_batch_goes_idle() {
        let mut doc = Document::new();
        let body = doc.body();
        let shelf = doc.insert(Some(body), Element::new("div"));
        let img = doc.insert(
            Some(shelf),
            Element::new("img")
                .with_attr("data-zoom", "")
                .with_attr("src", "a.jpg")
                .with_bounds(Rect::new(0.0, 0.0, 300.0, 300.0)),
        );
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);
        assert_eq!(m.state(), LensState::Zooming);

        doc.append(body, img);
        doc.remove(img);
        let records = doc.take_mutations();
        m.on_mutations(&doc, &mut host, &records);
        assert!(m.registry().is_empty());
        assert_eq!(m.state(), LensState::Idle);
        assert_eq!(m.active_target(), None);
        assert_eq!(host.pending_timers(), 0);
        assert_invariant(&m);
    }

    #[test]
    fn leaving_a_nested_image_zooms_the_enclosing_one() {
        let mut doc = Document::new();
        let outer = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let inner = doc.insert(
            Some(outer),
            Element::new("img")
                .with_attr("data-zoom", "")
                .with_attr("src", "detail.jpg")
                .with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)),
        );
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        let outer_key = m.registry().key_for(outer).unwrap();
        let inner_key = m.registry().key_for(inner).unwrap();

        m.pointer_move(&doc, &mut host, Point::new(50.0, 50.0), 0.0);
        assert_eq!(m.active_target(), Some(inner_key));

        m.pointer_move(&doc, &mut host, Point::new(200.0, 200.0), 20.0);
        assert_eq!(m.state(), LensState::Zooming);
        assert_eq!(m.active_target(), Some(outer_key));
        assert_eq!(host.pending_timers(), 1, "dwell restarts on the outer image");
        assert_invariant(&m);

        // Removing the inner image while over it also falls back to the outer one.
        m.pointer_move(&doc, &mut host, Point::new(50.0, 50.0), 40.0);
        assert_eq!(m.active_target(), Some(inner_key));
        doc.remove(inner);
        let records = doc.take_mutations();
        m.on_mutations(&doc, &mut host, &records);
        assert_eq!(m.active_target(), Some(outer_key));
        assert_invariant(&m);
    }

    #[test]
    fn detached_target_skips_zoom_rendering() {
        let mut doc = Document::new();
        let body = doc.body();
        let wrapper = doc.insert(Some(body), Element::new("div").with_flags(NodeFlags::VISIBLE));
        let img = doc.insert(
            Some(wrapper),
            Element::new("img")
                .with_attr("data-zoom", "")
                .with_attr("src", "a.jpg")
                .with_bounds(Rect::new(0.0, 0.0, 300.0, 300.0)),
        );
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);

        // Move the image into a detached container: alive, but not measurable.
        let limbo = doc.insert(None, Element::new("div"));
        doc.append(limbo, img);
        run_frame(&mut m, &mut doc, &mut host);
        assert_eq!(m.state(), LensState::Zooming);
        assert!(m.presentation().inner.is_none());
        assert!(!host.pending_frames().is_empty(), "frame loop keeps running");
    }

    #[test]
    fn lens_follows_the_pointer() {
        let mut doc = Document::new();
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);

        m.pointer_move(&doc, &mut host, Point::new(400.0, 300.0), 0.0);
        assert_eq!(m.kinematics().position(), Point::new(400.0, 300.0), "first move teleports");
        m.pointer_move(&doc, &mut host, Point::new(500.0, 300.0), 20.0);
        run_frame(&mut m, &mut doc, &mut host);
        let x = m.presentation().center.x;
        assert!(x > 400.0 && x < 500.0, "lens lags behind: {x}");
        for _ in 0..300 {
            run_frame(&mut m, &mut doc, &mut host);
        }
        assert_eq!(m.presentation().center, Point::new(500.0, 300.0));
        assert!(m.presentation().visible);
    }

    #[test]
    fn leaving_the_document_hides_and_resets() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);
        run_frame(&mut m, &mut doc, &mut host);

        m.pointer_leave_document(&mut doc, &mut host);
        assert_eq!(m.state(), LensState::Idle);
        assert_eq!(m.pointer(), None);
        assert_eq!(host.pending_timers(), 0);
        let lens = m.lens().element().unwrap();
        assert!(!doc.element(lens).unwrap().flags.contains(NodeFlags::VISIBLE));

        // Re-entering over the image zooms again.
        m.pointer_move(&doc, &mut host, Point::new(10.0, 10.0), 50.0);
        assert_eq!(m.state(), LensState::Zooming);
    }

    #[test]
    fn stale_frames_and_timers_are_ignored() {
        let mut doc = Document::new();
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        let before = m.presentation().clone();
        m.on_frame(&mut doc, &mut host, FrameId(9999), 0.0);
        m.on_timer(TimerId(9999));
        assert_eq!(m.presentation(), &before);
        assert_eq!(host.pending_frames().len(), 1);
    }

    #[test]
    fn dispose_twice_is_safe() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 0.0);

        m.dispose(&mut doc, &mut host);
        m.dispose(&mut doc, &mut host);
        assert!(m.is_disposed());
        assert!(host.pending_frames().is_empty());
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(doc.observer_count(), 0);
        assert!(m.registry().is_empty());
        let lens_class = loupe_dom::SelectorSet::parse(&[".loupe-lens"]).unwrap();
        assert!(
            doc.descendants(doc.body())
                .into_iter()
                .all(|e| !lens_class.matches(&doc, e)),
            "no lens element remains"
        );

        // Every entry point is inert afterwards.
        m.pointer_move(&doc, &mut host, Point::new(150.0, 150.0), 10.0);
        m.pointer_leave_document(&mut doc, &mut host);
        m.on_frame(&mut doc, &mut host, FrameId(1), 20.0);
        assert_eq!(m.rescan(&doc, &mut host), 0);
        assert!(host.pending_frames().is_empty());
        assert_eq!(m.state(), LensState::Idle);
    }

    #[test]
    fn rescan_is_idempotent() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        assert_eq!(m.rescan(&doc, &mut host), 0);
        let _ = zoomable(&mut doc, Rect::new(400.0, 0.0, 700.0, 300.0));
        assert_eq!(m.rescan(&doc, &mut host), 1);
        assert_eq!(m.rescan(&doc, &mut host), 0);
        assert_eq!(m.registry().len(), 2);
    }

    #[test]
    fn declined_magnifier_touches_nothing() {
        let mut doc = Document::new();
        let _ = zoomable(&mut doc, Rect::new(0.0, 0.0, 300.0, 300.0));
        let mut host = ManualHost::new();
        let touch = Environment {
            capabilities: InputCapabilities::TOUCH_PRIMARY,
            viewport_width: 1440.0,
        };
        let err = Magnifier::new(MagnifierConfig::default(), &touch, &mut doc, &mut host).unwrap_err();
        assert_eq!(err, Declined::TouchPrimary);

        let bad = MagnifierConfig {
            zoom_factor: -1.0,
            ..Default::default()
        };
        let err = Magnifier::new(bad, &Environment::desktop(1440.0), &mut doc, &mut host).unwrap_err();
        assert!(matches!(err, Declined::Config(_)));

        assert_eq!(doc.stylesheet_count(), 0);
        assert_eq!(doc.observer_count(), 0);
        assert_eq!(doc.children(doc.body()).len(), 1);
        assert!(host.pending_frames().is_empty());
        assert!(host.take_loads().is_empty());
    }
}
