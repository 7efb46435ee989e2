// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Magnifier basics: approach, zoom, dwell, and teardown on a single image.
//!
//! Drives a [`Magnifier`] with a [`ManualHost`] and prints the lens after every
//! step.
//!
//! Run:
//! - `cargo run -p loupe_demos --example magnifier_basics`
//! - `RUST_LOG=debug cargo run -p loupe_demos --example magnifier_basics` for transitions

use kurbo::{Point, Rect, Size};
use loupe_dom::{Document, Element};
use loupe_magnifier::{Environment, LensState, Magnifier, MagnifierConfig, ManualHost};

fn frame(m: &mut Magnifier, doc: &mut Document, host: &mut ManualHost) {
    if let Some(id) = host.take_frame() {
        let now = host.now();
        m.on_frame(doc, host, id, now);
    }
}

fn report(label: &str, m: &Magnifier) {
    let p = m.presentation();
    println!(
        "{label:<28} state={:<11?} lens={:>5.1}px at ({:>6.1}, {:>6.1}) zoom={}",
        m.state(),
        p.diameter,
        p.center.x,
        p.center.y,
        p.zoom_label.as_deref().unwrap_or("-"),
    );
}

fn main() {
    env_logger::init();

    let mut doc = Document::new();
    let body = doc.body();
    let card = doc.insert(Some(body), Element::new("div").with_class("product-image"));
    let _shoe = doc.insert(
        Some(card),
        Element::new("img")
            .with_attr("src", "shoe-600.jpg")
            .with_attr("srcset", "shoe-600.jpg 600w, shoe-2400.jpg 2400w")
            .with_bounds(Rect::new(200.0, 200.0, 400.0, 400.0)),
    );

    let mut host = ManualHost::new();
    let mut m = Magnifier::new(
        MagnifierConfig::default(),
        &Environment::desktop(1440.0),
        &mut doc,
        &mut host,
    )
    .expect("desktop environment should be accepted");

    // The host loads the largest srcset candidate in the background.
    let loads = host.take_loads();
    println!("== Preloading ==");
    for (key, url) in &loads {
        println!("  {key:?}: {url}");
    }
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].1, "shoe-2400.jpg");
    let _ = m.on_image_loaded(loads[0].0, Ok(Size::new(2400.0, 2400.0)));

    println!("== Pointer path ==");
    m.pointer_move(&doc, &mut host, Point::new(300.0, 700.0), 0.0);
    frame(&mut m, &mut doc, &mut host);
    report("far below", &m);
    assert_eq!(m.state(), LensState::Idle);

    let _ = host.advance(32.0);
    let now = host.now();
    m.pointer_move(&doc, &mut host, Point::new(300.0, 430.0), now);
    frame(&mut m, &mut doc, &mut host);
    report("approaching", &m);
    assert_eq!(m.state(), LensState::Approaching);

    let _ = host.advance(32.0);
    let now = host.now();
    m.pointer_move(&doc, &mut host, Point::new(300.0, 300.0), now);
    for _ in 0..60 {
        let _ = host.advance(16.0);
        frame(&mut m, &mut doc, &mut host);
    }
    report("over the image", &m);
    assert_eq!(m.state(), LensState::Zooming);

    let inner = m.presentation().inner.clone().expect("zooming shows the image");
    println!(
        "  inner {} at {:?}, {}x{}",
        inner.src, inner.offset, inner.size.width, inner.size.height
    );
    assert_eq!(inner.src, "shoe-2400.jpg");
    assert_eq!(inner.size, Size::new(500.0, 500.0));

    // Resting: the dwell timer fires after 1.5s in total.
    for timer in host.advance(1500.0) {
        m.on_timer(timer);
    }
    frame(&mut m, &mut doc, &mut host);
    report("resting", &m);
    assert_eq!(m.state(), LensState::SmartZoom);

    m.pointer_leave_document(&mut doc, &mut host);
    report("left the page", &m);
    assert_eq!(m.state(), LensState::Idle);

    m.dispose(&mut doc, &mut host);
    assert!(m.lens().element().is_none());
    assert!(host.pending_frames().is_empty());
    println!("== Disposed ==");
}
