// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Images inserted after start-up, removed while zoomed, and a declined start.
//!
//! Run:
//! - `cargo run -p loupe_demos --example magnifier_dynamic_content`

use kurbo::{Point, Rect};
use loupe_dom::{Document, Element};
use loupe_magnifier::{
    Declined, Environment, InputCapabilities, LensState, Magnifier, MagnifierConfig, ManualHost,
};

fn gallery_tile(doc: &mut Document, x: f64) -> loupe_dom::ElementId {
    let tile = doc.insert(None, Element::new("figure").with_class("cms-image"));
    let _ = doc.insert(
        Some(tile),
        Element::new("img")
            .with_attr("src", "tile.jpg")
            .with_bounds(Rect::new(x, 0.0, x + 100.0, 100.0)),
    );
    tile
}

fn main() {
    env_logger::init();

    // Touch-first devices never get a magnifier.
    let mut doc = Document::new();
    let mut host = ManualHost::new();
    let phone = Environment {
        capabilities: InputCapabilities::TOUCH_PRIMARY,
        viewport_width: 1440.0,
    };
    let declined = Magnifier::new(MagnifierConfig::default(), &phone, &mut doc, &mut host);
    println!("== Touch device ==\n  {}", declined.as_ref().unwrap_err());
    assert!(matches!(declined, Err(Declined::TouchPrimary)));
    assert_eq!(doc.stylesheet_count(), 0);

    // Desktop: start with an empty page and load a gallery later.
    let mut m = Magnifier::new(
        MagnifierConfig::default(),
        &Environment::desktop(1280.0),
        &mut doc,
        &mut host,
    )
    .expect("desktop environment should be accepted");
    assert!(m.registry().is_empty());

    let body = doc.body();
    let row = doc.insert(None, Element::new("section"));
    let first = gallery_tile(&mut doc, 0.0);
    let second = gallery_tile(&mut doc, 110.0);
    doc.append(row, first);
    doc.append(row, second);
    doc.append(body, row);

    let records = doc.take_mutations();
    m.on_mutations(&doc, &mut host, &records);
    println!("== Gallery inserted ==\n  {} image(s) registered", m.registry().len());
    assert_eq!(m.registry().len(), 2);

    m.pointer_move(&doc, &mut host, Point::new(50.0, 50.0), 0.0);
    println!("  over first tile: {:?}", m.state());
    assert_eq!(m.state(), LensState::Zooming);

    // The tile under the pointer goes away: the magnifier lets go of it.
    doc.remove(first);
    let records = doc.take_mutations();
    m.on_mutations(&doc, &mut host, &records);
    println!("== First tile removed ==\n  state: {:?}", m.state());
    assert_eq!(m.active_target(), None);
    assert_eq!(m.state(), LensState::Approaching);
    assert_eq!(m.registry().len(), 1);

    m.dispose(&mut doc, &mut host);
    m.dispose(&mut doc, &mut host);
    assert_eq!(doc.observer_count(), 0);
    println!("== Disposed twice ==");
}
