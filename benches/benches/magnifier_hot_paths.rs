// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use loupe_dom::{Document, Element};
use loupe_magnifier::{Environment, Magnifier, MagnifierConfig, ManualHost};

/// A product grid of `n * n` zoomable tiles, 120px apart.
fn grid_document(n: usize) -> Document {
    let mut doc = Document::new();
    let body = doc.body();
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * 120.0;
            let y0 = y as f64 * 120.0;
            let card = doc.insert(Some(body), Element::new("div").with_class("product-image"));
            let _ = doc.insert(
                Some(card),
                Element::new("img")
                    .with_attr("src", "tile.jpg")
                    .with_attr("srcset", "tile.jpg 400w, tile-2x.jpg 800w")
                    .with_bounds(Rect::new(x0, y0, x0 + 100.0, y0 + 100.0)),
            );
        }
    }
    doc
}

fn start(doc: &mut Document, host: &mut ManualHost) -> Magnifier {
    Magnifier::new(
        MagnifierConfig::default(),
        &Environment::desktop(1920.0),
        doc,
        host,
    )
    .expect("desktop environment")
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        // xorshift64*
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        let v = self.0.wrapping_mul(0x2545_F491_4F6C_DD1D);
        (v >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_scan");
    for &n in &[8_usize, 32] {
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_{n}x{n}"), |b| {
            b.iter_batched(
                || (grid_document(n), ManualHost::new()),
                |(mut doc, mut host)| {
                    let m = start(&mut doc, &mut host);
                    black_box(m.registry().len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_pointer_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("pointer_move");
    for &n in &[8_usize, 32] {
        let extent = n as f64 * 120.0;
        let mut doc = grid_document(n);
        let mut host = ManualHost::new();
        let mut m = start(&mut doc, &mut host);
        let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
        let mut now = 0.0;
        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("grid_{n}x{n}"), |b| {
            b.iter(|| {
                // Advance past the throttle interval so every move scans.
                now += 17.0;
                let pt = Point::new(rng.next_f64() * extent, rng.next_f64() * extent);
                m.pointer_move(&doc, &mut host, pt, now);
                black_box(m.state());
            });
        });
        m.dispose(&mut doc, &mut host);
    }
    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let mut doc = grid_document(16);
    let mut host = ManualHost::new();
    let mut m = start(&mut doc, &mut host);
    m.pointer_move(&doc, &mut host, Point::new(50.0, 50.0), 0.0);
    group.bench_function("zooming", |b| {
        b.iter(|| {
            let id = host.take_frame().expect("frame loop keeps a frame pending");
            m.on_frame(&mut doc, &mut host, id, 0.0);
            black_box(m.presentation().center);
        });
    });
    m.dispose(&mut doc, &mut host);
    group.finish();
}

criterion_group!(benches, bench_scan, bench_pointer_moves, bench_frames);
criterion_main!(benches);
