//! Benchmarks for location and page navigation.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use folio::ports::Size;
use folio::sim::{ChapterLayout, SimHost};
use folio::{
    Attributes, ChapterEntry, ChapterIndex, Location, ParameterSet, Reader, ReaderConfig,
    scan_chapter,
};

const VIEWPORT: Size = Size {
    width: 1024.0,
    height: 768.0,
};

fn long_chapter() -> ChapterLayout {
    ChapterLayout::new(10_000..15_000, 25)
        .next("ch3.html")
        .previous("ch1.html")
}

fn chapter_html(count: i64) -> String {
    let mut html = format!(
        r#"<html data-ereader__location_start="0" data-ereader__location_end="{count}"><body>"#
    );
    for location in 0..count {
        html.push_str(&format!(
            r#"<p data-ereader__location="{location}">Paragraph {location}<br>with a break.</p>"#
        ));
    }
    html.push_str("</body></html>");
    html
}

// ============================================================================
// Location Benchmarks
// ============================================================================

fn bench_current_location(c: &mut Criterion) {
    let host = SimHost::chapter(VIEWPORT, &long_chapter());
    let reader = Reader::new(host, ReaderConfig::default());
    c.bench_function("current_location", |b| {
        b.iter(|| reader.current_location().unwrap());
    });
}

fn bench_jump_to_location(c: &mut Criterion) {
    let host = SimHost::chapter(VIEWPORT, &long_chapter());
    let mut reader = Reader::new(host, ReaderConfig::default());
    c.bench_function("jump_to_location", |b| {
        b.iter(|| reader.jump_to_location(Location(14_321)).unwrap());
    });
}

// ============================================================================
// Page Benchmarks
// ============================================================================

fn bench_turn_pages(c: &mut Criterion) {
    let host = SimHost::chapter(VIEWPORT, &long_chapter());
    let mut reader = Reader::new(host, ReaderConfig::default());
    c.bench_function("turn_pages", |b| {
        b.iter(|| {
            reader.jump_to_page(0).unwrap();
            for _ in 0..10 {
                reader.turn_pages(1).unwrap();
            }
        });
    });
}

// ============================================================================
// Index Benchmarks
// ============================================================================

fn bench_index_resolve(c: &mut Criterion) {
    let chapters = (0..500)
        .map(|i| ChapterEntry::new(format!("ch{i}.html"), i * 100, (i + 1) * 100))
        .collect();
    let index = ChapterIndex::new(chapters);
    let params = ParameterSet::parse("background=%2523fff&scale=1.2&location=42424");
    c.bench_function("index_resolve", |b| {
        b.iter(|| index.resolve(&params).unwrap());
    });
}

fn bench_scan_chapter(c: &mut Criterion) {
    let html = chapter_html(5_000);
    let attributes = Attributes::default();
    c.bench_function("scan_chapter", |b| {
        b.iter(|| scan_chapter(&html, &attributes).unwrap());
    });
}

criterion_group!(
    benches,
    bench_current_location,
    bench_jump_to_location,
    bench_turn_pages,
    bench_index_resolve,
    bench_scan_chapter,
);
criterion_main!(benches);
