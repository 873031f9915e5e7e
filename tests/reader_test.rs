//! Reader setup, styles, fonts and selection through the public API.

use folio::ports::{Dom, Rect, Size, Viewport};
use folio::sim::{ChapterLayout, Flow, SimHost};
use folio::{
    Location, LocationRange, ParameterStore, Reader, ReaderConfig, ReaderEvent, SelectionText,
    TextDirection, Velocity,
};

fn viewport() -> Size {
    Size::new(800.0, 600.0)
}

fn reader_with(host: SimHost) -> Reader<SimHost> {
    Reader::new(host, ReaderConfig::default())
}

// ============================================================================
// Style parameters
// ============================================================================

#[test]
fn test_style_parameter_overrides_css() {
    let mut host = SimHost::new(viewport()).with_query("scale=1.2");
    host.set_stylesheet("--ereader-scale", "1.0");

    ParameterStore::new().sync_with_style(&mut host, "scale", "--ereader-scale");
    assert_eq!(host.inline_style("--ereader-scale"), Some("1.2"));
    assert_eq!(host.query_string(), "scale=1.2");
}

#[test]
fn test_css_seeds_missing_style_parameter() {
    let mut host = SimHost::new(viewport());
    host.set_stylesheet("--ereader-scale", "1.0");

    ParameterStore::new().sync_with_style(&mut host, "scale", "--ereader-scale");
    assert_eq!(host.params().get("scale"), Some("1.0"));
    assert_eq!(host.inline_style("--ereader-scale"), None);
}

#[test]
fn test_color_parameters_are_double_encoded() {
    let mut host = SimHost::new(viewport()).with_query("background=%2523101010");
    host.set_stylesheet("--ereader-foreground-color", "#eeeeee");
    let mut reader = reader_with(host);
    reader.sync_styles();

    let host = reader.host();
    assert_eq!(
        host.inline_style("--ereader-background-color"),
        Some("#101010")
    );
    assert_eq!(host.params().get("foreground"), Some("%23eeeeee"));
    assert!(host.query_string().contains("foreground=%2523eeeeee"));
}

// ============================================================================
// Setup
// ============================================================================

#[test]
fn test_setup_detects_direction() {
    let cases = [
        (Flow::LeftToRight, Velocity::LEFT_TO_RIGHT, TextDirection::Ltr),
        (Flow::RightToLeft, Velocity::RIGHT_TO_LEFT, TextDirection::Rtl),
        (Flow::Vertical, Velocity::TOP_TO_BOTTOM, TextDirection::Rtl),
    ];
    for (flow, velocity, direction) in cases {
        let layout = ChapterLayout::new(0..20, 10).flow(flow);
        let mut reader = reader_with(SimHost::chapter(viewport(), &layout));
        reader.setup();
        assert_eq!(reader.pages().velocity(), velocity, "{flow:?}");
        assert_eq!(reader.text_direction(), direction, "{flow:?}");
    }
}

#[test]
fn test_setup_updates_existing_viewport_meta() {
    let mut host = SimHost::new(viewport());
    host.upsert_meta("viewport", "width=400");
    let mut reader = reader_with(host);
    reader.setup();
    assert_eq!(
        reader.host().meta("viewport"),
        Some("width=device-width, initial-scale=1.0, height=device-height")
    );
}

#[test]
fn test_setup_requests_missing_fonts() {
    let mut host = SimHost::new(viewport()).with_query("fonts=Literata%252C%2520Bitter");
    host.install_font("Literata");
    let mut reader = reader_with(host);

    assert_eq!(reader.setup(), ["Bitter"]);
    assert_eq!(
        reader.host().inline_style("--ereader-fonts"),
        Some("Literata, Bitter")
    );
}

#[test]
fn test_custom_page_keys() {
    let mut config = ReaderConfig::default();
    config.keys.next = "KeyJ".into();
    config.keys.previous = "KeyK".into();
    let host = SimHost::chapter(viewport(), &ChapterLayout::new(0..30, 10));
    let mut reader = Reader::new(host, config);

    let key = |code: &str| ReaderEvent::KeyDown { code: code.into() };
    assert!(reader.handle(key("KeyJ")).unwrap().turn.is_some());
    assert_eq!(reader.current_page(), 1);
    assert!(reader.handle(key("BracketRight")).unwrap().turn.is_none());
    assert_eq!(reader.current_page(), 1);
    reader.handle(key("KeyK")).unwrap();
    assert_eq!(reader.current_page(), 0);
}

#[test]
fn test_pointer_up_snaps_to_page() {
    let layout = ChapterLayout::new(0..40, 10);
    let mut reader = reader_with(SimHost::chapter(viewport(), &layout));
    reader.host_mut().scroll_to(1300.0, 0.0);

    reader.handle(ReaderEvent::PointerUp).unwrap();
    assert_eq!(reader.current_page(), 2);
    assert_eq!(reader.current_location().unwrap(), Location(20));
    assert_eq!(reader.host().params().location(), Some("20"));
}

// ============================================================================
// Selection
// ============================================================================

fn paragraph(text: &str) -> (Reader<SimHost>, folio::sim::NodeId) {
    let mut host = SimHost::new(viewport());
    let p = host.add_located(None, Location(7), Rect::new(0.0, 0.0, 400.0, 20.0));
    let node = host.add_text(p, text);
    (reader_with(host), node)
}

#[test]
fn test_expand_selection() {
    let (mut reader, text) = paragraph("The quick brown fox");
    reader.host_mut().select(text, 5, text, 10);

    assert!(reader.expand_selection_by(3, 3));
    let range = reader.host().selection().unwrap();
    assert_eq!((range.start_offset, range.end_offset), (2, 13));

    assert!(!reader.expand_selection_by(6, 0));
    let range = reader.host().selection().unwrap();
    assert_eq!((range.start_offset, range.end_offset), (2, 13));
}

#[test]
fn test_shrinking_past_empty_clears_selection() {
    let (mut reader, text) = paragraph("The quick brown fox");
    reader.host_mut().select(text, 4, text, 9);
    assert!(reader.expand_selection_by(-3, -3));
    assert_eq!(reader.host().selection(), None);
}

#[test]
fn test_selection_text_and_span() {
    let (mut reader, text) = paragraph("  The quick brown fox  ");
    reader.host_mut().select(text, 6, text, 11);

    assert_eq!(
        reader.selection_text(),
        Some(SelectionText {
            before: "The ".into(),
            selected: "quick".into(),
            after: " brown fox".into(),
        })
    );
    assert_eq!(reader.selection_span(), Some(LocationRange::new(7, 8)));
}

#[test]
fn test_no_selection() {
    let (reader, _) = paragraph("The quick brown fox");
    assert_eq!(reader.selection_text(), None);
    assert_eq!(reader.selection_span(), None);
}
