//! Host interfaces the engine is driven through.
//!
//! The engine never touches a browser directly. Scroll geometry, the URL,
//! the document tree and font measurement are all reached through the
//! traits in this module, so the same code runs against a real window
//! (see the `wasm` module) or against the in-memory [`sim`](crate::sim) host.
//!
//! All offsets are CSS pixels. Text offsets are in whatever unit the host's
//! text nodes use; the engine only does arithmetic on them and hands them
//! back through [`Dom::text_slice`] and [`Dom::set_selection`].

use std::fmt::Debug;

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero or negative.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A bounding box relative to the viewport, as `getBoundingClientRect` reports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Whether the whole box lies inside `[0, width] x [0, height]`.
    pub fn fits_within(&self, viewport: Size) -> bool {
        self.top >= 0.0
            && self.left >= 0.0
            && self.bottom <= viewport.height
            && self.right <= viewport.width
    }
}

/// A single contiguous selection range between two text nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRange<N> {
    pub start_node: N,
    pub start_offset: usize,
    pub end_node: N,
    pub end_offset: usize,
}

impl<N: PartialEq> SelectionRange<N> {
    /// Whether both ends sit in the same text node.
    pub fn is_single_node(&self) -> bool {
        self.start_node == self.end_node
    }
}

/// Scroll state and root style of the window showing the chapter.
pub trait Viewport {
    /// Current `(scrollX, scrollY)`.
    fn scroll_position(&self) -> (f64, f64);

    fn scroll_to(&mut self, left: f64, top: f64);

    /// Inner size of the window.
    fn viewport_size(&self) -> Size;

    /// Scroll extents of the document element.
    fn document_size(&self) -> Size;

    /// Computed value of a property (or custom property) on the root element.
    fn root_style(&self, property: &str) -> String;

    /// Set an inline style property on the root element.
    fn set_root_style(&mut self, property: &str, value: &str);
}

/// The page URL and navigation.
pub trait History {
    /// Query string of the current URL, with or without the leading `?`.
    fn query(&self) -> String;

    /// Replace the query string without reloading or adding a history entry.
    fn replace_query(&mut self, query: &str);

    /// Replace the current document with `url` (relative to the chapter).
    fn navigate(&mut self, url: &str);

    /// Show a blocking message to the reader.
    fn alert(&mut self, message: &str);
}

/// Read access to the chapter document tree, plus the selection.
pub trait Dom {
    /// Handle to an element or text node.
    type Node: Clone + PartialEq + Debug;

    fn root_attribute(&self, name: &str) -> Option<String>;

    fn set_root_attribute(&mut self, name: &str, value: &str);

    /// All elements carrying `name`, in document order.
    fn elements_with_attribute(&self, name: &str) -> Vec<Self::Node>;

    /// First element whose `name` attribute equals `value`.
    fn element_with_attribute_value(&self, name: &str, value: &str) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Computed style property of an element.
    fn computed_style(&self, node: &Self::Node, property: &str) -> String;

    fn bounding_rect(&self, node: &Self::Node) -> Rect;

    /// Scroll so the element is centered on both axes.
    fn scroll_into_view(&mut self, node: &Self::Node);

    /// Length of a text node in offset units.
    fn text_length(&self, node: &Self::Node) -> usize;

    /// Text of a node between two offsets; `None` means to the end.
    fn text_slice(&self, node: &Self::Node, start: usize, end: Option<usize>) -> String;

    /// The first range of the current selection, if any.
    fn selection(&self) -> Option<SelectionRange<Self::Node>>;

    /// The selection as plain text.
    fn selected_text(&self) -> String;

    fn set_selection(&mut self, range: &SelectionRange<Self::Node>);

    fn clear_selection(&mut self);

    /// Update or insert `<meta name=.. content=..>` in the head.
    /// Returns true when a new element was created.
    fn upsert_meta(&mut self, name: &str, content: &str) -> bool;
}

/// Font measurement and the external web font service.
pub trait FontHost {
    /// Width of `text` rendered with the CSS font shorthand `font`.
    fn measure_text(&self, font: &str, text: &str) -> f64;

    /// Ask the web font service to load `family`.
    fn request_web_font(&mut self, family: &str);
}

/// Everything a [`Reader`](crate::Reader) needs from its environment.
pub trait Host: Viewport + History + Dom + FontHost {}

impl<T: Viewport + History + Dom + FontHost> Host for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_fits_within() {
        let viewport = Size::new(800.0, 600.0);
        assert!(Rect::new(0.0, 0.0, 800.0, 600.0).fits_within(viewport));
        assert!(Rect::new(10.0, 10.0, 50.0, 20.0).fits_within(viewport));
        // Partially visible boxes do not count
        assert!(!Rect::new(-1.0, 10.0, 50.0, 20.0).fits_within(viewport));
        assert!(!Rect::new(790.0, 10.0, 50.0, 20.0).fits_within(viewport));
        assert!(!Rect::new(10.0, 590.0, 50.0, 20.0).fits_within(viewport));
    }

    #[test]
    fn test_size_degenerate() {
        assert!(Size::new(0.0, 600.0).is_degenerate());
        assert!(Size::default().is_degenerate());
        assert!(!Size::new(1.0, 1.0).is_degenerate());
    }
}
