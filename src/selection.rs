//! Text selection helpers.
//!
//! Only the first range of a selection is considered. Offsets are the host's
//! text offsets within the start and end text nodes.

use crate::location::{Location, LocationRange, LocationResolver};
use crate::ports::Dom;

/// The selected text with the text around it in the same nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionText {
    /// Text of the start node before the selection, leading whitespace trimmed.
    pub before: String,
    pub selected: String,
    /// Text of the end node after the selection, trailing whitespace trimmed.
    pub after: String,
}

/// Reads and adjusts the reader's text selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionTool {
    locations: LocationResolver,
}

impl SelectionTool {
    pub fn new(locations: LocationResolver) -> Self {
        Self { locations }
    }

    /// The current selection and its surrounding text, if anything is selected.
    pub fn text<H: Dom + ?Sized>(&self, host: &H) -> Option<SelectionText> {
        let range = host.selection()?;
        let selected = host.selected_text();
        if selected.is_empty() {
            log::debug!("[selection.text] No selection found");
            return None;
        }

        let before = host.text_slice(&range.start_node, 0, Some(range.start_offset));
        let after = host.text_slice(&range.end_node, range.end_offset, None);
        log::debug!("[selection.text] Found selection {selected}");
        Some(SelectionText {
            before: before.trim_start().to_string(),
            selected,
            after: after.trim_end().to_string(),
        })
    }

    /// Locations covered by the selection, end exclusive.
    ///
    /// Each end is attributed to the nearest tagged ancestor of its text
    /// node, so selections inside untagged inline markup (`<em>`, `<a>`)
    /// still resolve. `None` when nothing is selected or an end has no
    /// tagged ancestor.
    pub fn location_span<H: Dom + ?Sized>(&self, host: &H) -> Option<LocationRange> {
        let range = host.selection()?;
        if host.selected_text().is_empty() {
            return None;
        }
        let start = self.enclosing_location(host, &range.start_node)?;
        let end = self.enclosing_location(host, &range.end_node)?;
        let span = LocationRange::new(start, Location(end.0.saturating_add(1)));
        log::debug!("[selection.locationSpan] Selection spans locations {span}");
        Some(span)
    }

    fn enclosing_location<H: Dom + ?Sized>(&self, host: &H, node: &H::Node) -> Option<Location> {
        let mut current = host.parent_element(node);
        while let Some(element) = current {
            if let Some(location) = self.locations.location_of(host, &element) {
                return Some(location);
            }
            current = host.parent_element(&element);
        }
        None
    }

    /// Grow the selection by `start` characters on the left and `end` on the
    /// right; negative values shrink it.
    ///
    /// Returns false and leaves the selection alone when either new offset
    /// falls outside its text node or does not fit in an `i64`. When both ends share a node and the new
    /// end would precede the new start, the selection is cleared instead.
    pub fn expand_by<H: Dom + ?Sized>(&self, host: &mut H, start: i64, end: i64) -> bool {
        let Some(mut range) = host.selection() else {
            return false;
        };
        log::debug!(
            "[selection.expandBy] Current selection: {}, {} spans {}",
            range.start_offset,
            range.end_offset,
            if range.is_single_node() {
                "one container"
            } else {
                "many containers"
            }
        );

        let (Some(new_start), Some(new_end)) = (
            (range.start_offset as i64).checked_sub(start),
            (range.end_offset as i64).checked_add(end),
        ) else {
            return false;
        };
        let start_len = host.text_length(&range.start_node) as i64;
        let end_len = host.text_length(&range.end_node) as i64;
        if new_start < 0 || new_start > start_len || new_end < 0 || new_end > end_len {
            return false;
        }

        if range.is_single_node() && new_end < new_start {
            host.clear_selection();
            return true;
        }

        range.start_offset = new_start as usize;
        range.end_offset = new_end as usize;
        host.set_selection(&range);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{Rect, Size};
    use crate::sim::{NodeId, SimHost};

    fn paragraph(text: &str) -> (SimHost, NodeId) {
        let mut host = SimHost::new(Size::new(800.0, 600.0));
        let p = host.add_located(None, Location(7), Rect::new(0.0, 0.0, 100.0, 20.0));
        let t = host.add_text(p, text);
        (host, t)
    }

    fn offsets(host: &SimHost) -> Option<(usize, usize)> {
        host.selection().map(|r| (r.start_offset, r.end_offset))
    }

    #[test]
    fn test_text_with_context() {
        let (mut host, t) = paragraph("  It was a dark and stormy night.  ");
        host.select(t, 11, t, 15);
        let text = SelectionTool::default().text(&host).unwrap();
        assert_eq!(text.selected, "dark");
        assert_eq!(text.before, "It was a ");
        assert_eq!(text.after, " and stormy night.");
    }

    #[test]
    fn test_text_empty_selection() {
        let (mut host, t) = paragraph("abc");
        assert!(SelectionTool::default().text(&host).is_none());
        host.select(t, 1, t, 1);
        assert!(SelectionTool::default().text(&host).is_none());
        assert!(SelectionTool::default().location_span(&host).is_none());
    }

    #[test]
    fn test_location_span_across_elements() {
        let mut host = SimHost::new(Size::new(800.0, 600.0));
        let p1 = host.add_located(None, Location(10), Rect::new(0.0, 0.0, 100.0, 20.0));
        let t1 = host.add_text(p1, "first paragraph");
        let p2 = host.add_located(None, Location(11), Rect::new(0.0, 20.0, 100.0, 20.0));
        let t2 = host.add_text(p2, "second paragraph");
        host.select(t1, 6, t2, 6);

        let span = SelectionTool::default().location_span(&host).unwrap();
        assert_eq!(span, LocationRange::new(10, 12));
    }

    #[test]
    fn test_location_span_through_inline_markup() {
        let mut host = SimHost::new(Size::new(800.0, 600.0));
        let p = host.add_located(None, Location(4), Rect::new(0.0, 0.0, 100.0, 20.0));
        let em = host.add_element(Some(p), Rect::new(0.0, 0.0, 30.0, 20.0));
        let t = host.add_text(em, "emphasis");
        host.select(t, 0, t, 3);

        let span = SelectionTool::default().location_span(&host).unwrap();
        assert_eq!(span, LocationRange::new(4, 5));
    }

    #[test]
    fn test_location_span_without_tagged_ancestor() {
        let mut host = SimHost::new(Size::new(800.0, 600.0));
        let div = host.add_element(None, Rect::new(0.0, 0.0, 100.0, 20.0));
        let t = host.add_text(div, "untagged");
        host.select(t, 0, t, 3);
        assert!(SelectionTool::default().location_span(&host).is_none());
    }

    #[test]
    fn test_expand_selection() {
        let (mut host, t) = paragraph("abcdefghijklmnopqrst");
        host.select(t, 5, t, 10);
        let tool = SelectionTool::default();

        assert!(tool.expand_by(&mut host, 3, 3));
        assert_eq!(offsets(&host), Some((2, 13)));
    }

    #[test]
    fn test_expand_selection_out_of_bounds_is_rejected() {
        let (mut host, t) = paragraph("abcdefghijklmnopqrst");
        host.select(t, 5, t, 10);
        let tool = SelectionTool::default();

        assert!(!tool.expand_by(&mut host, 6, 0));
        assert_eq!(offsets(&host), Some((5, 10)));
        assert!(!tool.expand_by(&mut host, 0, 11));
        assert_eq!(offsets(&host), Some((5, 10)));
        // Exactly reaching both ends is fine
        assert!(tool.expand_by(&mut host, 5, 10));
        assert_eq!(offsets(&host), Some((0, 20)));
    }

    #[test]
    fn test_expand_selection_by_extreme_amounts_is_rejected() {
        let (mut host, t) = paragraph("abcdefghijklmnopqrst");
        host.select(t, 5, t, 10);
        let tool = SelectionTool::default();

        assert!(!tool.expand_by(&mut host, i64::MIN, 0));
        assert!(!tool.expand_by(&mut host, 0, i64::MAX));
        assert!(!tool.expand_by(&mut host, i64::MAX, i64::MIN));
        assert_eq!(offsets(&host), Some((5, 10)));
    }

    #[test]
    fn test_location_span_at_last_location() {
        let mut host = SimHost::new(Size::new(800.0, 600.0));
        let p = host.add_located(None, Location(i64::MAX), Rect::new(0.0, 0.0, 100.0, 20.0));
        let t = host.add_text(p, "last");
        host.select(t, 0, t, 2);

        let span = SelectionTool::default().location_span(&host).unwrap();
        assert_eq!(span, LocationRange::new(i64::MAX, i64::MAX));
    }

    #[test]
    fn test_contract_selection() {
        let (mut host, t) = paragraph("abcdefghijklmnopqrst");
        host.select(t, 5, t, 10);
        let tool = SelectionTool::default();

        assert!(tool.expand_by(&mut host, -1, -2));
        assert_eq!(offsets(&host), Some((6, 8)));
    }

    #[test]
    fn test_contract_past_itself_clears() {
        let (mut host, t) = paragraph("abcdefghijklmnopqrst");
        host.select(t, 5, t, 10);
        let tool = SelectionTool::default();

        assert!(tool.expand_by(&mut host, -4, -4));
        assert_eq!(offsets(&host), None);
    }

    #[test]
    fn test_expand_without_selection() {
        let (mut host, _) = paragraph("abc");
        assert!(!SelectionTool::default().expand_by(&mut host, 1, 1));
    }
}
