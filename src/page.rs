//! Page-granular scrolling.
//!
//! A chapter is rendered as one long strip, cut into viewport-sized pages
//! along the axis text flows on. The [`Velocity`] says which axis that is
//! and which sign moves forward; the [`PageModel`] converts the window's
//! scroll offset to a page number and back, and turns pages across chapter
//! boundaries.
//!
//! Page numbers depend on font, zoom and window size, so they are never
//! stored. Everything persisted goes through locations instead.

use crate::config::Attributes;
use crate::error::{Error, Result};
use crate::location::{Location, LocationResolver};
use crate::params::ParameterStore;
use crate::ports::{Host, Viewport};

/// Axis multipliers for one page of forward movement.
///
/// Each component is clamped to `-1..=1`. Horizontal left-to-right text is
/// `(1, 0)`, right-to-left text `(-1, 0)`, vertical text `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Velocity {
    pub dx: i8,
    pub dy: i8,
}

impl Velocity {
    pub const LEFT_TO_RIGHT: Velocity = Velocity { dx: 1, dy: 0 };
    pub const RIGHT_TO_LEFT: Velocity = Velocity { dx: -1, dy: 0 };
    pub const TOP_TO_BOTTOM: Velocity = Velocity { dx: 0, dy: 1 };

    pub fn new(x: i64, y: i64) -> Self {
        Self {
            dx: x.clamp(-1, 1) as i8,
            dy: y.clamp(-1, 1) as i8,
        }
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Self::LEFT_TO_RIGHT
    }
}

/// Result of turning pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTurn {
    /// Stayed in this chapter; the location now on screen.
    Moved(Location),
    /// Crossed into a neighbouring chapter; the host is navigating there.
    ChapterChange { target: String },
    /// Already on the last page of the book.
    AtBookEnd,
    /// Already on the first page of the book.
    AtBookStart,
}

impl PageTurn {
    /// The legacy integer form: `-1` for end of book, `-2` for start of book.
    pub fn sentinel(&self) -> Option<i64> {
        match self {
            PageTurn::AtBookEnd => Some(-1),
            PageTurn::AtBookStart => Some(-2),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            PageTurn::Moved(location) => Some(*location),
            _ => None,
        }
    }
}

/// Converts between scroll offsets, page numbers and locations.
#[derive(Debug, Clone, Default)]
pub struct PageModel {
    velocity: Velocity,
    locations: LocationResolver,
    params: ParameterStore,
}

impl PageModel {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            velocity: Velocity::default(),
            locations: LocationResolver::new(attributes),
            params: ParameterStore::new(),
        }
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Set the direction pages advance in; components are clamped.
    pub fn set_velocity(&mut self, x: i64, y: i64) {
        self.velocity = Velocity::new(x, y);
        log::debug!(
            "[page.setVelocity] Set page velocity to x = {} and y = {}",
            self.velocity.dx,
            self.velocity.dy
        );
    }

    /// Number of pages the chapter spans at the current window size.
    pub fn page_count<H: Viewport + ?Sized>(&self, host: &H) -> usize {
        let view = host.viewport_size();
        if view.is_degenerate() {
            return 0;
        }
        let doc = host.document_size();
        let count = (doc.height / view.height).max(doc.width / view.width).ceil();
        if count.is_finite() && count > 0.0 {
            count as usize
        } else {
            0
        }
    }

    /// The page currently scrolled to.
    ///
    /// Only the axis the velocity selects contributes; the result is
    /// rounded and clamped into `[0, page_count - 1]`.
    pub fn current_page<H: Viewport + ?Sized>(&self, host: &H) -> usize {
        let view = host.viewport_size();
        if view.is_degenerate() {
            return 0;
        }
        let (x, y) = host.scroll_position();
        let horizontal = x * f64::from(self.velocity.dx) / view.width;
        let vertical = y * f64::from(self.velocity.dy) / view.height;
        let last = self.page_count(host).saturating_sub(1) as f64;
        let page = (horizontal + vertical).round().min(last).max(0.0);
        log::debug!("[page.current] Currently on page {page}");
        page as usize
    }

    /// Scroll to `page` and record the resulting location in the URL.
    ///
    /// The page is not clamped here; the host clamps the scroll offset and
    /// [`current_page`](Self::current_page) clamps the reading.
    pub fn jump_to_page<H: Host + ?Sized>(&self, host: &mut H, page: i64) -> Result<usize> {
        let view = host.viewport_size();
        let page_f = page as f64;
        host.scroll_to(
            page_f * view.width * f64::from(self.velocity.dx),
            page_f * view.height * f64::from(self.velocity.dy),
        );
        log::debug!("[page.jumpToPage] Attempted to jump to page {page}, results may vary");

        match self.locations.current(host) {
            Ok(location) => {
                self.params.sync_location(host, location);
                log::debug!("[page.jumpToPage] Updated URL parameter");
            }
            Err(Error::NoLocations) => {
                log::warn!("[page.jumpToPage] Chapter has no locations, URL left unchanged");
            }
            Err(e) => return Err(e),
        }

        Ok(self.current_page(host))
    }

    /// Settle exactly on a page boundary after free scrolling.
    pub fn snap_to_nearest<H: Host + ?Sized>(&self, host: &mut H) -> Result<Location> {
        log::debug!("[page.snapToNearest] Snapping to the nearest page");
        self.increment_by(host, 0)?;
        self.locations.current(host)
    }

    /// Turn `quantity` pages, crossing into the next or previous chapter
    /// when this one runs out.
    ///
    /// How many pages are actually turned is not guaranteed: a chapter
    /// change always lands on the neighbour's first (or last) location.
    pub fn increment_by<H: Host + ?Sized>(&self, host: &mut H, quantity: i64) -> Result<PageTurn> {
        log::debug!("[page.incrementBy] Flipping by {quantity} pages");
        let before = self.current_page(host);
        self.jump_to_page(host, (before as i64).saturating_add(quantity))?;
        let after = self.current_page(host);

        if before != after || quantity == 0 {
            return Ok(PageTurn::Moved(self.locations.current(host)?));
        }

        let attributes = self.locations.attributes();
        let forward = quantity > 0;
        let link = if forward {
            &attributes.next
        } else {
            &attributes.previous
        };
        let Some(destination) = host.root_attribute(link) else {
            log::info!(
                "[page.incrementBy] No {} chapter, staying put",
                if forward { "next" } else { "previous" }
            );
            return Ok(if forward {
                PageTurn::AtBookEnd
            } else {
                PageTurn::AtBookStart
            });
        };

        let bounds = self.locations.bounds(host)?;
        let landing = if forward {
            bounds.end
        } else {
            Location(bounds.start.0.saturating_sub(1))
        };

        let mut params = self.params.get(host);
        params.set_location(landing);
        let target = params.url_for(&destination);
        log::debug!("[page.incrementBy] Going to chapter {target}");
        host.navigate(&target);
        Ok(PageTurn::ChapterChange { target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Size;
    use crate::sim::{ChapterLayout, Flow, SimHost};

    fn host(layout: ChapterLayout) -> SimHost {
        SimHost::chapter(Size::new(800.0, 600.0), &layout)
    }

    fn model_for(flow: Flow) -> PageModel {
        let mut model = PageModel::default();
        let v = flow.velocity();
        model.set_velocity(v.dx.into(), v.dy.into());
        model
    }

    #[test]
    fn test_velocity_clamps() {
        assert_eq!(Velocity::new(5, -9), Velocity { dx: 1, dy: -1 });
        assert_eq!(Velocity::new(0, 1), Velocity::TOP_TO_BOTTOM);
        assert_eq!(Velocity::default(), Velocity::LEFT_TO_RIGHT);

        let mut model = PageModel::default();
        model.set_velocity(-3, 0);
        assert_eq!(model.velocity(), Velocity::RIGHT_TO_LEFT);
    }

    #[test]
    fn test_page_count() {
        let host = host(ChapterLayout::new(0..45, 10));
        assert_eq!(PageModel::default().page_count(&host), 5);
    }

    #[test]
    fn test_page_count_degenerate_viewport() {
        let host = SimHost::new(Size::new(0.0, 0.0));
        assert_eq!(PageModel::default().page_count(&host), 0);
        assert_eq!(PageModel::default().current_page(&host), 0);
    }

    #[test]
    fn test_current_page_rounds_to_nearest() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();
        host.scroll_to(1190.0, 0.0);
        assert_eq!(model.current_page(&host), 1);
        host.scroll_to(1210.0, 0.0);
        assert_eq!(model.current_page(&host), 2);
    }

    #[test]
    fn test_current_page_ignores_inactive_axis() {
        let mut host = host(ChapterLayout::new(0..50, 10).flow(Flow::Vertical));
        let model = PageModel::default();
        // Horizontal velocity, vertical scroll: still page 0
        host.scroll_to(0.0, 1800.0);
        assert_eq!(model.current_page(&host), 0);
        assert_eq!(model_for(Flow::Vertical).current_page(&host), 3);
    }

    #[test]
    fn test_jump_to_page_and_back() {
        for flow in [Flow::LeftToRight, Flow::RightToLeft, Flow::Vertical] {
            let mut host = host(ChapterLayout::new(0..50, 10).flow(flow));
            let model = model_for(flow);
            for page in 0..5 {
                assert_eq!(model.jump_to_page(&mut host, page).unwrap(), page as usize);
                assert_eq!(model.current_page(&host), page as usize, "{flow:?}");
                assert_eq!(
                    host.params().location(),
                    Some((page * 10).to_string().as_str())
                );
            }
        }
    }

    #[test]
    fn test_jump_past_last_page_is_clamped_by_reading() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();
        assert_eq!(model.jump_to_page(&mut host, 12).unwrap(), 4);
        assert_eq!(model.jump_to_page(&mut host, -3).unwrap(), 0);
    }

    #[test]
    fn test_snap_settles_on_boundary() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();
        host.scroll_to(1700.0, 0.0);
        assert_eq!(model.snap_to_nearest(&mut host).unwrap(), Location(20));
        assert_eq!(host.scroll_position(), (1600.0, 0.0));
    }

    #[test]
    fn test_increment_within_chapter() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();
        assert_eq!(model.increment_by(&mut host, 1).unwrap(), PageTurn::Moved(Location(10)));
        assert_eq!(model.increment_by(&mut host, 2).unwrap(), PageTurn::Moved(Location(30)));
        assert_eq!(model.increment_by(&mut host, -1).unwrap(), PageTurn::Moved(Location(20)));
        assert!(host.navigations().is_empty());
    }

    #[test]
    fn test_increment_zero_is_pure_snap() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();
        model.jump_to_page(&mut host, 4).unwrap();
        assert_eq!(model.increment_by(&mut host, 0).unwrap(), PageTurn::Moved(Location(40)));
        assert_eq!(model.current_page(&host), 4);
        assert!(host.navigations().is_empty());
    }

    #[test]
    fn test_increment_crosses_to_next_chapter() {
        let mut host = host(ChapterLayout::new(100..150, 10).next("ch3.html"))
            .with_query("location=140&scale=1.2");
        let model = PageModel::default();
        model.jump_to_page(&mut host, 4).unwrap();

        let turn = model.increment_by(&mut host, 1).unwrap();
        let target = "ch3.html?location=150&scale=1.2".to_string();
        assert_eq!(turn, PageTurn::ChapterChange { target: target.clone() });
        assert_eq!(host.navigations(), [target]);
    }

    #[test]
    fn test_increment_crosses_to_previous_chapter() {
        let mut host = host(ChapterLayout::new(100..150, 10).previous("ch1.html"));
        let model = PageModel::default();

        let turn = model.increment_by(&mut host, -1).unwrap();
        assert_eq!(
            turn,
            PageTurn::ChapterChange {
                target: "ch1.html?location=99".into()
            }
        );
    }

    #[test]
    fn test_increment_at_book_end() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();
        model.jump_to_page(&mut host, 4).unwrap();

        let turn = model.increment_by(&mut host, 1).unwrap();
        assert_eq!(turn, PageTurn::AtBookEnd);
        assert_eq!(turn.sentinel(), Some(-1));
        assert!(host.navigations().is_empty());
        assert_eq!(model.current_page(&host), 4);
    }

    #[test]
    fn test_increment_at_book_start() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();

        let turn = model.increment_by(&mut host, -1).unwrap();
        assert_eq!(turn, PageTurn::AtBookStart);
        assert_eq!(turn.sentinel(), Some(-2));
        assert!(host.navigations().is_empty());
    }

    #[test]
    fn test_increment_by_extreme_quantities() {
        let mut host = host(ChapterLayout::new(0..50, 10));
        let model = PageModel::default();
        model.jump_to_page(&mut host, 1).unwrap();

        assert_eq!(model.increment_by(&mut host, i64::MAX).unwrap(), PageTurn::Moved(Location(40)));
        assert_eq!(model.increment_by(&mut host, i64::MAX).unwrap(), PageTurn::AtBookEnd);
        assert_eq!(model.increment_by(&mut host, i64::MIN).unwrap(), PageTurn::Moved(Location(0)));
        assert_eq!(model.increment_by(&mut host, i64::MIN).unwrap(), PageTurn::AtBookStart);
    }

    #[test]
    fn test_jump_to_page_without_locations_keeps_url() {
        let mut host = SimHost::new(Size::new(800.0, 600.0)).with_query("scale=2");
        let model = PageModel::default();
        assert_eq!(model.jump_to_page(&mut host, 0).unwrap(), 0);
        assert_eq!(host.query_string(), "scale=2");
    }
}
