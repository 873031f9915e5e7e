//! The reader: one chapter document, its host, and the components over it.
//!
//! A [`Reader`] is built once per chapter load and dropped on navigation.
//! Hosts call [`Reader::setup`] as soon as the script runs, then deliver
//! every event listed in [`Reader::SUBSCRIPTIONS`] to [`Reader::handle`].

use std::fmt;

use crate::config::{LOCATION_PARAM, ReaderConfig};
use crate::error::Result;
use crate::fonts::load_fonts;
use crate::location::{Location, LocationJump, LocationRange, LocationResolver};
use crate::page::{PageModel, PageTurn, Velocity};
use crate::params::ParameterStore;
use crate::ports::{Dom, Host, Viewport};
use crate::selection::{SelectionText, SelectionTool};

/// Whether an element is rendered and lies entirely inside the viewport.
///
/// Elements that merely intersect the viewport do not count.
pub fn element_visible<H: Dom + Viewport + ?Sized>(host: &H, node: &H::Node) -> bool {
    if host.computed_style(node, "display") == "none"
        || host.computed_style(node, "visibility") == "hidden"
    {
        return false;
    }
    host.bounding_rect(node).fits_within(host.viewport_size())
}

/// Computed `writing-mode` of the root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingMode {
    HorizontalTb,
    VerticalRl,
    VerticalLr,
}

impl WritingMode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "vertical-rl" => WritingMode::VerticalRl,
            "vertical-lr" => WritingMode::VerticalLr,
            _ => WritingMode::HorizontalTb,
        }
    }

    pub fn is_vertical(self) -> bool {
        !matches!(self, WritingMode::HorizontalTb)
    }
}

/// Horizontal direction text runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

impl fmt::Display for TextDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn writing_mode<H: Viewport + ?Sized>(host: &H) -> WritingMode {
    WritingMode::parse(&host.root_style("writing-mode"))
}

/// Horizontal text direction: vertical-rl reads right to left, vertical-lr
/// left to right, horizontal text follows the `direction` property.
pub fn text_direction<H: Viewport + ?Sized>(host: &H) -> TextDirection {
    let mode = writing_mode(host);
    let direction = match mode {
        WritingMode::VerticalRl => TextDirection::Rtl,
        WritingMode::VerticalLr => TextDirection::Ltr,
        WritingMode::HorizontalTb => {
            if host.root_style("direction").trim() == "rtl" {
                TextDirection::Rtl
            } else {
                TextDirection::Ltr
            }
        }
    };
    log::debug!("[reader.textDirection] Writing mode is {mode:?}, horizontal direction is {direction}");
    direction
}

/// Kinds of host events a reader listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Load,
    PointerUp,
    Resize,
    KeyDown,
    Wheel,
}

impl EventKind {
    /// DOM event type to subscribe to.
    pub fn dom_type(self) -> &'static str {
        match self {
            EventKind::Load => "load",
            EventKind::PointerUp => "mouseup",
            EventKind::Resize => "resize",
            EventKind::KeyDown => "keydown",
            EventKind::Wheel => "wheel",
        }
    }

    /// Whether the listener must be able to cancel the default action.
    pub fn cancelable(self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::Wheel)
    }
}

/// An event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    Load,
    PointerUp,
    Resize,
    /// `code` is the `KeyboardEvent.code` value.
    KeyDown { code: String },
    Wheel,
}

impl ReaderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ReaderEvent::Load => EventKind::Load,
            ReaderEvent::PointerUp => EventKind::PointerUp,
            ReaderEvent::Resize => EventKind::Resize,
            ReaderEvent::KeyDown { .. } => EventKind::KeyDown,
            ReaderEvent::Wheel => EventKind::Wheel,
        }
    }
}

/// What a handled event did, and what the host should do with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventResponse {
    /// Cancel the browser's default action.
    pub prevent_default: bool,
    /// Set when the event turned a page.
    pub turn: Option<PageTurn>,
    /// Set when the event positioned the chapter on load.
    pub jump: Option<LocationJump>,
}

/// A loaded chapter and everything driving it.
pub struct Reader<H: Host> {
    host: H,
    config: ReaderConfig,
    params: ParameterStore,
    locations: LocationResolver,
    pages: PageModel,
    selection: SelectionTool,
}

impl<H: Host> Reader<H> {
    /// Events a host must deliver to [`handle`](Self::handle).
    pub const SUBSCRIPTIONS: &'static [EventKind] = &[
        EventKind::Load,
        EventKind::PointerUp,
        EventKind::Resize,
        EventKind::Wheel,
        EventKind::KeyDown,
    ];

    pub fn new(host: H, config: ReaderConfig) -> Self {
        let locations = LocationResolver::new(config.attributes.clone());
        let pages = PageModel::new(config.attributes.clone());
        let selection = SelectionTool::new(locations.clone());
        log::debug!("[reader] Instantiated page, location, parameter and selection components");
        Self {
            host,
            config,
            params: ParameterStore::new(),
            locations,
            pages,
            selection,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn pages(&self) -> &PageModel {
        &self.pages
    }

    pub fn locations(&self) -> &LocationResolver {
        &self.locations
    }

    /// Everything that can run before the document has finished loading:
    /// styles, viewport meta tag, page direction, fonts.
    ///
    /// Returns the font families requested from the web font service.
    pub fn setup(&mut self) -> Vec<String> {
        log::debug!("[reader.setup] Loading page");
        self.sync_styles();
        self.set_meta_viewport();
        self.apply_direction();
        load_fonts(&mut self.host, &self.params, &self.config.fonts)
    }

    /// Sync every configured style parameter with its CSS custom property.
    pub fn sync_styles(&mut self) {
        for binding in &self.config.styles {
            log::debug!("[reader.syncStyles] Syncing {}", binding.param);
            self.params
                .sync_with_style(&mut self.host, &binding.param, &binding.css_var);
        }
    }

    pub fn set_meta_viewport(&mut self) {
        if self.host.upsert_meta("viewport", &self.config.viewport_meta) {
            log::debug!("[reader.setMetaViewport] Created new viewport element");
        } else {
            log::debug!("[reader.setMetaViewport] Updated existing viewport element");
        }
    }

    /// Point the page velocity along the text flow.
    ///
    /// Vertical text always pages downward, whichever way its lines run;
    /// horizontal right-to-left text pages leftward.
    pub fn apply_direction(&mut self) -> Velocity {
        let mode = writing_mode(&self.host);
        if mode.is_vertical() {
            self.pages.set_velocity(0, 1);
            self.host
                .set_root_attribute(&self.config.attributes.is_vertical, "true");
            log::debug!("[reader.applyDirection] Using vertical text direction");
        } else if text_direction(&self.host) == TextDirection::Rtl {
            self.pages.set_velocity(-1, 0);
            log::debug!("[reader.applyDirection] Using RTL text direction");
        } else {
            self.pages.set_velocity(1, 0);
            log::debug!("[reader.applyDirection] Leaving text direction as default");
        }
        self.pages.velocity()
    }

    /// Position the chapter at the requested location once it has rendered.
    ///
    /// Without a usable location parameter the chapter opens at its first
    /// page. The location finally on screen is written back to the URL.
    pub fn on_load(&mut self) -> Result<LocationJump> {
        let params = self.params.get(&self.host);
        let requested = params.get(LOCATION_PARAM).and_then(Location::parse_lenient);

        if let Some(location) = requested {
            let jump = self.locations.jump_to(&mut self.host, &self.pages, location)?;
            if matches!(jump, LocationJump::Redirected { .. }) {
                return Ok(jump);
            }
        } else {
            self.pages.jump_to_page(&mut self.host, 0)?;
        }

        let location = self.locations.current(&self.host)?;
        log::debug!("[reader.onLoad] Set location to {location}");
        self.params.sync_location(&mut self.host, location);
        Ok(LocationJump::Arrived(location))
    }

    /// Dispatch one host event.
    pub fn handle(&mut self, event: ReaderEvent) -> Result<EventResponse> {
        let mut response = EventResponse::default();
        match event {
            ReaderEvent::Load => {
                response.jump = Some(self.on_load()?);
            }
            ReaderEvent::PointerUp | ReaderEvent::Resize => {
                self.snap_to_nearest()?;
            }
            ReaderEvent::Wheel => {
                response.prevent_default = true;
            }
            ReaderEvent::KeyDown { code } => {
                let keys = &self.config.keys;
                let quantity = if code == keys.next {
                    Some(1)
                } else if code == keys.previous {
                    Some(-1)
                } else {
                    None
                };
                response.prevent_default = keys.suppressed.iter().any(|k| *k == code);
                if let Some(quantity) = quantity {
                    response.turn = Some(self.turn_pages(quantity)?);
                }
            }
        }
        Ok(response)
    }

    pub fn current_location(&self) -> Result<Location> {
        self.locations.current(&self.host)
    }

    pub fn current_page(&self) -> usize {
        self.pages.current_page(&self.host)
    }

    pub fn page_count(&self) -> usize {
        self.pages.page_count(&self.host)
    }

    pub fn bounds(&self) -> Result<LocationRange> {
        self.locations.bounds(&self.host)
    }

    pub fn text_direction(&self) -> TextDirection {
        text_direction(&self.host)
    }

    pub fn turn_pages(&mut self, quantity: i64) -> Result<PageTurn> {
        self.pages.increment_by(&mut self.host, quantity)
    }

    pub fn jump_to_page(&mut self, page: i64) -> Result<usize> {
        self.pages.jump_to_page(&mut self.host, page)
    }

    pub fn jump_to_location(&mut self, location: Location) -> Result<LocationJump> {
        self.locations.jump_to(&mut self.host, &self.pages, location)
    }

    pub fn snap_to_nearest(&mut self) -> Result<Location> {
        self.pages.snap_to_nearest(&mut self.host)
    }

    pub fn selection_text(&self) -> Option<SelectionText> {
        self.selection.text(&self.host)
    }

    pub fn selection_span(&self) -> Option<LocationRange> {
        self.selection.location_span(&self.host)
    }

    pub fn expand_selection_by(&mut self, start: i64, end: i64) -> bool {
        self.selection.expand_by(&mut self.host, start, end)
    }
}
