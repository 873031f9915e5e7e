//! WASM bindings running the reader inside a browser window.
//!
//! [`WebHost`] implements the host ports over `web-sys`. A chapter document
//! calls [`start_chapter`] from its script tag; the index document calls
//! [`index_main`].

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use log::{Level, LevelFilter, Metadata, Record};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, Element,
    Event, HtmlCanvasElement, HtmlElement, HtmlScriptElement, KeyboardEvent, Node, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition, ScrollToOptions, Window, console,
};

use crate::config::ReaderConfig;
use crate::fonts::{FontRequest, WebFontQueue};
use crate::index::redirect_from_index;
use crate::location::{Location, LocationJump};
use crate::page::PageTurn;
use crate::ports::{Dom, FontHost, History, Rect, SelectionRange, Size, Viewport};
use crate::reader::{EventKind, Reader, ReaderEvent};

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&record.args().to_string());
        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::info_1(&message),
            Level::Debug | Level::Trace => console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn js_error(e: crate::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

/// Change the console log level (`"error"` through `"trace"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter: LevelFilter = level
        .parse()
        .map_err(|_| JsValue::from_str(&format!("unknown log level {level:?}")))?;
    log::set_max_level(filter);
    Ok(())
}

/// A browser window showing one document.
pub struct WebHost {
    window: Window,
    document: Document,
    font_loader_url: String,
    fonts: Rc<RefCell<WebFontQueue>>,
}

impl WebHost {
    pub fn new(font_loader_url: impl Into<String>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            window,
            document,
            font_loader_url: font_loader_url.into(),
            fonts: Rc::default(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn root(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn root_html(&self) -> Option<HtmlElement> {
        self.root()?.dyn_into::<HtmlElement>().ok()
    }

    fn canvas_context(&self) -> Result<CanvasRenderingContext2d, JsValue> {
        let canvas: HtmlCanvasElement = self.document.create_element("canvas")?.dyn_into()?;
        canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()
            .map_err(JsValue::from)
    }

    fn inject_font_loader(&self) -> Result<(), JsValue> {
        let script: HtmlScriptElement = self.document.create_element("script")?.dyn_into()?;
        script.set_src(&self.font_loader_url);

        let queue = Rc::clone(&self.fonts);
        let onload = Closure::once_into_js(move || {
            let families = queue.borrow_mut().loader_ready();
            if let Err(e) = load_web_font(&families) {
                log::error!("[fonts.load] Web font loader failed: {e:?}");
            }
        });
        script.set_onload(Some(onload.unchecked_ref()));

        let head = self
            .document
            .head()
            .ok_or_else(|| JsValue::from_str("no head element"))?;
        head.append_child(&script)?;
        Ok(())
    }
}

/// `{ google: { families }, fontinactive }` for `WebFont.load`.
fn web_font_options(families: &[String]) -> Result<Object, JsValue> {
    let list: Array = families.iter().map(|f| JsValue::from_str(f)).collect();
    let google = Object::new();
    Reflect::set(&google, &JsValue::from_str("families"), &list)?;

    let options = Object::new();
    Reflect::set(&options, &JsValue::from_str("google"), &google)?;
    let inactive = Closure::<dyn FnMut(String)>::new(|family: String| {
        log::error!("[fonts.load] Could not load font {family}");
    });
    Reflect::set(
        &options,
        &JsValue::from_str("fontinactive"),
        &inactive.into_js_value(),
    )?;
    Ok(options)
}

fn load_web_font(families: &[String]) -> Result<(), JsValue> {
    if families.is_empty() {
        return Ok(());
    }
    let web_font = Reflect::get(&js_sys::global(), &JsValue::from_str("WebFont"))?;
    let load: Function = Reflect::get(&web_font, &JsValue::from_str("load"))?.dyn_into()?;
    load.call1(&web_font, &web_font_options(families)?)?;
    Ok(())
}

fn utf16_slice(text: &str, start: usize, end: Option<usize>) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = end.unwrap_or(units.len()).min(units.len());
    let start = start.min(end);
    String::from_utf16_lossy(&units[start..end])
}

impl Viewport for WebHost {
    fn scroll_position(&self) -> (f64, f64) {
        (
            self.window.scroll_x().unwrap_or_default(),
            self.window.scroll_y().unwrap_or_default(),
        )
    }

    fn scroll_to(&mut self, left: f64, top: f64) {
        let options = ScrollToOptions::new();
        options.set_left(left);
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Instant);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn viewport_size(&self) -> Size {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
        };
        Size::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn document_size(&self) -> Size {
        match self.root() {
            Some(root) => Size::new(f64::from(root.scroll_width()), f64::from(root.scroll_height())),
            None => Size::default(),
        }
    }

    fn root_style(&self, property: &str) -> String {
        self.root()
            .and_then(|root| self.window.get_computed_style(&root).ok().flatten())
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_root_style(&mut self, property: &str, value: &str) {
        let Some(root) = self.root_html() else {
            return;
        };
        if let Err(e) = root.style().set_property(property, value) {
            log::warn!("[viewport] Could not set {property}: {e:?}");
        }
    }
}

impl History for WebHost {
    fn query(&self) -> String {
        self.window.location().search().unwrap_or_default()
    }

    fn replace_query(&mut self, query: &str) {
        let location = self.window.location();
        let mut url = location.pathname().unwrap_or_default();
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        url.push_str(&location.hash().unwrap_or_default());

        let result = self
            .window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(e) = result {
            log::warn!("[parameter.set] Could not replace URL: {e:?}");
        }
    }

    fn navigate(&mut self, url: &str) {
        if let Err(e) = self.window.location().replace(url) {
            log::error!("[navigate] Could not navigate to {url}: {e:?}");
        }
    }

    fn alert(&mut self, message: &str) {
        if self.window.alert_with_message(message).is_err() {
            log::error!("{message}");
        }
    }
}

impl Dom for WebHost {
    type Node = Node;

    fn root_attribute(&self, name: &str) -> Option<String> {
        self.root()?.get_attribute(name)
    }

    fn set_root_attribute(&mut self, name: &str, value: &str) {
        if let Some(root) = self.root()
            && let Err(e) = root.set_attribute(name, value)
        {
            log::warn!("[dom] Could not set {name}: {e:?}");
        }
    }

    fn elements_with_attribute(&self, name: &str) -> Vec<Node> {
        let Ok(list) = self.document.query_selector_all(&format!("[{name}]")) else {
            return Vec::new();
        };
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn element_with_attribute_value(&self, name: &str, value: &str) -> Option<Node> {
        self.document
            .query_selector(&format!("[{name}=\"{value}\"]"))
            .ok()
            .flatten()
            .map(Node::from)
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn parent_element(&self, node: &Node) -> Option<Node> {
        node.parent_element().map(Node::from)
    }

    fn computed_style(&self, node: &Node, property: &str) -> String {
        node.dyn_ref::<Element>()
            .and_then(|element| self.window.get_computed_style(element).ok().flatten())
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn bounding_rect(&self, node: &Node) -> Rect {
        match node.dyn_ref::<Element>() {
            Some(element) => {
                let r = element.get_bounding_client_rect();
                Rect {
                    left: r.left(),
                    top: r.top(),
                    right: r.right(),
                    bottom: r.bottom(),
                }
            }
            None => Rect::default(),
        }
    }

    fn scroll_into_view(&mut self, node: &Node) {
        if let Some(element) = node.dyn_ref::<Element>() {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Instant);
            options.set_block(ScrollLogicalPosition::Center);
            options.set_inline(ScrollLogicalPosition::Center);
            element.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }

    fn text_length(&self, node: &Node) -> usize {
        node.text_content()
            .map(|text| text.encode_utf16().count())
            .unwrap_or_default()
    }

    fn text_slice(&self, node: &Node, start: usize, end: Option<usize>) -> String {
        node.text_content()
            .map(|text| utf16_slice(&text, start, end))
            .unwrap_or_default()
    }

    fn selection(&self) -> Option<SelectionRange<Node>> {
        let selection = self.window.get_selection().ok()??;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        Some(SelectionRange {
            start_node: range.start_container().ok()?,
            start_offset: range.start_offset().ok()? as usize,
            end_node: range.end_container().ok()?,
            end_offset: range.end_offset().ok()? as usize,
        })
    }

    fn selected_text(&self) -> String {
        match self.window.get_selection() {
            Ok(Some(selection)) => String::from(selection.to_string()),
            _ => String::new(),
        }
    }

    fn set_selection(&mut self, selection_range: &SelectionRange<Node>) {
        let apply = || -> Result<(), JsValue> {
            let range = self.document.create_range()?;
            range.set_start(&selection_range.start_node, selection_range.start_offset as u32)?;
            range.set_end(&selection_range.end_node, selection_range.end_offset as u32)?;
            if let Some(selection) = self.window.get_selection()? {
                selection.remove_all_ranges()?;
                selection.add_range(&range)?;
            }
            Ok(())
        };
        if let Err(e) = apply() {
            log::warn!("[selection] Could not apply selection: {e:?}");
        }
    }

    fn clear_selection(&mut self) {
        if let Ok(Some(selection)) = self.window.get_selection()
            && let Err(e) = selection.remove_all_ranges()
        {
            log::warn!("[selection] Could not clear selection: {e:?}");
        }
    }

    fn upsert_meta(&mut self, name: &str, content: &str) -> bool {
        let existing = self
            .document
            .query_selector(&format!("meta[name=\"{name}\"]"))
            .ok()
            .flatten();
        if let Some(meta) = existing {
            if let Err(e) = meta.set_attribute("content", content) {
                log::warn!("[reader.setMetaViewport] Could not update meta element: {e:?}");
            }
            return false;
        }

        let create = || -> Result<(), JsValue> {
            let meta = self.document.create_element("meta")?;
            meta.set_attribute("name", name)?;
            meta.set_attribute("content", content)?;
            let head = self
                .document
                .head()
                .ok_or_else(|| JsValue::from_str("no head element"))?;
            head.append_child(&meta)?;
            Ok(())
        };
        if let Err(e) = create() {
            log::warn!("[reader.setMetaViewport] Could not create meta element: {e:?}");
        }
        true
    }
}

impl FontHost for WebHost {
    fn measure_text(&self, font: &str, text: &str) -> f64 {
        let measured = self.canvas_context().and_then(|context| {
            context.set_font(font);
            context.measure_text(text)
        });
        match measured {
            Ok(metrics) => metrics.width(),
            Err(e) => {
                log::warn!("[fonts.load] Could not measure text: {e:?}");
                0.0
            }
        }
    }

    fn request_web_font(&mut self, family: &str) {
        let request = self.fonts.borrow_mut().request(family);
        let result = match request {
            FontRequest::InjectLoader => self.inject_font_loader(),
            FontRequest::Queued => {
                log::debug!("[fonts.load] Font {family} waits for the loader");
                Ok(())
            }
            FontRequest::LoadNow => load_web_font(&[family.to_string()]),
        };
        if let Err(e) = result {
            log::error!("[fonts.load] Could not request {family}: {e:?}");
        }
    }
}

fn reader_event(kind: EventKind, event: &Event) -> ReaderEvent {
    match kind {
        EventKind::Load => ReaderEvent::Load,
        EventKind::PointerUp => ReaderEvent::PointerUp,
        EventKind::Resize => ReaderEvent::Resize,
        EventKind::Wheel => ReaderEvent::Wheel,
        EventKind::KeyDown => ReaderEvent::KeyDown {
            code: event
                .dyn_ref::<KeyboardEvent>()
                .map(KeyboardEvent::code)
                .unwrap_or_default(),
        },
    }
}

type SharedReader = Rc<RefCell<Reader<WebHost>>>;

fn subscribe(reader: &SharedReader) -> Result<(), JsValue> {
    let window = reader.borrow().host().window().clone();
    for &kind in Reader::<WebHost>::SUBSCRIPTIONS {
        let shared = Rc::clone(reader);
        let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let result = shared.borrow_mut().handle(reader_event(kind, &event));
            match result {
                Ok(response) if response.prevent_default => event.prevent_default(),
                Ok(_) => {}
                Err(e) => log::error!("[reader] {} handler failed: {e}", kind.dom_type()),
            }
        });

        let options = AddEventListenerOptions::new();
        options.set_passive(!kind.cancelable());
        window.add_event_listener_with_callback_and_add_event_listener_options(
            kind.dom_type(),
            listener.as_ref().unchecked_ref(),
            &options,
        )?;
        // Listeners live as long as the document
        listener.forget();
    }
    Ok(())
}

/// JavaScript handle on the reader of the current chapter.
#[wasm_bindgen]
pub struct ReaderHandle {
    reader: SharedReader,
}

#[wasm_bindgen]
impl ReaderHandle {
    /// Turn pages. Returns the new location, `-1` at the end of the book,
    /// `-2` at its start, or nothing when a chapter change is under way.
    pub fn increment_by(&self, quantity: i32) -> Result<Option<f64>, JsValue> {
        let turn = self
            .reader
            .borrow_mut()
            .turn_pages(i64::from(quantity))
            .map_err(js_error)?;
        Ok(match turn {
            PageTurn::Moved(location) => Some(location.value() as f64),
            PageTurn::ChapterChange { .. } => None,
            other => other.sentinel().map(|s| s as f64),
        })
    }

    pub fn jump_to_page(&self, page: i32) -> Result<u32, JsValue> {
        let page = self
            .reader
            .borrow_mut()
            .jump_to_page(i64::from(page))
            .map_err(js_error)?;
        Ok(page as u32)
    }

    /// Returns false when the location lives in another chapter.
    pub fn jump_to_location(&self, location: f64) -> Result<bool, JsValue> {
        let jump = self
            .reader
            .borrow_mut()
            .jump_to_location(Location(location as i64))
            .map_err(js_error)?;
        Ok(matches!(jump, LocationJump::Arrived(_)))
    }

    pub fn current_location(&self) -> Result<f64, JsValue> {
        let location = self.reader.borrow().current_location().map_err(js_error)?;
        Ok(location.value() as f64)
    }

    pub fn current_page(&self) -> u32 {
        self.reader.borrow().current_page() as u32
    }

    pub fn page_count(&self) -> u32 {
        self.reader.borrow().page_count() as u32
    }

    pub fn text_direction(&self) -> String {
        self.reader.borrow().text_direction().to_string()
    }

    /// Chapter bounds as `[start, end]`, end exclusive.
    pub fn bounds(&self) -> Result<Vec<f64>, JsValue> {
        let bounds = self.reader.borrow().bounds().map_err(js_error)?;
        Ok(vec![bounds.start.value() as f64, bounds.end.value() as f64])
    }

    pub fn snap_to_nearest(&self) -> Result<f64, JsValue> {
        let location = self.reader.borrow_mut().snap_to_nearest().map_err(js_error)?;
        Ok(location.value() as f64)
    }

    pub fn selected_text(&self) -> Option<String> {
        let text = self.reader.borrow().selection_text()?;
        Some(text.selected)
    }

    /// `[before, selected, after]`, or nothing when no text is selected.
    pub fn selection(&self) -> Option<Array> {
        let text = self.reader.borrow().selection_text()?;
        Some(Array::of3(
            &JsValue::from(text.before),
            &JsValue::from(text.selected),
            &JsValue::from(text.after),
        ))
    }

    /// Locations `[start, end]` covered by the selection, end exclusive.
    pub fn selection_span(&self) -> Option<Vec<f64>> {
        let span = self.reader.borrow().selection_span()?;
        Some(vec![span.start.value() as f64, span.end.value() as f64])
    }

    pub fn expand_selection_by(&self, start: i32, end: i32) -> bool {
        self.reader
            .borrow_mut()
            .expand_selection_by(i64::from(start), i64::from(end))
    }
}

/// Set up the current chapter document and start listening for events.
#[wasm_bindgen]
pub fn start_chapter() -> Result<ReaderHandle, JsValue> {
    let config = ReaderConfig::default();
    let host = WebHost::new(config.fonts.loader_url.clone())?;
    let mut reader = Reader::new(host, config);
    reader.setup();

    let reader = Rc::new(RefCell::new(reader));
    subscribe(&reader)?;

    // The module may finish instantiating after the load event fired
    let loaded = reader.borrow().host().document().ready_state() == "complete";
    if loaded {
        log::debug!("[reader.onLoad] Document already loaded");
        reader
            .borrow_mut()
            .handle(ReaderEvent::Load)
            .map_err(js_error)?;
    }
    Ok(ReaderHandle { reader })
}

/// Forward the index document to the chapter holding the requested location.
#[wasm_bindgen]
pub fn index_main() -> Result<(), JsValue> {
    let config = ReaderConfig::default();
    let mut host = WebHost::new(config.fonts.loader_url)?;
    redirect_from_index(&mut host, &config.attributes).map_err(js_error)?;
    Ok(())
}
