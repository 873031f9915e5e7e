//! In-memory host for running the engine without a browser.
//!
//! [`SimHost`] implements every port over a flat list of nodes with
//! document-space boxes. Scrolling shifts those boxes the way a browser
//! shifts `getBoundingClientRect` results, and is clamped to the document's
//! scroll extents, including the negative horizontal range browsers use for
//! right-to-left documents. Navigations, alerts and font requests are
//! recorded instead of performed.
//!
//! [`ChapterLayout`] builds the usual fixture: a chapter of tagged elements
//! laid out a fixed number per page.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use crate::config::Attributes;
use crate::location::Location;
use crate::page::Velocity;
use crate::params::ParameterSet;
use crate::ports::{Dom, FontHost, History, Rect, SelectionRange, Size, Viewport};

/// Handle to a node of a [`SimHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Default)]
struct SimNode {
    parent: Option<NodeId>,
    attributes: Vec<(String, String)>,
    styles: BTreeMap<String, String>,
    /// Box in document coordinates.
    rect: Rect,
    text: Option<String>,
}

/// Direction a simulated chapter flows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    LeftToRight,
    RightToLeft,
    Vertical,
}

impl Flow {
    /// The velocity a reader should detect for this flow.
    pub fn velocity(self) -> Velocity {
        match self {
            Flow::LeftToRight => Velocity::LEFT_TO_RIGHT,
            Flow::RightToLeft => Velocity::RIGHT_TO_LEFT,
            Flow::Vertical => Velocity::TOP_TO_BOTTOM,
        }
    }
}

/// A chapter of tagged elements, `per_page` of them to a page.
#[derive(Debug, Clone)]
pub struct ChapterLayout {
    pub locations: Range<i64>,
    pub per_page: usize,
    pub flow: Flow,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub index: Option<String>,
}

impl ChapterLayout {
    pub fn new(locations: Range<i64>, per_page: usize) -> Self {
        Self {
            locations,
            per_page: per_page.max(1),
            flow: Flow::LeftToRight,
            next: None,
            previous: None,
            index: Some("index.html".into()),
        }
    }

    pub fn flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self
    }

    pub fn next(mut self, path: &str) -> Self {
        self.next = Some(path.into());
        self
    }

    pub fn previous(mut self, path: &str) -> Self {
        self.previous = Some(path.into());
        self
    }

    pub fn index(mut self, path: Option<&str>) -> Self {
        self.index = path.map(String::from);
        self
    }

    pub fn page_count(&self) -> usize {
        let count = (self.locations.end - self.locations.start).max(0) as usize;
        count.div_ceil(self.per_page).max(1)
    }
}

/// A browser window, document and selection, all in memory.
#[derive(Debug, Clone)]
pub struct SimHost {
    viewport: Size,
    document: Size,
    scroll: (f64, f64),
    /// Horizontal scrolling runs from `-(width - viewport)` to 0.
    negative_scroll_x: bool,
    root_attributes: Vec<(String, String)>,
    /// Values from the stylesheet, overridden by inline root styles.
    stylesheet: BTreeMap<String, String>,
    inline_root: BTreeMap<String, String>,
    nodes: Vec<SimNode>,
    query: String,
    navigations: Vec<String>,
    alerts: Vec<String>,
    selection: Option<SelectionRange<NodeId>>,
    meta: BTreeMap<String, String>,
    installed_fonts: BTreeSet<String>,
    requested_fonts: Vec<String>,
}

impl SimHost {
    /// An empty document exactly the size of the viewport.
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            document: viewport,
            scroll: (0.0, 0.0),
            negative_scroll_x: false,
            root_attributes: Vec::new(),
            stylesheet: BTreeMap::new(),
            inline_root: BTreeMap::new(),
            nodes: Vec::new(),
            query: String::new(),
            navigations: Vec::new(),
            alerts: Vec::new(),
            selection: None,
            meta: BTreeMap::new(),
            installed_fonts: BTreeSet::new(),
            requested_fonts: Vec::new(),
        }
    }

    /// A chapter document with the default attribute names.
    pub fn chapter(viewport: Size, layout: &ChapterLayout) -> Self {
        Self::chapter_with(viewport, layout, &Attributes::default())
    }

    pub fn chapter_with(viewport: Size, layout: &ChapterLayout, attributes: &Attributes) -> Self {
        let mut host = Self::new(viewport);
        host.set_root_attr(&attributes.location_start, &layout.locations.start.to_string());
        host.set_root_attr(&attributes.location_end, &layout.locations.end.to_string());
        if let Some(next) = &layout.next {
            host.set_root_attr(&attributes.next, next);
        }
        if let Some(previous) = &layout.previous {
            host.set_root_attr(&attributes.previous, previous);
        }
        if let Some(index) = &layout.index {
            host.set_root_attr(&attributes.index, index);
        }

        let pages = layout.page_count() as f64;
        let (w, h) = (viewport.width, viewport.height);
        match layout.flow {
            Flow::LeftToRight | Flow::RightToLeft => {
                host.document = Size::new(w * pages, h);
            }
            Flow::Vertical => {
                host.document = Size::new(w, h * pages);
            }
        }
        match layout.flow {
            Flow::LeftToRight => {}
            Flow::RightToLeft => {
                host.negative_scroll_x = true;
                host.set_stylesheet("direction", "rtl");
            }
            Flow::Vertical => {
                host.set_stylesheet("writing-mode", "vertical-rl");
            }
        }

        let per_page = layout.per_page;
        for (i, location) in layout.locations.clone().enumerate() {
            let page = (i / per_page) as f64;
            let slot = (i % per_page) as f64;
            let rect = match layout.flow {
                Flow::LeftToRight => {
                    let band = h / per_page as f64;
                    Rect::new(page * w + 1.0, slot * band + 1.0, w - 2.0, band - 2.0)
                }
                Flow::RightToLeft => {
                    let band = h / per_page as f64;
                    Rect::new(-page * w + 1.0, slot * band + 1.0, w - 2.0, band - 2.0)
                }
                Flow::Vertical => {
                    let band = w / per_page as f64;
                    Rect::new(w - (slot + 1.0) * band + 1.0, page * h + 1.0, band - 2.0, h - 2.0)
                }
            };
            host.add_node(SimNode {
                attributes: vec![(attributes.location.clone(), location.to_string())],
                rect,
                ..SimNode::default()
            });
        }
        host
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.strip_prefix('?').unwrap_or(query).to_string();
        self
    }

    fn add_node(&mut self, node: SimNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> Option<&SimNode> {
        self.nodes.get(id.0)
    }

    /// Add an untagged element with a document-space box.
    pub fn add_element(&mut self, parent: Option<NodeId>, rect: Rect) -> NodeId {
        self.add_node(SimNode {
            parent,
            rect,
            ..SimNode::default()
        })
    }

    /// Add an element tagged with `location` (default attribute name).
    pub fn add_located(&mut self, parent: Option<NodeId>, location: Location, rect: Rect) -> NodeId {
        let id = self.add_element(parent, rect);
        self.set_attr(id, &Attributes::default().location, &location.to_string());
        id
    }

    /// Add a text node under `parent`.
    pub fn add_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let rect = self.node(parent).map(|n| n.rect).unwrap_or_default();
        self.add_node(SimNode {
            parent: Some(parent),
            rect,
            text: Some(text.to_string()),
            ..SimNode::default()
        })
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.attributes.retain(|(k, _)| k != name);
            n.attributes.push((name.to_string(), value.to_string()));
        }
    }

    pub fn set_root_attr(&mut self, name: &str, value: &str) {
        self.root_attributes.retain(|(k, _)| k != name);
        self.root_attributes.push((name.to_string(), value.to_string()));
    }

    /// Computed style of an element (`display`, `visibility`, ...).
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.styles.insert(property.to_string(), value.to_string());
        }
    }

    /// A root style value coming from the stylesheet.
    pub fn set_stylesheet(&mut self, property: &str, value: &str) {
        self.stylesheet.insert(property.to_string(), value.to_string());
    }

    /// The inline root style set through [`Viewport::set_root_style`].
    pub fn inline_style(&self, property: &str) -> Option<&str> {
        self.inline_root.get(property).map(String::as_str)
    }

    pub fn set_document_size(&mut self, size: Size) {
        self.document = size;
        self.scroll_to(self.scroll.0, self.scroll.1);
    }

    pub fn find_location(&self, location: Location) -> Option<NodeId> {
        self.element_with_attribute_value(&Attributes::default().location, &location.to_string())
    }

    pub fn query_string(&self) -> &str {
        &self.query
    }

    pub fn params(&self) -> ParameterSet {
        ParameterSet::parse(&self.query)
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn meta(&self, name: &str) -> Option<&str> {
        self.meta.get(name).map(String::as_str)
    }

    /// Select from `start_offset` in `start` to `end_offset` in `end`.
    pub fn select(&mut self, start: NodeId, start_offset: usize, end: NodeId, end_offset: usize) {
        self.selection = Some(SelectionRange {
            start_node: start,
            start_offset,
            end_node: end,
            end_offset,
        });
    }

    pub fn install_font(&mut self, family: &str) {
        self.installed_fonts.insert(family.to_string());
    }

    pub fn requested_fonts(&self) -> &[String] {
        &self.requested_fonts
    }

    fn scroll_range(&self) -> ((f64, f64), (f64, f64)) {
        let max_x = (self.document.width - self.viewport.width).max(0.0);
        let max_y = (self.document.height - self.viewport.height).max(0.0);
        let x = if self.negative_scroll_x {
            (-max_x, 0.0)
        } else {
            (0.0, max_x)
        };
        (x, (0.0, max_y))
    }

    fn chars(&self, node: NodeId) -> Vec<char> {
        self.node(node)
            .and_then(|n| n.text.as_deref())
            .map(|t| t.chars().collect())
            .unwrap_or_default()
    }
}

impl Viewport for SimHost {
    fn scroll_position(&self) -> (f64, f64) {
        self.scroll
    }

    fn scroll_to(&mut self, left: f64, top: f64) {
        let ((min_x, max_x), (min_y, max_y)) = self.scroll_range();
        self.scroll = (left.clamp(min_x, max_x), top.clamp(min_y, max_y));
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn document_size(&self) -> Size {
        self.document
    }

    fn root_style(&self, property: &str) -> String {
        self.inline_root
            .get(property)
            .or_else(|| self.stylesheet.get(property))
            .cloned()
            .unwrap_or_else(|| match property {
                "direction" => "ltr".into(),
                "writing-mode" => "horizontal-tb".into(),
                _ => String::new(),
            })
    }

    fn set_root_style(&mut self, property: &str, value: &str) {
        self.inline_root.insert(property.to_string(), value.to_string());
    }
}

impl History for SimHost {
    fn query(&self) -> String {
        self.query.clone()
    }

    fn replace_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_string());
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

impl Dom for SimHost {
    type Node = NodeId;

    fn root_attribute(&self, name: &str) -> Option<String> {
        self.root_attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn set_root_attribute(&mut self, name: &str, value: &str) {
        self.set_root_attr(name, value);
    }

    fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.attributes.iter().any(|(k, _)| k == name))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    fn element_with_attribute_value(&self, name: &str, value: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.attributes.iter().any(|(k, v)| k == name && v == value))
            .map(NodeId)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.node(*node)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node)?.parent
    }

    fn computed_style(&self, node: &NodeId, property: &str) -> String {
        let explicit = self.node(*node).and_then(|n| n.styles.get(property)).cloned();
        explicit.unwrap_or_else(|| match property {
            "display" => "block".into(),
            "visibility" => "visible".into(),
            _ => String::new(),
        })
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        let rect = self.node(*node).map(|n| n.rect).unwrap_or_default();
        let (x, y) = self.scroll;
        Rect {
            left: rect.left - x,
            top: rect.top - y,
            right: rect.right - x,
            bottom: rect.bottom - y,
        }
    }

    fn scroll_into_view(&mut self, node: &NodeId) {
        let Some(rect) = self.node(*node).map(|n| n.rect) else {
            return;
        };
        let center_x = (rect.left + rect.right) / 2.0;
        let center_y = (rect.top + rect.bottom) / 2.0;
        self.scroll_to(
            center_x - self.viewport.width / 2.0,
            center_y - self.viewport.height / 2.0,
        );
    }

    fn text_length(&self, node: &NodeId) -> usize {
        self.chars(*node).len()
    }

    fn text_slice(&self, node: &NodeId, start: usize, end: Option<usize>) -> String {
        let chars = self.chars(*node);
        let end = end.unwrap_or(chars.len()).min(chars.len());
        let start = start.min(end);
        chars[start..end].iter().collect()
    }

    fn selection(&self) -> Option<SelectionRange<NodeId>> {
        self.selection.clone()
    }

    fn selected_text(&self) -> String {
        let Some(range) = &self.selection else {
            return String::new();
        };
        if range.is_single_node() {
            return self.text_slice(&range.start_node, range.start_offset, Some(range.end_offset));
        }
        let mut text = self.text_slice(&range.start_node, range.start_offset, None);
        for id in (range.start_node.0 + 1)..range.end_node.0 {
            if let Some(middle) = self.nodes.get(id).and_then(|n| n.text.as_deref()) {
                text.push_str(middle);
            }
        }
        text.push_str(&self.text_slice(&range.end_node, 0, Some(range.end_offset)));
        text
    }

    fn set_selection(&mut self, range: &SelectionRange<NodeId>) {
        self.selection = Some(range.clone());
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn upsert_meta(&mut self, name: &str, content: &str) -> bool {
        self.meta
            .insert(name.to_string(), content.to_string())
            .is_none()
    }
}

impl FontHost for SimHost {
    /// Installed families render 10% narrower than the monospace fallback.
    fn measure_text(&self, font: &str, text: &str) -> f64 {
        let (size, families) = font.split_once("px").unwrap_or(("16", font));
        let size: f64 = size.trim().parse().unwrap_or(16.0);
        let first = families
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches(|c| c == '"' || c == '\'');
        let advance = if self.installed_fonts.contains(first) {
            0.54
        } else {
            0.6
        };
        text.chars().count() as f64 * size * advance
    }

    fn request_web_font(&mut self, family: &str) {
        self.requested_fonts.push(family.to_string());
    }
}
