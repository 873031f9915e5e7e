//! Reader font selection.
//!
//! The `fonts` URL parameter carries a CSS font family list. Families the
//! browser can already render are used as-is; the rest are requested from
//! the web font service. A family counts as available when a probe string
//! set in `"<family>, monospace"` measures differently from plain monospace.

use crate::config::{FONTS_PARAM, FontSettings};
use crate::params::{ParameterStore, decode_component, encode_component};
use crate::ports::{FontHost, History, Viewport};

/// Split a CSS font family list into bare family names.
///
/// ```
/// use folio::fonts::parse_font_list;
///
/// assert_eq!(
///     parse_font_list("'Noto Serif', \"EB Garamond\", serif"),
///     ["Noto Serif", "EB Garamond", "serif"]
/// );
/// ```
pub fn parse_font_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|family| family.trim().replace(['\'', '"'], ""))
        .filter(|family| !family.is_empty())
        .collect()
}

/// Whether `family` renders differently from the fallback family.
pub fn font_available<H: FontHost + ?Sized>(
    host: &H,
    settings: &FontSettings,
    family: &str,
) -> bool {
    let size = settings.probe_size_px;
    let fallback = host.measure_text(
        &format!("{size}px {}", settings.fallback_family),
        &settings.probe_text,
    );
    let candidate = host.measure_text(
        &format!("{size}px {family}, {}", settings.fallback_family),
        &settings.probe_text,
    );
    candidate != fallback
}

/// What a host should do with one web font request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRequest {
    /// Inject the loader script; the family waits for it.
    InjectLoader,
    /// The loader script is still loading; the family waits for it.
    Queued,
    /// The loader script is ready; load the family now.
    LoadNow,
}

#[derive(Debug, Default)]
enum LoaderState {
    #[default]
    Absent,
    Loading(Vec<String>),
    Ready,
}

/// Families waiting on the web font loader script.
///
/// The script is injected once. Families requested while it loads are
/// queued and handed over together when it is ready.
#[derive(Debug, Default)]
pub struct WebFontQueue {
    state: LoaderState,
}

impl WebFontQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, family: &str) -> FontRequest {
        if matches!(self.state, LoaderState::Absent) {
            self.state = LoaderState::Loading(vec![family.to_string()]);
            return FontRequest::InjectLoader;
        }
        match &mut self.state {
            LoaderState::Absent => FontRequest::InjectLoader,
            LoaderState::Loading(waiting) => {
                if !waiting.iter().any(|f| f == family) {
                    waiting.push(family.to_string());
                }
                FontRequest::Queued
            }
            LoaderState::Ready => FontRequest::LoadNow,
        }
    }

    /// Mark the loader ready and take the families waiting on it.
    pub fn loader_ready(&mut self) -> Vec<String> {
        match std::mem::replace(&mut self.state, LoaderState::Ready) {
            LoaderState::Loading(waiting) => waiting,
            LoaderState::Absent | LoaderState::Ready => Vec::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoaderState::Ready)
    }
}

/// Apply the `fonts` parameter, or seed it from the stylesheet.
///
/// Returns the families that had to be requested from the web font service.
pub fn load_fonts<H>(host: &mut H, store: &ParameterStore, settings: &FontSettings) -> Vec<String>
where
    H: FontHost + History + Viewport + ?Sized,
{
    let mut params = store.get(host);
    let Some(raw) = params.get(FONTS_PARAM) else {
        log::debug!("[fonts.load] No fonts found, updating from default CSS");
        let computed = host.root_style(&settings.css_var);
        params.set(FONTS_PARAM, encode_component(computed.trim()));
        store.set(host, &params);
        return Vec::new();
    };

    let fonts = decode_component(raw).into_owned();
    log::debug!("[fonts.load] Font string: {fonts}");
    host.set_root_style(&settings.css_var, &fonts);

    let mut requested = Vec::new();
    for family in parse_font_list(&fonts) {
        if font_available(host, settings, &family) {
            log::debug!("[fonts.load] Font {family} exists");
        } else {
            log::debug!("[fonts.load] Font {family} not found, requesting it from the web font service");
            host.request_web_font(&family);
            requested.push(family);
        }
    }
    requested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Size;
    use crate::sim::SimHost;

    #[test]
    fn test_parse_font_list_skips_empty() {
        assert_eq!(parse_font_list(" Literata ,, "), ["Literata"]);
        assert!(parse_font_list("").is_empty());
    }

    #[test]
    fn test_font_available() {
        let mut host = SimHost::new(Size::new(800.0, 600.0));
        host.install_font("Literata");
        let settings = FontSettings::default();
        assert!(font_available(&host, &settings, "Literata"));
        assert!(!font_available(&host, &settings, "Nonexistent Sans"));
    }

    #[test]
    fn test_load_fonts_requests_missing_families() {
        let mut host = SimHost::new(Size::new(800.0, 600.0))
            .with_query("fonts=%2527Literata%2527%252C%2520Merriweather");
        host.install_font("Literata");

        let requested = load_fonts(&mut host, &ParameterStore::new(), &FontSettings::default());
        assert_eq!(requested, ["Merriweather"]);
        assert_eq!(host.requested_fonts(), ["Merriweather"]);
        assert_eq!(host.inline_style("--ereader-fonts"), Some("'Literata', Merriweather"));
    }

    #[test]
    fn test_load_fonts_seeds_parameter_from_css() {
        let mut host = SimHost::new(Size::new(800.0, 600.0)).with_query("location=3");
        host.set_stylesheet("--ereader-fonts", " Georgia, serif");

        let requested = load_fonts(&mut host, &ParameterStore::new(), &FontSettings::default());
        assert!(requested.is_empty());
        assert_eq!(host.params().get("fonts"), Some("Georgia%2C%20serif"));
        assert_eq!(host.params().get("location"), Some("3"));
        assert!(host.requested_fonts().is_empty());
    }

    #[test]
    fn test_font_queue_injects_loader_once() {
        let mut queue = WebFontQueue::new();
        assert_eq!(queue.request("Bitter"), FontRequest::InjectLoader);
        assert_eq!(queue.request("Merriweather"), FontRequest::Queued);
        assert_eq!(queue.request("Bitter"), FontRequest::Queued);
        assert!(!queue.is_ready());

        assert_eq!(queue.loader_ready(), ["Bitter", "Merriweather"]);
        assert!(queue.is_ready());
        assert_eq!(queue.request("Literata"), FontRequest::LoadNow);
        assert!(queue.loader_ready().is_empty());
    }
}
