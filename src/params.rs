//! URL parameters as persistent reader state.
//!
//! The query string is the single place reading state lives between page
//! loads: the location, colors, scale, paddings, line height and fonts. A
//! [`ParameterSet`] follows `URLSearchParams` semantics (ordered pairs,
//! form-urlencoded serialization), and the [`ParameterStore`] moves it in and
//! out of the URL through the [`History`] port.
//!
//! Style values are stored *percent-encoded inside* the set, so they are
//! encoded twice in the URL.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::config::LOCATION_PARAM;
use crate::location::Location;
use crate::ports::{History, Viewport};

/// Bytes escaped by `application/x-www-form-urlencoded` serialization.
/// Space is handled separately (it becomes `+`).
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Bytes escaped by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value the way `encodeURIComponent` does.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Percent-decode a value the way `decodeURIComponent` does.
///
/// Malformed escapes are kept literally and invalid UTF-8 is replaced.
pub fn decode_component(value: &str) -> Cow<'_, str> {
    percent_decode_str(value).decode_utf8_lossy()
}

fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn form_encode(value: &str, out: &mut String) {
    for (i, part) in value.split(' ').enumerate() {
        if i > 0 {
            out.push('+');
        }
        out.extend(utf8_percent_encode(part, FORM));
    }
}

/// Ordered key/value pairs of a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    pairs: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (form_decode(key), form_decode(value)),
                None => (form_decode(pair), String::new()),
            })
            .collect();
        Self { pairs }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Replace the first value under `key` and drop any others, or append.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = index <= first || k != key;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    /// Append a pair without touching existing ones.
    pub fn append(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.push((key.to_string(), value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The requested location, if present.
    pub fn location(&self) -> Option<&str> {
        self.get(LOCATION_PARAM)
    }

    pub fn set_location(&mut self, location: Location) {
        self.set(LOCATION_PARAM, location.to_string());
    }

    /// `path?query`, the shape used for every chapter and index redirect.
    pub fn url_for(&self, path: &str) -> String {
        format!("{path}?{self}")
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            form_encode(key, &mut out);
            out.push('=');
            form_encode(value, &mut out);
        }
        f.write_str(&out)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Reads and writes the [`ParameterSet`] held in the page URL.
///
/// Holds no state: every call goes back to the URL, since an earlier event
/// may have changed it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterStore;

impl ParameterStore {
    pub fn new() -> Self {
        Self
    }

    pub fn get<H: History + ?Sized>(&self, host: &H) -> ParameterSet {
        let params = ParameterSet::parse(&host.query());
        log::debug!("[parameter.get] Retrieved parameters {params}");
        params
    }

    /// Write `params` back to the URL without reloading.
    pub fn set<H: History + ?Sized>(&self, host: &mut H, params: &ParameterSet) {
        host.replace_query(&params.to_string());
        log::debug!("[parameter.set] Setting parameters to {params}");
    }

    /// Store `location` under the location parameter.
    pub fn sync_location<H: History + ?Sized>(&self, host: &mut H, location: Location) {
        let mut params = self.get(host);
        params.set_location(location);
        self.set(host, &params);
    }

    /// Bind a URL parameter to a CSS custom property.
    ///
    /// A present parameter wins and is copied (decoded) onto the root style;
    /// otherwise the computed property value is copied (encoded) into the URL.
    pub fn sync_with_style<H>(&self, host: &mut H, param: &str, css_var: &str)
    where
        H: History + Viewport + ?Sized,
    {
        let mut params = self.get(host);
        log::debug!("[parameter.syncWithStyle] Syncing parameter {param} with {css_var}");
        match params.get(param) {
            Some(value) => {
                log::debug!("[parameter.syncWithStyle] Parameter found, copying into CSS");
                let decoded = decode_component(value).into_owned();
                host.set_root_style(css_var, &decoded);
            }
            None => {
                log::debug!("[parameter.syncWithStyle] Parameter not found, copying from CSS");
                let computed = host.root_style(css_var);
                params.set(param, encode_component(computed.trim()));
                self.set(host, &params);
            }
        }
    }
}
