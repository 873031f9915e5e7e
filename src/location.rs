//! Book-wide locations and their elements in the current chapter.
//!
//! Every addressable element of a chapter carries a location number. Numbers
//! increase in document order and continue across chapters, so a location
//! names a point in the book no matter how the chapter is paginated. The
//! [`LocationResolver`] maps between those numbers and what is on screen.

use std::fmt;

use crate::config::Attributes;
use crate::error::{Error, Result};
use crate::page::PageModel;
use crate::params::ParameterStore;
use crate::ports::{Dom, Host, Viewport};
use crate::reader::element_visible;

/// A book-wide text location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location(pub i64);

impl Location {
    /// Parse with `parseInt` leniency: optional sign, leading digits,
    /// anything after them ignored.
    ///
    /// ```
    /// use folio::Location;
    ///
    /// assert_eq!(Location::parse_lenient(" 150"), Some(Location(150)));
    /// assert_eq!(Location::parse_lenient("-5px"), Some(Location(-5)));
    /// assert_eq!(Location::parse_lenient("abc"), None);
    /// ```
    pub fn parse_lenient(s: &str) -> Option<Location> {
        let s = s.trim_start();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let end = digits
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return None;
        }
        let value: i64 = digits[..end].parse().ok()?;
        Some(Location(if negative { -value } else { value }))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Location {
    fn from(value: i64) -> Self {
        Location(value)
    }
}

/// Half-open range of locations `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationRange {
    pub start: Location,
    pub end: Location,
}

impl LocationRange {
    pub fn new(start: impl Into<Location>, end: impl Into<Location>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn contains(&self, location: Location) -> bool {
        location >= self.start && location < self.end
    }

    pub fn len(&self) -> u64 {
        (self.end.0 - self.start.0).max(0) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for LocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Result of [`LocationResolver::jump_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationJump {
    /// The location is in this chapter; the screen now shows this location.
    Arrived(Location),
    /// The location is elsewhere; the host is navigating to the index.
    Redirected { target: String },
}

/// Parse a numeric attribute value.
pub(crate) fn numeric_attribute(name: &str, value: Option<String>) -> Result<Location> {
    let value = value.ok_or_else(|| Error::MissingAttribute(name.to_string()))?;
    Location::parse_lenient(&value).ok_or(Error::InvalidAttribute {
        name: name.to_string(),
        value,
    })
}

/// Maps locations to elements of the current chapter and back.
#[derive(Debug, Clone, Default)]
pub struct LocationResolver {
    attributes: Attributes,
    params: ParameterStore,
}

impl LocationResolver {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            params: ParameterStore::new(),
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Location carried by `node`, if it is tagged.
    pub fn location_of<H: Dom + ?Sized>(&self, host: &H, node: &H::Node) -> Option<Location> {
        host.attribute(node, &self.attributes.location)
            .and_then(|v| Location::parse_lenient(&v))
    }

    /// The first fully visible location on screen.
    ///
    /// When nothing tagged is visible (mid-transition, or odd markup) this
    /// falls back to the largest location in the chapter. That fallback is a
    /// known weak spot; callers should not build on it.
    pub fn current<H: Dom + Viewport + ?Sized>(&self, host: &H) -> Result<Location> {
        let mut max: Option<Location> = None;
        for node in host.elements_with_attribute(&self.attributes.location) {
            let Some(location) = self.location_of(host, &node) else {
                continue;
            };
            if element_visible(host, &node) {
                log::debug!("[location.current] Current location is {location}");
                return Ok(location);
            }
            max = max.max(Some(location));
        }

        match max {
            Some(location) => {
                log::error!(
                    "[location.current] No visible location was found, returning the max location {location}"
                );
                Ok(location)
            }
            None => Err(Error::NoLocations),
        }
    }

    /// The chapter's own `[start, end)` from the root element.
    pub fn bounds<H: Dom + ?Sized>(&self, host: &H) -> Result<LocationRange> {
        let a = &self.attributes;
        let start = numeric_attribute(&a.location_start, host.root_attribute(&a.location_start))?;
        let end = numeric_attribute(&a.location_end, host.root_attribute(&a.location_end))?;
        let bounds = LocationRange { start, end };
        log::debug!("[location.bounds] Chapter bounds are {bounds}");
        Ok(bounds)
    }

    /// Whether the element tagged `location` exists and is fully on screen.
    pub fn is_visible<H: Dom + Viewport + ?Sized>(&self, host: &H, location: Location) -> bool {
        host.element_with_attribute_value(&self.attributes.location, &location.to_string())
            .is_some_and(|node| element_visible(host, &node))
    }

    /// Bring `location` on screen, snapping to a page boundary.
    ///
    /// A location this chapter does not contain is handed to the index
    /// document, which knows every chapter's range.
    pub fn jump_to<H: Host + ?Sized>(
        &self,
        host: &mut H,
        pages: &PageModel,
        location: Location,
    ) -> Result<LocationJump> {
        log::debug!("[location.jumpTo] Attempting to jump to location {location}");
        let found =
            host.element_with_attribute_value(&self.attributes.location, &location.to_string());

        if let Some(node) = found {
            host.scroll_into_view(&node);
            let settled = pages.snap_to_nearest(host)?;
            log::debug!("[location.jumpTo] Jumping successful, settled on {settled}");
            return Ok(LocationJump::Arrived(settled));
        }

        log::debug!("[location.jumpTo] Location not in chapter, redirecting back to index");
        let index = host
            .root_attribute(&self.attributes.index)
            .ok_or_else(|| Error::MissingAttribute(self.attributes.index.clone()))?;
        let mut params = self.params.get(host);
        params.set_location(location);
        let target = params.url_for(&index);
        host.navigate(&target);
        Ok(LocationJump::Redirected { target })
    }
}
