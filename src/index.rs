//! The book index: which chapter holds which locations.
//!
//! The index document lists every chapter file with its `[start, end)`
//! location range. A reader that lands on a location its chapter does not
//! hold is sent here, and the index forwards it to the right chapter with
//! all other URL parameters untouched.

use crate::config::Attributes;
use crate::error::{Error, Result};
use crate::location::{Location, LocationRange, numeric_attribute};
use crate::params::{ParameterSet, ParameterStore};
use crate::ports::{Dom, History};

/// One chapter file and the locations it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub path: String,
    pub range: LocationRange,
}

impl ChapterEntry {
    pub fn new(path: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            path: path.into(),
            range: LocationRange::new(start, end),
        }
    }
}

/// Where the index decided to send the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRedirect {
    /// Position of the chosen chapter in the index.
    pub chapter: usize,
    /// `path?query` to navigate to.
    pub target: String,
}

/// Ordered table of chapter ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterIndex {
    chapters: Vec<ChapterEntry>,
}

impl ChapterIndex {
    pub fn new(chapters: Vec<ChapterEntry>) -> Self {
        Self { chapters }
    }

    /// Read the index entries of the current document.
    pub fn from_dom<H: Dom + ?Sized>(host: &H, attributes: &Attributes) -> Result<Self> {
        let mut chapters = Vec::new();
        for node in host.elements_with_attribute(&attributes.index_path) {
            let path = host
                .attribute(&node, &attributes.index_path)
                .unwrap_or_default();
            let start =
                numeric_attribute(&attributes.index_start, host.attribute(&node, &attributes.index_start))?;
            let end =
                numeric_attribute(&attributes.index_end, host.attribute(&node, &attributes.index_end))?;
            chapters.push(ChapterEntry {
                path,
                range: LocationRange { start, end },
            });
        }
        Ok(Self { chapters })
    }

    pub fn chapters(&self) -> &[ChapterEntry] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// The whole book's range: first chapter's start to last chapter's end.
    pub fn span(&self) -> Option<LocationRange> {
        let first = self.chapters.first()?;
        let last = self.chapters.last()?;
        Some(LocationRange {
            start: first.range.start,
            end: last.range.end,
        })
    }

    /// Position of the chapter holding `location`.
    ///
    /// Locations outside the book clamp to the first chapter. A location
    /// inside the book that no chapter holds means the ranges have a gap.
    pub fn chapter_for(&self, location: Location) -> Result<usize> {
        let span = self.span().ok_or(Error::EmptyIndex)?;
        if !span.contains(location) {
            log::debug!("[index.chapterFor] Location {location} outside {span}, using first chapter");
            return Ok(0);
        }
        self.chapters
            .iter()
            .position(|chapter| chapter.range.contains(location))
            .ok_or(Error::LocationNotFound(location))
    }

    /// Pick the chapter for the request in `params`.
    ///
    /// A missing or unparseable location goes to the first chapter.
    pub fn resolve(&self, params: &ParameterSet) -> Result<IndexRedirect> {
        if self.chapters.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let chapter = match params.location().and_then(Location::parse_lenient) {
            Some(location) => self.chapter_for(location)?,
            None => 0,
        };
        Ok(IndexRedirect {
            chapter,
            target: params.url_for(&self.chapters[chapter].path),
        })
    }
}

/// Entry point of the index document: read the table, redirect or alert.
///
/// Data errors (an empty index, a gap in the ranges) are shown to the
/// reader, since no chapter can be opened from here.
pub fn redirect_from_index<H: Dom + History + ?Sized>(
    host: &mut H,
    attributes: &Attributes,
) -> Result<IndexRedirect> {
    let params = ParameterStore::new().get(host);
    let outcome = ChapterIndex::from_dom(host, attributes).and_then(|index| index.resolve(&params));
    match outcome {
        Ok(redirect) => {
            log::debug!("[index] Redirecting to {}", redirect.target);
            host.navigate(&redirect.target);
            Ok(redirect)
        }
        Err(e) => {
            log::error!("[index] {e}");
            host.alert(&format!("ERROR: something went wrong ({e})"));
            Err(e)
        }
    }
}
