//! Reading chapter and index documents from HTML text.
//!
//! In the browser the engine reads attributes through the [`Dom`](crate::ports::Dom)
//! port. Tooling that works on the generated files directly (the CLI, tests,
//! benchmarks) uses this module instead, which only scans start tags for the
//! attributes of the document contracts and ignores everything else.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::config::Attributes;
use crate::error::{Error, Result};
use crate::index::{ChapterEntry, ChapterIndex};
use crate::location::{Location, LocationRange, numeric_attribute};
use crate::util::decode_html;

/// The root-element metadata of a chapter document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDescriptor {
    pub range: LocationRange,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub index: Option<String>,
}

/// A chapter's descriptor and its tagged locations in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterScan {
    pub descriptor: ChapterDescriptor,
    pub locations: Vec<Location>,
}

impl ChapterScan {
    /// Violations of the chapter contract: locations must strictly increase,
    /// stay inside the descriptor's range and cover all of it.
    pub fn problems(&self) -> Vec<String> {
        let range = self.descriptor.range;
        let mut problems = Vec::new();

        for pair in self.locations.windows(2) {
            if pair[1] <= pair[0] {
                problems.push(format!("location {} follows {}", pair[1], pair[0]));
            }
        }
        for &location in &self.locations {
            if !range.contains(location) {
                problems.push(format!("location {location} outside bounds {range}"));
            }
        }
        if self.locations.first() != Some(&range.start) && !range.is_empty() {
            problems.push(format!("first location is not the chapter start {}", range.start));
        }
        if self.locations.len() as u64 != range.len() {
            problems.push(format!(
                "{} locations tagged but bounds {range} span {}",
                self.locations.len(),
                range.len()
            ));
        }
        problems
    }
}

fn reader(html: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(true);
    // HTML void elements and optional end tags are not well-formed XML
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(String::from_utf8(attr.value.to_vec())?));
        }
    }
    Ok(None)
}

/// Scan a chapter document for its descriptor and location tags.
pub fn scan_chapter(html: &str, attributes: &Attributes) -> Result<ChapterScan> {
    let mut reader = reader(html);
    let mut descriptor = None;
    let mut locations = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if descriptor.is_none() && e.name().as_ref().eq_ignore_ascii_case(b"html") {
                    let start = attribute(&e, &attributes.location_start)?;
                    let end = attribute(&e, &attributes.location_end)?;
                    descriptor = Some(ChapterDescriptor {
                        range: LocationRange {
                            start: numeric_attribute(&attributes.location_start, start)?,
                            end: numeric_attribute(&attributes.location_end, end)?,
                        },
                        next: attribute(&e, &attributes.next)?,
                        previous: attribute(&e, &attributes.previous)?,
                        index: attribute(&e, &attributes.index)?,
                    });
                }
                if let Some(value) = attribute(&e, &attributes.location)? {
                    let location = Location::parse_lenient(&value).ok_or(Error::InvalidAttribute {
                        name: attributes.location.clone(),
                        value,
                    })?;
                    locations.push(location);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    let descriptor =
        descriptor.ok_or_else(|| Error::MissingAttribute(attributes.location_start.clone()))?;
    Ok(ChapterScan {
        descriptor,
        locations,
    })
}

/// Read the chapter table of an index document.
pub fn parse_index(html: &str, attributes: &Attributes) -> Result<ChapterIndex> {
    let mut reader = reader(html);
    let mut chapters = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let Some(path) = attribute(&e, &attributes.index_path)? else {
                    continue;
                };
                let start = numeric_attribute(
                    &attributes.index_start,
                    attribute(&e, &attributes.index_start)?,
                )?;
                let end =
                    numeric_attribute(&attributes.index_end, attribute(&e, &attributes.index_end)?)?;
                chapters.push(ChapterEntry {
                    path,
                    range: LocationRange { start, end },
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(ChapterIndex::new(chapters))
}

/// Read and decode an HTML file.
pub fn read_document(path: impl AsRef<Path>) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_html(&bytes).into_owned())
}
