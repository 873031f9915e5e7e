//! # folio
//!
//! Pagination and navigation for a browser e-book reader whose book is split
//! into one HTML document per chapter.
//!
//! ## Overview
//!
//! Every addressable element of a chapter carries an integer *location*, and
//! the chapter's root element records its location bounds and the paths of
//! its neighbours and of the book index. The engine lays the chapter out as
//! viewport-sized pages, keeps the URL's `location` parameter pointing at the
//! first location on screen, and sends the reader to the right chapter when a
//! location outside the current one is requested.
//!
//! The engine talks to the browser only through the traits in [`ports`]. The
//! `wasm` feature provides the real browser host; [`sim::SimHost`] is an
//! in-memory host used by tests and tooling.
//!
//! ## Quick Start
//!
//! ```
//! use folio::sim::{ChapterLayout, SimHost};
//! use folio::ports::Size;
//! use folio::{Location, PageTurn, Reader, ReaderConfig, ReaderEvent};
//!
//! // Chapter holding locations 0..30, ten per page, with a next chapter
//! let layout = ChapterLayout::new(0..30, 10).next("ch2.html");
//! let host = SimHost::chapter(Size::new(800.0, 600.0), &layout).with_query("location=12");
//!
//! let mut reader = Reader::new(host, ReaderConfig::default());
//! reader.setup();
//! reader.handle(ReaderEvent::Load).unwrap();
//! assert_eq!(reader.current_location().unwrap(), Location(10));
//!
//! assert_eq!(reader.turn_pages(1).unwrap(), PageTurn::Moved(Location(20)));
//! assert!(matches!(reader.turn_pages(1).unwrap(), PageTurn::ChapterChange { .. }));
//! ```
//!
//! ## Index documents
//!
//! ```
//! use folio::{ChapterEntry, ChapterIndex, ParameterSet};
//!
//! let index = ChapterIndex::new(vec![
//!     ChapterEntry::new("ch1.html", 0, 100),
//!     ChapterEntry::new("ch2.html", 100, 250),
//! ]);
//! let redirect = index.resolve(&ParameterSet::parse("location=150&scale=1.2")).unwrap();
//! assert_eq!(redirect.target, "ch2.html?location=150&scale=1.2");
//! ```

pub mod config;
pub mod error;
pub mod fonts;
pub mod index;
pub mod location;
pub mod markup;
pub mod page;
pub mod params;
pub mod ports;
pub mod reader;
pub mod selection;
pub mod sim;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{Attributes, FontSettings, PageKeys, ReaderConfig, StyleBinding};
pub use error::{Error, Result};
pub use index::{ChapterEntry, ChapterIndex, IndexRedirect, redirect_from_index};
pub use location::{Location, LocationJump, LocationRange, LocationResolver};
pub use markup::{ChapterDescriptor, ChapterScan, parse_index, read_document, scan_chapter};
pub use page::{PageModel, PageTurn, Velocity};
pub use params::{ParameterSet, ParameterStore};
pub use ports::Host;
pub use reader::{EventKind, EventResponse, Reader, ReaderEvent, TextDirection, WritingMode};
pub use selection::{SelectionText, SelectionTool};
