//! Error types for folio operations.

use thiserror::Error;

use crate::location::Location;

/// Errors that can occur while resolving locations, pages or chapters.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("Invalid value {value:?} for attribute {name}")]
    InvalidAttribute { name: String, value: String },

    #[error("Chapter contains no location-tagged elements")]
    NoLocations,

    #[error("Index document lists no chapters")]
    EmptyIndex,

    #[error("No chapter contains location {0}")]
    LocationNotFound(Location),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
