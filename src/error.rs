//! Error types for the PDF graph engine

use std::path::PathBuf;
use thiserror::Error;

use crate::font::FontRef;
use crate::pdf::model::ObjectId;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF graph engine
#[derive(Error, Debug)]
pub enum Error {
    /// Low-level PDF reader error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raw stream bytes of an object could not be read
    #[error("Failed to read stream of object {object}: {source}")]
    StreamRead {
        object: ObjectId,
        source: std::io::Error,
    },

    /// Text inserted under a font that was never registered
    #[error("FontRef not found: {0}")]
    FontRefNotFound(FontRef),

    /// Character without a glyph in the active font
    #[error("Glyph not found for character {0:?}")]
    GlyphNotFound(char),

    /// Character missing from a font's recorded usage
    #[error("Rune not found in glyph usage: {0:?}")]
    RuneNotFound(char),

    /// A structural dictionary required by the operation is absent
    #[error("Dictionary not found: {0}")]
    DictionaryNotFound(String),

    /// A reference points at an object missing from the graph
    #[error("Object ID not found: {0}")]
    ObjectIdNotFound(ObjectId),

    /// A required dictionary entry is missing
    #[error("Key /{key} not found in object {object}")]
    KeyNameNotFound { object: ObjectId, key: String },

    /// Page number outside the document
    #[error("Page {0} not found")]
    PageNotFound(usize),

    /// Font program is missing a table or is malformed
    #[error("Font parse error: {0}")]
    FontParse(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// General error
    #[error("{0}")]
    General(String),
}
