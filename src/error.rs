//! Error types for the docweave library.

use std::io;
use thiserror::Error;

/// Result type alias for docweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing a package.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A mandatory part is missing or unparsable, or the input is not a package.
    #[error("Malformed package part {part}: {reason}")]
    MalformedPackage { part: String, reason: String },

    /// The tree has a shape the writer cannot represent.
    #[error("Unsupported structure: {0}")]
    UnsupportedStructure(String),

    /// Building an output part failed.
    #[error("Failed to serialize {part}: {reason}")]
    Serialization { part: String, reason: String },

    /// Error reading or writing the ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Error converting the tree to or from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::MalformedPackage`] for the given part.
    pub fn malformed(part: impl Into<String>, reason: impl ToString) -> Self {
        Error::MalformedPackage {
            part: part.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`Error::Serialization`] for the given part.
    pub fn serialization(part: impl Into<String>, reason: impl ToString) -> Self {
        Error::Serialization {
            part: part.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach a part name to a low-level parse failure.
    ///
    /// Errors that already name a part are returned unchanged.
    pub fn in_part(self, part: &str) -> Self {
        match self {
            Error::XmlParse(reason) | Error::ZipArchive(reason) => Error::malformed(part, reason),
            other => other,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::serialization("[xml]", err)
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}
