//! Reader and writer configuration.

use chrono::{DateTime, SecondsFormat, Utc};

/// Options for reading a package into a tree.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Keep the verbatim `w:sectPr` XML on the document node
    pub capture_raw_section: bool,

    /// Coalesce neighbouring text nodes that carry identical marks
    pub merge_adjacent_text: bool,

    /// Fail on unparsable styles/numbering/comments parts instead of
    /// reading on without them
    pub strict_styles: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            capture_raw_section: true,
            merge_adjacent_text: true,
            strict_styles: false,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw_section(mut self, capture: bool) -> Self {
        self.capture_raw_section = capture;
        self
    }

    pub fn with_merge_text(mut self, merge: bool) -> Self {
        self.merge_adjacent_text = merge;
        self
    }

    pub fn with_strict_styles(mut self, strict: bool) -> Self {
        self.strict_styles = strict;
        self
    }
}

/// ZIP compression used for written parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    pub(crate) fn method(&self) -> zip::CompressionMethod {
        match self {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Options for writing a tree into a package.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Author for revisions and comments that carry none
    pub default_author: String,

    /// Fixed timestamp for revisions and comments that carry none.
    /// `None` uses the time of the write call.
    pub timestamp: Option<DateTime<Utc>>,

    /// Compression for generated parts (raw-copied entries keep theirs)
    pub compression: Compression,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            default_author: "Unknown".to_string(),
            timestamp: None,
            compression: Compression::Deflated,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback revision/comment author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    /// Pin the fallback timestamp, for reproducible output.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// The fallback timestamp formatted for `w:date`.
    pub(crate) fn timestamp_string(&self) -> String {
        self.timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
