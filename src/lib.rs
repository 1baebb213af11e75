//! # docweave
//!
//! Bidirectional codec between WordprocessingML packages (`.docx`) and an
//! editable document tree in the ProseMirror/TipTap shape.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docweave::{read_file, write, Node};
//!
//! // Package -> tree
//! let tree = read_file("report.docx")?;
//! println!("{} paragraphs", tree.count_kind(docweave::NodeKind::Paragraph));
//!
//! // Tree -> package, patching the original so untouched parts survive
//! let original = std::fs::read("report.docx")?;
//! let bytes = write(&tree, Some(&original))?;
//! std::fs::write("report-edited.docx", bytes)?;
//!
//! // Tree -> fresh package
//! let fresh = Node::document(vec![Node::paragraph(vec![Node::text("Hello")])]);
//! std::fs::write("hello.docx", write(&fresh, None)?)?;
//! # Ok::<(), docweave::Error>(())
//! ```
//!
//! ## Configured readers and writers
//!
//! ```no_run
//! use docweave::docx::{DocxReader, DocxWriter};
//! use docweave::options::{ReadOptions, WriteOptions};
//!
//! let data = std::fs::read("report.docx")?;
//! let tree = DocxReader::with_options(ReadOptions::default().with_raw_section(false)).read(&data)?;
//! let writer = DocxWriter::with_options(WriteOptions::default().with_author("Reviewer"));
//! let bytes = writer.write(&tree, None)?;
//! # Ok::<(), docweave::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: file wrappers using Tokio (`read_file_async`, `write_file_async`)

pub mod container;
pub mod detect;
pub mod docx;
pub mod error;
pub mod model;
pub mod options;
pub mod package;
pub mod render;
pub mod units;
pub mod xml;

// Re-exports
pub use detect::{detect_package, PackageKind};
pub use docx::{DocxReader, DocxWriter};
pub use error::{Error, Result};
pub use model::{Mark, MarkKind, MarkSet, Node, NodeKind};
pub use options::{Compression, ReadOptions, WriteOptions};
pub use render::{from_json, to_json, JsonFormat};

use std::path::Path;

/// Read a package into a document tree with default options.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("document.docx")?;
/// let tree = docweave::read(&data)?;
/// # Ok::<(), docweave::Error>(())
/// ```
pub fn read(data: &[u8]) -> Result<Node> {
    DocxReader::new().read(data)
}

/// Serialize a document tree with default options.
///
/// With `original`, the original package is patched in place; otherwise a
/// fresh package is built.
pub fn write(tree: &Node, original: Option<&[u8]>) -> Result<Vec<u8>> {
    DocxWriter::new().write(tree, original)
}

/// Read a package file into a document tree.
pub fn read_file(path: impl AsRef<Path>) -> Result<Node> {
    let data = std::fs::read(path)?;
    read(&data)
}

/// Serialize a tree to a file, patching `original` when given.
///
/// `original` may be the same path as `path`; it is read fully before the
/// output is written.
pub fn write_file(tree: &Node, path: impl AsRef<Path>, original: Option<&Path>) -> Result<()> {
    let original = original.map(std::fs::read).transpose()?;
    let bytes = write(tree, original.as_deref())?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Async variant of [`read_file`].
#[cfg(feature = "async")]
pub async fn read_file_async(path: impl AsRef<Path>) -> Result<Node> {
    let data = tokio::fs::read(path).await?;
    read(&data)
}

/// Async variant of [`write_file`].
#[cfg(feature = "async")]
pub async fn write_file_async(
    tree: &Node,
    path: impl AsRef<Path>,
    original: Option<&Path>,
) -> Result<()> {
    let original = match original {
        Some(original) => Some(tokio::fs::read(original).await?),
        None => None,
    };
    let bytes = write(tree, original.as_deref())?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rejects_non_package() {
        let err = read(b"plain text, not a package").unwrap_err();
        assert!(matches!(err, Error::MalformedPackage { .. }));
    }

    #[test]
    fn test_write_then_read() {
        let tree = Node::document(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![Node::text("Body")]),
        ]);
        let bytes = write(&tree, None).unwrap();
        let back = read(&bytes).unwrap();
        assert_eq!(back.count_kind(NodeKind::Heading), 1);
        assert_eq!(back.plain_text(), tree.plain_text());
    }
}
