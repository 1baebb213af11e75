//! WordprocessingML (.docx) reading and writing.
//!
//! The reader turns `document.xml` and its companion parts into a
//! [`Node`](crate::Node) tree; the writer turns a tree back into a package,
//! either from scratch or by patching an original package in place.

pub mod comments;
pub mod numbering;
pub mod reader;
pub mod styles;
pub mod writer;

pub use reader::DocxReader;
pub use writer::DocxWriter;
