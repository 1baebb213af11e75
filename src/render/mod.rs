//! Output rendering for document trees.
//!
//! The tree's JSON form is the editor's wire schema: every node is
//! `{"type": ..., "attrs": {...}, "content": [...]}` with camelCase names.
//!
//! # Example
//!
//! ```no_run
//! use docweave::render::{from_json, to_json, JsonFormat};
//!
//! let tree = docweave::read_file("document.docx")?;
//! let json = to_json(&tree, JsonFormat::Pretty)?;
//! let back = from_json(&json)?;
//! assert_eq!(back, tree);
//! # Ok::<(), docweave::Error>(())
//! ```

mod json;

pub use json::{from_json, to_json, to_json_default, JsonFormat};
