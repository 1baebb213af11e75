//! Document tree model shared by the reader and the writer.
//!
//! The tree follows the ProseMirror/TipTap JSON shape consumed by the editor:
//! every node carries a `type` tag, optional `attrs`, ordered `content`, and
//! inline nodes carry `marks`. Absent attributes are omitted from the JSON
//! rather than written as zero values, because absence and explicit zero mean
//! different things in WordprocessingML.

mod document;
mod mark;
mod node;
mod paragraph;
mod table;

pub use document::*;
pub use mark::*;
pub use node::*;
pub use paragraph::*;
pub use table::*;
