//! The document tree node.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    CellAttrs, DocumentAttrs, HeadingAttrs, ListAttrs, MarkSet, ParagraphAttrs, RowAttrs,
    TableAttrs,
};

/// A node of the document tree.
///
/// Serializes to the editor's JSON shape:
/// `{"type": "...", "attrs": {...}, "content": [...], "text": "...", "marks": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    #[serde(alias = "doc")]
    Document {
        #[serde(default, skip_serializing_if = "DocumentAttrs::is_empty")]
        attrs: DocumentAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    Paragraph {
        #[serde(default, skip_serializing_if = "ParagraphAttrs::is_empty")]
        attrs: ParagraphAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Heading {
        #[serde(default)]
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    BulletList {
        #[serde(default, skip_serializing_if = "ListAttrs::is_empty")]
        attrs: ListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    OrderedList {
        #[serde(default, skip_serializing_if = "ListAttrs::is_empty")]
        attrs: ListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    ListItem {
        #[serde(default)]
        content: Vec<Node>,
    },
    Table {
        #[serde(default, skip_serializing_if = "TableAttrs::is_empty")]
        attrs: TableAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    TableRow {
        #[serde(default, skip_serializing_if = "RowAttrs::is_empty")]
        attrs: RowAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    TableCell {
        #[serde(default, skip_serializing_if = "CellAttrs::is_empty")]
        attrs: CellAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
        marks: MarkSet,
    },
    HardBreak {
        #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
        marks: MarkSet,
    },
}

/// The kind tag of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Table,
    TableRow,
    TableCell,
    Text,
    HardBreak,
}

impl NodeKind {
    /// The JSON `type` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell => "tableCell",
            NodeKind::Text => "text",
            NodeKind::HardBreak => "hardBreak",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document { .. } => NodeKind::Document,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Heading { .. } => NodeKind::Heading,
            Node::BulletList { .. } => NodeKind::BulletList,
            Node::OrderedList { .. } => NodeKind::OrderedList,
            Node::ListItem { .. } => NodeKind::ListItem,
            Node::Table { .. } => NodeKind::Table,
            Node::TableRow { .. } => NodeKind::TableRow,
            Node::TableCell { .. } => NodeKind::TableCell,
            Node::Text { .. } => NodeKind::Text,
            Node::HardBreak { .. } => NodeKind::HardBreak,
        }
    }

    // --- constructors ---

    pub fn document(content: Vec<Node>) -> Self {
        Node::Document {
            attrs: DocumentAttrs::default(),
            content,
        }
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Node::Paragraph {
            attrs: ParagraphAttrs::default(),
            content,
        }
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Node::Heading {
            attrs: HeadingAttrs::new(level),
            content,
        }
    }

    pub fn bullet_list(items: Vec<Node>) -> Self {
        Node::BulletList {
            attrs: ListAttrs::default(),
            content: items,
        }
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        Node::OrderedList {
            attrs: ListAttrs::default(),
            content: items,
        }
    }

    pub fn list_item(content: Vec<Node>) -> Self {
        Node::ListItem { content }
    }

    pub fn table(rows: Vec<Node>) -> Self {
        Node::Table {
            attrs: TableAttrs::default(),
            content: rows,
        }
    }

    pub fn table_row(cells: Vec<Node>) -> Self {
        Node::TableRow {
            attrs: RowAttrs::default(),
            content: cells,
        }
    }

    pub fn table_cell(content: Vec<Node>) -> Self {
        Node::TableCell {
            attrs: CellAttrs::default(),
            content,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    pub fn marked_text(text: impl Into<String>, marks: impl Into<MarkSet>) -> Self {
        Node::Text {
            text: text.into(),
            marks: marks.into(),
        }
    }

    pub fn hard_break() -> Self {
        Node::HardBreak {
            marks: MarkSet::new(),
        }
    }

    // --- accessors ---

    /// Child nodes (empty for inline nodes).
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { content, .. }
            | Node::Paragraph { content, .. }
            | Node::Heading { content, .. }
            | Node::BulletList { content, .. }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content }
            | Node::Table { content, .. }
            | Node::TableRow { content, .. }
            | Node::TableCell { content, .. } => content,
            Node::Text { .. } | Node::HardBreak { .. } => &[],
        }
    }

    /// Mutable child list, or `None` for inline nodes.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { content, .. }
            | Node::Paragraph { content, .. }
            | Node::Heading { content, .. }
            | Node::BulletList { content, .. }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content }
            | Node::Table { content, .. }
            | Node::TableRow { content, .. }
            | Node::TableCell { content, .. } => Some(content),
            Node::Text { .. } | Node::HardBreak { .. } => None,
        }
    }

    /// Marks of an inline node.
    pub fn marks(&self) -> Option<&MarkSet> {
        match self {
            Node::Text { marks, .. } | Node::HardBreak { marks } => Some(marks),
            _ => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Text { .. } | Node::HardBreak { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Node::BulletList { .. } | Node::OrderedList { .. })
    }

    /// Concatenated text of this subtree.
    ///
    /// Block boundaries are separated by newlines, hard breaks become `\n`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text, .. } => out.push_str(text),
            Node::HardBreak { .. } => out.push('\n'),
            Node::Paragraph { content, .. } | Node::Heading { content, .. } => {
                for child in content {
                    child.collect_text(out);
                }
                out.push('\n');
            }
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Visit every node of the subtree in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Count nodes of a given kind in the subtree.
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        let mut count = 0;
        self.walk(&mut |n| {
            if n.kind() == kind {
                count += 1;
            }
        });
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mark;

    fn sample() -> Node {
        Node::document(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![
                Node::marked_text("Hello ", vec![Mark::Bold]),
                Node::text("world"),
            ]),
            Node::ordered_list(vec![
                Node::list_item(vec![Node::paragraph(vec![Node::text("One")])]),
                Node::list_item(vec![Node::paragraph(vec![Node::text("Two")])]),
            ]),
        ])
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(sample().plain_text(), "Title\nHello world\nOne\nTwo\n");
    }

    #[test]
    fn test_count_kind() {
        let doc = sample();
        assert_eq!(doc.count_kind(NodeKind::Paragraph), 3);
        assert_eq!(doc.count_kind(NodeKind::ListItem), 2);
        assert_eq!(doc.count_kind(NodeKind::Text), 5);
    }

    #[test]
    fn test_json_shape() {
        let node = Node::paragraph(vec![Node::marked_text("Hi", vec![Mark::Italic])]);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(
            json,
            r#"{"type":"paragraph","content":[{"type":"text","text":"Hi","marks":[{"type":"italic"}]}]}"#
        );
    }

    #[test]
    fn test_doc_alias() {
        let node: Node = serde_json::from_str(r#"{"type":"doc","content":[]}"#).unwrap();
        assert_eq!(node.kind(), NodeKind::Document);
    }

    #[test]
    fn test_inline_has_no_children() {
        let node = Node::text("x");
        assert!(node.children().is_empty());
        assert!(node.is_inline());
        assert_eq!(NodeKind::BulletList.to_string(), "bulletList");
    }
}
