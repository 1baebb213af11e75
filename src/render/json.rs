//! JSON renderer implementation.

use crate::error::{Error, Result};
use crate::model::Node;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Convert a tree to JSON.
pub fn to_json(tree: &Node, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(tree)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(tree)?,
    };
    Ok(json)
}

/// Convert a tree to JSON with default formatting.
pub fn to_json_default(tree: &Node) -> Result<String> {
    to_json(tree, JsonFormat::Pretty)
}

/// Parse a tree from its JSON form.
///
/// The root must be a `document` node.
pub fn from_json(json: &str) -> Result<Node> {
    let tree: Node = serde_json::from_str(json)?;
    match tree {
        Node::Document { .. } => Ok(tree),
        other => Err(Error::UnsupportedStructure(format!(
            "root node must be a document, found {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mark, MarkSet};

    fn sample() -> Node {
        Node::document(vec![
            Node::heading(2, vec![Node::text("Title")]),
            Node::paragraph(vec![
                Node::marked_text("Hello", MarkSet::new().with(Mark::Bold)),
                Node::hard_break(),
            ]),
        ])
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"type\": \"heading\""));
        assert!(json.contains("\"level\": 2"));
        assert!(json.contains("\"text\": \"Hello\""));
        assert!(json.contains("\"type\": \"hardBreak\""));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains(r#""marks":[{"type":"bold"}]"#));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "type": "document",
            "content": [
                {"type": "orderedList", "attrs": {"start": 3}, "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "three"}]}
                    ]}
                ]}
            ]
        }"#;
        let tree = from_json(json).unwrap();
        assert_eq!(tree.plain_text(), "three\n");
        let Node::Document { content, .. } = &tree else {
            panic!("expected document");
        };
        let Node::OrderedList { attrs, .. } = &content[0] else {
            panic!("expected ordered list");
        };
        assert_eq!(attrs.start, Some(3));
    }

    #[test]
    fn test_from_json_rejects_non_document_root() {
        let err = from_json(r#"{"type": "paragraph"}"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedStructure(_)));
    }

    #[test]
    fn test_json_round_trip_preserves_tree() {
        let tree = sample();
        let back = from_json(&to_json(&tree, JsonFormat::Compact).unwrap()).unwrap();
        assert_eq!(back, tree);
    }
}
