//! comments.xml parsing.

use std::collections::HashMap;

use crate::error::Result;
use crate::xml::XmlDocument;

/// A comment body from comments.xml.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentBody {
    pub id: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub initials: Option<String>,
    /// Paragraph texts joined by `\n`
    pub content: String,
}

/// Comment bodies keyed by their `w:id`.
#[derive(Debug, Clone, Default)]
pub struct CommentMap {
    pub comments: HashMap<String, CommentBody>,
}

impl CommentMap {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut map = CommentMap::default();
        if xml.trim().is_empty() {
            return Ok(map);
        }

        let doc = XmlDocument::parse(xml)?;
        for comment in doc.root.children_named("w:comment") {
            let Some(id) = comment.attr("w:id") else {
                continue;
            };
            let paragraphs: Vec<String> = comment
                .children_named("w:p")
                .map(|p| paragraph_text(p))
                .collect();
            let body = CommentBody {
                id: id.to_string(),
                author: comment.attr("w:author").map(String::from),
                date: comment.attr("w:date").map(String::from),
                initials: comment.attr("w:initials").map(String::from),
                content: paragraphs.join("\n"),
            };
            map.comments.insert(body.id.clone(), body);
        }

        Ok(map)
    }

    pub fn get(&self, id: &str) -> Option<&CommentBody> {
        self.comments.get(id)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

/// Visible text of a comment paragraph: `w:t` content, tabs and breaks.
fn paragraph_text(p: &crate::xml::XmlElement) -> String {
    fn collect(el: &crate::xml::XmlElement, out: &mut String) {
        for child in el.elements() {
            match child.name.as_str() {
                "w:t" => out.push_str(&child.text()),
                "w:tab" => out.push('\t'),
                "w:br" | "w:cr" => out.push('\n'),
                // The annotation reference mark carries no text
                "w:annotationRef" => {}
                _ => collect(child, out),
            }
        }
    }
    let mut out = String::new();
    collect(p, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comments() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:comment w:id="0" w:author="Ana" w:date="2024-03-01T10:00:00Z" w:initials="A">
    <w:p><w:r><w:annotationRef/></w:r><w:r><w:t>First line</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Second </w:t></w:r><w:r><w:t>line</w:t></w:r></w:p>
  </w:comment>
  <w:comment w:id="1"><w:p/></w:comment>
</w:comments>"#;
        let map = CommentMap::parse(xml).unwrap();
        assert_eq!(map.len(), 2);

        let first = map.get("0").unwrap();
        assert_eq!(first.author.as_deref(), Some("Ana"));
        assert_eq!(first.initials.as_deref(), Some("A"));
        assert_eq!(first.content, "First line\nSecond line");

        let second = map.get("1").unwrap();
        assert_eq!(second.author, None);
        assert_eq!(second.content, "");
    }
}
