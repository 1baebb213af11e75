//! Marks: formatting and annotations attached to inline nodes.

use serde::{Deserialize, Serialize};

/// Character formatting carried by a `textStyle` mark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleAttrs {
    /// Text color as `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// CSS-style font size (e.g. `"12pt"`, `"16px"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl TextStyleAttrs {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.font_size.is_none() && self.font_family.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightAttrs {
    /// Highlight color as `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Author and timestamp of a tracked change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// ISO 8601 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A comment anchored on the marked text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAttrs {
    /// Editor-side comment identifier (any string)
    pub comment_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Comment body text; paragraphs are separated by `\n`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A mark on a `text` or `hardBreak` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    TextStyle {
        #[serde(default)]
        attrs: TextStyleAttrs,
    },
    Highlight {
        #[serde(default)]
        attrs: HighlightAttrs,
    },
    Insertion {
        #[serde(default)]
        attrs: ChangeAttrs,
    },
    Deletion {
        #[serde(default)]
        attrs: ChangeAttrs,
    },
    Comment {
        attrs: CommentAttrs,
    },
}

/// The kind of a [`Mark`], ignoring its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    TextStyle,
    Highlight,
    Insertion,
    Deletion,
    Comment,
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bold => MarkKind::Bold,
            Mark::Italic => MarkKind::Italic,
            Mark::Underline => MarkKind::Underline,
            Mark::Strike => MarkKind::Strike,
            Mark::TextStyle { .. } => MarkKind::TextStyle,
            Mark::Highlight { .. } => MarkKind::Highlight,
            Mark::Insertion { .. } => MarkKind::Insertion,
            Mark::Deletion { .. } => MarkKind::Deletion,
            Mark::Comment { .. } => MarkKind::Comment,
        }
    }

    /// Create a comment mark.
    pub fn comment(
        comment_id: impl Into<String>,
        author: Option<String>,
        date: Option<String>,
        content: Option<String>,
    ) -> Self {
        Mark::Comment {
            attrs: CommentAttrs {
                comment_id: comment_id.into(),
                author,
                date,
                content,
            },
        }
    }

    pub fn insertion(author: Option<String>, date: Option<String>) -> Self {
        Mark::Insertion {
            attrs: ChangeAttrs { author, date },
        }
    }

    pub fn deletion(author: Option<String>, date: Option<String>) -> Self {
        Mark::Deletion {
            attrs: ChangeAttrs { author, date },
        }
    }
}

/// An ordered set of marks holding at most one mark per kind.
///
/// Inserting a mark whose kind is already present replaces the existing one
/// in place, so the original order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mark, replacing any existing mark of the same kind.
    pub fn insert(&mut self, mark: Mark) {
        let kind = mark.kind();
        match self.0.iter_mut().find(|m| m.kind() == kind) {
            Some(existing) => *existing = mark,
            None => self.0.push(mark),
        }
    }

    /// Builder-style [`MarkSet::insert`].
    pub fn with(mut self, mark: Mark) -> Self {
        self.insert(mark);
        self
    }

    pub fn remove(&mut self, kind: MarkKind) -> Option<Mark> {
        let index = self.0.iter().position(|m| m.kind() == kind)?;
        Some(self.0.remove(index))
    }

    pub fn get(&self, kind: MarkKind) -> Option<&Mark> {
        self.0.iter().find(|m| m.kind() == kind)
    }

    pub fn contains(&self, kind: MarkKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn text_style(&self) -> Option<&TextStyleAttrs> {
        match self.get(MarkKind::TextStyle) {
            Some(Mark::TextStyle { attrs }) => Some(attrs),
            _ => None,
        }
    }

    pub fn highlight(&self) -> Option<&HighlightAttrs> {
        match self.get(MarkKind::Highlight) {
            Some(Mark::Highlight { attrs }) => Some(attrs),
            _ => None,
        }
    }

    pub fn insertion(&self) -> Option<&ChangeAttrs> {
        match self.get(MarkKind::Insertion) {
            Some(Mark::Insertion { attrs }) => Some(attrs),
            _ => None,
        }
    }

    pub fn deletion(&self) -> Option<&ChangeAttrs> {
        match self.get(MarkKind::Deletion) {
            Some(Mark::Deletion { attrs }) => Some(attrs),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&CommentAttrs> {
        match self.get(MarkKind::Comment) {
            Some(Mark::Comment { attrs }) => Some(attrs),
            _ => None,
        }
    }

    /// Compare two sets ignoring order.
    pub fn same_as(&self, other: &MarkSet) -> bool {
        self.len() == other.len() && self.iter().all(|m| other.iter().any(|o| o == m))
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
