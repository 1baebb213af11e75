//! Per-export serialization state.
//!
//! A [`SerializationSession`] is created inside every write call and threaded
//! through the body walk by `&mut`, so a writer can be shared between threads
//! and reused without carrying ids from one export into the next.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, warn};

use crate::docx::numbering::{ListKind, NumberingMap};
use crate::model::{CommentAttrs, ListAttrs, Node};
use crate::options::WriteOptions;
use crate::xml::XmlElement;

/// Highest `w:ilvl` Word accepts.
pub(crate) const MAX_LIST_LEVEL: u8 = 8;

/// Twips of indentation per list level in generated definitions.
const LEVEL_INDENT: u32 = 720;

const HANGING_INDENT: u32 = 360;

const ORDERED_FORMATS: [&str; 3] = ["decimal", "lowerLetter", "lowerRoman"];

const BULLET_GLYPHS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];

/// Bidirectional map between source ids and dense integer ids.
///
/// Ids are handed out in first-seen order starting at 0.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    forward: HashMap<String, u32>,
    reverse: Vec<String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integer id for a source id, allocating one on first sight.
    ///
    /// The flag is `true` when the id was newly allocated.
    pub fn get_or_insert(&mut self, source: &str) -> (u32, bool) {
        if let Some(id) = self.forward.get(source) {
            return (*id, false);
        }
        let id = self.reverse.len() as u32;
        self.forward.insert(source.to_string(), id);
        self.reverse.push(source.to_string());
        (id, true)
    }

    pub fn id(&self, source: &str) -> Option<u32> {
        self.forward.get(source).copied()
    }

    pub fn source(&self, id: u32) -> Option<&str> {
        self.reverse.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}

/// A comment body to be written to comments.xml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    pub id: u32,
    pub author: String,
    pub date: String,
    pub content: String,
}

/// Comments met during the body walk.
#[derive(Debug, Clone, Default)]
pub struct CommentRegistry {
    ids: IdMap,
    entries: Vec<CommentEntry>,
}

impl CommentRegistry {
    /// Register a comment mark, returning its package id.
    ///
    /// The first occurrence of a comment id fixes its author, date and body.
    pub fn register(&mut self, attrs: &CommentAttrs, default_author: &str, timestamp: &str) -> u32 {
        let (id, is_new) = self.ids.get_or_insert(&attrs.comment_id);
        if is_new {
            self.entries.push(CommentEntry {
                id,
                author: attrs
                    .author
                    .clone()
                    .unwrap_or_else(|| default_author.to_string()),
                date: attrs.date.clone().unwrap_or_else(|| timestamp.to_string()),
                content: attrs.content.clone().unwrap_or_default(),
            });
        }
        id
    }

    pub fn entries(&self) -> &[CommentEntry] {
        &self.entries
    }

    pub fn ids(&self) -> &IdMap {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Revision ids for `w:ins` / `w:del` wrappers.
///
/// Insertions and deletions share one id sequence starting at 1, so every
/// wrapper in the document is unique.
#[derive(Debug, Clone)]
pub struct RevisionCounter {
    next: u32,
    insertions: u32,
    deletions: u32,
}

impl Default for RevisionCounter {
    fn default() -> Self {
        Self {
            next: 1,
            insertions: 0,
            deletions: 0,
        }
    }
}

impl RevisionCounter {
    pub fn next_insertion(&mut self) -> u32 {
        self.insertions += 1;
        self.take()
    }

    pub fn next_deletion(&mut self) -> u32 {
        self.deletions += 1;
        self.take()
    }

    fn take(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn insertions(&self) -> u32 {
        self.insertions
    }

    pub fn deletions(&self) -> u32 {
        self.deletions
    }
}

/// A `w:num` created during the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumDefinition {
    pub num_id: u32,
    pub abstract_id: u32,
    /// Level and start value of a `w:startOverride`
    pub start_override: Option<(u8, u32)>,
}

/// A generated `w:abstractNum`.
#[derive(Debug, Clone)]
struct AbstractDef {
    id: u32,
    /// Kind of levels no list has claimed
    kind: ListKind,
    /// Numbering id carried by the tree that owns this definition; shared
    /// definitions have the same kind on every level
    owner: Option<u32>,
    levels: [Option<ListKind>; MAX_LIST_LEVEL as usize + 1],
}

impl AbstractDef {
    fn level_kind(&self, level: u8) -> ListKind {
        self.levels[usize::from(level)].unwrap_or(self.kind)
    }
}

/// Allocates numbering ids for the lists of one export.
#[derive(Debug, Clone)]
pub struct NumberingAllocator {
    /// Numbering ids the original package defines; `None` for a fresh package
    existing: Option<HashSet<u32>>,
    next_num_id: u32,
    next_abstract_id: u32,
    abstracts: Vec<AbstractDef>,
    definitions: Vec<NumDefinition>,
    shared_bullet: Option<u32>,
}

impl NumberingAllocator {
    /// Allocator for a package written from scratch.
    ///
    /// `tree_max` is the largest numbering id carried by the tree; fresh ids
    /// start above it so they never collide with ids the tree keeps.
    pub fn fresh(tree_max: u32) -> Self {
        Self {
            existing: None,
            next_num_id: tree_max.saturating_add(1),
            next_abstract_id: 0,
            abstracts: Vec::new(),
            definitions: Vec::new(),
            shared_bullet: None,
        }
    }

    /// Allocator that extends the numbering of an original package.
    pub fn in_place(original: &NumberingMap, tree_max: u32) -> Self {
        let next_abstract_id = if original.abstract_nums.is_empty() {
            0
        } else {
            original.max_abstract_id() + 1
        };
        Self {
            existing: Some(original.instances.keys().copied().collect()),
            next_num_id: original.max_num_id().max(tree_max).saturating_add(1),
            next_abstract_id,
            abstracts: Vec::new(),
            definitions: Vec::new(),
            shared_bullet: None,
        }
    }

    /// Numbering id for a list.
    ///
    /// `depth` is the nesting depth of the list and `parent` the kind and id
    /// of the enclosing list, if any.
    ///
    /// Without an original package every id the tree carries gets its own
    /// abstract definition, so separate lists keep separate counters and each
    /// level takes the kind of the first list seen at that depth. A list
    /// whose kind disagrees with its level gets a new id.
    pub fn resolve(
        &mut self,
        kind: ListKind,
        attrs: &ListAttrs,
        depth: u8,
        parent: Option<(ListKind, u32)>,
    ) -> u32 {
        let level = depth.min(MAX_LIST_LEVEL);

        if let Some(start) = attrs.restart() {
            return self.define_fresh(kind, Some((level, start)));
        }

        if let Some(num_id) = attrs.num_id {
            if self.is_defined(num_id) {
                if self.claim_level(num_id, level, kind) {
                    return num_id;
                }
                debug!(
                    "numbering id {} has another list kind at level {}, allocating a new one",
                    num_id, level
                );
                return self.define_for(kind, level);
            }
            match self.existing.as_ref().map(|ids| ids.contains(&num_id)) {
                Some(true) => return num_id,
                Some(false) => {
                    warn!(
                        "numbering id {} is not defined by the original package, allocating a new one",
                        num_id
                    );
                }
                None => {
                    let abstract_id = self.define_abstract(kind, Some(num_id));
                    self.definitions.push(NumDefinition {
                        num_id,
                        abstract_id,
                        start_override: None,
                    });
                    self.claim_level(num_id, level, kind);
                    return num_id;
                }
            }
        }

        if let Some((parent_kind, parent_id)) = parent {
            if parent_kind == kind && self.claim_level(parent_id, level, kind) {
                return parent_id;
            }
        }

        self.define_for(kind, level)
    }

    fn is_defined(&self, num_id: u32) -> bool {
        self.definitions.iter().any(|d| d.num_id == num_id)
    }

    /// Whether `num_id` can number a list of `kind` at `level`, recording the
    /// kind on definitions owned by a carried id.
    fn claim_level(&mut self, num_id: u32, level: u8, kind: ListKind) -> bool {
        let abstract_id = match self.definitions.iter().find(|d| d.num_id == num_id) {
            Some(definition) => definition.abstract_id,
            // Defined by the original package
            None => return true,
        };
        let Some(def) = self.abstracts.iter_mut().find(|a| a.id == abstract_id) else {
            return true;
        };
        if def.owner.is_none() {
            return def.kind == kind;
        }
        let slot = &mut def.levels[usize::from(level)];
        match *slot {
            Some(claimed) => claimed == kind,
            None => {
                *slot = Some(kind);
                true
            }
        }
    }

    /// New id for a list that continues nothing.
    fn define_for(&mut self, kind: ListKind, level: u8) -> u32 {
        match kind {
            ListKind::Bullet => match self.shared_bullet {
                Some(id) => id,
                None => {
                    let id = self.define_fresh(kind, None);
                    self.shared_bullet = Some(id);
                    id
                }
            },
            ListKind::Ordered => self.define_fresh(kind, Some((level, 1))),
        }
    }

    fn define_fresh(&mut self, kind: ListKind, start_override: Option<(u8, u32)>) -> u32 {
        let num_id = self.next_num_id;
        self.next_num_id = self.next_num_id.saturating_add(1);
        let abstract_id = self.shared_abstract(kind);
        self.definitions.push(NumDefinition {
            num_id,
            abstract_id,
            start_override,
        });
        num_id
    }

    fn shared_abstract(&mut self, kind: ListKind) -> u32 {
        match self
            .abstracts
            .iter()
            .find(|a| a.owner.is_none() && a.kind == kind)
        {
            Some(def) => def.id,
            None => self.define_abstract(kind, None),
        }
    }

    fn define_abstract(&mut self, kind: ListKind, owner: Option<u32>) -> u32 {
        let id = self.next_abstract_id;
        self.next_abstract_id += 1;
        self.abstracts.push(AbstractDef {
            id,
            kind,
            owner,
            levels: [None; MAX_LIST_LEVEL as usize + 1],
        });
        id
    }

    pub fn definitions(&self) -> &[NumDefinition] {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// `w:abstractNum` elements for the definitions created so far.
    pub fn abstract_elements(&self) -> Vec<XmlElement> {
        self.abstracts.iter().map(abstract_num_element).collect()
    }

    /// `w:num` elements for the definitions created so far.
    pub fn num_elements(&self) -> Vec<XmlElement> {
        self.definitions.iter().map(num_element).collect()
    }
}

fn val(name: &str, value: impl Into<String>) -> XmlElement {
    XmlElement::new(name).with_attr("w:val", value)
}

fn abstract_num_element(def: &AbstractDef) -> XmlElement {
    let mut element = XmlElement::new("w:abstractNum")
        .with_attr("w:abstractNumId", def.id.to_string())
        .with_child(val("w:multiLevelType", "hybridMultilevel"));

    for level in 0..=MAX_LIST_LEVEL {
        let (format, text) = match def.level_kind(level) {
            ListKind::Ordered => (
                ORDERED_FORMATS[level as usize % ORDERED_FORMATS.len()],
                format!("%{}.", level + 1),
            ),
            ListKind::Bullet => (
                "bullet",
                BULLET_GLYPHS[level as usize % BULLET_GLYPHS.len()].to_string(),
            ),
        };
        let indent = XmlElement::new("w:ind")
            .with_attr("w:left", (LEVEL_INDENT * (u32::from(level) + 1)).to_string())
            .with_attr("w:hanging", HANGING_INDENT.to_string());
        element.push(
            XmlElement::new("w:lvl")
                .with_attr("w:ilvl", level.to_string())
                .with_child(val("w:start", "1"))
                .with_child(val("w:numFmt", format))
                .with_child(val("w:lvlText", text))
                .with_child(val("w:lvlJc", "left"))
                .with_child(XmlElement::new("w:pPr").with_child(indent)),
        );
    }
    element
}

fn num_element(definition: &NumDefinition) -> XmlElement {
    let mut element = XmlElement::new("w:num")
        .with_attr("w:numId", definition.num_id.to_string())
        .with_child(val("w:abstractNumId", definition.abstract_id.to_string()));
    if let Some((level, start)) = definition.start_override {
        element.push(
            XmlElement::new("w:lvlOverride")
                .with_attr("w:ilvl", level.to_string())
                .with_child(val("w:startOverride", start.to_string())),
        );
    }
    element
}

/// Largest numbering id carried by any list in the tree.
pub fn max_tree_num_id(tree: &Node) -> u32 {
    let mut max = 0;
    tree.walk(&mut |node| {
        if let Node::BulletList { attrs, .. } | Node::OrderedList { attrs, .. } = node {
            if let Some(id) = attrs.num_id {
                max = max.max(id);
            }
        }
    });
    max
}

/// Mutable state of one export.
#[derive(Debug)]
pub struct SerializationSession<'a> {
    pub options: &'a WriteOptions,
    /// Fallback `w:date` for revisions and comments
    pub timestamp: String,
    pub revisions: RevisionCounter,
    pub comments: CommentRegistry,
    pub numbering: NumberingAllocator,
    /// Paragraph and table style ids referenced by the body
    pub styles_used: BTreeSet<String>,
}

impl<'a> SerializationSession<'a> {
    pub fn new(options: &'a WriteOptions, numbering: NumberingAllocator) -> Self {
        Self {
            options,
            timestamp: options.timestamp_string(),
            revisions: RevisionCounter::default(),
            comments: CommentRegistry::default(),
            numbering,
            styles_used: BTreeSet::new(),
        }
    }

    pub fn register_comment(&mut self, attrs: &CommentAttrs) -> u32 {
        self.comments
            .register(attrs, &self.options.default_author, &self.timestamp)
    }

    pub fn use_style(&mut self, id: &str) {
        if !self.styles_used.contains(id) {
            self.styles_used.insert(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered() -> ListAttrs {
        ListAttrs::default()
    }

    #[test]
    fn test_id_map_first_seen_order() {
        let mut map = IdMap::new();
        assert_eq!(map.get_or_insert("c-9"), (0, true));
        assert_eq!(map.get_or_insert("c-2"), (1, true));
        assert_eq!(map.get_or_insert("c-9"), (0, false));
        assert_eq!(map.source(1), Some("c-2"));
        assert_eq!(map.id("c-2"), Some(1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_revision_ids_are_shared() {
        let mut revisions = RevisionCounter::default();
        assert_eq!(revisions.next_insertion(), 1);
        assert_eq!(revisions.next_deletion(), 2);
        assert_eq!(revisions.next_insertion(), 3);
        assert_eq!(revisions.insertions(), 2);
        assert_eq!(revisions.deletions(), 1);
    }

    #[test]
    fn test_independent_ordered_lists_restart() {
        let mut numbering = NumberingAllocator::fresh(0);
        let first = numbering.resolve(ListKind::Ordered, &ordered(), 0, None);
        let second = numbering.resolve(ListKind::Ordered, &ordered(), 0, None);
        assert_ne!(first, second);
        for definition in numbering.definitions() {
            assert_eq!(definition.start_override, Some((0, 1)));
            assert_eq!(definition.abstract_id, 0);
        }
    }

    #[test]
    fn test_explicit_start_and_nesting() {
        let mut numbering = NumberingAllocator::fresh(4);
        let attrs = ListAttrs {
            start: Some(5),
            ..Default::default()
        };
        let outer = numbering.resolve(ListKind::Ordered, &attrs, 0, None);
        assert_eq!(outer, 5);
        assert_eq!(numbering.definitions()[0].start_override, Some((0, 5)));

        // A nested list of the same kind continues the outer definition
        let inner = numbering.resolve(
            ListKind::Ordered,
            &ListAttrs::default(),
            1,
            Some((ListKind::Ordered, outer)),
        );
        assert_eq!(inner, outer);

        // Bullets share one id
        let b1 = numbering.resolve(ListKind::Bullet, &ListAttrs::default(), 0, None);
        let b2 = numbering.resolve(ListKind::Bullet, &ListAttrs::default(), 1, None);
        assert_eq!(b1, b2);
    }

    #[test]
    fn test_in_place_reuse_and_fallback() {
        let original = NumberingMap::parse(
            r#"<w:numbering><w:abstractNum w:abstractNumId="3"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum><w:num w:numId="7"><w:abstractNumId w:val="3"/></w:num></w:numbering>"#,
        )
        .unwrap();
        let mut numbering = NumberingAllocator::in_place(&original, 40);

        let kept = ListAttrs {
            num_id: Some(7),
            ..Default::default()
        };
        assert_eq!(numbering.resolve(ListKind::Ordered, &kept, 0, None), 7);
        assert!(numbering.is_empty());

        let missing = ListAttrs {
            num_id: Some(40),
            ..Default::default()
        };
        let fresh = numbering.resolve(ListKind::Ordered, &missing, 0, None);
        assert_eq!(fresh, 41);
        assert_eq!(numbering.definitions()[0].abstract_id, 4);
    }

    #[test]
    fn test_fresh_package_defines_carried_ids() {
        let mut numbering = NumberingAllocator::fresh(3);
        let attrs = ListAttrs {
            num_id: Some(3),
            ..Default::default()
        };
        assert_eq!(numbering.resolve(ListKind::Bullet, &attrs, 0, None), 3);
        assert_eq!(numbering.resolve(ListKind::Bullet, &attrs, 0, None), 3);
        assert_eq!(numbering.definitions().len(), 1);
        assert_eq!(numbering.resolve(ListKind::Ordered, &ordered(), 0, None), 4);
    }

    #[test]
    fn test_carried_ids_keep_their_own_definitions() {
        let mut numbering = NumberingAllocator::fresh(2);
        let carried = |num_id| ListAttrs {
            num_id: Some(num_id),
            ..Default::default()
        };

        assert_eq!(numbering.resolve(ListKind::Ordered, &carried(1), 0, None), 1);
        // Nested bullets reusing the outer id take over level 1
        assert_eq!(
            numbering.resolve(ListKind::Bullet, &carried(1), 1, Some((ListKind::Ordered, 1))),
            1
        );
        assert_eq!(numbering.resolve(ListKind::Ordered, &carried(2), 0, None), 2);

        let definitions = numbering.definitions();
        assert_eq!(definitions.len(), 2);
        assert_ne!(definitions[0].abstract_id, definitions[1].abstract_id);

        let abstracts = numbering.abstract_elements();
        let formats = |index: usize| -> Vec<String> {
            abstracts[index]
                .children_named("w:lvl")
                .filter_map(|lvl| lvl.child_val("w:numFmt").map(str::to_string))
                .collect()
        };
        assert_eq!(formats(0)[..3], ["decimal", "bullet", "lowerRoman"]);
        assert_eq!(formats(1)[..2], ["decimal", "lowerLetter"]);

        // An ordered list at the bullet level needs a new id
        let other = numbering.resolve(ListKind::Ordered, &carried(1), 1, None);
        assert_eq!(other, 3);
        assert_eq!(numbering.definitions()[2].start_override, Some((1, 1)));
    }

    #[test]
    fn test_numbering_elements() {
        let mut numbering = NumberingAllocator::fresh(0);
        numbering.resolve(ListKind::Ordered, &ordered(), 0, None);
        let abstracts = numbering.abstract_elements();
        assert_eq!(abstracts.len(), 1);
        assert_eq!(abstracts[0].children_named("w:lvl").count(), 9);

        let nums = numbering.num_elements();
        let xml = nums[0].to_xml().unwrap();
        assert!(xml.contains(r#"<w:num w:numId="1">"#));
        assert!(xml.contains(r#"<w:startOverride w:val="1"/>"#));
    }

    #[test]
    fn test_max_tree_num_id() {
        let tree = Node::document(vec![Node::OrderedList {
            attrs: ListAttrs {
                num_id: Some(12),
                ..Default::default()
            },
            content: vec![Node::list_item(vec![Node::paragraph(vec![Node::text("a")])])],
        }]);
        assert_eq!(max_tree_num_id(&tree), 12);
    }
}
