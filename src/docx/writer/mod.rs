//! Package writer: document tree -> WordprocessingML package.
//!
//! Without an original package a complete fresh package is produced. With
//! one, only the parts that depend on the tree are rebuilt and every other
//! entry is copied raw from the original archive.

mod body;
mod parts;
mod session;

pub use session::{
    CommentEntry, CommentRegistry, IdMap, NumDefinition, NumberingAllocator, RevisionCounter,
};

use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};

use self::session::{max_tree_num_id, SerializationSession};
use super::numbering::NumberingMap;
use crate::container::{
    rels_path_for, resolve_path, Container, REL_COMMENTS, REL_NUMBERING, REL_OFFICE_DOCUMENT,
    REL_STYLES,
};
use crate::detect::detect_package;
use crate::error::{Error, Result};
use crate::model::{DocumentAttrs, Node};
use crate::options::WriteOptions;
use crate::package::{
    self, CONTENT_TYPES_PATH, CT_COMMENTS, CT_DOCUMENT, CT_NUMBERING, CT_STYLES, DOCUMENT_RELS_PATH,
    PACKAGE_RELS_PATH,
};
use crate::xml::XmlDocument;

/// Companion parts of comments.xml that carry per-comment ids of their own.
///
/// They go stale whenever comments are regenerated, so they are dropped.
const COMMENT_COMPANION_RELS: &[&str] = &[
    "http://schemas.microsoft.com/office/2011/relationships/commentsExtended",
    "http://schemas.microsoft.com/office/2016/09/relationships/commentsIds",
    "http://schemas.microsoft.com/office/2018/08/relationships/commentsExtensible",
];

/// Writes document trees into WordprocessingML packages.
///
/// The writer holds only options; all per-export state lives in a session
/// created inside [`DocxWriter::write`], so one writer can serve many
/// exports, also from several threads.
///
/// # Example
///
/// ```no_run
/// use docweave::docx::DocxWriter;
/// use docweave::options::WriteOptions;
/// use docweave::Node;
///
/// let tree = Node::document(vec![Node::paragraph(vec![Node::text("Hello")])]);
/// let writer = DocxWriter::with_options(WriteOptions::default().with_author("Editor"));
/// let bytes = writer.write(&tree, None)?;
/// std::fs::write("hello.docx", bytes)?;
/// # Ok::<(), docweave::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    options: WriteOptions,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Serialize a tree, patching `original` in place when given.
    pub fn write(&self, tree: &Node, original: Option<&[u8]>) -> Result<Vec<u8>> {
        let Node::Document { attrs, content } = tree else {
            return Err(Error::UnsupportedStructure(format!(
                "root node must be a document, found {}",
                tree.kind()
            )));
        };
        let tree_max = max_tree_num_id(tree);

        match original {
            Some(bytes) => self.write_in_place(attrs, content, tree_max, bytes),
            None => self.write_fresh(attrs, content, tree_max),
        }
    }

    fn write_fresh(&self, attrs: &DocumentAttrs, content: &[Node], tree_max: u32) -> Result<Vec<u8>> {
        let mut session =
            SerializationSession::new(&self.options, NumberingAllocator::fresh(tree_max));
        let body = body::write_body(&mut session, content)?;
        let section = parts::section_xml(attrs, None)?;

        let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut overrides = vec![
            ("word/document.xml", CT_DOCUMENT),
            ("word/styles.xml", CT_STYLES),
            ("word/numbering.xml", CT_NUMBERING),
        ];
        let mut document_rels = vec![
            ("rId1", REL_STYLES, "styles.xml"),
            ("rId2", REL_NUMBERING, "numbering.xml"),
        ];

        files.insert(
            "word/document.xml".to_string(),
            parts::document_xml(None, &body, &section)?.into_bytes(),
        );
        files.insert(
            "word/styles.xml".to_string(),
            parts::styles_xml(&session.styles_used)?.into_bytes(),
        );
        files.insert(
            "word/numbering.xml".to_string(),
            parts::numbering_xml(&session.numbering)?.into_bytes(),
        );
        if !session.comments.is_empty() {
            files.insert(
                "word/comments.xml".to_string(),
                parts::comments_xml(session.comments.entries())?.into_bytes(),
            );
            overrides.push(("word/comments.xml", CT_COMMENTS));
            document_rels.push(("rId3", REL_COMMENTS, "comments.xml"));
        }

        files.insert(
            CONTENT_TYPES_PATH.to_string(),
            package::content_types_xml(&overrides).into_bytes(),
        );
        files.insert(
            PACKAGE_RELS_PATH.to_string(),
            package::relationships_xml(&[("rId1", REL_OFFICE_DOCUMENT, "word/document.xml")])
                .into_bytes(),
        );
        files.insert(
            DOCUMENT_RELS_PATH.to_string(),
            package::relationships_xml(&document_rels).into_bytes(),
        );

        debug!(
            "fresh package: {} numbering definitions, {} comments, {} revisions",
            session.numbering.definitions().len(),
            session.comments.entries().len(),
            session.revisions.insertions() + session.revisions.deletions()
        );
        package::build_package(&files, self.options.compression)
    }

    fn write_in_place(
        &self,
        attrs: &DocumentAttrs,
        content: &[Node],
        tree_max: u32,
        original: &[u8],
    ) -> Result<Vec<u8>> {
        detect_package(original)?;
        let container = Container::from_bytes(original.to_vec())?;
        let main_path = container.main_document_path()?;
        let original_doc = XmlDocument::parse(&container.read_xml(&main_path)?)
            .map_err(|e| e.in_part(&main_path))?;

        let numbering_rel = container.related_part(&main_path, REL_NUMBERING)?;
        let numbering_path = numbering_rel
            .clone()
            .unwrap_or_else(|| sibling_path(&main_path, "numbering.xml"));
        let original_numbering = container.read_optional_xml(&numbering_path)?;
        let numbering_map = match original_numbering.as_deref().map(NumberingMap::parse) {
            Some(Ok(map)) => map,
            Some(Err(e)) => {
                return Err(e.in_part(&numbering_path));
            }
            None => NumberingMap::default(),
        };

        let mut session = SerializationSession::new(
            &self.options,
            NumberingAllocator::in_place(&numbering_map, tree_max),
        );
        let body = body::write_body(&mut session, content)?;
        let original_section = original_doc
            .root
            .child("w:body")
            .and_then(|b| b.child("w:sectPr"));
        let section = parts::section_xml(attrs, original_section)?;

        let mut replaced: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut removed: HashSet<String> = HashSet::new();
        replaced.insert(
            main_path.clone(),
            parts::document_xml(Some(&original_doc.root), &body, &section)?.into_bytes(),
        );

        let rels_path = rels_path_for(&main_path);
        let original_rels = container.read_optional_xml(&rels_path)?;
        let mut rels = original_rels
            .clone()
            .unwrap_or_else(|| package::relationships_xml(&[]));
        let original_types = container.read_optional_xml(CONTENT_TYPES_PATH)?;
        let mut types = match &original_types {
            Some(types) => types.clone(),
            None => {
                warn!("original package has no content types, rebuilding them");
                package::content_types_xml(&[(&main_path, CT_DOCUMENT)])
            }
        };

        // numbering.xml always exists in the output
        match &original_numbering {
            Some(xml) if session.numbering.is_empty() => {
                debug!("numbering unchanged, {} bytes", xml.len());
            }
            Some(xml) => {
                replaced.insert(
                    numbering_path.clone(),
                    parts::merge_numbering(xml, &session.numbering)?.into_bytes(),
                );
            }
            None => {
                replaced.insert(
                    numbering_path.clone(),
                    parts::numbering_xml(&session.numbering)?.into_bytes(),
                );
            }
        }
        if numbering_rel.is_none() {
            let target = relative_target(&main_path, &numbering_path);
            rels = package::ensure_relationship(&rels, REL_NUMBERING, &target)?.0;
        }
        types = package::ensure_content_type_override(&types, &numbering_path, CT_NUMBERING)?;

        // styles.xml is kept as is, or created when the original lacks one
        let styles_path = container
            .related_part(&main_path, REL_STYLES)?
            .unwrap_or_else(|| sibling_path(&main_path, "styles.xml"));
        if !container.exists(&styles_path) {
            replaced.insert(
                styles_path.clone(),
                parts::styles_xml(&session.styles_used)?.into_bytes(),
            );
            let target = relative_target(&main_path, &styles_path);
            rels = package::ensure_relationship(&rels, REL_STYLES, &target)?.0;
            types = package::ensure_content_type_override(&types, &styles_path, CT_STYLES)?;
        }

        // Comments are regenerated from the tree
        let comments_rel = container.related_part(&main_path, REL_COMMENTS)?;
        let comments_path = comments_rel
            .clone()
            .unwrap_or_else(|| sibling_path(&main_path, "comments.xml"));
        let original_rel_set = container.read_relationships(&main_path)?;
        for rel in &original_rel_set.entries {
            if COMMENT_COMPANION_RELS.contains(&rel.rel_type.as_str()) && !rel.external {
                let path = resolve_path(&main_path, &rel.target);
                types = package::remove_content_type_override(&types, &path)?;
                removed.insert(path);
            }
        }
        rels = package::remove_relationships(&rels, COMMENT_COMPANION_RELS)?;

        if session.comments.is_empty() {
            if comments_rel.is_some() || container.exists(&comments_path) {
                removed.insert(comments_path.clone());
                rels = package::remove_relationships(&rels, &[REL_COMMENTS])?;
                types = package::remove_content_type_override(&types, &comments_path)?;
            }
        } else {
            replaced.insert(
                comments_path.clone(),
                parts::comments_xml(session.comments.entries())?.into_bytes(),
            );
            if comments_rel.is_none() {
                let target = relative_target(&main_path, &comments_path);
                rels = package::ensure_relationship(&rels, REL_COMMENTS, &target)?.0;
            }
            types = package::ensure_content_type_override(&types, &comments_path, CT_COMMENTS)?;
        }

        if original_rels.as_deref() != Some(rels.as_str()) {
            replaced.insert(rels_path, rels.into_bytes());
        }
        if original_types.as_deref() != Some(types.as_str()) {
            replaced.insert(CONTENT_TYPES_PATH.to_string(), types.into_bytes());
        }

        debug!(
            "in-place package: {} parts rebuilt, {} removed",
            replaced.len(),
            removed.len()
        );
        package::patch_package(&container, &replaced, &removed, self.options.compression)
    }
}

/// Path of a part next to `part` (`word/document.xml` -> `word/<name>`).
fn sibling_path(part: &str, name: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, name),
        None => name.to_string(),
    }
}

/// Relationship target of `path` as seen from `source`.
fn relative_target(source: &str, path: &str) -> String {
    let dir = source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if dir.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(relative) => relative.to_string(),
        None => format!("/{}", path),
    }
}
