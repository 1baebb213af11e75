//! Body emission: document tree -> `w:body` content.
//!
//! Every function takes the export's [`SerializationSession`] by `&mut` and
//! appends WordprocessingML to `out`. List nesting depth is an explicit
//! parameter. Shape errors carry the path of the offending node.

use std::fmt::Write as _;

use log::warn;

use super::session::{SerializationSession, MAX_LIST_LEVEL};
use crate::docx::numbering::ListKind;
use crate::error::{Error, Result};
use crate::model::{
    CellAttrs, ChangeAttrs, ListAttrs, MarkKind, MarkSet, Node, NodeKind, ParagraphAttrs, RowAttrs,
    TableAttrs,
};
use crate::units;
use crate::xml::escape;

/// Twips of indentation per list depth for continuation paragraphs.
const LIST_INDENT_STEP: i32 = 720;

/// Text width of an A4 page with one-inch margins, in twips.
const DEFAULT_TABLE_WIDTH: u32 = 9026;

const TABLE_LOOK: &str = r#"<w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/>"#;

/// Location of the node being written, e.g. `document > orderedList[0] > listItem[2]`.
#[derive(Debug)]
struct NodePath(Vec<String>);

impl NodePath {
    fn root() -> Self {
        NodePath(vec![NodeKind::Document.to_string()])
    }

    fn push(&mut self, kind: NodeKind, index: usize) {
        self.0.push(format!("{}[{}]", kind, index));
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn unsupported(&self, what: impl std::fmt::Display) -> Error {
        Error::UnsupportedStructure(format!("{} at {}", what, self.0.join(" > ")))
    }
}

/// Serialize the block content of a document into `w:body` children.
pub(crate) fn write_body(session: &mut SerializationSession<'_>, content: &[Node]) -> Result<String> {
    let mut out = String::with_capacity(content.len() * 256);
    let mut path = NodePath::root();
    write_blocks(session, &mut out, content, &mut path)?;
    Ok(out)
}

fn write_blocks(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    nodes: &[Node],
    path: &mut NodePath,
) -> Result<()> {
    for (index, node) in nodes.iter().enumerate() {
        path.push(node.kind(), index);
        write_block(session, out, node, path)?;
        path.pop();
    }
    Ok(())
}

fn write_block(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    node: &Node,
    path: &mut NodePath,
) -> Result<()> {
    match node {
        Node::Paragraph { .. } | Node::Heading { .. } => {
            write_text_block(session, out, node, ListPosition::None, path)
        }
        Node::BulletList { attrs, content } => {
            write_list(session, out, ListKind::Bullet, attrs, content, 0, None, path)
        }
        Node::OrderedList { attrs, content } => {
            write_list(session, out, ListKind::Ordered, attrs, content, 0, None, path)
        }
        Node::Table { attrs, content } => write_table(session, out, attrs, content, path),
        Node::ListItem { .. } => Err(path.unsupported("listItem outside a list")),
        Node::TableRow { .. } | Node::TableCell { .. } => {
            Err(path.unsupported(format!("{} outside a table", node.kind())))
        }
        Node::Text { .. } | Node::HardBreak { .. } => {
            Err(path.unsupported(format!("inline {} at block level", node.kind())))
        }
        Node::Document { .. } => Err(path.unsupported("nested document")),
    }
}

// --- paragraphs ---

/// Where a paragraph sits inside a list item.
#[derive(Debug, Clone, Copy)]
enum ListPosition {
    None,
    /// First paragraph of an item: carries the numbering
    Numbered { num_id: u32, level: u8 },
    /// Later paragraph of an item at the given depth
    Continuation { depth: u8 },
}

fn write_text_block(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    node: &Node,
    list: ListPosition,
    path: &mut NodePath,
) -> Result<()> {
    let (attrs, heading, content) = match node {
        Node::Paragraph { attrs, content } => (attrs, None, content.as_slice()),
        Node::Heading { attrs, content } => {
            if !(1..=6).contains(&attrs.level) {
                return Err(path.unsupported(format!("heading level {}", attrs.level)));
            }
            (&attrs.paragraph, Some(attrs.level), content.as_slice())
        }
        other => return Err(path.unsupported(format!("{} is not a paragraph", other.kind()))),
    };

    out.push_str("<w:p>");
    write_paragraph_props(session, out, attrs, heading, list)?;
    write_inlines(session, out, content, path)?;
    out.push_str("</w:p>");
    Ok(())
}

fn toggle(out: &mut String, name: &str, value: Option<bool>) {
    match value {
        Some(true) => {
            let _ = write!(out, "<{}/>", name);
        }
        Some(false) => {
            let _ = write!(out, r#"<{} w:val="0"/>"#, name);
        }
        None => {}
    }
}

fn write_paragraph_props(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    attrs: &ParagraphAttrs,
    heading: Option<u8>,
    list: ListPosition,
) -> Result<()> {
    let mut ppr = String::new();
    let in_list = !matches!(list, ListPosition::None);

    let style = attrs
        .style_id
        .clone()
        .or_else(|| heading.map(|level| format!("Heading{}", level)))
        .or_else(|| in_list.then(|| "ListParagraph".to_string()));
    if let Some(style) = &style {
        session.use_style(style);
        write!(ppr, r#"<w:pStyle w:val="{}"/>"#, escape(style))?;
    }

    toggle(&mut ppr, "w:keepNext", attrs.keep_next);
    toggle(&mut ppr, "w:keepLines", attrs.keep_lines);

    if let ListPosition::Numbered { num_id, level } = list {
        write!(
            ppr,
            r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
            level, num_id
        )?;
    }

    toggle(&mut ppr, "w:snapToGrid", attrs.snap_to_grid);

    if attrs.spacing_before.is_some() || attrs.spacing_after.is_some() || attrs.line_height.is_some()
    {
        ppr.push_str("<w:spacing");
        if let Some(before) = attrs.spacing_before {
            write!(ppr, r#" w:before="{}""#, units::points_to_twips(before))?;
        }
        if let Some(after) = attrs.spacing_after {
            write!(ppr, r#" w:after="{}""#, units::points_to_twips(after))?;
        }
        if let Some(line) = attrs.line_height {
            write!(ppr, r#" w:line="{}""#, line)?;
            if let Some(rule) = attrs.line_rule {
                write!(ppr, r#" w:lineRule="{}""#, rule.as_ooxml())?;
            }
        }
        ppr.push_str("/>");
    }

    let left = attrs.indent.map(|i| i.to_twips()).or(match list {
        ListPosition::Continuation { depth } => Some(LIST_INDENT_STEP * (i32::from(depth) + 1)),
        _ => None,
    });
    if left.is_some()
        || attrs.right_indent.is_some()
        || attrs.hanging.is_some()
        || attrs.first_line_indent.is_some()
    {
        ppr.push_str("<w:ind");
        if let Some(left) = left {
            write!(ppr, r#" w:left="{}""#, left)?;
        }
        if let Some(right) = attrs.right_indent {
            write!(ppr, r#" w:right="{}""#, right)?;
        }
        // hanging and firstLine are exclusive; hanging wins
        if let Some(hanging) = attrs.hanging {
            write!(ppr, r#" w:hanging="{}""#, hanging)?;
        } else if let Some(first_line) = attrs.first_line_indent {
            write!(ppr, r#" w:firstLine="{}""#, first_line)?;
        }
        ppr.push_str("/>");
    }

    toggle(&mut ppr, "w:contextualSpacing", attrs.contextual_spacing);

    if let Some(align) = attrs.text_align {
        write!(ppr, r#"<w:jc w:val="{}"/>"#, align.as_ooxml())?;
    }

    if attrs.has_run_defaults() {
        ppr.push_str("<w:rPr>");
        if let Some(font) = &attrs.font_family {
            write_fonts(&mut ppr, font)?;
        }
        if let Some(size) = attrs.font_size {
            let half_points = units::points_to_half_points(size);
            write!(ppr, r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, half_points)?;
        }
        ppr.push_str("</w:rPr>");
    }

    if !ppr.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(&ppr);
        out.push_str("</w:pPr>");
    }
    Ok(())
}

fn write_fonts(out: &mut String, font: &str) -> Result<()> {
    write!(
        out,
        r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
        escape(font)
    )?;
    Ok(())
}

// --- inline content ---

/// Write paragraph content, keeping each comment's range contiguous.
///
/// One range is open at a time. When the comment on the next run differs
/// from the open one, the open range is closed (end marker plus reference
/// run) before the next one starts. Any open range closes at the paragraph
/// end.
fn write_inlines(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    content: &[Node],
    path: &mut NodePath,
) -> Result<()> {
    let mut active: Option<u32> = None;

    for (index, node) in content.iter().enumerate() {
        let marks = match node {
            Node::Text { text, .. } if text.is_empty() => continue,
            Node::Text { marks, .. } | Node::HardBreak { marks } => marks,
            other => {
                path.push(other.kind(), index);
                return Err(path.unsupported(format!("{} inside a paragraph", other.kind())));
            }
        };

        let comment = marks.comment().map(|c| session.register_comment(c));
        if comment != active {
            if let Some(id) = active {
                close_comment(out, id)?;
            }
            if let Some(id) = comment {
                write!(out, r#"<w:commentRangeStart w:id="{}"/>"#, id)?;
            }
            active = comment;
        }

        write_run(session, out, node, marks)?;
    }

    if let Some(id) = active {
        close_comment(out, id)?;
    }
    Ok(())
}

fn close_comment(out: &mut String, id: u32) -> Result<()> {
    write!(
        out,
        r#"<w:commentRangeEnd w:id="{0}"/><w:r><w:commentReference w:id="{0}"/></w:r>"#,
        id
    )?;
    Ok(())
}

fn write_run(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    node: &Node,
    marks: &MarkSet,
) -> Result<()> {
    let insertion = marks.insertion();
    let deletion = marks.deletion();

    let mut run = String::from("<w:r>");
    write_run_props(&mut run, marks)?;
    match node {
        Node::Text { text, .. } => write_run_text(&mut run, text, deletion.is_some()),
        _ => run.push_str("<w:br/>"),
    }
    run.push_str("</w:r>");

    // The insertion wrapper is outermost, so it takes the lower id
    let insertion_id = insertion.map(|_| session.revisions.next_insertion());
    let deletion_id = deletion.map(|_| session.revisions.next_deletion());

    if let (Some(change), Some(id)) = (deletion, deletion_id) {
        run = revision(session, "w:del", id, change, &run);
    }
    if let (Some(change), Some(id)) = (insertion, insertion_id) {
        run = revision(session, "w:ins", id, change, &run);
    }
    out.push_str(&run);
    Ok(())
}

fn revision(
    session: &SerializationSession<'_>,
    tag: &str,
    id: u32,
    change: &ChangeAttrs,
    inner: &str,
) -> String {
    let author = change
        .author
        .as_deref()
        .unwrap_or(&session.options.default_author);
    let date = change.date.as_deref().unwrap_or(&session.timestamp);
    format!(
        r#"<{tag} w:id="{id}" w:author="{}" w:date="{}">{inner}</{tag}>"#,
        escape(author),
        escape(date)
    )
}

fn write_run_props(out: &mut String, marks: &MarkSet) -> Result<()> {
    let mut rpr = String::new();
    let style = marks.text_style();

    if let Some(font) = style.and_then(|s| s.font_family.as_deref()) {
        write_fonts(&mut rpr, font)?;
    }
    if marks.contains(MarkKind::Bold) {
        rpr.push_str("<w:b/>");
    }
    if marks.contains(MarkKind::Italic) {
        rpr.push_str("<w:i/>");
    }
    if marks.contains(MarkKind::Strike) {
        rpr.push_str("<w:strike/>");
    }
    if let Some(color) = style
        .and_then(|s| s.color.as_deref())
        .and_then(units::color_to_ooxml)
    {
        write!(rpr, r#"<w:color w:val="{}"/>"#, color)?;
    }
    if let Some(size) = style
        .and_then(|s| s.font_size.as_deref())
        .and_then(units::parse_font_size)
    {
        write!(rpr, r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, size)?;
    }

    let mut shading = None;
    if let Some(color) = marks.highlight().and_then(|h| h.color.as_deref()) {
        match units::hex_to_highlight(color) {
            Some(name) => write!(rpr, r#"<w:highlight w:val="{}"/>"#, name)?,
            None => shading = units::color_to_ooxml(color),
        }
    }
    if marks.contains(MarkKind::Underline) {
        rpr.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(fill) = shading {
        write!(rpr, r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#, fill)?;
    }

    if !rpr.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&rpr);
        out.push_str("</w:rPr>");
    }
    Ok(())
}

/// Run text with tabs, line breaks and special hyphens as their elements.
fn write_run_text(out: &mut String, text: &str, deleted: bool) {
    let tag = if deleted { "w:delText" } else { "w:t" };
    let mut segment = String::new();

    for ch in text.chars() {
        let element = match ch {
            '\t' => "<w:tab/>",
            '\n' => "<w:br/>",
            '\u{2011}' => "<w:noBreakHyphen/>",
            '\u{00AD}' => "<w:softHyphen/>",
            '\r' => continue,
            _ => {
                segment.push(ch);
                continue;
            }
        };
        flush_segment(out, tag, &mut segment);
        out.push_str(element);
    }
    flush_segment(out, tag, &mut segment);
}

fn flush_segment(out: &mut String, tag: &str, segment: &mut String) {
    if segment.is_empty() {
        return;
    }
    let preserve = segment.trim() != segment.as_str() || segment.contains("  ");
    if preserve {
        let _ = write!(out, r#"<{0} xml:space="preserve">{1}</{0}>"#, tag, escape(segment));
    } else {
        let _ = write!(out, "<{0}>{1}</{0}>", tag, escape(segment));
    }
    segment.clear();
}

// --- lists ---

#[allow(clippy::too_many_arguments)]
fn write_list(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    kind: ListKind,
    attrs: &ListAttrs,
    items: &[Node],
    depth: u8,
    parent: Option<(ListKind, u32)>,
    path: &mut NodePath,
) -> Result<()> {
    let num_id = session.numbering.resolve(kind, attrs, depth, parent);

    for (index, item) in items.iter().enumerate() {
        path.push(item.kind(), index);
        let Node::ListItem { content } = item else {
            return Err(path.unsupported(format!("{} inside a list", item.kind())));
        };
        write_list_item(session, out, kind, num_id, content, depth, path)?;
        path.pop();
    }
    Ok(())
}

fn write_list_item(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    kind: ListKind,
    num_id: u32,
    content: &[Node],
    depth: u8,
    path: &mut NodePath,
) -> Result<()> {
    let level = depth.min(MAX_LIST_LEVEL);

    if content.is_empty() {
        let empty = Node::paragraph(Vec::new());
        return write_text_block(
            session,
            out,
            &empty,
            ListPosition::Numbered { num_id, level },
            path,
        );
    }

    let mut numbered = false;
    for (index, child) in content.iter().enumerate() {
        path.push(child.kind(), index);
        match child {
            Node::Paragraph { .. } | Node::Heading { .. } => {
                let position = if numbered {
                    ListPosition::Continuation { depth }
                } else {
                    ListPosition::Numbered { num_id, level }
                };
                numbered = true;
                write_text_block(session, out, child, position, path)?;
            }
            Node::BulletList { attrs, content } => write_list(
                session,
                out,
                ListKind::Bullet,
                attrs,
                content,
                depth.saturating_add(1),
                Some((kind, num_id)),
                path,
            )?,
            Node::OrderedList { attrs, content } => write_list(
                session,
                out,
                ListKind::Ordered,
                attrs,
                content,
                depth.saturating_add(1),
                Some((kind, num_id)),
                path,
            )?,
            other => write_block(session, out, other, path)?,
        }
        path.pop();
    }
    Ok(())
}

// --- tables ---

/// A grid position of an output row.
#[derive(Debug)]
enum Slot<'a> {
    Cell {
        attrs: &'a CellAttrs,
        content: &'a [Node],
        index: usize,
        col: usize,
        span: usize,
        restart: bool,
    },
    /// A `vMerge` continuation of a cell in an earlier row
    Continue { col: usize, span: usize },
}

impl Slot<'_> {
    fn end(&self) -> usize {
        match self {
            Slot::Cell { col, span, .. } | Slot::Continue { col, span } => col.saturating_add(*span),
        }
    }
}

/// A vertical merge still covering rows below.
#[derive(Debug, Clone, Copy)]
struct OpenMerge {
    col: usize,
    span: usize,
    remaining: u32,
}

struct RowLayout<'a> {
    attrs: &'a RowAttrs,
    slots: Vec<Slot<'a>>,
}

fn continue_merge(
    merge: OpenMerge,
    col: &mut usize,
    slots: &mut Vec<Slot<'_>>,
    open: &mut Vec<OpenMerge>,
) {
    slots.push(Slot::Continue {
        col: *col,
        span: merge.span,
    });
    if merge.remaining > 1 {
        open.push(OpenMerge {
            col: *col,
            span: merge.span,
            remaining: merge.remaining - 1,
        });
    }
    *col = col.saturating_add(merge.span);
}

/// Place cells on the grid, re-expanding rowspans into continuation slots.
fn layout_rows<'a>(rows: &'a [Node], path: &mut NodePath) -> Result<Vec<RowLayout<'a>>> {
    let mut open: Vec<OpenMerge> = Vec::new();
    let mut layout = Vec::with_capacity(rows.len());

    for (r, row) in rows.iter().enumerate() {
        path.push(row.kind(), r);
        let Node::TableRow { attrs, content } = row else {
            return Err(path.unsupported(format!("{} inside a table", row.kind())));
        };

        let mut carried = std::mem::take(&mut open);
        carried.sort_by_key(|m| m.col);
        let mut carried = carried.into_iter().peekable();
        let mut slots = Vec::with_capacity(content.len());
        let mut col = 0;

        for (index, cell) in content.iter().enumerate() {
            let Node::TableCell {
                attrs: cell_attrs,
                content: cell_content,
            } = cell
            else {
                path.push(cell.kind(), index);
                return Err(path.unsupported(format!("{} inside a table row", cell.kind())));
            };

            while let Some(merge) = carried.next_if(|m| m.col <= col) {
                continue_merge(merge, &mut col, &mut slots, &mut open);
            }

            let span = cell_attrs.colspan() as usize;
            let rowspan = cell_attrs.rowspan();
            slots.push(Slot::Cell {
                attrs: cell_attrs,
                content: cell_content,
                index,
                col,
                span,
                restart: rowspan > 1,
            });
            if rowspan > 1 {
                open.push(OpenMerge {
                    col,
                    span,
                    remaining: rowspan - 1,
                });
            }
            col = col.saturating_add(span);
        }
        for merge in carried {
            continue_merge(merge, &mut col, &mut slots, &mut open);
        }

        layout.push(RowLayout { attrs, slots });
        path.pop();
    }

    Ok(layout)
}

/// Grid widths from the first row's pixel widths, when every cell has them.
fn grid_from_widths(first: &RowLayout<'_>) -> Option<Vec<u32>> {
    let mut widths = Vec::new();
    for slot in &first.slots {
        let Slot::Cell { attrs, span, .. } = slot else {
            return None;
        };
        let colwidth = attrs.colwidth.as_ref()?;
        if colwidth.len() != *span || colwidth.contains(&0) {
            return None;
        }
        widths.extend(colwidth.iter().map(|px| units::pixels_to_twips(*px)));
    }
    Some(widths)
}

fn table_grid(attrs: &TableAttrs, layout: &[RowLayout<'_>], columns: usize) -> Vec<u32> {
    if let Some(grid) = attrs.grid.as_ref().filter(|g| g.len() == columns) {
        return grid.clone();
    }
    if let Some(widths) = layout
        .first()
        .and_then(grid_from_widths)
        .filter(|w| w.len() == columns)
    {
        return widths;
    }
    vec![DEFAULT_TABLE_WIDTH / columns.max(1) as u32; columns]
}

fn write_table(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    attrs: &TableAttrs,
    rows: &[Node],
    path: &mut NodePath,
) -> Result<()> {
    let layout = layout_rows(rows, path)?;
    let columns = layout
        .iter()
        .filter_map(|row| row.slots.last().map(Slot::end))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        warn!("skipping table without cells at {}", path.0.join(" > "));
        return Ok(());
    }
    let grid = table_grid(attrs, &layout, columns);

    out.push_str("<w:tbl><w:tblPr>");
    let style = attrs.style_id.as_deref().unwrap_or("TableGrid");
    session.use_style(style);
    write!(
        out,
        r#"<w:tblStyle w:val="{}"/><w:tblW w:w="0" w:type="auto"/>"#,
        escape(style)
    )?;
    if let Some(borders) = &attrs.borders {
        out.push_str("<w:tblBorders>");
        for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            write!(
                out,
                r#"<w:{} w:val="{}" w:sz="{}" w:space="0" w:color="{}"/>"#,
                edge,
                borders.style.as_ooxml(),
                borders.size.unwrap_or(4),
                borders
                    .color
                    .as_deref()
                    .and_then(units::color_to_ooxml)
                    .unwrap_or_else(|| "auto".to_string())
            )?;
        }
        out.push_str("</w:tblBorders>");
    }
    out.push_str(TABLE_LOOK);
    out.push_str("</w:tblPr><w:tblGrid>");
    for width in &grid {
        write!(out, r#"<w:gridCol w:w="{}"/>"#, width)?;
    }
    out.push_str("</w:tblGrid>");

    for (r, row) in layout.iter().enumerate() {
        path.push(NodeKind::TableRow, r);
        out.push_str("<w:tr>");
        if !row.attrs.is_empty() {
            out.push_str("<w:trPr>");
            if let Some(height) = row.attrs.height {
                write!(out, r#"<w:trHeight w:val="{}"/>"#, height)?;
            }
            if row.attrs.header == Some(true) {
                out.push_str("<w:tblHeader/>");
            }
            out.push_str("</w:trPr>");
        }
        for slot in &row.slots {
            write_cell(session, out, slot, &grid, path)?;
        }
        out.push_str("</w:tr>");
        path.pop();
    }

    out.push_str("</w:tbl>");
    Ok(())
}

fn write_cell(
    session: &mut SerializationSession<'_>,
    out: &mut String,
    slot: &Slot<'_>,
    grid: &[u32],
    path: &mut NodePath,
) -> Result<()> {
    let (col, span) = match slot {
        Slot::Cell { col, span, .. } | Slot::Continue { col, span } => (*col, *span),
    };
    let width = grid
        .iter()
        .skip(col)
        .take(span)
        .fold(0u32, |total, w| total.saturating_add(*w));

    out.push_str("<w:tc><w:tcPr>");
    write!(out, r#"<w:tcW w:w="{}" w:type="dxa"/>"#, width)?;
    if span > 1 {
        write!(out, r#"<w:gridSpan w:val="{}"/>"#, span)?;
    }

    match slot {
        Slot::Continue { .. } => {
            out.push_str("<w:vMerge/></w:tcPr><w:p/></w:tc>");
        }
        Slot::Cell {
            attrs,
            content,
            index,
            restart,
            ..
        } => {
            if *restart {
                out.push_str(r#"<w:vMerge w:val="restart"/>"#);
            }
            if let Some(fill) = attrs.background.as_deref().and_then(units::color_to_ooxml) {
                write!(out, r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#, fill)?;
            }
            if let Some(align) = attrs.vertical_align {
                write!(out, r#"<w:vAlign w:val="{}"/>"#, align.as_ooxml())?;
            }
            out.push_str("</w:tcPr>");

            path.push(NodeKind::TableCell, *index);
            let before = out.len();
            write_blocks(session, out, content, path)?;
            path.pop();

            // A cell must end with a paragraph
            let ends_with_paragraph =
                out.len() > before && (out.ends_with("</w:p>") || out.ends_with("<w:p/>"));
            if !ends_with_paragraph {
                out.push_str("<w:p/>");
            }
            out.push_str("</w:tc>");
        }
    }
    Ok(())
}
