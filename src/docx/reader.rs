//! Package reader: WordprocessingML package -> document tree.

use std::collections::HashSet;

use log::{debug, warn};

use super::comments::CommentMap;
use super::numbering::{ListKind, NumberingMap};
use super::styles::{RunProps, StyleMap};
use crate::container::{Container, REL_COMMENTS, REL_NUMBERING, REL_STYLES};
use crate::detect::detect_package;
use crate::error::{Error, Result};
use crate::model::{
    Alignment, CellAttrs, ChangeAttrs, Columns, DocGrid, DocumentAttrs, HeadingAttrs,
    HighlightAttrs, Indent, LineRule, ListAttrs, Mark, MarkSet, Node, Orientation, PageMargins,
    PageSize, ParagraphAttrs, RowAttrs, SectionProperties, TableAttrs, TableBorders,
    TextStyleAttrs, VerticalAlignment, MAX_GRID_COLUMNS,
};
use crate::options::ReadOptions;
use crate::units::{self, BorderStyle};
use crate::xml::{XmlDocument, XmlElement};

/// Reads WordprocessingML packages into document trees.
///
/// # Example
///
/// ```no_run
/// use docweave::docx::DocxReader;
///
/// let data = std::fs::read("report.docx")?;
/// let tree = DocxReader::new().read(&data)?;
/// println!("{}", tree.plain_text());
/// # Ok::<(), docweave::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocxReader {
    options: ReadOptions,
}

impl DocxReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Read package bytes into a document tree.
    pub fn read(&self, data: &[u8]) -> Result<Node> {
        let kind = detect_package(data)?;
        debug!("reading {}", kind);

        let container = Container::from_bytes(data.to_vec())?;
        let main_path = container.main_document_path()?;
        let document_xml = container.read_xml(&main_path)?;
        let document = XmlDocument::parse(&document_xml).map_err(|e| e.in_part(&main_path))?;

        let styles = self.load_part(&container, &main_path, REL_STYLES, "word/styles.xml", |xml| {
            StyleMap::parse(xml)
        })?;
        let numbering = self.load_part(
            &container,
            &main_path,
            REL_NUMBERING,
            "word/numbering.xml",
            NumberingMap::parse,
        )?;
        let comments = self.load_part(
            &container,
            &main_path,
            REL_COMMENTS,
            "word/comments.xml",
            CommentMap::parse,
        )?;
        debug!(
            "loaded {} styles, {} numbering ids, {} comments",
            styles.styles.len(),
            numbering.instances.len(),
            comments.len()
        );

        let body = document
            .root
            .child("w:body")
            .ok_or_else(|| Error::malformed(&main_path, "missing w:body"))?;

        let mut ctx = ReadContext {
            styles,
            numbering,
            comments,
            options: self.options.clone(),
            active_comments: Vec::new(),
            warned_styles: HashSet::new(),
        };

        let content = ctx.read_blocks(body)?;
        let attrs = match body.child("w:sectPr") {
            Some(sect) => DocumentAttrs {
                section: Some(read_section(sect)),
                raw_section: if self.options.capture_raw_section {
                    Some(sect.to_xml()?)
                } else {
                    None
                },
            },
            None => {
                warn!("document has no section properties");
                DocumentAttrs::default()
            }
        };

        Ok(Node::Document { attrs, content })
    }

    /// Load an optional part through the document relationships.
    ///
    /// Unparsable parts degrade to an empty definition unless
    /// `strict_styles` is set.
    fn load_part<T: Default>(
        &self,
        container: &Container,
        main_path: &str,
        rel_type: &str,
        fallback: &str,
        parse: impl Fn(&str) -> Result<T>,
    ) -> Result<T> {
        let path = container
            .related_part(main_path, rel_type)?
            .unwrap_or_else(|| fallback.to_string());
        let Some(xml) = container.read_optional_xml(&path)? else {
            return Ok(T::default());
        };
        match parse(&xml) {
            Ok(parsed) => Ok(parsed),
            Err(e) if self.options.strict_styles => Err(e.in_part(&path)),
            Err(e) => {
                warn!("ignoring unparsable {}: {}", path, e);
                Ok(T::default())
            }
        }
    }
}

/// Numbering reference of a list paragraph.
#[derive(Debug, Clone, Copy)]
struct ListRef {
    num_id: u32,
    level: u8,
    kind: ListKind,
    start: u32,
}

/// Track-change state inherited by runs.
#[derive(Debug, Clone, Default)]
struct RunContext {
    insertion: Option<ChangeAttrs>,
    deletion: Option<ChangeAttrs>,
}

struct ReadContext {
    styles: StyleMap,
    numbering: NumberingMap,
    comments: CommentMap,
    options: ReadOptions,
    /// Comment ids whose range is open, innermost last
    active_comments: Vec<String>,
    warned_styles: HashSet<String>,
}

impl ReadContext {
    /// Read the block-level children of a body, cell or content control.
    fn read_blocks(&mut self, parent: &XmlElement) -> Result<Vec<Node>> {
        let mut out = Vec::new();
        let mut lists = ListBuilder::default();
        self.read_block_children(parent, &mut out, &mut lists)?;
        lists.flush(&mut out);
        Ok(out)
    }

    fn read_block_children(
        &mut self,
        parent: &XmlElement,
        out: &mut Vec<Node>,
        lists: &mut ListBuilder,
    ) -> Result<()> {
        for el in parent.elements() {
            match el.name.as_str() {
                "w:p" => {
                    let (node, list) = self.read_paragraph(el)?;
                    match list {
                        Some(list) => lists.push_item(out, list, node),
                        None => {
                            lists.flush(out);
                            out.push(node);
                        }
                    }
                }
                "w:tbl" => {
                    lists.flush(out);
                    let table = self.read_table(el)?;
                    out.push(table);
                }
                // Block-level content controls and custom XML are transparent
                "w:sdt" => {
                    if let Some(content) = el.child("w:sdtContent") {
                        self.read_block_children(content, out, lists)?;
                    }
                }
                "w:customXml" => self.read_block_children(el, out, lists)?,
                "w:commentRangeStart" | "w:commentRangeEnd" => self.track_comment(el),
                _ => {}
            }
        }
        Ok(())
    }

    fn track_comment(&mut self, el: &XmlElement) {
        let Some(id) = el.attr("w:id") else {
            return;
        };
        if el.is("w:commentRangeStart") {
            if !self.active_comments.iter().any(|c| c == id) {
                self.active_comments.push(id.to_string());
            }
        } else {
            self.active_comments.retain(|c| c != id);
        }
    }

    /// The comment mark for the innermost open range.
    fn comment_mark(&self) -> Option<Mark> {
        let id = self.active_comments.last()?;
        match self.comments.get(id) {
            Some(body) => Some(Mark::comment(
                id.clone(),
                body.author.clone(),
                body.date.clone(),
                Some(body.content.clone()),
            )),
            None => Some(Mark::comment(id.clone(), None, None, None)),
        }
    }

    fn read_paragraph(&mut self, p: &XmlElement) -> Result<(Node, Option<ListRef>)> {
        let ppr = p.child("w:pPr");
        let style_id = ppr.and_then(|ppr| ppr.child_val("w:pStyle")).map(String::from);
        if let Some(id) = &style_id {
            if !self.styles.styles.is_empty()
                && !self.styles.contains(id)
                && self.warned_styles.insert(id.clone())
            {
                warn!("unknown paragraph style '{}'", id);
            }
        }

        let mut attrs = ppr.map(read_paragraph_props).unwrap_or_default();
        attrs.style_id = style_id.clone();
        if !attrs.has_run_defaults() {
            if let Some(id) = &style_id {
                let props = self.styles.run_props(id);
                attrs.font_family = props.font_name;
                attrs.font_size = props.font_size.map(units::half_points_to_points);
            }
        }

        let heading_level = style_id
            .as_deref()
            .and_then(|id| self.styles.heading_level(id))
            .or_else(|| {
                ppr.and_then(|ppr| ppr.child_val("w:outlineLvl"))
                    .and_then(|v| v.parse::<u8>().ok())
                    .filter(|l| *l < 6)
                    .map(|l| l + 1)
            });

        let list = ppr.and_then(|ppr| self.read_numbering(ppr));

        let mut content = Vec::new();
        self.read_inlines(p, &RunContext::default(), &mut content);
        if self.options.merge_adjacent_text {
            content = merge_adjacent_text(content);
        }

        let node = match heading_level {
            Some(level) => Node::Heading {
                attrs: HeadingAttrs {
                    level,
                    paragraph: attrs,
                },
                content,
            },
            None => Node::Paragraph { attrs, content },
        };
        Ok((node, list))
    }

    fn read_numbering(&self, ppr: &XmlElement) -> Option<ListRef> {
        let num_pr = ppr.child("w:numPr")?;
        let num_id: u32 = num_pr.child_val("w:numId")?.parse().ok()?;
        // numId 0 removes numbering
        if num_id == 0 {
            return None;
        }
        let level: u8 = num_pr
            .child_val("w:ilvl")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        match self.numbering.list_info(num_id, level) {
            Some((kind, start)) => Some(ListRef {
                num_id,
                level,
                kind,
                start,
            }),
            None => {
                warn!(
                    "numbering id {} has no definition, reading paragraph as plain text",
                    num_id
                );
                None
            }
        }
    }

    /// Read the inline content of a paragraph or inline container.
    fn read_inlines(&mut self, parent: &XmlElement, ctx: &RunContext, out: &mut Vec<Node>) {
        for el in parent.elements() {
            match el.name.as_str() {
                "w:r" => self.read_run(el, ctx, out),
                "w:ins" | "w:moveTo" => {
                    let ctx = RunContext {
                        insertion: Some(change_attrs(el)),
                        ..ctx.clone()
                    };
                    self.read_inlines(el, &ctx, out);
                }
                "w:del" | "w:moveFrom" => {
                    let ctx = RunContext {
                        deletion: Some(change_attrs(el)),
                        ..ctx.clone()
                    };
                    self.read_inlines(el, &ctx, out);
                }
                "w:hyperlink" | "w:smartTag" | "w:customXml" | "w:fldSimple" | "w:dir"
                | "w:bdo" | "w:sdtContent" => self.read_inlines(el, ctx, out),
                "w:sdt" => {
                    if let Some(content) = el.child("w:sdtContent") {
                        self.read_inlines(content, ctx, out);
                    }
                }
                "w:commentRangeStart" | "w:commentRangeEnd" => self.track_comment(el),
                _ => {}
            }
        }
    }

    fn read_run(&mut self, r: &XmlElement, ctx: &RunContext, out: &mut Vec<Node>) {
        let marks = self.run_marks(r.child("w:rPr"), ctx);
        let mut text = String::new();

        for child in r.elements() {
            match child.name.as_str() {
                "w:t" | "w:delText" => text.push_str(&child.text()),
                "w:tab" | "w:ptab" => text.push('\t'),
                "w:noBreakHyphen" => text.push('\u{2011}'),
                "w:softHyphen" => text.push('\u{00AD}'),
                "w:br" | "w:cr" => {
                    flush_text(&mut text, &marks, out);
                    out.push(Node::HardBreak {
                        marks: marks.clone(),
                    });
                }
                _ => {}
            }
        }
        flush_text(&mut text, &marks, out);
    }

    fn run_marks(&self, rpr: Option<&XmlElement>, ctx: &RunContext) -> MarkSet {
        let mut props = RunProps::default();
        let mut shading = None;
        if let Some(rpr) = rpr {
            if let Some(style) = rpr.child_val("w:rStyle") {
                props = self.styles.run_props(style);
            }
            let (direct, shd) = read_run_props(rpr);
            props.merge(&direct);
            shading = shd;
        }

        let mut marks = MarkSet::new();
        if props.bold == Some(true) {
            marks.insert(Mark::Bold);
        }
        if props.italic == Some(true) {
            marks.insert(Mark::Italic);
        }
        if props.underline == Some(true) {
            marks.insert(Mark::Underline);
        }
        if props.strike == Some(true) {
            marks.insert(Mark::Strike);
        }

        let text_style = TextStyleAttrs {
            color: props.color.as_deref().and_then(units::normalize_color),
            font_size: props
                .font_size
                .map(|hp| units::format_points(units::half_points_to_points(hp))),
            font_family: props.font_name.clone(),
        };
        if !text_style.is_empty() {
            marks.insert(Mark::TextStyle { attrs: text_style });
        }

        let highlight = props
            .highlight
            .as_deref()
            .and_then(units::highlight_to_hex)
            .map(String::from)
            .or(shading);
        if let Some(color) = highlight {
            marks.insert(Mark::Highlight {
                attrs: HighlightAttrs { color: Some(color) },
            });
        }

        if let Some(attrs) = &ctx.insertion {
            marks.insert(Mark::Insertion {
                attrs: attrs.clone(),
            });
        }
        if let Some(attrs) = &ctx.deletion {
            marks.insert(Mark::Deletion {
                attrs: attrs.clone(),
            });
        }
        if let Some(comment) = self.comment_mark() {
            marks.insert(comment);
        }
        marks
    }

    fn read_table(&mut self, tbl: &XmlElement) -> Result<Node> {
        let mut attrs = TableAttrs::default();
        if let Some(tbl_pr) = tbl.child("w:tblPr") {
            attrs.style_id = tbl_pr.child_val("w:tblStyle").map(String::from);
            attrs.borders = tbl_pr.child("w:tblBorders").and_then(read_borders);
        }
        let grid: Vec<u32> = tbl
            .child("w:tblGrid")
            .map(|g| {
                g.children_named("w:gridCol")
                    .filter_map(|c| c.attr_parse::<u32>("w:w"))
                    .collect()
            })
            .unwrap_or_default();
        if !grid.is_empty() {
            attrs.grid = Some(grid.clone());
        }

        let rows = collect_rows(tbl);
        let layouts: Vec<Vec<RawCell>> = rows.iter().map(|row| layout_row(row)).collect();

        let mut content = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            let mut row_attrs = RowAttrs::default();
            if let Some(tr_pr) = row.child("w:trPr") {
                row_attrs.height = tr_pr
                    .child("w:trHeight")
                    .and_then(|h| h.attr_parse("w:val"));
                if tr_pr.child_flag("w:tblHeader") == Some(true) {
                    row_attrs.header = Some(true);
                }
            }

            let mut cells = Vec::new();
            for cell in &layouts[r] {
                if cell.merge == VMerge::Continue {
                    continue;
                }
                let rowspan = match cell.merge {
                    VMerge::Restart => 1 + count_continuations(&layouts[r + 1..], cell.col),
                    _ => 1,
                };
                cells.push(self.read_cell(cell, rowspan, &grid)?);
            }
            content.push(Node::TableRow {
                attrs: row_attrs,
                content: cells,
            });
        }

        Ok(Node::Table { attrs, content })
    }

    fn read_cell(&mut self, cell: &RawCell<'_>, rowspan: u32, grid: &[u32]) -> Result<Node> {
        let mut attrs = CellAttrs::default();
        if cell.span > 1 {
            attrs.colspan = Some(cell.span);
        }
        if rowspan > 1 {
            attrs.rowspan = Some(rowspan);
        }

        if let Some(tc_pr) = cell.el.child("w:tcPr") {
            attrs.colwidth = cell_widths(tc_pr, cell.col, cell.span, grid);
            attrs.background = tc_pr
                .child("w:shd")
                .and_then(|s| s.attr("w:fill"))
                .and_then(units::normalize_color);
            attrs.vertical_align = tc_pr
                .child_val("w:vAlign")
                .and_then(VerticalAlignment::from_ooxml);
        }

        let mut content = self.read_blocks(cell.el)?;
        if content.is_empty() {
            content.push(Node::paragraph(Vec::new()));
        }
        Ok(Node::TableCell { attrs, content })
    }
}

fn flush_text(text: &mut String, marks: &MarkSet, out: &mut Vec<Node>) {
    if !text.is_empty() {
        out.push(Node::Text {
            text: std::mem::take(text),
            marks: marks.clone(),
        });
    }
}

/// Coalesce neighbouring text nodes with identical marks.
fn merge_adjacent_text(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (
            Some(Node::Text {
                text: prev,
                marks: prev_marks,
            }),
            Node::Text { text, marks },
        ) = (merged.last_mut(), &node)
        {
            if prev_marks.same_as(marks) {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(node);
    }
    merged
}

fn change_attrs(el: &XmlElement) -> ChangeAttrs {
    ChangeAttrs {
        author: el.attr("w:author").map(String::from),
        date: el.attr("w:date").map(String::from),
    }
}

/// Direct run properties plus the shading fill, if any.
fn read_run_props(rpr: &XmlElement) -> (RunProps, Option<String>) {
    let mut props = RunProps {
        bold: rpr.child_flag("w:b"),
        italic: rpr.child_flag("w:i"),
        strike: rpr
            .child_flag("w:strike")
            .filter(|s| *s)
            .or(rpr.child_flag("w:dstrike")),
        ..Default::default()
    };
    if let Some(u) = rpr.child("w:u") {
        props.underline = Some(u.attr("w:val").is_none_or(|v| v != "none"));
    }
    props.font_size = rpr.child_val("w:sz").and_then(|v| v.parse().ok());
    props.color = rpr
        .child_val("w:color")
        .filter(|v| *v != "auto")
        .map(String::from);
    props.highlight = rpr
        .child_val("w:highlight")
        .filter(|v| *v != "none")
        .map(String::from);
    if let Some(fonts) = rpr.child("w:rFonts") {
        props.font_name = ["w:ascii", "w:hAnsi", "w:cs", "w:eastAsia"]
            .iter()
            .find_map(|k| fonts.attr(k))
            .map(String::from);
    }

    let shading = rpr
        .child("w:shd")
        .and_then(|s| s.attr("w:fill"))
        .and_then(units::normalize_color);
    (props, shading)
}

fn read_paragraph_props(ppr: &XmlElement) -> ParagraphAttrs {
    let mut attrs = ParagraphAttrs::default();

    if let Some(ind) = ppr.child("w:ind") {
        attrs.indent = ind
            .attr_parse::<i32>("w:left")
            .or_else(|| ind.attr_parse("w:start"))
            .map(Indent::Twips);
        attrs.right_indent = ind
            .attr_parse("w:right")
            .or_else(|| ind.attr_parse("w:end"));
        attrs.hanging = ind.attr_parse("w:hanging");
        attrs.first_line_indent = ind.attr_parse("w:firstLine");
    }

    if let Some(spacing) = ppr.child("w:spacing") {
        attrs.spacing_before = spacing
            .attr_parse::<i64>("w:before")
            .map(units::twips_to_points);
        attrs.spacing_after = spacing
            .attr_parse::<i64>("w:after")
            .map(units::twips_to_points);
        attrs.line_height = spacing.attr_parse("w:line");
        attrs.line_rule = spacing.attr("w:lineRule").and_then(LineRule::from_ooxml);
    }

    attrs.text_align = ppr.child_val("w:jc").and_then(Alignment::from_ooxml);
    attrs.keep_next = ppr.child_flag("w:keepNext");
    attrs.keep_lines = ppr.child_flag("w:keepLines");
    attrs.snap_to_grid = ppr.child_flag("w:snapToGrid");
    attrs.contextual_spacing = ppr.child_flag("w:contextualSpacing");

    if let Some(rpr) = ppr.child("w:rPr") {
        let (props, _) = read_run_props(rpr);
        attrs.font_family = props.font_name;
        attrs.font_size = props.font_size.map(units::half_points_to_points);
    }

    attrs
}

fn read_borders(borders: &XmlElement) -> Option<TableBorders> {
    let edge = ["w:top", "w:left", "w:start", "w:bottom", "w:insideH"]
        .iter()
        .find_map(|name| borders.child(name))?;
    Some(TableBorders {
        style: BorderStyle::from_ooxml(edge.attr("w:val").unwrap_or("single")),
        size: edge.attr_parse("w:sz"),
        color: edge
            .attr("w:color")
            .and_then(units::normalize_color)
            .map(|c| c[1..].to_string()),
    })
}

fn read_section(sect: &XmlElement) -> SectionProperties {
    let mut section = SectionProperties::default();

    if let Some(pg_sz) = sect.child("w:pgSz") {
        section.page_size = Some(PageSize {
            width: pg_sz.attr_parse("w:w"),
            height: pg_sz.attr_parse("w:h"),
            orientation: match pg_sz.attr("w:orient") {
                Some("landscape") => Some(Orientation::Landscape),
                Some("portrait") => Some(Orientation::Portrait),
                _ => None,
            },
        });
    }

    if let Some(pg_mar) = sect.child("w:pgMar") {
        section.margins = Some(PageMargins {
            top: pg_mar.attr_parse("w:top"),
            right: pg_mar.attr_parse("w:right"),
            bottom: pg_mar.attr_parse("w:bottom"),
            left: pg_mar.attr_parse("w:left"),
            header: pg_mar.attr_parse("w:header"),
            footer: pg_mar.attr_parse("w:footer"),
            gutter: pg_mar.attr_parse("w:gutter"),
        });
    }

    if let Some(cols) = sect.child("w:cols") {
        section.columns = Some(Columns {
            count: cols.attr_parse("w:num"),
            space: cols.attr_parse("w:space"),
        });
    }

    if let Some(grid) = sect.child("w:docGrid") {
        section.doc_grid = Some(DocGrid {
            grid_type: grid.attr("w:type").map(String::from),
            line_pitch: grid.attr_parse("w:linePitch"),
            char_space: grid.attr_parse("w:charSpace"),
        });
    }

    section
}

// --- tables ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VMerge {
    None,
    Restart,
    Continue,
}

/// A `w:tc` placed on the table grid.
#[derive(Debug)]
struct RawCell<'a> {
    el: &'a XmlElement,
    /// First grid column
    col: u32,
    span: u32,
    merge: VMerge,
}

/// Rows of a table, looking through row-level content controls.
fn collect_rows(tbl: &XmlElement) -> Vec<&XmlElement> {
    let mut rows = Vec::new();
    for el in tbl.elements() {
        match el.name.as_str() {
            "w:tr" => rows.push(el),
            "w:sdt" => {
                if let Some(content) = el.child("w:sdtContent") {
                    rows.extend(content.children_named("w:tr"));
                }
            }
            _ => {}
        }
    }
    rows
}

fn layout_row(row: &XmlElement) -> Vec<RawCell<'_>> {
    let mut cells = Vec::new();
    let mut col = row
        .child("w:trPr")
        .and_then(|p| p.child("w:gridBefore"))
        .and_then(|g| g.attr_parse::<u32>("w:val"))
        .unwrap_or(0)
        .min(MAX_GRID_COLUMNS);

    let mut tcs: Vec<&XmlElement> = Vec::new();
    for el in row.elements() {
        match el.name.as_str() {
            "w:tc" => tcs.push(el),
            "w:sdt" => {
                if let Some(content) = el.child("w:sdtContent") {
                    tcs.extend(content.children_named("w:tc"));
                }
            }
            _ => {}
        }
    }

    for el in tcs {
        let tc_pr = el.child("w:tcPr");
        let span = tc_pr
            .and_then(|p| p.child_val("w:gridSpan"))
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_GRID_COLUMNS);
        let merge = match tc_pr.and_then(|p| p.child("w:vMerge")) {
            Some(m) if m.attr("w:val") == Some("restart") => VMerge::Restart,
            Some(_) => VMerge::Continue,
            None => VMerge::None,
        };
        cells.push(RawCell {
            el,
            col,
            span,
            merge,
        });
        col = col.saturating_add(span);
    }
    cells
}

/// Number of rows below that continue a vertical merge at `col`.
fn count_continuations(rows: &[Vec<RawCell<'_>>], col: u32) -> u32 {
    let mut count = 0;
    for row in rows {
        match row.iter().find(|c| c.col == col) {
            Some(cell) if cell.merge == VMerge::Continue => count += 1,
            _ => break,
        }
    }
    count
}

/// Column widths in pixels for a cell spanning `span` grid columns.
fn cell_widths(tc_pr: &XmlElement, col: u32, span: u32, grid: &[u32]) -> Option<Vec<u32>> {
    let tc_w = tc_pr.child("w:tcW")?;
    let unit = tc_w.attr("w:type").unwrap_or("dxa");
    if unit != "dxa" {
        return None;
    }
    let width: u32 = tc_w.attr_parse("w:w")?;
    if width == 0 {
        return None;
    }

    if span == 1 {
        return Some(vec![units::twips_to_pixels(width)]);
    }

    let start = col as usize;
    let end = start.saturating_add(span as usize);
    if end <= grid.len() {
        Some(grid[start..end].iter().map(|w| units::twips_to_pixels(*w)).collect())
    } else {
        let each = width / span;
        Some(vec![units::twips_to_pixels(each); span as usize])
    }
}

// --- lists ---

struct OpenList {
    kind: ListKind,
    num_id: u32,
    level: u8,
    depth: u8,
    start: u32,
    items: Vec<Node>,
}

impl OpenList {
    fn into_node(self) -> Node {
        let attrs = ListAttrs {
            level: Some(self.depth),
            num_id: Some(self.num_id),
            start: (self.start > 1).then_some(self.start),
        };
        match self.kind {
            ListKind::Bullet => Node::BulletList {
                attrs,
                content: self.items,
            },
            ListKind::Ordered => Node::OrderedList {
                attrs,
                content: self.items,
            },
        }
    }
}

/// Groups consecutive numbered paragraphs into nested list trees.
#[derive(Default)]
struct ListBuilder {
    stack: Vec<OpenList>,
}

impl ListBuilder {
    fn push_item(&mut self, out: &mut Vec<Node>, list: ListRef, content: Node) {
        while self.stack.last().is_some_and(|top| top.level > list.level) {
            self.close_top(out);
        }
        if self.stack.last().is_some_and(|top| {
            top.level == list.level && (top.num_id != list.num_id || top.kind != list.kind)
        }) {
            self.close_top(out);
        }

        let item = Node::ListItem {
            content: vec![content],
        };
        match self.stack.last_mut() {
            Some(top) if top.level == list.level => top.items.push(item),
            _ => {
                let depth = self.stack.len() as u8;
                self.stack.push(OpenList {
                    kind: list.kind,
                    num_id: list.num_id,
                    level: list.level,
                    depth,
                    start: list.start,
                    items: vec![item],
                });
            }
        }
    }

    fn close_top(&mut self, out: &mut Vec<Node>) {
        let Some(list) = self.stack.pop() else {
            return;
        };
        let node = list.into_node();
        match self.stack.last_mut() {
            Some(parent) => match parent.items.last_mut() {
                Some(Node::ListItem { content }) => content.push(node),
                _ => parent.items.push(Node::ListItem {
                    content: vec![node],
                }),
            },
            None => out.push(node),
        }
    }

    fn flush(&mut self, out: &mut Vec<Node>) {
        while !self.stack.is_empty() {
            self.close_top(out);
        }
    }
}
