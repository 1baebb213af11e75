//! Tree -> package -> tree behavior of fresh packages.

mod common;

use chrono::{TimeZone, Utc};
use common::{package_with_body, part_names, part_text, zip_parts};
use docweave::docx::numbering::{ListKind, NumberingMap};
use docweave::docx::{DocxReader, DocxWriter};
use docweave::model::{CellAttrs, ChangeAttrs, ListAttrs, TextStyleAttrs};
use docweave::options::{ReadOptions, WriteOptions};
use docweave::{Error, Mark, MarkKind, MarkSet, Node, NodeKind};

fn pinned_writer() -> DocxWriter {
    let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    DocxWriter::with_options(
        WriteOptions::default()
            .with_author("Tester")
            .with_timestamp(timestamp),
    )
}

fn para(text: &str) -> Node {
    Node::paragraph(vec![Node::text(text)])
}

fn comment(id: &str) -> Mark {
    Mark::comment(id, Some("Reviewer".into()), None, Some("Check this".into()))
}

fn collect_text_nodes(tree: &Node) -> Vec<(String, MarkSet)> {
    let mut out = Vec::new();
    tree.walk(&mut |node| {
        if let Node::Text { text, marks } = node {
            out.push((text.clone(), marks.clone()));
        }
    });
    out
}

#[test]
fn test_fresh_package_has_mandatory_parts() {
    let tree = Node::document(vec![para("Hello")]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let names = part_names(&bytes);

    assert_eq!(names[0], "[Content_Types].xml");
    for part in [
        "_rels/.rels",
        "word/document.xml",
        "word/styles.xml",
        "word/_rels/document.xml.rels",
        "word/numbering.xml",
    ] {
        assert!(names.iter().any(|n| n == part), "missing {}", part);
    }
    assert!(!names.iter().any(|n| n == "word/comments.xml"));
}

#[test]
fn test_round_trip_structure() {
    let bold = MarkSet::new().with(Mark::Bold);
    let styled = MarkSet::new().with(Mark::TextStyle {
        attrs: TextStyleAttrs {
            color: Some("#C00000".into()),
            font_size: Some("14pt".into()),
            font_family: Some("Georgia".into()),
        },
    });
    let tree = Node::document(vec![
        Node::heading(1, vec![Node::text("Report")]),
        Node::paragraph(vec![
            Node::text("Plain "),
            Node::marked_text("bold", bold.clone()),
            Node::text(" and "),
            Node::marked_text("styled", styled.clone()),
        ]),
        Node::bullet_list(vec![
            Node::list_item(vec![para("one")]),
            Node::list_item(vec![para("two")]),
        ]),
        Node::table(vec![Node::table_row(vec![
            Node::table_cell(vec![para("a")]),
            Node::table_cell(vec![para("b")]),
        ])]),
    ]);

    let bytes = pinned_writer().write(&tree, None).unwrap();
    let back = docweave::read(&bytes).unwrap();

    assert_eq!(back.plain_text(), tree.plain_text());
    assert_eq!(back.count_kind(NodeKind::Heading), 1);
    assert_eq!(back.count_kind(NodeKind::BulletList), 1);
    assert_eq!(back.count_kind(NodeKind::ListItem), 2);
    assert_eq!(back.count_kind(NodeKind::Table), 1);
    assert_eq!(back.count_kind(NodeKind::TableCell), 2);

    let texts = collect_text_nodes(&back);
    let bold_run = texts.iter().find(|(t, _)| t == "bold").unwrap();
    assert!(bold_run.1.contains(MarkKind::Bold));
    let styled_run = texts.iter().find(|(t, _)| t == "styled").unwrap();
    let style = styled_run.1.text_style().unwrap();
    assert_eq!(style.color.as_deref(), Some("#C00000"));
    assert_eq!(style.font_size.as_deref(), Some("14pt"));
    assert_eq!(style.font_family.as_deref(), Some("Georgia"));
}

#[test]
fn test_bold_mark_emits_one_element() {
    let tree = Node::document(vec![Node::paragraph(vec![Node::marked_text(
        "Strong",
        MarkSet::new().with(Mark::Bold),
    )])]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let document = part_text(&bytes, "word/document.xml");

    assert_eq!(document.matches("<w:b/>").count(), 1);
    assert!(document.contains("<w:t>Strong</w:t>"));
}

#[test]
fn test_independent_ordered_lists_restart() {
    let tree = Node::document(vec![
        Node::ordered_list(vec![
            Node::list_item(vec![para("first a")]),
            Node::list_item(vec![para("first b")]),
        ]),
        para("between"),
        Node::ordered_list(vec![Node::list_item(vec![para("second a")])]),
    ]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let document = part_text(&bytes, "word/document.xml");
    let numbering = part_text(&bytes, "word/numbering.xml");

    assert_eq!(document.matches(r#"<w:numId w:val="1"/>"#).count(), 2);
    assert_eq!(document.matches(r#"<w:numId w:val="2"/>"#).count(), 1);
    assert_eq!(numbering.matches("<w:num ").count(), 2);
    assert_eq!(numbering.matches(r#"<w:startOverride w:val="1"/>"#).count(), 2);

    let back = docweave::read(&bytes).unwrap();
    assert_eq!(back.count_kind(NodeKind::OrderedList), 2);
    assert_eq!(back.count_kind(NodeKind::ListItem), 3);
}

#[test]
fn test_explicit_start_survives() {
    let tree = Node::document(vec![Node::OrderedList {
        attrs: ListAttrs {
            start: Some(4),
            ..Default::default()
        },
        content: vec![Node::list_item(vec![para("fourth")])],
    }]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let numbering = part_text(&bytes, "word/numbering.xml");
    assert!(numbering.contains(r#"<w:startOverride w:val="4"/>"#));

    let back = docweave::read(&bytes).unwrap();
    let Node::Document { content, .. } = &back else {
        panic!("expected document");
    };
    let Node::OrderedList { attrs, .. } = &content[0] else {
        panic!("expected ordered list, got {}", content[0].kind());
    };
    assert_eq!(attrs.start, Some(4));
}

/// Two separate numbered lists whose first one nests bullets under the
/// same numbering id, the way Word lays out mixed lists.
fn mixed_list_package() -> Vec<u8> {
    let item = |num_id: u32, level: u32, text: &str| {
        format!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
            level, num_id, text
        )
    };
    let body = [
        item(1, 0, "Alpha"),
        item(1, 1, "dot"),
        item(1, 0, "Beta"),
        r#"<w:p><w:r><w:t>between</w:t></w:r></w:p>"#.to_string(),
        item(2, 0, "Gamma"),
    ]
    .concat();
    let document = common::document_xml(&body);
    let numbering = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl><w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="o"/></w:lvl></w:abstractNum><w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num><w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num></w:numbering>"#;
    let types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/></Types>"#;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#;
    zip_parts(&[
        ("[Content_Types].xml", types),
        ("_rels/.rels", common::PACKAGE_RELS),
        ("word/document.xml", &document),
        ("word/_rels/document.xml.rels", rels),
        ("word/numbering.xml", numbering),
    ])
}

#[test]
fn test_carried_list_ids_survive_fresh_package() {
    let tree = docweave::read(&mixed_list_package()).unwrap();
    assert_eq!(tree.count_kind(NodeKind::OrderedList), 2);
    assert_eq!(tree.count_kind(NodeKind::BulletList), 1);

    let bytes = pinned_writer().write(&tree, None).unwrap();
    let back = docweave::read(&bytes).unwrap();
    assert_eq!(back.count_kind(NodeKind::OrderedList), 2);
    assert_eq!(back.count_kind(NodeKind::BulletList), 1);
    assert_eq!(back.plain_text(), tree.plain_text());

    // Each carried id points at its own definition, so both lists count from 1
    let numbering = part_text(&bytes, "word/numbering.xml");
    assert!(numbering.contains(r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/>"#));
    assert!(numbering.contains(r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/>"#));
    let map = NumberingMap::parse(&numbering).unwrap();
    assert_eq!(map.list_info(1, 0), Some((ListKind::Ordered, 1)));
    assert_eq!(map.list_info(1, 1), Some((ListKind::Bullet, 1)));
    assert_eq!(map.list_info(2, 0), Some((ListKind::Ordered, 1)));
}

#[test]
fn test_comment_range_stays_contiguous() {
    let c = comment("c-1");
    let tree = Node::document(vec![Node::paragraph(vec![
        Node::text("Before "),
        Node::marked_text("one ", MarkSet::new().with(c.clone())),
        Node::marked_text("two", MarkSet::new().with(c.clone()).with(Mark::Bold)),
        Node::marked_text(" three", MarkSet::new().with(c)),
        Node::text(" after"),
    ])]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let document = part_text(&bytes, "word/document.xml");

    assert_eq!(document.matches("<w:commentRangeStart ").count(), 1);
    assert_eq!(document.matches("<w:commentRangeEnd ").count(), 1);
    assert_eq!(document.matches("<w:commentReference ").count(), 1);

    let comments = part_text(&bytes, "word/comments.xml");
    assert!(comments.contains(r#"w:author="Reviewer""#));
    assert!(comments.contains("Check this"));

    let back = docweave::read(&bytes).unwrap();
    let commented: Vec<_> = collect_text_nodes(&back)
        .into_iter()
        .filter(|(_, marks)| marks.contains(MarkKind::Comment))
        .collect();
    let text: String = commented.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(text, "one two three");
    for (_, marks) in &commented {
        let attrs = marks.comment().unwrap();
        assert_eq!(attrs.author.as_deref(), Some("Reviewer"));
        assert_eq!(attrs.content.as_deref(), Some("Check this"));
    }
}

#[test]
fn test_distinct_comments_get_distinct_ids() {
    let tree = Node::document(vec![Node::paragraph(vec![
        Node::marked_text("a", MarkSet::new().with(comment("x"))),
        Node::marked_text("b", MarkSet::new().with(comment("y"))),
        Node::marked_text("c", MarkSet::new().with(comment("x"))),
    ])]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let document = part_text(&bytes, "word/document.xml");

    // x is interrupted by y, so it gets a second range under the same id
    assert_eq!(document.matches(r#"<w:commentRangeStart w:id="0"/>"#).count(), 2);
    assert_eq!(document.matches(r#"<w:commentRangeStart w:id="1"/>"#).count(), 1);
    let comments = part_text(&bytes, "word/comments.xml");
    assert_eq!(comments.matches("<w:comment ").count(), 2);
}

#[test]
fn test_track_changes_wrap_runs() {
    let insertion = Mark::insertion(Some("Alice".into()), Some("2024-01-02T03:04:05Z".into()));
    let deletion = Mark::Deletion {
        attrs: ChangeAttrs::default(),
    };
    let tree = Node::document(vec![Node::paragraph(vec![
        Node::marked_text("added", MarkSet::new().with(insertion)),
        Node::marked_text("removed", MarkSet::new().with(deletion)),
    ])]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let document = part_text(&bytes, "word/document.xml");

    assert!(document.contains(
        r#"<w:ins w:id="1" w:author="Alice" w:date="2024-01-02T03:04:05Z"><w:r><w:t>added</w:t></w:r></w:ins>"#
    ));
    assert!(document.contains(
        r#"<w:del w:id="2" w:author="Tester" w:date="2024-05-01T09:30:00Z"><w:r><w:delText>removed</w:delText></w:r></w:del>"#
    ));

    let back = docweave::read(&bytes).unwrap();
    let texts = collect_text_nodes(&back);
    let added = texts.iter().find(|(t, _)| t == "added").unwrap();
    assert_eq!(added.1.insertion().unwrap().author.as_deref(), Some("Alice"));
    let removed = texts.iter().find(|(t, _)| t == "removed").unwrap();
    assert_eq!(removed.1.deletion().unwrap().author.as_deref(), Some("Tester"));
}

/// A tree that draws on every per-export id sequence.
fn id_heavy_tree() -> Node {
    Node::document(vec![
        Node::ordered_list(vec![Node::list_item(vec![para("first")])]),
        Node::paragraph(vec![
            Node::marked_text("noted", MarkSet::new().with(comment("c-1"))),
            Node::marked_text("added", MarkSet::new().with(Mark::insertion(None, None))),
            Node::marked_text("removed", MarkSet::new().with(Mark::deletion(None, None))),
        ]),
        Node::ordered_list(vec![Node::list_item(vec![para("second")])]),
    ])
}

fn id_parts(package: &[u8]) -> Vec<String> {
    ["word/document.xml", "word/numbering.xml", "word/comments.xml"]
        .iter()
        .map(|name| part_text(package, name))
        .collect()
}

#[test]
fn test_writer_reuse_starts_ids_afresh() {
    let tree = id_heavy_tree();
    let single = id_parts(&pinned_writer().write(&tree, None).unwrap());
    assert!(single[0].contains(r#"<w:ins w:id="1" "#));
    assert!(single[0].contains(r#"<w:del w:id="2" "#));
    assert!(single[0].contains(r#"<w:commentRangeStart w:id="0"/>"#));
    assert!(single[1].contains(r#"<w:num w:numId="2">"#));

    let writer = pinned_writer();
    for _ in 0..2 {
        assert_eq!(id_parts(&writer.write(&tree, None).unwrap()), single);
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| writer.write(&tree, None).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(id_parts(&handle.join().unwrap()), single);
        }
    });
}

#[test]
fn test_table_spans_round_trip() {
    let spanning = Node::TableCell {
        attrs: CellAttrs {
            colspan: Some(2),
            ..Default::default()
        },
        content: vec![para("wide")],
    };
    let tall = Node::TableCell {
        attrs: CellAttrs {
            rowspan: Some(2),
            ..Default::default()
        },
        content: vec![para("tall")],
    };
    let tree = Node::document(vec![Node::table(vec![
        Node::table_row(vec![spanning]),
        Node::table_row(vec![tall, Node::table_cell(vec![para("x")])]),
        Node::table_row(vec![Node::table_cell(vec![para("y")])]),
    ])]);
    let bytes = pinned_writer().write(&tree, None).unwrap();
    let document = part_text(&bytes, "word/document.xml");
    assert!(document.contains(r#"<w:gridSpan w:val="2"/>"#));
    assert!(document.contains(r#"<w:vMerge w:val="restart"/>"#));
    assert!(document.contains("<w:vMerge/>"));

    let back = docweave::read(&bytes).unwrap();
    let mut spans = Vec::new();
    back.walk(&mut |node| {
        if let Node::TableCell { attrs, .. } = node {
            spans.push((attrs.colspan(), attrs.rowspan()));
        }
    });
    assert_eq!(spans, vec![(2, 1), (1, 2), (1, 1), (1, 1)]);
}

#[test]
fn test_reader_options() {
    let body = r#"<w:p><w:r><w:t xml:space="preserve">a </w:t></w:r><w:r><w:t>b</w:t></w:r></w:p>"#;
    let package = package_with_body(body);

    let merged = DocxReader::new().read(&package).unwrap();
    assert_eq!(collect_text_nodes(&merged).len(), 1);
    let Node::Document { attrs, .. } = &merged else {
        panic!("expected document");
    };
    assert!(attrs.raw_section.as_deref().unwrap().contains(r#"w:w="12240""#));

    let options = ReadOptions::default()
        .with_merge_text(false)
        .with_raw_section(false);
    let split = DocxReader::with_options(options).read(&package).unwrap();
    assert_eq!(collect_text_nodes(&split).len(), 2);
    let Node::Document { attrs, .. } = &split else {
        panic!("expected document");
    };
    assert!(attrs.raw_section.is_none());
    assert_eq!(
        attrs.section.as_ref().unwrap().page_size.as_ref().unwrap().width,
        Some(12240)
    );
}

#[test]
fn test_malformed_inputs() {
    let not_zip = docweave::read(b"definitely not a zip").unwrap_err();
    assert!(matches!(not_zip, Error::MalformedPackage { .. }));

    let no_document = zip_parts(&[("word/styles.xml", common::STYLES)]);
    let missing = docweave::read(&no_document).unwrap_err();
    assert!(matches!(missing, Error::MalformedPackage { .. }));

    let broken = zip_parts(&[
        ("[Content_Types].xml", common::CONTENT_TYPES),
        ("_rels/.rels", common::PACKAGE_RELS),
        ("word/document.xml", "<w:document><w:body><w:p></w:body>"),
    ]);
    match docweave::read(&broken).unwrap_err() {
        Error::MalformedPackage { part, .. } => assert_eq!(part, "word/document.xml"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unsupported_structures() {
    let stray_item = Node::document(vec![Node::list_item(vec![para("orphan")])]);
    match docweave::write(&stray_item, None).unwrap_err() {
        Error::UnsupportedStructure(message) => assert!(message.contains("listItem[0]")),
        other => panic!("unexpected error: {}", other),
    }

    let not_document = para("loose");
    assert!(matches!(
        docweave::write(&not_document, None).unwrap_err(),
        Error::UnsupportedStructure(_)
    ));

    let bad_heading = Node::document(vec![Node::heading(7, vec![Node::text("too deep")])]);
    assert!(matches!(
        docweave::write(&bad_heading, None).unwrap_err(),
        Error::UnsupportedStructure(_)
    ));
}

#[test]
fn test_json_tree_writes_package() {
    let json = r#"{"type":"document","content":[
        {"type":"paragraph","content":[
            {"type":"text","text":"Hi","marks":[{"type":"italic"}]},
            {"type":"hardBreak"},
            {"type":"text","text":"there"}
        ]}
    ]}"#;
    let tree = docweave::from_json(json).unwrap();
    let bytes = docweave::write(&tree, None).unwrap();
    let document = part_text(&bytes, "word/document.xml");
    assert!(document.contains("<w:i/>"));
    assert!(document.contains("<w:br/>"));

    let back = docweave::read(&bytes).unwrap();
    assert_eq!(back.plain_text(), "Hi\nthere\n");
}

#[test]
fn test_file_api() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.docx");
    let tree = Node::document(vec![para("On disk")]);

    docweave::write_file(&tree, &path, None).unwrap();
    let back = docweave::read_file(&path).unwrap();
    assert_eq!(back.plain_text(), "On disk\n");

    // patching a file onto itself
    let edited = Node::document(vec![para("Edited on disk")]);
    docweave::write_file(&edited, &path, Some(path.as_path())).unwrap();
    assert_eq!(docweave::read_file(&path).unwrap().plain_text(), "Edited on disk\n");
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_async_file_api() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("async.docx");
    let tree = Node::document(vec![para("Async")]);

    docweave::write_file_async(&tree, &path, None).await.unwrap();
    let back = docweave::read_file_async(&path).await.unwrap();
    assert_eq!(back.plain_text(), "Async\n");
}
