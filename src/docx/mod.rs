//! # Document Serialization
//!
//! Serializes the document description in [`crate::model`] into a complete
//! `.docx` file. The writer owns the format end to end: each XML part is
//! emitted event-by-event, media is embedded untouched, and the
//! [`package`] module assembles the zip container. Nothing here makes
//! layout decisions; it writes exactly what the model says.
//!
//! Parts emitted, in entry order:
//!
//! - `[Content_Types].xml`: extension defaults plus part overrides
//! - `_rels/.rels`: points the package at the main document part
//! - `word/document.xml`: body tables, page breaks, section properties
//! - `word/_rels/document.xml.rels`: styles + one relationship per image
//! - `word/styles.xml`: document defaults (zero spacing, single line)
//! - `word/media/imageN.{png,jpeg}`: embedded images in embed order
//!
//! Relationship ids are fixed: `rId1` is the styles part and images run
//! from `rId2` upward in embed order.

pub mod package;

use std::io;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Photo2DocxError;
use crate::model::{Block, Border, Cell, Document, Drawing, PageSetup, Paragraph, Row, Run, Table, TextRun};
use package::{Compression, Package};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const REL_TYPE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_TYPE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CONTENT_TYPE_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CONTENT_TYPE_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CONTENT_TYPE_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";

/// MIME type of the finished file, for the download response.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The document writer. Stateless; one instance writes any number of
/// documents.
pub struct DocxWriter;

/// One embedded image: media part name plus a borrow of its bytes.
struct MediaPart<'a> {
    file_name: String,
    bytes: &'a [u8],
}

/// Relationship id for the image at `index` in embed order. `rId1` is
/// reserved for the styles part.
fn media_rel_id(index: usize) -> String {
    format!("rId{}", index + 2)
}

impl DocxWriter {
    pub fn new() -> Self {
        DocxWriter
    }

    /// Serialize `doc` to finished `.docx` bytes.
    pub fn write(&self, doc: &Document) -> Result<Vec<u8>, Photo2DocxError> {
        Ok(self.build_package(doc)?.serialize())
    }

    /// Assemble the package without serializing the container, exposing the
    /// individual parts for inspection.
    pub fn build_package(&self, doc: &Document) -> Result<Package, Photo2DocxError> {
        let media = collect_media(doc);
        let mut pkg = Package::new();

        let part = |name: &str, result: io::Result<Vec<u8>>| {
            result.map_err(|source| Photo2DocxError::PartBuild {
                part: name.to_string(),
                source,
            })
        };

        pkg.add_part(
            "[Content_Types].xml",
            part("[Content_Types].xml", content_types_xml())?,
            Compression::Deflated,
        );
        pkg.add_part(
            "_rels/.rels",
            part("_rels/.rels", root_rels_xml())?,
            Compression::Deflated,
        );
        pkg.add_part(
            "word/document.xml",
            part("word/document.xml", document_xml(doc))?,
            Compression::Deflated,
        );
        pkg.add_part(
            "word/_rels/document.xml.rels",
            part("word/_rels/document.xml.rels", document_rels_xml(&media))?,
            Compression::Deflated,
        );
        pkg.add_part(
            "word/styles.xml",
            part("word/styles.xml", styles_xml())?,
            Compression::Deflated,
        );
        for m in &media {
            pkg.add_part(
                &format!("word/media/{}", m.file_name),
                m.bytes.to_vec(),
                Compression::Stored,
            );
        }
        Ok(pkg)
    }
}

/// Walk the body in emission order and name one media part per drawing.
fn collect_media(doc: &Document) -> Vec<MediaPart<'_>> {
    let mut media = Vec::new();
    for block in &doc.blocks {
        let Block::Table(table) = block else { continue };
        for row in &table.rows {
            for cell in &row.cells {
                for paragraph in &cell.paragraphs {
                    for run in &paragraph.runs {
                        if let Run::Drawing(d) = run {
                            let n = media.len() + 1;
                            media.push(MediaPart {
                                file_name: format!("image{}.{}", n, d.asset.format.extension()),
                                bytes: &d.asset.bytes,
                            });
                        }
                    }
                }
            }
        }
    }
    media
}

// ── XML event helpers ─────────────────────────────────────────────────────

fn start(w: &mut Writer<Vec<u8>>, name: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))
}

fn start_with(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    let mut el = BytesStart::new(name);
    for (k, v) in attrs {
        el.push_attribute((*k, *v));
    }
    w.write_event(Event::Start(el))
}

fn empty_with(w: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
    let mut el = BytesStart::new(name);
    for (k, v) in attrs {
        el.push_attribute((*k, *v));
    }
    w.write_event(Event::Empty(el))
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> io::Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn text(w: &mut Writer<Vec<u8>>, s: &str) -> io::Result<()> {
    w.write_event(Event::Text(BytesText::new(s)))
}

fn declaration(w: &mut Writer<Vec<u8>>) -> io::Result<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
}

// ── Part builders ─────────────────────────────────────────────────────────

fn content_types_xml() -> io::Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start_with(&mut w, "Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    empty_with(
        &mut w,
        "Default",
        &[("Extension", "rels"), ("ContentType", CONTENT_TYPE_RELS)],
    )?;
    empty_with(
        &mut w,
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    empty_with(
        &mut w,
        "Default",
        &[("Extension", "png"), ("ContentType", "image/png")],
    )?;
    empty_with(
        &mut w,
        "Default",
        &[("Extension", "jpeg"), ("ContentType", "image/jpeg")],
    )?;
    empty_with(
        &mut w,
        "Override",
        &[
            ("PartName", "/word/document.xml"),
            ("ContentType", CONTENT_TYPE_DOCUMENT),
        ],
    )?;
    empty_with(
        &mut w,
        "Override",
        &[
            ("PartName", "/word/styles.xml"),
            ("ContentType", CONTENT_TYPE_STYLES),
        ],
    )?;
    end(&mut w, "Types")?;
    Ok(w.into_inner())
}

fn root_rels_xml() -> io::Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start_with(&mut w, "Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
    empty_with(
        &mut w,
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_TYPE_DOCUMENT),
            ("Target", "word/document.xml"),
        ],
    )?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

fn document_rels_xml(media: &[MediaPart<'_>]) -> io::Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start_with(&mut w, "Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
    empty_with(
        &mut w,
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_TYPE_STYLES),
            ("Target", "styles.xml"),
        ],
    )?;
    for (i, m) in media.iter().enumerate() {
        let id = media_rel_id(i);
        let target = format!("media/{}", m.file_name);
        empty_with(
            &mut w,
            "Relationship",
            &[("Id", &id), ("Type", REL_TYPE_IMAGE), ("Target", &target)],
        )?;
    }
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

/// Document defaults: zero paragraph spacing and single line rule, so
/// paragraphs without explicit spacing sit flush inside exact-height rows.
fn styles_xml() -> io::Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start_with(&mut w, "w:styles", &[("xmlns:w", NS_W)])?;
    start(&mut w, "w:docDefaults")?;
    start(&mut w, "w:rPrDefault")?;
    empty_with(&mut w, "w:rPr", &[])?;
    end(&mut w, "w:rPrDefault")?;
    start(&mut w, "w:pPrDefault")?;
    start(&mut w, "w:pPr")?;
    empty_with(
        &mut w,
        "w:spacing",
        &[
            ("w:before", "0"),
            ("w:after", "0"),
            ("w:line", "240"),
            ("w:lineRule", "auto"),
        ],
    )?;
    end(&mut w, "w:pPr")?;
    end(&mut w, "w:pPrDefault")?;
    end(&mut w, "w:docDefaults")?;
    start_with(
        &mut w,
        "w:style",
        &[
            ("w:type", "paragraph"),
            ("w:default", "1"),
            ("w:styleId", "Normal"),
        ],
    )?;
    empty_with(&mut w, "w:name", &[("w:val", "Normal")])?;
    empty_with(&mut w, "w:qFormat", &[])?;
    end(&mut w, "w:style")?;
    end(&mut w, "w:styles")?;
    Ok(w.into_inner())
}

fn document_xml(doc: &Document) -> io::Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start_with(
        &mut w,
        "w:document",
        &[
            ("xmlns:w", NS_W),
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ],
    )?;
    start(&mut w, "w:body")?;

    let mut drawing_index = 0usize;
    for block in &doc.blocks {
        match block {
            Block::Table(table) => write_table(&mut w, table, &mut drawing_index)?,
            Block::PageBreak => write_page_break(&mut w)?,
        }
    }

    write_section_properties(&mut w, &doc.page)?;
    end(&mut w, "w:body")?;
    end(&mut w, "w:document")?;
    Ok(w.into_inner())
}

fn write_table(w: &mut Writer<Vec<u8>>, table: &Table, drawing_index: &mut usize) -> io::Result<()> {
    start(w, "w:tbl")?;

    start(w, "w:tblPr")?;
    empty_with(w, "w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    empty_with(w, "w:jc", &[("w:val", table.alignment.keyword())])?;
    start(w, "w:tblBorders")?;
    let b = &table.borders;
    for (edge, border) in [
        ("w:top", b.top),
        ("w:left", b.left),
        ("w:bottom", b.bottom),
        ("w:right", b.right),
        ("w:insideH", b.inside_h),
        ("w:insideV", b.inside_v),
    ] {
        write_border(w, edge, &border)?;
    }
    end(w, "w:tblBorders")?;
    empty_with(w, "w:tblLayout", &[("w:type", "fixed")])?;
    end(w, "w:tblPr")?;

    let width = table.column_width.0.to_string();
    start(w, "w:tblGrid")?;
    empty_with(w, "w:gridCol", &[("w:w", &width)])?;
    end(w, "w:tblGrid")?;

    for row in &table.rows {
        write_row(w, row, drawing_index)?;
    }
    end(w, "w:tbl")
}

fn write_border(w: &mut Writer<Vec<u8>>, edge: &str, border: &Border) -> io::Result<()> {
    let size = border.size.to_string();
    let color = border.color.hex();
    empty_with(
        w,
        edge,
        &[
            ("w:val", border.style.keyword()),
            ("w:sz", &size),
            ("w:space", "0"),
            ("w:color", &color),
        ],
    )
}

fn write_row(w: &mut Writer<Vec<u8>>, row: &Row, drawing_index: &mut usize) -> io::Result<()> {
    start(w, "w:tr")?;
    start(w, "w:trPr")?;
    let height = row.height.value.0.to_string();
    empty_with(
        w,
        "w:trHeight",
        &[("w:val", &height), ("w:hRule", row.height.rule.keyword())],
    )?;
    end(w, "w:trPr")?;
    for cell in &row.cells {
        write_cell(w, cell, drawing_index)?;
    }
    end(w, "w:tr")
}

fn write_cell(w: &mut Writer<Vec<u8>>, cell: &Cell, drawing_index: &mut usize) -> io::Result<()> {
    start(w, "w:tc")?;
    start(w, "w:tcPr")?;
    let width = cell.width.0.to_string();
    empty_with(w, "w:tcW", &[("w:w", &width), ("w:type", "dxa")])?;
    end(w, "w:tcPr")?;
    for paragraph in &cell.paragraphs {
        write_paragraph(w, paragraph, drawing_index)?;
    }
    end(w, "w:tc")
}

fn write_paragraph(
    w: &mut Writer<Vec<u8>>,
    paragraph: &Paragraph,
    drawing_index: &mut usize,
) -> io::Result<()> {
    start(w, "w:p")?;
    start(w, "w:pPr")?;
    if let Some(spacing) = &paragraph.spacing {
        let before = spacing.before.0.to_string();
        let after = spacing.after.0.to_string();
        let line = spacing.line.to_string();
        empty_with(
            w,
            "w:spacing",
            &[
                ("w:before", &before),
                ("w:after", &after),
                ("w:line", &line),
                ("w:lineRule", spacing.line_rule.keyword()),
            ],
        )?;
    }
    empty_with(w, "w:jc", &[("w:val", paragraph.alignment.keyword())])?;
    end(w, "w:pPr")?;
    for run in &paragraph.runs {
        match run {
            Run::Text(r) => write_text_run(w, r)?,
            Run::Drawing(d) => write_drawing_run(w, d, drawing_index)?,
        }
    }
    end(w, "w:p")
}

fn write_text_run(w: &mut Writer<Vec<u8>>, run: &TextRun) -> io::Result<()> {
    start(w, "w:r")?;
    start(w, "w:rPr")?;
    let font = run.style.font.as_str();
    let size = run.style.size.0.to_string();
    let color = run.style.color.hex();
    empty_with(
        w,
        "w:rFonts",
        &[("w:ascii", font), ("w:hAnsi", font), ("w:eastAsia", font)],
    )?;
    empty_with(w, "w:color", &[("w:val", &color)])?;
    empty_with(w, "w:sz", &[("w:val", &size)])?;
    empty_with(w, "w:szCs", &[("w:val", &size)])?;
    end(w, "w:rPr")?;
    start(w, "w:t")?;
    text(w, &run.text)?;
    end(w, "w:t")?;
    end(w, "w:r")
}

fn write_page_break(w: &mut Writer<Vec<u8>>) -> io::Result<()> {
    start(w, "w:p")?;
    start(w, "w:r")?;
    empty_with(w, "w:br", &[("w:type", "page")])?;
    end(w, "w:r")?;
    end(w, "w:p")
}

fn write_drawing_run(
    w: &mut Writer<Vec<u8>>,
    drawing: &Drawing,
    drawing_index: &mut usize,
) -> io::Result<()> {
    let n = *drawing_index;
    *drawing_index += 1;

    let rel = media_rel_id(n);
    let cx = drawing.extent.cx.0.to_string();
    let cy = drawing.extent.cy.0.to_string();
    let doc_pr_id = (n + 1).to_string();
    let name = if drawing.asset.file_name.is_empty() {
        format!("image{}", n + 1)
    } else {
        drawing.asset.file_name.clone()
    };

    start(w, "w:r")?;
    start(w, "w:drawing")?;
    start_with(
        w,
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    empty_with(w, "wp:extent", &[("cx", &cx), ("cy", &cy)])?;
    empty_with(w, "wp:docPr", &[("id", &doc_pr_id), ("name", &name)])?;
    start(w, "a:graphic")?;
    start_with(w, "a:graphicData", &[("uri", NS_PIC)])?;
    start(w, "pic:pic")?;
    start(w, "pic:nvPicPr")?;
    empty_with(w, "pic:cNvPr", &[("id", "0"), ("name", &name)])?;
    empty_with(w, "pic:cNvPicPr", &[])?;
    end(w, "pic:nvPicPr")?;
    start(w, "pic:blipFill")?;
    empty_with(w, "a:blip", &[("r:embed", &rel)])?;
    start(w, "a:stretch")?;
    empty_with(w, "a:fillRect", &[])?;
    end(w, "a:stretch")?;
    end(w, "pic:blipFill")?;
    start(w, "pic:spPr")?;
    start(w, "a:xfrm")?;
    empty_with(w, "a:off", &[("x", "0"), ("y", "0")])?;
    empty_with(w, "a:ext", &[("cx", &cx), ("cy", &cy)])?;
    end(w, "a:xfrm")?;
    start_with(w, "a:prstGeom", &[("prst", "rect")])?;
    empty_with(w, "a:avLst", &[])?;
    end(w, "a:prstGeom")?;
    end(w, "pic:spPr")?;
    end(w, "pic:pic")?;
    end(w, "a:graphicData")?;
    end(w, "a:graphic")?;
    end(w, "wp:inline")?;
    end(w, "w:drawing")?;
    end(w, "w:r")
}

fn write_section_properties(w: &mut Writer<Vec<u8>>, page: &PageSetup) -> io::Result<()> {
    let width = page.width.0.to_string();
    let height = page.height.0.to_string();
    let top = page.margin.top.0.to_string();
    let right = page.margin.right.0.to_string();
    let bottom = page.margin.bottom.0.to_string();
    let left = page.margin.left.0.to_string();

    start(w, "w:sectPr")?;
    empty_with(w, "w:pgSz", &[("w:w", &width), ("w:h", &height)])?;
    empty_with(
        w,
        "w:pgMar",
        &[
            ("w:top", &top),
            ("w:right", &right),
            ("w:bottom", &bottom),
            ("w:left", &left),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    )?;
    end(w, "w:sectPr")
}
