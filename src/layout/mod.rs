//! # Photo Page Layout
//!
//! Turns an ordered list of loaded images into the document description in
//! [`crate::model`]. The scheme is fixed: images are taken two at a time in
//! upload order, each pair becomes one single-column table on its own page
//! (image row, caption row, image row, caption row), a trailing odd image
//! becomes a two-row table, and an explicit page break follows every table
//! except the last. Zero images produce a document with no tables at all.
//!
//! Every styling decision lives here as a constant: exact row heights,
//! border line/width/color, caption text and colors, page margins, and the
//! display height images are scaled to. The writer serializes what this
//! module decides and nothing else.

use crate::image_loader::ImageAsset;
use crate::model::{
    Alignment, Block, Border, BorderStyle, Cell, Color, Document, Drawing, Emu, Extent,
    HalfPoints, HeightRule, Margins, PageSetup, Paragraph, Row, RowHeight, Run, RunStyle,
    Spacing, Table, TableBorders, TextRun, Twips,
};

/// US Letter page in twips.
const PAGE_WIDTH_TWIPS: u32 = 12240;
const PAGE_HEIGHT_TWIPS: u32 = 15840;

const MARGIN_VERTICAL_MM: f64 = 25.0;
const MARGIN_HORIZONTAL_MM: f64 = 30.0;

const IMAGE_ROW_HEIGHT_MM: f64 = 92.0;
const CAPTION_ROW_HEIGHT_MM: f64 = 16.0;

/// Images are scaled to this display height; width follows the aspect ratio.
const IMAGE_DISPLAY_HEIGHT_MM: f64 = 92.0;

const CAPTION_FONT: &str = "굴림";
const CAPTION_SIZE_PT: u32 = 11;
/// First caption line, "accident photo".
const CAPTION_PHOTO: &str = "사고사진";
/// Second caption line, "accident description".
const CAPTION_DESCRIPTION: &str = "사고경위";
const CAPTION_PHOTO_COLOR: Color = Color { r: 0, g: 0, b: 255 };

const TABLE_BORDER: Border = Border {
    style: BorderStyle::Single,
    size: 4,
    color: Color::BLACK,
};

/// The layout engine. Stateless; one instance lays out any number of
/// documents.
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn new() -> Self {
        LayoutEngine
    }

    /// Lay out `assets` (in upload order) into a complete document.
    pub fn layout(&self, assets: Vec<ImageAsset>) -> Document {
        let page = page_setup();
        let column_width = page.content_width();

        let mut blocks = Vec::new();
        let mut remaining = assets.into_iter().peekable();
        while let Some(first) = remaining.next() {
            let second = remaining.next();
            blocks.push(Block::Table(photo_table(first, second, column_width)));
            if remaining.peek().is_some() {
                blocks.push(Block::PageBreak);
            }
        }

        Document { page, blocks }
    }
}

fn page_setup() -> PageSetup {
    PageSetup {
        width: Twips(PAGE_WIDTH_TWIPS),
        height: Twips(PAGE_HEIGHT_TWIPS),
        margin: Margins::symmetric(
            Twips::from_mm(MARGIN_VERTICAL_MM),
            Twips::from_mm(MARGIN_HORIZONTAL_MM),
        ),
    }
}

/// One table holding one or two image/caption row pairs.
fn photo_table(first: ImageAsset, second: Option<ImageAsset>, column_width: Twips) -> Table {
    let mut rows = Vec::with_capacity(4);
    rows.push(image_row(first, column_width));
    rows.push(caption_row(column_width));
    if let Some(asset) = second {
        rows.push(image_row(asset, column_width));
        rows.push(caption_row(column_width));
    }

    Table {
        alignment: Alignment::Center,
        borders: TableBorders::uniform(TABLE_BORDER),
        column_width,
        rows,
    }
}

fn image_row(asset: ImageAsset, column_width: Twips) -> Row {
    let extent = scaled_extent(&asset);
    Row {
        height: RowHeight {
            value: Twips::from_mm(IMAGE_ROW_HEIGHT_MM),
            rule: HeightRule::Exact,
        },
        cells: vec![Cell {
            width: column_width,
            paragraphs: vec![Paragraph::centered(
                None,
                Run::Drawing(Drawing { asset, extent }),
            )],
        }],
    }
}

fn caption_row(column_width: Twips) -> Row {
    Row {
        height: RowHeight {
            value: Twips::from_mm(CAPTION_ROW_HEIGHT_MM),
            rule: HeightRule::Exact,
        },
        cells: vec![Cell {
            width: column_width,
            paragraphs: vec![
                caption_line(CAPTION_PHOTO, CAPTION_PHOTO_COLOR),
                caption_line(CAPTION_DESCRIPTION, Color::BLACK),
            ],
        }],
    }
}

fn caption_line(text: &str, color: Color) -> Paragraph {
    Paragraph::centered(
        Some(Spacing::compact()),
        Run::Text(TextRun {
            text: text.to_string(),
            style: RunStyle {
                font: CAPTION_FONT.to_string(),
                size: HalfPoints::from_points(CAPTION_SIZE_PT),
                color,
            },
        }),
    )
}

/// Scale to the fixed display height, preserving aspect ratio.
fn scaled_extent(asset: &ImageAsset) -> Extent {
    let cy = Emu::from_mm(IMAGE_DISPLAY_HEIGHT_MM);
    let cx = (cy.0 as f64 * asset.width_px as f64 / asset.height_px as f64).round() as u64;
    Extent { cx: Emu(cx), cy }
}
