//! # Document Model
//!
//! The writer-facing description of one generated photo report: page setup
//! plus an ordered sequence of blocks, where a block is either a photo table
//! or an explicit page break. The layout engine produces this structure and
//! the document writer serializes it without further decisions.
//!
//! Dimensions are carried in the units the output format speaks natively:
//! twips for page metrics and row heights, EMU for drawing extents,
//! half-points for font sizes. Conversion from millimetres happens once, at
//! construction, so every later comparison is integer-exact.

use crate::image_loader::ImageAsset;

/// Twentieths of a point, the base length unit for page metrics, row
/// heights, and column widths. 635 EMU per twip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Twips(pub u32);

impl Twips {
    /// Convert millimetres to twips, flooring through EMU the way
    /// word-processor files store lengths. 92mm becomes 5215, 16mm 907.
    pub fn from_mm(mm: f64) -> Self {
        Twips((mm * 36000.0 / 635.0).floor() as u32)
    }
}

/// English Metric Units, the unit for drawing extents. 914400 per inch,
/// 36000 per millimetre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emu(pub u64);

impl Emu {
    pub fn from_mm(mm: f64) -> Self {
        Emu((mm * 36000.0).round() as u64)
    }
}

/// Font size in half-points (11pt text is 22 half-points).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfPoints(pub u32);

impl HalfPoints {
    pub fn from_points(pt: u32) -> Self {
        HalfPoints(pt * 2)
    }
}

/// An RGB color, serialized as a six-digit uppercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Hex form without a leading `#`, e.g. "0000FF".
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A complete document ready for serialization.
#[derive(Debug, Clone)]
pub struct Document {
    /// Page size and margins, applied to every page.
    pub page: PageSetup,

    /// The body content in order. Page breaks are explicit blocks, never
    /// inferred by the writer.
    pub blocks: Vec<Block>,
}

impl Document {
    /// Number of photo tables in the body.
    pub fn table_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Table(_)))
            .count()
    }

    /// Number of explicit page breaks in the body.
    pub fn page_break_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::PageBreak))
            .count()
    }
}

/// Page size and margins in twips.
#[derive(Debug, Clone)]
pub struct PageSetup {
    pub width: Twips,
    pub height: Twips,
    pub margin: Margins,
}

impl PageSetup {
    /// Width available to content after horizontal margins.
    pub fn content_width(&self) -> Twips {
        Twips(self.width.0 - self.margin.left.0 - self.margin.right.0)
    }
}

/// Page margins (top, right, bottom, left) in twips.
#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub top: Twips,
    pub right: Twips,
    pub bottom: Twips,
    pub left: Twips,
}

impl Margins {
    pub fn symmetric(vertical: Twips, horizontal: Twips) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

/// A top-level body block.
#[derive(Debug, Clone)]
pub enum Block {
    /// One photo table: rows of images and captions on a single page.
    Table(Table),

    /// An explicit page break.
    PageBreak,
}

/// A single-column table holding one or two image/caption row pairs.
#[derive(Debug, Clone)]
pub struct Table {
    /// Horizontal placement of the table on the page.
    pub alignment: Alignment,

    /// Borders for every edge, outer and inner.
    pub borders: TableBorders,

    /// The single column's width in twips.
    pub column_width: Twips,

    pub rows: Vec<Row>,
}

/// Per-edge table borders.
#[derive(Debug, Clone, Copy)]
pub struct TableBorders {
    pub top: Border,
    pub left: Border,
    pub bottom: Border,
    pub right: Border,
    pub inside_h: Border,
    pub inside_v: Border,
}

impl TableBorders {
    /// The same border on all six edges.
    pub fn uniform(border: Border) -> Self {
        Self {
            top: border,
            left: border,
            bottom: border,
            right: border,
            inside_h: border,
            inside_v: border,
        }
    }
}

/// One border edge: line style, width in eighth-points, color.
#[derive(Debug, Clone, Copy)]
pub struct Border {
    pub style: BorderStyle,
    /// Line width in eighth-points (4 is a half-point line).
    pub size: u32,
    pub color: Color,
}

/// Border line styles, by their serialized keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    Single,
    Double,
    Dashed,
}

impl BorderStyle {
    pub fn keyword(&self) -> &'static str {
        match self {
            BorderStyle::Single => "single",
            BorderStyle::Double => "double",
            BorderStyle::Dashed => "dashed",
        }
    }
}

/// A table row with an explicit height.
#[derive(Debug, Clone)]
pub struct Row {
    pub height: RowHeight,
    pub cells: Vec<Cell>,
}

/// Row height plus the rule telling the renderer how strictly to honor it.
#[derive(Debug, Clone, Copy)]
pub struct RowHeight {
    pub value: Twips,
    pub rule: HeightRule,
}

/// How a row height is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightRule {
    /// The row is exactly this tall; overflowing content is clipped.
    Exact,
    /// The row is at least this tall and may grow.
    AtLeast,
}

impl HeightRule {
    pub fn keyword(&self) -> &'static str {
        match self {
            HeightRule::Exact => "exact",
            HeightRule::AtLeast => "atLeast",
        }
    }
}

/// A table cell: explicit width plus one or more paragraphs. The serialized
/// form requires at least one paragraph per cell.
#[derive(Debug, Clone)]
pub struct Cell {
    pub width: Twips,
    pub paragraphs: Vec<Paragraph>,
}

/// A paragraph inside a cell: alignment, optional explicit spacing, and a
/// sequence of runs.
#[derive(Debug, Clone)]
pub struct Paragraph {
    pub alignment: Alignment,

    /// Explicit spacing. `None` leaves the document defaults in force.
    pub spacing: Option<Spacing>,

    pub runs: Vec<Run>,
}

impl Paragraph {
    /// A centered paragraph holding a single run, the shape every caption
    /// and image paragraph takes.
    pub fn centered(spacing: Option<Spacing>, run: Run) -> Self {
        Self {
            alignment: Alignment::Center,
            spacing,
            runs: vec![run],
        }
    }
}

/// Paragraph spacing: points before/after in twips plus the line rule.
#[derive(Debug, Clone, Copy)]
pub struct Spacing {
    pub before: Twips,
    pub after: Twips,
    /// Line height value. Under [`LineRule::Auto`] this is 240ths of a
    /// single line, so 240 means single spacing.
    pub line: u32,
    pub line_rule: LineRule,
}

impl Spacing {
    /// Zero space before and after, single line spacing.
    pub fn compact() -> Self {
        Self {
            before: Twips(0),
            after: Twips(0),
            line: 240,
            line_rule: LineRule::Auto,
        }
    }
}

/// Line spacing rules, by their serialized keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRule {
    Auto,
    Exact,
}

impl LineRule {
    pub fn keyword(&self) -> &'static str {
        match self {
            LineRule::Auto => "auto",
            LineRule::Exact => "exact",
        }
    }
}

/// Horizontal alignment, by its serialized keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn keyword(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// A run inside a paragraph.
#[derive(Debug, Clone)]
pub enum Run {
    Text(TextRun),
    Drawing(Drawing),
}

/// A styled text run.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub style: RunStyle,
}

/// Explicit character formatting for one run.
#[derive(Debug, Clone)]
pub struct RunStyle {
    /// Font family, applied to the latin and east-asian ranges alike.
    pub font: String,
    pub size: HalfPoints,
    pub color: Color,
}

/// An inline image scaled to an explicit physical extent.
#[derive(Debug, Clone)]
pub struct Drawing {
    /// The loaded image this drawing embeds. The writer turns each drawing
    /// into one media part in embed order.
    pub asset: ImageAsset,

    /// Display size in EMU, already aspect-corrected by the layout engine.
    pub extent: Extent,
}

/// A drawing extent in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub cx: Emu,
    pub cy: Emu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mm_to_twips_floors_through_emu() {
        assert_eq!(Twips::from_mm(92.0), Twips(5215));
        assert_eq!(Twips::from_mm(16.0), Twips(907));
        assert_eq!(Twips::from_mm(25.0), Twips(1417));
        assert_eq!(Twips::from_mm(30.0), Twips(1700));
    }

    #[test]
    fn mm_to_emu_is_exact_for_whole_millimetres() {
        assert_eq!(Emu::from_mm(92.0), Emu(3_312_000));
        assert_eq!(Emu::from_mm(1.0), Emu(36_000));
    }

    #[test]
    fn points_to_half_points() {
        assert_eq!(HalfPoints::from_points(11), HalfPoints(22));
    }

    #[test]
    fn color_hex_is_uppercase_without_hash() {
        assert_eq!(Color::rgb(0, 0, 255).hex(), "0000FF");
        assert_eq!(Color::BLACK.hex(), "000000");
    }

    #[test]
    fn symmetric_margins() {
        let m = Margins::symmetric(Twips(1417), Twips(1700));
        assert_eq!(m.top.0, 1417);
        assert_eq!(m.bottom.0, 1417);
        assert_eq!(m.left.0, 1700);
        assert_eq!(m.right.0, 1700);
    }

    #[test]
    fn uniform_borders_cover_all_six_edges() {
        let b = TableBorders::uniform(Border {
            style: BorderStyle::Single,
            size: 4,
            color: Color::BLACK,
        });
        for edge in [b.top, b.left, b.bottom, b.right, b.inside_h, b.inside_v] {
            assert_eq!(edge.style, BorderStyle::Single);
            assert_eq!(edge.size, 4);
        }
    }

    #[test]
    fn content_width_subtracts_horizontal_margins() {
        let page = PageSetup {
            width: Twips(12240),
            height: Twips(15840),
            margin: Margins::symmetric(Twips(1417), Twips(1700)),
        };
        assert_eq!(page.content_width(), Twips(8840));
    }
}
