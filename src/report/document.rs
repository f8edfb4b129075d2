use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Vertical gap between consecutive date-section tables, in points.
pub const SECTION_SPACING_PT: u32 = 16;

/// Which construction step produced a row. Styling is keyed off this,
/// never off cell content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    /// Column titles, repeated by the renderer on every page.
    Header,
    /// Full-width customer separator row.
    GroupHeader,
    /// Product separator row (customer sale form), spanning from the
    /// second column onward.
    SubGroupHeader,
    Data,
    Totals,
}

impl RowRole {
    pub fn tag(self) -> &'static str {
        match self {
            RowRole::Header => "header",
            RowRole::GroupHeader => "group_header",
            RowRole::SubGroupHeader => "sub_group_header",
            RowRole::Data => "data",
            RowRole::Totals => "totals",
        }
    }

    /// Render directive for rows of this role. Single source of truth so
    /// the renderer template never re-derives styling per row.
    pub fn style(self) -> RowStyle {
        match self {
            RowRole::Header => RowStyle {
                bold: true,
                fill: Some(211),
                centered: true,
            },
            RowRole::GroupHeader => RowStyle {
                bold: true,
                fill: Some(245),
                centered: false,
            },
            RowRole::SubGroupHeader => RowStyle {
                bold: true,
                fill: Some(247),
                centered: false,
            },
            RowRole::Data => RowStyle {
                bold: false,
                fill: None,
                centered: false,
            },
            RowRole::Totals => RowStyle {
                bold: true,
                fill: Some(242),
                centered: false,
            },
        }
    }
}

/// Styling a row carries into the renderer: emphasis, background tint
/// (as a luma value, 0 black to 255 white) and alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowStyle {
    pub bold: bool,
    pub fill: Option<u8>,
    pub centered: bool,
}

/// A single table cell. `Label` and `Continuation` track repeated-label
/// suppression in waybill groups: the waybill code is shown once, on the
/// first item row, and left blank on the rest. A `Continuation` renders
/// like `Empty` but stays distinct in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Label(String),
    Continuation,
    Empty,
}

impl Cell {
    /// Rendered text of the cell. Suppressed and empty cells render as "".
    pub fn text(&self) -> &str {
        match self {
            Cell::Text(s) | Cell::Label(s) => s,
            Cell::Continuation | Cell::Empty => "",
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text())
    }
}

/// Inclusive column range merged into one cell when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

impl Span {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub role: RowRole,
    pub cells: Vec<Cell>,
    pub span: Option<Span>,
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let style = self.role.style();
        let mut row = serializer.serialize_struct("RowRecord", 6)?;
        row.serialize_field("role", self.role.tag())?;
        row.serialize_field("cells", &self.cells)?;
        row.serialize_field("span", &self.span)?;
        row.serialize_field("bold", &style.bold)?;
        row.serialize_field("fill", &style.fill)?;
        row.serialize_field("centered", &style.centered)?;
        row.end()
    }
}

/// One table in the document: all rows for a single dispatch date (or,
/// for the allocation sheet, the whole flat customer list).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DateSection {
    pub heading: Option<String>,
    /// Directive for the renderer to repeat the column-title row on every
    /// page this table spans. Pagination itself is the renderer's.
    pub repeat_header_row: bool,
    pub rows: Vec<RowRecord>,
}

/// The assembled document model handed to the renderer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub columns: Vec<&'static str>,
    pub section_spacing_pt: u32,
    pub sections: Vec<DateSection>,
}
