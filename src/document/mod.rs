//! The document model: workbooks, sheets, rows, cells, columns, and styles.
//!
//! The renderer only relies on a narrow contract from this module: rows are ordered
//! sequences of cells, cells carry a template string, a style, and optional rich text, and
//! rows and cells can be cloned forward into a new sheet. Workbooks serialize to and from
//! a JSON byte stream; `.xlsx` reading and export live in `xlsx` behind the `xlsx` feature.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Result;
use crate::SheetError;

pub mod style;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use style::{Alignment, Font, Style};

// ============================================================================
// WORKBOOK
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty sheet and returns it for filling.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn push_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| SheetError::document_format("workbook is not a valid document", e))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader)
            .map_err(|e| SheetError::document_format("workbook is not a valid document", e))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parses either an `.xlsx` container or a serialized workbook, sniffing the zip header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(ZIP_MAGIC) {
            return Self::from_xlsx_bytes(bytes);
        }
        Self::from_slice(bytes)
    }

    /// Loads a workbook from disk. A `.xlsx` extension selects the spreadsheet reader.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if has_xlsx_extension(path) {
            return Self::from_xlsx_bytes(&std::fs::read(path)?);
        }
        Self::open(path)
    }

    #[cfg(feature = "xlsx")]
    fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self> {
        xlsx::read_xlsx(bytes)
    }

    #[cfg(not(feature = "xlsx"))]
    fn from_xlsx_bytes(_bytes: &[u8]) -> Result<Self> {
        Err(crate::err_msg!(
            DocumentFormat,
            "reading .xlsx workbooks requires the `xlsx` feature"
        ))
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| SheetError::document_format("workbook could not be serialized", e))
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SheetError::document_format("workbook could not be serialized", e))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

pub(crate) fn has_xlsx_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}

// ============================================================================
// SHEET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sheet {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A new, row-less sheet with this sheet's name and column definitions.
    pub fn clone_layout(&self) -> Sheet {
        Sheet {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Cell values row by row; handy for assertions and debugging.
    pub fn values(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.value.clone()).collect())
            .collect()
    }
}

/// Column definition covering the 1-based inclusive range `min..=max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    pub min: u32,
    pub max: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub custom_width: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub outline_level: u8,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub phonetic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

fn is_zero(n: &u8) -> bool {
    *n == 0
}

impl Default for Column {
    fn default() -> Self {
        Self {
            min: 1,
            max: 1,
            width: None,
            hidden: false,
            collapsed: false,
            custom_width: false,
            outline_level: 0,
            phonetic: false,
            style: None,
        }
    }
}

impl Column {
    pub fn for_range(min: u32, max: u32) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }
}

// ============================================================================
// ROW & CELL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Row {
    pub cells: Vec<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// A row of unstyled cells with the given values.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: values.into_iter().map(Cell::new).collect(),
            height: None,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Clones height and cells forward into a new row.
    ///
    /// Only a non-zero explicit height is carried. When `wrap_text` is set every cloned
    /// cell has text wrapping forced on.
    pub fn clone_layout(&self, wrap_text: bool) -> Row {
        Row {
            cells: self
                .cells
                .iter()
                .map(|c| c.clone_layout(wrap_text))
                .collect(),
            height: self.height.filter(|h| *h != 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    pub value: String,
    #[serde(skip_serializing_if = "Style::is_default")]
    pub style: Style,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rich_text: Vec<RichTextRun>,
}

impl Cell {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Clones value and style; rich text is carried only when the value is empty.
    pub fn clone_layout(&self, wrap_text: bool) -> Cell {
        let mut style = self.style.clone();
        if wrap_text {
            style.alignment.wrap_text = true;
        }
        let rich_text = if self.value.is_empty() {
            self.rich_text.clone()
        } else {
            Vec::new()
        };
        Cell {
            value: self.value.clone(),
            style,
            rich_text,
        }
    }
}

/// One formatted run of a rich-text cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RichTextRun {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}
