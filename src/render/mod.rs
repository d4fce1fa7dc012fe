//! Template rendering.
//!
//! [`Template`] owns a loaded template workbook and the last successfully rendered report.
//! Rendering walks every sheet, picks the sheet's context from the [`Payload`], and runs the
//! row expansion engine into a fresh output sheet.
//!
//! ```rust
//! use sheetforge::document::{Row, Workbook};
//! use sheetforge::render::Template;
//! use sheetforge::context::Payload;
//!
//! let mut wb = Workbook::new();
//! let sheet = wb.add_sheet("Staff");
//! sheet.push_row(Row::from_values(["{{range employees}}"]));
//! sheet.push_row(Row::from_values(["{{name}}"]));
//! sheet.push_row(Row::from_values(["{{end}}"]));
//!
//! let data = Payload::from_json_str(r#"{"employees": [{"name": "Ann"}, {"name": "Bo"}]}"#).unwrap();
//! let mut template = Template::from_workbook(wb);
//! template.render(&data).unwrap();
//! let report = template.report().unwrap();
//! assert_eq!(report.sheets[0].values(), vec![vec!["Ann"], vec!["Bo"]]);
//! ```

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::Payload;
use crate::diagnostics::{CellLocation, Result};
use crate::document::{Sheet, Workbook};
use crate::SheetError;

pub mod directive;
pub mod engine;
pub mod evaluator;

pub use directive::{find_range_end, Directive};
pub use evaluator::{escape_braces, Evaluator, HandlebarsEvaluator};

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Force text wrapping on in every rendered cell's style.
    #[serde(alias = "WrapTextInAllCells")]
    pub wrap_text_in_all_cells: bool,
}

// ============================================================================
// TEMPLATE
// ============================================================================

pub struct Template {
    file: Option<Workbook>,
    report: Option<Workbook>,
    evaluator: Box<dyn Evaluator>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

impl Template {
    /// An empty template; load a workbook with [`Template::read_template`].
    pub fn new() -> Self {
        Self {
            file: None,
            report: None,
            evaluator: Box::new(HandlebarsEvaluator::new()),
        }
    }

    pub fn from_workbook(workbook: Workbook) -> Self {
        Self {
            file: Some(workbook),
            ..Self::new()
        }
    }

    /// Loads a template from `.xlsx` bytes or a serialized workbook.
    pub fn from_bytes(content: &[u8]) -> Result<Self> {
        Ok(Self::from_workbook(Workbook::from_bytes(content)?))
    }

    /// Replaces the template expression evaluator.
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Reads a template workbook from disk, replacing any loaded one. A `.xlsx` extension
    /// selects the spreadsheet reader.
    pub fn read_template(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.file = Some(Workbook::load(path)?);
        Ok(())
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.file.as_ref()
    }

    pub fn render(&mut self, payload: &Payload) -> Result<()> {
        self.render_with_options(payload, None)
    }

    /// Renders every sheet and stores the report.
    ///
    /// On failure the previous report is discarded and nothing is stored.
    pub fn render_with_options(
        &mut self,
        payload: &Payload,
        options: Option<&RenderOptions>,
    ) -> Result<()> {
        self.report = None;
        let template = self.file.as_ref().ok_or(SheetError::NoTemplateLoaded)?;
        let options = options.copied().unwrap_or_default();

        let mut report = Workbook::new();
        for (si, sheet) in template.sheets.iter().enumerate() {
            let ctx = payload.context_for_sheet(si);
            debug!(sheet = %sheet.name, rows = sheet.rows.len(), "rendering sheet");

            let mut out = sheet.clone_layout();
            engine::expand(&mut out, &sheet.rows, &ctx, &options, self.evaluator.as_ref())?;
            report.push_sheet(out);
        }

        self.report = Some(report);
        Ok(())
    }

    /// The last successfully rendered report.
    pub fn report(&self) -> Result<&Workbook> {
        self.report.as_ref().ok_or(SheetError::NoReportGenerated)
    }

    pub fn into_report(self) -> Result<Workbook> {
        self.report.ok_or(SheetError::NoReportGenerated)
    }

    /// Writes the report to `writer` as a serialized workbook.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        self.report()?.write(writer)
    }

    /// Saves the report to `path`. With the `xlsx` feature, a `.xlsx` extension selects
    /// spreadsheet output.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let report = self.report()?;
        let path = path.as_ref();
        #[cfg(feature = "xlsx")]
        {
            if crate::document::has_xlsx_extension(path) {
                return crate::document::xlsx::save_xlsx(report, path);
            }
        }
        report.save(path)
    }
}

/// Verifies that every range block in every sheet is closed, without rendering.
pub fn check_ranges(workbook: &Workbook) -> Result<()> {
    workbook.sheets.iter().try_for_each(check_sheet_ranges)
}

fn check_sheet_ranges(sheet: &Sheet) -> Result<()> {
    match directive::first_unclosed_range(&sheet.rows) {
        Some((row, property)) => Err(SheetError::RangeNotClosed {
            property: property.to_string(),
            location: CellLocation::new(sheet.name.as_str(), row, 0),
        }),
        None => Ok(()),
    }
}
