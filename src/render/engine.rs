//! The row expansion engine.
//!
//! Walks a sheet's template rows, expands range blocks and list rows against the active
//! context, and appends rendered rows to the output sheet. Processing is depth-first and
//! left to right; the first failure aborts the whole expansion.
//!
//! ## Scoping
//!
//! Contexts are never mutated here. A range iteration renders its body against
//! `ctx.enter_range(..)`, a list-row iteration against `ctx.rebound(..)`; both are fresh
//! children dropped when the iteration ends.

use tracing::{debug, trace};

use crate::context::Context;
use crate::diagnostics::{CellLocation, Result};
use crate::document::{Row, Sheet};
use crate::render::directive;
use crate::render::evaluator::{escape_braces, Evaluator};
use crate::render::RenderOptions;
use crate::SheetError;

/// Shared, read-only state for one sheet's expansion.
pub struct Expander<'a> {
    evaluator: &'a dyn Evaluator,
    options: &'a RenderOptions,
    sheet_name: &'a str,
}

impl<'a> Expander<'a> {
    pub fn new(
        evaluator: &'a dyn Evaluator,
        options: &'a RenderOptions,
        sheet_name: &'a str,
    ) -> Self {
        Self {
            evaluator,
            options,
            sheet_name,
        }
    }

    /// Expands `rows` into `out` against `ctx`.
    pub fn expand(&self, out: &mut Sheet, rows: &[Row], ctx: &Context) -> Result<()> {
        self.expand_from(out, rows, 0, ctx)
    }

    // `base` is the template index of rows[0], used for error locations.
    fn expand_from(&self, out: &mut Sheet, rows: &[Row], base: usize, ctx: &Context) -> Result<()> {
        let mut ri = 0;
        while ri < rows.len() {
            let row = &rows[ri];

            if let Some(property) = directive::range_start(row) {
                ri = self.expand_range(out, rows, base, ri, property, ctx)?;
                continue;
            }

            let items = directive::list_field(row)
                .and_then(|property| ctx.array_items(property).map(|items| (property, items)));

            match items {
                Some((property, items)) => {
                    debug!(property, len = items.len(), "list row fan-out");
                    for item in items {
                        let local = ctx.rebound(property, item.clone());
                        self.emit(out, row, base + ri, &local)?;
                    }
                }
                None => self.emit(out, row, base + ri, ctx)?,
            }
            ri += 1;
        }
        Ok(())
    }

    /// Expands the range block starting at `rows[start]` and returns the index just past
    /// its end marker.
    fn expand_range(
        &self,
        out: &mut Sheet,
        rows: &[Row],
        base: usize,
        start: usize,
        property: &str,
        ctx: &Context,
    ) -> Result<usize> {
        let location = CellLocation::new(self.sheet_name, base + start, 0);
        let body = start + 1;

        let end = directive::find_range_end(&rows[body..])
            .map(|offset| body + offset)
            .ok_or_else(|| SheetError::RangeNotClosed {
                property: property.to_string(),
                location: location.clone(),
            })?;

        let items =
            ctx.range_contexts(property)
                .ok_or_else(|| SheetError::InvalidRangeContext {
                    property: property.to_string(),
                    location,
                })?;

        debug!(property, iterations = items.len(), "entering range");
        for item in &items {
            let local = ctx.enter_range(property, item);
            self.expand_from(out, &rows[body..end], base + body, &local)?;
        }

        Ok(end + 1)
    }

    /// Clones `row` forward, renders every cell against `ctx`, and appends it.
    fn emit(&self, out: &mut Sheet, row: &Row, template_row: usize, ctx: &Context) -> Result<()> {
        let mut new_row = row.clone_layout(self.options.wrap_text_in_all_cells);
        for (column, cell) in new_row.cells.iter_mut().enumerate() {
            let escaped = escape_braces(&cell.value);
            cell.value = self.evaluator.evaluate(&escaped, ctx).map_err(|e| {
                SheetError::Evaluation {
                    location: CellLocation::new(self.sheet_name, template_row, column),
                    message: e.to_string(),
                    source: Some(e),
                }
            })?;
        }
        trace!(template_row, output_row = out.rows.len(), "row emitted");
        out.push_row(new_row);
        Ok(())
    }
}

/// Expands `rows` into `out`; see [`Expander`].
pub fn expand(
    out: &mut Sheet,
    rows: &[Row],
    ctx: &Context,
    options: &RenderOptions,
    evaluator: &dyn Evaluator,
) -> Result<()> {
    let name = out.name.clone();
    Expander::new(evaluator, options, &name).expand(out, rows, ctx)
}
