//! `.xlsx` templates in, `.xlsx` reports out.
//!
//! Reading keeps every cell's displayed text at its row and column position; styles, widths
//! and heights stay with the file. Export writes values, the basic style attributes (font,
//! fill, alignment, wrap, number format), row heights, column widths and hidden columns.
//! Rich-text runs are flattened to plain text.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatUnderline, Workbook as XlsxWorkbook, XlsxError,
};

use crate::diagnostics::Result;
use crate::document::{Cell, Row, Style, Workbook};
use crate::SheetError;

/// Excel's sheet limits: 1,048,576 rows by 16,384 columns.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

fn xlsx_err(e: XlsxError) -> SheetError {
    SheetError::document_format("xlsx export failed", e)
}

// ============================================================================
// READING
// ============================================================================

/// Reads an `.xlsx` workbook into the document model, one sheet per worksheet.
pub fn read_xlsx(bytes: &[u8]) -> Result<Workbook> {
    let mut book: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| SheetError::document_format("workbook is not a valid xlsx file", e))?;

    let mut workbook = Workbook::new();
    for name in book.sheet_names() {
        let range = book.worksheet_range(&name).map_err(|e| {
            SheetError::document_format(format!("worksheet {:?} could not be read", name), e)
        })?;
        let sheet = workbook.add_sheet(name.as_str());
        let Some((first_row, first_col)) = range.start() else {
            continue;
        };

        sheet.rows.resize_with(first_row as usize, Row::default);
        for values in range.rows() {
            let mut row = Row::default();
            row.cells.resize_with(first_col as usize, Cell::default);
            row.cells.extend(values.iter().map(|v| Cell::new(cell_text_of(v))));
            while row.cells.last().is_some_and(|c| c.value.is_empty()) {
                row.cells.pop();
            }
            sheet.push_row(row);
        }
    }
    Ok(workbook)
}

fn cell_text_of(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// EXPORT
// ============================================================================

pub fn save_xlsx(workbook: &Workbook, path: impl AsRef<Path>) -> Result<()> {
    let mut book = build(workbook)?;
    book.save(path.as_ref()).map_err(xlsx_err)
}

pub fn to_xlsx_buffer(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut book = build(workbook)?;
    book.save_to_buffer().map_err(xlsx_err)
}

fn build(workbook: &Workbook) -> Result<XlsxWorkbook> {
    let mut book = XlsxWorkbook::new();

    for sheet in &workbook.sheets {
        let ws = book.add_worksheet();
        ws.set_name(sheet.name.as_str()).map_err(xlsx_err)?;

        for column in &sheet.columns {
            for col in column.min.max(1)..=column.max {
                let idx = col_index(col as usize - 1, &sheet.name)?;
                if let Some(width) = column.width {
                    ws.set_column_width(idx, width).map_err(xlsx_err)?;
                }
                if column.hidden {
                    ws.set_column_hidden(idx).map_err(xlsx_err)?;
                }
            }
        }

        for (r, row) in sheet.rows.iter().enumerate() {
            let r = row_index(r, &sheet.name)?;
            if let Some(height) = row.height {
                ws.set_row_height(r, height).map_err(xlsx_err)?;
            }
            for (c, cell) in row.cells.iter().enumerate() {
                let c = col_index(c, &sheet.name)?;
                let text = cell_text(cell);
                let format = build_format(&cell.style);
                if text.is_empty() {
                    if !cell.style.is_default() {
                        ws.write_blank(r, c, &format).map_err(xlsx_err)?;
                    }
                    continue;
                }
                ws.write_string_with_format(r, c, text.as_str(), &format)
                    .map_err(xlsx_err)?;
            }
        }
    }

    Ok(book)
}

fn row_index(row: usize, sheet: &str) -> Result<u32> {
    u32::try_from(row)
        .ok()
        .filter(|_| row < MAX_ROWS)
        .ok_or_else(|| {
            crate::err_msg!(
                DocumentFormat,
                "sheet {:?} has more than {} rows",
                sheet,
                MAX_ROWS
            )
        })
}

fn col_index(col: usize, sheet: &str) -> Result<u16> {
    u16::try_from(col)
        .ok()
        .filter(|_| col < MAX_COLS)
        .ok_or_else(|| {
            crate::err_msg!(
                DocumentFormat,
                "sheet {:?} has more than {} columns",
                sheet,
                MAX_COLS
            )
        })
}

fn cell_text(cell: &Cell) -> String {
    if cell.value.is_empty() {
        cell.rich_text.iter().map(|run| run.text.as_str()).collect()
    } else {
        cell.value.clone()
    }
}

fn parse_hex_color(hex: &str) -> Color {
    let s = hex.strip_prefix('#').unwrap_or(hex);
    match u32::from_str_radix(s, 16) {
        Ok(n) => Color::RGB(n),
        Err(_) => Color::Black,
    }
}

fn map_h_align(s: &str) -> Option<FormatAlign> {
    match s.to_ascii_lowercase().as_str() {
        "left" => Some(FormatAlign::Left),
        "center" | "centre" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        _ => None,
    }
}

fn map_v_align(s: &str) -> Option<FormatAlign> {
    match s.to_ascii_lowercase().as_str() {
        "top" => Some(FormatAlign::Top),
        "center" | "centre" => Some(FormatAlign::VerticalCenter),
        "bottom" => Some(FormatAlign::Bottom),
        _ => None,
    }
}

fn build_format(style: &Style) -> Format {
    let mut f = Format::new();
    let font = &style.font;
    if font.bold {
        f = f.set_bold();
    }
    if font.italic {
        f = f.set_italic();
    }
    if font.underline {
        f = f.set_underline(FormatUnderline::Single);
    }
    if let Some(ref name) = font.name {
        f = f.set_font_name(name);
    }
    if let Some(size) = font.size {
        f = f.set_font_size(size);
    }
    if let Some(ref color) = font.color {
        f = f.set_font_color(parse_hex_color(color));
    }
    if let Some(ref fill) = style.fill {
        f = f.set_background_color(parse_hex_color(fill));
    }
    if let Some(ref nf) = style.number_format {
        f = f.set_num_format(nf);
    }
    if let Some(align) = style.alignment.horizontal.as_deref().and_then(map_h_align) {
        f = f.set_align(align);
    }
    if let Some(align) = style.alignment.vertical.as_deref().and_then(map_v_align) {
        f = f.set_align(align);
    }
    if style.alignment.wrap_text {
        f = f.set_text_wrap();
    }
    f
}
