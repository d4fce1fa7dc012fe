//!
//! # Overview
//!
//! This module defines the unified, `miette`-based diagnostic system for sheetforge. Every
//! failure produced while loading a template, ingesting a data payload, expanding rows, or
//! writing a report is represented by [`SheetError`].
//!
//! # Error Construction
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(Payload, "expected a mapping, got {}", kind)`
//!   - `err_msg!(DocumentFormat, "sheet {} has no name", idx)`
//!
//! - **Build location-carrying errors directly.** Range and evaluation errors always know the
//!   template cell they came from; construct them with a [`CellLocation`].
//!
//! Every error is fatal for the render that produced it. Nothing in the crate retries.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Boxed cause carried by errors that wrap a collaborator failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, SheetError>;

/// Type-safe error classification that corresponds to `SheetError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// A range-start directive has no matching end.
    RangeNotClosed,
    /// The context property behind a range is missing or not a list of mappings.
    InvalidRangeContext,
    /// The template expression evaluator rejected a cell.
    Evaluation,
    /// Export was requested before a successful render.
    NoReportGenerated,
    /// Render was requested before a template was loaded.
    NoTemplateLoaded,
    /// Malformed workbook input or unwritable workbook output.
    DocumentFormat,
    /// The data payload has an unsupported shape.
    Payload,
    /// Filesystem or stream failure.
    Io,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::RangeNotClosed => "RangeNotClosed",
            ErrorType::InvalidRangeContext => "InvalidRangeContext",
            ErrorType::Evaluation => "Evaluation",
            ErrorType::NoReportGenerated => "NoReportGenerated",
            ErrorType::NoTemplateLoaded => "NoTemplateLoaded",
            ErrorType::DocumentFormat => "DocumentFormat",
            ErrorType::Payload => "Payload",
            ErrorType::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a template cell: sheet name plus zero-based row and column.
///
/// Displays in A1 notation, e.g. `Report!B3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellLocation {
    pub sheet: String,
    pub row: usize,
    pub column: usize,
}

impl CellLocation {
    pub fn new(sheet: impl Into<String>, row: usize, column: usize) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            column,
        }
    }
}

impl fmt::Display for CellLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}",
            self.sheet,
            column_letters(self.column),
            self.row + 1
        )
    }
}

/// Converts a zero-based column index into spreadsheet letters (0 -> A, 27 -> AB).
pub fn column_letters(column: usize) -> String {
    let mut letters = Vec::new();
    let mut n = column + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Unified error type for every sheetforge failure mode.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("End of range {property:?} not found (range starts at {location})")]
    RangeNotClosed {
        property: String,
        location: CellLocation,
    },
    #[error("Not expected context property for range {property:?} at {location}")]
    InvalidRangeContext {
        property: String,
        location: CellLocation,
    },
    #[error("Evaluation error at {location}: {message}")]
    Evaluation {
        location: CellLocation,
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Report was not generated")]
    NoReportGenerated,
    #[error("No template loaded")]
    NoTemplateLoaded,
    #[error("Document format error: {message}")]
    DocumentFormat {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("Payload error: {message}")]
    Payload {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Returns the type-safe classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            SheetError::RangeNotClosed { .. } => ErrorType::RangeNotClosed,
            SheetError::InvalidRangeContext { .. } => ErrorType::InvalidRangeContext,
            SheetError::Evaluation { .. } => ErrorType::Evaluation,
            SheetError::NoReportGenerated => ErrorType::NoReportGenerated,
            SheetError::NoTemplateLoaded => ErrorType::NoTemplateLoaded,
            SheetError::DocumentFormat { .. } => ErrorType::DocumentFormat,
            SheetError::Payload { .. } => ErrorType::Payload,
            SheetError::Io(_) => ErrorType::Io,
        }
    }

    /// The template cell the error points at, if any.
    pub fn location(&self) -> Option<&CellLocation> {
        match self {
            SheetError::RangeNotClosed { location, .. }
            | SheetError::InvalidRangeContext { location, .. }
            | SheetError::Evaluation { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Wraps a serialization failure from the document layer.
    pub fn document_format(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SheetError::DocumentFormat {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wraps a deserialization failure while ingesting a data payload.
    pub fn payload(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SheetError::Payload {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl Diagnostic for SheetError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.error_type() {
            ErrorType::RangeNotClosed => "sheetforge::range_not_closed",
            ErrorType::InvalidRangeContext => "sheetforge::invalid_range_context",
            ErrorType::Evaluation => "sheetforge::evaluation",
            ErrorType::NoReportGenerated => "sheetforge::no_report",
            ErrorType::NoTemplateLoaded => "sheetforge::no_template",
            ErrorType::DocumentFormat => "sheetforge::document_format",
            ErrorType::Payload => "sheetforge::payload",
            ErrorType::Io => "sheetforge::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help: String = match self {
            SheetError::RangeNotClosed { property, .. } => format!(
                "add a row whose first cell is `{{{{end}}}}` after the body of range `{}`",
                property
            ),
            SheetError::InvalidRangeContext { property, .. } => format!(
                "`{}` must be a list of mappings in the data supplied for this sheet",
                property
            ),
            SheetError::NoReportGenerated => "call `render` before exporting".to_string(),
            SheetError::NoTemplateLoaded => {
                "load a template with `read_template` or `from_bytes` first".to_string()
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// Constructs a message-only `SheetError` variant (`DocumentFormat`, `Payload`) with a
/// formatted message and no source.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::SheetError::$variant {
            message: format!($msg, $($arg),+),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::SheetError::$variant {
            message: format!("{}", $msg),
            source: None,
        }
    };
}
