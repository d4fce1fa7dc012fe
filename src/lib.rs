pub use crate::diagnostics::{CellLocation, ErrorType, SheetError};

pub mod cli;
pub mod context;
pub mod diagnostics;
pub mod document;
pub mod render;
