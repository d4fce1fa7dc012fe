//! Defines the command-line arguments and subcommands for the sheetforge CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "sheetforge",
    version,
    about = "Render spreadsheet templates against structured data."
)]
pub struct SheetforgeArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a template workbook against a JSON or YAML data file.
    Render {
        /// The template workbook to render.
        #[arg(required = true)]
        template: PathBuf,
        /// Data file (`.json`, `.yaml` or `.yml`).
        #[arg(short, long)]
        data: PathBuf,
        /// Where to write the rendered workbook.
        #[arg(short, long)]
        output: PathBuf,
        /// Force text wrapping on in every rendered cell.
        #[arg(long)]
        wrap_text: bool,
    },
    /// Check that every range block in a template is closed.
    Check {
        /// The template workbook to check.
        #[arg(required = true)]
        template: PathBuf,
    },
}
