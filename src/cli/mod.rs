//! The sheetforge command-line interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::Path;
use std::{fs, process};

use clap::Parser;
use miette::Report;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, SheetforgeArgs};
use crate::context::Payload;
use crate::diagnostics::Result;
use crate::document::Workbook;
use crate::render::{check_ranges, RenderOptions, Template};

pub mod args;

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = SheetforgeArgs::parse();

    let result = match args.command {
        Command::Render {
            template,
            data,
            output,
            wrap_text,
        } => handle_render(&template, &data, &output, wrap_text),
        Command::Check { template } => handle_check(&template),
    };

    if let Err(e) = result {
        eprintln!("{:?}", Report::new(e));
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads a data payload, choosing YAML or JSON by file extension.
pub fn load_payload(path: &Path) -> Result<Payload> {
    let text = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Payload::from_yaml_str(&text)
    } else {
        Payload::from_json_str(&text)
    }
}

/// Handles the `render` subcommand.
fn handle_render(template: &Path, data: &Path, output: &Path, wrap_text: bool) -> Result<()> {
    let payload = load_payload(data)?;
    let options = RenderOptions {
        wrap_text_in_all_cells: wrap_text,
    };

    let mut tpl = Template::new();
    tpl.read_template(template)?;
    tpl.render_with_options(&payload, Some(&options))?;
    tpl.save(output)?;

    let report = tpl.report()?;
    let rows: usize = report.sheets.iter().map(|s| s.rows.len()).sum();
    println!(
        "Rendered {} sheet(s), {} row(s) -> {}",
        report.sheets.len(),
        rows,
        output.display()
    );
    Ok(())
}

/// Handles the `check` subcommand.
fn handle_check(template: &Path) -> Result<()> {
    let workbook = Workbook::load(template)?;
    check_ranges(&workbook)?;
    println!("{}: all ranges closed", template.display());
    Ok(())
}
