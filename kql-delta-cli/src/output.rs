//! Terminal output formatting for all kql-delta commands.
//! Uses comfy-table for tabular output and colored for
//! change-aware terminal styling.

use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use kql_delta_core::{CheckReport, DeltaAction, DeltaReport, ExportReport};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.into_iter().map(Cell::new).collect::<Vec<_>>());
    table
}

/// Return a colored string representation of a delta action.
fn format_action(action: DeltaAction) -> String {
    match action {
        DeltaAction::Create => "+ create".green().to_string(),
        DeltaAction::Drop => "- drop".red().to_string(),
        DeltaAction::Alter => "~ alter".yellow().to_string(),
        DeltaAction::Unchanged => "unchanged".dimmed().to_string(),
    }
}

/// Print the delta summary and the table of changed objects.
pub fn print_delta_report(report: &DeltaReport) {
    println!(
        "{} {} {} {}",
        "Delta".bold(),
        report.current.dimmed(),
        "→".bold(),
        report.target.dimmed()
    );

    if !report.has_changes {
        println!(
            "{}",
            format!(
                "No schema differences detected ({} object(s) unchanged).",
                report.unchanged
            )
            .green()
            .bold()
        );
        return;
    }

    let mut table = new_table(vec!["Action", "Kind", "Name", "Data Loss"]);
    for entry in &report.entries {
        let loss = if entry.data_loss {
            "yes".red().bold().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            Cell::new(format_action(entry.action)),
            Cell::new(entry.category.to_string()),
            Cell::new(&entry.name),
            Cell::new(loss),
        ]);
    }
    println!("{table}");

    println!(
        "{}",
        format!(
            "{} create(s), {} alter(s), {} drop(s), {} unchanged",
            report.creates, report.alters, report.drops, report.unchanged
        )
        .bold()
    );
    if report.data_loss > 0 {
        println!(
            "{}",
            format!(
                "Warning: {} command(s) drop a table or drop/retype columns.",
                report.data_loss
            )
            .red()
            .bold()
        );
    }
    println!("{}", format!("Checksum: {}", report.checksum).dimmed());
}

/// Print a rendered script as is, without styling, so it can be piped.
pub fn print_script(script: &str) {
    let mut out = std::io::stdout().lock();
    if let Err(e) = write_script(&mut out, script) {
        log::warn!("Could not write script to stdout; error={}", e);
    }
}

fn write_script(out: &mut impl Write, script: &str) -> io::Result<()> {
    out.write_all(script.as_bytes())?;
    out.flush()
}

/// List the files written by a command.
pub fn print_outputs(outputs: &[PathBuf]) {
    for path in outputs {
        println!("  {} {}", "→".green(), path.display());
    }
}

/// Print export summary.
pub fn print_export_report(report: &ExportReport) {
    println!(
        "{}",
        format!(
            "Exported {} schema from {} ({} table(s), {} function(s))",
            report.side, report.source, report.tables, report.functions
        )
        .green()
        .bold()
    );
    print_outputs(&report.outputs);
}

/// Print check results, one row per source.
pub fn print_check_report(report: &CheckReport) {
    let mut table = new_table(vec!["Side", "Source", "Files", "Tables", "Functions"]);
    for source in &report.sources {
        table.add_row(vec![
            Cell::new(source.side.to_string()),
            Cell::new(&source.source),
            Cell::new(source.files.len()),
            Cell::new(source.tables),
            Cell::new(source.functions),
        ]);
    }
    println!("{table}");
    println!("{}", "All sources are valid.".green().bold());
}
