//! Formatting and reporting for compile results

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::CompileReport;

/// Formats a compile report as a table of stages followed by a summary
pub fn format_report(report: &CompileReport) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Stage", "Status", "Duration", "Message"]);

    for record in &report.stages {
        let duration_str = format!("{:.2?}", record.duration);
        builder.push_record([
            record.name,
            &record.outcome.status.as_colored_str(),
            &duration_str,
            &record.outcome.message,
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    let mut output = String::new();
    output.push_str(&table.to_string());
    output.push('\n');

    output.push_str(&format_summary(report));

    output
}

fn format_summary(report: &CompileReport) -> String {
    let mut summary = String::new();

    summary.push_str(&format!("\n{}\n", "Summary".bold().underline()));
    summary.push_str(&format!("  Project: {}\n", report.project_dir.display()));
    summary.push_str(&format!("  Files copied: {}\n", report.copied_files));
    summary.push_str(&format!(
        "  Files generated: {}\n",
        report.generated_files.len()
    ));

    summary.push('\n');
    if report.has_warnings() {
        summary.push_str(&format!(
            "  {}\n",
            "Result: COMPILED (with warnings)".yellow().bold()
        ));
    } else {
        summary.push_str(&format!("  {}\n", "Result: COMPILED".green().bold()));
    }

    summary
}

/// Prints a compile report to stdout, including stage details
pub fn print_report(report: &CompileReport) {
    println!("{}", format_report(report));

    for record in &report.stages {
        if let Some(details) = &record.outcome.details {
            println!("\n{} Details:", record.name.bold());
            println!("{}", details);
        }
    }
}
