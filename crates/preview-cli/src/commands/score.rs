//! `score` command

use colored::Colorize;
use preview_core::config::PreviewConfig;
use preview_core::fidelity::FidelityReport;
use preview_core::service::PreviewService;
use std::path::Path;

use super::read_request;

/// Print the fidelity checklist a session created from `request` would get
pub fn execute(config: &PreviewConfig, request: &Path, json: bool) -> anyhow::Result<()> {
    let input = read_request(request)?;
    let service = PreviewService::from_config(config)?;
    let session = service.create_session(input)?;
    let report = service.report(&session.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_checklist(&report);
    }
    Ok(())
}

fn print_checklist(report: &FidelityReport) {
    println!(
        "\n{} {}",
        "Fidelity score:".bold(),
        format!("{}/100", report.score).cyan().bold()
    );
    println!();

    for (detail, line) in report.details.iter().zip(report.summary_lines()) {
        if detail.is_complete() {
            println!("  {} {}", "✓".green(), line);
        } else if detail.achieved > 0 {
            println!("  {} {}", "~".yellow(), line);
        } else {
            println!("  {} {}", "✗".red(), line.dimmed());
        }
    }
    println!();
}
