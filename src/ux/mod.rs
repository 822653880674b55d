use colored::Colorize;
use humansize::{format_size, DECIMAL};

use crate::coordinator::MigrationResults;
use crate::migrate::FileOutcome;
use crate::phase::{PhaseOutcome, RunStatus};

fn outcome_label(o: &PhaseOutcome) -> String {
    match o {
        PhaseOutcome::Completed => "completed".green().bold().to_string(),
        PhaseOutcome::CompletedWithFailures(f) => format!("{} ({} failed)", "partial".yellow().bold(), f.len()),
        PhaseOutcome::Aborted(cause) => format!("{} ({})", "aborted".red().bold(), cause),
    }
}

pub fn print_run_dashboard(results: &MigrationResults, status: Option<RunStatus>) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━━ Migration Results ━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );

    match &results.analysis {
        Some(a) => println!(
            "  {}: {} files proposed, {} sources scanned, {} attempt(s)",
            "Analysis".cyan().bold(),
            a.files.len(),
            a.structure.source_files.len(),
            a.attempts
        ),
        None => println!("  {}: {}", "Analysis".cyan().bold(), "not completed".red()),
    }

    if let Some(m) = &results.migration {
        println!(
            "  {}: {}   migrated {}/{}   written {}",
            "Migration".yellow().bold(),
            outcome_label(&m.outcome),
            m.succeeded(),
            m.files.len(),
            format_size(m.bytes_written, DECIMAL)
        );
        for f in &m.files {
            match f {
                FileOutcome::Migrated { path, written, .. } => println!(
                    "    {} {}{}",
                    "✓".green(),
                    path,
                    written.as_ref().map(|p| format!("  -> {}", p.display())).unwrap_or_default()
                ),
                FileOutcome::Failed { path, reason } => println!("    {} {}  {}", "✗".red(), path, reason.dimmed()),
            }
        }
    }

    if let Some(t) = &results.tests {
        println!(
            "  {}: {}   bdd: {}   unit: {}",
            "Tests".magenta().bold(),
            outcome_label(&t.outcome),
            test_label(t.bdds.as_ref().map(|r| r.is_parsed())),
            test_label(t.unit_tests.as_ref().map(|r| r.is_parsed())),
        );
    }

    if results.report.is_some() {
        println!("  {}: generated", "Report".bold());
    }

    let status_line = match status {
        Some(RunStatus::Completed) => "COMPLETED".green().bold(),
        Some(RunStatus::CompletedWithFailures) => "COMPLETED WITH FAILURES".yellow().bold(),
        Some(RunStatus::Aborted) | None => "ABORTED".red().bold(),
    };
    println!("  {}: {}", "Status".bold(), status_line);
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
}

fn test_label(parsed: Option<bool>) -> String {
    match parsed {
        Some(true) => "ok".green().to_string(),
        Some(false) => "raw".yellow().to_string(),
        None => "failed".red().to_string(),
    }
}
