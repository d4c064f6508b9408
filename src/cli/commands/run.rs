//! Full discovery and fetch run.

use console::style;

use crate::acquire::{Acquirer, CatalogSummary, RunReport};
use crate::cli::helpers::{close_session, launch_session, select_lines};
use crate::cli::icons::{arrow, error, success};
use crate::config::Config;
use crate::http_client::HttpDownloader;
use crate::models::RunDate;
use crate::storage::OutputLayout;

/// Catalog first, then each selected product line.
///
/// Completes normally after closing the browser even when lines failed.
pub async fn cmd_run(config: Config, run_date: RunDate, line_names: &[String]) -> anyhow::Result<()> {
    let lines = select_lines(&config, line_names)?;
    let layout = OutputLayout::new(&config.output_dir, run_date);
    let downloader = HttpDownloader::new(&config.http)?;

    println!(
        "{} Run {} into {}",
        arrow(),
        style(run_date).cyan(),
        layout.root().display()
    );

    let mut session = launch_session(&config.browser).await?;
    let acquirer = Acquirer::new(config, layout, downloader);
    let result = acquirer.run(session.as_mut(), &lines).await;
    close_session(session.as_mut()).await;

    match result {
        Ok(report) => print_report(&report),
        Err(e) => eprintln!("{} Run stopped: {}", error(), e),
    }
    Ok(())
}

pub(super) fn print_catalog_summary(summary: &CatalogSummary) {
    println!(
        "{} Catalog: {} pages, {} downloaded, {} already present",
        success(),
        summary.pages,
        summary.downloaded,
        summary.skipped
    );
}

fn print_report(report: &RunReport) {
    print_catalog_summary(&report.catalog);

    for line in &report.lines {
        let marker = if line.failed == 0 { success() } else { error() };
        println!(
            "{} {}: {} found, {} rendered, {} already present",
            marker,
            style(&line.line).bold(),
            line.discovered,
            line.rendered,
            line.skipped
        );
        if line.failed > 0 {
            println!("  {} {} items failed", arrow(), line.failed);
        }
    }

    for failure in &report.failures {
        println!("{} {}: {}", error(), style(&failure.line).bold(), failure.error);
    }
}
