//! Catalog-only run.

use crate::acquire::Acquirer;
use crate::cli::helpers::{close_session, launch_session};
use crate::cli::icons::error;
use crate::config::Config;
use crate::http_client::HttpDownloader;
use crate::models::RunDate;
use crate::storage::OutputLayout;

use super::run::print_catalog_summary;

/// Walk the catalog and download every tagged resource.
pub async fn cmd_catalog(config: Config, run_date: RunDate) -> anyhow::Result<()> {
    let layout = OutputLayout::new(&config.output_dir, run_date);
    let downloader = HttpDownloader::new(&config.http)?;
    let mut session = launch_session(&config.browser).await?;

    let acquirer = Acquirer::new(config, layout, downloader);
    let result = acquirer.walk_catalog(session.as_mut()).await;
    close_session(session.as_mut()).await;

    match result {
        Ok(summary) => print_catalog_summary(&summary),
        Err(e) => eprintln!("{} Catalog walk failed: {}", error(), e),
    }
    Ok(())
}
