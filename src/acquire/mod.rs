//! Discovery and fetch orchestration.
//!
//! A run walks the public catalog once, then every requested product line in
//! order. Everything is sequential over a single browser session.

mod catalog;
mod selection;
mod snapshot;

pub use catalog::{walk_catalog, CatalogSummary};
pub use selection::{discover_entries, dismiss_cookie_banner, ClickOutcome};
pub use snapshot::render_snapshot;

#[cfg(test)]
pub(crate) use catalog::{CATALOG_ITEMS_SCRIPT, NEXT_VISIBLE_SCRIPT};
#[cfg(test)]
pub(crate) use selection::MENU_LINKS_SCRIPT;

use tracing::{error, info, warn};

use crate::browser::{BrowserSession, PdfOptions};
use crate::config::Config;
use crate::error::{AcquireError, AcquireResult};
use crate::http_client::DocumentDownloader;
use crate::models::{ProductLine, SelectionEntry};
use crate::storage::OutputLayout;

/// Result of processing one product line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineReport {
    pub line: String,
    pub discovered: usize,
    pub rendered: usize,
    pub skipped: usize,
    /// Items whose fetch failed without stopping the line.
    pub failed: usize,
}

/// A product line that stopped on an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    pub line: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub catalog: CatalogSummary,
    pub lines: Vec<LineReport>,
    pub failures: Vec<LineFailure>,
}

enum ItemOutcome {
    Rendered,
    Skipped,
}

/// Drives a full run against one session.
pub struct Acquirer<D> {
    config: Config,
    layout: OutputLayout,
    downloader: D,
    pdf: PdfOptions,
}

impl<D: DocumentDownloader> Acquirer<D> {
    pub fn new(config: Config, layout: OutputLayout, downloader: D) -> Self {
        Self {
            config,
            layout,
            downloader,
            pdf: PdfOptions::default(),
        }
    }

    /// Catalog first, then each line in order.
    ///
    /// Catalog and filesystem errors end the run. Any other error inside a
    /// line is logged and recorded, and the next line proceeds.
    pub async fn run<B>(&self, session: &mut B, lines: &[ProductLine]) -> AcquireResult<RunReport>
    where
        B: BrowserSession + ?Sized,
    {
        let catalog = self.walk_catalog(session).await?;
        let mut report = RunReport {
            catalog,
            ..Default::default()
        };

        for line in lines {
            match self.process_line(session, line).await {
                Ok(line_report) => report.lines.push(line_report),
                Err(e @ AcquireError::Filesystem { .. }) => return Err(e),
                Err(e) => {
                    error!(line = %line.name, error = %e, "Product line failed");
                    report.failures.push(LineFailure {
                        line: line.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    pub async fn walk_catalog<B>(&self, session: &mut B) -> AcquireResult<CatalogSummary>
    where
        B: BrowserSession + ?Sized,
    {
        walk_catalog(session, &self.downloader, &self.layout, &self.config).await
    }

    /// Discover and fetch every item of one product line.
    pub async fn process_line<B>(
        &self,
        session: &mut B,
        line: &ProductLine,
    ) -> AcquireResult<LineReport>
    where
        B: BrowserSession + ?Sized,
    {
        let selection_url = self.config.site.selection_url(line)?;
        info!(line = %line.name, url = %selection_url, "Processing product line");

        session
            .navigate(&selection_url, self.config.timeouts.selection_page())
            .await?;
        dismiss_cookie_banner(session, &self.config.selectors, &self.config.timeouts).await?;

        let entries = discover_entries(session, line, &selection_url, &self.config).await?;
        let mut report = LineReport {
            line: line.name.clone(),
            discovered: entries.len(),
            ..Default::default()
        };

        for entry in &entries {
            match self.fetch_entry(session, line, entry).await {
                Ok(ItemOutcome::Rendered) => report.rendered += 1,
                Ok(ItemOutcome::Skipped) => report.skipped += 1,
                Err(e @ AcquireError::Filesystem { .. }) => return Err(e),
                Err(e) if self.config.abort_line_on_item_error => return Err(e),
                Err(e) => {
                    warn!(line = %line.name, item = %entry.display_name, error = %e, "Item failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            line = %line.name,
            discovered = report.discovered,
            rendered = report.rendered,
            skipped = report.skipped,
            failed = report.failed,
            "Product line complete"
        );
        Ok(report)
    }

    async fn fetch_entry<B>(
        &self,
        session: &mut B,
        line: &ProductLine,
        entry: &SelectionEntry,
    ) -> AcquireResult<ItemOutcome>
    where
        B: BrowserSession + ?Sized,
    {
        let target = self
            .layout
            .item_target(&line.name, &entry.display_name)
            .await?;
        if target.exists() {
            return Ok(ItemOutcome::Skipped);
        }

        let preview_url = self.config.site.preview_url(line, entry)?;
        render_snapshot(
            session,
            &preview_url,
            &target.full_path,
            &self.config.timeouts,
            &self.pdf,
        )
        .await?;
        info!(line = %line.name, item = %entry.display_name, "Rendered item");
        Ok(ItemOutcome::Rendered)
    }
}
