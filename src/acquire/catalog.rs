//! Catalog pagination walker.
//!
//! Walks every page of the public resources listing and downloads each item
//! once per product line it is tagged for.

use serde_json::Value;
use tracing::{debug, info};

use crate::browser::{wait_for_text_change, BrowserSession};
use crate::config::Config;
use crate::error::{AcquireError, AcquireResult};
use crate::http_client::DocumentDownloader;
use crate::models::CatalogEntry;
use crate::storage::OutputLayout;

/// Extracts `{name, href, tags}` rows for every catalog item on the page.
pub(crate) const CATALOG_ITEMS_SCRIPT: &str = r#"
(itemSelector, nameSelector, linkSelector, tagSelector) =>
    Array.from(document.querySelectorAll(itemSelector)).map((item) => {
        const name = item.querySelector(nameSelector);
        const link = item.querySelector(linkSelector);
        return {
            name: name ? name.textContent : null,
            href: link ? link.href : null,
            tags: Array.from(item.querySelectorAll(tagSelector)).map((tag) => tag.textContent),
        };
    })
"#;

/// True when the next-page control exists, is rendered and is enabled.
pub(crate) const NEXT_VISIBLE_SCRIPT: &str = r#"
(selector) => {
    const el = document.querySelector(selector);
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    if (el.offsetParent === null) return false;
    return !el.disabled && el.getAttribute('aria-disabled') !== 'true';
}
"#;

/// Outcome of a full catalog walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    /// Catalog pages read.
    pub pages: usize,
    /// Files written this run.
    pub downloaded: usize,
    /// Targets that already existed.
    pub skipped: usize,
}

/// Walk the catalog from its first page to the last.
///
/// Any failure is returned to the caller: the catalog is a prerequisite
/// stage and is not retried or partially accepted.
pub async fn walk_catalog<B, D>(
    session: &mut B,
    downloader: &D,
    layout: &OutputLayout,
    config: &Config,
) -> AcquireResult<CatalogSummary>
where
    B: BrowserSession + ?Sized,
    D: DocumentDownloader + ?Sized,
{
    let selectors = &config.selectors;
    let timeouts = &config.timeouts;
    let catalog_url = &config.site.catalog_url;

    info!(url = %catalog_url, "Walking catalog");
    session.navigate(catalog_url, timeouts.catalog_page()).await?;
    if !session
        .wait_for_selector(&selectors.catalog_item, timeouts.catalog_page())
        .await?
    {
        return Err(AcquireError::ElementNotFound(format!(
            "{} on {}",
            selectors.catalog_item, catalog_url
        )));
    }

    let mut summary = CatalogSummary::default();
    loop {
        summary.pages += 1;
        let entries = read_catalog_page(session, config).await?;
        debug!(page = summary.pages, items = entries.len(), "Read catalog page");

        for entry in &entries {
            fetch_catalog_entry(entry, downloader, layout, &mut summary).await?;
        }

        if !next_page_visible(session, &selectors.next_page).await? {
            break;
        }

        let witness = session.text_at(&selectors.catalog_item, 0).await?;
        if !session.click_at(&selectors.next_page, 0).await? {
            break;
        }
        wait_for_text_change(
            session,
            &selectors.catalog_item,
            witness.as_deref(),
            timeouts.catalog_page(),
        )
        .await?;
        tokio::time::sleep(timeouts.page_settle()).await;
    }

    info!(
        pages = summary.pages,
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        "Catalog walk complete"
    );
    Ok(summary)
}

/// Extract the downloadable items of the current page.
async fn read_catalog_page<B>(session: &mut B, config: &Config) -> AcquireResult<Vec<CatalogEntry>>
where
    B: BrowserSession + ?Sized,
{
    let selectors = &config.selectors;
    let rows = session
        .evaluate(
            CATALOG_ITEMS_SCRIPT,
            vec![
                Value::from(selectors.catalog_item.as_str()),
                Value::from(selectors.catalog_name.as_str()),
                Value::from(selectors.catalog_link.as_str()),
                Value::from(selectors.catalog_tag.as_str()),
            ],
        )
        .await?;

    let rows = rows.as_array().ok_or_else(|| {
        AcquireError::Browser(format!("catalog extraction returned {}", rows))
    })?;

    let entries: Vec<CatalogEntry> = rows.iter().filter_map(CatalogEntry::from_raw).collect();
    if entries.len() < rows.len() {
        debug!(
            "Skipped {} catalog items without a download link",
            rows.len() - entries.len()
        );
    }
    Ok(entries)
}

/// Fan one entry out to every tagged line, downloading missing targets.
async fn fetch_catalog_entry<D>(
    entry: &CatalogEntry,
    downloader: &D,
    layout: &OutputLayout,
    summary: &mut CatalogSummary,
) -> AcquireResult<()>
where
    D: DocumentDownloader + ?Sized,
{
    for line in &entry.tagged_lines {
        let target = layout.catalog_target(line, &entry.document_name).await?;
        if target.exists() {
            debug!(path = %target.full_path.display(), "Already fetched, skipping");
            summary.skipped += 1;
            continue;
        }

        let bytes = downloader
            .download(&entry.download_url, &target.full_path)
            .await?;
        info!(
            line = %line,
            document = %entry.document_name,
            bytes,
            "Downloaded catalog resource"
        );
        summary.downloaded += 1;
    }
    Ok(())
}

async fn next_page_visible<B>(session: &mut B, selector: &str) -> AcquireResult<bool>
where
    B: BrowserSession + ?Sized,
{
    let visible = session
        .evaluate(NEXT_VISIBLE_SCRIPT, vec![Value::from(selector)])
        .await?;
    Ok(visible.as_bool().unwrap_or(false))
}
