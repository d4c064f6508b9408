//! Scripted in-memory session for tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{BrowserSession, PdfOptions};
use crate::acquire::{CATALOG_ITEMS_SCRIPT, MENU_LINKS_SCRIPT, NEXT_VISIBLE_SCRIPT};
use crate::config::Selectors;
use crate::error::{AcquireError, AcquireResult};

/// One tile on a fake selection page.
#[derive(Debug, Clone)]
pub enum FakeTile {
    /// Opens a menu of `(text, href)` links.
    Menu {
        label: String,
        links: Vec<(String, String)>,
    },
    /// Navigates to `url`.
    Navigate { label: String, url: String },
    /// Does nothing when clicked.
    Inert { label: String },
}

impl FakeTile {
    fn label(&self) -> &str {
        match self {
            FakeTile::Menu { label, .. }
            | FakeTile::Navigate { label, .. }
            | FakeTile::Inert { label } => label,
        }
    }
}

/// What the fake site serves.
#[derive(Debug, Clone)]
pub struct FakeSite {
    pub catalog_url: String,
    /// Rows returned by the catalog extraction script, per page.
    pub catalog_pages: Vec<Vec<Value>>,
    /// Clicking next leaves the page content unchanged.
    pub stale_next: bool,
    /// The next control is in the DOM but not rendered.
    pub next_hidden: bool,
    /// The next control reports visible but is gone by the time it is clicked.
    pub next_detached: bool,
    /// Tiles keyed by selection page URL.
    pub selection_pages: HashMap<String, Vec<FakeTile>>,
    /// Navigating to any of these fails.
    pub failing_urls: HashSet<String>,
    /// Rendering while on any of these fails.
    pub failing_renders: HashSet<String>,
    pub cookie_banner: bool,
    /// Tile clicks never finish navigating.
    pub navigation_stalls: bool,
    /// Going back lands on a page without tiles.
    pub back_loses_tiles: bool,
    /// Tiles served by a selection page after the first back navigation to it.
    pub tiles_after_back: Option<Vec<FakeTile>>,
    pub selectors: Selectors,
}

impl Default for FakeSite {
    fn default() -> Self {
        Self::with_selectors(Selectors::default())
    }
}

impl FakeSite {
    pub fn with_selectors(selectors: Selectors) -> Self {
        Self {
            catalog_url: "https://site.test/resources".to_string(),
            catalog_pages: Vec::new(),
            stale_next: false,
            next_hidden: false,
            next_detached: false,
            selection_pages: HashMap::new(),
            failing_urls: HashSet::new(),
            failing_renders: HashSet::new(),
            cookie_banner: false,
            navigation_stalls: false,
            back_loses_tiles: false,
            tiles_after_back: None,
            selectors,
        }
    }
}

pub struct FakeSession {
    site: FakeSite,
    url: String,
    history: Vec<String>,
    catalog_page: usize,
    menu: Option<Vec<(String, String)>>,
    /// Catalog extraction calls.
    pub catalog_reads: usize,
    /// `(page url, destination)` per successful render.
    pub renders: Vec<(String, PathBuf)>,
    /// Every navigation attempted, failed ones included.
    pub navigations: Vec<String>,
    pub cookie_dismissals: usize,
    pub keys: Vec<String>,
}

impl FakeSession {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            url: "about:blank".to_string(),
            history: Vec::new(),
            catalog_page: 0,
            menu: None,
            catalog_reads: 0,
            renders: Vec::new(),
            navigations: Vec::new(),
            cookie_dismissals: 0,
            keys: Vec::new(),
        }
    }

    pub fn site(&self) -> &FakeSite {
        &self.site
    }

    pub fn menu_open(&self) -> bool {
        self.menu.is_some()
    }

    fn on_catalog(&self) -> bool {
        self.url == self.site.catalog_url
    }

    fn catalog_items(&self) -> Option<&Vec<Value>> {
        if self.on_catalog() {
            self.site.catalog_pages.get(self.catalog_page)
        } else {
            None
        }
    }

    fn has_next_page(&self) -> bool {
        self.on_catalog() && self.catalog_page + 1 < self.site.catalog_pages.len()
    }

    fn tiles(&self) -> &[FakeTile] {
        self.site
            .selection_pages
            .get(&self.url)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn match_count(&self, selector: &str) -> usize {
        let s = &self.site.selectors;
        if selector == s.catalog_item {
            self.catalog_items().map_or(0, Vec::len)
        } else if selector == s.next_page {
            usize::from(self.has_next_page())
        } else if selector == s.tile {
            self.tiles().len()
        } else if selector == s.menu {
            usize::from(self.menu.is_some())
        } else if selector == s.menu_link {
            self.menu.as_ref().map_or(0, Vec::len)
        } else if selector == s.cookie_accept {
            usize::from(self.site.cookie_banner)
        } else {
            0
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> AcquireResult<()> {
        self.navigations.push(url.to_string());
        if self.site.failing_urls.contains(url) {
            return Err(AcquireError::timeout(format!("navigation to {}", url), timeout));
        }
        let previous = std::mem::replace(&mut self.url, url.to_string());
        self.history.push(previous);
        self.menu = None;
        if self.on_catalog() {
            self.catalog_page = 0;
        }
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> AcquireResult<bool> {
        Ok(self.match_count(selector) > 0)
    }

    async fn count(&mut self, selector: &str) -> AcquireResult<usize> {
        Ok(self.match_count(selector))
    }

    async fn text_at(&mut self, selector: &str, index: usize) -> AcquireResult<Option<String>> {
        let s = &self.site.selectors;
        if selector == s.catalog_item {
            let text = self
                .catalog_items()
                .filter(|items| index < items.len())
                .map(|_| format!("catalog page {} item {}", self.catalog_page, index));
            return Ok(text);
        }
        if selector == s.tile {
            return Ok(self.tiles().get(index).map(|t| t.label().to_string()));
        }
        Ok(None)
    }

    async fn click_at(&mut self, selector: &str, index: usize) -> AcquireResult<bool> {
        let s = self.site.selectors.clone();
        if selector == s.next_page {
            if !self.has_next_page() || self.site.next_detached {
                return Ok(false);
            }
            if !self.site.stale_next {
                self.catalog_page += 1;
            }
            return Ok(true);
        }
        if selector == s.cookie_accept {
            if !self.site.cookie_banner {
                return Ok(false);
            }
            self.site.cookie_banner = false;
            self.cookie_dismissals += 1;
            return Ok(true);
        }
        if selector == s.tile {
            let tile = match self.tiles().get(index) {
                Some(tile) => tile.clone(),
                None => return Ok(false),
            };
            match tile {
                FakeTile::Menu { links, .. } => self.menu = Some(links),
                FakeTile::Navigate { url, .. } => {
                    let previous = std::mem::replace(&mut self.url, url);
                    self.history.push(previous);
                }
                FakeTile::Inert { .. } => {}
            }
            return Ok(true);
        }
        Ok(false)
    }

    async fn evaluate(&mut self, function: &str, args: Vec<Value>) -> AcquireResult<Value> {
        if function == CATALOG_ITEMS_SCRIPT {
            self.catalog_reads += 1;
            let rows = self.catalog_items().cloned().unwrap_or_default();
            return Ok(Value::Array(rows));
        }
        if function == NEXT_VISIBLE_SCRIPT {
            let selector = args.first().and_then(Value::as_str).unwrap_or_default();
            return Ok(Value::Bool(
                selector == self.site.selectors.next_page
                    && self.has_next_page()
                    && !self.site.next_hidden,
            ));
        }
        if function == MENU_LINKS_SCRIPT {
            let links = self
                .menu
                .iter()
                .flatten()
                .map(|(text, href)| json!({"text": text, "href": href}))
                .collect();
            return Ok(Value::Array(links));
        }
        Err(AcquireError::Browser("unexpected script".to_string()))
    }

    async fn press_key(&mut self, key: &str) -> AcquireResult<()> {
        self.keys.push(key.to_string());
        if key == "Escape" {
            self.menu = None;
        }
        Ok(())
    }

    async fn current_url(&mut self) -> AcquireResult<String> {
        Ok(self.url.clone())
    }

    async fn wait_for_navigation(&mut self, _timeout: Duration) -> AcquireResult<bool> {
        Ok(!self.site.navigation_stalls)
    }

    async fn go_back(&mut self, _timeout: Duration) -> AcquireResult<()> {
        let previous = self
            .history
            .pop()
            .ok_or_else(|| AcquireError::Browser("no history to go back to".to_string()))?;
        self.menu = None;
        if self.site.back_loses_tiles {
            self.url = "about:blank".to_string();
            return Ok(());
        }
        if self.site.selection_pages.contains_key(&previous) {
            if let Some(tiles) = self.site.tiles_after_back.take() {
                self.site.selection_pages.insert(previous.clone(), tiles);
            }
        }
        self.url = previous;
        Ok(())
    }

    async fn render_pdf(&mut self, path: &Path, _options: &PdfOptions) -> AcquireResult<()> {
        if self.site.failing_renders.contains(&self.url) {
            return Err(AcquireError::Render {
                url: self.url.clone(),
                reason: "print failed".to_string(),
            });
        }
        let body = format!("%PDF-1.4 {}", self.url);
        tokio::fs::write(path, body.as_bytes())
            .await
            .map_err(|e| AcquireError::filesystem(path, e))?;
        self.renders.push((self.url.clone(), path.to_path_buf()));
        Ok(())
    }

    async fn close(&mut self) -> AcquireResult<()> {
        Ok(())
    }
}
