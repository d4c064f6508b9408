//! Configuration management for ruleacquire.
//!
//! Loaded from `ruleacquire.{toml,yaml,yml,json}` in the working directory or
//! an explicit path. Every section has defaults, so an empty file (or none at
//! all) gives a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::BrowserSessionConfig;
use crate::error::{AcquireError, AcquireResult};
use crate::models::{ProductLine, SelectionEntry};

/// Base name of auto-discovered config files.
pub const CONFIG_BASENAME: &str = "ruleacquire";

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root under which per-line directories are created.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Stop a product line at its first failed item instead of skipping it.
    #[serde(default)]
    pub abort_line_on_item_error: bool,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default = "default_product_lines")]
    pub product_lines: Vec<ProductLine>,
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub browser: BrowserSessionConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// File this config was loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            abort_line_on_item_error: false,
            site: SiteConfig::default(),
            product_lines: default_product_lines(),
            selectors: Selectors::default(),
            timeouts: Timeouts::default(),
            browser: BrowserSessionConfig::default(),
            http: HttpConfig::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load from an explicit path, or discover a config file in `dir`.
    /// Falls back to defaults when nothing is found.
    pub async fn load(explicit: Option<&Path>, dir: &Path) -> AcquireResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path).await;
        }

        for ext in CONFIG_EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", CONFIG_BASENAME, ext));
            if candidate.is_file() {
                return Self::load_from_path(&candidate).await;
            }
        }

        debug!("No config file found in {}, using defaults", dir.display());
        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    /// Supports TOML, YAML and JSON based on file extension.
    pub async fn load_from_path(path: &Path) -> AcquireResult<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AcquireError::filesystem(path, e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let mut config: Config = match ext {
            "json" => serde_json::from_str(&contents)
                .map_err(|e| AcquireError::Config(format!("Failed to parse JSON config: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| AcquireError::Config(format!("Failed to parse YAML config: {}", e)))?,
            _ => toml::from_str(&contents)
                .map_err(|e| AcquireError::Config(format!("Failed to parse TOML config: {}", e)))?,
        };

        config.source_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a selection URL for every line.
    pub fn validate(&self) -> AcquireResult<()> {
        for line in &self.product_lines {
            if line.name.trim().is_empty() {
                return Err(AcquireError::Config("product line with empty name".into()));
            }
            self.site.selection_url(line)?;
        }
        Ok(())
    }

    /// Serialize back to TOML (for `ruleacquire config`).
    pub fn to_toml(&self) -> AcquireResult<String> {
        toml::to_string_pretty(self).map_err(|e| AcquireError::Config(e.to_string()))
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Default product lines.
pub fn default_product_lines() -> Vec<ProductLine> {
    vec![
        ProductLine::numbered("Grimdark Future", 2, "2"),
        ProductLine::numbered("Grimdark Future Firefight", 3, "3"),
        ProductLine::numbered("Age of Fantasy", 4, "4"),
        ProductLine::numbered("Age of Fantasy Skirmish", 5, "5"),
        ProductLine::numbered("Age of Fantasy Regiments", 6, "6"),
        ProductLine::fixed(
            "Grimdark Future Warfleets FTL",
            "https://army-forge.onepagerules.com/ftl/fleetBookSelection",
            "ftl",
        ),
    ]
}

/// Site URLs and URL templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// First page of the public resources listing.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    /// Selection page for numbered lines; `{system}` is the system id.
    #[serde(default = "default_selection_url_template")]
    pub selection_url_template: String,
    /// Preview page; `{preview}` is the line's preview id, `{param}` the id
    /// parameter name and `{id}` the discovered identifier.
    #[serde(default = "default_preview_url_template")]
    pub preview_url_template: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            selection_url_template: default_selection_url_template(),
            preview_url_template: default_preview_url_template(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://www.onepagerules.com/resources".to_string()
}

fn default_selection_url_template() -> String {
    "https://army-forge.onepagerules.com/armyBookSelection?gameSystem={system}".to_string()
}

fn default_preview_url_template() -> String {
    "https://army-forge.onepagerules.com/armyBookPreview?gameSystem={preview}&{param}={id}"
        .to_string()
}

impl SiteConfig {
    /// Selection page URL: the line's fixed URL, else the numbered template.
    pub fn selection_url(&self, line: &ProductLine) -> AcquireResult<String> {
        if let Some(ref url) = line.selection_url {
            return Ok(url.clone());
        }
        let system = line.system_id.ok_or_else(|| {
            AcquireError::Config(format!(
                "product line '{}' needs either system_id or selection_url",
                line.name
            ))
        })?;
        let system = system.to_string();
        fill_template(&self.selection_url_template, &[("system", system.as_str())])
    }

    /// Preview URL for one discovered item.
    pub fn preview_url(&self, line: &ProductLine, entry: &SelectionEntry) -> AcquireResult<String> {
        let template = line
            .preview_url
            .as_deref()
            .unwrap_or(&self.preview_url_template);
        let preview = urlencoding::encode(&line.preview_id);
        let id = urlencoding::encode(&entry.identifier);
        fill_template(
            template,
            &[
                ("preview", preview.as_ref()),
                ("param", line.id_scheme().id_param()),
                ("id", id.as_ref()),
            ],
        )
    }
}

/// Substitute `{key}` placeholders. Leftover placeholders are an error.
fn fill_template(template: &str, values: &[(&str, &str)]) -> AcquireResult<String> {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    if let Some(start) = out.find('{') {
        if out[start..].contains('}') {
            return Err(AcquireError::Config(format!(
                "unfilled placeholder in URL template: {}",
                template
            )));
        }
    }
    Ok(out)
}

/// CSS selectors for the catalog and selection pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// One resource in the catalog listing.
    pub catalog_item: String,
    /// Document name inside a catalog item.
    pub catalog_name: String,
    /// Download link inside a catalog item.
    pub catalog_link: String,
    /// Product line tag inside a catalog item.
    pub catalog_tag: String,
    /// Control that advances the catalog listing.
    pub next_page: String,
    /// Top-level entry on a selection page.
    pub tile: String,
    /// Sub-variant menu that may open after clicking a tile.
    pub menu: String,
    /// Links inside the sub-variant menu.
    pub menu_link: String,
    /// Accept button of the cookie-consent banner.
    pub cookie_accept: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            catalog_item: ".resource-list .resource-item".to_string(),
            catalog_name: ".resource-title".to_string(),
            catalog_link: "a.resource-download".to_string(),
            catalog_tag: ".resource-tags .tag".to_string(),
            next_page: ".pagination .next".to_string(),
            tile: ".army-book-list .MuiCard-root".to_string(),
            menu: "[role='menu']".to_string(),
            menu_link: "[role='menu'] a[href]".to_string(),
            cookie_accept: "#onetrust-accept-btn-handler".to_string(),
        }
    }
}

/// Bounded waits and settle delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Catalog navigation and next-page content change.
    pub catalog_page_ms: u64,
    /// Wait for a sub-variant menu after clicking a tile.
    pub menu_wait_ms: u64,
    /// Navigation after clicking a tile that has no menu.
    pub tile_navigation_ms: u64,
    /// Preview page load before rendering.
    pub preview_navigation_ms: u64,
    /// Selection page load and tile list appearance.
    pub selection_page_ms: u64,
    /// Wait for the cookie-consent banner.
    pub cookie_banner_ms: u64,
    /// Pause after each catalog page transition.
    pub page_settle_ms: u64,
    /// Pause after dismissing a sub-variant menu.
    pub menu_settle_ms: u64,
    /// Pause between preview load and rendering.
    pub render_settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            catalog_page_ms: 30_000,
            menu_wait_ms: 2_000,
            tile_navigation_ms: 10_000,
            preview_navigation_ms: 60_000,
            selection_page_ms: 30_000,
            cookie_banner_ms: 2_000,
            page_settle_ms: 1_000,
            menu_settle_ms: 500,
            render_settle_ms: 2_000,
        }
    }
}

impl Timeouts {
    pub fn catalog_page(&self) -> Duration {
        Duration::from_millis(self.catalog_page_ms)
    }

    pub fn menu_wait(&self) -> Duration {
        Duration::from_millis(self.menu_wait_ms)
    }

    pub fn tile_navigation(&self) -> Duration {
        Duration::from_millis(self.tile_navigation_ms)
    }

    pub fn preview_navigation(&self) -> Duration {
        Duration::from_millis(self.preview_navigation_ms)
    }

    pub fn selection_page(&self) -> Duration {
        Duration::from_millis(self.selection_page_ms)
    }

    pub fn cookie_banner(&self) -> Duration {
        Duration::from_millis(self.cookie_banner_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }
}

/// Direct download client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Download user agent.
    /// - None: the crate's own agent
    /// - "browser": the agent the rendering browser presents
    /// - Any other string: used as is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            user_agent: None,
        }
    }
}

fn default_http_timeout() -> u64 {
    120
}
