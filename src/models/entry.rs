//! Items discovered during a run.
//!
//! Neither type is persisted: they are produced by the catalog walker and the
//! selection discoverer and consumed within the same run.

use std::collections::BTreeSet;

use serde_json::Value;
use url::Url;

use super::IdScheme;

/// A directly downloadable document from the public catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub document_name: String,
    pub download_url: String,
    /// Product line names the item is tagged for. Each yields its own output target.
    pub tagged_lines: BTreeSet<String>,
}

impl CatalogEntry {
    /// Parse one row extracted from the catalog page.
    ///
    /// Rows look like `{"name": "...", "href": "...", "tags": ["..."]}`. Rows
    /// missing a name or a download link are decorative and yield `None`.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let document_name = non_empty(raw.get("name")?.as_str()?)?;
        let download_url = non_empty(raw.get("href")?.as_str()?)?;

        let tagged_lines = raw
            .get("tags")
            .and_then(|t| t.as_array())
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str())
                    .filter_map(non_empty)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            document_name,
            download_url,
            tagged_lines,
        })
    }
}

/// A concrete purchasable item resolved from a selection page tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub display_name: String,
    /// Opaque identifier taken from a menu link or the post-navigation URL.
    pub identifier: String,
}

impl SelectionEntry {
    pub fn new(display_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            identifier: identifier.into(),
        }
    }

    /// Build an entry from a sub-variant menu link.
    ///
    /// Relative links are resolved against `base`. Links without the scheme's
    /// id parameter are discarded. The link text is the display name, falling
    /// back to the name parameter and then the identifier itself.
    pub fn from_menu_link(text: &str, href: &str, base: &Url, scheme: IdScheme) -> Option<Self> {
        let url = Url::parse(href).or_else(|_| base.join(href)).ok()?;
        let identifier = query_value(&url, scheme.id_param())?;

        let display_name = non_empty(text)
            .or_else(|| query_value(&url, scheme.name_param()))
            .unwrap_or_else(|| identifier.clone());

        Some(Self::new(display_name, identifier))
    }

    /// Build an entry from the URL a tile click navigated to.
    ///
    /// The scheme's own parameter names are checked first, then the other
    /// scheme's. Both an identifier and a name are required.
    pub fn from_preview_url(url: &str, scheme: IdScheme) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        let other = scheme.other();

        let identifier = query_value(&url, scheme.id_param())
            .or_else(|| query_value(&url, other.id_param()))?;
        let display_name = query_value(&url, scheme.name_param())
            .or_else(|| query_value(&url, other.name_param()))?;

        Some(Self::new(display_name, identifier))
    }
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| non_empty(&v))
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
