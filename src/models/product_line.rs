//! Product line configuration.

use serde::{Deserialize, Serialize};

/// Query parameter naming used by a product line's preview URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScheme {
    /// `armyId` / `armyName`, used by every line with a numeric system id.
    Army,
    /// `fleetId` / `fleetName`, used by the fleet product.
    Fleet,
}

impl IdScheme {
    pub fn id_param(&self) -> &'static str {
        match self {
            Self::Army => "armyId",
            Self::Fleet => "fleetId",
        }
    }

    pub fn name_param(&self) -> &'static str {
        match self {
            Self::Army => "armyName",
            Self::Fleet => "fleetName",
        }
    }

    /// The other scheme, checked second when reading a URL.
    pub fn other(&self) -> Self {
        match self {
            Self::Army => Self::Fleet,
            Self::Fleet => Self::Army,
        }
    }
}

/// One supported game system with its own selection page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    /// Display name; also the basis of the output directory name.
    pub name: String,
    /// Numeric game system id used in the selection URL query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<u32>,
    /// Use `fleetId` instead of `armyId` when reading identifiers.
    #[serde(default)]
    pub alternate_id_param: bool,
    /// Value substituted for `{preview}` when building preview URLs.
    pub preview_id: String,
    /// Fixed selection URL for lines without a numeric system id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_url: Option<String>,
    /// Per-line preview URL template, overriding the site-wide one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl ProductLine {
    /// A line addressed by numeric system id.
    pub fn numbered(name: &str, system_id: u32, preview_id: &str) -> Self {
        Self {
            name: name.to_string(),
            system_id: Some(system_id),
            alternate_id_param: false,
            preview_id: preview_id.to_string(),
            selection_url: None,
            preview_url: None,
        }
    }

    /// A line with a fixed selection page and the alternate id parameter.
    pub fn fixed(name: &str, selection_url: &str, preview_id: &str) -> Self {
        Self {
            name: name.to_string(),
            system_id: None,
            alternate_id_param: true,
            preview_id: preview_id.to_string(),
            selection_url: Some(selection_url.to_string()),
            preview_url: None,
        }
    }

    pub fn id_scheme(&self) -> IdScheme {
        if self.alternate_id_param {
            IdScheme::Fleet
        } else {
            IdScheme::Army
        }
    }

    /// Case-insensitive name match, used for `--line` filters.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}
