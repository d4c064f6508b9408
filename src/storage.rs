//! Output layout on disk.
//!
//! The filesystem is the only dedup ledger: a target that already exists is
//! treated as fetched and skipped. Layout:
//!
//! `{root}/{line} - {date}/{document}.pdf` for catalog resources and
//! `{root}/{line} - {date}/{item} - {date}.pdf` for product line items.

use std::path::{Path, PathBuf};

use crate::error::{AcquireError, AcquireResult};
use crate::models::RunDate;

/// Extension of every stored document.
pub const DOCUMENT_EXTENSION: &str = "pdf";

const FORBIDDEN_CHARS: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Map a display name to a token that is safe as a single path segment.
///
/// Forbidden characters become `-`, then surrounding whitespace is trimmed.
/// Total and idempotent.
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '-' } else { c })
        .collect();
    replaced.trim().to_string()
}

/// Where one document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub file_name: String,
    pub full_path: PathBuf,
}

impl OutputTarget {
    /// Whether the document was already fetched (this or an earlier run today).
    pub fn exists(&self) -> bool {
        self.full_path.exists()
    }
}

/// Resolves output directories and files for one run.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    run_date: RunDate,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, run_date: RunDate) -> Self {
        Self {
            root: root.into(),
            run_date,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory path for a product line, without touching the filesystem.
    pub fn directory_path(&self, line_name: &str) -> PathBuf {
        self.root
            .join(format!("{} - {}", sanitize_name(line_name), self.run_date))
    }

    /// Directory for a product line, created with parents if absent.
    pub async fn resolve_directory(&self, line_name: &str) -> AcquireResult<PathBuf> {
        let dir = self.directory_path(line_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AcquireError::filesystem(&dir, e))?;
        Ok(dir)
    }

    /// Target for an item inside `directory`.
    ///
    /// With `dated` the run date is appended to the file stem, the convention
    /// for product line items.
    pub fn resolve_file(&self, directory: &Path, item_name: &str, dated: bool) -> OutputTarget {
        let stem = sanitize_name(item_name);
        let file_name = if dated {
            format!("{} - {}.{}", stem, self.run_date, DOCUMENT_EXTENSION)
        } else {
            format!("{}.{}", stem, DOCUMENT_EXTENSION)
        };
        OutputTarget {
            directory: directory.to_path_buf(),
            full_path: directory.join(&file_name),
            file_name,
        }
    }

    /// Create the line directory and resolve a catalog resource inside it.
    pub async fn catalog_target(
        &self,
        line_name: &str,
        document_name: &str,
    ) -> AcquireResult<OutputTarget> {
        let dir = self.resolve_directory(line_name).await?;
        Ok(self.resolve_file(&dir, document_name, false))
    }

    /// Create the line directory and resolve a product line item inside it.
    pub async fn item_target(&self, line_name: &str, item_name: &str) -> AcquireResult<OutputTarget> {
        let dir = self.resolve_directory(line_name).await?;
        Ok(self.resolve_file(&dir, item_name, true))
    }
}
