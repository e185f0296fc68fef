//! Managed attachment directory
//!
//! A user-selected receipt is copied into the attachment directory and the
//! record stores the copy's path. The record owns that copy.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InvoiceError, InvoiceResult};

/// File extensions accepted as receipts
const ALLOWED_EXTENSIONS: [&str; 1] = ["pdf"];

/// Owner of the managed attachment directory
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `source` into the managed directory under a name derived from
    /// `naming_key`, returning the managed path
    ///
    /// If the derived name is taken a numeric suffix is added, so an
    /// existing attachment is never overwritten.
    pub fn store_attachment(&self, source: &Path, naming_key: &str) -> InvoiceResult<PathBuf> {
        if !source.is_file() {
            return Err(InvoiceError::Attachment(format!(
                "File does not exist: {}",
                source.display()
            )));
        }

        let extension = source
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| {
                InvoiceError::Attachment(format!("File has no extension: {}", source.display()))
            })?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(InvoiceError::Attachment(format!(
                "Unsupported attachment type '.{}' (PDF only)",
                extension
            )));
        }

        fs::create_dir_all(&self.dir).map_err(|e| {
            InvoiceError::Attachment(format!("Failed to create attachment directory: {}", e))
        })?;

        let dest = self.free_path(&sanitize_file_stem(naming_key), &extension);
        fs::copy(source, &dest).map_err(|e| {
            InvoiceError::Attachment(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                dest.display(),
                e
            ))
        })?;

        log::debug!("Stored attachment {}", dest.display());
        Ok(dest)
    }

    /// Best-effort delete of a managed attachment; returns whether a file was removed
    ///
    /// Paths outside the managed directory are never touched.
    pub fn remove_attachment(&self, path: &Path) -> bool {
        if !self.is_managed(path) {
            log::warn!(
                "Refusing to remove {} outside the attachment directory",
                path.display()
            );
            return false;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("Removed attachment {}", path.display());
                true
            }
            Err(e) => {
                log::debug!("Could not remove attachment {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Whether `path` is a file directly inside the managed directory
    pub fn is_managed(&self, path: &Path) -> bool {
        let (Some(parent), Ok(dir)) = (path.parent(), fs::canonicalize(&self.dir)) else {
            return false;
        };
        fs::canonicalize(parent).map_or(false, |p| p == dir)
    }

    fn free_path(&self, stem: &str, extension: &str) -> PathBuf {
        let candidate = self.dir.join(format!("{}.{}", stem, extension));
        if !candidate.exists() {
            return candidate;
        }

        (1..)
            .map(|n| self.dir.join(format!("{}_{}.{}", stem, n, extension)))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

/// Make a naming key safe to use as a file name
fn sanitize_file_stem(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}
