//! Podfile patcher - replaces the `post_install` section of one file
//!
//! This module ties the pieces together:
//! - Reads the Podfile in full before any write
//! - Locates the first `post_install do |installer|` ... `end` section
//! - Plans a verified [`Edit`] swapping it for the replacement block
//! - Applies it atomically, or previews/checks it without writing

use crate::edit::{Edit, EditError, EditResult};
use crate::section::SectionLocator;
use crate::template::replacement_block;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Podfile location used when no other path is configured.
pub const DEFAULT_PODFILE_PATH: &str = "ios/Podfile";

/// Result of patching (or checking) one Podfile
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchResult should be checked for applied/already-applied"]
pub enum PatchResult {
    /// The section was replaced (or, for a check, would be)
    Applied { file: PathBuf },
    /// The section already equals the replacement block
    AlreadyApplied { file: PathBuf },
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no post_install section found in {}", .file.display())]
    SectionNotFound { file: PathBuf },

    #[error("edit error: {0}")]
    Edit(#[from] EditError),

    #[error("invalid section pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// File content before and after patching, for dry runs and diffs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub before: String,
    pub after: String,
}

impl Preview {
    pub fn is_unchanged(&self) -> bool {
        self.before == self.after
    }
}

#[derive(Debug, Clone)]
pub struct Patcher {
    path: PathBuf,
    locator: SectionLocator,
}

impl Patcher {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, PatchError> {
        Ok(Self {
            path: path.into(),
            locator: SectionLocator::post_install()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Plan the replacement against `content` without touching the disk.
    pub fn plan(&self, content: &str) -> Result<Edit, PatchError> {
        let section = self
            .locator
            .locate(content)
            .ok_or_else(|| PatchError::SectionNotFound {
                file: self.path.clone(),
            })?;

        Ok(Edit::new(
            &self.path,
            section.byte_start,
            section.byte_end,
            replacement_block(),
            section.text,
        ))
    }

    /// Replace the section on disk.
    ///
    /// A missing section is an error and leaves the file untouched.
    pub fn apply(&self) -> Result<PatchResult, PatchError> {
        let content = self.read()?;
        let edit = self.plan(&content)?;

        match edit.apply()? {
            EditResult::Applied { file, .. } => Ok(PatchResult::Applied { file }),
            EditResult::AlreadyApplied { file } => Ok(PatchResult::AlreadyApplied { file }),
        }
    }

    /// Report whether applying would change the file. Read-only.
    pub fn check(&self) -> Result<PatchResult, PatchError> {
        let content = self.read()?;
        let edit = self.plan(&content)?;

        if edit.is_applied(content.as_bytes())? {
            Ok(PatchResult::AlreadyApplied {
                file: self.path.clone(),
            })
        } else {
            Ok(PatchResult::Applied {
                file: self.path.clone(),
            })
        }
    }

    /// Patched form of `content`: the planned edit rendered in memory,
    /// exactly as [`Patcher::apply`] would write it.
    pub fn rewrite(&self, content: &str) -> Result<String, PatchError> {
        let rendered = self.plan(content)?.render(content.as_bytes())?;
        Ok(String::from_utf8(rendered).map_err(|_| EditError::InvalidUtf8Edit)?)
    }

    /// Compute the patched content without writing it.
    pub fn preview(&self) -> Result<Preview, PatchError> {
        let before = self.read()?;
        let after = self.rewrite(&before)?;

        Ok(Preview { before, after })
    }

    fn read(&self) -> Result<String, PatchError> {
        fs::read_to_string(&self.path).map_err(|source| PatchError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
