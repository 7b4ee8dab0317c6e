use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Byte-span replacement in a single file, checked against the text it
/// expects to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until apply() is called"]
pub struct Edit {
    /// Path to the file to edit
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// What we expect to find at the span before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for the text being replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (for large spans)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using a hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Before-text verification failed at {file}:{byte_start}")]
    BeforeTextMismatch {
        file: PathBuf,
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in file of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid edit would create malformed UTF-8")]
    InvalidUtf8Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    /// Edit was written to disk
    Applied { file: PathBuf },
    /// Span already holds new_text; nothing was written
    AlreadyApplied { file: PathBuf },
}

impl Edit {
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl Into<String>,
    ) -> Self {
        let expected = expected_before.into();
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(&expected),
        }
    }

    /// Validate the edit against `content` and return the text currently
    /// at [byte_start, byte_end).
    fn validate<'a>(&self, content: &'a [u8]) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                file_len: content.len(),
            });
        }

        let current_text = std::str::from_utf8(&content[self.byte_start..self.byte_end])?;

        if current_text == self.new_text {
            return Ok(current_text);
        }

        if !self.expected_before.matches(current_text) {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current_text.to_string(),
            });
        }

        Ok(current_text)
    }

    /// True when `content` already holds new_text at the span.
    pub fn is_applied(&self, content: &[u8]) -> Result<bool, EditError> {
        Ok(self.validate(content)? == self.new_text)
    }

    /// Splice new_text into `original` without touching the disk.
    pub fn render(&self, original: &[u8]) -> Result<Vec<u8>, EditError> {
        self.validate(original)?;

        let mut new_content = Vec::with_capacity(
            original.len() + self.new_text.len() - (self.byte_end - self.byte_start),
        );
        new_content.extend_from_slice(&original[..self.byte_start]);
        new_content.extend_from_slice(self.new_text.as_bytes());
        new_content.extend_from_slice(&original[self.byte_end..]);

        std::str::from_utf8(&new_content).map_err(|_| EditError::InvalidUtf8Edit)?;

        Ok(new_content)
    }

    /// Apply this edit to the file system atomically.
    ///
    /// The file is re-read, so an edit planned from stale content fails
    /// verification instead of clobbering newer changes.
    pub fn apply(&self) -> Result<EditResult, EditError> {
        let original_content = fs::read(&self.file)?;

        if self.is_applied(&original_content)? {
            return Ok(EditResult::AlreadyApplied {
                file: self.file.clone(),
            });
        }

        let new_content = self.render(&original_content)?;
        atomic_write(&self.file, &new_content)?;

        Ok(EditResult::Applied {
            file: self.file.clone(),
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Symlinks are resolved first so the link survives and its target is the
/// file rewritten. A target that cannot be opened for writing is an error,
/// even when its directory would allow the rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let target = fs::canonicalize(path)?;
    drop(OpenOptions::new().write(true).open(&target)?);

    let parent = target.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // NamedTempFile creates files as 0600.
    let permissions = fs::metadata(&target)?.permissions();
    temp.as_file().set_permissions(permissions)?;

    temp.persist(&target).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_verification_exact_match() {
        let verify = EditVerification::ExactMatch("post_install".to_string());
        assert!(verify.matches("post_install"));
        assert!(!verify.matches("pre_install"));
    }

    #[test]
    fn test_edit_verification_from_text_large() {
        let text = "x".repeat(2000);
        let verify = EditVerification::from_text(&text);
        assert!(matches!(verify, EditVerification::Hash(_)));
        assert!(verify.matches(&text));
        assert!(!verify.matches("x"));
    }

    #[test]
    fn test_edit_validation_invalid_range() {
        let edit = Edit::new("Podfile", 5, 20, "replacement", "");
        let result = edit.render(b"hello world");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));
    }

    #[test]
    fn test_edit_validation_inverted_range() {
        let edit = Edit::new("Podfile", 10, 5, "replacement", "");
        let result = edit.render(b"hello world");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));
    }

    #[test]
    fn test_render_rejects_unexpected_text() {
        let edit = Edit::new("Podfile", 0, 5, "HELLO", "howdy");
        let result = edit.render(b"hello world");
        assert!(matches!(result, Err(EditError::BeforeTextMismatch { .. })));
    }

    #[test]
    fn test_render_splices() {
        let edit = Edit::new("Podfile", 6, 11, "there", "world");
        let rendered = edit.render(b"hello world!").unwrap();
        assert_eq!(rendered, b"hello there!");
    }

    #[test]
    fn test_is_applied() {
        let edit = Edit::new("Podfile", 0, 5, "hello", "howdy");
        assert!(edit.is_applied(b"hello world").unwrap());
    }

    #[test]
    fn test_atomic_write_integration() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Podfile");
        fs::write(&file_path, b"original content").unwrap();

        let edit = Edit::new(&file_path, 0, 8, "modified", "original");
        let result = edit.apply().unwrap();

        assert!(matches!(result, EditResult::Applied { .. }));
        let new_content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(new_content, "modified content");
    }

    #[test]
    fn test_edit_idempotency_application() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Podfile");
        fs::write(&file_path, b"hello world").unwrap();

        let edit = Edit::new(&file_path, 0, 5, "hello", "howdy");
        let result = edit.apply().unwrap();

        assert!(matches!(result, EditResult::AlreadyApplied { .. }));
        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    #[cfg(unix)]
    fn test_apply_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Podfile");
        fs::write(&file_path, b"original content").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o644)).unwrap();

        let edit = Edit::new(&file_path, 0, 8, "modified", "original");
        let _ = edit.apply().unwrap();

        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    /// Root can open any file for writing; permission checks are moot there.
    fn write_access_denied(path: &Path) -> bool {
        OpenOptions::new().write(true).open(path).is_err()
    }

    #[test]
    fn test_apply_read_only_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Podfile");
        fs::write(&file_path, b"original content").unwrap();
        let mut permissions = fs::metadata(&file_path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&file_path, permissions).unwrap();

        if !write_access_denied(&file_path) {
            return;
        }

        let edit = Edit::new(&file_path, 0, 8, "modified", "original");
        let result = edit.apply();

        assert!(matches!(result, Err(EditError::Io(ref e)) if e.kind() == std::io::ErrorKind::PermissionDenied));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "original content");
    }

    #[test]
    #[cfg(unix)]
    fn test_apply_through_symlink() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let real = temp_dir.path().join("Podfile.real");
        let link = temp_dir.path().join("Podfile");
        fs::write(&real, b"original content").unwrap();
        symlink(&real, &link).unwrap();

        let edit = Edit::new(&link, 0, 8, "modified", "original");
        let result = edit.apply().unwrap();

        assert!(matches!(result, EditResult::Applied { .. }));
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "modified content");
    }

    #[test]
    fn test_apply_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let edit = Edit::new(temp_dir.path().join("Podfile"), 0, 0, "x", "");
        assert!(matches!(edit.apply(), Err(EditError::Io(_))));
    }
}
