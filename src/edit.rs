use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Both replacement rules compile down to this. Intelligence lives in span
/// acquisition (regex or exact search), not application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until apply_to() is called"]
pub struct Edit {
    /// File the span was located in (used for error reporting)
    pub file: PathBuf,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
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

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in text of length {text_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        text_len: usize,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Edit span does not fall on UTF-8 character boundaries")]
    InvalidUtf8Edit,
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        file: impl Into<PathBuf>,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl AsRef<str>,
    ) -> Self {
        Self {
            file: file.into(),
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before.as_ref()),
        }
    }

    /// Validate the edit against the current text.
    ///
    /// Returns the current text at [byte_start, byte_end) if validation succeeds.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                text_len: content.len(),
            });
        }

        let current = content
            .get(self.byte_start..self.byte_end)
            .ok_or(EditError::InvalidUtf8Edit)?;

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                file: self.file.clone(),
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// Apply this edit to an in-memory copy of the file contents.
    ///
    /// Nothing touches the disk; persisting is a separate step.
    pub fn apply_to(&self, content: &str) -> Result<String, EditError> {
        let current = self.validate(content)?;

        let mut patched =
            String::with_capacity(content.len() + self.new_text.len() - current.len());
        patched.push_str(&content[..self.byte_start]);
        patched.push_str(&self.new_text);
        patched.push_str(&content[self.byte_end..]);

        Ok(patched)
    }
}

/// Write the patched text over `path` atomically and bump its mtime so file
/// watchers (vite, tsc --watch) notice the change.
pub fn persist(path: &Path, content: &str) -> Result<(), EditError> {
    atomic_write(path, content.as_bytes())?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now)?;

    Ok(())
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or nothing changes.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Tempfile must live on the same filesystem for rename to be atomic
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;

    // NamedTempFile is created 0600; keep the target's mode across the rename
    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
