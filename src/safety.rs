use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directories inside a front-end project that hold generated or vendored
/// files. The patch target never legitimately lives there.
const FORBIDDEN_DIRS: &[&str] = &["node_modules", "dist", "build", ".git"];

/// Project safety checks to prevent patching files outside the front-end root.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Absolute path to project root
    workspace_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside project root: {path} (root: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to resolve {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize()
        .map_err(|source| SafetyError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })
}

impl WorkspaceGuard {
    /// Create a new guard with the given project root.
    ///
    /// The root is canonicalized to handle symlinks correctly.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let workspace_root = canonicalize(workspace_root.as_ref())?;

        let forbidden_paths = FORBIDDEN_DIRS
            .iter()
            .filter_map(|dir| workspace_root.join(dir).canonicalize().ok())
            .collect();

        Ok(Self {
            workspace_root,
            forbidden_paths,
        })
    }

    /// Check if a path is safe to patch.
    ///
    /// Returns the canonicalized absolute path if safe.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        // Resolves symlinks and .. components
        let canonical = canonicalize(&absolute)?;
        self.check_canonical(&canonical)?;

        Ok(canonical)
    }

    /// Re-validate a previously-validated canonical path.
    ///
    /// Call immediately before the write to close the TOCTOU window.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = canonicalize(path)?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        if let Some(forbidden) = self
            .forbidden_paths
            .iter()
            .find(|forbidden| canonical.starts_with(forbidden))
        {
            return Err(SafetyError::ForbiddenPath {
                path: canonical.to_path_buf(),
                forbidden: forbidden.clone(),
            });
        }

        Ok(())
    }

    /// Get the project root.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}
