//! The patch run: Load -> apply each rule in memory -> Persist.
//!
//! Every rule runs against the text produced by the previous one. The target
//! is written once, and only after every rule matched its expected number of
//! times, so a failing run never leaves a half-patched file behind.

use crate::config::{load_embedded, ConfigError, PatchConfig};
use crate::edit::{self, EditError};
use crate::rule::ReplacementRule;
use crate::safety::{SafetyError, WorkspaceGuard};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error(
        "rule '{rule}' not replaced: pattern matched {count} times in {file} (expected {expected})"
    )]
    PatternNotUniquelyMatched {
        rule: String,
        file: PathBuf,
        count: usize,
        expected: usize,
    },

    #[error("rule '{rule}': target block not found in {file} ({count} of {expected} occurrences)")]
    ExactBlockNotFound {
        rule: String,
        file: PathBuf,
        count: usize,
        expected: usize,
    },

    #[error("rule '{rule}': target block found {count} times in {file} (expected {expected})")]
    AmbiguousBlock {
        rule: String,
        file: PathBuf,
        count: usize,
        expected: usize,
    },

    #[error("rule '{rule}' has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        source: regex::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("edit error: {0}")]
    Edit(#[from] EditError),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

impl PatchError {
    /// True when the target file's content no longer has the shape the rules
    /// were written against.
    pub fn is_content_mismatch(&self) -> bool {
        matches!(
            self,
            PatchError::PatternNotUniquelyMatched { .. }
                | PatchError::ExactBlockNotFound { .. }
                | PatchError::AmbiguousBlock { .. }
        )
    }
}

/// What a run did (or, for a dry run, would do).
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be reported"]
pub struct PatchOutcome {
    pub file: PathBuf,
    pub original: String,
    pub patched: String,
    pub rules_applied: Vec<String>,
    pub written: bool,
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.written { "Patched" } else { "Would patch" };
        write!(
            f,
            "{} {} ({} rules, {} -> {} bytes)",
            verb,
            self.file.display(),
            self.rules_applied.len(),
            self.original.len(),
            self.patched.len()
        )
    }
}

#[derive(Debug)]
pub struct Patcher {
    guard: WorkspaceGuard,
    target: PathBuf,
    rules: Vec<ReplacementRule>,
}

impl Patcher {
    /// Patcher for the rules shipped with the binary.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PatchError> {
        let config = load_embedded()?;
        Self::with_config(root, &config)
    }

    pub fn with_config(root: impl AsRef<Path>, config: &PatchConfig) -> Result<Self, PatchError> {
        config
            .validate()
            .map_err(|source| ConfigError::Validation { path: None, source })?;

        let guard = WorkspaceGuard::new(root)?;
        let rules = config
            .patches
            .iter()
            .map(ReplacementRule::from_definition)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            guard,
            target: PathBuf::from(&config.meta.target),
            rules,
        })
    }

    /// Target path relative to the project root.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Canonical project root the target is resolved against.
    pub fn root(&self) -> &Path {
        self.guard.workspace_root()
    }

    /// Run every rule over `text` in order, without touching the disk.
    pub fn plan(&self, text: &str) -> Result<String, PatchError> {
        self.rules
            .iter()
            .try_fold(text.to_string(), |current, rule| {
                rule.apply(&self.target, &current)
            })
    }

    /// Load, transform and write the target.
    pub fn run(&self) -> Result<PatchOutcome, PatchError> {
        let mut outcome = self.run_dry()?;

        // The file may have been swapped for a symlink since it was loaded
        let file = self.guard.revalidate(&outcome.file)?;
        edit::persist(&file, &outcome.patched)?;

        outcome.written = true;
        Ok(outcome)
    }

    /// Load and transform the target; nothing is written.
    pub fn run_dry(&self) -> Result<PatchOutcome, PatchError> {
        let file = self.guard.validate_path(&self.target)?;
        let original = fs::read_to_string(&file).map_err(|source| PatchError::Io {
            path: file.clone(),
            source,
        })?;

        let patched = self.plan(&original)?;

        Ok(PatchOutcome {
            file,
            original,
            patched,
            rules_applied: self.rules.iter().map(|rule| rule.id.clone()).collect(),
            written: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD_MARKUP: &str = concat!(
        "                      <h3 className=\"font-semibold text-gray-800 mb-2\">\r\n",
        "                        {novidade.titulo}\r\n",
        "                      </h3>\r\n",
        "                      <p className=\"text-gray-600 text-sm leading-relaxed\">\r\n",
        "                        {novidade.descricao}\r\n",
        "                      </p>",
    );

    fn fixture() -> String {
        format!(
            "const novidades = [\r\n  {{a:1}},\r\n  {{b:2}}\r\n];\r\n\r\n{OLD_MARKUP}\r\n"
        )
    }

    fn patcher_in(dir: &Path) -> Patcher {
        Patcher::new(dir).unwrap()
    }

    #[test]
    fn test_plan_rewrites_list_and_markup() {
        let dir = tempfile::tempdir().unwrap();
        let patched = patcher_in(dir.path()).plan(&fixture()).unwrap();

        assert!(patched.starts_with("const novidades = [\n    {\n      data: \"16/10\","));
        assert!(patched.contains("link: \"https://europa4.vercel.app/\""));
        assert!(!patched.contains("{a:1}"));
        assert!(patched.contains("{novidade.link ? (\r\n"));
        assert!(patched.contains("leading-relaxed whitespace-pre-line\">\r\n"));
        assert!(!patched.contains(OLD_MARKUP));
    }

    #[test]
    fn test_plan_fails_on_missing_list() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!("const outras = [];\r\n{OLD_MARKUP}\r\n");

        let err = patcher_in(dir.path()).plan(&text).unwrap_err();
        assert!(matches!(err, PatchError::PatternNotUniquelyMatched { .. }));
        assert!(err.is_content_mismatch());
    }

    #[test]
    fn test_plan_fails_on_lf_markup() {
        let dir = tempfile::tempdir().unwrap();
        let text = fixture().replace("\r\n", "\n");

        let err = patcher_in(dir.path()).plan(&text).unwrap_err();
        assert!(matches!(err, PatchError::ExactBlockNotFound { .. }));
    }

    #[test]
    fn test_run_dry_reports_missing_target() {
        let dir = tempfile::tempdir().unwrap();

        let err = patcher_in(dir.path()).run_dry().unwrap_err();
        assert!(matches!(err, PatchError::Safety(SafetyError::Canonicalize { .. })));
        assert!(!err.is_content_mismatch());
    }

    #[test]
    fn test_bad_rule_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let toml = r#"
[meta]
target = "a.tsx"

[[patches]]
id = "broken"

[patches.query]
type = "regex"
pattern = "const x = [("

[patches.operation]
type = "replace"
text = "const x = [];"
"#;
        let config = crate::config::load_from_str(toml).unwrap();

        let err = Patcher::with_config(dir.path(), &config).unwrap_err();
        assert!(matches!(err, PatchError::InvalidPattern { ref rule, .. } if rule == "broken"));
    }

    #[test]
    fn test_root_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let patcher = patcher_in(dir.path());

        assert_eq!(patcher.root(), dir.path().canonicalize().unwrap());
        assert_eq!(
            patcher.target(),
            Path::new("src/components/NovidadesModal.tsx")
        );
    }

    #[test]
    fn test_outcome_display() {
        let outcome = PatchOutcome {
            file: PathBuf::from("src/components/NovidadesModal.tsx"),
            original: "ab".to_string(),
            patched: "abcd".to_string(),
            rules_applied: vec!["one".to_string(), "two".to_string()],
            written: false,
        };
        assert_eq!(
            outcome.to_string(),
            "Would patch src/components/NovidadesModal.tsx (2 rules, 2 -> 4 bytes)"
        );
    }
}
