use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.meta.target.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                patch_id: None,
                field: "meta.target",
            });
        }

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        let mut seen = HashSet::new();
        for patch in &self.patches {
            if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
            } else if !seen.insert(patch.id.as_str()) {
                issues.push(ValidationIssue::InvalidCombo {
                    patch_id: Some(patch.id.clone()),
                    message: "duplicate patch id".to_string(),
                });
            }

            if patch.expected_matches == 0 {
                issues.push(ValidationIssue::InvalidCombo {
                    patch_id: Some(patch.id.clone()),
                    message: "expected_matches must be at least 1".to_string(),
                });
            }

            match &patch.query {
                Query::Regex { pattern } => {
                    if pattern.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: Some(patch.id.clone()),
                            field: "query.pattern",
                        });
                    }
                }
                Query::Text { search } => {
                    if search.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: Some(patch.id.clone()),
                            field: "query.search",
                        });
                    }
                }
            }

            match &patch.operation {
                Operation::Replace { text } => {
                    if text.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: Some(patch.id.clone()),
                            field: "operation.text",
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// File to patch, relative to the project root
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    pub query: Query,
    pub operation: Operation,
    #[serde(default)]
    pub line_endings: LineEndings,
    #[serde(default = "default_expected_matches")]
    pub expected_matches: usize,
}

fn default_expected_matches() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Query {
    /// Regular expression search; the whole match is the span
    Regex { pattern: String },
    /// Exact, whitespace-sensitive substring search
    Text { search: String },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    Replace { text: String },
}

/// Line-ending convention the rule's literals are converted to before use.
///
/// Literals are authored with `\n`; a target checked in with CRLF needs
/// `crlf` or the exact search will never match.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LineEndings {
    #[default]
    Preserve,
    Lf,
    Crlf,
}

impl LineEndings {
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            LineEndings::Preserve => Cow::Borrowed(text),
            LineEndings::Lf if !text.contains("\r\n") => Cow::Borrowed(text),
            LineEndings::Lf => Cow::Owned(text.replace("\r\n", "\n")),
            LineEndings::Crlf => Cow::Owned(text.replace("\r\n", "\n").replace('\n', "\r\n")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        patch_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch config contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { patch_id, message } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
        }
    }
}
