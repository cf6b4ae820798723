//! Replacement rules: a matcher, the text that replaces each match, and how
//! many matches the target file must contain.

use crate::config::schema::{Operation, PatchDefinition, Query};
use crate::edit::Edit;
use crate::patcher::PatchError;
use regex::Regex;
use std::path::Path;

/// How a rule finds its span.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Lexical regex search over the whole text
    Pattern(Regex),
    /// Literal block, whitespace- and line-ending-sensitive
    Exact(String),
}

impl Matcher {
    fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        match self {
            Matcher::Pattern(regex) => regex
                .find_iter(text)
                .map(|m| (m.start(), m.end()))
                .collect(),
            Matcher::Exact(block) => text
                .match_indices(block.as_str())
                .map(|(start, matched)| (start, start + matched.len()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub id: String,
    pub matcher: Matcher,
    pub replacement: String,
    pub expected_matches: usize,
}

impl ReplacementRule {
    /// Compile a rule from its config definition, converting its literals to
    /// the rule's line-ending convention.
    pub fn from_definition(patch: &PatchDefinition) -> Result<Self, PatchError> {
        let endings = patch.line_endings;

        let matcher = match &patch.query {
            Query::Regex { pattern } => {
                let regex = Regex::new(pattern).map_err(|source| PatchError::InvalidPattern {
                    rule: patch.id.clone(),
                    source,
                })?;
                Matcher::Pattern(regex)
            }
            Query::Text { search } => Matcher::Exact(endings.apply(search).into_owned()),
        };

        let replacement = match &patch.operation {
            Operation::Replace { text } => endings.apply(text).into_owned(),
        };

        Ok(Self {
            id: patch.id.clone(),
            matcher,
            replacement,
            expected_matches: patch.expected_matches,
        })
    }

    /// Locate every span this rule replaces in `text`.
    ///
    /// The match count must equal `expected_matches`; edits come back sorted
    /// by `byte_start` descending so they can be applied bottom-to-top.
    pub fn locate(&self, file: &Path, text: &str) -> Result<Vec<Edit>, PatchError> {
        let spans = self.matcher.spans(text);
        let count = spans.len();

        if count != self.expected_matches {
            return Err(match self.matcher {
                Matcher::Pattern(_) => PatchError::PatternNotUniquelyMatched {
                    rule: self.id.clone(),
                    file: file.to_path_buf(),
                    count,
                    expected: self.expected_matches,
                },
                Matcher::Exact(_) if count < self.expected_matches => {
                    PatchError::ExactBlockNotFound {
                        rule: self.id.clone(),
                        file: file.to_path_buf(),
                        count,
                        expected: self.expected_matches,
                    }
                }
                Matcher::Exact(_) => PatchError::AmbiguousBlock {
                    rule: self.id.clone(),
                    file: file.to_path_buf(),
                    count,
                    expected: self.expected_matches,
                },
            });
        }

        Ok(spans
            .into_iter()
            .rev()
            .map(|(start, end)| {
                Edit::new(
                    file,
                    start,
                    end,
                    self.replacement.as_str(),
                    &text[start..end],
                )
            })
            .collect())
    }

    /// Apply this rule to `text` in memory.
    pub fn apply(&self, file: &Path, text: &str) -> Result<String, PatchError> {
        let mut patched = text.to_string();
        for edit in self.locate(file, text)? {
            patched = edit.apply_to(&patched)?;
        }
        Ok(patched)
    }
}
