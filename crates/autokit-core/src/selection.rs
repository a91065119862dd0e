//! File Set Resolver
//!
//! Turns a directory listing plus selection inputs into the ordered set of
//! files a batch will operate on.
//!
//! 1. No explicit selector: every candidate is in the baseline.
//! 2. Explicit selector: each entry is matched against the candidates; the
//!    baseline is the union of the matches. An entry matching nothing is
//!    recorded as a miss.
//! 3. Any candidate matching a suppression pattern is removed from the
//!    baseline, with or without an explicit selector.
//!
//! The result keeps the order of the candidate listing.

use std::collections::HashSet;

use globset::{GlobBuilder, GlobMatcher as CompiledGlob};

/// Strategy for matching a file name against one selector pattern.
pub trait NameMatcher {
    type Pattern;

    fn compile(&self, pattern: &str) -> Self::Pattern;

    fn matches(&self, pattern: &Self::Pattern, name: &str) -> bool;
}

/// Shell-glob matching (`*`, `?`, `[...]`, `[!...]`), case-sensitive.
///
/// A pattern that fails to compile is matched literally.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobMatcher;

#[derive(Debug, Clone)]
pub enum GlobPattern {
    Glob(CompiledGlob),
    Literal(String),
}

impl NameMatcher for GlobMatcher {
    type Pattern = GlobPattern;

    fn compile(&self, pattern: &str) -> GlobPattern {
        match GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
        {
            Ok(glob) => GlobPattern::Glob(glob.compile_matcher()),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Invalid glob pattern, matching literally");
                GlobPattern::Literal(pattern.to_string())
            }
        }
    }

    fn matches(&self, pattern: &GlobPattern, name: &str) -> bool {
        match pattern {
            GlobPattern::Glob(glob) => glob.is_match(name),
            GlobPattern::Literal(literal) => literal == name,
        }
    }
}

/// Exact name equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralMatcher;

impl NameMatcher for LiteralMatcher {
    type Pattern = String;

    fn compile(&self, pattern: &str) -> String {
        pattern.to_string()
    }

    fn matches(&self, pattern: &String, name: &str) -> bool {
        pattern == name
    }
}

/// Explicit file selection: one name or pattern, or a list of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelector(Vec<String>);

impl FileSelector {
    /// Select every candidate.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for FileSelector {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::all()
        } else {
            Self(vec![value.to_string()])
        }
    }
}

impl From<String> for FileSelector {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<String>> for FileSelector {
    fn from(values: Vec<String>) -> Self {
        Self(values.into_iter().filter(|v| !v.is_empty()).collect())
    }
}

impl From<&[&str]> for FileSelector {
    fn from(values: &[&str]) -> Self {
        Self(
            values
                .iter()
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
                .collect(),
        )
    }
}

impl<const N: usize> From<[&str; N]> for FileSelector {
    fn from(values: [&str; N]) -> Self {
        Self::from(&values[..])
    }
}

/// The resolved file set of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Files to operate on, in listing order.
    pub files: Vec<String>,
    /// Files that were selected but removed by a suppression pattern.
    pub suppressed: Vec<String>,
    /// Explicit selector entries that matched no candidate.
    pub misses: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Default, Clone)]
pub struct FileSetResolver<M = GlobMatcher> {
    matcher: M,
}

impl FileSetResolver<GlobMatcher> {
    pub fn glob() -> Self {
        Self {
            matcher: GlobMatcher,
        }
    }
}

impl<M: NameMatcher> FileSetResolver<M> {
    pub fn new(matcher: M) -> Self {
        Self { matcher }
    }

    pub fn resolve(
        &self,
        candidates: &[String],
        explicit: &FileSelector,
        suppressions: &[String],
    ) -> Selection {
        let mut seen = HashSet::new();
        let candidates: Vec<&str> = candidates
            .iter()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect();

        let explicit: Vec<(&str, M::Pattern)> = explicit
            .patterns()
            .iter()
            .map(|p| (p.as_str(), self.matcher.compile(p)))
            .collect();
        let suppressions: Vec<M::Pattern> = suppressions
            .iter()
            .map(|p| self.matcher.compile(p))
            .collect();

        let mut selection = Selection::default();
        let mut hit = vec![false; explicit.len()];

        for name in candidates {
            let included = if explicit.is_empty() {
                true
            } else {
                let mut any = false;
                for (idx, (_, pattern)) in explicit.iter().enumerate() {
                    if self.matcher.matches(pattern, name) {
                        hit[idx] = true;
                        any = true;
                    }
                }
                any
            };
            if !included {
                continue;
            }

            if suppressions.iter().any(|p| self.matcher.matches(p, name)) {
                tracing::debug!(file = %name, "Suppressed");
                selection.suppressed.push(name.to_string());
            } else {
                selection.files.push(name.to_string());
            }
        }

        for ((pattern, _), matched) in explicit.iter().zip(hit) {
            if !matched {
                tracing::warn!(pattern = %pattern, "Selector matched no files");
                selection.misses.push(pattern.to_string());
            }
        }

        selection
    }
}
