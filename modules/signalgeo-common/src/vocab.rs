//! Keyword vocabulary matching for mention and recursion heuristics.
//!
//! `Substring` finds a term anywhere in the text, so `xi` also hits inside
//! `taxi`. `WordBoundary` only accepts whole-word hits. Substring is the
//! default so learned maps stay comparable with earlier runs.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalGeoError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Substring,
    WordBoundary,
}

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    terms: Vec<Term>,
    mode: MatchMode,
}

#[derive(Debug, Clone)]
struct Term {
    key: String,
    lowered: String,
    pattern: Option<Regex>,
}

impl KeywordMatcher {
    /// Build a matcher. Terms keep their original spelling as the returned key
    /// and are compared case-insensitively. Empty terms are dropped.
    pub fn new<I, S>(terms: I, mode: MatchMode) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for term in terms {
            let key = term.as_ref().trim();
            if key.is_empty() {
                continue;
            }
            let lowered = key.to_lowercase();
            let pattern = match mode {
                MatchMode::Substring => None,
                MatchMode::WordBoundary => {
                    let re = Regex::new(&format!(r"\b{}\b", regex::escape(&lowered)))
                        .map_err(|e| SignalGeoError::Config(format!("bad keyword {key:?}: {e}")))?;
                    Some(re)
                }
            };
            compiled.push(Term {
                key: key.to_string(),
                lowered,
                pattern,
            });
        }
        Ok(Self {
            terms: compiled,
            mode,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms that occur at least once in `text`, in vocabulary order.
    pub fn present<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let text = text.to_lowercase();
        self.terms
            .iter()
            .filter(|t| t.occurrences(&text) > 0)
            .map(|t| t.key.as_str())
            .collect()
    }

    /// Total occurrences of every term. Overlapping terms each count.
    pub fn count(&self, text: &str) -> u32 {
        let text = text.to_lowercase();
        self.terms.iter().map(|t| t.occurrences(&text)).sum()
    }

    pub fn any(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.terms.iter().any(|t| t.occurrences(&text) > 0)
    }
}

impl Term {
    fn occurrences(&self, lowered_text: &str) -> u32 {
        match &self.pattern {
            Some(re) => re.find_iter(lowered_text).count() as u32,
            None => lowered_text.matches(self.lowered.as_str()).count() as u32,
        }
    }
}
