pub mod dom;
pub mod json;

#[cfg(test)]
mod tests;

use crate::normalizer::{accept_model, normalize};
use crate::results::{CandidateSource, ModelCandidate};
use std::collections::HashSet;

impl ModelCandidate {
    /// Builds a candidate if `raw` survives the noise filter
    pub fn from_raw(raw: &str, title: &str, source: CandidateSource) -> Option<Self> {
        let base = accept_model(raw)?;
        let normalized = normalize(&base);
        if normalized.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.trim().to_string(),
            base,
            normalized,
            title: title.trim().to_string(),
            source,
        })
    }
}

/// Ordered, deduplicated collection of candidates.
///
/// Keyed by normalized form; the first candidate seen for a key wins and the
/// collection stops growing at its cap.
#[derive(Debug)]
pub struct CandidateSet {
    seen: HashSet<String>,
    items: Vec<ModelCandidate>,
    max: usize,
}

impl CandidateSet {
    pub fn new(max: usize) -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
            max,
        }
    }

    /// Adds a candidate, returning whether it was kept
    pub fn push(&mut self, candidate: ModelCandidate) -> bool {
        if self.is_full() || self.seen.contains(&candidate.normalized) {
            return false;
        }
        self.seen.insert(candidate.normalized.clone());
        self.items.push(candidate);
        true
    }

    /// Adds candidates in order until the set is full
    pub fn extend<I: IntoIterator<Item = ModelCandidate>>(&mut self, candidates: I) {
        for candidate in candidates {
            if self.is_full() {
                break;
            }
            self.push(candidate);
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<ModelCandidate> {
        self.items
    }
}

/// Merges the structured (network and embedded) and DOM channels.
///
/// Structured candidates come first, DOM candidates are appended, and the
/// result holds at most `max` distinct models.
pub fn merge_candidates(
    structured: Vec<ModelCandidate>,
    dom: Vec<ModelCandidate>,
    max: usize,
) -> Vec<ModelCandidate> {
    let mut set = CandidateSet::new(max);
    set.extend(structured);
    set.extend(dom);
    ::log::debug!("Merged candidates into {} unique models", set.len());
    set.into_vec()
}
