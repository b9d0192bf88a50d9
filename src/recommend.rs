//! Recommendation engine.
//!
//! Turns a list of reported condition/habit tokens into a ranked list of
//! output categories by counting, for every output node, how many distinct
//! query tokens are adjacent to it in the co-occurrence graph.
//!
//! ## Ordering
//!
//! Categories are ranked by tally, highest first.  Equal tallies keep the
//! order in which the category was first reached: query tokens are visited
//! in the order given, and each token's neighbours in adjacency order.  The
//! sort is stable, so the same query against the same graph always yields
//! the same list.
//!
//! Unknown tokens contribute nothing.  A token repeated in one query counts
//! once.  Output nodes that appear directly in the query are not excluded.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::graph::{CooccurrenceGraph, Role};

/// Rendered in place of a ranked list when nothing matched.
pub const NO_CLEAR_RECOMMENDATION: &str = "No clear recommendation found";

// ── Tally ─────────────────────────────────────────────────────────────────────

/// Per-query count of co-occurring input tokens for each output node.
///
/// Entries are kept in first-encountered order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    /// Count recorded for `category`; zero when it was never reached.
    pub fn get(&self, category: &str) -> usize {
        self.entries
            .iter()
            .find(|(id, _)| id == category)
            .map_or(0, |(_, n)| *n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-encountered order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(id, n)| (id.as_str(), *n))
    }

    /// Entries sorted by count descending, ties in first-encountered order.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

// ── Recommendation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// Up to K categories, best first.  Never empty.
    Ranked(Vec<String>),
    /// No query token reached an output node.
    NoClearRecommendation,
}

impl Recommendation {
    /// Client-facing list: the ranked categories, or the single sentinel
    /// string when there is no clear recommendation.
    pub fn into_labels(self) -> Vec<String> {
        match self {
            Recommendation::Ranked(ids) => ids,
            Recommendation::NoClearRecommendation => vec![NO_CLEAR_RECOMMENDATION.to_string()],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Recommendation::NoClearRecommendation)
    }
}

// ── Recommender ───────────────────────────────────────────────────────────────

/// Stateless scorer over a shared, read-only graph.
#[derive(Debug, Clone)]
pub struct Recommender {
    graph: Arc<CooccurrenceGraph>,
}

impl Recommender {
    pub fn new(graph: Arc<CooccurrenceGraph>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &CooccurrenceGraph {
        &self.graph
    }

    /// Count, per output node, the distinct query tokens adjacent to it.
    pub fn tally<S: AsRef<str>>(&self, tokens: &[S]) -> Tally {
        let mut tally = Tally::default();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::new();

        for token in tokens {
            let token = token.as_ref();
            if !visited.insert(token) {
                continue;
            }
            if !self.graph.has_node(token) {
                trace!(%token, "token not in graph, skipped");
                continue;
            }
            let Ok(neighbors) = self.graph.neighbors(token) else {
                continue;
            };
            for neighbor in neighbors {
                if self.graph.role_of(neighbor) != Some(Role::Output) {
                    continue;
                }
                match index.get(neighbor.as_str()) {
                    Some(&slot) => tally.entries[slot].1 += 1,
                    None => {
                        index.insert(neighbor.as_str(), tally.entries.len());
                        tally.entries.push((neighbor.clone(), 1));
                    }
                }
            }
        }

        tally
    }

    /// Top-`k` output categories for `tokens`.
    pub fn recommend<S: AsRef<str>>(&self, tokens: &[S], k: NonZeroUsize) -> Recommendation {
        let tally = self.tally(tokens);

        debug!(
            tokens = tokens.len(),
            candidates = tally.len(),
            top_k = k.get(),
            "recommendation tally computed"
        );

        if tally.is_empty() {
            return Recommendation::NoClearRecommendation;
        }

        let top = tally
            .ranked()
            .into_iter()
            .take(k.get())
            .map(|(id, _)| id.to_string())
            .collect();
        Recommendation::Ranked(top)
    }
}
