//! Full-text search over published posts.
//!
//! Titles carry weight `A` and bodies weight `B`. Hits below [`MIN_RANK`]
//! are dropped and the rest are ordered by rank, best first.

use serde::Serialize;

use crate::domain::Post;

/// Minimum rank a post needs to be returned.
pub const MIN_RANK: f32 = 0.3;

/// Text search configuration used when none is configured.
pub const DEFAULT_SEARCH_LANGUAGE: &str = "portuguese";

/// Default label weights, matching PostgreSQL's `ts_rank` {D, C, B, A}.
const WEIGHT_A: f32 = 1.0;
const WEIGHT_B: f32 = 0.4;

/// sum(1/i^2), i = 1..inf
const PI_SQUARED_OVER_SIX: f32 = 1.644_934_1;

/// A cleaned search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub language: String,
    pub min_rank: f32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            min_rank: MIN_RANK,
        }
    }
}

/// A post matched by a search together with its rank.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub post: Post,
    pub rank: f32,
}

/// Lower-cased word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Rank a document made of a weight-A title and a weight-B body against a
/// query, the way `ts_rank` scores the AND of the query's lexemes built by
/// `plainto_tsquery`.
///
/// A single distinct term is scored like an OR query: with occurrences
/// `w_0..w_n` in position order it scores
/// `(w_max + Σ w_i/(i+1)² - w_max/(j_max+1)²) / (π²/6)`.
/// Two or more terms are scored by proximity: every pair of occurrences of
/// different terms at distance `d` contributes `sqrt(w_a·w_b·word_distance(d))`,
/// combined as `1 - Π(1 - c)`. A document missing any term never gets a
/// pair and scores 0.
pub fn rank(title: &str, body: &str, query: &str) -> f32 {
    let mut terms = tokenize(query);
    terms.sort();
    terms.dedup();
    if terms.is_empty() {
        return 0.0;
    }

    // Title positions come before body positions, as in `title || body`.
    let document: Vec<(String, f32)> = tokenize(title)
        .into_iter()
        .map(|w| (w, WEIGHT_A))
        .chain(tokenize(body).into_iter().map(|w| (w, WEIGHT_B)))
        .collect();

    let hits: Vec<Vec<(usize, f32)>> = terms
        .iter()
        .map(|term| occurrences(&document, term))
        .collect();

    match hits.as_slice() {
        [single] => rank_single(single),
        _ => rank_all(&hits),
    }
}

/// (1-based position, weight) of every occurrence of `term`.
fn occurrences(document: &[(String, f32)], term: &str) -> Vec<(usize, f32)> {
    document
        .iter()
        .enumerate()
        .filter(|(_, (w, _))| w == term)
        .map(|(i, (_, weight))| (i + 1, *weight))
        .collect()
}

fn rank_single(hits: &[(usize, f32)]) -> f32 {
    if hits.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0_f32;
    let mut max_weight = -1.0_f32;
    let mut max_at = 0usize;
    for (j, (_, weight)) in hits.iter().enumerate() {
        let denom = ((j + 1) * (j + 1)) as f32;
        sum += weight / denom;
        if *weight > max_weight {
            max_weight = *weight;
            max_at = j;
        }
    }
    let denom = ((max_at + 1) * (max_at + 1)) as f32;
    (max_weight + sum - max_weight / denom) / PI_SQUARED_OVER_SIX
}

fn rank_all(hits: &[Vec<(usize, f32)>]) -> f32 {
    let mut res: Option<f32> = None;
    for (i, later) in hits.iter().enumerate() {
        for earlier in &hits[..i] {
            for (pos_a, weight_a) in later {
                for (pos_b, weight_b) in earlier {
                    let dist = pos_a.abs_diff(*pos_b);
                    if dist == 0 {
                        continue;
                    }
                    let cur = (weight_a * weight_b * word_distance(dist)).sqrt();
                    res = Some(match res {
                        None => cur,
                        Some(r) => 1.0 - (1.0 - r) * (1.0 - cur),
                    });
                }
            }
        }
    }
    res.unwrap_or(0.0)
}

/// Proximity weight of two lexemes `dist` positions apart.
fn word_distance(dist: usize) -> f32 {
    if dist > 100 {
        return 1e-30;
    }
    1.0 / (1.005 + 0.05 * ((dist as f32) / 1.5 - 2.0).exp())
}
