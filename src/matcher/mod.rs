//! Preference matcher: scores catalog entries against a query.
//!
//! ## Scoring
//!
//! ```text
//! score  = 100 * category_matches + 50 * color_matches
//! score += 30   if price <= budget * 1.2
//! score += 20   if price <= budget          (on top of the 30)
//! ```
//!
//! An entry is kept only when `score > 0` and at least one category or color
//! matched; an affordable entry with no tag overlap is dropped. Kept entries
//! are stable-sorted by score, highest first, and truncated to `max_results`.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{ArtworkRecord, Catalog, TagSet};

pub const DEFAULT_MAX_RESULTS: usize = 2;

const CATEGORY_POINTS: u32 = 100;
const COLOR_POINTS: u32 = 50;
const NEAR_BUDGET_POINTS: u32 = 30;
const WITHIN_BUDGET_POINTS: u32 = 20;
const NEAR_BUDGET_FACTOR: f64 = 1.2;

#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("invalid budget: {0}")]
    InvalidBudget(f64),
    #[error("artwork {id} has no price")]
    MissingPrice { id: String },
    #[error("artwork {id} has invalid price {price}")]
    InvalidPrice { id: String, price: f64 },
}

/// One request's preferences.
#[derive(Debug, Clone, Default)]
pub struct PreferenceQuery {
    pub categories: TagSet,
    pub colors: TagSet,
    pub budget: f64,
}

impl PreferenceQuery {
    pub fn new<C, K>(categories: C, colors: K, budget: f64) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        Self {
            categories: categories.into_iter().collect(),
            colors: colors.into_iter().collect(),
            budget,
        }
    }
}

/// A catalog entry annotated with its score for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    #[serde(flatten)]
    pub artwork: ArtworkRecord,
    pub match_score: u32,
    pub category_matches: u32,
    pub color_matches: u32,
}

/// Score every catalog entry and return the ranked top `max_results`.
///
/// Fails on the first entry without a usable price, or on a negative or
/// non-finite budget.
pub fn match_artworks(
    query: &PreferenceQuery,
    catalog: &[ArtworkRecord],
    max_results: usize,
) -> Result<Vec<ScoredMatch>, MatchError> {
    let budget = query.budget;
    if !budget.is_finite() || budget < 0.0 {
        return Err(MatchError::InvalidBudget(budget));
    }

    let mut kept = Vec::new();
    for artwork in catalog {
        let price = artwork_price(artwork)?;

        let category_matches = count_matches(&query.categories, &artwork.category);
        let color_matches = count_matches(&query.colors, &artwork.color);

        let mut score = CATEGORY_POINTS * category_matches + COLOR_POINTS * color_matches;
        if price <= budget * NEAR_BUDGET_FACTOR {
            score += NEAR_BUDGET_POINTS;
            if price <= budget {
                score += WITHIN_BUDGET_POINTS;
            }
        }

        if score > 0 && (category_matches > 0 || color_matches > 0) {
            debug!(
                artwork_id = %artwork.id,
                title = %artwork.title,
                category_matches,
                color_matches,
                price,
                score,
                "candidate kept"
            );
            kept.push(ScoredMatch {
                artwork: artwork.clone(),
                match_score: score,
                category_matches,
                color_matches,
            });
        }
    }

    // `sort_by` is stable: equal scores keep catalog order.
    kept.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    kept.truncate(max_results);
    Ok(kept)
}

fn artwork_price(artwork: &ArtworkRecord) -> Result<f64, MatchError> {
    match artwork.price {
        None => Err(MatchError::MissingPrice { id: artwork.id.to_string() }),
        Some(p) if !p.is_finite() || p < 0.0 => {
            Err(MatchError::InvalidPrice { id: artwork.id.to_string(), price: p })
        }
        Some(p) => Ok(p),
    }
}

fn count_matches(wanted: &TagSet, have: &TagSet) -> u32 {
    wanted.keys().filter(|k| have.contains(k)).count() as u32
}

/// Catalog-bound matcher used by the request handler.
#[derive(Debug, Clone)]
pub struct Matcher {
    catalog: Arc<Catalog>,
    max_results: usize,
}

impl Matcher {
    pub fn new(catalog: Arc<Catalog>, max_results: usize) -> Self {
        Self { catalog, max_results }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Ranked matches for `query`. A data error is logged and reported as
    /// no matches.
    pub fn find_matches(&self, query: &PreferenceQuery) -> Vec<ScoredMatch> {
        match match_artworks(query, self.catalog.artworks(), self.max_results) {
            Ok(matches) => {
                info!(
                    categories = ?query.categories.keys().collect::<Vec<_>>(),
                    colors = ?query.colors.keys().collect::<Vec<_>>(),
                    budget = query.budget,
                    found = matches.len(),
                    top_score = matches.first().map(|m| m.match_score),
                    "matching done"
                );
                matches
            }
            Err(e) => {
                warn!(error = %e, "matching failed; treating as no matches");
                Vec::new()
            }
        }
    }
}
