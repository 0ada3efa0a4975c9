//! Category-to-suggestions lookup table.
//!
//! The mapping is static configuration data supplied by the caller; the
//! core only exposes which categories were answered "no" (see
//! [`crate::scoring::SubmissionOutcome::gap_categories`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Improvement suggestions keyed by question category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationMap(HashMap<String, Vec<String>>);

impl RecommendationMap {
    pub fn new(by_category: HashMap<String, Vec<String>>) -> Self {
        Self(by_category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Suggestions for the given gap categories, in input order.
    ///
    /// Categories without an entry are skipped; an unknown category is not
    /// an error.
    pub fn suggestions_for<'a>(&'a self, categories: &'a [String]) -> Vec<(&'a str, &'a [String])> {
        categories
            .iter()
            .filter_map(|c| {
                self.0
                    .get(c)
                    .map(|suggestions| (c.as_str(), suggestions.as_slice()))
            })
            .collect()
    }
}
