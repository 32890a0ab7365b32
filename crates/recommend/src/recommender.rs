use crate::error::{RecommendError, Result};
use diacare_artifacts::{ArtifactStore, DrugRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_RECOMMEND_LIMIT: usize = 5;

/// How the queried drug is kept out of its own recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfExclusion {
    /// Drop the top-ranked entry, whichever drug it is.
    #[default]
    Rank,
    /// Drop the queried drug wherever it ranks.
    Identity,
}

impl SelfExclusion {
    pub const fn as_str(self) -> &'static str {
        match self {
            SelfExclusion::Rank => "rank",
            SelfExclusion::Identity => "identity",
        }
    }
}

impl fmt::Display for SelfExclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelfExclusion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rank" => Ok(SelfExclusion::Rank),
            "identity" => Ok(SelfExclusion::Identity),
            other => Err(format!(
                "unknown self exclusion '{other}' (expected 'rank' or 'identity')"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub record: DrugRecord,
    pub score: f64,
}

/// Top-k ranking over one row of the similarity matrix.
#[derive(Debug, Clone)]
pub struct Recommender {
    store: Arc<ArtifactStore>,
    limit: usize,
    self_exclusion: SelfExclusion,
}

impl Recommender {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_RECOMMEND_LIMIT,
            self_exclusion: SelfExclusion::default(),
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_self_exclusion(mut self, self_exclusion: SelfExclusion) -> Self {
        self.self_exclusion = self_exclusion;
        self
    }

    /// Up to `limit` drugs most similar to `name` (exact match), best first.
    pub fn recommend(&self, name: &str) -> Result<Vec<Recommendation>> {
        self.recommend_with_limit(name, self.limit)
    }

    pub fn recommend_with_limit(&self, name: &str, limit: usize) -> Result<Vec<Recommendation>> {
        let catalog = self.store.catalog();
        let query = catalog
            .position(name)
            .ok_or_else(|| RecommendError::NotFound {
                name: name.to_string(),
            })?;

        let ranked = self.ranked(query)?;
        let picked: Vec<(usize, f64)> = match self.self_exclusion {
            SelfExclusion::Rank => ranked.into_iter().skip(1).take(limit).collect(),
            SelfExclusion::Identity => ranked
                .into_iter()
                .filter(|(idx, _)| *idx != query)
                .take(limit)
                .collect(),
        };
        log::debug!(
            "recommend '{name}' (row {query}, {}): {} results",
            self.self_exclusion,
            picked.len()
        );

        Ok(picked
            .into_iter()
            .filter_map(|(idx, score)| {
                catalog.get(idx).map(|record| Recommendation {
                    record: record.clone(),
                    score,
                })
            })
            .collect())
    }

    /// Every catalog index of row `query`, sorted by descending score.
    ///
    /// The sort is stable, so equal scores keep ascending catalog order.
    /// Scores compare numerically: `-0.0` and `0.0` are a tie.
    pub fn ranked(&self, query: usize) -> Result<Vec<(usize, f64)>> {
        let row = self
            .store
            .similarity()
            .row(query)
            .ok_or(RecommendError::MissingRow(query))?;
        let mut ranked: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        // Cells are finite (checked at load), so `partial_cmp` always orders them.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(ranked)
    }
}
