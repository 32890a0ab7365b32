//! # DiaCare Recommend
//!
//! Read-only lookups over the drug catalog:
//!
//! - [`Recommender`]: top-k similar drugs from one similarity-matrix row
//! - [`PrefixSearch`]: case-insensitive name-prefix lookup
//! - [`FuzzyNames`]: "did you mean" hints for names that are not in the catalog

mod error;
mod fuzzy;
mod prefix;
mod recommender;

pub use error::{RecommendError, Result};
pub use fuzzy::FuzzyNames;
pub use prefix::PrefixSearch;
pub use recommender::{Recommendation, Recommender, SelfExclusion, DEFAULT_RECOMMEND_LIMIT};
