//! # DiaCare Engine
//!
//! One `Clone + Send + Sync` handle over the risk classifier, the similarity
//! recommender and the catalog lookups, with a single error taxonomy.
//!
//! ## Example
//!
//! ```no_run
//! use diacare_engine::{Engine, EngineConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), diacare_engine::EngineError> {
//!     let engine = Engine::load(&EngineConfig::in_dir(Path::new("models"))).await?;
//!     for rec in engine.recommend("Paracetamol")? {
//!         println!("{} ({:.3})", rec.record.name, rec.score);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod engine;
mod error;

pub use config::{EngineConfig, EngineOptions};
pub use engine::{Engine, ACTIONS};
pub use error::{EngineError, Result};

pub use diacare_artifacts::{
    ArtifactFile, ArtifactManifest, ArtifactPaths, ArtifactStore, DrugRecord, DEFAULT_ARTIFACT_DIR,
    DEFAULT_CATALOG_FILE, DEFAULT_CLASSIFIER_FILE, DEFAULT_SCALER_FILE, DEFAULT_SIMILARITY_FILE,
};
pub use diacare_recommend::{Recommendation, SelfExclusion};
pub use diacare_risk::{
    ClinicalField, FeatureVector, FieldIssue, FieldProblem, Indicator, RawClinicalInput,
    RiskLabel, RiskResult,
};
