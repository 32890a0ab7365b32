//! # DiaCare Artifacts
//!
//! Loading and validation of the pre-built artifacts the engine serves from.
//!
//! ## Artifacts
//!
//! - **Scaler** — per-column transform for the 8 raw clinical columns
//! - **Classifier** — positional binary classifier over the 18-wide feature vector
//! - **Similarity matrix** — N×N precomputed drug-to-drug scores
//! - **Drug catalog** — N drug records aligned with the matrix rows
//!
//! ## Architecture
//!
//! ```text
//! artifact dir
//!     │
//!     ├──> scaler.json      ──> ScalingParameters
//!     ├──> classifier.json  ──> Box<dyn BinaryClassifier>
//!     ├──> similarity.bin   ──> SimilarityMatrix (ndarray)
//!     └──> medicines.json   ──> DrugCatalog
//!                 │
//!                 └──> ArtifactStore (immutable, shared)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use diacare_artifacts::{ArtifactPaths, ArtifactStore};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = ArtifactStore::load(&ArtifactPaths::in_dir(Path::new("models"))).await?;
//!     println!("{} drugs loaded", store.catalog().len());
//!     Ok(())
//! }
//! ```

mod catalog;
mod classifier;
mod error;
mod paths;
mod scaler;
pub mod schema;
mod similarity;
mod store;

pub use catalog::{DrugCatalog, DrugRecord};
pub use classifier::{
    classifier_from_slice, BinaryClassifier, ClassProbabilities, LogisticRegression, TreeEnsemble,
};
pub use error::{ArtifactError, ArtifactKind, Result};
pub use paths::{
    ArtifactPaths, SimilarityFormat, DEFAULT_ARTIFACT_DIR, DEFAULT_CATALOG_FILE,
    DEFAULT_CLASSIFIER_FILE, DEFAULT_SCALER_FILE, DEFAULT_SIMILARITY_FILE,
};
pub use scaler::ScalingParameters;
pub use similarity::SimilarityMatrix;
pub use store::{ArtifactFile, ArtifactManifest, ArtifactStore};
