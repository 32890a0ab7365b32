use crate::input::ValidationError;
use diacare_artifacts::ArtifactError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Classifier failed: {0}")]
    Inference(#[from] ArtifactError),
}
