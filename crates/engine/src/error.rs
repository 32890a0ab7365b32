use diacare_artifacts::ArtifactError;
use diacare_recommend::RecommendError;
use diacare_risk::{FieldIssue, RiskError, ValidationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures visible to engine callers.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Artifacts unavailable: {0}")]
    ArtifactUnavailable(#[source] ArtifactError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Drug '{name}' not found")]
    NotFound { name: String },

    /// Details are logged when the error is created, never carried.
    #[error("Internal error")]
    Internal,
}

impl EngineError {
    /// Offending clinical fields for a validation error.
    pub fn fields(&self) -> &[FieldIssue] {
        match self {
            Self::Validation(err) => err.issues(),
            _ => &[],
        }
    }

    pub(crate) fn internal(context: &str, detail: &dyn std::fmt::Display) -> Self {
        log::error!("{context}: {detail}");
        Self::Internal
    }
}

impl From<RiskError> for EngineError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::Validation(err) => Self::Validation(err),
            RiskError::Inference(err) => Self::internal("risk inference failed", &err),
        }
    }
}

impl From<RecommendError> for EngineError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::NotFound { name } => Self::NotFound { name },
            other => Self::internal("recommendation failed", &other),
        }
    }
}
