use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommendError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    #[error("Drug not found: {name}")]
    NotFound { name: String },

    #[error("Similarity matrix has no row {0}")]
    MissingRow(usize),
}
