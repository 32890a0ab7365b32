use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Which of the four persisted artifacts an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Scaler,
    Classifier,
    Similarity,
    Catalog,
}

impl ArtifactKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Scaler => "scaler",
            ArtifactKind::Classifier => "classifier",
            ArtifactKind::Similarity => "similarity",
            ArtifactKind::Catalog => "catalog",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {artifact} artifact: {source}")]
    Parse {
        artifact: ArtifactKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {artifact} artifact: {reason}")]
    Invalid {
        artifact: ArtifactKind,
        reason: String,
    },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Inference error: {0}")]
    Inference(String),
}

impl ArtifactError {
    pub fn invalid(artifact: ArtifactKind, reason: impl Into<String>) -> Self {
        Self::Invalid {
            artifact,
            reason: reason.into(),
        }
    }

    pub fn parse(artifact: ArtifactKind, source: serde_json::Error) -> Self {
        Self::Parse { artifact, source }
    }

    /// The artifact a load-time error belongs to, if any.
    pub fn artifact(&self) -> Option<ArtifactKind> {
        match self {
            Self::Parse { artifact, .. } | Self::Invalid { artifact, .. } => Some(*artifact),
            _ => None,
        }
    }
}
