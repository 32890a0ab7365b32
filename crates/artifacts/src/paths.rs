use std::path::{Path, PathBuf};

pub const DEFAULT_ARTIFACT_DIR: &str = "models";
pub const DEFAULT_SCALER_FILE: &str = "scaler.json";
pub const DEFAULT_CLASSIFIER_FILE: &str = "classifier.json";
pub const DEFAULT_SIMILARITY_FILE: &str = "similarity.bin";
pub const DEFAULT_CATALOG_FILE: &str = "medicines.json";

/// On-disk encoding of the similarity matrix, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityFormat {
    Binary,
    Json,
}

impl SimilarityFormat {
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bin") => Self::Binary,
            _ => Self::Json,
        }
    }
}

/// Locations of the four artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub classifier: PathBuf,
    pub similarity: PathBuf,
    pub catalog: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            scaler: dir.join(DEFAULT_SCALER_FILE),
            classifier: dir.join(DEFAULT_CLASSIFIER_FILE),
            similarity: dir.join(DEFAULT_SIMILARITY_FILE),
            catalog: dir.join(DEFAULT_CATALOG_FILE),
        }
    }

    /// Resolves each file against `dir` unless it is already absolute.
    #[must_use]
    pub fn resolve(
        dir: &Path,
        scaler: &Path,
        classifier: &Path,
        similarity: &Path,
        catalog: &Path,
    ) -> Self {
        Self {
            scaler: resolve_file(dir, scaler),
            classifier: resolve_file(dir, classifier),
            similarity: resolve_file(dir, similarity),
            catalog: resolve_file(dir, catalog),
        }
    }
}

fn resolve_file(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        dir.join(file)
    }
}
