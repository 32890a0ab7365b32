use crate::catalog::DrugCatalog;
use crate::classifier::{classifier_from_slice, BinaryClassifier};
use crate::error::{ArtifactError, ArtifactKind, Result};
use crate::paths::{ArtifactPaths, SimilarityFormat};
use crate::scaler::ScalingParameters;
use crate::schema::FEATURE_LEN;
use crate::similarity::SimilarityMatrix;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Fingerprint of one artifact file as it was read at load time.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFile {
    pub artifact: &'static str,
    pub path: PathBuf,
    pub bytes: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactManifest {
    pub files: Vec<ArtifactFile>,
    /// Similarity rows whose diagonal is not the strict row maximum.
    pub diagonal_violations: Vec<usize>,
}

/// The immutable set of artifacts the engine serves from.
///
/// Built once at startup and never mutated afterwards, so it can be shared
/// across threads behind an `Arc` without locking.
#[derive(Debug)]
pub struct ArtifactStore {
    scaler: ScalingParameters,
    classifier: Box<dyn BinaryClassifier>,
    catalog: DrugCatalog,
    similarity: SimilarityMatrix,
    manifest: ArtifactManifest,
}

impl ArtifactStore {
    /// Reads, parses and cross-validates all four artifacts. Any failure is fatal.
    pub async fn load(paths: &ArtifactPaths) -> Result<Self> {
        log::info!(
            "Loading artifacts: scaler={:?} classifier={:?} similarity={:?} catalog={:?}",
            paths.scaler,
            paths.classifier,
            paths.similarity,
            paths.catalog
        );
        let (scaler_bytes, classifier_bytes, similarity_bytes, catalog_bytes) = tokio::try_join!(
            read_artifact(&paths.scaler),
            read_artifact(&paths.classifier),
            read_artifact(&paths.similarity),
            read_artifact(&paths.catalog),
        )?;

        let scaler = ScalingParameters::from_slice(&scaler_bytes)?;
        let classifier = classifier_from_slice(&classifier_bytes)?;
        let similarity = match SimilarityFormat::for_path(&paths.similarity) {
            SimilarityFormat::Binary => SimilarityMatrix::from_binary_slice(&similarity_bytes)?,
            SimilarityFormat::Json => SimilarityMatrix::from_json_slice(&similarity_bytes)?,
        };
        let catalog = DrugCatalog::from_slice(&catalog_bytes)?;

        let mut store = Self::from_parts(scaler, classifier, catalog, similarity)?;
        store.manifest.files = vec![
            fingerprint(ArtifactKind::Scaler, &paths.scaler, &scaler_bytes),
            fingerprint(ArtifactKind::Classifier, &paths.classifier, &classifier_bytes),
            fingerprint(ArtifactKind::Similarity, &paths.similarity, &similarity_bytes),
            fingerprint(ArtifactKind::Catalog, &paths.catalog, &catalog_bytes),
        ];

        log::info!(
            "Artifacts loaded: {} drugs, scaler={}, classifier={}",
            store.catalog.len(),
            store.scaler.kind(),
            store.classifier.kind()
        );
        Ok(store)
    }

    /// Assembles a store from already-parsed artifacts, checking that they fit together.
    pub fn from_parts(
        scaler: ScalingParameters,
        classifier: Box<dyn BinaryClassifier>,
        catalog: DrugCatalog,
        similarity: SimilarityMatrix,
    ) -> Result<Self> {
        if classifier.input_len() != FEATURE_LEN {
            return Err(ArtifactError::invalid(
                ArtifactKind::Classifier,
                format!(
                    "classifier expects {} features, schema has {FEATURE_LEN}",
                    classifier.input_len()
                ),
            ));
        }
        if catalog.len() != similarity.len() {
            return Err(ArtifactError::invalid(
                ArtifactKind::Similarity,
                format!(
                    "matrix is {n}x{n} but the catalog has {} drugs",
                    catalog.len(),
                    n = similarity.len()
                ),
            ));
        }

        let diagonal_violations = similarity.diagonal_violations();
        if !diagonal_violations.is_empty() {
            log::warn!(
                "{} similarity rows do not rank their own item strictly first (e.g. row {}); \
                 rank-based self exclusion may return the queried drug for them",
                diagonal_violations.len(),
                diagonal_violations[0]
            );
        }

        Ok(Self {
            scaler,
            classifier,
            catalog,
            similarity,
            manifest: ArtifactManifest {
                files: Vec::new(),
                diagonal_violations,
            },
        })
    }

    #[must_use]
    pub fn scaler(&self) -> &ScalingParameters {
        &self.scaler
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn BinaryClassifier {
        self.classifier.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &DrugCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    #[must_use]
    pub fn manifest(&self) -> &ArtifactManifest {
        &self.manifest
    }
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn fingerprint(kind: ArtifactKind, path: &Path, bytes: &[u8]) -> ArtifactFile {
    ArtifactFile {
        artifact: kind.as_str(),
        path: path.to_path_buf(),
        bytes: bytes.len(),
        sha256: format!("{:x}", Sha256::digest(bytes)),
    }
}
