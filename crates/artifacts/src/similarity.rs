use crate::error::{ArtifactError, ArtifactKind, Result};
use crate::schema::ARTIFACT_SCHEMA_VERSION;
use ndarray::{Array2, ArrayView1};
use serde::Deserialize;

const SIMILARITY_MAGIC: &[u8; 4] = b"SIM1";
const HEADER_LEN: usize = 8;
const CELL_LEN: usize = std::mem::size_of::<f64>();

/// Square matrix of precomputed item-to-item similarity scores.
///
/// Row `i`, column `j` is the similarity of item `i` to item `j`. The matrix is
/// not assumed to be symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    scores: Array2<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersistedSimilarity {
    Versioned {
        schema_version: u32,
        rows: Vec<Vec<f64>>,
    },
    Bare(Vec<Vec<f64>>),
}

impl SimilarityMatrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut flat = Vec::with_capacity(n.saturating_mul(n));
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(ArtifactError::invalid(
                    ArtifactKind::Similarity,
                    format!("row {idx} has {} columns, expected {n}", row.len()),
                ));
            }
            flat.extend(row);
        }
        Self::from_flat(n, flat)
    }

    fn from_flat(n: usize, flat: Vec<f64>) -> Result<Self> {
        if let Some(pos) = flat.iter().position(|v| !v.is_finite()) {
            return Err(ArtifactError::invalid(
                ArtifactKind::Similarity,
                format!("cell ({}, {}) is not finite", pos / n, pos % n),
            ));
        }
        let scores = Array2::from_shape_vec((n, n), flat)
            .map_err(|err| ArtifactError::invalid(ArtifactKind::Similarity, err.to_string()))?;
        Ok(Self { scores })
    }

    /// JSON: `{"schema_version": 1, "rows": [[..]]}` or a bare array of rows.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedSimilarity = serde_json::from_slice(bytes)
            .map_err(|err| ArtifactError::parse(ArtifactKind::Similarity, err))?;
        let rows = match persisted {
            PersistedSimilarity::Versioned {
                schema_version,
                rows,
            } => {
                if schema_version != ARTIFACT_SCHEMA_VERSION {
                    return Err(ArtifactError::invalid(
                        ArtifactKind::Similarity,
                        format!(
                            "unsupported schema_version {schema_version} (expected {ARTIFACT_SCHEMA_VERSION})"
                        ),
                    ));
                }
                rows
            }
            PersistedSimilarity::Bare(rows) => rows,
        };
        Self::from_rows(rows)
    }

    /// Binary: `SIM1`, little-endian `u32` N, then N·N little-endian `f64` row-major.
    pub fn from_binary_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != SIMILARITY_MAGIC {
            return Err(ArtifactError::invalid(
                ArtifactKind::Similarity,
                "missing SIM1 header",
            ));
        }
        let mut dim = [0u8; 4];
        dim.copy_from_slice(&bytes[4..HEADER_LEN]);
        let n = u32::from_le_bytes(dim) as usize;
        let expected_len = n
            .checked_mul(n)
            .and_then(|cells| cells.checked_mul(CELL_LEN))
            .and_then(|body| body.checked_add(HEADER_LEN));
        if expected_len != Some(bytes.len()) {
            return Err(ArtifactError::invalid(
                ArtifactKind::Similarity,
                format!("{} bytes do not hold a {n}x{n} matrix", bytes.len()),
            ));
        }
        let flat = bytes[HEADER_LEN..]
            .chunks_exact(CELL_LEN)
            .map(|chunk| {
                let mut cell = [0u8; CELL_LEN];
                cell.copy_from_slice(chunk);
                f64::from_le_bytes(cell)
            })
            .collect();
        Self::from_flat(n, flat)
    }

    #[must_use]
    pub fn to_binary(&self) -> Vec<u8> {
        let n = self.len();
        let mut out = Vec::with_capacity(HEADER_LEN + n * n * CELL_LEN);
        out.extend_from_slice(SIMILARITY_MAGIC);
        #[allow(clippy::cast_possible_truncation)]
        let dim = n as u32;
        out.extend_from_slice(&dim.to_le_bytes());
        for value in &self.scores {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Number of items (rows).
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.nrows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn row(&self, idx: usize) -> Option<ArrayView1<'_, f64>> {
        (idx < self.len()).then(|| self.scores.row(idx))
    }

    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.scores.get((row, column)).copied()
    }

    /// Rows whose diagonal cell is not the strict maximum of the row.
    #[must_use]
    pub fn diagonal_violations(&self) -> Vec<usize> {
        self.scores
            .outer_iter()
            .enumerate()
            .filter(|(idx, row)| {
                let diagonal = row[*idx];
                row.iter()
                    .enumerate()
                    .any(|(col, value)| col != *idx && *value >= diagonal)
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}
