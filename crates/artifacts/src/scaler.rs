use crate::error::{ArtifactError, ArtifactKind, Result};
use crate::schema::{ARTIFACT_SCHEMA_VERSION, RAW_COLUMNS, RAW_FEATURE_COUNT};
use serde::Deserialize;

/// Per-column transform applied to a raw clinical value before inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ColumnTransform {
    /// `(x - mean) / scale`
    Standard { mean: f64, scale: f64 },
    /// `x * scale + min`
    MinMax { min: f64, scale: f64 },
}

impl ColumnTransform {
    #[must_use]
    pub(crate) fn apply(&self, value: f64) -> f64 {
        match *self {
            ColumnTransform::Standard { mean, scale } => (value - mean) / scale,
            ColumnTransform::MinMax { min, scale } => value * scale + min,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PersistedScaler {
    Standard {
        #[serde(default = "default_schema_version")]
        schema_version: u32,
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    MinMax {
        #[serde(default = "default_schema_version")]
        schema_version: u32,
        feature_names: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

fn default_schema_version() -> u32 {
    ARTIFACT_SCHEMA_VERSION
}

/// Immutable scaling transform over the raw clinical columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingParameters {
    kind: &'static str,
    columns: [ColumnTransform; RAW_FEATURE_COUNT],
}

impl ScalingParameters {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedScaler = serde_json::from_slice(bytes)
            .map_err(|err| ArtifactError::parse(ArtifactKind::Scaler, err))?;
        Self::from_persisted(persisted)
    }

    /// Builds a standard (mean/scale) transform in raw column order.
    pub fn standard(
        mean: [f64; RAW_FEATURE_COUNT],
        scale: [f64; RAW_FEATURE_COUNT],
    ) -> Result<Self> {
        Self::from_persisted(PersistedScaler::Standard {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            feature_names: RAW_COLUMNS.iter().map(|c| c.to_string()).collect(),
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        })
    }

    /// Passes every raw column through unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            kind: "standard",
            columns: [ColumnTransform::Standard {
                mean: 0.0,
                scale: 1.0,
            }; RAW_FEATURE_COUNT],
        }
    }

    fn from_persisted(persisted: PersistedScaler) -> Result<Self> {
        let (kind, schema_version, names, offsets, scales) = match persisted {
            PersistedScaler::Standard {
                schema_version,
                feature_names,
                mean,
                scale,
            } => ("standard", schema_version, feature_names, mean, scale),
            PersistedScaler::MinMax {
                schema_version,
                feature_names,
                min,
                scale,
            } => ("min_max", schema_version, feature_names, min, scale),
        };

        if schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(ArtifactError::invalid(
                ArtifactKind::Scaler,
                format!(
                    "unsupported schema_version {schema_version} (expected {ARTIFACT_SCHEMA_VERSION})"
                ),
            ));
        }
        if names.len() != RAW_FEATURE_COUNT
            || names.iter().zip(RAW_COLUMNS).any(|(got, want)| got != want)
        {
            return Err(ArtifactError::invalid(
                ArtifactKind::Scaler,
                format!("feature_names must be {RAW_COLUMNS:?} in order, got {names:?}"),
            ));
        }
        for (label, values) in [("offset", &offsets), ("scale", &scales)] {
            if values.len() != RAW_FEATURE_COUNT {
                return Err(ArtifactError::invalid(
                    ArtifactKind::Scaler,
                    format!(
                        "{label} has {} entries, expected {RAW_FEATURE_COUNT}",
                        values.len()
                    ),
                ));
            }
            if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
                return Err(ArtifactError::invalid(
                    ArtifactKind::Scaler,
                    format!("{label} for column {} is not finite", RAW_COLUMNS[pos]),
                ));
            }
        }

        let mut columns = [ColumnTransform::Standard {
            mean: 0.0,
            scale: 1.0,
        }; RAW_FEATURE_COUNT];
        for (idx, slot) in columns.iter_mut().enumerate() {
            *slot = if kind == "standard" {
                if scales[idx] == 0.0 {
                    return Err(ArtifactError::invalid(
                        ArtifactKind::Scaler,
                        format!("scale for column {} is zero", RAW_COLUMNS[idx]),
                    ));
                }
                ColumnTransform::Standard {
                    mean: offsets[idx],
                    scale: scales[idx],
                }
            } else {
                ColumnTransform::MinMax {
                    min: offsets[idx],
                    scale: scales[idx],
                }
            };
        }

        Ok(Self { kind, columns })
    }

    /// Transform name as declared by the artifact (`standard` or `min_max`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn transform(&self, raw: &[f64; RAW_FEATURE_COUNT]) -> [f64; RAW_FEATURE_COUNT] {
        let mut out = [0.0; RAW_FEATURE_COUNT];
        for ((slot, value), column) in out.iter_mut().zip(raw).zip(&self.columns) {
            *slot = column.apply(*value);
        }
        out
    }
}
