use crate::config::AppConfig;
use diacare_engine::{ArtifactFile, ArtifactStore};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub(crate) struct DoctorReport {
    pub ok: bool,
    pub config_source: Option<PathBuf>,
    pub artifact_dir: PathBuf,
    pub paths: ArtifactPathsReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<LoadedReport>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ArtifactPathsReport {
    pub scaler: PathBuf,
    pub classifier: PathBuf,
    pub similarity: PathBuf,
    pub catalog: PathBuf,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoadedReport {
    pub catalog_size: usize,
    pub scaler: &'static str,
    pub classifier: &'static str,
    pub files: Vec<ArtifactFile>,
    pub diagonal_violations: Vec<usize>,
}

/// Loads every configured artifact once and records what was found.
pub(crate) async fn doctor(config: &AppConfig) -> DoctorReport {
    let paths = config.artifact_paths();
    let paths_report = ArtifactPathsReport {
        scaler: paths.scaler.clone(),
        classifier: paths.classifier.clone(),
        similarity: paths.similarity.clone(),
        catalog: paths.catalog.clone(),
    };

    let (loaded, error) = match ArtifactStore::load(&paths).await {
        Ok(store) => (
            Some(LoadedReport {
                catalog_size: store.catalog().len(),
                scaler: store.scaler().kind(),
                classifier: store.classifier().kind(),
                files: store.manifest().files.clone(),
                diagonal_violations: store.manifest().diagonal_violations.clone(),
            }),
            None,
        ),
        Err(err) => (None, Some(err.to_string())),
    };

    DoctorReport {
        ok: error.is_none(),
        config_source: config.source.clone(),
        artifact_dir: config.artifact_dir.clone(),
        paths: paths_report,
        error,
        loaded,
    }
}

pub(crate) fn render_human(report: &DoctorReport) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Config: {}",
        report
            .config_source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string())
    ));
    lines.push(format!("Artifact dir: {}", report.artifact_dir.display()));

    match (&report.loaded, &report.error) {
        (Some(loaded), _) => {
            lines.push(format!("Catalog: {} drugs", loaded.catalog_size));
            lines.push(format!("Scaler: {}", loaded.scaler));
            lines.push(format!("Classifier: {}", loaded.classifier));
            for file in &loaded.files {
                lines.push(format!(
                    "  {:<11} {} ({} bytes, sha256 {})",
                    file.artifact,
                    file.path.display(),
                    file.bytes,
                    &file.sha256[..12.min(file.sha256.len())]
                ));
            }
            if loaded.diagonal_violations.is_empty() {
                lines.push("Similarity diagonal: ok".to_string());
            } else {
                lines.push(format!(
                    "Similarity diagonal: {} rows not strictly self-first (first: {})",
                    loaded.diagonal_violations.len(),
                    loaded.diagonal_violations[0]
                ));
            }
        }
        (None, Some(err)) => {
            lines.push(format!("Artifacts: error ({err})"));
            lines.push(format!("  scaler:     {}", report.paths.scaler.display()));
            lines.push(format!("  classifier: {}", report.paths.classifier.display()));
            lines.push(format!("  similarity: {}", report.paths.similarity.display()));
            lines.push(format!("  catalog:    {}", report.paths.catalog.display()));
        }
        (None, None) => {}
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_is_reported_not_raised() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = AppConfig {
            artifact_dir: tmp.path().join("absent"),
            ..AppConfig::default()
        };
        let report = doctor(&config).await;
        assert!(!report.ok);
        assert!(report.loaded.is_none());
        let lines = render_human(&report);
        assert!(lines.iter().any(|l| l.starts_with("Artifacts: error")));
        assert_eq!(lines[0], "Config: defaults");
    }
}
