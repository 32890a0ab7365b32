use diacare_artifacts::schema::RAW_COLUMNS;
use diacare_artifacts::SimilarityMatrix;
use diacare_engine::{
    Engine, EngineConfig, EngineError, EngineOptions, RawClinicalInput, RiskLabel, SelfExclusion,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn stump(feature: usize, threshold: f64, left: [f64; 2], right: [f64; 2]) -> serde_json::Value {
    json!({
        "nodes": [
            { "feature": feature, "threshold": threshold, "left": 1, "right": 2 },
            { "value": left },
            { "value": right },
        ]
    })
}

fn write_artifacts(dir: &Path) {
    let mut scale = vec![1.0; 8];
    scale[1] = 0.01;
    let scaler = json!({
        "kind": "min_max",
        "feature_names": RAW_COLUMNS,
        "min": vec![0.0; 8],
        "scale": scale,
    });
    let classifier = json!({
        "kind": "tree_ensemble",
        "trees": [
            stump(1, 1.26, [0.9, 0.1], [0.2, 0.8]),
            stump(17, 0.5, [1.0, 0.0], [0.0, 1.0]),
        ],
    });
    // Column-oriented export with a padded header and no "Uses" column.
    let catalog = json!({
        " Drug Name ": { "0": "Metformin", "1": "Glipizide", "2": "Insulin Lispro", "3": "Sitagliptin" },
        "Description": { "0": "Biguanide", "1": "Sulfonylurea", "2": "Rapid insulin", "3": "DPP-4 inhibitor" },
        "Side Effects": { "0": "GI upset", "1": "Hypoglycemia", "2": "Hypoglycemia", "3": "Headache" },
    });
    let similarity = SimilarityMatrix::from_rows(vec![
        vec![1.0, 0.7, 0.3, 0.7],
        vec![0.7, 1.0, 0.2, 0.5],
        vec![0.3, 0.2, 1.0, 0.1],
        vec![0.7, 0.5, 0.1, 1.0],
    ])
    .unwrap();

    fs::write(dir.join("scaler.json"), scaler.to_string()).unwrap();
    fs::write(dir.join("classifier.json"), classifier.to_string()).unwrap();
    fs::write(dir.join("medicines.json"), catalog.to_string()).unwrap();
    fs::write(dir.join("similarity.bin"), similarity.to_binary()).unwrap();
}

async fn load(dir: &Path) -> Engine {
    Engine::load(&EngineConfig::in_dir(dir)).await.unwrap()
}

fn patient(glucose: f64) -> RawClinicalInput {
    serde_json::from_value(json!({
        "pregnancies": 2, "glucose": glucose, "blood_pressure": 70, "skin_thickness": 20,
        "insulin": 85, "bmi": 28.5, "diabetes_pedigree_function": 0.5, "age": 35,
    }))
    .unwrap()
}

#[tokio::test]
async fn predicts_from_loaded_artifacts() {
    let tmp = TempDir::new().unwrap();
    write_artifacts(tmp.path());
    let engine = load(tmp.path()).await;

    let high = engine.predict(&patient(130.0)).unwrap();
    assert_eq!(high.label, RiskLabel::Positive);
    assert!((high.probability_positive - 0.9).abs() < 1e-12);

    let low = engine.predict(&patient(90.0)).unwrap();
    assert_eq!(low.label, RiskLabel::Negative);
    assert!((low.probability_positive - 0.05).abs() < 1e-12);

    let features = engine.features(&patient(130.0)).unwrap();
    let scaled = engine.scaled_features(&features);
    assert!((scaled[1] - 1.3).abs() < 1e-12);
    assert_eq!(scaled[17], 1.0);
}

#[tokio::test]
async fn recommends_with_missing_uses_column() {
    let tmp = TempDir::new().unwrap();
    write_artifacts(tmp.path());
    let engine = load(tmp.path()).await;

    let recs = engine.recommend("Metformin").unwrap();
    let names: Vec<&str> = recs.iter().map(|r| r.record.name.as_str()).collect();
    assert_eq!(names, vec!["Glipizide", "Sitagliptin", "Insulin Lispro"]);
    assert_eq!(recs[0].record.usage_notes, "N/A");
    assert_eq!(recs[0].record.side_effects, "Hypoglycemia");

    assert_eq!(engine.suggest("i"), vec!["Insulin Lispro"]);
    assert!(matches!(
        engine.recommend("metformin"),
        Err(EngineError::NotFound { .. })
    ));
}

#[tokio::test]
async fn missing_artifact_dir_is_unavailable() {
    let tmp = TempDir::new().unwrap();
    let err = Engine::load(&EngineConfig::in_dir(&tmp.path().join("nope")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ArtifactUnavailable(_)), "{err}");
}

#[tokio::test]
async fn concurrent_calls_match_sequential_results() {
    let tmp = TempDir::new().unwrap();
    write_artifacts(tmp.path());
    let config = EngineConfig::in_dir(tmp.path()).with_options(EngineOptions {
        recommend_limit: 2,
        self_exclusion: SelfExclusion::Identity,
    });
    let engine = Engine::load(&config).await.unwrap();

    let expected_risk = engine.predict(&patient(130.0)).unwrap();
    let expected_recs = engine.recommend("Glipizide").unwrap();
    let expected_suggest = engine.suggest("");

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let engine = engine.clone();
            let (risk, recs, suggest) = (&expected_risk, &expected_recs, &expected_suggest);
            scope.spawn(move || {
                for _ in 0..50 {
                    assert_eq!(&engine.predict(&patient(130.0)).unwrap(), risk);
                    assert_eq!(&engine.recommend("Glipizide").unwrap(), recs);
                    assert_eq!(&engine.suggest(""), suggest);
                }
            });
        }
    });
    assert_eq!(expected_recs.len(), 2);
}
