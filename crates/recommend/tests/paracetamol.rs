use diacare_artifacts::schema::FEATURE_LEN;
use diacare_artifacts::{
    ArtifactStore, DrugCatalog, DrugRecord, LogisticRegression, ScalingParameters,
    SimilarityMatrix,
};
use diacare_recommend::{PrefixSearch, Recommender, SelfExclusion};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const NAMES: [&str; 8] = [
    "Ibuprofen",
    "Paracetamol",
    "Aspirin",
    "Naproxen",
    "Paracetamol Extra",
    "Diclofenac",
    "Codeine",
    "Metformin",
];

fn fixture() -> Arc<ArtifactStore> {
    let catalog = DrugCatalog::new(
        NAMES
            .iter()
            .map(|name| {
                DrugRecord::new(
                    *name,
                    format!("{name} tablets"),
                    "Nausea",
                    format!("Take {name} with water"),
                )
            })
            .collect(),
    )
    .unwrap();

    let n = NAMES.len();
    let mut rows = vec![vec![0.0; n]; n];
    for (i, row) in rows.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    // Paracetamol's row: Ibuprofen and Diclofenac tie, as do Aspirin and Codeine.
    rows[1] = vec![0.62, 1.0, 0.41, 0.15, 0.88, 0.62, 0.41, 0.05];

    let classifier = LogisticRegression::new(vec![0.0; FEATURE_LEN], 0.0).unwrap();
    Arc::new(
        ArtifactStore::from_parts(
            ScalingParameters::identity(),
            Box::new(classifier),
            catalog,
            SimilarityMatrix::from_rows(rows).unwrap(),
        )
        .unwrap(),
    )
}

#[test]
fn paracetamol_gets_five_ranked_neighbours() {
    let recs = Recommender::new(fixture()).recommend("Paracetamol").unwrap();

    let names: Vec<&str> = recs.iter().map(|r| r.record.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Paracetamol Extra", "Ibuprofen", "Diclofenac", "Aspirin", "Codeine"]
    );
    assert!(names.iter().all(|name| *name != "Paracetamol"));
    assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(recs[1].record.usage_notes, "Take Ibuprofen with water");
}

#[test]
fn identity_policy_agrees_when_diagonal_dominates() {
    let store = fixture();
    let by_rank = Recommender::new(store.clone()).recommend("Paracetamol").unwrap();
    let by_identity = Recommender::new(store)
        .with_self_exclusion(SelfExclusion::Identity)
        .recommend("Paracetamol")
        .unwrap();
    assert_eq!(by_rank, by_identity);
}

#[test]
fn prefix_lookup_finds_both_paracetamol_entries() {
    let search = PrefixSearch::new(fixture().catalog());
    assert_eq!(
        search.suggest("para"),
        vec!["Paracetamol", "Paracetamol Extra"]
    );
}

#[test]
fn recommendation_serializes_flat() {
    let recs = Recommender::new(fixture())
        .with_limit(1)
        .recommend("Paracetamol")
        .unwrap();
    let value = serde_json::to_value(&recs[0]).unwrap();
    assert_eq!(value["name"], "Paracetamol Extra");
    assert_eq!(value["score"], 0.88);
}
