use crate::error::Result;
use crate::features::{build_feature_vector, FeatureVector};
use crate::input::RawClinicalInput;
use diacare_artifacts::schema::{FEATURE_LEN, RAW_FEATURE_COUNT};
use diacare_artifacts::ArtifactStore;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    Negative,
    Positive,
}

impl RiskLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            RiskLabel::Negative => "Negative",
            RiskLabel::Positive => "Positive",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskResult {
    pub label: RiskLabel,
    pub probability_negative: f64,
    pub probability_positive: f64,
}

/// Scales features and runs the stored classifier. Stateless per call.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    store: Arc<ArtifactStore>,
}

impl RiskClassifier {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    /// Validates the raw input and classifies it.
    pub fn predict(&self, raw: &RawClinicalInput) -> Result<RiskResult> {
        let features = build_feature_vector(raw)?;
        self.predict_features(&features)
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Result<RiskResult> {
        let scaled = self.scaled_features(features);
        let proba = self.store.classifier().predict_proba(&scaled)?;
        let label = if proba.is_positive() {
            RiskLabel::Positive
        } else {
            RiskLabel::Negative
        };
        log::debug!(
            "risk prediction: {label} (negative={:.4}, positive={:.4})",
            proba.negative,
            proba.positive
        );
        Ok(RiskResult {
            label,
            probability_negative: proba.negative,
            probability_positive: proba.positive,
        })
    }

    /// Classifier input: scaled raw columns followed by the untouched indicators.
    #[must_use]
    pub fn scaled_features(&self, features: &FeatureVector) -> [f64; FEATURE_LEN] {
        let mut scaled = [0.0; FEATURE_LEN];
        scaled[..RAW_FEATURE_COUNT].copy_from_slice(&self.store.scaler().transform(&features.raw()));
        scaled[RAW_FEATURE_COUNT..].copy_from_slice(features.indicators());
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ClinicalInput;
    use crate::RiskError;
    use diacare_artifacts::{
        classifier_from_slice, BinaryClassifier, DrugCatalog, DrugRecord, LogisticRegression,
        ScalingParameters, SimilarityMatrix,
    };
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn store_with(scaler: ScalingParameters, classifier: Box<dyn BinaryClassifier>) -> Arc<ArtifactStore> {
        let catalog = DrugCatalog::new(vec![DrugRecord::new("Metformin", "", "", "")]).unwrap();
        let similarity = SimilarityMatrix::from_rows(vec![vec![1.0]]).unwrap();
        Arc::new(ArtifactStore::from_parts(scaler, classifier, catalog, similarity).unwrap())
    }

    fn store(scaler: ScalingParameters, coefficients: Vec<f64>, intercept: f64) -> Arc<ArtifactStore> {
        let classifier = LogisticRegression::new(coefficients, intercept).unwrap();
        store_with(scaler, Box::new(classifier))
    }

    /// One-split tree per entry: `(feature, threshold, left leaf, right leaf)`.
    fn stump_forest(stumps: &[(usize, f64, [f64; 2], [f64; 2])]) -> Box<dyn BinaryClassifier> {
        let trees: Vec<_> = stumps
            .iter()
            .map(|(feature, threshold, left, right)| {
                json!({ "nodes": [
                    { "feature": feature, "threshold": threshold, "left": 1, "right": 2 },
                    { "value": left },
                    { "value": right },
                ]})
            })
            .collect();
        let artifact = json!({ "kind": "tree_ensemble", "trees": trees });
        classifier_from_slice(artifact.to_string().as_bytes()).unwrap()
    }

    fn assert_consistent(result: &RiskResult) -> std::result::Result<(), TestCaseError> {
        let total = result.probability_negative + result.probability_positive;
        prop_assert!((total - 1.0).abs() < 1e-6, "sum={}", total);
        prop_assert!((0.0..=1.0).contains(&result.probability_positive));
        let expected = if result.probability_positive > result.probability_negative {
            RiskLabel::Positive
        } else {
            RiskLabel::Negative
        };
        prop_assert_eq!(result.label, expected);
        Ok(())
    }

    fn one_hot(idx: usize) -> Vec<f64> {
        let mut coefficients = vec![0.0; FEATURE_LEN];
        coefficients[idx] = 1.0;
        coefficients
    }

    fn patient(glucose: f64) -> RawClinicalInput {
        serde_json::from_value(json!({
            "Pregnancies": 2, "Glucose": glucose, "BloodPressure": 70, "SkinThickness": 20,
            "Insulin": 85, "BMI": 28.5, "DiabetesPedigreeFunction": 0.5, "Age": 35,
        }))
        .unwrap()
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    #[test]
    fn scales_raw_columns_only() {
        let scaler = ScalingParameters::standard([5.0; 8], [2.0; 8]).unwrap();
        let service = RiskClassifier::new(store(scaler, one_hot(17), 0.0));
        let features = build_feature_vector(&patient(130.0)).unwrap();

        let scaled = service.scaled_features(&features);
        assert_eq!(scaled[1], (130.0 - 5.0) / 2.0);
        assert_eq!(&scaled[RAW_FEATURE_COUNT..], features.indicators());

        // Only the Glucose-Secret indicator carries weight, so z = 1.
        let result = service.predict(&patient(130.0)).unwrap();
        assert_eq!(result.label, RiskLabel::Positive);
        assert!((result.probability_positive - sigmoid(1.0)).abs() < 1e-12);
    }

    #[test]
    fn probabilities_are_complementary_and_match_label() {
        let scaler = ScalingParameters::standard([120.0; 8], [10.0; 8]).unwrap();
        let service = RiskClassifier::new(store(scaler, one_hot(1), 0.0));

        let high = service.predict(&patient(150.0)).unwrap();
        assert_eq!(high.label, RiskLabel::Positive);
        assert!((high.probability_positive - sigmoid(3.0)).abs() < 1e-12);
        assert!((high.probability_negative + high.probability_positive - 1.0).abs() < 1e-9);

        let low = service.predict(&patient(90.0)).unwrap();
        assert_eq!(low.label, RiskLabel::Negative);
        assert!(low.probability_negative > low.probability_positive);
    }

    #[test]
    fn exact_tie_is_negative() {
        let service = RiskClassifier::new(store(
            ScalingParameters::identity(),
            vec![0.0; FEATURE_LEN],
            0.0,
        ));
        let result = service.predict(&patient(100.0)).unwrap();
        assert_eq!(result.probability_positive, 0.5);
        assert_eq!(result.label, RiskLabel::Negative);
    }

    #[test]
    fn predictions_are_deterministic() {
        let service = RiskClassifier::new(store(ScalingParameters::identity(), one_hot(5), -28.0));
        let first = service.predict(&patient(110.0)).unwrap();
        for _ in 0..10 {
            assert_eq!(service.predict(&patient(110.0)).unwrap(), first);
        }
    }

    #[test]
    fn invalid_input_surfaces_validation_error() {
        let service = RiskClassifier::new(store(ScalingParameters::identity(), one_hot(0), 0.0));
        let mut raw = patient(100.0);
        raw.bmi = Some(json!("heavy"));
        raw.age = None;
        match service.predict(&raw) {
            Err(RiskError::Validation(err)) => {
                assert_eq!(err.field_names(), vec!["BMI", "Age"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn predict_features_skips_validation() {
        let service = RiskClassifier::new(store(ScalingParameters::identity(), one_hot(0), -1.0));
        let input = ClinicalInput::new([3.0, 90.0, 60.0, 10.0, 0.0, 22.0, 0.2, 25.0]).unwrap();
        let result = service
            .predict_features(&FeatureVector::from_input(&input))
            .unwrap();
        assert!((result.probability_positive - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn label_serializes_as_word() {
        assert_eq!(serde_json::to_value(RiskLabel::Positive).unwrap(), json!("Positive"));
    }

    #[test]
    fn tree_ensemble_averages_leaf_distributions() {
        // Glucose 130 goes right in both stumps: (0.2 + 0.6) / 2 positive.
        let forest = stump_forest(&[
            (1, 120.0, [0.9, 0.1], [0.8, 0.2]),
            (1, 100.0, [1.0, 0.0], [0.4, 0.6]),
        ]);
        let service = RiskClassifier::new(store_with(ScalingParameters::identity(), forest));
        let result = service.predict(&patient(130.0)).unwrap();
        assert!((result.probability_positive - 0.4).abs() < 1e-12);
        assert_eq!(result.label, RiskLabel::Negative);
    }

    proptest! {
        #[test]
        fn logistic_output_is_a_distribution_with_argmax_label(
            values in proptest::array::uniform8(0.0f64..500.0),
            coefficients in proptest::collection::vec(-1.0f64..1.0, FEATURE_LEN),
            intercept in -5.0f64..5.0,
        ) {
            let service = RiskClassifier::new(store(
                ScalingParameters::identity(),
                coefficients,
                intercept,
            ));
            let input = ClinicalInput::new(values).unwrap();
            let result = service.predict_features(&FeatureVector::from_input(&input)).unwrap();
            assert_consistent(&result)?;
        }

        #[test]
        fn tree_ensemble_output_is_a_distribution_with_argmax_label(
            values in proptest::array::uniform8(0.0f64..500.0),
            stumps in proptest::collection::vec(
                (
                    0..FEATURE_LEN,
                    0.0f64..200.0,
                    proptest::array::uniform2(0.01f64..10.0),
                    proptest::array::uniform2(0.01f64..10.0),
                ),
                1..6,
            ),
        ) {
            let forest = stump_forest(&stumps);
            let service = RiskClassifier::new(store_with(ScalingParameters::identity(), forest));
            let input = ClinicalInput::new(values).unwrap();
            let result = service.predict_features(&FeatureVector::from_input(&input)).unwrap();
            assert_consistent(&result)?;
        }
    }
}
