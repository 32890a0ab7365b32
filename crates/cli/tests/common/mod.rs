use serde_json::json;
use std::fs;
use std::path::Path;

pub const DRUGS: [&str; 3] = ["Metformin", "Metoprolol", "Glipizide"];

const SIMILARITY: [[f64; 3]; 3] = [[1.0, 0.3, 0.8], [0.3, 1.0, 0.1], [0.8, 0.1, 1.0]];

/// Writes a three-drug artifact set under the default file names.
///
/// The classifier only looks at the "glucose above 126" indicator, so glucose
/// alone decides the label.
pub fn write_artifacts(dir: &Path) {
    let scaler = json!({
        "kind": "standard",
        "feature_names": [
            "Pregnancies", "Glucose", "BloodPressure", "SkinThickness",
            "Insulin", "BMI", "DiabetesPedigreeFunction", "Age"
        ],
        "mean": vec![0.0; 8],
        "scale": vec![1.0; 8],
    });
    let mut coefficients = vec![0.0; 18];
    coefficients[17] = 4.0;
    let classifier = json!({
        "kind": "logistic_regression",
        "coefficients": coefficients,
        "intercept": -2.0,
    });
    let catalog = json!([
        { "Drug Name": DRUGS[0], "Description": "Biguanide", "Side Effects": "Nausea", "Uses": "Type 2 diabetes" },
        { "Drug Name": DRUGS[1], "Description": "Beta blocker", "Side Effects": "Fatigue", "Uses": "Hypertension" },
        { "Drug Name": DRUGS[2], "Description": "Sulfonylurea", "Side Effects": "Hypoglycemia", "Uses": "Type 2 diabetes" },
    ]);

    let mut similarity = b"SIM1".to_vec();
    similarity.extend_from_slice(&3u32.to_le_bytes());
    for row in SIMILARITY {
        for value in row {
            similarity.extend_from_slice(&value.to_le_bytes());
        }
    }

    fs::write(dir.join("scaler.json"), scaler.to_string()).unwrap();
    fs::write(dir.join("classifier.json"), classifier.to_string()).unwrap();
    fs::write(dir.join("medicines.json"), catalog.to_string()).unwrap();
    fs::write(dir.join("similarity.bin"), similarity).unwrap();
}

pub fn patient(glucose: f64) -> serde_json::Value {
    json!({
        "Pregnancies": 2, "Glucose": glucose, "BloodPressure": 70, "SkinThickness": 20,
        "Insulin": 85, "BMI": 28.5, "DiabetesPedigreeFunction": 0.5, "Age": 35,
    })
}
