use diacare_artifacts::schema::{RAW_COLUMNS, RAW_FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The eight raw clinical measurements, in training column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClinicalField {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    DiabetesPedigreeFunction,
    Age,
}

impl ClinicalField {
    pub const ALL: [ClinicalField; RAW_FEATURE_COUNT] = [
        ClinicalField::Pregnancies,
        ClinicalField::Glucose,
        ClinicalField::BloodPressure,
        ClinicalField::SkinThickness,
        ClinicalField::Insulin,
        ClinicalField::Bmi,
        ClinicalField::DiabetesPedigreeFunction,
        ClinicalField::Age,
    ];

    /// Position of the field in the feature vector.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Training column name, e.g. `BloodPressure`.
    pub const fn name(self) -> &'static str {
        RAW_COLUMNS[self.index()]
    }
}

impl fmt::Display for ClinicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ClinicalField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Clinical input as received on the wire; values are checked by [`ClinicalInput::try_from`].
///
/// Each field accepts its training column name or a snake_case alias. A JSON
/// `null` counts as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClinicalInput {
    #[serde(rename = "Pregnancies", alias = "pregnancies", default, skip_serializing_if = "Option::is_none")]
    pub pregnancies: Option<Value>,
    #[serde(rename = "Glucose", alias = "glucose", default, skip_serializing_if = "Option::is_none")]
    pub glucose: Option<Value>,
    #[serde(rename = "BloodPressure", alias = "blood_pressure", default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<Value>,
    #[serde(rename = "SkinThickness", alias = "skin_thickness", default, skip_serializing_if = "Option::is_none")]
    pub skin_thickness: Option<Value>,
    #[serde(rename = "Insulin", alias = "insulin", default, skip_serializing_if = "Option::is_none")]
    pub insulin: Option<Value>,
    #[serde(rename = "BMI", alias = "bmi", default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<Value>,
    #[serde(
        rename = "DiabetesPedigreeFunction",
        alias = "diabetes_pedigree_function",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub diabetes_pedigree_function: Option<Value>,
    #[serde(rename = "Age", alias = "age", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
}

impl RawClinicalInput {
    #[must_use]
    pub fn get(&self, field: ClinicalField) -> Option<&Value> {
        self.slot(field).as_ref()
    }

    pub fn set(&mut self, field: ClinicalField, value: impl Into<Value>) {
        *self.slot_mut(field) = Some(value.into());
    }

    #[must_use]
    pub fn with(mut self, field: ClinicalField, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    fn slot(&self, field: ClinicalField) -> &Option<Value> {
        match field {
            ClinicalField::Pregnancies => &self.pregnancies,
            ClinicalField::Glucose => &self.glucose,
            ClinicalField::BloodPressure => &self.blood_pressure,
            ClinicalField::SkinThickness => &self.skin_thickness,
            ClinicalField::Insulin => &self.insulin,
            ClinicalField::Bmi => &self.bmi,
            ClinicalField::DiabetesPedigreeFunction => &self.diabetes_pedigree_function,
            ClinicalField::Age => &self.age,
        }
    }

    fn slot_mut(&mut self, field: ClinicalField) -> &mut Option<Value> {
        match field {
            ClinicalField::Pregnancies => &mut self.pregnancies,
            ClinicalField::Glucose => &mut self.glucose,
            ClinicalField::BloodPressure => &mut self.blood_pressure,
            ClinicalField::SkinThickness => &mut self.skin_thickness,
            ClinicalField::Insulin => &mut self.insulin,
            ClinicalField::Bmi => &mut self.bmi,
            ClinicalField::DiabetesPedigreeFunction => &mut self.diabetes_pedigree_function,
            ClinicalField::Age => &mut self.age,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    NotNumeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: ClinicalField,
    pub problem: FieldProblem,
}

/// Every offending field of a clinical input, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid clinical input: {}", describe(.issues))]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    #[must_use]
    pub fn fields(&self) -> Vec<ClinicalField> {
        self.issues.iter().map(|issue| issue.field).collect()
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.issues.iter().map(|issue| issue.field.name()).collect()
    }
}

fn describe(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| match issue.problem {
            FieldProblem::Missing => format!("{} is missing", issue.field),
            FieldProblem::NotNumeric => format!("{} is not numeric", issue.field),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validated clinical measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClinicalInput {
    values: [f64; RAW_FEATURE_COUNT],
}

impl ClinicalInput {
    /// Values in [`ClinicalField::ALL`] order. Non-finite values are rejected.
    pub fn new(values: [f64; RAW_FEATURE_COUNT]) -> Result<Self, ValidationError> {
        let issues: Vec<FieldIssue> = ClinicalField::ALL
            .iter()
            .zip(values)
            .filter(|(_, value)| !value.is_finite())
            .map(|(field, _)| FieldIssue {
                field: *field,
                problem: FieldProblem::NotNumeric,
            })
            .collect();
        if issues.is_empty() {
            Ok(Self { values })
        } else {
            Err(ValidationError { issues })
        }
    }

    #[must_use]
    pub fn get(&self, field: ClinicalField) -> f64 {
        self.values[field.index()]
    }

    #[must_use]
    pub fn values(&self) -> &[f64; RAW_FEATURE_COUNT] {
        &self.values
    }
}

impl TryFrom<&RawClinicalInput> for ClinicalInput {
    type Error = ValidationError;

    fn try_from(raw: &RawClinicalInput) -> Result<Self, Self::Error> {
        let mut values = [0.0; RAW_FEATURE_COUNT];
        let mut issues = Vec::new();
        for field in ClinicalField::ALL {
            match coerce(raw.get(field)) {
                Ok(value) => values[field.index()] = value,
                Err(problem) => issues.push(FieldIssue { field, problem }),
            }
        }
        if issues.is_empty() {
            Ok(Self { values })
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// Numbers, or strings holding a number, that are finite.
fn coerce(value: Option<&Value>) -> Result<f64, FieldProblem> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(FieldProblem::Missing),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    parsed
        .filter(|value| value.is_finite())
        .ok_or(FieldProblem::NotNumeric)
}
