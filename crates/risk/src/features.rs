use crate::input::{ClinicalField, ClinicalInput, RawClinicalInput, ValidationError};
use diacare_artifacts::schema::{
    feature_columns, FEATURE_LEN, INDICATOR_COLUMNS, INDICATOR_COUNT, RAW_FEATURE_COUNT,
};
use serde::Serialize;
use std::fmt;

/// Binary bucket features derived from BMI, insulin and glucose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Indicator {
    BmiObesity1,
    BmiObesity2,
    BmiObesity3,
    BmiOverweight,
    BmiUnderweight,
    InsulinNormal,
    GlucoseLow,
    GlucoseNormal,
    GlucoseOverweight,
    GlucoseSecret,
}

impl Indicator {
    pub const ALL: [Indicator; INDICATOR_COUNT] = [
        Indicator::BmiObesity1,
        Indicator::BmiObesity2,
        Indicator::BmiObesity3,
        Indicator::BmiOverweight,
        Indicator::BmiUnderweight,
        Indicator::InsulinNormal,
        Indicator::GlucoseLow,
        Indicator::GlucoseNormal,
        Indicator::GlucoseOverweight,
        Indicator::GlucoseSecret,
    ];

    /// Position in the feature vector.
    pub const fn index(self) -> usize {
        RAW_FEATURE_COUNT + self as usize
    }

    /// Training column name, e.g. `NewBMI_Obesity 1`.
    pub const fn column(self) -> &'static str {
        INDICATOR_COLUMNS[self as usize]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Indicator::BmiObesity1 => "BMI-Obesity1",
            Indicator::BmiObesity2 => "BMI-Obesity2",
            Indicator::BmiObesity3 => "BMI-Obesity3",
            Indicator::BmiOverweight => "BMI-Overweight",
            Indicator::BmiUnderweight => "BMI-Underweight",
            Indicator::InsulinNormal => "Insulin-Normal",
            Indicator::GlucoseLow => "Glucose-Low",
            Indicator::GlucoseNormal => "Glucose-Normal",
            Indicator::GlucoseOverweight => "Glucose-Overweight",
            Indicator::GlucoseSecret => "Glucose-Secret",
        }
    }

    /// Threshold rule for this bucket.
    #[must_use]
    pub fn is_active(self, input: &ClinicalInput) -> bool {
        let bmi = input.get(ClinicalField::Bmi);
        let insulin = input.get(ClinicalField::Insulin);
        let glucose = input.get(ClinicalField::Glucose);
        match self {
            Indicator::BmiObesity1 => bmi > 29.9 && bmi <= 34.9,
            Indicator::BmiObesity2 => bmi > 34.9 && bmi <= 39.9,
            Indicator::BmiObesity3 => bmi > 39.9,
            Indicator::BmiOverweight => bmi > 24.9 && bmi <= 29.9,
            Indicator::BmiUnderweight => bmi < 18.5,
            Indicator::InsulinNormal => (16.0..=166.0).contains(&insulin),
            Indicator::GlucoseLow => glucose <= 70.0,
            Indicator::GlucoseNormal => glucose > 70.0 && glucose <= 99.0,
            Indicator::GlucoseOverweight => glucose > 99.0 && glucose <= 126.0,
            Indicator::GlucoseSecret => glucose > 126.0,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The 18 classifier inputs: raw fields in schema order, then indicators as 0/1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_LEN],
}

impl FeatureVector {
    #[must_use]
    pub fn from_input(input: &ClinicalInput) -> Self {
        let mut values = [0.0; FEATURE_LEN];
        values[..RAW_FEATURE_COUNT].copy_from_slice(input.values());
        for indicator in Indicator::ALL {
            if indicator.is_active(input) {
                values[indicator.index()] = 1.0;
            }
        }
        Self { values }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn raw(&self) -> [f64; RAW_FEATURE_COUNT] {
        let mut raw = [0.0; RAW_FEATURE_COUNT];
        raw.copy_from_slice(&self.values[..RAW_FEATURE_COUNT]);
        raw
    }

    #[must_use]
    pub fn indicators(&self) -> &[f64] {
        &self.values[RAW_FEATURE_COUNT..]
    }

    #[must_use]
    pub fn indicator(&self, indicator: Indicator) -> bool {
        self.values[indicator.index()] != 0.0
    }

    pub fn active_indicators(&self) -> impl Iterator<Item = Indicator> + '_ {
        Indicator::ALL
            .into_iter()
            .filter(move |indicator| self.indicator(*indicator))
    }

    /// `(training column, value)` pairs in classifier order.
    #[must_use]
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        feature_columns().zip(self.values).collect()
    }
}

/// Validates `raw` and assembles the ordered feature vector.
pub fn build_feature_vector(raw: &RawClinicalInput) -> Result<FeatureVector, ValidationError> {
    let input = ClinicalInput::try_from(raw)?;
    Ok(FeatureVector::from_input(&input))
}
