//! Static schema shared by the artifacts and the components that consume them.
//!
//! The classifier is positional: it sees an 18-wide vector whose meaning is
//! fixed by the column order below, which mirrors the training data frame.

pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

pub const RAW_FEATURE_COUNT: usize = 8;
pub const INDICATOR_COUNT: usize = 10;
pub const FEATURE_LEN: usize = RAW_FEATURE_COUNT + INDICATOR_COUNT;

pub const RAW_COLUMNS: [&str; RAW_FEATURE_COUNT] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

pub const INDICATOR_COLUMNS: [&str; INDICATOR_COUNT] = [
    "NewBMI_Obesity 1",
    "NewBMI_Obesity 2",
    "NewBMI_Obesity 3",
    "NewBMI_Overweight",
    "NewBMI_Underweight",
    "NewInsulinScore_Normal",
    "NewGlucose_Low",
    "NewGlucose_Normal",
    "NewGlucose_Overweight",
    "NewGlucose_Secret",
];

pub const CATALOG_NAME_COLUMN: &str = "Drug Name";
pub const CATALOG_DESCRIPTION_COLUMN: &str = "Description";
pub const CATALOG_SIDE_EFFECTS_COLUMN: &str = "Side Effects";
pub const CATALOG_USES_COLUMN: &str = "Uses";

/// Placeholder for catalog columns the artifact does not carry.
pub const MISSING_CELL: &str = "N/A";

/// Training column names in classifier input order.
pub fn feature_columns() -> impl Iterator<Item = &'static str> {
    RAW_COLUMNS.iter().chain(INDICATOR_COLUMNS.iter()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_columns_cover_raw_then_indicators() {
        let columns: Vec<_> = feature_columns().collect();
        assert_eq!(columns.len(), FEATURE_LEN);
        assert_eq!(columns[0], "Pregnancies");
        assert_eq!(columns[7], "Age");
        assert_eq!(columns[8], "NewBMI_Obesity 1");
        assert_eq!(columns[17], "NewGlucose_Secret");
    }
}
