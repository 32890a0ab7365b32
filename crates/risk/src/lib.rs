//! # DiaCare Risk
//!
//! Turns a clinical record into the 18-wide feature vector the classifier was
//! trained on and runs the stored classifier over it.
//!
//! ```text
//! RawClinicalInput ──validate──> ClinicalInput ──buckets──> FeatureVector
//!                                                              │
//!                                            scale raw[0..8] ──┤
//!                                                              └──> RiskResult
//! ```

mod error;
mod features;
mod input;
mod service;

pub use error::{Result, RiskError};
pub use features::{build_feature_vector, FeatureVector, Indicator};
pub use input::{
    ClinicalField, ClinicalInput, FieldIssue, FieldProblem, RawClinicalInput, ValidationError,
};
pub use service::{RiskClassifier, RiskLabel, RiskResult};
