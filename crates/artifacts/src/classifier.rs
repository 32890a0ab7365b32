use crate::error::{ArtifactError, ArtifactKind, Result};
use crate::schema::{feature_columns, ARTIFACT_SCHEMA_VERSION, FEATURE_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability pair produced by a binary classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassProbabilities {
    pub negative: f64,
    pub positive: f64,
}

impl ClassProbabilities {
    /// Argmax over `[negative, positive]`; an exact tie resolves to the first class.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.positive > self.negative
    }
}

/// Opaque positional predictor over the full feature vector.
pub trait BinaryClassifier: Send + Sync + fmt::Debug {
    /// Artifact kind, e.g. `logistic_regression`.
    fn kind(&self) -> &'static str;

    /// Number of features the classifier was trained on.
    fn input_len(&self) -> usize;

    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities>;
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PersistedClassifier {
    LogisticRegression {
        #[serde(default = "default_schema_version")]
        schema_version: u32,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        #[serde(default = "default_schema_version")]
        schema_version: u32,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        trees: Vec<PersistedTree>,
    },
}

#[derive(Debug, Deserialize)]
struct PersistedTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: [f64; 2],
    },
}

fn default_schema_version() -> u32 {
    ARTIFACT_SCHEMA_VERSION
}

/// Parses and validates a classifier artifact.
pub fn classifier_from_slice(bytes: &[u8]) -> Result<Box<dyn BinaryClassifier>> {
    let persisted: PersistedClassifier = serde_json::from_slice(bytes)
        .map_err(|err| ArtifactError::parse(ArtifactKind::Classifier, err))?;

    match persisted {
        PersistedClassifier::LogisticRegression {
            schema_version,
            feature_names,
            coefficients,
            intercept,
        } => {
            check_header(schema_version, feature_names.as_deref())?;
            Ok(Box::new(LogisticRegression::new(coefficients, intercept)?))
        }
        PersistedClassifier::TreeEnsemble {
            schema_version,
            feature_names,
            trees,
        } => {
            check_header(schema_version, feature_names.as_deref())?;
            let trees = trees
                .into_iter()
                .enumerate()
                .map(|(idx, tree)| DecisionTree::new(tree.nodes, FEATURE_LEN, idx))
                .collect::<Result<Vec<_>>>()?;
            Ok(Box::new(TreeEnsemble::new(trees, FEATURE_LEN)?))
        }
    }
}

fn check_header(schema_version: u32, feature_names: Option<&[String]>) -> Result<()> {
    if schema_version != ARTIFACT_SCHEMA_VERSION {
        return Err(ArtifactError::invalid(
            ArtifactKind::Classifier,
            format!("unsupported schema_version {schema_version} (expected {ARTIFACT_SCHEMA_VERSION})"),
        ));
    }
    if let Some(names) = feature_names {
        let matches = names.len() == FEATURE_LEN
            && names.iter().zip(feature_columns()).all(|(got, want)| got == want);
        if !matches {
            return Err(ArtifactError::invalid(
                ArtifactKind::Classifier,
                format!("feature_names do not match the training schema: {names:?}"),
            ));
        }
    }
    Ok(())
}

fn check_input(expected: usize, features: &[f64]) -> Result<()> {
    if features.len() != expected {
        return Err(ArtifactError::InvalidDimension {
            expected,
            actual: features.len(),
        });
    }
    if let Some(pos) = features.iter().position(|v| !v.is_finite()) {
        return Err(ArtifactError::Inference(format!(
            "feature {pos} is not finite"
        )));
    }
    Ok(())
}

/// `p_positive = sigmoid(w·x + b)`
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if coefficients.len() != FEATURE_LEN {
            return Err(ArtifactError::invalid(
                ArtifactKind::Classifier,
                format!(
                    "expected {FEATURE_LEN} coefficients, got {}",
                    coefficients.len()
                ),
            ));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::invalid(
                ArtifactKind::Classifier,
                "coefficients and intercept must be finite",
            ));
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    fn decision(&self, features: &[f64]) -> f64 {
        features
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.intercept
    }
}

impl BinaryClassifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn input_len(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities> {
        check_input(self.coefficients.len(), features)?;
        let z = self.decision(features);
        let positive = sigmoid(z);
        if !positive.is_finite() {
            return Err(ArtifactError::Inference(
                "decision function is not finite".to_string(),
            ));
        }
        Ok(ClassProbabilities {
            negative: 1.0 - positive,
            positive,
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// A single binary decision tree stored as a flat node array rooted at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn new(nodes: Vec<TreeNode>, input_len: usize, tree_idx: usize) -> Result<Self> {
        let invalid = |reason: String| {
            ArtifactError::invalid(ArtifactKind::Classifier, format!("tree {tree_idx}: {reason}"))
        };
        if nodes.is_empty() {
            return Err(invalid("has no nodes".to_string()));
        }
        for (idx, node) in nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= input_len {
                        return Err(invalid(format!(
                            "node {idx} splits on feature {feature} (input has {input_len})"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!("node {idx} threshold is not finite")));
                    }
                    // Children must come after their parent; this also rules out cycles.
                    for child in [*left, *right] {
                        if child <= idx || child >= nodes.len() {
                            return Err(invalid(format!(
                                "node {idx} has out-of-order child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    let total = value[0] + value[1];
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) || total <= 0.0 {
                        return Err(invalid(format!(
                            "leaf {idx} has invalid class weights {value:?}"
                        )));
                    }
                }
            }
        }
        Ok(Self { nodes })
    }

    fn leaf_distribution(&self, features: &[f64]) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => {
                    let total = value[0] + value[1];
                    return [value[0] / total, value[1] / total];
                }
            }
        }
    }
}

/// Forest of decision trees; class probabilities are averaged across trees.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    trees: Vec<DecisionTree>,
    input_len: usize,
}

impl TreeEnsemble {
    fn new(trees: Vec<DecisionTree>, input_len: usize) -> Result<Self> {
        if trees.is_empty() {
            return Err(ArtifactError::invalid(
                ArtifactKind::Classifier,
                "tree ensemble has no trees",
            ));
        }
        Ok(Self { trees, input_len })
    }
}

impl BinaryClassifier for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn predict_proba(&self, features: &[f64]) -> Result<ClassProbabilities> {
        check_input(self.input_len, features)?;
        let mut sum = [0.0f64; 2];
        for tree in &self.trees {
            let dist = tree.leaf_distribution(features);
            sum[0] += dist[0];
            sum[1] += dist[1];
        }
        let count = self.trees.len() as f64;
        Ok(ClassProbabilities {
            negative: sum[0] / count,
            positive: sum[1] / count,
        })
    }
}
