use crate::config::{EngineConfig, EngineOptions};
use crate::error::{EngineError, Result};
use diacare_artifacts::schema::FEATURE_LEN;
use diacare_artifacts::ArtifactStore;
use diacare_protocol::{
    Capabilities, CapabilitiesArtifacts, CapabilitiesServer, CAPABILITIES_SCHEMA_VERSION,
};
use diacare_recommend::{FuzzyNames, PrefixSearch, Recommendation, Recommender};
use diacare_risk::{build_feature_vector, FeatureVector, RawClinicalInput, RiskClassifier, RiskResult};
use std::sync::Arc;

/// Actions the engine answers through the command surface.
pub const ACTIONS: [&str; 4] = ["predict", "recommend", "suggest", "capabilities"];

/// Cheap-to-clone handle over the loaded artifacts.
///
/// Every operation is a read over immutable state, so one engine can serve any
/// number of threads without locking.
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    store: Arc<ArtifactStore>,
    options: EngineOptions,
    risk: RiskClassifier,
    recommender: Recommender,
    prefix: PrefixSearch,
    fuzzy: FuzzyNames,
}

impl Engine {
    /// Loads every artifact named by `config`. Any artifact failure is fatal.
    pub async fn load(config: &EngineConfig) -> Result<Self> {
        let store = ArtifactStore::load(&config.paths)
            .await
            .map_err(EngineError::ArtifactUnavailable)?;
        Ok(Self::from_store(Arc::new(store), config.options))
    }

    pub fn from_store(store: Arc<ArtifactStore>, options: EngineOptions) -> Self {
        let recommender = Recommender::new(store.clone())
            .with_limit(options.recommend_limit)
            .with_self_exclusion(options.self_exclusion);
        let inner = EngineInner {
            risk: RiskClassifier::new(store.clone()),
            prefix: PrefixSearch::new(store.catalog()),
            fuzzy: FuzzyNames::new(store.catalog()),
            recommender,
            options,
            store,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.inner.store
    }

    pub fn options(&self) -> EngineOptions {
        self.inner.options
    }

    pub fn predict(&self, input: &RawClinicalInput) -> Result<RiskResult> {
        Ok(self.inner.risk.predict(input)?)
    }

    /// Validated, unscaled feature vector for `input`.
    pub fn features(&self, input: &RawClinicalInput) -> Result<FeatureVector> {
        Ok(build_feature_vector(input)?)
    }

    /// The exact vector handed to the classifier.
    pub fn scaled_features(&self, features: &FeatureVector) -> [f64; FEATURE_LEN] {
        self.inner.risk.scaled_features(features)
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Result<RiskResult> {
        Ok(self.inner.risk.predict_features(features)?)
    }

    pub fn recommend(&self, name: &str) -> Result<Vec<Recommendation>> {
        Ok(self.inner.recommender.recommend(name)?)
    }

    pub fn recommend_with_limit(&self, name: &str, limit: usize) -> Result<Vec<Recommendation>> {
        Ok(self.inner.recommender.recommend_with_limit(name, limit)?)
    }

    /// Catalog names starting with `query`, case-insensitive, in catalog order.
    pub fn suggest(&self, query: &str) -> Vec<String> {
        self.inner.prefix.suggest(query)
    }

    /// Fuzzy "did you mean" candidates for a name that did not match exactly.
    pub fn closest_names(&self, query: &str, limit: usize) -> Vec<String> {
        self.inner.fuzzy.closest(query, limit)
    }

    pub fn capabilities(&self) -> Capabilities {
        let store = self.store();
        Capabilities {
            schema_version: CAPABILITIES_SCHEMA_VERSION,
            server: CapabilitiesServer {
                name: "diacare".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            actions: ACTIONS.iter().map(|a| a.to_string()).collect(),
            artifacts: CapabilitiesArtifacts {
                catalog_size: store.catalog().len(),
                feature_len: store.classifier().input_len(),
                scaler: store.scaler().kind().to_string(),
                classifier: store.classifier().kind().to_string(),
                recommend_limit: self.inner.options.recommend_limit,
                self_exclusion: self.inner.options.self_exclusion.to_string(),
            },
        }
    }
}
