use diacare_artifacts::{ArtifactPaths, DEFAULT_ARTIFACT_DIR};
use diacare_recommend::{SelfExclusion, DEFAULT_RECOMMEND_LIMIT};
use std::path::Path;

/// Tunables that do not depend on where the artifacts live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub recommend_limit: usize,
    pub self_exclusion: SelfExclusion,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            recommend_limit: DEFAULT_RECOMMEND_LIMIT,
            self_exclusion: SelfExclusion::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub paths: ArtifactPaths,
    pub options: EngineOptions,
}

impl EngineConfig {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            options: EngineOptions::default(),
        }
    }

    /// Default artifact file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(ArtifactPaths::in_dir(dir))
    }

    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::in_dir(Path::new(DEFAULT_ARTIFACT_DIR))
    }
}
