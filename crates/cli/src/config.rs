use anyhow::{anyhow, Context as AnyhowContext, Result};
use diacare_engine::{
    ArtifactPaths, EngineConfig, EngineOptions, SelfExclusion, DEFAULT_ARTIFACT_DIR,
    DEFAULT_CATALOG_FILE, DEFAULT_CLASSIFIER_FILE, DEFAULT_SCALER_FILE, DEFAULT_SIMILARITY_FILE,
};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub(crate) const CONFIG_ENV: &str = "DIACARE_CONFIG";
pub(crate) const ARTIFACT_DIR_ENV: &str = "DIACARE_ARTIFACT_DIR";
pub(crate) const AUTH_TOKEN_ENV: &str = "DIACARE_AUTH_TOKEN";
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:7700";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    artifact_dir: Option<PathBuf>,
    #[serde(default)]
    artifacts: RawArtifactFiles,
    #[serde(default)]
    recommend: RawRecommend,
    #[serde(default)]
    server: RawServer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArtifactFiles {
    #[serde(default)]
    scaler: Option<PathBuf>,
    #[serde(default)]
    classifier: Option<PathBuf>,
    #[serde(default)]
    similarity: Option<PathBuf>,
    #[serde(default)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecommend {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    self_exclusion: Option<SelfExclusion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServer {
    #[serde(default)]
    bind: Option<String>,
    #[serde(default)]
    auth_token: Option<String>,
}

/// Environment overrides; empty variables count as unset.
#[derive(Debug, Default)]
struct EnvLayer {
    artifact_dir: Option<PathBuf>,
    auth_token: Option<String>,
}

impl EnvLayer {
    fn from_process() -> Self {
        Self::from_vars(
            std::env::var_os(ARTIFACT_DIR_ENV),
            std::env::var(AUTH_TOKEN_ENV).ok(),
        )
    }

    fn from_vars(artifact_dir: Option<OsString>, auth_token: Option<String>) -> Self {
        Self {
            artifact_dir: artifact_dir
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
        }
    }
}

/// Effective settings after layering defaults, config file, environment and flags.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AppConfig {
    pub artifact_dir: PathBuf,
    pub scaler: PathBuf,
    pub classifier: PathBuf,
    pub similarity: PathBuf,
    pub catalog: PathBuf,
    pub options: EngineOptions,
    pub bind: String,
    pub auth_token: Option<String>,
    pub source: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            scaler: PathBuf::from(DEFAULT_SCALER_FILE),
            classifier: PathBuf::from(DEFAULT_CLASSIFIER_FILE),
            similarity: PathBuf::from(DEFAULT_SIMILARITY_FILE),
            catalog: PathBuf::from(DEFAULT_CATALOG_FILE),
            options: EngineOptions::default(),
            bind: DEFAULT_BIND.to_string(),
            auth_token: None,
            source: None,
        }
    }
}

impl AppConfig {
    /// Resolves the process configuration from `--config`/`--artifact-dir` and the environment.
    pub(crate) fn resolve(config_flag: Option<&Path>, artifact_dir_flag: Option<&Path>) -> Result<Self> {
        let config_path = config_flag
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        Self::layered(
            config_path.as_deref(),
            EnvLayer::from_process(),
            artifact_dir_flag.map(Path::to_path_buf),
        )
    }

    fn layered(
        config_path: Option<&Path>,
        env: EnvLayer,
        flag_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = config_path {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let raw = parse_raw(&bytes)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            config.apply(raw)?;
            config.source = Some(path.to_path_buf());
        }
        if let Some(dir) = env.artifact_dir {
            config.artifact_dir = dir;
        }
        if let Some(token) = env.auth_token {
            config.auth_token = Some(token);
        }
        if let Some(dir) = flag_dir {
            config.artifact_dir = dir;
        }
        log::debug!(
            "config: artifact_dir={} source={:?}",
            config.artifact_dir.display(),
            config.source
        );
        Ok(config)
    }

    fn apply(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(dir) = raw.artifact_dir {
            self.artifact_dir = dir;
        }
        let files = raw.artifacts;
        if let Some(file) = files.scaler {
            self.scaler = file;
        }
        if let Some(file) = files.classifier {
            self.classifier = file;
        }
        if let Some(file) = files.similarity {
            self.similarity = file;
        }
        if let Some(file) = files.catalog {
            self.catalog = file;
        }
        if let Some(limit) = raw.recommend.limit {
            if limit == 0 {
                anyhow::bail!("recommend.limit must be at least 1");
            }
            self.options.recommend_limit = limit;
        }
        if let Some(policy) = raw.recommend.self_exclusion {
            self.options.self_exclusion = policy;
        }
        if let Some(bind) = raw.server.bind {
            self.bind = bind;
        }
        if let Some(token) = raw.server.auth_token {
            if token.trim().is_empty() {
                anyhow::bail!("server.auth_token must not be blank");
            }
            self.auth_token = Some(token);
        }
        Ok(())
    }

    pub(crate) fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::resolve(
            &self.artifact_dir,
            &self.scaler,
            &self.classifier,
            &self.similarity,
            &self.catalog,
        )
    }

    pub(crate) fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.artifact_paths()).with_options(self.options)
    }
}

/// JSON first, TOML as a fallback.
fn parse_raw(bytes: &[u8]) -> Result<RawConfig> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                anyhow!("Config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}")
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| anyhow!("Failed to convert TOML config to JSON: {err}"))?
        }
    };
    serde_json::from_value(value).map_err(|err| anyhow!("Config parse error: {err}"))
}
