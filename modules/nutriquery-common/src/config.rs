use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{NutriQueryError, Result};
use crate::file_config::{load_config, FileConfig};

/// Application configuration: secrets from the environment, tunables from the
/// optional TOML file, with env vars taking precedence over the file.
#[derive(Clone)]
pub struct AppConfig {
    // AI / LLM
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub max_prompt_rows: usize,

    // Data
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("openai_api_key", &preview(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("max_prompt_rows", &self.max_prompt_rows)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl AppConfig {
    /// Load `.env`, the TOML file (explicit path, else `NUTRIQUERY_CONFIG`),
    /// and the environment. A missing `OPENAI_API_KEY` is fatal.
    pub fn from_env(config_path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = load_file_config(config_path, env_lookup)?;
        let config = Self::from_sources(file, env_lookup)?;
        config.log_keys();
        Ok(config)
    }

    /// Resolve only the data directory. Ingest commands need no API key.
    pub fn data_dir_from_env(config_path: Option<&Path>) -> Result<PathBuf> {
        dotenvy::dotenv().ok();
        let file = load_file_config(config_path, env_lookup)?;
        Ok(resolve_data_dir(&file, env_lookup))
    }

    pub fn from_sources(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                NutriQueryError::Config(
                    "OPENAI_API_KEY not found. Set it in the environment or a .env file."
                        .to_string(),
                )
            })?;

        let data_dir = resolve_data_dir(&file, &lookup);
        let generation = file.generation;

        Ok(Self {
            openai_api_key,
            openai_model: lookup("OPENAI_MODEL")
                .filter(|m| !m.is_empty())
                .unwrap_or(generation.model),
            openai_base_url: lookup("OPENAI_BASE_URL").filter(|u| !u.is_empty()),
            max_tokens: generation.max_tokens,
            request_timeout: Duration::from_secs(generation.request_timeout_secs.max(1)),
            max_prompt_rows: generation.max_prompt_rows,
            data_dir,
        })
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        tracing::info!("  OPENAI_MODEL: {}", self.openai_model);
        tracing::info!(
            "  OPENAI_BASE_URL: {}",
            self.openai_base_url.as_deref().unwrap_or("<default>")
        );
        tracing::info!("  data dir: {}", self.data_dir.display());
    }
}

/// First five chars of a secret plus its length.
fn preview(val: &str) -> String {
    if val.is_empty() {
        return "<not set>".to_string();
    }
    let head: String = val.chars().take(5).collect();
    format!("{}...({} chars)", head, val.chars().count())
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_file_config(
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<FileConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| lookup("NUTRIQUERY_CONFIG").filter(|p| !p.is_empty()).map(PathBuf::from));

    match path {
        Some(path) => load_config(&path),
        None => Ok(FileConfig::default()),
    }
}

fn resolve_data_dir(file: &FileConfig, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("NUTRIQUERY_DATA_DIR")
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| file.data.dir.clone())
}
