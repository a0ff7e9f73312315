//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_RETRIEVAL__TOP_K`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub source_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { source_dir: "./data/source".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub models_dir: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            models_dir: "./models".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub dense_dir: String,
    pub sparse_path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            dense_dir: "./data/lancedb".to_string(),
            sparse_path: "./data/bm25_index.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_words: usize,
    pub similarity_threshold: f32,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_words: 220, similarity_threshold: 0.72 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub rrf_k: u32,
    pub max_context_chunks: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 6, rrf_k: 60, max_context_chunks: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankSettings {
    pub model: String,
}

impl Default for RerankSettings {
    fn default() -> Self {
        Self { model: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Typed view over every option the pipeline reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub rerank: RerankSettings,
    pub generator: GeneratorSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be positive".into()));
        }
        if self.retrieval.max_context_chunks == 0 {
            return Err(Error::InvalidConfig("retrieval.max_context_chunks must be positive".into()));
        }
        if self.chunking.max_words == 0 {
            return Err(Error::InvalidConfig("chunking.max_words must be positive".into()));
        }
        if !(-1.0..=1.0).contains(&self.chunking.similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "chunking.similarity_threshold must be within [-1, 1], got {}",
                self.chunking.similarity_threshold
            )));
        }
        if self.generator.timeout_secs == 0 {
            return Err(Error::InvalidConfig("generator.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn source_dir(&self) -> PathBuf {
        expand_path(&self.data.source_dir)
    }

    pub fn models_dir(&self) -> PathBuf {
        expand_path(&self.embedding.models_dir)
    }

    pub fn dense_dir(&self) -> PathBuf {
        expand_path(&self.index.dense_dir)
    }

    pub fn sparse_path(&self) -> PathBuf {
        expand_path(&self.index.sparse_path)
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Build from an explicit figment; defaults are layered underneath.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if matches!(env, "prod" | "production") && settings.embedding.model.trim().is_empty() {
            anyhow::bail!("embedding.model must be set in production");
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
