use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub similarity: SimilarityConfig,
    pub resize: ResizeConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Maximum number of differing hash bits for two images to count as similar.
    pub threshold: u32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: avghash::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ResizeConfig {
    /// Use the one-column-at-a-time resampler instead of the SIMD one.
    pub scalar: bool,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        // a fingerprint only has 64 bits
        if config.similarity.threshold > 64 {
            return Err(anyhow::anyhow!(
                "similarity threshold {} exceeds the 64 bits of a fingerprint",
                config.similarity.threshold
            ));
        }
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }
}
