use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    #[serde(default)]
    pub categorize: CategorizeConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Directory the acquisition pipeline drops product JSON files into.
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategorizeConfig {
    /// Products written per transaction. One bad product never fails a
    /// batch; a failed write rolls the whole batch back.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for CategorizeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Weight for query tokens matching curated RAG keywords.
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    /// Weight for query tokens matching raw title/description text.
    #[serde(default = "default_fulltext_weight")]
    pub fulltext_weight: f64,
    /// Minimum combined score for a row to appear in non-empty-query results.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_candidate_k")]
    pub candidate_k: i64,
    #[serde(default = "default_final_limit")]
    pub final_limit: i64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            keyword_weight: default_keyword_weight(),
            fulltext_weight: default_fulltext_weight(),
            min_score: default_min_score(),
            candidate_k: default_candidate_k(),
            final_limit: default_final_limit(),
        }
    }
}

fn default_keyword_weight() -> f64 {
    2.0
}
fn default_fulltext_weight() -> f64 {
    1.0
}
fn default_min_score() -> f64 {
    1.0
}
fn default_candidate_k() -> i64 {
    80
}
fn default_final_limit() -> i64 {
    12
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.categorize.batch_size == 0 {
        anyhow::bail!("categorize.batch_size must be > 0");
    }

    if config.retrieval.final_limit < 1 {
        anyhow::bail!("retrieval.final_limit must be >= 1");
    }

    if config.retrieval.candidate_k < 1 {
        anyhow::bail!("retrieval.candidate_k must be >= 1");
    }

    if config.retrieval.keyword_weight <= 0.0 || config.retrieval.fulltext_weight <= 0.0 {
        anyhow::bail!("retrieval weights must be > 0");
    }

    if config.retrieval.keyword_weight < config.retrieval.fulltext_weight {
        anyhow::bail!(
            "retrieval.keyword_weight must be >= retrieval.fulltext_weight (curated keywords outrank raw text)"
        );
    }

    if config.retrieval.min_score < 0.0 {
        anyhow::bail!("retrieval.min_score must be >= 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_bias_keywords_over_fulltext() {
        let retrieval = RetrievalConfig::default();
        assert!(retrieval.keyword_weight > retrieval.fulltext_weight);
    }

    #[test]
    fn test_minimal_config_parses() {
        let config: Config = toml::from_str("[db]\npath = \"data/tilebase.sqlite\"\n").unwrap();
        assert_eq!(config.categorize.batch_size, 100);
        assert_eq!(config.retrieval.final_limit, 12);
        assert!(config.feed.is_none());
    }
}
