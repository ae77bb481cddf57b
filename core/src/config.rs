use crate::rng::RngAlgorithm;
use serde::{Deserialize, Serialize};

fn default_min_count() -> i64 {
    1
}

fn default_max_count() -> i64 {
    3
}

fn default_choice_labels() -> Vec<String> {
    vec!["Yes".to_string(), "No".to_string()]
}

fn default_fallback_category() -> String {
    "General".to_string()
}

/// Deployment-wide engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Generator behind every DailyRng. Fixed for the life of a deployment.
    #[serde(default)]
    pub rng_algorithm: RngAlgorithm,
    /// Used when a rule draft leaves min_count out.
    #[serde(default = "default_min_count")]
    pub default_min_count: i64,
    /// Used when a rule draft leaves max_count out.
    #[serde(default = "default_max_count")]
    pub default_max_count: i64,
    /// Labels stored for choice prompts created without any.
    #[serde(default = "default_choice_labels")]
    pub default_choice_labels: Vec<String>,
    /// Legacy category name stamped on prompts created without a category.
    #[serde(default = "default_fallback_category")]
    pub fallback_category_name: String,
    /// Minutes east of UTC used to decide "today" when no date is given.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rng_algorithm: RngAlgorithm::default(),
            default_min_count: default_min_count(),
            default_max_count: default_max_count(),
            default_choice_labels: default_choice_labels(),
            fallback_category_name: default_fallback_category(),
            utc_offset_minutes: 0,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing keys fall back to their defaults.
    /// In tests, use EngineConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        if config.default_min_count > config.default_max_count {
            anyhow::bail!(
                "default_min_count ({}) exceeds default_max_count ({})",
                config.default_min_count,
                config.default_max_count
            );
        }
        Ok(config)
    }
}
