use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pass keys from [`crate::PASSES`], run in this order.
    pub passes: Vec<String>,
    pub verify_after_each: bool,
    pub print_tree: bool,
    pub collect_stats: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            passes: crate::PASSES
                .iter()
                .map(|(key, _)| key.to_string())
                .collect(),
            verify_after_each: true,
            print_tree: false,
            collect_stats: false,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Invalid pipeline config {}", path.display()))?;
        Ok(config)
    }

    pub fn with_passes<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passes = keys.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_runs_every_registered_pass() {
        let config = PipelineConfig::default();
        assert_eq!(config.passes, vec!["Sv".to_string()]);
        assert!(config.verify_after_each);
        assert!(!config.print_tree);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{ "print_tree": true }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert!(config.print_tree);
        assert_eq!(config.passes, PipelineConfig::default().passes);
    }

    #[test]
    fn test_missing_config_file() {
        let err = PipelineConfig::load("/nonexistent/pipeline.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read pipeline config"));
    }
}
