//! Settings of an extraction run.
//!
//! Settings come from a TOML file or from a [JsonMap] of overrides. Anything missing, or `null` in
//! the overrides, takes the value of [Settings::default].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::StoreConfig;
use crate::defaults::with_defaults_on_null;
use crate::utils::JsonMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hugging Face model id of the extraction model.
    pub model_name: String,
    pub model_size: String,
    /// Only load model files already in the local Hugging Face cache.
    pub hf_local_files_only: bool,
    /// Tokens added to the tokenizer vocabulary on top of the pretrained ones.
    pub num_added_tokens: usize,
    pub answer_perplexities: StoreConfig,
    pub answer_cache: StoreConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_name: "huggyllama/llama-30b".to_string(),
            model_size: "30B".to_string(),
            hf_local_files_only: false,
            num_added_tokens: 0,
            answer_perplexities: StoreConfig::at("answer_perplexities"),
            answer_cache: StoreConfig::at("answers"),
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read settings from {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Build settings from named overrides; absent or `null` entries take their default.
    pub fn from_overrides(overrides: JsonMap) -> Result<Self> {
        let defaults = match serde_json::to_value(Self::default())? {
            Value::Object(map) => map,
            other => anyhow::bail!("settings serialized to {} instead of an object", other),
        };
        let merged = with_defaults_on_null(overrides, &defaults);
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use serde_json::json;
    use super::Settings;

    #[test]
    fn test_toml_partial() {
        let settings = Settings::from_toml_str(r#"
            model_size = "7B"
            hf_local_files_only = true

            [answer_cache]
            path = "/tmp/answers"

            [answer_perplexities]
            path = "/tmp/answer_perplexities"
            sync_on_write = false
        "#).unwrap();
        assert_eq!("7B", settings.model_size);
        assert!(settings.hf_local_files_only);
        assert_eq!("huggyllama/llama-30b", settings.model_name);
        assert_eq!(PathBuf::from("/tmp/answers"), settings.answer_cache.path);
        assert!(settings.answer_cache.sync_on_write);
        assert_eq!(PathBuf::from("/tmp/answer_perplexities"), settings.answer_perplexities.path);
        assert!(!settings.answer_perplexities.sync_on_write);
    }

    #[test]
    fn test_overrides_with_nulls() {
        let overrides = json!({"model_name": null, "num_added_tokens": 1}).as_object().unwrap().clone();
        let settings = Settings::from_overrides(overrides).unwrap();
        assert_eq!(Settings { num_added_tokens: 1, ..Settings::default() }, settings);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/chipprompt.toml").unwrap_err();
        assert!(err.to_string().contains("cannot read settings"));
    }
}
