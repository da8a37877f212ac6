use crate::error::{PyjuterError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

/// Configuration for pyjuter, stored in .pyjuter/config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PyjuterConfig {
    /// Language name written to `language_info` of produced notebooks
    #[serde(default = "default_language")]
    pub language: String,

    /// Kernel used when a produced notebook has no kernelspec of its own
    #[serde(default = "default_kernel_name")]
    pub kernel_name: String,

    #[serde(default = "default_kernel_display_name")]
    pub kernel_display_name: String,

    /// Emit the module registry setup cell even when nothing is inlined
    #[serde(default)]
    pub always_bootstrap: bool,
}

fn default_language() -> String {
    "python".to_string()
}

fn default_kernel_name() -> String {
    "python3".to_string()
}

fn default_kernel_display_name() -> String {
    "Python 3".to_string()
}

impl Default for PyjuterConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            kernel_name: default_kernel_name(),
            kernel_display_name: default_kernel_display_name(),
            always_bootstrap: false,
        }
    }
}

impl PyjuterConfig {
    pub const KEYS: &'static [&'static str] = &[
        "language",
        "kernel-name",
        "kernel-display-name",
        "always-bootstrap",
    ];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: PyjuterConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load the first config found among `dirs`, or defaults.
    pub fn load_first<P: AsRef<Path>>(dirs: &[P]) -> Result<Self> {
        for dir in dirs {
            if dir.as_ref().join(CONFIG_FILENAME).exists() {
                return Self::load(dir);
            }
        }
        Ok(Self::default())
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "language" => Some(self.language.clone()),
            "kernel-name" => Some(self.kernel_name.clone()),
            "kernel-display-name" => Some(self.kernel_display_name.clone()),
            "always-bootstrap" => Some(self.always_bootstrap.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "always-bootstrap" => {
                self.always_bootstrap = value.parse().map_err(|_| {
                    PyjuterError::Api(format!(
                        "always-bootstrap expects true or false, got '{}'",
                        value
                    ))
                })?;
            }
            "language" | "kernel-name" | "kernel-display-name" if value.is_empty() => {
                return Err(PyjuterError::Api(format!("{} cannot be empty", key)));
            }
            "language" => self.language = value.to_string(),
            "kernel-name" => self.kernel_name = value.to_string(),
            "kernel-display-name" => self.kernel_display_name = value.to_string(),
            _ => return Err(PyjuterError::Api(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }

    /// Fill in notebook metadata this config provides defaults for.
    ///
    /// Keys already present are left alone.
    pub fn apply_defaults(&self, metadata: &mut Map<String, Value>) {
        metadata
            .entry("kernelspec")
            .or_insert_with(|| {
                json!({
                    "name": self.kernel_name,
                    "display_name": self.kernel_display_name,
                    "language": self.language,
                })
            });
        metadata
            .entry("language_info")
            .or_insert_with(|| json!({ "name": self.language }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PyjuterConfig::default();
        assert_eq!(config.language, "python");
        assert_eq!(config.kernel_name, "python3");
        assert!(!config.always_bootstrap);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = PyjuterConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, PyjuterConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join(".pyjuter");

        let mut config = PyjuterConfig::default();
        config.set("always-bootstrap", "true").unwrap();
        config.set("kernel-name", "py311").unwrap();
        config.save(&dir).unwrap();

        let loaded = PyjuterConfig::load(&dir).unwrap();
        assert!(loaded.always_bootstrap);
        assert_eq!(loaded.kernel_name, "py311");
    }

    #[test]
    fn test_load_first_prefers_earlier_dirs() {
        let project = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        let mut global_config = PyjuterConfig::default();
        global_config.set("language", "python3.12").unwrap();
        global_config.save(global.path()).unwrap();

        let loaded = PyjuterConfig::load_first(&[project.path(), global.path()]).unwrap();
        assert_eq!(loaded.language, "python3.12");

        PyjuterConfig::default().save(project.path()).unwrap();
        let loaded = PyjuterConfig::load_first(&[project.path(), global.path()]).unwrap();
        assert_eq!(loaded.language, "python");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: PyjuterConfig = serde_json::from_str(r#"{"always_bootstrap": true}"#).unwrap();
        assert!(config.always_bootstrap);
        assert_eq!(config.kernel_display_name, "Python 3");
    }

    #[test]
    fn test_get_and_set() {
        let mut config = PyjuterConfig::default();
        assert_eq!(config.get("always-bootstrap").as_deref(), Some("false"));
        assert!(config.get("nope").is_none());

        assert!(config.set("always-bootstrap", "maybe").is_err());
        assert!(config.set("language", "  ").is_err());
        assert!(config.set("nope", "x").is_err());

        config.set("kernel-display-name", "Python (venv)").unwrap();
        assert_eq!(
            config.get("kernel-display-name").as_deref(),
            Some("Python (venv)")
        );
    }

    #[test]
    fn test_apply_defaults_keeps_existing_keys() {
        let config = PyjuterConfig::default();
        let mut metadata = Map::new();
        metadata.insert("language_info".into(), json!({"name": "python", "version": "3.12"}));
        config.apply_defaults(&mut metadata);

        assert_eq!(metadata["language_info"]["version"], "3.12");
        assert_eq!(metadata["kernelspec"]["name"], "python3");
    }
}
