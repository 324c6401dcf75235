//! Server configuration

use digitsight_classifier::{ClassifierConfig, DeviceType, ModelSource, DEFAULT_MODEL_REPO};
use digitsight_core::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hugging Face repository id of the digit checkpoint
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Checkpoint revision
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Local directory with model artifacts; takes precedence over the
    /// Hub repo when set
    #[serde(default)]
    pub model_dir: Option<PathBuf>,

    /// Inference device: cpu, cuda[:n], or metal[:n]
    #[serde(default = "default_device")]
    pub device: String,

    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::cli::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(repo) = &cli.model_repo {
            config.model_repo = repo.clone();
        }
        if let Some(revision) = &cli.revision {
            config.revision = revision.clone();
        }
        if let Some(dir) = &cli.model_dir {
            config.model_dir = Some(dir.clone());
        }
        if let Some(device) = &cli.device {
            config.device = device.clone();
        }
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }

        Ok(config)
    }

    /// Translate into the classifier crate's loading configuration.
    pub fn classifier_config(&self) -> Result<ClassifierConfig> {
        let source = match &self.model_dir {
            Some(dir) => ModelSource::LocalDir(dir.clone()),
            None => ModelSource::HuggingFace {
                repo_id: self.model_repo.clone(),
                revision: Some(self.revision.clone()),
            },
        };
        let device: DeviceType = self.device.parse()?;
        Ok(ClassifierConfig { source, device })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_repo: default_model_repo(),
            revision: default_revision(),
            model_dir: None,
            device: default_device(),
            listen: default_listen(),
            port: default_port(),
        }
    }
}

fn default_model_repo() -> String {
    DEFAULT_MODEL_REPO.to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8071
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_pretrained_checkpoint() {
        let config = ServerConfig::default();
        assert_eq!(config.model_repo, DEFAULT_MODEL_REPO);
        assert_eq!(config.port, 8071);
        assert_eq!(config.device, "cpu");
    }

    #[test]
    fn yaml_fields_override_defaults() {
        let config: ServerConfig =
            serde_yaml::from_str("model_repo: someone/some-model\nport: 9000\n").unwrap();
        assert_eq!(config.model_repo, "someone/some-model");
        assert_eq!(config.port, 9000);
        assert_eq!(config.revision, "main");
    }

    #[test]
    fn local_dir_takes_precedence_over_hub() {
        let config = ServerConfig {
            model_dir: Some("/models/digits".into()),
            ..Default::default()
        };
        let classifier = config.classifier_config().unwrap();
        assert!(matches!(classifier.source, ModelSource::LocalDir(_)));
    }

    #[test]
    fn bad_device_string_is_a_config_error() {
        let config = ServerConfig {
            device: "quantum".to_string(),
            ..Default::default()
        };
        assert!(config.classifier_config().is_err());
    }
}
