//! Model artifact resolution and device management for the Candle
//! digit classifier.

use candle_core::Device;
use digitsight_core::{Error, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default Hugging Face repository holding the pretrained checkpoint.
pub const DEFAULT_MODEL_REPO: &str = "prithivMLmods/Mnist-Digits-SigLIP2";

/// Configuration for loading the digit classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Where the model artifacts come from
    pub source: ModelSource,

    /// Device to run inference on
    pub device: DeviceType,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            source: ModelSource::default_hub(),
            device: DeviceType::Cpu,
        }
    }
}

/// Source location for model artifacts
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Load from a local directory containing `config.json` and
    /// `model.safetensors`
    LocalDir(PathBuf),

    /// Download from Hugging Face Hub
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
    },
}

impl ModelSource {
    /// The pretrained checkpoint used when nothing is configured.
    pub fn default_hub() -> Self {
        Self::HuggingFace {
            repo_id: DEFAULT_MODEL_REPO.to_string(),
            revision: None,
        }
    }

    /// Human-readable identifier for logs and the health endpoint.
    pub fn display_name(&self) -> String {
        match self {
            Self::LocalDir(path) => path.display().to_string(),
            Self::HuggingFace { repo_id, .. } => repo_id.clone(),
        }
    }
}

/// Device type for inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    #[default]
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize),
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        if s == "cpu" {
            return Ok(Self::Cpu);
        }
        let parse_index = |spec: &str| -> Result<usize> {
            spec.parse::<usize>()
                .map_err(|_| Error::config(format!("invalid device index in '{s}'")))
        };
        if let Some(idx) = s.strip_prefix("cuda:") {
            return Ok(Self::Cuda(parse_index(idx)?));
        }
        if s == "cuda" {
            return Ok(Self::Cuda(0));
        }
        if let Some(idx) = s.strip_prefix("metal:") {
            return Ok(Self::Metal(parse_index(idx)?));
        }
        if s == "metal" {
            return Ok(Self::Metal(0));
        }
        Err(Error::config(format!(
            "unknown device '{s}', expected cpu, cuda[:n], or metal[:n]"
        )))
    }
}

/// Create a Candle device from a device type
pub fn create_device(device_type: DeviceType) -> Result<Device> {
    match device_type {
        DeviceType::Cpu => Ok(Device::Cpu),
        DeviceType::Cuda(idx) => Device::new_cuda(idx)
            .map_err(|e| Error::model(format!("failed to create CUDA device {idx}: {e}"))),
        DeviceType::Metal(idx) => Device::new_metal(idx)
            .map_err(|e| Error::model(format!("failed to create Metal device {idx}: {e}"))),
    }
}

/// Resolved paths to the files that make up one model artifact.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    /// `config.json` with the vision tower hyperparameters
    pub config: PathBuf,

    /// `model.safetensors` checkpoint
    pub weights: PathBuf,

    /// `preprocessor_config.json`, if the artifact ships one
    pub preprocessor: Option<PathBuf>,
}

impl ModelArtifacts {
    /// Resolve artifact paths, downloading from the Hub when needed.
    ///
    /// Hub downloads go through hf-hub's own cache, so repeated starts
    /// do not re-fetch the checkpoint.
    pub fn resolve(source: &ModelSource) -> Result<Self> {
        match source {
            ModelSource::LocalDir(dir) => Self::from_local_dir(dir),
            ModelSource::HuggingFace { repo_id, revision } => {
                Self::from_hub(repo_id, revision.as_deref())
            }
        }
    }

    fn from_local_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::config(format!(
                "model directory not found: {}",
                dir.display()
            )));
        }
        let config = dir.join("config.json");
        let weights = dir.join("model.safetensors");
        for required in [&config, &weights] {
            if !required.exists() {
                return Err(Error::config(format!(
                    "missing model file: {}",
                    required.display()
                )));
            }
        }
        let preprocessor = dir.join("preprocessor_config.json");
        let preprocessor = preprocessor.exists().then_some(preprocessor);
        Ok(Self {
            config,
            weights,
            preprocessor,
        })
    }

    fn from_hub(repo_id: &str, revision: Option<&str>) -> Result<Self> {
        tracing::info!(repo = repo_id, "downloading model artifacts from Hugging Face Hub");

        let api = Api::new()
            .map_err(|e| Error::config(format!("failed to initialize Hugging Face API: {e}")))?;

        let repo = api.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            revision.unwrap_or("main").to_string(),
        ));

        let config = repo
            .get("config.json")
            .map_err(|e| Error::model(format!("failed to download config.json: {e}")))?;
        let weights = repo
            .get("model.safetensors")
            .map_err(|e| Error::model(format!("failed to download model.safetensors: {e}")))?;
        // Optional: older exports do not ship a preprocessor config.
        let preprocessor = repo.get("preprocessor_config.json").ok();

        Ok(Self {
            config,
            weights,
            preprocessor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_specs() {
        assert_eq!("cpu".parse::<DeviceType>().unwrap(), DeviceType::Cpu);
        assert_eq!("CUDA".parse::<DeviceType>().unwrap(), DeviceType::Cuda(0));
        assert_eq!("cuda:1".parse::<DeviceType>().unwrap(), DeviceType::Cuda(1));
        assert_eq!("metal:0".parse::<DeviceType>().unwrap(), DeviceType::Metal(0));
        assert!("tpu".parse::<DeviceType>().is_err());
        assert!("cuda:x".parse::<DeviceType>().is_err());
    }

    #[test]
    fn local_dir_must_exist() {
        let source = ModelSource::LocalDir("/definitely/not/a/real/dir".into());
        assert!(ModelArtifacts::resolve(&source).is_err());
    }

    #[test]
    fn local_dir_requires_config_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        // weights missing
        let source = ModelSource::LocalDir(dir.path().to_path_buf());
        let err = ModelArtifacts::resolve(&source).unwrap_err();
        assert!(err.to_string().contains("model.safetensors"));
    }
}
