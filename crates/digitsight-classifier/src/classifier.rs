//! Digit classifier trait and the SigLIP-backed implementation.

use crate::loader::{create_device, ClassifierConfig, ModelArtifacts};
use crate::preprocess::Preprocessor;
use crate::siglip::{SiglipClassificationModel, VisionConfig};
use async_trait::async_trait;
use candle_core::{DType, Device, D};
use candle_nn::VarBuilder;
use digitsight_core::{DigitScores, Error, Result, DIGIT_LABELS};
use image::DynamicImage;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Number of digit classes. The head dimension and the label table are
/// both fixed to this.
pub const NUM_CLASSES: usize = 10;

/// Result of classifying one image
#[derive(Debug, Clone)]
pub struct Classification {
    /// Probability per digit label, rounded to 3 decimals
    pub scores: DigitScores,

    /// Top-1 label
    pub label: String,

    /// Top-1 probability
    pub score: f32,

    /// Model identifier that produced this result
    pub model: String,

    /// Forward-pass latency in microseconds
    pub latency_us: u64,
}

/// Trait for digit classifiers
#[async_trait]
pub trait DigitClassifier: Send + Sync {
    /// Classify the given image into a distribution over "0".."9"
    async fn classify(&self, image: &DynamicImage) -> Result<Classification>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Shape of the checkpoint's `config.json` (the subset we consume).
#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    vision_config: Option<VisionConfig>,
    #[serde(default)]
    id2label: Option<BTreeMap<String, String>>,
}

struct Inner {
    model: SiglipClassificationModel,
    preprocessor: Preprocessor,
    device: Device,
    name: String,
}

impl Inner {
    /// The synchronous inference path: preprocess, forward, softmax,
    /// round, map to labels.
    fn classify_image(&self, image: &DynamicImage) -> Result<Classification> {
        let start = Instant::now();

        let pixel_values = self.preprocessor.preprocess(image, &self.device)?;

        let logits = self
            .model
            .forward(&pixel_values)
            .map_err(|e| Error::model(format!("forward pass failed: {e}")))?;

        let probs = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| Error::model(format!("softmax failed: {e}")))?;

        let probs: [f32; NUM_CLASSES] = probs.try_into().map_err(|v: Vec<f32>| {
            Error::shape(format!(
                "model produced {} class scores, expected {NUM_CLASSES}",
                v.len()
            ))
        })?;

        let scores = DigitScores::from_probabilities(probs);
        let (label, score) = scores.top();

        Ok(Classification {
            scores,
            label: label.to_string(),
            score,
            model: self.name.clone(),
            latency_us: start.elapsed().as_micros() as u64,
        })
    }
}

/// Candle-backed digit classifier using the pretrained SigLIP2 MNIST
/// checkpoint.
///
/// The weights are loaded once and shared read-only; `classify` runs
/// the blocking forward pass on the tokio blocking pool so async
/// request handling is never stalled.
pub struct SiglipDigitClassifier {
    inner: Arc<Inner>,
}

impl SiglipDigitClassifier {
    /// Load the classifier from configuration. Fails fast when the
    /// artifact is unavailable; callers treat this as fatal at startup.
    pub fn load(config: &ClassifierConfig) -> Result<Self> {
        let artifacts = ModelArtifacts::resolve(&config.source)?;
        let device = create_device(config.device)?;

        let raw = std::fs::read(&artifacts.config)?;
        let model_file: ModelFile = serde_json::from_slice(&raw)?;
        let vision_config = model_file.vision_config.unwrap_or_default();

        if let Some(id2label) = &model_file.id2label {
            if id2label.len() != NUM_CLASSES {
                return Err(Error::config(format!(
                    "checkpoint defines {} labels, expected {NUM_CLASSES} digits",
                    id2label.len()
                )));
            }
        }

        // Mmap is sound here: the checkpoint file is read-only for the
        // process lifetime.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[artifacts.weights.clone()], DType::F32, &device)
        }
        .map_err(|e| Error::model(format!("failed to load safetensors: {e}")))?;

        let model = SiglipClassificationModel::new(&vision_config, NUM_CLASSES, vb)
            .map_err(|e| Error::model(format!("failed to build model: {e}")))?;

        let preprocessor = match &artifacts.preprocessor {
            Some(path) => Preprocessor::from_file(path)?,
            None => Preprocessor::siglip_default(),
        };

        let name = config.source.display_name();
        tracing::info!(
            model = %name,
            hidden_size = vision_config.hidden_size,
            layers = vision_config.num_hidden_layers,
            "digit classifier loaded"
        );

        Ok(Self::from_parts(model, preprocessor, device, name))
    }

    /// Assemble a classifier from already-built parts. Useful for
    /// locally-constructed models and tests.
    pub fn from_parts(
        model: SiglipClassificationModel,
        preprocessor: Preprocessor,
        device: Device,
        name: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                model,
                preprocessor,
                device,
                name: name.into(),
            }),
        }
    }
}

#[async_trait]
impl DigitClassifier for SiglipDigitClassifier {
    async fn classify(&self, image: &DynamicImage) -> Result<Classification> {
        let inner = self.inner.clone();
        let image = image.clone();
        tokio::task::spawn_blocking(move || inner.classify_image(&image))
            .await
            .map_err(|e| Error::internal(format!("inference task failed: {e}")))?
    }

    fn name(&self) -> &str {
        &self.inner.name
    }
}

/// Sanity check that the fixed label table covers every class index.
pub fn label_for(index: usize) -> Option<&'static str> {
    DIGIT_LABELS.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_classifier() -> SiglipDigitClassifier {
        let cfg = VisionConfig {
            hidden_size: 32,
            intermediate_size: 64,
            num_hidden_layers: 2,
            num_attention_heads: 4,
            num_channels: 3,
            image_size: 32,
            patch_size: 16,
            layer_norm_eps: 1e-6,
        };
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = SiglipClassificationModel::new(&cfg, NUM_CLASSES, vb).unwrap();
        SiglipDigitClassifier::from_parts(
            model,
            Preprocessor::siglip_default(),
            Device::Cpu,
            "tiny-test-model",
        )
    }

    #[tokio::test]
    async fn all_black_image_yields_valid_distribution() {
        let classifier = tiny_classifier();
        let image = DynamicImage::new_rgb8(28, 28);

        let result = classifier.classify(&image).await.unwrap();

        let mut count = 0;
        for (_, prob) in result.scores.iter() {
            assert!((0.0..=1.0).contains(&prob));
            count += 1;
        }
        assert_eq!(count, 10);
        assert!((result.scores.sum() - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn grayscale_image_is_classified_without_error() {
        let classifier = tiny_classifier();
        let image = digitsight_core::image_from_luma(28, 28, vec![200u8; 28 * 28]).unwrap();

        let result = classifier.classify(&image).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn repeated_calls_are_deterministic() {
        let classifier = tiny_classifier();
        let image = digitsight_core::image_from_luma(28, 28, vec![37u8; 28 * 28]).unwrap();

        let first = classifier.classify(&image).await.unwrap();
        let second = classifier.classify(&image).await.unwrap();
        assert_eq!(first.scores, second.scores);
        assert_eq!(first.label, second.label);
    }

    #[test]
    fn label_table_is_the_identity_mapping() {
        for i in 0..NUM_CLASSES {
            assert_eq!(label_for(i), Some(i.to_string().as_str()));
        }
        assert_eq!(label_for(10), None);
    }
}
