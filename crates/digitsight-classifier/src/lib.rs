//! Digitsight Classifier
//!
//! Candle-based inference wrapper around the pretrained SigLIP2 MNIST
//! digit checkpoint. The wrapper owns exactly the glue the system
//! needs: artifact resolution (local directory or Hugging Face Hub),
//! safetensors loading, image preprocessing matched to the artifact's
//! processor config, the forward pass, softmax normalization, and the
//! fixed index-to-label mapping.
//!
//! The model is loaded once at startup and shared read-only across
//! requests; inference itself is a blocking CPU computation executed
//! on the tokio blocking pool.

pub mod classifier;
pub mod loader;
pub mod preprocess;
pub mod siglip;

pub use classifier::{label_for, Classification, DigitClassifier, SiglipDigitClassifier, NUM_CLASSES};
pub use loader::{
    create_device, ClassifierConfig, DeviceType, ModelArtifacts, ModelSource, DEFAULT_MODEL_REPO,
};
pub use preprocess::Preprocessor;
pub use siglip::{SiglipClassificationModel, VisionConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Classification, DigitClassifier, SiglipDigitClassifier};
    pub use crate::loader::{ClassifierConfig, DeviceType, ModelSource};
}
