//! Image preprocessing matching the checkpoint's paired processor.
//!
//! The resize/rescale/normalize parameters are owned by the external
//! artifact: they are read from its `preprocessor_config.json` and only
//! fall back to the SigLIP defaults (224x224, mean 0.5, std 0.5) when
//! that file is absent. Inventing a different normalization here would
//! silently break the model's accuracy.

use candle_core::{DType, Device, Tensor};
use digitsight_core::{to_rgb, Error, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SizeSpec {
    height: u32,
    width: u32,
}

/// On-disk shape of `preprocessor_config.json` (the subset we consume).
#[derive(Debug, Deserialize)]
struct ProcessorFile {
    #[serde(default)]
    image_mean: Option<[f32; 3]>,
    #[serde(default)]
    image_std: Option<[f32; 3]>,
    #[serde(default)]
    size: Option<SizeSpec>,
}

/// Converts a decoded image into the (1, 3, H, W) float tensor the
/// model expects.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    width: u32,
    height: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Preprocessor {
    /// SigLIP defaults: 224x224, rescale 1/255, normalize (x-0.5)/0.5.
    pub fn siglip_default() -> Self {
        Self {
            width: 224,
            height: 224,
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
        }
    }

    /// Read the processor parameters shipped with the artifact.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)?;
        let file: ProcessorFile = serde_json::from_slice(&raw)?;
        let mut processor = Self::siglip_default();
        if let Some(size) = file.size {
            if size.height == 0 || size.width == 0 {
                return Err(Error::config(format!(
                    "invalid processor size {}x{}",
                    size.width, size.height
                )));
            }
            processor.height = size.height;
            processor.width = size.width;
        }
        if let Some(mean) = file.image_mean {
            processor.mean = mean;
        }
        if let Some(std) = file.image_std {
            processor.std = std;
        }
        Ok(processor)
    }

    /// Target (width, height) of the resize step.
    pub fn target_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Coerce to RGB, resize, rescale to [0,1], and normalize.
    pub fn preprocess(&self, image: &DynamicImage, device: &Device) -> Result<Tensor> {
        let rgb = to_rgb(image);
        let resized = image::imageops::resize(&rgb, self.width, self.height, FilterType::Triangle);
        let data = resized.into_raw();

        let to_model_err = |e: candle_core::Error| Error::model(format!("preprocess: {e}"));

        let tensor = Tensor::from_vec(
            data,
            (self.height as usize, self.width as usize, 3),
            device,
        )
        .map_err(to_model_err)?
        .permute((2, 0, 1))
        .map_err(to_model_err)?;

        let scaled = (tensor.to_dtype(DType::F32).map_err(to_model_err)? / 255.0)
            .map_err(to_model_err)?;
        let mean = Tensor::new(&self.mean, device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(to_model_err)?;
        let std = Tensor::new(&self.std, device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(to_model_err)?;

        scaled
            .broadcast_sub(&mean)
            .and_then(|t| t.broadcast_div(&std))
            .and_then(|t| t.unsqueeze(0))
            .map_err(to_model_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_batched_chw_tensor() {
        let pre = Preprocessor::siglip_default();
        let image = DynamicImage::new_rgb8(28, 28);
        let tensor = pre.preprocess(&image, &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 224, 224]);
    }

    #[test]
    fn white_image_normalizes_to_one() {
        let pre = Preprocessor::siglip_default();
        let pixels = vec![255u8; 8 * 8 * 3];
        let image = digitsight_core::image_from_rgb(8, 8, pixels).unwrap();
        let tensor = pre.preprocess(&image, &Device::Cpu).unwrap();
        let max = tensor
            .flatten_all()
            .unwrap()
            .max(0)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        assert!((max - 1.0).abs() < 1e-5);
    }

    #[test]
    fn black_image_normalizes_to_minus_one() {
        let pre = Preprocessor::siglip_default();
        let image = DynamicImage::new_rgb8(8, 8);
        let tensor = pre.preprocess(&image, &Device::Cpu).unwrap();
        let min = tensor
            .flatten_all()
            .unwrap()
            .min(0)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        assert!((min + 1.0).abs() < 1e-5);
    }

    #[test]
    fn grayscale_input_is_accepted() {
        let pre = Preprocessor::siglip_default();
        let image = digitsight_core::image_from_luma(28, 28, vec![128u8; 28 * 28]).unwrap();
        let tensor = pre.preprocess(&image, &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 224, 224]);
    }

    #[test]
    fn reads_processor_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor_config.json");
        std::fs::write(
            &path,
            r#"{"image_mean":[0.4,0.4,0.4],"image_std":[0.2,0.2,0.2],"size":{"height":96,"width":96}}"#,
        )
        .unwrap();
        let pre = Preprocessor::from_file(&path).unwrap();
        assert_eq!(pre.target_size(), (96, 96));
        assert_eq!(pre.mean, [0.4, 0.4, 0.4]);
        assert_eq!(pre.std, [0.2, 0.2, 0.2]);
    }

    #[test]
    fn rejects_zero_processor_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor_config.json");
        std::fs::write(&path, r#"{"size":{"height":0,"width":224}}"#).unwrap();
        assert!(Preprocessor::from_file(&path).is_err());
    }
}
