//! SigLIP vision tower with a linear classification head.
//!
//! Implements the inference path of the `SiglipForImageClassification`
//! architecture: patch embedding, learned position embeddings, a stack
//! of pre-norm transformer encoder layers, a final layer norm, mean
//! pooling over patches, and a linear classifier. Weight names follow
//! the Hugging Face checkpoint layout so safetensors exports load
//! directly.

use candle_core::{Module, Result, Tensor, D};
use candle_nn::{
    conv2d, embedding, layer_norm, linear, Conv2d, Conv2dConfig, Embedding, LayerNorm, Linear,
    VarBuilder,
};
use serde::Deserialize;

/// Vision tower hyperparameters, deserialized from the checkpoint's
/// `config.json` (`vision_config` section). Defaults match
/// siglip-base-patch16-224.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default = "default_intermediate_size")]
    pub intermediate_size: usize,
    #[serde(default = "default_num_hidden_layers")]
    pub num_hidden_layers: usize,
    #[serde(default = "default_num_attention_heads")]
    pub num_attention_heads: usize,
    #[serde(default = "default_num_channels")]
    pub num_channels: usize,
    #[serde(default = "default_image_size")]
    pub image_size: usize,
    #[serde(default = "default_patch_size")]
    pub patch_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
}

fn default_hidden_size() -> usize {
    768
}
fn default_intermediate_size() -> usize {
    3072
}
fn default_num_hidden_layers() -> usize {
    12
}
fn default_num_attention_heads() -> usize {
    12
}
fn default_num_channels() -> usize {
    3
}
fn default_image_size() -> usize {
    224
}
fn default_patch_size() -> usize {
    16
}
fn default_layer_norm_eps() -> f64 {
    1e-6
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            hidden_size: default_hidden_size(),
            intermediate_size: default_intermediate_size(),
            num_hidden_layers: default_num_hidden_layers(),
            num_attention_heads: default_num_attention_heads(),
            num_channels: default_num_channels(),
            image_size: default_image_size(),
            patch_size: default_patch_size(),
            layer_norm_eps: default_layer_norm_eps(),
        }
    }
}

impl VisionConfig {
    pub fn num_patches(&self) -> usize {
        (self.image_size / self.patch_size).pow(2)
    }
}

struct VisionEmbeddings {
    patch_embedding: Conv2d,
    position_embedding: Embedding,
    position_ids: Tensor,
}

impl VisionEmbeddings {
    fn new(cfg: &VisionConfig, vb: VarBuilder) -> Result<Self> {
        let conv_cfg = Conv2dConfig {
            stride: cfg.patch_size,
            ..Default::default()
        };
        let patch_embedding = conv2d(
            cfg.num_channels,
            cfg.hidden_size,
            cfg.patch_size,
            conv_cfg,
            vb.pp("patch_embedding"),
        )?;
        let num_patches = cfg.num_patches();
        let position_embedding =
            embedding(num_patches, cfg.hidden_size, vb.pp("position_embedding"))?;
        let position_ids = Tensor::arange(0u32, num_patches as u32, vb.device())?;
        Ok(Self {
            patch_embedding,
            position_embedding,
            position_ids,
        })
    }

    fn forward(&self, pixel_values: &Tensor) -> Result<Tensor> {
        // (b, c, h, w) -> (b, d, h/p, w/p) -> (b, n, d)
        let embeds = self.patch_embedding.forward(pixel_values)?;
        let embeds = embeds.flatten_from(2)?.transpose(1, 2)?;
        let pos = self.position_embedding.forward(&self.position_ids)?;
        embeds.broadcast_add(&pos)
    }
}

struct Attention {
    q_proj: Linear,
    k_proj: Linear,
    v_proj: Linear,
    out_proj: Linear,
    num_heads: usize,
    head_dim: usize,
    scale: f64,
}

impl Attention {
    fn new(cfg: &VisionConfig, vb: VarBuilder) -> Result<Self> {
        let dim = cfg.hidden_size;
        let num_heads = cfg.num_attention_heads;
        let head_dim = dim / num_heads;
        Ok(Self {
            q_proj: linear(dim, dim, vb.pp("q_proj"))?,
            k_proj: linear(dim, dim, vb.pp("k_proj"))?,
            v_proj: linear(dim, dim, vb.pp("v_proj"))?,
            out_proj: linear(dim, dim, vb.pp("out_proj"))?,
            num_heads,
            head_dim,
            scale: (head_dim as f64).powf(-0.5),
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (b, n, c) = xs.dims3()?;
        let shape = (b, n, self.num_heads, self.head_dim);
        let q = self.q_proj.forward(xs)?.reshape(shape)?.transpose(1, 2)?.contiguous()?;
        let k = self.k_proj.forward(xs)?.reshape(shape)?.transpose(1, 2)?.contiguous()?;
        let v = self.v_proj.forward(xs)?.reshape(shape)?.transpose(1, 2)?.contiguous()?;

        let attn = (q.matmul(&k.transpose(2, 3)?.contiguous()?)? * self.scale)?;
        let attn = candle_nn::ops::softmax(&attn, D::Minus1)?;

        let out = attn.matmul(&v)?;
        let out = out.transpose(1, 2)?.contiguous()?.reshape((b, n, c))?;
        self.out_proj.forward(&out)
    }
}

struct Mlp {
    fc1: Linear,
    fc2: Linear,
}

impl Mlp {
    fn new(cfg: &VisionConfig, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            fc1: linear(cfg.hidden_size, cfg.intermediate_size, vb.pp("fc1"))?,
            fc2: linear(cfg.intermediate_size, cfg.hidden_size, vb.pp("fc2"))?,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        // gelu_pytorch_tanh in the reference implementation
        self.fc2.forward(&self.fc1.forward(xs)?.gelu()?)
    }
}

struct EncoderLayer {
    layer_norm1: LayerNorm,
    self_attn: Attention,
    layer_norm2: LayerNorm,
    mlp: Mlp,
}

impl EncoderLayer {
    fn new(cfg: &VisionConfig, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            layer_norm1: layer_norm(cfg.hidden_size, cfg.layer_norm_eps, vb.pp("layer_norm1"))?,
            self_attn: Attention::new(cfg, vb.pp("self_attn"))?,
            layer_norm2: layer_norm(cfg.hidden_size, cfg.layer_norm_eps, vb.pp("layer_norm2"))?,
            mlp: Mlp::new(cfg, vb.pp("mlp"))?,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let residual = xs;
        let xs = self.self_attn.forward(&xs.apply(&self.layer_norm1)?)?;
        let xs = (xs + residual)?;
        let residual = &xs;
        let ys = self.mlp.forward(&xs.apply(&self.layer_norm2)?)?;
        ys + residual
    }
}

/// The full classification model: vision tower plus linear head.
pub struct SiglipClassificationModel {
    embeddings: VisionEmbeddings,
    layers: Vec<EncoderLayer>,
    post_layernorm: LayerNorm,
    classifier: Linear,
}

impl SiglipClassificationModel {
    /// Build the model from a `VarBuilder` rooted at the checkpoint's
    /// top level (`vision_model.*` and `classifier.*` prefixes).
    pub fn new(cfg: &VisionConfig, num_labels: usize, vb: VarBuilder) -> Result<Self> {
        let vm = vb.pp("vision_model");
        let embeddings = VisionEmbeddings::new(cfg, vm.pp("embeddings"))?;
        let mut layers = Vec::with_capacity(cfg.num_hidden_layers);
        for i in 0..cfg.num_hidden_layers {
            layers.push(EncoderLayer::new(cfg, vm.pp(format!("encoder.layers.{i}")))?);
        }
        let post_layernorm = layer_norm(
            cfg.hidden_size,
            cfg.layer_norm_eps,
            vm.pp("post_layernorm"),
        )?;
        let classifier = linear(cfg.hidden_size, num_labels, vb.pp("classifier"))?;
        Ok(Self {
            embeddings,
            layers,
            post_layernorm,
            classifier,
        })
    }

    /// Forward pass: (b, c, h, w) pixel values -> (b, num_labels) logits.
    pub fn forward(&self, pixel_values: &Tensor) -> Result<Tensor> {
        let mut xs = self.embeddings.forward(pixel_values)?;
        for layer in &self.layers {
            xs = layer.forward(&xs)?;
        }
        let xs = xs.apply(&self.post_layernorm)?;
        // Mean pooling over the patch dimension, then the linear head.
        let pooled = xs.mean(1)?;
        self.classifier.forward(&pooled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    fn tiny_config() -> VisionConfig {
        VisionConfig {
            hidden_size: 32,
            intermediate_size: 64,
            num_hidden_layers: 2,
            num_attention_heads: 4,
            num_channels: 3,
            image_size: 32,
            patch_size: 16,
            layer_norm_eps: 1e-6,
        }
    }

    #[test]
    fn forward_produces_one_logit_per_class() {
        let cfg = tiny_config();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = SiglipClassificationModel::new(&cfg, 10, vb).unwrap();
        let pixels = Tensor::zeros((1, 3, 32, 32), DType::F32, &Device::Cpu).unwrap();
        let logits = model.forward(&pixels).unwrap();
        assert_eq!(logits.dims(), &[1, 10]);
    }

    #[test]
    fn softmaxed_logits_form_a_distribution() {
        let cfg = tiny_config();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = SiglipClassificationModel::new(&cfg, 10, vb).unwrap();
        let pixels = Tensor::zeros((2, 3, 32, 32), DType::F32, &Device::Cpu).unwrap();
        let logits = model.forward(&pixels).unwrap();
        let probs = candle_nn::ops::softmax(&logits, D::Minus1).unwrap();
        let sums = probs.sum(D::Minus1).unwrap().to_vec1::<f32>().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn config_defaults_match_base_patch16_224() {
        let cfg: VisionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.hidden_size, 768);
        assert_eq!(cfg.num_hidden_layers, 12);
        assert_eq!(cfg.num_patches(), 196);
    }
}
