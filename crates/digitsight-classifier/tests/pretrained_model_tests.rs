//! Integration tests against the real pretrained checkpoint.
//!
//! These download MNIST-Digits-SigLIP2 from the Hugging Face Hub, so
//! they are ignored by default. Run with:
//! `cargo test -p digitsight-classifier -- --ignored`

use digitsight_classifier::{ClassifierConfig, DigitClassifier, SiglipDigitClassifier};

fn load_pretrained() -> SiglipDigitClassifier {
    SiglipDigitClassifier::load(&ClassifierConfig::default())
        .expect("failed to load pretrained checkpoint")
}

#[tokio::test]
#[ignore = "downloads the checkpoint from the Hugging Face Hub"]
async fn pretrained_model_loads() {
    let classifier = load_pretrained();
    assert_eq!(classifier.name(), "prithivMLmods/Mnist-Digits-SigLIP2");
}

#[tokio::test]
#[ignore = "downloads the checkpoint from the Hugging Face Hub"]
async fn all_black_image_satisfies_distribution_invariants() {
    let classifier = load_pretrained();
    let image = image::DynamicImage::new_rgb8(28, 28);

    let result = classifier.classify(&image).await.unwrap();

    assert!((result.scores.sum() - 1.0).abs() < 0.01);
    for (_, prob) in result.scores.iter() {
        assert!((0.0..=1.0).contains(&prob));
    }
}

#[tokio::test]
#[ignore = "downloads the checkpoint from the Hugging Face Hub"]
async fn synthetic_vertical_stroke_classifies_as_a_digit() {
    let classifier = load_pretrained();

    // White vertical stroke on black, the crudest possible "1".
    let mut pixels = vec![0u8; 28 * 28];
    for y in 4..24 {
        for x in 13..15 {
            pixels[y * 28 + x] = 255;
        }
    }
    let image = digitsight_core::image_from_luma(28, 28, pixels).unwrap();

    let result = classifier.classify(&image).await.unwrap();

    // No assertion on which label wins; shape and range must hold.
    assert!(result.score > 0.0 && result.score <= 1.0);
    assert!((result.scores.sum() - 1.0).abs() < 0.01);
}
