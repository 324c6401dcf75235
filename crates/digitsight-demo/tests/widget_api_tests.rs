//! Demo widget API tests with a mock classifier.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use digitsight_classifier::{Classification, DigitClassifier};
use digitsight_core::{DigitScores, Result};
use digitsight_demo::{build_app, DemoAppState};
use image::DynamicImage;
use std::io::Cursor;
use std::sync::Arc;
use tower::util::ServiceExt;

struct MockClassifier;

#[async_trait]
impl DigitClassifier for MockClassifier {
    async fn classify(&self, _image: &DynamicImage) -> Result<Classification> {
        let mut probs = [0.02; 10];
        probs[7] = 0.82;
        let scores = DigitScores::from_probabilities(probs);
        let (label, score) = scores.top();
        Ok(Classification {
            scores,
            label: label.to_string(),
            score,
            model: "mock".to_string(),
            latency_us: 1234,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn test_state() -> DemoAppState {
    DemoAppState::new(Arc::new(MockClassifier))
}

const BOUNDARY: &str = "digitsight-demo-test";

fn multipart_request(data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"seven.png\"\r\n\
          Content-Type: application/octet-stream\r\n\r\n",
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/classify")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::new_luma8(28, 28);
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn classify_returns_record_and_populates_history() {
    let state = test_state();
    let app: Router = build_app(state.clone());

    let response = app
        .clone()
        .oneshot(multipart_request(&png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["label"], "7");
    assert_eq!(json["filename"], "seven.png");
    assert_eq!(json["predictions"].as_object().unwrap().len(), 10);

    let response = app
        .oneshot(
            Request::get("/api/history?limit=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    let records = history.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["label"], "7");
}

#[tokio::test]
async fn garbage_upload_is_rejected() {
    let app = build_app(test_state());
    let response = app
        .oneshot(multipart_request(b"plain text, not pixels"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("decode"));
}

#[tokio::test]
async fn root_serves_the_widget_page() {
    let app = build_app(test_state());
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.contains("Digitsight"));
}
