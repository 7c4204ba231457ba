//! Mock HTTP tests for InferenceClient.
//!
//! These tests cover:
//! - Request formatting (POST /predict, JSON body with a JPEG data URL)
//! - Prediction parsing (label, null label, missing confidence)
//! - Error classification (server error field, non-2xx, malformed body,
//!   connection failure, timeout)

use std::time::Duration;

use gesture_sense::encoder::{EncodedFrame, FrameEncoder};
use gesture_sense::inference::{Classifier, InferenceClient, InferenceError, PREDICT_PATH};
use image::{Rgb, RgbImage};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_frame() -> EncodedFrame {
    let image = RgbImage::from_pixel(64, 48, Rgb([120, 90, 60]));
    FrameEncoder::default().encode_image(&image).unwrap()
}

async fn mount_json(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// === Request Format ===

#[tokio::test]
async fn test_request_is_json_with_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"label": "A", "confidence": 0.9})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = InferenceClient::new(server.uri()).unwrap();
    client.submit(test_frame()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let image = body["image"].as_str().expect("image field should be a string");
    assert!(image.starts_with("data:image/jpeg;base64,"));
    assert!(image.len() > "data:image/jpeg;base64,".len());
    assert_eq!(body.as_object().unwrap().len(), 1, "only the image field is sent");
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({"label": "B", "confidence": 0.7})).await;

    let client = InferenceClient::new(format!("{}/", server.uri())).unwrap();
    let result = client.submit(test_frame()).await.unwrap();
    assert_eq!(result.label.as_deref(), Some("B"));
}

// === Prediction Parsing ===

#[tokio::test]
async fn test_prediction_with_label() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({"label": "Peace", "confidence": 0.85})).await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let result = client.submit(test_frame()).await.unwrap();

    assert!(result.is_hand());
    assert_eq!(result.hand_label(), Some("Peace"));
    assert!((result.confidence - 0.85).abs() < 1e-6);
}

#[tokio::test]
async fn test_prediction_null_label_means_no_hand() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({"label": null, "confidence": 0.0})).await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let result = client.submit(test_frame()).await.unwrap();

    assert!(!result.is_hand());
    assert_eq!(result.hand_label(), None);
}

#[tokio::test]
async fn test_prediction_missing_fields_means_no_hand() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({})).await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let result = client.submit(test_frame()).await.unwrap();
    assert!(!result.is_hand());
}

#[tokio::test]
async fn test_classifier_trait_delegates_to_submit() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({"label": "Fist", "confidence": 0.65})).await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let result = client.classify(test_frame()).await.unwrap();
    assert_eq!(result.hand_label(), Some("Fist"));
}

// === Error Handling ===

#[tokio::test]
async fn test_error_field_is_server_error() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({"error": "model not loaded"})).await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let err = client.submit(test_frame()).await.unwrap_err();

    match &err {
        InferenceError::Server { detail } => assert_eq!(detail, "model not loaded"),
        other => panic!("Expected Server error, got {:?}", other),
    }
    assert!(!err.is_network());
}

#[tokio::test]
async fn test_non_2xx_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&server)
        .await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let err = client.submit(test_frame()).await.unwrap_err();

    match &err {
        InferenceError::Status { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "internal failure");
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
    assert!(err.is_network());
}

#[tokio::test]
async fn test_non_2xx_with_error_json_is_still_status_error() {
    let server = MockServer::start().await;
    mount_json(&server, 503, json!({"error": "overloaded"})).await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let err = client.submit(test_frame()).await.unwrap_err();
    assert!(matches!(err, InferenceError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = InferenceClient::new(server.uri()).unwrap();
    let err = client.submit(test_frame()).await.unwrap_err();
    assert!(matches!(err, InferenceError::MalformedBody(_)));
    assert!(err.is_network());
}

#[tokio::test]
async fn test_connection_refused_is_http_error() {
    // Port 1 is privileged and never has a listener in test environments
    let client = InferenceClient::new("http://127.0.0.1:1").unwrap();
    let err = client.submit(test_frame()).await.unwrap_err();
    assert!(matches!(err, InferenceError::Http(_)));
    assert!(err.is_network());
}

#[tokio::test]
async fn test_timeout_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "A", "confidence": 0.9}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client =
        InferenceClient::with_timeout(server.uri(), Some(Duration::from_millis(50))).unwrap();
    let err = client.submit(test_frame()).await.unwrap_err();
    match err {
        InferenceError::Http(e) => assert!(e.is_timeout()),
        other => panic!("Expected timeout, got {:?}", other),
    }
}
