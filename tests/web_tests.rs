//! HTTP-level tests for the classification service.
//!
//! Models and the encyclopedia lookup are replaced with in-process stubs so
//! the router can be exercised without ONNX artifacts or network access.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::Engine;
use danio_classify::{
    classify::ProbabilityVector,
    config::{Config, LookupConfig},
    lookup::{LookupError, Summary, SummaryLookup, AMBIGUOUS_MESSAGE, NOT_FOUND_MESSAGE},
    models::{ModelRegistry, ModelSlot, ModelSpec, ProbabilityModel},
    web::{create_app, AppState},
    Result,
};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use ndarray::Array4;
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

struct StubModel {
    spec: ModelSpec,
    scores: [f32; 6],
}

impl ProbabilityModel for StubModel {
    fn spec(&self) -> ModelSpec {
        self.spec
    }

    fn predict(&self, input: Array4<f32>) -> Result<ProbabilityVector> {
        let (w, h) = self.spec.target_size();
        assert_eq!(input.shape(), &[1, h as usize, w as usize, 3]);
        Ok(ProbabilityVector::new(self.scores))
    }
}

struct StubLookup;

#[async_trait]
impl SummaryLookup for StubLookup {
    async fn summary(&self, query: &str) -> std::result::Result<Summary, LookupError> {
        match query {
            "Danio" => Err(LookupError::Ambiguous("Danio".to_string())),
            "Danio pręgowany" => Ok(Summary {
                title: "Danio pręgowany".to_string(),
                text: "Gatunek ryby z rodziny karpiowatych.".to_string(),
            }),
            "timeout" => Err(LookupError::Service("upstream timed out".to_string())),
            other => Err(LookupError::NotFound(other.to_string())),
        }
    }
}

fn app(slots: Vec<ModelSlot>) -> Router {
    let config = Config::new(
        "127.0.0.1:0".to_string(),
        "models".to_string(),
        Some(1),
        false,
        LookupConfig::new("pl".to_string(), None).unwrap(),
    )
    .unwrap();

    create_app(AppState {
        config,
        registry: Arc::new(ModelRegistry::from_slots(slots)),
        lookup: Arc::new(StubLookup),
    })
}

fn default_app() -> Router {
    app(vec![
        ModelSlot::ready(Arc::new(StubModel {
            spec: ModelSpec::RESNET,
            scores: [0.9, 0.01, 0.02, 0.03, 0.02, 0.02],
        })),
        ModelSlot::ready(Arc::new(StubModel {
            spec: ModelSpec::INCEPTION,
            scores: [0.1, 0.1, 0.1, 0.4, 0.15, 0.15],
        })),
    ])
}

fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(64, 48, Rgb([90, 140, 60])));
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn multipart_request(content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "danio-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"larva.png\"\r\n",
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::post("/classify/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn upload_returns_ranked_tables_for_both_models() {
    let (status, body) = send(default_app(), multipart_request("image/png", &png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let models = body["data"]["models"].as_array().unwrap();
    assert_eq!(models.len(), 2);

    assert_eq!(models[0]["model"], "ResNet");
    assert_eq!(models[0]["status"], "ok");
    assert_eq!(models[0]["predictions"][0]["class_name"], "Curved spine");
    assert_eq!(models[0]["predictions"][0]["probability"], "90.00%");

    assert_eq!(models[1]["model"], "Inception");
    assert_eq!(models[1]["predictions"].as_array().unwrap().len(), 1);
    assert_eq!(models[1]["predictions"][0]["class_name"], "Normal");
    assert_eq!(models[1]["predictions"][0]["probability"], "40.00%");
}

#[tokio::test]
async fn base64_json_request_is_classified() {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes());
    let request = Request::post("/classify")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Request-ID", "req-42")
        .body(Body::from(
            serde_json::json!({ "image": format!("data:image/png;base64,{}", encoded) }).to_string(),
        ))
        .unwrap();

    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request_id"], "req-42");
    assert_eq!(body["data"]["image_size"], serde_json::json!([64, 48]));
}

#[tokio::test]
async fn empty_json_image_fails_validation() {
    let request = Request::post("/classify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{ "image": "  " }"#))
        .unwrap();

    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn gif_upload_is_rejected() {
    let (status, body) = send(default_app(), multipart_request("image/gif", b"GIF89a")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn failed_model_does_not_hide_the_other() {
    let app = app(vec![
        ModelSlot::unavailable(ModelSpec::RESNET, "ResNet model not found: models/resnet/resnet_ft.onnx"),
        ModelSlot::ready(Arc::new(StubModel {
            spec: ModelSpec::INCEPTION,
            scores: [0.0, 0.0, 0.6, 0.0, 0.6, 0.0],
        })),
    ]);

    let (status, body) = send(app, multipart_request("image/png", &png_bytes())).await;
    assert_eq!(status, StatusCode::OK);

    let models = body["data"]["models"].as_array().unwrap();
    assert_eq!(models[0]["status"], "failed");
    assert_eq!(models[0]["code"], "MODEL_LOAD_ERROR");
    assert_eq!(models[1]["status"], "ok");
    assert_eq!(models[1]["predictions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn lookup_found_ambiguous_and_missing() {
    let request = Request::get("/lookup?q=Danio%20pr%C4%99gowany")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "found");
    assert_eq!(body["data"]["summary"], "Gatunek ryby z rodziny karpiowatych.");

    let request = Request::get("/lookup?q=Danio").body(Body::empty()).unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ambiguous");
    assert_eq!(body["data"]["message"], AMBIGUOUS_MESSAGE);
    assert!(body["data"].get("summary").is_none());

    let request = Request::get("/lookup?q=xyzzy").body(Body::empty()).unwrap();
    let (_, body) = send(default_app(), request).await;
    assert_eq!(body["data"]["status"], "not_found");
    assert_eq!(body["data"]["message"], NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn lookup_service_failure_propagates() {
    let request = Request::get("/lookup?q=timeout").body(Body::empty()).unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "LOOKUP_ERROR");
}

#[tokio::test]
async fn blank_lookup_is_rejected() {
    let request = Request::get("/lookup?q=%20").body(Body::empty()).unwrap();
    let (status, _) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_info() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::get("/api/info").body(Body::empty()).unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classes"].as_array().unwrap().len(), 6);
    assert_eq!(body["classes"][0], "Curved spine");
    assert_eq!(body["models"][1]["input_width"], 299);
    assert_eq!(body["lookup"]["language"], "pl");
}

#[tokio::test]
async fn health_fails_without_models() {
    let app = app(vec![
        ModelSlot::unavailable(ModelSpec::RESNET, "missing"),
        ModelSlot::unavailable(ModelSpec::INCEPTION, "missing"),
    ]);
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn index_page_is_served_with_security_headers() {
    let response = default_app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Klasyfikacja wad rozwojowych Danio rerio"));
    assert!(html.contains("Wyszukiwanie w Wikipedii"));
}
