use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use line_ocr::config::Config;
use line_ocr::engine::OcrEngine;
use line_ocr::engines::EngineRegistry;
use line_ocr::error::OcrError;
use line_ocr::server::{router, AppState};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----line-ocr-test-boundary";

/// Answers with the crop size instead of running a model
struct StubEngine;

impl OcrEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn description(&self) -> &'static str {
        "Reports crop dimensions"
    }

    fn recognize_line(&self, line: &DynamicImage, _max_tokens: usize) -> Result<String, OcrError> {
        Ok(format!("{}x{}", line.width(), line.height()))
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string()]
    }
}

fn app_with(config: Config) -> Router {
    let engines = EngineRegistry::from_engines(vec![Arc::new(StubEngine)], None).unwrap();
    router(AppState::new(engines, config))
}

fn app() -> Router {
    app_with(Config::default())
}

/// PNG of a page with `lines` solid ink bands, 60 rows apart
fn page_png(lines: u32) -> Vec<u8> {
    let mut img = RgbImage::from_pixel(320, 60 + lines * 60, Rgb([255, 255, 255]));
    for i in 0..lines {
        let top = 40 + i * 60;
        for y in top..top + 16 {
            for x in 30..290 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

fn multipart(file: Option<(&[u8], &str)>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((data, mime)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"page\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, mime
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post(app: Router, uri: &str, body: Vec<u8>) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, bytes.to_vec())
}

async fn get_json(app: Router, uri: &str) -> Value {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("response should be JSON")
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = get_json(app(), "/health").await;
    assert_eq!(response["status"], "ok");
    assert_eq!(response["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_info_endpoint() {
    let response = get_json(app(), "/info").await;

    assert_eq!(response["default_engine"], "stub");
    assert_eq!(response["available_engines"][0]["name"], "stub");
    assert_eq!(response["max_tokens"], 1000);
    assert_eq!(response["segmentation"]["sigma"], 3.0);
    assert_eq!(response["segmentation"]["height_ratio_threshold"], 0.75);
    assert_eq!(response["segmentation"]["min_padding"], 10);
}

#[tokio::test]
async fn test_segment_returns_boxes_per_page() {
    let png = page_png(3);
    let (status, _, body) = post(app(), "/segment", multipart(Some((&png, "image/png")), &[])).await;

    assert_eq!(status, StatusCode::OK);
    let response = json(&body);
    let lines = response["pages"][0]["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 3);

    let tops: Vec<u64> = lines.iter().map(|l| l["y0"].as_u64().unwrap()).collect();
    assert!(tops.windows(2).all(|w| w[0] < w[1]));
    assert!(!response["pages"][0]["steps"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ocr_reads_each_line() {
    let png = page_png(2);
    let (status, _, body) = post(app(), "/ocr", multipart(Some((&png, "image/png")), &[])).await;

    assert_eq!(status, StatusCode::OK);
    let response = json(&body);
    assert_eq!(response["engine"], "stub");
    assert_eq!(response["lines"].as_array().unwrap().len(), 2);
    assert_eq!(response["text"].as_str().unwrap().lines().count(), 2);
    assert_eq!(response["lines"][0]["page"], 0);
    assert!(response["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ocr_with_named_engine() {
    let png = page_png(1);
    let (status, _, body) =
        post(app(), "/ocr/stub", multipart(Some((&png, "image/png")), &[])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["engine"], "stub");
}

#[tokio::test]
async fn test_unknown_engine_is_not_found() {
    let png = page_png(1);
    let (status, _, body) =
        post(app(), "/ocr/nope", multipart(Some((&png, "image/png")), &[])).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "ENGINE_NOT_FOUND");
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let (status, _, body) = post(app(), "/ocr", multipart(None, &[("sigma", "3")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "MISSING_FILE");
}

#[tokio::test]
async fn test_invalid_parameter_overrides_are_rejected() {
    let png = page_png(1);
    let overrides = [
        ("sigma", "-1"),
        ("sigma", "abc"),
        ("sigma", "1e12"),
        ("activity_fraction", "1.5"),
    ];
    for (name, value) in overrides {
        let (status, _, body) = post(
            app(),
            "/segment",
            multipart(Some((&png, "image/png")), &[(name, value)]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}={}", name, value);
        assert_eq!(json(&body)["code"], "INVALID_REQUEST");
    }
}

#[tokio::test]
async fn test_parameter_overrides_apply_per_request() {
    let png = page_png(1);
    let (status, _, body) = post(
        app(),
        "/segment",
        multipart(Some((&png, "image/png")), &[("min_padding", "25")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["pages"][0]["lines"][0]["x0"], 5);
}

#[tokio::test]
async fn test_format_is_sniffed_when_mime_type_is_generic() {
    let png = page_png(3);
    for mime in ["application/octet-stream", "image/jpg"] {
        let (status, _, body) =
            post(app(), "/segment", multipart(Some((&png, mime)), &[])).await;

        assert_eq!(status, StatusCode::OK);
        let response = json(&body);
        assert_eq!(response["pages"][0]["lines"].as_array().unwrap().len(), 3, "{}", mime);
        assert!(response["warnings"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_undecodable_upload_yields_empty_result() {
    let garbage = b"definitely not an image".to_vec();

    let (status, _, body) = post(
        app(),
        "/ocr",
        multipart(Some((&garbage, "image/png")), &[]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response = json(&body);
    assert_eq!(response["text"], "");
    assert_eq!(response["warnings"].as_array().unwrap().len(), 1);

    let (status, _, body) = post(
        app(),
        "/segment",
        multipart(Some((&garbage, "image/png")), &[]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body)["pages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_annotate_returns_png() {
    let png = page_png(2);
    let (status, content_type, body) =
        post(app(), "/annotate", multipart(Some((&png, "image/png")), &[])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    let annotated = image::load_from_memory(&body).unwrap();
    assert_eq!((annotated.width(), annotated.height()), (320, 180));
}

#[tokio::test]
async fn test_annotate_rejects_undecodable_image() {
    let garbage = b"GIF89a but not really".to_vec();
    let (status, _, body) = post(
        app(),
        "/annotate",
        multipart(Some((&garbage, "image/gif")), &[]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn test_projection_plot_is_png() {
    let png = page_png(2);
    let (status, content_type, body) =
        post(app(), "/projection", multipart(Some((&png, "image/png")), &[])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    let plot = image::load_from_memory(&body).unwrap();
    assert_eq!((plot.width(), plot.height()), (800, 400));
}

#[tokio::test]
async fn test_projection_plot_can_be_disabled() {
    let mut config = Config::default();
    config.segmentation.plot_projection = false;

    let png = page_png(1);
    let (status, _, _) = post(
        app_with(config),
        "/projection",
        multipart(Some((&png, "image/png")), &[]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
