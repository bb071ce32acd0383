use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use image::DynamicImage;
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

use super::app;
use crate::config::{AuthConfig, Config, OcrConfig, ServerConfig, StorageConfig};
use crate::ocr::{MockProvider, OcrProviderTrait, OcrService};
use crate::state::AppState;

fn test_config(root: &Path) -> Config {
    Config {
        server: ServerConfig::default(),
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_minutes: 60,
            bcrypt_cost: 4,
        },
        storage: StorageConfig {
            users_file: root.join("users.json"),
            upload_dir: root.join("uploads"),
        },
        ocr: OcrConfig::default(),
    }
}

async fn test_server(root: &Path, provider: MockProvider) -> (TestServer, AppState) {
    test_server_with_config(test_config(root), provider).await
}

async fn test_server_with_config(
    config: Config,
    provider: MockProvider,
) -> (TestServer, AppState) {
    let providers: Vec<Arc<dyn OcrProviderTrait>> = vec![Arc::new(provider)];
    let ocr = OcrService::with_providers("eng", providers);
    let state = AppState::with_ocr_service(config, ocr)
        .await
        .unwrap();
    let server = TestServer::new(app(state.clone())).unwrap();
    (server, state)
}

fn png_bytes() -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::new_rgb8(24, 24)
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

fn file_form(file_name: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(data).file_name(file_name))
}

fn staged_files(state: &AppState) -> usize {
    std::fs::read_dir(state.pipeline().staging().dir())
        .unwrap()
        .count()
}

fn access_token(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-access-token"),
        HeaderValue::from_str(token).unwrap(),
    )
}

async fn register_and_login(server: &TestServer) -> String {
    server
        .post("/api/register")
        .json(&json!({"name": "Alice", "email": "alice@example.com", "password": "hunter2"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/login")
        .json(&json!({"email": "alice@example.com", "password": "hunter2"}))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_index_and_health() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;

    let index = server.get("/").await;
    index.assert_status_ok();
    assert_eq!(index.json::<Value>()["message"], "OCR API is running");

    let health = server.get("/health").await;
    health.assert_status_ok();
    let body = health.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["ocr_providers"], json!(["tesseract"]));
}

#[tokio::test]
async fn test_public_ocr_returns_text() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) =
        test_server(temp_dir.path(), MockProvider::returning(&["Invoice 42", "Total: $10"])).await;

    for path in ["/upload", "/api/ocr/public"] {
        let response = server
            .post(path)
            .multipart(file_form("invoice.png", png_bytes()))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["text"], "Invoice 42\nTotal: $10");
        assert_eq!(body["pages"], 1);
    }

    assert_eq!(staged_files(&state), 0);
}

#[tokio::test]
async fn test_no_text_detected_sentinel() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;

    let response = server
        .post("/api/ocr/public")
        .multipart(file_form("blank.png", png_bytes()))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["text"],
        crate::ocr::NO_TEXT_DETECTED
    );
}

#[tokio::test]
async fn test_missing_file_field() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;
    let token = register_and_login(&server).await;
    let (name, value) = access_token(&token);

    let responses = [
        server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await,
        server
            .post("/api/ocr/public")
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await,
        server
            .post("/api/ocr")
            .add_header(name, value)
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await,
    ];

    for response in responses {
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "no_file");
    }
}

#[tokio::test]
async fn test_non_multipart_body_is_no_file() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;

    let response = server.post("/api/ocr/public").json(&json!({"file": "x"})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "no_file");
}

#[tokio::test]
async fn test_multipart_without_boundary_is_invalid_upload() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;

    let response = server
        .post("/api/ocr/public")
        .bytes(Bytes::from_static(b"--x\r\n\r\ngarbage"))
        .content_type("multipart/form-data")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "invalid_upload");
}

#[tokio::test]
async fn test_oversize_upload_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.server.max_upload_bytes = 1024;
    let (server, state) = test_server_with_config(config, MockProvider::returning(&["unused"])).await;

    for path in ["/upload", "/api/ocr/public"] {
        let response = server
            .post(path)
            .multipart(file_form("huge.png", vec![0u8; 64 * 1024]))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.json::<Value>()["error"], "payload_too_large");
    }

    // A small upload still goes through under the same limit
    let response = server
        .post("/api/ocr/public")
        .multipart(file_form("tiny.png", png_bytes()))
        .await;
    response.assert_status_ok();
    assert_eq!(staged_files(&state), 0);
}

#[tokio::test]
async fn test_long_file_name_is_staged() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) = test_server(temp_dir.path(), MockProvider::returning(&["long"])).await;

    let name = format!("{}.png", "a".repeat(236));
    let response = server
        .post("/api/ocr/public")
        .multipart(file_form(&name, png_bytes()))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["text"], "long");
    assert_eq!(staged_files(&state), 0);
}

#[tokio::test]
async fn test_disallowed_extension() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;
    let token = register_and_login(&server).await;
    let (name, value) = access_token(&token);

    let public = server
        .post("/api/ocr/public")
        .multipart(file_form("x.exe", b"MZ".to_vec()))
        .await;
    let protected = server
        .post("/api/ocr")
        .add_header(name, value)
        .multipart(file_form("x.exe", b"MZ".to_vec()))
        .await;

    for response in [public, protected] {
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "file_type_not_allowed");
    }
    assert_eq!(staged_files(&state), 0);
}

#[tokio::test]
async fn test_decode_failure_is_reported_and_cleaned_up() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) = test_server(temp_dir.path(), MockProvider::returning(&["unused"])).await;

    let response = server
        .post("/api/ocr/public")
        .multipart(file_form("broken.png", b"not a png at all".to_vec()))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "decode_error");
    assert!(body.get("text").is_none());
    assert_eq!(staged_files(&state), 0);
}

#[tokio::test]
async fn test_ocr_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let mut offline = MockProvider::returning(&["unused"]);
    offline.available = false;
    let (server, state) = test_server(temp_dir.path(), offline).await;

    let response = server
        .post("/api/ocr/public")
        .multipart(file_form("scan.png", png_bytes()))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["error"], "ocr_unavailable");
    assert_eq!(staged_files(&state), 0);
}

#[tokio::test]
async fn test_register_login_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let (server, _) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;

    server
        .post("/api/register")
        .json(&json!({"name": "Alice", "email": "alice@example.com", "password": "hunter2"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/login")
        .json(&json!({"email": "alice@example.com", "password": "hunter2"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let wrong = server
        .post("/api/login")
        .json(&json!({"email": "alice@example.com", "password": "wrong"}))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json::<Value>()["message"], "Invalid credentials");

    let unknown = server
        .post("/api/login")
        .json(&json!({"email": "nobody@example.com", "password": "hunter2"}))
        .await;
    unknown.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;

    let body = json!({"name": "Alice", "email": "alice@example.com", "password": "pw"});
    server
        .post("/api/register")
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);

    let second = server.post("/api/register").json(&body).await;
    second.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(second.json::<Value>()["error"], "conflict");
    assert_eq!(state.accounts().len().await, 1);
}

#[tokio::test]
async fn test_register_validation() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) = test_server(temp_dir.path(), MockProvider::returning(&[])).await;

    let missing = server
        .post("/api/register")
        .json(&json!({"name": "Alice", "password": "pw"}))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(missing.json::<Value>()["message"], "Missing required fields");

    let blank = server
        .post("/api/register")
        .json(&json!({"name": " ", "email": "a@b.c", "password": "pw"}))
        .await;
    blank.assert_status(StatusCode::BAD_REQUEST);

    let not_json = server.post("/api/register").text("name=Alice").await;
    not_json.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(not_json.json::<Value>()["error"], "validation_error");

    let login = server
        .post("/api/login")
        .json(&json!({"email": "alice@example.com"}))
        .await;
    login.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(state.accounts().len().await, 0);
}

#[tokio::test]
async fn test_protected_ocr_requires_token() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) = test_server(temp_dir.path(), MockProvider::returning(&["secret text"])).await;

    let missing = server
        .post("/api/ocr")
        .multipart(file_form("scan.png", png_bytes()))
        .await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json::<Value>()["message"], "Token is missing");

    let (name, value) = access_token("garbage.token.value");
    let invalid = server
        .post("/api/ocr")
        .add_header(name, value)
        .multipart(file_form("scan.png", png_bytes()))
        .await;
    invalid.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.json::<Value>()["message"], "Token is invalid");

    let orphan = state.tokens().issue(Uuid::new_v4()).unwrap();
    let (name, value) = access_token(&orphan.token);
    let not_found = server
        .post("/api/ocr")
        .add_header(name, value)
        .multipart(file_form("scan.png", png_bytes()))
        .await;
    not_found.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(not_found.json::<Value>()["message"], "User not found");

    assert_eq!(staged_files(&state), 0);
}

#[tokio::test]
async fn test_protected_ocr_with_token() {
    let temp_dir = TempDir::new().unwrap();
    let (server, state) = test_server(temp_dir.path(), MockProvider::returning(&["secret text"])).await;
    let token = register_and_login(&server).await;

    let (name, value) = access_token(&token);
    let via_custom_header = server
        .post("/api/ocr")
        .add_header(name, value)
        .multipart(file_form("scan.png", png_bytes()))
        .await;
    via_custom_header.assert_status_ok();
    assert_eq!(via_custom_header.json::<Value>()["text"], "secret text");

    let via_bearer = server
        .post("/api/ocr")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
        .multipart(file_form("scan.png", png_bytes()))
        .await;
    via_bearer.assert_status_ok();

    assert_eq!(staged_files(&state), 0);
}
