use super::*;
use axum::{
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct ServerState {
    tx: Arc<Mutex<Option<oneshot::Sender<(ProcessRequest, Option<String>)>>>>,
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
}

async fn handle_process(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<ProcessRequest>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send((payload, content_type));
    }
    (
        state.status,
        [(header::CONTENT_TYPE, state.content_type)],
        state.body,
    )
}

async fn handle_download(AxumPath(path): AxumPath<String>) -> (StatusCode, Vec<u8>) {
    if path == "watermark_removed.jpg" {
        (StatusCode::OK, b"processed-bytes".to_vec())
    } else {
        (StatusCode::NOT_FOUND, Vec::new())
    }
}

async fn spawn_processing_server(
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
) -> std::io::Result<(String, oneshot::Receiver<(ProcessRequest, Option<String>)>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        tx: Arc::new(Mutex::new(Some(tx))),
        status,
        content_type,
        body,
    };
    let app = Router::new()
        .route("/process", post(handle_process))
        .route("/download/*path", get(handle_download))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

async fn unreachable_base_url() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

fn client_for(base_url: String) -> ProcessingClient {
    ProcessingClient::new(ApiConfig::new(base_url)).expect("client")
}

const SUCCESS_BODY: &str = r#"{"success": true, "outputPath": "watermark_removed.jpg", "imageData": "data:image/jpeg;base64,cHJvY2Vzc2Vk"}"#;

#[tokio::test]
async fn submit_posts_data_url_as_json() {
    let (base_url, request_rx) =
        spawn_processing_server(StatusCode::OK, "application/json", SUCCESS_BODY)
            .await
            .expect("spawn server");
    let client = client_for(base_url);
    let image = DataUrl::encode("image/png", b"original");

    let result = client.submit(&image).await.expect("submit");
    assert_eq!(result.output_path, "watermark_removed.jpg");
    assert_eq!(result.image_data, "data:image/jpeg;base64,cHJvY2Vzc2Vk");

    let (request, content_type) = request_rx.await.expect("request");
    assert_eq!(request.image, image.as_str());
    assert_eq!(content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn server_error_message_is_surfaced_verbatim() {
    let (base_url, _rx) = spawn_processing_server(
        StatusCode::BAD_REQUEST,
        "application/json",
        r#"{"error": "bad image"}"#,
    )
    .await
    .expect("spawn server");

    let err = client_for(base_url)
        .submit(&DataUrl::encode("image/png", b"x"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ProcessError::Server { status: 400, .. }));
    assert_eq!(err.to_string(), "bad image");
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn server_error_without_message_uses_fallback() {
    let (base_url, _rx) = spawn_processing_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        "application/json",
        r#"{"success": false}"#,
    )
    .await
    .expect("spawn server");

    let err = client_for(base_url)
        .submit(&DataUrl::encode("image/png", b"x"))
        .await
        .expect_err("must fail");
    assert_eq!(err.to_string(), "Failed to process image");
}

#[tokio::test]
async fn non_json_error_page_is_malformed_response() {
    let (base_url, _rx) = spawn_processing_server(
        StatusCode::BAD_GATEWAY,
        "text/html",
        "<html>Bad Gateway</html>",
    )
    .await
    .expect("spawn server");

    let err = client_for(base_url)
        .submit(&DataUrl::encode("image/png", b"x"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ProcessError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn success_without_result_fields_is_malformed_response() {
    let (base_url, _rx) =
        spawn_processing_server(StatusCode::OK, "application/json", r#"{"success": true}"#)
            .await
            .expect("spawn server");

    let err = client_for(base_url)
        .submit(&DataUrl::encode("image/png", b"x"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ProcessError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let client = client_for(unreachable_base_url().await);

    let err = client
        .submit(&DataUrl::encode("image/png", b"x"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ProcessError::Transport(_)), "{err:?}");
    assert!(!err.to_string().is_empty());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn download_fetches_output_path_bytes() {
    let (base_url, _rx) =
        spawn_processing_server(StatusCode::OK, "application/json", SUCCESS_BODY)
            .await
            .expect("spawn server");
    let client = client_for(base_url);

    let bytes = client
        .download("watermark_removed.jpg")
        .await
        .expect("download");
    assert_eq!(bytes, b"processed-bytes");

    let err = client
        .download("missing.jpg")
        .await
        .expect_err("must fail");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn client_is_usable_through_processor_trait() {
    let (base_url, _rx) =
        spawn_processing_server(StatusCode::OK, "application/json", SUCCESS_BODY)
            .await
            .expect("spawn server");
    let processor: Arc<dyn ImageProcessor> = Arc::new(client_for(base_url));

    let result = processor
        .process(&DataUrl::encode("image/png", b"x"))
        .await
        .expect("process");
    assert_eq!(result.output_path, "watermark_removed.jpg");
}
