//! Server startup and router assembly

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{api, config::Config, metrics, shared_state::AppState, telemetry};

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    telemetry::init_tracing();
    metrics::init_metrics();

    info!("Starting course portal");
    let state = AppState::new(cfg.clone())?;

    // First scan creates the storage root if it is missing
    state.library.tree.scan()?;

    let addr = format!("{}:{}", cfg.api_host, cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::pages_api::index))
        .route("/course_description", get(api::pages_api::course_description))
        .route("/additional_resources", get(api::pages_api::additional_resources))
        .route("/teaching_staff", get(api::pages_api::teaching_staff))
        .route("/course_content", get(api::pages_api::course_content))
        // Upload form lives at the exact path; stored files under it
        .route("/static", get(api::upload_api::upload_form).post(api::upload_api::upload))
        .route("/static/*path", get(api::files_api::serve_file))
        .route(
            "/submit_discussion/:chapter/:section",
            post(api::discussion_api::submit_discussion),
        )
        .route("/receive", post(api::chat_api::receive))
        .route("/download/*path", get(api::files_api::download_file))
        .route("/delete/*path", get(api::files_api::delete_file))
        .route(
            "/rename/*path",
            get(api::files_api::rename_form).post(api::files_api::rename_file),
        )
        .route("/healthz", get(|| async { "OK" }))
        .route("/metrics", get(metrics::get_metrics))
        // Uploads carry whole media files; no body cap by design
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendWire;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::path::Path;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    fn test_state(root: &Path) -> AppState {
        let cfg = Config {
            storage_root: root.to_path_buf(),
            api_host: "127.0.0.1".to_string(),
            api_port: 0,
            backend_url: "http://127.0.0.1:11434".to_string(),
            backend_wire: BackendWire::Generate,
            chat_path: "/v1/chat/completions".to_string(),
            generate_path: "/api/generate".to_string(),
            default_model: "deepseek-math".to_string(),
            instances_path: root.join("instances.json"),
            weight_busy: 2.0,
            weight_latency: 0.0,
            latency_window: 32,
            scan_strict: false,
        };
        AppState::new(cfg).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn multipart_upload(filename: &str, chapter: &str, section: &str, kind: &str) -> Request<Body> {
        let boundary = "portal-test-boundary";
        let body = format!(
            "--{b}\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
Content-Type: application/octet-stream\r\n\r\n\
file-bytes\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"chapter\"\r\n\r\n{chapter}\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"section\"\r\n\r\n{section}\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"resource_type\"\r\n\r\n{kind}\r\n\
--{b}--\r\n",
            b = boundary,
        );
        Request::builder()
            .method("POST")
            .uri("/static")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_landing_and_info_pages_render() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(dir.path()));

        for uri in ["/", "/course_description", "/additional_resources", "/teaching_staff"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_discussion_post_shows_in_course_content() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(dir.path()));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit_discussion/CH1/S1")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("discussion_content=Hello"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .oneshot(Request::get("/course_content").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Hello"));
    }

    #[tokio::test]
    async fn test_upload_lands_in_scanned_tree() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(multipart_upload("lecture.mp4", "CH1", "S1", "videos"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let tree = state.library.tree.scan().unwrap();
        assert_eq!(tree["CH1"]["S1"].videos, vec!["lecture.mp4"]);

        // And the file itself serves back
        let response = app
            .oneshot(
                Request::get("/static/CH1/S1/videos/lecture.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "file-bytes");
    }

    #[tokio::test]
    async fn test_disallowed_upload_re_renders_form_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());

        let response = app
            .oneshot(multipart_upload("payload.exe", "CH1", "S1", "videos"))
            .await
            .unwrap();
        // Silent re-render, not a redirect and not an error
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Upload"));

        assert!(!dir.path().join("CH1").exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_plain_404() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::get("/static/CH1/S1/videos/missing.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_paths_rejected() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::get("/static/CH1/../../etc/passwd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_sets_attachment_disposition() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());

        state
            .library
            .uploads
            .store("CH1", "S1", "homework", "hw1.pdf", b"pdf-bytes")
            .unwrap();

        let response = app
            .oneshot(
                Request::get("/download/CH1/S1/homework/hw1.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("hw1.pdf"));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());

        state
            .library
            .uploads
            .store("CH1", "S1", "videos", "old.mp4", b"x")
            .unwrap();

        let response = app
            .oneshot(
                Request::get("/delete/CH1/S1/videos/old.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!dir.path().join("CH1/S1/videos/old.mp4").exists());
    }

    #[tokio::test]
    async fn test_rename_within_directory() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());

        state
            .library
            .uploads
            .store("CH1", "S1", "videos", "old.mp4", b"x")
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/rename/CH1/S1/videos/old.mp4")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("new_name=new.mp4"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!dir.path().join("CH1/S1/videos/old.mp4").exists());
        assert!(dir.path().join("CH1/S1/videos/new.mp4").exists());
    }

    #[tokio::test]
    async fn test_receive_streams_relayed_deltas() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_body("{\"response\":\"Hi\"}\n")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let mut state = test_state(dir.path());
        // Point the passthrough backend at the mock
        state.relay = std::sync::Arc::new(crate::relay::RelayWorker::new(
            server.url(),
            BackendWire::Generate,
            "/v1/chat/completions".to_string(),
            "/api/generate".to_string(),
        ));
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/receive")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        "{\"model\":\"deepseek-math\",\"messages\":[{\"role\":\"user\",\"content\":\"hi\"}]}",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert_eq!(
            body_text(response).await,
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n"
        );
    }

    #[tokio::test]
    async fn test_healthz() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(dir.path()));

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
