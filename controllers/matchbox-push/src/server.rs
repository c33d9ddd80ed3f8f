//! HTTP surface.
//!
//! `POST /v1/matchbox/push` streams progress as newline-delimited JSON.
//! Rejections that are known before any side effect (disabled, unauthorized,
//! malformed request) are answered with a plain status code; failures after
//! the stream has started abort the response body.

use crate::auth::bearer_token;
use crate::error::ServiceError;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use matchbox_push::{
    Caller, DEFAULT_PROGRESS_BUFFER, MatchboxPusher, ProgressEvent, ProgressReporter, PushError,
    PushOutcome, PushRequest,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

const NDJSON: &str = "application/x-ndjson";

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pusher: Arc<MatchboxPusher>,
}

impl AppState {
    pub fn new(pusher: MatchboxPusher) -> Self {
        Self {
            pusher: Arc::new(pusher),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/matchbox/push", post(push))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn push(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let request_id = Uuid::new_v4();
    let caller = Caller {
        bearer_token: bearer_token(
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok()),
        ),
    };

    if let Err(e) = state.pusher.preflight(&caller).await {
        warn!("[{}] Push rejected: {}", request_id, e);
        return Err(e.into());
    }

    let request: PushRequest = serde_json::from_slice(&body)
        .map_err(|e| PushError::InvalidRequest(format!("invalid request body: {}", e)))?;
    if request.talos_version.trim().is_empty() {
        return Err(PushError::InvalidRequest("talosVersion is required".to_string()).into());
    }

    info!(
        "[{}] Starting push for Talos {} ({} extensions)",
        request_id,
        request.talos_version,
        request.extensions.len()
    );

    let (reporter, events) = ProgressReporter::channel(DEFAULT_PROGRESS_BUFFER);
    let pusher = Arc::clone(&state.pusher);
    let task = tokio::spawn(
        async move { pusher.push(&caller, &request, &reporter).await }
            .instrument(info_span!("push", %request_id)),
    );

    let body = Body::from_stream(progress_stream(request_id, events, task));
    Ok(([(header::CONTENT_TYPE, NDJSON)], body).into_response())
}

type PushTask = JoinHandle<Result<PushOutcome, PushError>>;

/// One NDJSON line per progress event; ends with an error if the push failed
fn progress_stream(
    request_id: Uuid,
    events: mpsc::Receiver<ProgressEvent>,
    task: PushTask,
) -> impl futures::Stream<Item = Result<Bytes, ServiceError>> + Send + 'static {
    futures::stream::unfold(Some((events, task)), move |state| async move {
        let (mut events, task) = state?;

        if let Some(event) = events.recv().await {
            let line = serde_json::to_vec(&event)
                .map(|mut line| {
                    line.push(b'\n');
                    Bytes::from(line)
                })
                .map_err(|e| ServiceError::Task(format!("failed to encode progress: {}", e)));
            return Some((line, Some((events, task))));
        }

        // Sender dropped: the push task has finished
        match task.await {
            Ok(Ok(outcome)) => {
                info!(
                    "[{}] Push complete: schematic {}, {} profiles, {} groups examined",
                    request_id,
                    outcome.schematic.id(),
                    outcome.profiles.len(),
                    outcome.groups.len()
                );
                None
            }
            Ok(Err(e)) => {
                error!("[{}] Push failed: {}", request_id, e);
                Some((Err(ServiceError::Push(e)), None))
            }
            Err(e) => {
                error!("[{}] Push task failed: {}", request_id, e);
                Some((Err(ServiceError::Task(e.to_string())), None))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenAuthorizer;
    use crate::resolver::FactorySchematicResolver;
    use axum::http::{Request, StatusCode};
    use image_factory_client::MockImageFactoryClient;
    use matchbox_push::{ArtifactFetcher, MatchboxConfig};
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SCHEMATIC_ID: &str = "abcdef1234567890";

    async fn serve_factory() -> String {
        let base = format!("/image/{}/v1.9.0", SCHEMATIC_ID);
        let factory = Router::new()
            .route(&format!("{}/kernel-amd64", base), get(|| async { vec![7u8; 4096] }))
            .route(&format!("{}/initramfs-amd64.xz", base), get(|| async { vec![9u8; 8192] }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, factory).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn app(root: &Path, factory_url: &str, enabled: bool, factory: MockImageFactoryClient) -> Router {
        let config = MatchboxConfig {
            enabled,
            update_groups: true,
            assets_path: root.join("assets/talos"),
            profiles_path: root.join("profiles"),
            groups_path: root.join("groups"),
            image_factory_base_url: factory_url.to_string(),
            ..Default::default()
        };
        let pusher = MatchboxPusher::new(
            config,
            Arc::new(FactorySchematicResolver::new(Arc::new(factory), Vec::new(), None)),
            Arc::new(TokenAuthorizer::new(vec!["operator".to_string()])),
            ArtifactFetcher::new().unwrap(),
        );
        router(AppState::new(pusher))
    }

    fn push_request(token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/matchbox/push")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn mock() -> MockImageFactoryClient {
        MockImageFactoryClient::new("http://factory", SCHEMATIC_ID)
    }

    const BODY: &str = r#"{"talosVersion": "1.9.0", "extraKernelArgs": ["console=ttyS0"]}"#;

    #[tokio::test]
    async fn test_healthz() {
        let dir = TempDir::new().unwrap();
        let response = app(dir.path(), "http://127.0.0.1:1", true, mock())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_push_streams_progress() {
        let dir = TempDir::new().unwrap();
        let factory_url = serve_factory().await;
        let response = app(dir.path(), &factory_url, true, mock())
            .oneshot(push_request(Some("operator"), BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], NDJSON);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let events: Vec<serde_json::Value> = body
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_slice(line).unwrap())
            .collect();

        let percentages: Vec<u64> = events.iter().map(|e| e["percentage"].as_u64().unwrap()).collect();
        assert_eq!(&percentages[..3], &[10u64, 20, 30]);
        assert!(percentages.windows(2).all(|w| w[0] <= w[1]));

        let last = events.last().unwrap();
        assert_eq!(last["percentage"], 100);
        assert_eq!(last["complete"], true);

        assert!(dir.path().join("profiles/talos-controlplane-abcdef12.json").exists());
        assert!(dir.path().join("profiles/talos-worker-abcdef12.json").exists());
    }

    #[tokio::test]
    async fn test_push_disabled() {
        let dir = TempDir::new().unwrap();
        let response = app(dir.path(), "http://127.0.0.1:1", false, mock())
            .oneshot(push_request(Some("operator"), BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!dir.path().join("assets").exists());
    }

    #[tokio::test]
    async fn test_push_requires_operator_token() {
        let dir = TempDir::new().unwrap();
        let router = app(dir.path(), "http://127.0.0.1:1", true, mock());

        let response = router.clone().oneshot(push_request(None, BODY)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router.oneshot(push_request(Some("intruder"), BODY)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!dir.path().join("assets").exists());
    }

    #[tokio::test]
    async fn test_push_rejects_bad_requests() {
        let dir = TempDir::new().unwrap();
        let router = app(dir.path(), "http://127.0.0.1:1", true, mock());

        let response = router.clone().oneshot(push_request(Some("operator"), "not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .oneshot(push_request(Some("operator"), r#"{"talosVersion": " "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("talosVersion"));
    }

    #[tokio::test]
    async fn test_push_failure_aborts_stream() {
        let dir = TempDir::new().unwrap();
        let factory = mock().failing(500, "factory down");
        let response = app(dir.path(), "http://127.0.0.1:1", true, factory)
            .oneshot(push_request(Some("operator"), BODY))
            .await
            .unwrap();

        // Status is already committed when the failure happens
        assert_eq!(response.status(), StatusCode::OK);
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
        assert!(!dir.path().join("profiles").exists());
    }
}
