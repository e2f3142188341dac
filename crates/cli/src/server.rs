//! HTTP surface exposing `POST {basePath}/infer`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::{Json, Router};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use infergate_engine::{DEFAULT_CONTENT_TYPE, InferError, InferenceService, ProxiedResponse};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Host configuration for the infer HTTP server.
#[derive(Clone)]
pub struct InferHttpServer {
    bind_address: SocketAddr,
    route: String,
    service: Arc<InferenceService>,
}

impl InferHttpServer {
    pub fn new(bind_address: SocketAddr, route: impl Into<String>, service: Arc<InferenceService>) -> Self {
        Self {
            bind_address,
            route: route.into(),
            service,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.route, post(infer))
            .with_state(Arc::clone(&self.service))
    }

    /// Bind the listener and serve until the returned handle is stopped.
    pub async fn start(self) -> Result<RunningInferHttpServer> {
        let cancellation_token = CancellationToken::new();
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind_address).await?;
        let bound_address = listener.local_addr()?;

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                if let Err(error) = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                {
                    warn!(error = %error, "infer HTTP server stopped with an error");
                }
            }
        });

        Ok(RunningInferHttpServer {
            bind_address: bound_address,
            route: self.route,
            cancellation_token,
            server_handle,
        })
    }
}

/// Runtime handle for a running infer HTTP server.
#[derive(Debug)]
pub struct RunningInferHttpServer {
    bind_address: SocketAddr,
    route: String,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
}

impl RunningInferHttpServer {
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Stop accepting connections and wait for in-flight requests to drain.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.server_handle
            .await
            .map_err(|error| anyhow!("infer HTTP server task failed: {error}"))
    }
}

/// The body is taken as raw bytes so unparsable JSON is reported by the engine.
async fn infer(State(service): State<Arc<InferenceService>>, body: Bytes) -> Response {
    match service.handle(&body).await {
        Ok(proxied) => proxied_response(proxied),
        Err(error) => error_response(&error),
    }
}

fn proxied_response(proxied: ProxiedResponse) -> Response {
    let status = StatusCode::from_u16(proxied.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = HeaderValue::from_str(&proxied.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    (status, [(header::CONTENT_TYPE, content_type)], proxied.body).into_response()
}

fn error_response(error: &InferError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error.to_payload())).into_response()
}
