// Path: crates/http-gateway/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Flora HTTP Gateway
//!
//! The JSON surface of the service. Handlers are thin: they parse the
//! request, call one of the three service adapters and map the outcome
//! through [`AppError`].

mod error;
mod routes;

pub use error::AppError;

use anyhow::Result;
use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::MatchedPath,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use flora_services::{AuthGateway, IrisPipeline, ParametersStore};
use flora_telemetry::rpc_metrics;
use flora_types::config::ServerConfig;
use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};
use tokio::sync::watch;
use tower::{
    limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer, BoxError,
    ServiceBuilder,
};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Handles shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub parameters: ParametersStore,
    pub auth: AuthGateway,
    pub pipeline: IrisPipeline,
}

impl AppState {
    pub fn new(parameters: ParametersStore, auth: AuthGateway, pipeline: IrisPipeline) -> Self {
        Self {
            parameters,
            auth,
            pipeline,
        }
    }
}

/// Records request count and latency per matched route.
async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let started = Instant::now();
    let res = next.run(req).await;
    rpc_metrics().observe_request_duration(&route, started.elapsed().as_secs_f64());
    rpc_metrics().inc_requests_total(&route, res.status().as_u16());
    res
}

// Turns failures of the fallible tower layers into JSON responses.
async fn map_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({ "detail": "request timed out", "code": "TIMEOUT" })),
        )
    } else if err.is::<tower::load_shed::error::Overloaded>() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "detail": "service overloaded", "code": "OVERLOADED" })),
        )
    } else {
        tracing::error!(target: "gateway", error = %err, "unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": "Internal server error", "code": "INTERNAL_ERROR" })),
        )
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/hello/:name", get(routes::hello))
        .route("/auth/register", post(routes::register))
        .route("/auth/login", post(routes::login))
        .route("/auth/users", get(routes::list_users))
        .route("/auth/make-admin", post(routes::make_admin))
        .route("/retrieve-parameters", get(routes::retrieve_parameters))
        .route("/add-parameters", post(routes::add_parameters))
        .route("/update-parameters", put(routes::update_parameters))
        .route("/delete-parameters", delete(routes::delete_parameters))
        .route("/load-iris-data", get(routes::load_iris))
        .route("/process-iris-data", get(routes::process_iris))
        .route("/split-iris-data", get(routes::split_iris))
        .route("/train-iris-model", post(routes::train_iris))
        .route("/predict-iris-model", post(routes::predict_iris))
        .route_layer(middleware::from_fn(track_metrics))
}

/// The full application: API routes, operational routes and the
/// middleware stack sized by `config`.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    api_routes()
        .merge(flora_telemetry::http::router::<AppState>())
        .with_state(state)
        // `HandleErrorLayer` must wrap the fallible layers to make the service infallible.
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(map_middleware_error))
                .layer(LoadShedLayer::new())
                .layer(ConcurrencyLimitLayer::new(config.concurrency_limit))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.body_limit_kb * 1024))
}

/// Binds `config.listen_addr` and serves until `shutdown_rx` changes.
pub async fn run_server(
    config: ServerConfig,
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = router(state, &config);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "gateway", %addr, "HTTP gateway listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_rx.changed().await.ok();
        tracing::info!(target: "gateway", "shutting down gracefully");
    });

    if let Err(e) = server.await {
        tracing::error!(target: "gateway", error = %e, "server error");
    }

    Ok(())
}
