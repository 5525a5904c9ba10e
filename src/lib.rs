//! nvrelay - a minimal chat relay for the NVIDIA LLM API
//!
//! Browsers post `{message, apiKey}` to `/chat`; the relay forwards the message to the
//! upstream chat endpoint with the caller's key as a bearer token and hands back either
//! `{response}` or `{error}`. Nothing is stored between requests.

use axum::Router;
use axum::routing::post;
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument};
use url::Url;

pub mod client;
pub mod errors;
pub mod handlers;
pub mod models;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use client::{HttpClient, HyperClient, PoolConfig};
use handlers::chat;

/// Where chat messages go when nothing else is configured.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.nvidia.com/v1/chat";

/// Immutable per-process state shared by every request.
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub http_client: T,
    pub upstream_url: Url,
}

impl AppState<HyperClient> {
    /// Create a new AppState backed by a pooled hyper client
    pub fn new(upstream_url: Url, pool: PoolConfig) -> Self {
        Self {
            http_client: client::create_hyper_client(pool),
            upstream_url,
        }
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(upstream_url: Url, http_client: T) -> Self {
        Self {
            http_client,
            upstream_url,
        }
    }
}

/// Any origin, any method, any header.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the relay router: `POST /chat`, with permissive CORS on every response.
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    Router::new()
        .route("/chat", post(chat))
        .layer(cors_layer())
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// `prefix` is prepended to every metric name; it must live for the whole program.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}
