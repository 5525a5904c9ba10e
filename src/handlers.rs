/// Axum handler for the relay endpoint
use crate::AppState;
use crate::client::HttpClient;
use crate::errors::RelayError;
use crate::models::{ChatReply, ChatRequest, UpstreamReply, UpstreamRequest};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, header},
};
use tracing::{debug, error, info, instrument};
use url::Url;

/// `POST /chat`: forward one user message upstream and relay the answer.
///
/// The body is taken raw rather than through `Json` so that malformed input is reported
/// in the same `{error}` shape as every other failure.
#[instrument(skip(state, body))]
pub async fn chat<T: HttpClient>(
    State(state): State<AppState<T>>,
    body: Bytes,
) -> Result<Json<ChatReply>, RelayError> {
    match relay(&state, &body).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            debug!("Relay failed with {}: {}", e.status_code(), e);
            Err(e)
        }
    }
}

/// The relay itself, independent of axum extraction.
pub async fn relay<T: HttpClient>(
    state: &AppState<T>,
    body: &[u8],
) -> Result<ChatReply, RelayError> {
    let request = ChatRequest::from_slice(body)?;
    let (message, api_key) = request.fields().ok_or(RelayError::MissingFields)?;

    debug!("Received chat message of {} bytes", message.len());
    let upstream_req = upstream_request(&state.upstream_url, message, api_key)?;

    info!("Forwarding chat message to {}", state.upstream_url);
    let response = state.http_client.request(upstream_req).await.map_err(|e| {
        error!(
            "Error forwarding request to upstream {}: {}",
            state.upstream_url, e
        );
        RelayError::unexpected(e)
    })?;

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(RelayError::unexpected)?;

    if status != StatusCode::OK {
        info!("Upstream answered with status {}", status);
        return Err(RelayError::Upstream {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    let reply: UpstreamReply = serde_json::from_slice(&bytes).map_err(RelayError::unexpected)?;
    Ok(ChatReply {
        response: reply.response,
    })
}

/// Builds the outbound request. Fails if the key cannot be carried in a header.
fn upstream_request(
    url: &Url,
    message: &str,
    api_key: &str,
) -> Result<axum::extract::Request, RelayError> {
    let payload =
        serde_json::to_vec(&UpstreamRequest::user(message)).map_err(RelayError::unexpected)?;

    axum::http::Request::builder()
        .method(Method::POST)
        .uri(url.as_str())
        .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(payload))
        .map_err(RelayError::unexpected)
}
