//! Read API over the journal.
//!
//! Two routes, both read-only:
//!
//! - `GET /journal` - every record, newest first
//! - `GET /journal/{date}` - the record for one `YYYY-MM-DD` date
//!
//! Bodies use the [`ApiResponse`] envelope, including timeouts (408). Each
//! request gets an `x-request-id` header, a trace span, a timeout, and panic
//! recovery.

mod handlers;
/// Response envelope and error mapping.
pub mod response;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::Request;
use axum::routing::get;
use axum::{BoxError, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use journal_core::JournalReader;

pub use response::{ApiError, ApiResponse, ResponseStatus};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct ApiState {
    reader: Arc<dyn JournalReader>,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState").finish_non_exhaustive()
    }
}

/// Builds the read API router with its middleware stack.
pub fn router(reader: Arc<dyn JournalReader>, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new());

    Router::new()
        .route("/journal", get(handlers::list_journal))
        .route("/journal/:date", get(handlers::get_journal_entry))
        .with_state(ApiState { reader })
        .layer(middleware)
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        warn!("Request timed out");
        ApiError::Timeout
    } else {
        error!(error = %err, "Unhandled middleware error");
        ApiError::Internal
    }
}

/// Serves `app` on `listener` until `shutdown` is cancelled, then drains
/// in-flight requests.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!(%address, "Read API listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
