use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;

/// Builds the router served on the admin listener.
///
/// - `/health` always returns 200 while the process is up.
/// - `/ready` returns 200 once `is_ready` reports true, 503 before that.
/// - Anything else is a 404.
pub fn admin_router<F>(is_ready: F) -> Router
where
    F: Fn() -> bool + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(|| async { "ok\n" }))
        .route(
            "/ready",
            get(move || {
                let is_ready = is_ready.clone();
                async move {
                    match is_ready() {
                        true => (StatusCode::OK, "ok\n"),
                        false => (StatusCode::SERVICE_UNAVAILABLE, "not ready\n"),
                    }
                }
            }),
        )
        .fallback(|| async { (StatusCode::NOT_FOUND, "not found\n") })
}
