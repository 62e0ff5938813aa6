//! Static file server behind the container: axum with `ServeDir` on a
//! runtime owned by the server thread.

use std::net::TcpListener as StdListener;
use std::path::PathBuf;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use super::core::MAX_CONNECTIONS;

/// Routes every request to the files under `webdir`.
///
/// Directories answer with their `index.html`, paths that leave the
/// webdir or name nothing answer 404, methods other than GET and HEAD
/// answer 405.
pub(super) fn router(webdir: PathBuf) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(webdir))
        .layer(GlobalConcurrencyLimitLayer::new(MAX_CONNECTIONS))
        .layer(TraceLayer::new_for_http())
}

/// Serve `webdir` on `listener` until `shutdown` fires or its sender drops.
///
/// Blocks the calling thread; in-flight requests finish before it returns.
pub(super) fn serve(listener: StdListener, webdir: PathBuf, shutdown: oneshot::Receiver<()>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to build container runtime: {e}");
            return;
        }
    };
    runtime.block_on(async move {
        let listener = match TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(e) => {
                error!("failed to register container listener: {e}");
                return;
            }
        };
        let served = axum::serve(listener, router(webdir))
            .with_graceful_shutdown(async move {
                let _ = shutdown.await;
                debug!("container shutdown requested");
            })
            .await;
        if let Err(e) = served {
            error!("container server failed: {e}");
        }
    });
}
