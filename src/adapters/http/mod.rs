pub mod handler;
pub mod response;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::service::InviteService;
use crate::domain::ports::{CustomerFilter, CustomersParser, FilterCache};
use crate::utils::error::Result;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub struct HttpState<P, F, C>
where
    P: CustomersParser,
    F: CustomerFilter,
    C: FilterCache,
{
    pub service: InviteService<P, F, C>,
    pub max_upload_bytes: usize,
}

impl<P, F, C> HttpState<P, F, C>
where
    P: CustomersParser,
    F: CustomerFilter,
    C: FilterCache,
{
    pub fn new(service: InviteService<P, F, C>, max_upload_bytes: usize) -> Self {
        Self {
            service,
            max_upload_bytes,
        }
    }
}

pub fn router<P, F, C>(state: Arc<HttpState<P, F, C>>) -> Router
where
    P: CustomersParser + 'static,
    F: CustomerFilter + 'static,
    C: FilterCache + 'static,
{
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(handler::health))
        .route(
            "/filter-customers",
            post(handler::filter_customers::<P, F, C>).fallback(handler::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<S>(listener: TcpListener, app: Router, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    info!(address = %address, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
