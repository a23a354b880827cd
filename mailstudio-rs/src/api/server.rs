//! API server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{self, AppState};
use crate::error::Result;
use crate::storage::Storage;

pub struct ApiServer {
    state: Arc<AppState>,
    listen_addr: String,
}

impl ApiServer {
    pub fn new(storage: Arc<Storage>, listen_addr: impl Into<String>) -> Self {
        Self {
            state: Arc::new(AppState { storage }),
            listen_addr: listen_addr.into(),
        }
    }

    /// Build the router. Exposed separately so tests can drive it with
    /// `tower::ServiceExt::oneshot` without binding a socket.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/api/emails",
                get(handlers::list_emails).post(handlers::create_email),
            )
            .route(
                "/api/emails/:id",
                get(handlers::get_email)
                    .put(handlers::update_email)
                    .delete(handlers::delete_email),
            )
            .route(
                "/api/designs",
                get(handlers::list_designs).post(handlers::create_design),
            )
            .route(
                "/api/designs/:id",
                get(handlers::get_design)
                    .put(handlers::update_design)
                    .delete(handlers::delete_design),
            )
            .route(
                "/api/providers",
                get(handlers::list_providers).post(handlers::create_provider),
            )
            .route(
                "/api/providers/:id",
                get(handlers::get_provider)
                    .put(handlers::update_provider)
                    .delete(handlers::delete_provider),
            )
            .route("/api/providers/:id/test", post(handlers::test_provider))
            .route("/api/send", post(handlers::send_email))
            .route("/api/send/test", post(handlers::send_test_email))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.listen_addr).await?;
        info!("API server listening on {}", self.listen_addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
