//! Read-only admin API.
//!
//! Exposes the live override tables, the sampler and the control loop state
//! for operators. Every route requires `Authorization: Bearer <api_key>`.

pub mod handlers;
pub mod auth;

use std::sync::Arc;
use axum::{
    routing::get,
    Router,
    middleware,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use crate::control::LoopStateHandle;
use crate::levels::LevelRegistry;
use crate::sampling::DynamicSampler;
use self::handlers::*;
use self::auth::admin_auth_middleware;

/// Shared handles the admin handlers read from.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<LevelRegistry>,
    pub sampler: Arc<DynamicSampler>,
    pub loop_state: LoopStateHandle,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/levels", get(get_levels))
        .route("/admin/sampler", get(get_sampler))
        .route("/admin/decision/{logger}", get(get_decision))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
