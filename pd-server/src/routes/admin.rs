//! Administrative endpoints. Access is enforced by the role gate.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use pd_models::DatabaseStats;

use crate::error::ApiError;
use crate::routes::blocking;
use crate::server::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin-action/stats", get(stats))
}

/// GET /api/admin-action/stats
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<DatabaseStats>, ApiError> {
    let database = state.services.database.clone();
    let stats = blocking(move || database.stats()).await?;
    Ok(Json(stats))
}
