//! Category route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::backend::Category;
use crate::error::Result;
use crate::state::AppState;

/// List all categories.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state.backend().list_categories().await?;
    Ok(Json(categories))
}
