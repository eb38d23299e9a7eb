use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// `GET /api/websites/{domain}` — website metadata lookup by domain.
///
/// Registration and updates happen in an external flow; this is the read
/// surface the dashboard uses to resolve a domain to its website record.
#[tracing::instrument(skip(state))]
pub async fn get_website(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state.db.get_website(&domain).await? {
        Some(website) => Ok(Json(json!({ "website": website }))),
        None => Err(AppError::NotFound(format!("Unknown website: {domain}"))),
    }
}

/// `DELETE /api/websites/{domain}` — cascading delete of a website and all
/// of its facts.
///
/// The fact deletes and the website-row delete run in a single store
/// transaction, so a mid-cascade failure cannot orphan fact rows referencing
/// a removed website. The response reports what each sub-resource lost:
/// `{ "success": true, "data": { "pageViews": n, "visits": n, "customEvents": n } }`.
#[tracing::instrument(skip(state))]
pub async fn delete_website(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state.db.delete_website(&domain).await? {
        Some(counts) => Ok(Json(json!({
            "success": true,
            "data": {
                "pageViews": counts.page_views,
                "visits": counts.visits,
                "customEvents": counts.custom_events,
            }
        }))),
        None => Err(AppError::NotFound(format!("Unknown website: {domain}"))),
    }
}
