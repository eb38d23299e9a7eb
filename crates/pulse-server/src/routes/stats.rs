use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use pulse_core::fact::ViewsResult;
use pulse_core::grouping::{self, Bucket, LocationBucket, SourceBucket};
use pulse_core::metrics;
use pulse_core::window::WindowSpec;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub window: Option<String>,
}

fn parse_window(query: &WindowQuery) -> Result<WindowSpec, AppError> {
    WindowSpec::parse(query.window.as_deref()).map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn require_website(state: &AppState, domain: &str) -> Result<(), AppError> {
    if state.db.website_exists(domain).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Unknown website: {domain}")))
    }
}

/// `GET /api/websites/{domain}/views` — the raw in-window facts:
/// `{ "pageViews": [...], "visits": [...], "customEvents": [...] }`.
///
/// The window is applied in SQL with a per-request clock; reading twice with
/// no intervening writes returns identical results.
#[tracing::instrument(skip(state, query))]
pub async fn get_views(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = parse_window(&query)?;
    require_website(&state, &domain).await?;
    let views = state.db.get_views(&domain, window).await?;
    Ok(Json(views))
}

/// Everything the dashboard's overview needs, derived from one windowed scan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub visits: usize,
    pub page_views: usize,
    /// 0–100, two decimals. 0 when there are no sessions in the window.
    pub bounce_rate: f64,
    pub pages_per_session: f64,
    pub return_rate: f64,
    pub top_pages: Vec<Bucket>,
    pub top_sources: Vec<SourceBucket>,
    pub locations: Vec<LocationBucket>,
    pub operating_systems: Vec<Bucket>,
    pub device_types: Vec<Bucket>,
    pub browsers: Vec<Bucket>,
    pub screen_resolutions: Vec<Bucket>,
    pub custom_events: Vec<Bucket>,
}

impl StatsResponse {
    /// Pure function of the fact set — no store access, no clock.
    pub fn from_views(views: &ViewsResult) -> Self {
        Self {
            visits: views.visits.len(),
            page_views: views.page_views.len(),
            bounce_rate: metrics::bounce_rate(&views.page_views, &views.visits),
            pages_per_session: metrics::pages_per_session(&views.page_views, &views.visits),
            return_rate: metrics::return_rate(&views.visits),
            top_pages: grouping::group_pages(&views.page_views),
            top_sources: grouping::with_percentages(&grouping::group_sources(&views.visits)),
            locations: grouping::group_locations(&views.page_views),
            operating_systems: grouping::group_operating_systems(&views.page_views),
            device_types: grouping::group_device_types(&views.page_views),
            browsers: grouping::group_browsers(&views.page_views),
            screen_resolutions: grouping::group_screen_resolutions(&views.page_views),
            custom_events: grouping::group_event_names(&views.custom_events),
        }
    }
}

/// `GET /api/websites/{domain}/stats` — derived metrics and dimensional
/// breakdowns over the requested window. Stateless read-compute-respond:
/// a superseded poll's result is simply dropped by the client.
#[tracing::instrument(skip(state, query))]
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = parse_window(&query)?;
    require_website(&state, &domain).await?;
    let views = state.db.get_views(&domain, window).await?;
    Ok(Json(StatsResponse::from_views(&views)))
}

/// `GET /api/websites/{domain}/active` — distinct sessions active in the
/// trailing ten minutes. Recomputed per call; poll it (~60s), don't push.
#[tracing::instrument(skip(state))]
pub async fn get_active(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_website(&state, &domain).await?;
    let active = state.db.count_active_sessions(&domain).await?;
    Ok(Json(json!({ "activeUsers": active })))
}
