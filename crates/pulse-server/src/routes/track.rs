use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use pulse_core::track::{TrackFact, TrackPayload};

use crate::{error::AppError, state::AppState};

/// `POST /api/track` — ingest one beacon from the embedded tracking script.
///
/// ## Auth
/// None. The payload's own `domain` field is the authorization boundary, not
/// CORS — the script runs on arbitrary customer sites, so CORS is permissive
/// and the URL must instead contain the claimed domain.
///
/// ## Behavior by event kind
/// - `pageview`      → one `page_views` row (`page` = the sent URL).
/// - `session_start` → one `visits` row; the domain must name a registered
///                     website. `source` defaults to "Direct".
/// - `session_end`   → acknowledged, writes nothing (reserved for duration
///                     tracking).
///
/// Blank dimensional fields are normalized to `"Unknown"` before the write;
/// the response echoes the normalized payload:
/// `200` with `{ "success": true, "data": { ... } }`.
///
/// Exactly one fact insert per call (zero for `session_end`). On a storage
/// failure no fact is considered written and the beacon gets
/// `500 {"error":"Failed to process tracking request"}` — callers drop the
/// event rather than retry indefinitely.
#[tracing::instrument(skip(state, payload))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TrackPayload>,
) -> Result<impl IntoResponse, AppError> {
    if !payload.domain_matches() {
        return Err(AppError::DomainMismatch);
    }

    let normalized = payload.normalized();
    let echo = normalized.clone();

    match normalized.into_fact(Utc::now()) {
        TrackFact::SessionStart(visit) => {
            if !state
                .db
                .website_exists(&visit.website_id)
                .await
                .map_err(AppError::Storage)?
            {
                return Err(AppError::NotFound(format!(
                    "Unknown website: {}",
                    visit.website_id
                )));
            }
            state
                .db
                .insert_visit(&visit)
                .await
                .map_err(AppError::Storage)?;
        }
        TrackFact::PageView(view) => {
            // No website check: a pageview may legally arrive before (or
            // without) its session, and the store keeps no referential
            // integrity between the two.
            state
                .db
                .insert_page_view(&view)
                .await
                .map_err(AppError::Storage)?;
        }
        TrackFact::SessionEnd => {}
    }

    Ok(Json(json!({ "success": true, "data": echo })))
}
