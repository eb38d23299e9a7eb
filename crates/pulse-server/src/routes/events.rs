use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use pulse_core::fact::CustomEvent;
use pulse_metadata::EventSummary;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CustomEventPayload {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub description: String,
}

/// Extract the raw key from an `Authorization: Bearer ...` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// `POST /api/events` — record a custom event from a server-side API client.
///
/// Status ladder:
/// - `401` missing header / non-Bearer scheme,
/// - `403` key not found in the directory,
/// - `400` empty name or domain after trimming,
/// - `200` recorded — including the partial case where the owner's webhook
///   push failed, annotated as `{"message":"success","notification":"failed"}`.
///
/// The notification is strictly best-effort: its failure changes only the
/// response annotation, never the fate of the fact write.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn record_custom_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CustomEventPayload>,
) -> Result<impl IntoResponse, AppError> {
    let Some(token) = bearer_token(&headers) else {
        return Err(AppError::Unauthorized);
    };
    let Some(owner) = state.directory.resolve_api_key(token).await? else {
        return Err(AppError::Forbidden);
    };

    if payload.name.trim().is_empty() || payload.domain.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name or Domain Fields Must NOT Be Empty.".to_string(),
        ));
    }

    let event = CustomEvent::record(
        &payload.name,
        &payload.domain,
        &payload.description,
        Utc::now(),
    );
    state
        .db
        .insert_custom_event(&event)
        .await
        .map_err(AppError::Storage)?;

    if let Some(webhook) = owner.discord_webhook.as_deref() {
        let summary = EventSummary {
            event_name: event.event_name.clone(),
            website: event.website_id.clone(),
            message: event.message.clone(),
            timestamp: event.created_at.to_rfc3339(),
        };
        if let Err(e) = state.notifier.push(webhook, &summary).await {
            warn!(
                error = %e,
                event_name = %event.event_name,
                website = %event.website_id,
                "Custom event recorded but notification failed"
            );
            return Ok(Json(
                json!({ "message": "success", "notification": "failed" }),
            ));
        }
    }

    Ok(Json(json!({ "message": "success" })))
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub domain: Option<String>,
}

/// `GET /api/events` — the full custom-event collection, newest first,
/// optionally scoped with `?domain=`. Unpaginated.
#[tracing::instrument(skip(state))]
pub async fn list_custom_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .db
        .list_custom_events(query.domain.as_deref())
        .await?;
    Ok(Json(json!({ "events": events })))
}
