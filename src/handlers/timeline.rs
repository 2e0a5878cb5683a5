use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiError, FieldError};
use crate::extract::AppJson;
use crate::handlers::collect;
use crate::models::{EventType, NewTimelineEvent, Severity, TimelineEventResponse};
use crate::validation::{normalize_enum, parse_timestamp, require_uuid, required};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimelineEventRequest {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub case_id: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_addresses: Option<Vec<String>>,
    pub usernames: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
    pub devices: Option<Vec<String>>,
}

impl CreateTimelineEventRequest {
    fn validate(self) -> Result<NewTimelineEvent, ApiError> {
        let mut errors = Vec::new();

        let timestamp = collect(&mut errors, parse_timestamp("timestamp", &self.timestamp));
        let event_type = collect(
            &mut errors,
            normalize_enum::<EventType>("type", &self.event_type),
        );
        let source = collect(&mut errors, required("source", "Source", &self.source));
        let severity = collect(&mut errors, normalize_enum::<Severity>("severity", &self.severity));
        let title = collect(&mut errors, required("title", "Title", &self.title));
        let description = collect(
            &mut errors,
            required("description", "Description", &self.description),
        );
        let case_id = collect(
            &mut errors,
            require_uuid("caseId", &self.case_id, "Invalid case ID"),
        );
        let metadata = match self.metadata {
            Some(value) if !value.is_object() => {
                errors.push(FieldError::new("metadata", "Metadata must be an object"));
                None
            }
            Some(value) => Some(value),
            None => Some(serde_json::json!({})),
        };

        match (timestamp, event_type, source, severity, title, description, case_id, metadata) {
            (
                Some(timestamp),
                Some(event_type),
                Some(source),
                Some(severity),
                Some(title),
                Some(description),
                Some(case_id),
                Some(metadata),
            ) if errors.is_empty() => Ok(NewTimelineEvent {
                timestamp,
                event_type,
                source,
                severity,
                title,
                description,
                case_id,
                metadata,
                ip_addresses: self.ip_addresses.unwrap_or_default(),
                usernames: self.usernames.unwrap_or_default(),
                files: self.files.unwrap_or_default(),
                devices: self.devices.unwrap_or_default(),
            }),
            _ => Err(ApiError::validation(errors)),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimelineListQuery {
    pub case_id: Option<String>,
    pub severity: Option<String>,
}

/// POST /api/timeline. Critical events raise an alert for the case owner.
pub async fn create(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateTimelineEventRequest>,
) -> Result<(StatusCode, Json<TimelineEventResponse>), ApiError> {
    let input = body.validate()?;
    let case = state
        .db
        .get_case(&input.case_id)
        .await?
        .ok_or_else(|| ApiError::case_not_found(&input.case_id))?;

    let event = state.db.create_timeline_event(input).await?;

    if event.event.severity == Severity::Critical {
        state
            .notifications
            .notify_critical_event(&case.case.created_by_id, &event.event.title, &case.case.id)
            .await;
    }
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/timeline, filterable by case and severity.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TimelineListQuery>,
) -> Result<Json<Vec<TimelineEventResponse>>, ApiError> {
    let severity = match &query.severity {
        Some(raw) => Some(
            normalize_enum::<Severity>("severity", raw).map_err(|e| ApiError::validation(vec![e]))?,
        ),
        None => None,
    };
    Ok(Json(
        state
            .db
            .list_timeline_events(query.case_id.as_deref(), severity)
            .await?,
    ))
}

/// GET /api/timeline/:id.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TimelineEventResponse>, ApiError> {
    let event = state
        .db
        .get_timeline_event(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Timeline event with ID {id} not found")))?;
    Ok(Json(event))
}

/// DELETE /api/timeline/:id.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TimelineEventResponse>, ApiError> {
    Ok(Json(state.db.delete_timeline_event(&id).await?))
}
