use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::Claims;
use crate::errors::{ApiError, FieldError};
use crate::extract::AppJson;
use crate::handlers::collect;
use crate::models::{
    CaseChanges, CaseDetailResponse, CaseFilter, CaseResponse, CaseStatus, NewCase, Severity,
};
use crate::validation::{double_option, in_range, normalize_enum, require_uuid, required_text};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub city: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseRequest {
    pub title: String,
    pub description: String,
    pub severity: String,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<LocationInput>,
    pub assigned_to_id: Option<String>,
}

impl CreateCaseRequest {
    fn validate(self) -> Result<NewCase, ApiError> {
        let mut errors = Vec::new();

        let title = collect(&mut errors, required_text("title", "Title", &self.title, 3, 200));
        let description = collect(
            &mut errors,
            required_text("description", "Description", &self.description, 10, 5000),
        );
        let severity = collect(&mut errors, normalize_enum::<Severity>("severity", &self.severity));
        let status = match &self.status {
            Some(raw) => collect(&mut errors, normalize_enum::<CaseStatus>("status", raw)),
            None => Some(CaseStatus::Open),
        };
        let tags = match self.tags {
            Some(tags) => collect(&mut errors, validate_tags(tags)),
            None => Some(Vec::new()),
        };

        let mut location_city = None;
        let mut location_country = None;
        let mut location_lat = None;
        let mut location_lng = None;
        if let Some(location) = &self.location {
            location_city = collect(
                &mut errors,
                required_text("location.city", "City", &location.city, 1, 100),
            );
            location_country = collect(
                &mut errors,
                required_text("location.country", "Country", &location.country, 1, 100),
            );
            if let Some(lat) = location.lat {
                location_lat = collect(&mut errors, in_range("location.lat", lat, -90.0, 90.0));
            }
            if let Some(lng) = location.lng {
                location_lng = collect(&mut errors, in_range("location.lng", lng, -180.0, 180.0));
            }
        }

        let assigned_to_id = match &self.assigned_to_id {
            Some(id) => {
                collect(&mut errors, require_uuid("assignedToId", id, "Invalid user ID")).map(Some)
            }
            None => Some(None),
        };

        match (title, description, severity, status, tags, assigned_to_id) {
            (
                Some(title),
                Some(description),
                Some(severity),
                Some(status),
                Some(tags),
                Some(assigned_to_id),
            ) if errors.is_empty() => Ok(NewCase {
                title,
                description,
                status,
                severity,
                tags,
                location_city,
                location_country,
                location_lat,
                location_lng,
                assigned_to_id,
            }),
            _ => Err(ApiError::validation(errors)),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to_id: Option<Option<String>>,
}

impl UpdateCaseRequest {
    fn validate(self) -> Result<CaseChanges, ApiError> {
        let mut errors = Vec::new();

        let title = match &self.title {
            Some(raw) => {
                collect(&mut errors, required_text("title", "Title", raw, 3, 200)).map(Some)
            }
            None => Some(None),
        };
        let description = match &self.description {
            Some(raw) => collect(
                &mut errors,
                required_text("description", "Description", raw, 10, 5000),
            )
            .map(Some),
            None => Some(None),
        };
        let severity = match &self.severity {
            Some(raw) => {
                collect(&mut errors, normalize_enum::<Severity>("severity", raw)).map(Some)
            }
            None => Some(None),
        };
        let status = match &self.status {
            Some(raw) => {
                collect(&mut errors, normalize_enum::<CaseStatus>("status", raw)).map(Some)
            }
            None => Some(None),
        };
        let tags = match self.tags {
            Some(tags) => collect(&mut errors, validate_tags(tags)).map(Some),
            None => Some(None),
        };
        // Some(None) clears the assignee, None leaves it untouched.
        let assigned_to_id = match &self.assigned_to_id {
            Some(Some(id)) => {
                collect(&mut errors, require_uuid("assignedToId", id, "Invalid user ID"))
                    .map(|id| Some(Some(id)))
            }
            Some(None) => Some(Some(None)),
            None => Some(None),
        };

        match (title, description, severity, status, tags, assigned_to_id) {
            (
                Some(title),
                Some(description),
                Some(severity),
                Some(status),
                Some(tags),
                Some(assigned_to_id),
            ) if errors.is_empty() => {
                let changes = CaseChanges {
                    title,
                    description,
                    status,
                    severity,
                    tags,
                    assigned_to_id,
                };
                if changes.is_empty() {
                    return Err(ApiError::bad_request(
                        "At least one field must be provided for update",
                    ));
                }
                Ok(changes)
            }
            _ => Err(ApiError::validation(errors)),
        }
    }
}

fn validate_tags(tags: Vec<String>) -> Result<Vec<String>, FieldError> {
    if tags.len() > 20 {
        return Err(FieldError::new("tags", "Maximum 20 tags allowed"));
    }
    let mut cleaned = Vec::with_capacity(tags.len());
    for tag in &tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || trimmed.chars().count() > 50 {
            return Err(FieldError::new(
                "tags",
                "Each tag must be between 1 and 50 characters",
            ));
        }
        cleaned.push(trimmed.to_owned());
    }
    Ok(cleaned)
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaseListQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub assigned_to_id: Option<String>,
    pub created_by_id: Option<String>,
}

impl CaseListQuery {
    fn validate(self) -> Result<CaseFilter, ApiError> {
        let mut errors = Vec::new();

        let status = match &self.status {
            Some(raw) => {
                collect(&mut errors, normalize_enum::<CaseStatus>("status", raw)).map(Some)
            }
            None => Some(None),
        };
        let severity = match &self.severity {
            Some(raw) => {
                collect(&mut errors, normalize_enum::<Severity>("severity", raw)).map(Some)
            }
            None => Some(None),
        };
        let assigned_to_id = match &self.assigned_to_id {
            Some(id) => {
                collect(&mut errors, require_uuid("assignedToId", id, "Invalid user ID")).map(Some)
            }
            None => Some(None),
        };
        let created_by_id = match &self.created_by_id {
            Some(id) => {
                collect(&mut errors, require_uuid("createdById", id, "Invalid user ID")).map(Some)
            }
            None => Some(None),
        };

        match (status, severity, assigned_to_id, created_by_id) {
            (Some(status), Some(severity), Some(assigned_to_id), Some(created_by_id))
                if errors.is_empty() =>
            {
                Ok(CaseFilter { status, severity, assigned_to_id, created_by_id })
            }
            _ => Err(ApiError::validation(errors)),
        }
    }
}

/// POST /api/cases.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(body): AppJson<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), ApiError> {
    let input = body.validate()?;
    let case = state.db.create_case(&claims.sub, input).await?;

    state
        .notifications
        .notify_case_created(&claims.sub, &case.case.title, &case.case.id)
        .await;
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /api/cases.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CaseListQuery>,
) -> Result<Json<Vec<CaseResponse>>, ApiError> {
    let filter = query.validate()?;
    Ok(Json(state.db.list_cases(&filter).await?))
}

/// GET /api/cases/:id. Full detail with nested evidence, custody chains and
/// timeline events.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CaseDetailResponse>, ApiError> {
    let case = state
        .db
        .get_case_detail(&id)
        .await?
        .ok_or_else(|| ApiError::case_not_found(&id))?;
    Ok(Json(case))
}

/// PUT /api/cases/:id.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateCaseRequest>,
) -> Result<Json<CaseResponse>, ApiError> {
    let changes = body.validate()?;
    Ok(Json(state.db.update_case(&id, &changes).await?))
}

/// DELETE /api/cases/:id. Removes the case together with its evidence,
/// custody entries and timeline events.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CaseResponse>, ApiError> {
    Ok(Json(state.db.delete_case(&id).await?))
}
