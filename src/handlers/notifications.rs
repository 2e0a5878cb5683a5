use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::auth::Claims;
use crate::handlers::MessageResponse;
use crate::notifications::Notification;
use crate::AppState;

/// GET /api/notifications. Newest first, capped per user.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<Vec<Notification>> {
    Json(state.notifications.list_for_user(&claims.sub).await)
}

/// PUT /api/notifications/:id/read.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Json<MessageResponse> {
    state.notifications.mark_read(&claims.sub, &id).await;
    Json(MessageResponse::new("Notification marked as read"))
}

/// PUT /api/notifications/read-all.
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<MessageResponse> {
    state.notifications.mark_all_read(&claims.sub).await;
    Json(MessageResponse::new("All notifications marked as read"))
}

/// DELETE /api/notifications/:id.
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Json<MessageResponse> {
    state.notifications.delete(&claims.sub, &id).await;
    Json(MessageResponse::new("Notification deleted"))
}
