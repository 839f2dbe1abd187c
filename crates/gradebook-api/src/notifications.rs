use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use gradebook_types::api::{Ack, MarkReadRequest, NotificationEntry};

use crate::auth::AppState;
use crate::convert::notification_entry;
use crate::error::ApiError;
use crate::extract::{JsonBody, required};
use crate::task::blocking;

/// GET /notifications/{user_id}: newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |db| db.notifications_for_user(&user_id)).await?;
    let notifications: Vec<NotificationEntry> = rows.into_iter().map(notification_entry).collect();
    Ok(Json(notifications))
}

/// PUT /notifications/{user_id}: mark one of this user's notifications read.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<MarkReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let notification_id = required(&req.notification_id, "Notification ID cannot be empty")?.to_string();

    let updated = blocking(&state, move |db| db.mark_notification_read(&notification_id, &user_id)).await?;
    if !updated {
        return Err(ApiError::not_found("Notification not found"));
    }

    Ok(Json(Ack::new("Notification marked as read")))
}
