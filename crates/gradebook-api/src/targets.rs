use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use gradebook_types::api::{Created, SetTargetRequest};
use gradebook_types::grading::coerce_score;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, present};
use crate::notify::notify;
use crate::task::blocking;

/// POST /targets: target score for a subject, in `0..=100`.
pub async fn set_target(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SetTargetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::bad_request("Invalid subject or target (0-100)");

    let student_id = present(&req.student_id)
        .ok_or_else(|| ApiError::bad_request("Student ID cannot be empty"))?
        .to_string();
    let subject = present(&req.subject).ok_or_else(invalid)?.to_string();
    let target = req
        .target
        .as_ref()
        .and_then(coerce_score)
        .filter(|t| (0..=100).contains(t))
        .ok_or_else(invalid)?;

    let id = Uuid::new_v4().to_string();
    let found = {
        let (id, student_id, subject) = (id.clone(), student_id.clone(), subject.clone());
        blocking(&state, move |db| {
            if db.get_student(&student_id)?.is_none() {
                return Ok(false);
            }
            db.create_target(&id, &student_id, &subject, target)?;
            Ok::<_, ApiError>(true)
        })
        .await?
    };
    if !found {
        return Err(ApiError::not_found("Student not found"));
    }

    notify(&state, &student_id, format!("Set target for {}: {}", subject, target)).await;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Target set".into(),
            id,
        }),
    ))
}
