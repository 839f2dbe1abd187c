use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use gradebook_types::api::{AddRemarkRequest, Created};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, present, required};
use crate::notify::notify;
use crate::task::blocking;

/// POST /remarks
pub async fn add_remark(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AddRemarkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = required(&req.student_id, "Student ID cannot be empty")?.to_string();
    let content = required(&req.content, "Remark cannot be empty")?.to_string();
    let teacher_id = present(&req.teacher_id).map(str::to_string);

    let id = Uuid::new_v4().to_string();
    let found = {
        let (id, student_id, content) = (id.clone(), student_id.clone(), content.clone());
        blocking(&state, move |db| {
            if db.get_student(&student_id)?.is_none() {
                return Ok(false);
            }
            db.create_remark(&id, &student_id, teacher_id.as_deref(), &content)?;
            Ok::<_, ApiError>(true)
        })
        .await?
    };
    if !found {
        return Err(ApiError::not_found("Student not found"));
    }

    notify(&state, &student_id, format!("New remark: {}", content)).await;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Remark added".into(),
            id,
        }),
    ))
}
