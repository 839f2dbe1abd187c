use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use gradebook_db::MAX_GRADES_PER_STUDENT;
use gradebook_db::models::{GradeInsert, NewGrade};
use gradebook_types::api::{AddGradeRequest, Created, GradeEntry};
use gradebook_types::grading::classify_value;

use crate::auth::AppState;
use crate::convert::grade_entry;
use crate::error::ApiError;
use crate::extract::{JsonBody, present};
use crate::notify::notify;
use crate::task::blocking;

/// GET /grades
pub async fn list_grades(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |db| db.list_grades()).await?;
    let grades: Vec<GradeEntry> = rows.into_iter().map(grade_entry).collect();
    Ok(Json(grades))
}

/// POST /grades
pub async fn add_grade(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AddGradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(student_id), Some(subject), Some(score)) =
        (present(&req.student_id), present(&req.subject), req.score.as_ref())
    else {
        return Err(ApiError::bad_request("Student ID, subject and score cannot be empty"));
    };

    let (score, grade) = classify_value(score).ok_or_else(|| ApiError::bad_request("Invalid score"))?;

    let id = Uuid::new_v4().to_string();
    let (student_id, subject) = (student_id.to_string(), subject.to_string());

    let inserted = {
        let (id, student_id, subject) = (id.clone(), student_id.clone(), subject.clone());
        blocking(&state, move |db| {
            if db.get_student(&student_id)?.is_none() {
                return Ok(None);
            }
            let insert = db.add_grade(&NewGrade {
                id: &id,
                student_id: &student_id,
                subject: &subject,
                score,
                grade,
            })?;
            Ok::<_, ApiError>(Some(insert))
        })
        .await?
    };

    match inserted {
        None => return Err(ApiError::not_found("Student not found")),
        Some(GradeInsert::LimitReached) => {
            return Err(ApiError::bad_request(format!(
                "Maximum {} subjects allowed",
                MAX_GRADES_PER_STUDENT
            )));
        }
        Some(GradeInsert::Inserted(_)) => {}
    }

    notify(&state, &student_id, format!("New grade for {}: {}", subject, grade)).await;
    if let Some(teacher_id) = present(&req.teacher_id) {
        notify(&state, teacher_id, format!("Added grade for {}", subject)).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Grade added".into(),
            id,
        }),
    ))
}
