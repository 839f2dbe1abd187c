use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};
use uuid::Uuid;

use gradebook_db::models::NewAssignment;
use gradebook_types::api::{
    Ack, AssignmentEntry, AssignmentQuery, AssignmentSubmitted, UpdateAssignmentStatusRequest,
};
use gradebook_types::models::AssignmentStatus;

use crate::auth::AppState;
use crate::convert::assignment_entry;
use crate::error::ApiError;
use crate::extract::{JsonBody, present};
use crate::notify::notify;
use crate::task::blocking;
use crate::uploads::{
    ASSIGNMENT_EXTENSIONS, allowed_extension, is_safe_id, read_multipart, stored_name, text_field,
};

/// GET /assignments?teacher_id=..|student_id=..
///
/// `teacher_id` wins when both are given; neither lists everything.
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(query): Query<AssignmentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let teacher_id = present(&query.teacher_id).map(str::to_string);
    let student_id = present(&query.student_id).map(str::to_string);

    let rows = blocking(&state, move |db| match (teacher_id, student_id) {
        (Some(teacher_id), _) => db.assignments_for_teacher(&teacher_id),
        (None, Some(student_id)) => db.assignments_for_student(&student_id),
        (None, None) => db.list_assignments(),
    })
    .await?;

    let assignments: Vec<AssignmentEntry> = rows.into_iter().map(assignment_entry).collect();
    Ok(Json(assignments))
}

/// POST /assignments (multipart: `file`, `title`, `student_id`, `teacher_id`)
pub async fn submit_assignment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (fields, file) = read_multipart(multipart, "file").await?;

    let (Some(file), Some(title), Some(student_id), Some(teacher_id)) = (
        file.filter(|f| !f.file_name.is_empty()),
        text_field(&fields, "title"),
        text_field(&fields, "student_id"),
        text_field(&fields, "teacher_id"),
    ) else {
        return Err(ApiError::bad_request("Missing file, title, student ID, or teacher ID"));
    };

    if !is_safe_id(student_id) {
        return Err(ApiError::bad_request("Invalid student ID"));
    }
    let ext = allowed_extension(&file.file_name, ASSIGNMENT_EXTENSIONS)
        .ok_or_else(|| ApiError::bad_request("Invalid file type"))?;

    let (title, student_id, teacher_id) = (title.to_string(), student_id.to_string(), teacher_id.to_string());

    let sid = student_id.clone();
    let student = blocking(&state, move |db| db.get_student(&sid))
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    let filename = stored_name(&format!("assignment_{}", student_id), &ext);
    state.uploads.save(&filename, &file.data).await.map_err(|e| {
        error!("Failed to store assignment {}: {}", filename, e);
        ApiError::internal("Upload failed", e)
    })?;

    let id = Uuid::new_v4().to_string();
    let created = {
        let (id, student_id, teacher_id, title, filename) =
            (id.clone(), student_id.clone(), teacher_id.clone(), title.clone(), filename.clone());
        blocking(&state, move |db| {
            db.create_assignment(&NewAssignment {
                id: &id,
                student_id: &student_id,
                teacher_id: &teacher_id,
                title: &title,
                file_path: &filename,
                status: AssignmentStatus::Submitted,
            })
        })
        .await
    };
    if let Err(e) = created {
        state.uploads.discard(&filename).await;
        return Err(e);
    }

    info!("Assignment {} ({}) submitted by {}", title, id, student_id);

    notify(&state, &student_id, format!("Assignment {} submitted", title)).await;
    notify(
        &state,
        &teacher_id,
        format!("New assignment {} from {}", title, student.name),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentSubmitted {
            message: "Assignment submitted".into(),
            id,
            file_path: filename,
        }),
    ))
}

/// PUT /assignments/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateAssignmentStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req
        .parsed_status()
        .ok_or_else(|| ApiError::bad_request("Invalid status"))?;

    let assignment = blocking(&state, move |db| db.update_assignment_status(&id, status))
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

    notify(
        &state,
        &assignment.student_id,
        format!("Assignment {} status updated to {}", assignment.title, status),
    )
    .await;

    Ok(Json(Ack::new("Status updated")))
}
