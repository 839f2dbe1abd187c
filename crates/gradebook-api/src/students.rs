use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use gradebook_db::models::NewUser;
use gradebook_types::api::{
    Ack, CreateStudentRequest, Created, RenameStudentRequest, StudentDetail, StudentSummary,
    TrendPoint, TrendResponse,
};
use gradebook_types::grading::{overall_grade, rank_by_grade, trend_stats};
use gradebook_types::models::Role;

use crate::auth::{AppState, hash_password};
use crate::convert::{grade_entry, remark_entry, student_info, target_entry, timestamp};
use crate::error::ApiError;
use crate::extract::{JsonBody, present, required};
use crate::notify::notify;
use crate::task::blocking;

/// GET /students: roster ranked by overall grade, best first.
pub async fn list_students(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let roster = blocking(&state, |db| db.student_roster()).await?;

    let mut students: Vec<StudentSummary> = roster
        .into_iter()
        .map(|entry| StudentSummary {
            general_grade: overall_grade(&entry.scores),
            student: student_info(entry.student),
        })
        .collect();
    rank_by_grade(&mut students, |s| s.general_grade);

    Ok(Json(students))
}

/// POST /students: a teacher enrolls a student with the default password.
pub async fn create_student(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(email), Some(teacher_id)) = (
        present(&req.name),
        present(&req.email),
        present(&req.teacher_id),
    ) else {
        return Err(ApiError::bad_request("Name, email, and teacher ID cannot be empty"));
    };

    let id = Uuid::new_v4().to_string();
    let (name, teacher_id) = (name.to_string(), teacher_id.to_string());

    let teacher = {
        let (id, name, email, teacher_id) = (id.clone(), name.clone(), email.to_string(), teacher_id.clone());
        let password = state.default_student_password.clone();
        blocking(&state, move |db| {
            let password_hash = hash_password(&password)?;
            db.create_user(&NewUser {
                id: &id,
                name: &name,
                email: &email,
                password_hash: &password_hash,
                role: Role::Student,
                teacher_id: Some(&teacher_id),
            })?;
            Ok::<_, ApiError>(db.get_user_by_id(&teacher_id)?)
        })
        .await?
    };

    info!("Student {} ({}) enrolled by {}", name, id, teacher_id);

    notify(&state, &teacher_id, format!("Added student {}", name)).await;
    let welcome = match teacher {
        Some(teacher) => format!("You were added to {}'s class", teacher.name),
        None => "You were added to a class".to_string(),
    };
    notify(&state, &id, welcome).await;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Student added".into(),
            id,
        }),
    ))
}

/// GET /students/{id}
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = blocking(&state, move |db| db.student_record(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    Ok(Json(StudentDetail {
        student: student_info(record.student),
        grades: record.grades.into_iter().map(grade_entry).collect(),
        targets: record.targets.into_iter().map(target_entry).collect(),
        remarks: record.remarks.into_iter().map(remark_entry).collect(),
    }))
}

/// PUT /students/{id}
pub async fn rename_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<RenameStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = required(&req.name, "Name cannot be empty")?.to_string();

    let (sid, new_name) = (id.clone(), name.clone());
    if !blocking(&state, move |db| db.rename_student(&sid, &new_name)).await? {
        return Err(ApiError::not_found("Student not found"));
    }

    notify(&state, &id, format!("Your name was updated to {}", name)).await;

    Ok(Json(Ack::new("Student updated")))
}

/// DELETE /students/{id}: removes the student and their user account.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sid = id.clone();
    let student = blocking(&state, move |db| db.delete_student(&sid))
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    info!("Student {} ({}) deleted", student.name, id);

    if let Some(teacher_id) = &student.teacher_id {
        notify(&state, teacher_id, format!("Student {} was removed", student.name)).await;
    }

    Ok(Json(Ack::new("Student deleted")))
}

/// GET /students/{id}/trends
pub async fn student_trends(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let grades = blocking(&state, move |db| {
        if db.get_student(&id)?.is_none() {
            return Ok(None);
        }
        Ok::<_, ApiError>(Some(db.grades_for_student(&id)?))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Student not found"))?;

    let stats = trend_stats(grades.iter().map(|g| (g.subject.as_str(), g.score)));

    Ok(Json(TrendResponse {
        grades: grades
            .iter()
            .map(|g| TrendPoint {
                subject: g.subject.clone(),
                score: g.score,
                created_at: timestamp(&g.created_at),
            })
            .collect(),
        average_score: stats.average_score,
        subject_averages: stats.subject_averages,
    }))
}
