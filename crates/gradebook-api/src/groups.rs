use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};
use uuid::Uuid;

use gradebook_types::api::{Ack, CreateRoomRequest, Created, GroupDetail, GroupEntry, MembershipRequest};

use crate::auth::AppState;
use crate::chatrooms::Enrollment;
use crate::convert::group_entry;
use crate::error::ApiError;
use crate::extract::{JsonBody, present, required};
use crate::notify::notify;
use crate::task::blocking;

/// GET /groups
pub async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |db| db.list_groups()).await?;
    let groups: Vec<GroupEntry> = rows.into_iter().map(group_entry).collect();
    Ok(Json(groups))
}

/// POST /groups
pub async fn create_group(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(teacher_id)) = (present(&req.name), present(&req.teacher_id)) else {
        return Err(ApiError::bad_request("Name and teacher ID cannot be empty"));
    };
    let (name, teacher_id) = (name.to_string(), teacher_id.to_string());

    let id = Uuid::new_v4().to_string();
    {
        let (id, name, teacher_id) = (id.clone(), name.clone(), teacher_id.clone());
        blocking(&state, move |db| db.create_group(&id, &name, &teacher_id)).await?;
    }

    notify(&state, &teacher_id, format!("Created group {}", name)).await;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Group created".into(),
            id,
        }),
    ))
}

/// GET /groups/{id}
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (group, members) = blocking(&state, move |db| db.group_detail(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;

    Ok(Json(GroupDetail {
        group: group_entry(group),
        members,
    }))
}

/// DELETE /groups/{id}: memberships go with the group.
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let gid = id.clone();
    let group = blocking(&state, move |db| db.delete_group(&gid))
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;

    info!("Group {} ({}) deleted", group.name, id);

    notify(&state, &group.teacher_id, format!("Group {} deleted", group.name)).await;

    Ok(Json(Ack::new("Group deleted")))
}

/// POST /groups/{id}/members: only the student's own teacher may add them.
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<MembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = required(&req.student_id, "Student ID cannot be empty")?.to_string();
    let teacher_id = required(&req.teacher_id, "Teacher ID cannot be empty")?.to_string();

    let sid = student_id.clone();
    let outcome = blocking(&state, move |db| {
        let Some(group) = db.get_group(&id)? else {
            return Ok(Enrollment::ParentMissing);
        };
        let Some(student) = db.get_student(&sid)? else {
            return Ok(Enrollment::StudentMissing);
        };
        if student.teacher_id.as_deref() != Some(teacher_id.as_str()) {
            return Ok(Enrollment::NotInClass);
        }
        if !db.add_group_member(&group.id, &sid)? {
            debug!("{} is already in group {}", sid, group.id);
        }
        Ok::<_, ApiError>(Enrollment::Added {
            parent_name: group.name,
        })
    })
    .await?;

    let group_name = match outcome {
        Enrollment::Added { parent_name } => parent_name,
        Enrollment::ParentMissing => return Err(ApiError::not_found("Group not found")),
        Enrollment::StudentMissing => return Err(ApiError::not_found("Student not found")),
        Enrollment::NotInClass => return Err(ApiError::bad_request("Student not in your class")),
    };

    notify(&state, &student_id, format!("Added to group {}", group_name)).await;

    Ok(Json(Ack::new("Member added")))
}

/// DELETE /groups/{id}/members
pub async fn remove_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<MembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = required(&req.student_id, "Student ID cannot be empty")?.to_string();

    let sid = student_id.clone();
    let removed = blocking(&state, move |db| {
        let Some(group) = db.get_group(&id)? else {
            return Ok(None);
        };
        let removed = db.remove_group_member(&group.id, &sid)?;
        Ok::<_, ApiError>(Some((group.name, removed)))
    })
    .await?;

    match removed {
        None => return Err(ApiError::not_found("Group not found")),
        Some((group_name, true)) => {
            notify(&state, &student_id, format!("Removed from group {}", group_name)).await;
        }
        Some((_, false)) => {}
    }

    Ok(Json(Ack::new("Member removed")))
}
