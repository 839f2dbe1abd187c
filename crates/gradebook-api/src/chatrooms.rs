use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use gradebook_types::api::{
    Ack, ChatroomEntry, ChatroomMessages, CreateRoomRequest, Created, MembershipRequest,
    SendChatMessageRequest,
};

use crate::auth::AppState;
use crate::convert::{chat_message_entry, chatroom_entry};
use crate::error::ApiError;
use crate::extract::{JsonBody, present, required};
use crate::notify::{notify, notify_all};
use crate::task::blocking;

const DEFAULT_MESSAGE_TYPE: &str = "text";

/// Outcome of a membership change that depends on the teacher-student link.
pub(crate) enum Enrollment {
    Added { parent_name: String },
    ParentMissing,
    StudentMissing,
    NotInClass,
}

/// GET /chatrooms
pub async fn list_chatrooms(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |db| db.list_chatrooms()).await?;
    let rooms: Vec<ChatroomEntry> = rows.into_iter().map(chatroom_entry).collect();
    Ok(Json(rooms))
}

/// POST /chatrooms
pub async fn create_chatroom(
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
        blocking(&state, move |db| db.create_chatroom(&id, &name, &teacher_id)).await?;
    }

    notify(&state, &teacher_id, format!("Created chatroom {}", name)).await;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Chatroom created".into(),
            id,
        }),
    ))
}

/// POST /chatrooms/{id}/invite: only the student's own teacher may invite.
pub async fn invite(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<MembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = required(&req.student_id, "Student ID cannot be empty")?.to_string();
    let teacher_id = required(&req.teacher_id, "Teacher ID cannot be empty")?.to_string();

    let sid = student_id.clone();
    let outcome = blocking(&state, move |db| {
        let Some(room) = db.get_chatroom(&id)? else {
            return Ok(Enrollment::ParentMissing);
        };
        let Some(student) = db.get_student(&sid)? else {
            return Ok(Enrollment::StudentMissing);
        };
        if student.teacher_id.as_deref() != Some(teacher_id.as_str()) {
            return Ok(Enrollment::NotInClass);
        }
        if !db.add_chatroom_member(&room.id, &sid)? {
            debug!("{} is already in chatroom {}", sid, room.id);
        }
        Ok::<_, ApiError>(Enrollment::Added {
            parent_name: room.name,
        })
    })
    .await?;

    let room_name = match outcome {
        Enrollment::Added { parent_name } => parent_name,
        Enrollment::ParentMissing => return Err(ApiError::not_found("Chatroom not found")),
        Enrollment::StudentMissing => return Err(ApiError::not_found("Student not found")),
        Enrollment::NotInClass => return Err(ApiError::bad_request("Student not in your class")),
    };

    notify(&state, &student_id, format!("Invited to chatroom {}", room_name)).await;

    Ok(Json(Ack::new("Invitation sent")))
}

/// POST /chatrooms/{id}/remove
pub async fn remove_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<MembershipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = required(&req.student_id, "Student ID cannot be empty")?.to_string();

    let sid = student_id.clone();
    let removed = blocking(&state, move |db| {
        let Some(room) = db.get_chatroom(&id)? else {
            return Ok(None);
        };
        let removed = db.remove_chatroom_member(&room.id, &sid)?;
        Ok::<_, ApiError>(Some((room.name, removed)))
    })
    .await?;

    match removed {
        None => return Err(ApiError::not_found("Chatroom not found")),
        Some((room_name, true)) => {
            notify(&state, &student_id, format!("Removed from chatroom {}", room_name)).await;
        }
        Some((_, false)) => {}
    }

    Ok(Json(Ack::new("Student removed")))
}

/// GET /chatrooms/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transcript = blocking(&state, move |db| {
        if db.get_chatroom(&id)?.is_none() {
            return Ok(None);
        }
        Ok::<_, ApiError>(Some(db.chatroom_transcript(&id)?))
    })
    .await?;

    let (messages, members) = transcript.ok_or_else(|| ApiError::not_found("Chatroom not found"))?;

    Ok(Json(ChatroomMessages {
        messages: messages.into_iter().map(chat_message_entry).collect(),
        members,
    }))
}

/// POST /chatrooms/{id}/messages: every other member and the room's teacher
/// get a notification.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<SendChatMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = required(&req.user_id, "User ID cannot be empty")?.to_string();
    let content = required(&req.content, "Message cannot be empty")?.to_string();
    let msg_type = present(&req.msg_type)
        .unwrap_or(DEFAULT_MESSAGE_TYPE)
        .to_string();

    let message_id = Uuid::new_v4().to_string();
    let sent = {
        let (mid, uid) = (message_id.clone(), user_id.clone());
        blocking(&state, move |db| {
            let Some(room) = db.get_chatroom(&id)? else {
                return Ok(None);
            };
            db.create_chat_message(&mid, &room.id, &uid, &content, &msg_type)?;
            let mut recipients = db.chatroom_members(&room.id)?;
            if !recipients.contains(&room.teacher_id) {
                recipients.push(room.teacher_id.clone());
            }
            recipients.retain(|member| *member != uid);
            Ok::<_, ApiError>(Some((room.name, recipients)))
        })
        .await?
    };

    let (room_name, recipients) = sent.ok_or_else(|| ApiError::not_found("Chatroom not found"))?;

    notify_all(&state, &recipients, &format!("New message in chatroom {}", room_name)).await;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Message sent".into(),
            id: message_id,
        }),
    ))
}
