use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use gradebook_types::api::{Created, PrivateMessageEntry, SendPrivateMessageRequest};

use crate::auth::AppState;
use crate::convert::private_message_entry;
use crate::error::ApiError;
use crate::extract::{JsonBody, present, required};
use crate::notify::notify;
use crate::task::blocking;

const DEFAULT_MESSAGE_TYPE: &str = "text";

/// GET /private_messages/{user_id}: sent and received, oldest first.
pub async fn list_private_messages(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |db| db.private_messages_for_user(&user_id)).await?;
    let messages: Vec<PrivateMessageEntry> = rows.into_iter().map(private_message_entry).collect();
    Ok(Json(messages))
}

/// POST /private_messages/{user_id}: `user_id` is the sender.
pub async fn send_private_message(
    State(state): State<AppState>,
    Path(sender_id): Path<String>,
    JsonBody(req): JsonBody<SendPrivateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receiver_id = required(&req.receiver_id, "Receiver ID cannot be empty")?.to_string();
    let content = required(&req.content, "Message cannot be empty")?.to_string();
    let msg_type = present(&req.msg_type)
        .unwrap_or(DEFAULT_MESSAGE_TYPE)
        .to_string();

    let id = Uuid::new_v4().to_string();
    let sender_name = {
        let (id, sender_id, receiver_id) = (id.clone(), sender_id.clone(), receiver_id.clone());
        blocking(&state, move |db| {
            let Some(sender) = db.get_user_by_id(&sender_id)? else {
                return Ok(None);
            };
            if db.get_user_by_id(&receiver_id)?.is_none() {
                return Ok(None);
            }
            db.create_private_message(&id, &sender_id, &receiver_id, &content, &msg_type)?;
            Ok::<_, ApiError>(Some(sender.name))
        })
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?
    };

    notify(&state, &receiver_id, format!("New private message from {}", sender_name)).await;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Message sent".into(),
            id,
        }),
    ))
}
