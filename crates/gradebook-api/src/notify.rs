use tracing::warn;
use uuid::Uuid;

use gradebook_types::events::GatewayEvent;

use crate::auth::AppState;
use crate::convert::timestamp;
use crate::task::blocking;

/// Store a notification for `user_id` and push it to connected clients.
///
/// Runs after the triggering mutation has committed, so failures are logged
/// and never surfaced to the caller.
pub async fn notify(state: &AppState, user_id: &str, content: impl Into<String>) {
    let content = content.into();
    let id = Uuid::new_v4().to_string();
    let uid = user_id.to_string();
    let text = content.clone();

    let row = match blocking(state, move |db| db.create_notification(&id, &uid, &text)).await {
        Ok(row) => row,
        Err(e) => {
            warn!("Failed to store notification for {}: {}", user_id, e);
            return;
        }
    };

    state.dispatcher.broadcast(GatewayEvent::Notification {
        user_id: row.user_id,
        content,
        created_at: timestamp(&row.created_at),
    });
}

/// [`notify`] each user in turn.
pub async fn notify_all<I, S>(state: &AppState, user_ids: I, content: &str)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for user_id in user_ids {
        notify(state, user_id.as_ref(), content).await;
    }
}
