use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use gradebook_types::api::Claims;
use gradebook_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const MAX_MISSED_HEARTBEATS: u8 = 2;

/// How long a new socket has to send its Identify command.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle a single WebSocket connection: Identify handshake, Ready, then
/// relay every broadcast event until either side goes away.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, jwt_secret: Arc<str>) {
    let (mut sender, mut receiver) = socket.split();

    let claims = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(claims) => claims,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!("{} ({}) connected to gateway", claims.name, claims.sub);

    let ready = GatewayEvent::Ready {
        user_id: claims.sub.clone(),
        name: claims.name.clone(),
    };
    if send_event(&mut sender, &ready).await.is_err() {
        return;
    }

    run_connection_loop(sender, receiver, dispatcher, &claims).await;

    info!("{} ({}) disconnected from gateway", claims.name, claims.sub);
}

async fn run_connection_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    dispatcher: Dispatcher,
    claims: &Claims,
) {
    let mut broadcast_rx = dispatcher.subscribe();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received;

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(RecvError::Lagged(n)) => {
                            warn!("Broadcast receiver lagged by {} events", n);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= MAX_MISSED_HEARTBEATS {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let user_id = claims.sub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    // Already identified; a repeat is harmless.
                    Ok(GatewayCommand::Identify { .. }) => {
                        debug!("{} sent a second identify, ignoring", user_id);
                    }
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            user_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &GatewayEvent,
) -> Result<(), ()> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to encode gateway event: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

async fn wait_for_identify(receiver: &mut SplitStream<WebSocket>, jwt_secret: &str) -> Option<Claims> {
    let identify = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    return decode_token(&token, jwt_secret);
                }
            }
        }
        None
    };

    tokio::time::timeout(IDENTIFY_TIMEOUT, identify).await.ok().flatten()
}

/// Validate a bearer token and return its claims.
pub fn decode_token(token: &str, jwt_secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| debug!("Rejected gateway token: {}", e))
    .ok()
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use gradebook_types::models::Role;

    use super::*;

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims {
            sub: "u1".into(),
            name: "Ada".into(),
            role: Role::Teacher,
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn in_one_hour() -> usize {
        (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize
    }

    #[test]
    fn test_decode_valid_token() {
        let claims = decode_token(&token("s3cret", in_one_hour()), "s3cret").unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Teacher);
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        assert!(decode_token(&token("s3cret", in_one_hour()), "other").is_none());
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let expired = (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp() as usize;
        assert!(decode_token(&token("s3cret", expired), "s3cret").is_none());
    }
}
