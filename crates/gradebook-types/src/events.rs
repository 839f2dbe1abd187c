use serde::{Deserialize, Serialize};

/// Events sent over the WebSocket gateway.
///
/// Every connected client receives every event; clients filter
/// `notification` events on `user_id` themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: String, name: String },

    /// A notification was stored for `user_id`
    Notification {
        user_id: String,
        content: String,
        created_at: chrono::DateTime<chrono::Utc>,
    },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_wire_format() {
        let created_at = "2024-05-01T10:00:00Z".parse().unwrap();
        let event = GatewayEvent::Notification {
            user_id: "u1".into(),
            content: "New grade for Math: A".into(),
            created_at,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["data"]["user_id"], "u1");
        assert_eq!(json["data"]["content"], "New grade for Math: A");
        assert_eq!(json["data"]["created_at"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_identify_command_parses() {
        let cmd: GatewayCommand =
            serde_json::from_str(r#"{"type":"identify","data":{"token":"abc"}}"#).unwrap();
        let GatewayCommand::Identify { token } = cmd;
        assert_eq!(token, "abc");
    }
}
