use rusqlite::params;

use crate::models::PrivateMessageRow;
use crate::{Database, Result, now};

impl Database {
    pub fn create_private_message(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        msg_type: &str,
    ) -> Result<PrivateMessageRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO private_messages (id, sender_id, receiver_id, content, type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, sender_id, receiver_id, content, msg_type, created_at],
            )?;
            Ok(PrivateMessageRow {
                id: id.to_string(),
                sender_id: sender_id.to_string(),
                receiver_id: receiver_id.to_string(),
                content: content.to_string(),
                msg_type: msg_type.to_string(),
                created_at,
            })
        })
    }

    /// Messages the user sent or received, oldest first.
    pub fn private_messages_for_user(&self, user_id: &str) -> Result<Vec<PrivateMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, receiver_id, content, type, created_at
                 FROM private_messages
                 WHERE sender_id = ?1 OR receiver_id = ?1
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(PrivateMessageRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        receiver_id: row.get(2)?,
                        content: row.get(3)?,
                        msg_type: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn test_both_directions_are_listed() {
        let db = db();
        db.create_private_message(&new_id(), "u1", "u2", "hi", "text").unwrap();
        db.create_private_message(&new_id(), "u2", "u1", "hello", "text").unwrap();
        db.create_private_message(&new_id(), "u2", "u3", "unrelated", "text").unwrap();

        let messages = db.private_messages_for_user("u1").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[1].sender_id, "u2");
    }
}
