use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{ChatMessageRow, ChatroomRow};
use crate::{Database, Result, now};

impl Database {
    pub fn create_chatroom(&self, id: &str, name: &str, teacher_id: &str) -> Result<ChatroomRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO chatrooms (id, name, teacher_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, teacher_id, created_at],
            )?;
            Ok(ChatroomRow {
                id: id.to_string(),
                name: name.to_string(),
                teacher_id: teacher_id.to_string(),
                created_at,
            })
        })
    }

    pub fn get_chatroom(&self, id: &str) -> Result<Option<ChatroomRow>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, teacher_id, created_at FROM chatrooms WHERE id = ?1",
                    [id],
                    chatroom_from_row,
                )
                .optional()?)
        })
    }

    pub fn list_chatrooms(&self) -> Result<Vec<ChatroomRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, teacher_id, created_at FROM chatrooms ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([], chatroom_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Add a member. Adding an existing member is a no-op; returns whether
    /// a row was inserted.
    pub fn add_chatroom_member(&self, chatroom_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO chatroom_members (chatroom_id, user_id) VALUES (?1, ?2)",
                params![chatroom_id, user_id],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn remove_chatroom_member(&self, chatroom_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM chatroom_members WHERE chatroom_id = ?1 AND user_id = ?2",
                params![chatroom_id, user_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn chatroom_members(&self, chatroom_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| query_members(conn, chatroom_id))
    }

    pub fn create_chat_message(
        &self,
        id: &str,
        chatroom_id: &str,
        user_id: &str,
        content: &str,
        msg_type: &str,
    ) -> Result<ChatMessageRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO messages (id, chatroom_id, user_id, content, type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, chatroom_id, user_id, content, msg_type, created_at],
            )?;
            Ok(ChatMessageRow {
                id: id.to_string(),
                chatroom_id: chatroom_id.to_string(),
                user_id: user_id.to_string(),
                content: content.to_string(),
                msg_type: msg_type.to_string(),
                created_at,
            })
        })
    }

    /// Messages (oldest first) and member ids of a chatroom, read together.
    pub fn chatroom_transcript(&self, chatroom_id: &str) -> Result<(Vec<ChatMessageRow>, Vec<String>)> {
        self.transaction(|tx| {
            let mut stmt = tx.prepare(
                "SELECT id, chatroom_id, user_id, content, type, created_at
                 FROM messages
                 WHERE chatroom_id = ?1
                 ORDER BY created_at, rowid",
            )?;
            let messages = stmt
                .query_map([chatroom_id], |row| {
                    Ok(ChatMessageRow {
                        id: row.get(0)?,
                        chatroom_id: row.get(1)?,
                        user_id: row.get(2)?,
                        content: row.get(3)?,
                        msg_type: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let members = query_members(tx, chatroom_id)?;
            Ok((messages, members))
        })
    }
}

fn query_members(conn: &Connection, chatroom_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM chatroom_members WHERE chatroom_id = ?1 ORDER BY rowid",
    )?;
    let ids = stmt
        .query_map([chatroom_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn chatroom_from_row(row: &Row<'_>) -> rusqlite::Result<ChatroomRow> {
    Ok(ChatroomRow {
        id: row.get(0)?,
        name: row.get(1)?,
        teacher_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn test_membership_is_idempotent() {
        let db = db();
        let room = new_id();
        db.create_chatroom(&room, "Homework help", "t1").unwrap();

        assert!(db.add_chatroom_member(&room, "s1").unwrap());
        assert!(!db.add_chatroom_member(&room, "s1").unwrap());
        assert_eq!(db.chatroom_members(&room).unwrap(), vec!["s1"]);

        assert!(db.remove_chatroom_member(&room, "s1").unwrap());
        assert!(!db.remove_chatroom_member(&room, "s1").unwrap());
        assert!(db.chatroom_members(&room).unwrap().is_empty());
    }

    #[test]
    fn test_transcript() {
        let db = db();
        let room = new_id();
        db.create_chatroom(&room, "Class", "t1").unwrap();
        db.add_chatroom_member(&room, "s1").unwrap();
        db.create_chat_message(&new_id(), &room, "t1", "Hello", "text").unwrap();
        db.create_chat_message(&new_id(), &room, "s1", "Hi!", "text").unwrap();
        db.create_chat_message(&new_id(), "other-room", "s1", "Elsewhere", "text").unwrap();

        let (messages, members) = db.chatroom_transcript(&room).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].user_id, "s1");
        assert_eq!(members, vec!["s1"]);
    }

    #[test]
    fn test_get_and_list_chatrooms() {
        let db = db();
        let room = new_id();
        db.create_chatroom(&room, "Class", "t1").unwrap();

        assert_eq!(db.get_chatroom(&room).unwrap().unwrap().teacher_id, "t1");
        assert!(db.get_chatroom("missing").unwrap().is_none());
        assert_eq!(db.list_chatrooms().unwrap().len(), 1);
    }
}
