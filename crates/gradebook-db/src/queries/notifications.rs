use rusqlite::params;

use crate::models::NotificationRow;
use crate::{Database, Result, now};

impl Database {
    /// Store an unread notification for `user_id`.
    pub fn create_notification(&self, id: &str, user_id: &str, content: &str) -> Result<NotificationRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO notifications (id, user_id, content, created_at, is_read)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![id, user_id, content, created_at],
            )?;
            Ok(NotificationRow {
                id: id.to_string(),
                user_id: user_id.to_string(),
                content: content.to_string(),
                created_at,
                is_read: false,
            })
        })
    }

    /// Notifications for one user, newest first.
    pub fn notifications_for_user(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, content, created_at, is_read
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        content: row.get(2)?,
                        created_at: row.get(3)?,
                        is_read: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark a notification read, but only if it belongs to `user_id`.
    /// Returns whether a row was updated.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(updated > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn test_mark_read_is_scoped_to_owner() {
        let db = db();
        let n = new_id();
        db.create_notification(&n, "u1", "Welcome").unwrap();

        assert!(!db.mark_notification_read(&n, "u2").unwrap());
        assert!(!db.notifications_for_user("u1").unwrap()[0].is_read);

        assert!(db.mark_notification_read(&n, "u1").unwrap());
        assert!(db.notifications_for_user("u1").unwrap()[0].is_read);
    }

    #[test]
    fn test_newest_first() {
        let db = db();
        db.create_notification(&new_id(), "u1", "first").unwrap();
        db.create_notification(&new_id(), "u1", "second").unwrap();
        db.create_notification(&new_id(), "u2", "other").unwrap();

        let contents: Vec<String> = db
            .notifications_for_user("u1")
            .unwrap()
            .into_iter()
            .map(|n| n.content)
            .collect();
        assert_eq!(contents, vec!["second", "first"]);
    }
}
