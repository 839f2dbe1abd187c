use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::GroupRow;
use crate::{Database, Result, now};

impl Database {
    pub fn create_group(&self, id: &str, name: &str, teacher_id: &str) -> Result<GroupRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO student_groups (id, name, teacher_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, teacher_id, created_at],
            )?;
            Ok(GroupRow {
                id: id.to_string(),
                name: name.to_string(),
                teacher_id: teacher_id.to_string(),
                created_at,
            })
        })
    }

    pub fn get_group(&self, id: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| query_group(conn, id))
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, teacher_id, created_at FROM student_groups ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([], group_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// A group and its member ids.
    pub fn group_detail(&self, id: &str) -> Result<Option<(GroupRow, Vec<String>)>> {
        self.transaction(|tx| {
            let Some(group) = query_group(tx, id)? else {
                return Ok(None);
            };
            let members = query_members(tx, id)?;
            Ok(Some((group, members)))
        })
    }

    /// Delete a group and all of its memberships.
    pub fn delete_group(&self, id: &str) -> Result<Option<GroupRow>> {
        self.transaction(|tx| {
            let Some(group) = query_group(tx, id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM group_members WHERE group_id = ?1", [id])?;
            tx.execute("DELETE FROM student_groups WHERE id = ?1", [id])?;
            Ok(Some(group))
        })
    }

    /// Add a member. Duplicate adds are ignored rather than rejected;
    /// returns whether a row was inserted.
    pub fn add_group_member(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?1, ?2)",
                params![group_id, user_id],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn remove_group_member(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
                params![group_id, user_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn group_members(&self, group_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| query_members(conn, group_id))
    }
}

fn query_group(conn: &Connection, id: &str) -> Result<Option<GroupRow>> {
    Ok(conn
        .query_row(
            "SELECT id, name, teacher_id, created_at FROM student_groups WHERE id = ?1",
            [id],
            group_from_row,
        )
        .optional()?)
}

fn query_members(conn: &Connection, group_id: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT user_id FROM group_members WHERE group_id = ?1 ORDER BY rowid")?;
    let ids = stmt
        .query_map([group_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
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
    fn test_delete_cascades_members() {
        let db = db();
        let group = new_id();
        db.create_group(&group, "Reading circle", "t1").unwrap();
        db.add_group_member(&group, "s1").unwrap();
        db.add_group_member(&group, "s2").unwrap();

        let deleted = db.delete_group(&group).unwrap().unwrap();
        assert_eq!(deleted.name, "Reading circle");

        let remaining: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM group_members WHERE group_id = ?1",
                    [&group],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(db.get_group(&group).unwrap().is_none());
        assert!(db.delete_group(&group).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_member_add_is_idempotent() {
        let db = db();
        let group = new_id();
        db.create_group(&group, "Group", "t1").unwrap();

        assert!(db.add_group_member(&group, "s1").unwrap());
        assert!(!db.add_group_member(&group, "s1").unwrap());
        assert_eq!(db.group_members(&group).unwrap(), vec!["s1"]);
    }

    #[test]
    fn test_member_of_missing_group_is_rejected() {
        let db = db();
        let err = db.add_group_member("no-such-group", "s1").unwrap_err();
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_group_detail() {
        let db = db();
        let group = new_id();
        db.create_group(&group, "Group", "t1").unwrap();
        db.add_group_member(&group, "s1").unwrap();

        let (row, members) = db.group_detail(&group).unwrap().unwrap();
        assert_eq!(row.teacher_id, "t1");
        assert_eq!(members, vec!["s1"]);
        assert!(db.group_detail("missing").unwrap().is_none());

        assert!(db.remove_group_member(&group, "s1").unwrap());
        assert!(db.group_members(&group).unwrap().is_empty());
        assert_eq!(db.list_groups().unwrap().len(), 1);
    }
}
