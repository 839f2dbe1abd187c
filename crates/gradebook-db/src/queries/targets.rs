use rusqlite::{Connection, params};

use crate::models::TargetRow;
use crate::{Database, Result, now};

impl Database {
    pub fn create_target(
        &self,
        id: &str,
        student_id: &str,
        subject: &str,
        target: i64,
    ) -> Result<TargetRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO targets (id, student_id, subject, target, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, student_id, subject, target, created_at],
            )?;
            Ok(TargetRow {
                id: id.to_string(),
                student_id: student_id.to_string(),
                subject: subject.to_string(),
                target,
                created_at,
            })
        })
    }

    pub fn targets_for_student(&self, student_id: &str) -> Result<Vec<TargetRow>> {
        self.with_conn(|conn| query_targets_for_student(conn, student_id))
    }
}

pub(crate) fn query_targets_for_student(conn: &Connection, student_id: &str) -> Result<Vec<TargetRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, subject, target, created_at
         FROM targets
         WHERE student_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok(TargetRow {
                id: row.get(0)?,
                student_id: row.get(1)?,
                subject: row.get(2)?,
                target: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
