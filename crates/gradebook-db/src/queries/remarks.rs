use rusqlite::{Connection, params};

use crate::models::RemarkRow;
use crate::{Database, Result, now};

impl Database {
    pub fn create_remark(
        &self,
        id: &str,
        student_id: &str,
        teacher_id: Option<&str>,
        content: &str,
    ) -> Result<RemarkRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO remarks (id, student_id, teacher_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, student_id, teacher_id, content, created_at],
            )?;
            Ok(RemarkRow {
                id: id.to_string(),
                student_id: student_id.to_string(),
                teacher_id: teacher_id.map(str::to_string),
                content: content.to_string(),
                created_at,
            })
        })
    }

    pub fn remarks_for_student(&self, student_id: &str) -> Result<Vec<RemarkRow>> {
        self.with_conn(|conn| query_remarks_for_student(conn, student_id))
    }
}

pub(crate) fn query_remarks_for_student(conn: &Connection, student_id: &str) -> Result<Vec<RemarkRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, teacher_id, content, created_at
         FROM remarks
         WHERE student_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok(RemarkRow {
                id: row.get(0)?,
                student_id: row.get(1)?,
                teacher_id: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn test_remarks_without_teacher() {
        let db = db();
        db.create_remark(&new_id(), "s1", None, "Well done").unwrap();

        let remarks = db.remarks_for_student("s1").unwrap();
        assert_eq!(remarks.len(), 1);
        assert!(remarks[0].teacher_id.is_none());
        assert!(db.remarks_for_student("s2").unwrap().is_empty());
    }
}
