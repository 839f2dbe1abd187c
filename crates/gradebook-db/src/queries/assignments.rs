use rusqlite::{Connection, OptionalExtension, Row, params};

use gradebook_types::models::AssignmentStatus;

use crate::models::{AssignmentRow, NewAssignment};
use crate::{Database, Result, now};

const ASSIGNMENT_COLUMNS: &str = "id, student_id, teacher_id, title, file_path, status, created_at";

impl Database {
    pub fn create_assignment(&self, assignment: &NewAssignment<'_>) -> Result<AssignmentRow> {
        self.with_conn(|conn| {
            let created_at = now();
            conn.execute(
                "INSERT INTO assignments (id, student_id, teacher_id, title, file_path, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    assignment.id,
                    assignment.student_id,
                    assignment.teacher_id,
                    assignment.title,
                    assignment.file_path,
                    assignment.status.as_str(),
                    created_at
                ],
            )?;
            Ok(AssignmentRow {
                id: assignment.id.to_string(),
                student_id: assignment.student_id.to_string(),
                teacher_id: assignment.teacher_id.to_string(),
                title: assignment.title.to_string(),
                file_path: assignment.file_path.to_string(),
                status: assignment.status.as_str().to_string(),
                created_at,
            })
        })
    }

    pub fn list_assignments(&self) -> Result<Vec<AssignmentRow>> {
        self.with_conn(|conn| query_assignments(conn, None))
    }

    pub fn assignments_for_student(&self, student_id: &str) -> Result<Vec<AssignmentRow>> {
        self.with_conn(|conn| query_assignments(conn, Some(("student_id", student_id))))
    }

    pub fn assignments_for_teacher(&self, teacher_id: &str) -> Result<Vec<AssignmentRow>> {
        self.with_conn(|conn| query_assignments(conn, Some(("teacher_id", teacher_id))))
    }

    /// Set the status and return the updated row, or `None` if there is no
    /// such assignment.
    pub fn update_assignment_status(
        &self,
        id: &str,
        status: AssignmentStatus,
    ) -> Result<Option<AssignmentRow>> {
        self.transaction(|tx| {
            let changed = tx.execute(
                "UPDATE assignments SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )?;
            if changed == 0 {
                return Ok(None);
            }

            let sql = format!("SELECT {} FROM assignments WHERE id = ?1", ASSIGNMENT_COLUMNS);
            Ok(tx.query_row(&sql, [id], assignment_from_row).optional()?)
        })
    }
}

fn query_assignments(conn: &Connection, filter: Option<(&str, &str)>) -> Result<Vec<AssignmentRow>> {
    let rows = match filter {
        Some((column, value)) => {
            let sql = format!(
                "SELECT {} FROM assignments WHERE {} = ?1 ORDER BY created_at, rowid",
                ASSIGNMENT_COLUMNS, column
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([value], assignment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM assignments ORDER BY created_at, rowid",
                ASSIGNMENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([], assignment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok(rows)
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<AssignmentRow> {
    Ok(AssignmentRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        teacher_id: row.get(2)?,
        title: row.get(3)?,
        file_path: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use gradebook_types::models::AssignmentStatus;

    use crate::models::NewAssignment;
    use crate::test_support::*;

    fn submit(db: &crate::Database, student_id: &str, teacher_id: &str) -> String {
        let id = new_id();
        db.create_assignment(&NewAssignment {
            id: &id,
            student_id,
            teacher_id,
            title: "Essay",
            file_path: "assignment_s1_0a1b2c3d.pdf",
            status: AssignmentStatus::Submitted,
        })
        .unwrap();
        id
    }

    #[test]
    fn test_filters() {
        let db = db();
        submit(&db, "s1", "t1");
        submit(&db, "s2", "t1");
        submit(&db, "s1", "t2");

        assert_eq!(db.list_assignments().unwrap().len(), 3);
        assert_eq!(db.assignments_for_teacher("t1").unwrap().len(), 2);
        assert_eq!(db.assignments_for_student("s1").unwrap().len(), 2);
        assert!(db.assignments_for_student("s3").unwrap().is_empty());
    }

    #[test]
    fn test_status_update() {
        let db = db();
        let id = submit(&db, "s1", "t1");

        let row = db
            .update_assignment_status(&id, AssignmentStatus::Graded)
            .unwrap()
            .unwrap();
        assert_eq!(row.status, "Graded");
        assert_eq!(row.student_id, "s1");

        // Any transition is allowed.
        let row = db
            .update_assignment_status(&id, AssignmentStatus::Submitted)
            .unwrap()
            .unwrap();
        assert_eq!(row.status, "Submitted");

        assert!(db
            .update_assignment_status("missing", AssignmentStatus::Reviewed)
            .unwrap()
            .is_none());
    }
}
