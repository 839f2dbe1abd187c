use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{RosterEntry, StudentRecord, StudentRow};
use crate::queries::{grades, remarks, targets};
use crate::{Database, Result};

const STUDENT_COLUMNS: &str = "id, name, email, teacher_id, profile_photo";

impl Database {
    pub fn get_student(&self, id: &str) -> Result<Option<StudentRow>> {
        self.with_conn(|conn| query_student(conn, id))
    }

    /// Every student with their scores in creation order, read in one
    /// transaction so the roster is a consistent snapshot.
    pub fn student_roster(&self) -> Result<Vec<RosterEntry>> {
        self.transaction(|tx| {
            let students = query_students(tx)?;

            let mut stmt =
                tx.prepare("SELECT student_id, score FROM grades ORDER BY created_at, rowid")?;
            let mut scores: HashMap<String, Vec<i64>> = HashMap::new();
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                let (student_id, score) = row?;
                scores.entry(student_id).or_default().push(score);
            }

            Ok(students
                .into_iter()
                .map(|student| RosterEntry {
                    scores: scores.remove(&student.id).unwrap_or_default(),
                    student,
                })
                .collect())
        })
    }

    /// Student with grades, targets and remarks.
    pub fn student_record(&self, id: &str) -> Result<Option<StudentRecord>> {
        self.transaction(|tx| {
            let Some(student) = query_student(tx, id)? else {
                return Ok(None);
            };

            Ok(Some(StudentRecord {
                student,
                grades: grades::query_grades_for_student(tx, id)?,
                targets: targets::query_targets_for_student(tx, id)?,
                remarks: remarks::query_remarks_for_student(tx, id)?,
            }))
        })
    }

    /// Rename a student and their user account. Returns `false` if the
    /// student does not exist.
    pub fn rename_student(&self, id: &str, name: &str) -> Result<bool> {
        self.transaction(|tx| {
            let changed = tx.execute("UPDATE students SET name = ?1 WHERE id = ?2", params![name, id])?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute("UPDATE users SET name = ?1 WHERE id = ?2", params![name, id])?;
            Ok(true)
        })
    }

    /// Delete a student together with their user account.
    /// Returns the deleted row, or `None` if there was no such student.
    pub fn delete_student(&self, id: &str) -> Result<Option<StudentRow>> {
        self.transaction(|tx| {
            let Some(student) = query_student(tx, id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM students WHERE id = ?1", [id])?;
            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(Some(student))
        })
    }
}

pub(crate) fn query_student(conn: &Connection, id: &str) -> Result<Option<StudentRow>> {
    let sql = format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS);
    Ok(conn.query_row(&sql, [id], student_from_row).optional()?)
}

fn query_students(conn: &Connection) -> Result<Vec<StudentRow>> {
    let sql = format!("SELECT {} FROM students ORDER BY rowid", STUDENT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], student_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        teacher_id: row.get(3)?,
        profile_photo: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use gradebook_types::grading::LetterGrade;

    use crate::models::{GradeInsert, NewGrade};
    use crate::test_support::*;
    use crate::Database;

    fn grade(db: &Database, student_id: &str, subject: &str, score: i64) {
        let outcome = db
            .add_grade(&NewGrade {
                id: &new_id(),
                student_id,
                subject,
                score,
                grade: LetterGrade::classify(score).unwrap(),
            })
            .unwrap();
        assert!(matches!(outcome, GradeInsert::Inserted(_)));
    }

    #[test]
    fn test_roster_groups_scores_in_creation_order() {
        let db = db();
        let t = teacher(&db, "t@school.test");
        let a = student(&db, "a@school.test", &t);
        let b = student(&db, "b@school.test", &t);
        grade(&db, &a, "Math", 50);
        grade(&db, &b, "Math", 90);
        grade(&db, &a, "Sci", 70);

        let roster = db.student_roster().unwrap();
        assert_eq!(roster.len(), 2);
        let entry_a = roster.iter().find(|e| e.student.id == a).unwrap();
        let entry_b = roster.iter().find(|e| e.student.id == b).unwrap();
        assert_eq!(entry_a.scores, vec![50, 70]);
        assert_eq!(entry_b.scores, vec![90]);
    }

    #[test]
    fn test_roster_student_without_grades() {
        let db = db();
        let t = teacher(&db, "t@school.test");
        student(&db, "a@school.test", &t);

        let roster = db.student_roster().unwrap();
        assert!(roster[0].scores.is_empty());
    }

    #[test]
    fn test_student_record() {
        let db = db();
        let t = teacher(&db, "t@school.test");
        let s = student(&db, "s@school.test", &t);
        grade(&db, &s, "Math", 65);
        db.create_target(&new_id(), &s, "Math", 80).unwrap();
        db.create_remark(&new_id(), &s, Some(&t), "Keep going").unwrap();

        let record = db.student_record(&s).unwrap().unwrap();
        assert_eq!(record.grades.len(), 1);
        assert_eq!(record.grades[0].grade, "B");
        assert_eq!(record.targets[0].target, 80);
        assert_eq!(record.remarks[0].content, "Keep going");

        assert!(db.student_record("missing").unwrap().is_none());
    }

    #[test]
    fn test_rename_updates_both_rows() {
        let db = db();
        let t = teacher(&db, "t@school.test");
        let s = student(&db, "s@school.test", &t);

        assert!(db.rename_student(&s, "New Name").unwrap());
        assert_eq!(db.get_student(&s).unwrap().unwrap().name, "New Name");
        assert_eq!(db.get_user_by_id(&s).unwrap().unwrap().name, "New Name");

        assert!(!db.rename_student("missing", "x").unwrap());
    }

    #[test]
    fn test_delete_cascades_to_user() {
        let db = db();
        let t = teacher(&db, "t@school.test");
        let s = student(&db, "s@school.test", &t);

        let deleted = db.delete_student(&s).unwrap().unwrap();
        assert_eq!(deleted.teacher_id.as_deref(), Some(t.as_str()));
        assert!(db.get_student(&s).unwrap().is_none());
        assert!(db.get_user_by_id(&s).unwrap().is_none());
        assert!(db.delete_student(&s).unwrap().is_none());
    }
}
