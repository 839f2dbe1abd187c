use rusqlite::{Connection, Row, params};

use crate::models::{GradeInsert, GradeRow, NewGrade};
use crate::{Database, Result, now};

/// Upper bound on grade records per student.
pub const MAX_GRADES_PER_STUDENT: usize = 8;

const GRADE_COLUMNS: &str = "id, student_id, subject, score, grade, created_at";

impl Database {
    /// Record a grade unless the student already holds
    /// [`MAX_GRADES_PER_STUDENT`]. The count and the insert share a
    /// transaction, so concurrent adds cannot overshoot the cap.
    pub fn add_grade(&self, grade: &NewGrade<'_>) -> Result<GradeInsert> {
        self.transaction(|tx| {
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM grades WHERE student_id = ?1",
                [grade.student_id],
                |r| r.get(0),
            )?;
            if count >= MAX_GRADES_PER_STUDENT as i64 {
                return Ok(GradeInsert::LimitReached);
            }

            let created_at = now();
            tx.execute(
                "INSERT INTO grades (id, student_id, subject, score, grade, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    grade.id,
                    grade.student_id,
                    grade.subject,
                    grade.score,
                    grade.grade.as_str(),
                    created_at
                ],
            )?;

            Ok(GradeInsert::Inserted(GradeRow {
                id: grade.id.to_string(),
                student_id: grade.student_id.to_string(),
                subject: grade.subject.to_string(),
                score: grade.score,
                grade: grade.grade.as_str().to_string(),
                created_at,
            }))
        })
    }

    /// Grades for one student, oldest first.
    pub fn grades_for_student(&self, student_id: &str) -> Result<Vec<GradeRow>> {
        self.with_conn(|conn| query_grades_for_student(conn, student_id))
    }

    pub fn list_grades(&self) -> Result<Vec<GradeRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM grades ORDER BY created_at, rowid", GRADE_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], grade_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn query_grades_for_student(conn: &Connection, student_id: &str) -> Result<Vec<GradeRow>> {
    let sql = format!(
        "SELECT {} FROM grades WHERE student_id = ?1 ORDER BY created_at, rowid",
        GRADE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([student_id], grade_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn grade_from_row(row: &Row<'_>) -> rusqlite::Result<GradeRow> {
    Ok(GradeRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        subject: row.get(2)?,
        score: row.get(3)?,
        grade: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use gradebook_types::grading::LetterGrade;

    use super::MAX_GRADES_PER_STUDENT;
    use crate::models::{GradeInsert, NewGrade};
    use crate::test_support::*;

    #[test]
    fn test_ninth_grade_is_rejected() {
        let db = db();
        let t = teacher(&db, "t@school.test");
        let s = student(&db, "s@school.test", &t);

        for i in 0..MAX_GRADES_PER_STUDENT {
            let subject = format!("Subject {i}");
            let outcome = db
                .add_grade(&NewGrade {
                    id: &new_id(),
                    student_id: &s,
                    subject: &subject,
                    score: 70,
                    grade: LetterGrade::B,
                })
                .unwrap();
            assert!(matches!(outcome, GradeInsert::Inserted(_)));
        }

        let outcome = db
            .add_grade(&NewGrade {
                id: &new_id(),
                student_id: &s,
                subject: "One too many",
                score: 70,
                grade: LetterGrade::B,
            })
            .unwrap();
        assert!(matches!(outcome, GradeInsert::LimitReached));
        assert_eq!(db.grades_for_student(&s).unwrap().len(), MAX_GRADES_PER_STUDENT);
    }

    #[test]
    fn test_grades_keep_insertion_order() {
        let db = db();
        let t = teacher(&db, "t@school.test");
        let s = student(&db, "s@school.test", &t);

        for (subject, score) in [("Math", 70), ("Sci", 90), ("Art", 40)] {
            db.add_grade(&NewGrade {
                id: &new_id(),
                student_id: &s,
                subject,
                score,
                grade: LetterGrade::classify(score).unwrap(),
            })
            .unwrap();
        }

        let subjects: Vec<String> = db
            .grades_for_student(&s)
            .unwrap()
            .into_iter()
            .map(|g| g.subject)
            .collect();
        assert_eq!(subjects, vec!["Math", "Sci", "Art"]);
        assert_eq!(db.list_grades().unwrap().len(), 3);
    }

    #[test]
    fn test_dangling_student_id_is_tolerated() {
        let db = db();
        let outcome = db
            .add_grade(&NewGrade {
                id: &new_id(),
                student_id: "no-such-student",
                subject: "Math",
                score: 55,
                grade: LetterGrade::C,
            })
            .unwrap();
        assert!(matches!(outcome, GradeInsert::Inserted(_)));
    }
}
