use rusqlite::{Connection, OptionalExtension, Row, params, types::ToSql};

use gradebook_types::models::Role;

use crate::models::{NewUser, UserRow, UserUpdate};
use crate::{Database, Result, now};

const USER_COLUMNS: &str = "id, name, email, password, role, bio, profile_photo, created_at";

impl Database {
    /// Insert a user and, for students, the mirroring student row.
    ///
    /// Both rows are written in one transaction. A duplicate email fails
    /// with [`crate::DbError::Conflict`] and leaves nothing behind.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.transaction(|tx| {
            let created_at = now();
            tx.execute(
                "INSERT INTO users (id, name, email, password, role, bio, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, '', ?6)",
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    created_at
                ],
            )?;

            if user.role == Role::Student {
                tx.execute(
                    "INSERT INTO students (id, name, email, teacher_id) VALUES (?1, ?2, ?3, ?4)",
                    params![user.id, user.name, user.email, user.teacher_id],
                )?;
            }

            Ok(UserRow {
                id: user.id.to_string(),
                name: user.name.to_string(),
                email: user.email.to_string(),
                password: user.password_hash.to_string(),
                role: user.role.as_str().to_string(),
                bio: String::new(),
                profile_photo: None,
                created_at,
            })
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    /// Apply a partial update to a user and mirror name, email and photo
    /// onto the student row if there is one.
    ///
    /// Returns `false` when no such user exists.
    pub fn update_user(&self, id: &str, update: &UserUpdate) -> Result<bool> {
        self.transaction(|tx| {
            let user_fields = [
                ("name", &update.name),
                ("email", &update.email),
                ("password", &update.password_hash),
                ("bio", &update.bio),
                ("profile_photo", &update.profile_photo),
            ];

            if !user_fields.iter().any(|(_, v)| is_set(v)) {
                return user_exists(tx, id);
            }

            if apply_update(tx, "users", id, &user_fields)? == 0 {
                return Ok(false);
            }

            apply_update(
                tx,
                "students",
                id,
                &[
                    ("name", &update.name),
                    ("email", &update.email),
                    ("profile_photo", &update.profile_photo),
                ],
            )?;

            Ok(true)
        })
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// `UPDATE table SET ... WHERE id = ?` over the fields that are set.
/// Returns the number of rows changed.
pub(crate) fn apply_update(
    conn: &Connection,
    table: &str,
    id: &str,
    fields: &[(&str, &Option<String>)],
) -> Result<usize> {
    let mut assignments: Vec<String> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    for (column, value) in fields {
        if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
            values.push(v as &dyn ToSql);
            assignments.push(format!("{} = ?{}", column, values.len()));
        }
    }

    if assignments.is_empty() {
        return Ok(0);
    }

    values.push(&id as &dyn ToSql);
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        table,
        assignments.join(", "),
        values.len()
    );

    Ok(conn.execute(&sql, values.as_slice())?)
}

pub(crate) fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let row = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        bio: row.get(5)?,
        profile_photo: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use crate::models::{NewUser, UserUpdate};
    use gradebook_types::models::Role;

    #[test]
    fn test_duplicate_email_is_a_conflict() {
        let db = db();
        teacher(&db, "dup@school.test");

        let err = db
            .create_user(&NewUser {
                id: &new_id(),
                name: "Other",
                email: "dup@school.test",
                password_hash: "hash",
                role: Role::Student,
                teacher_id: None,
            })
            .unwrap_err();
        assert!(err.is_conflict());

        let (users, students): (i64, i64) = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM users WHERE email = 'dup@school.test'),
                            (SELECT COUNT(*) FROM students)",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(users, 1);
        assert_eq!(students, 0);
    }

    #[test]
    fn test_student_signup_writes_both_rows() {
        let db = db();
        let teacher_id = teacher(&db, "t@school.test");
        let student_id = student(&db, "s@school.test", &teacher_id);

        let user = db.get_user_by_id(&student_id).unwrap().unwrap();
        assert_eq!(user.role, "student");
        let row = db.get_student(&student_id).unwrap().unwrap();
        assert_eq!(row.teacher_id.as_deref(), Some(teacher_id.as_str()));
        assert!(db.get_student(&teacher_id).unwrap().is_none());
    }

    #[test]
    fn test_partial_update_leaves_unset_fields() {
        let db = db();
        let teacher_id = teacher(&db, "t@school.test");
        let student_id = student(&db, "s@school.test", &teacher_id);

        let updated = db
            .update_user(
                &student_id,
                &UserUpdate {
                    name: Some("Renamed".into()),
                    bio: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated);

        let user = db.get_user_by_id(&student_id).unwrap().unwrap();
        assert_eq!(user.name, "Renamed");
        assert_eq!(user.email, "s@school.test");
        assert_eq!(user.password, "hash");
        assert_eq!(user.bio, "");
        assert_eq!(db.get_student(&student_id).unwrap().unwrap().name, "Renamed");
    }

    #[test]
    fn test_update_missing_user() {
        let db = db();
        let update = UserUpdate {
            name: Some("Ghost".into()),
            ..Default::default()
        };
        assert!(!db.update_user("nope", &update).unwrap());
        assert!(!db.update_user("nope", &UserUpdate::default()).unwrap());
    }

    #[test]
    fn test_update_to_taken_email_rolls_back() {
        let db = db();
        let teacher_id = teacher(&db, "t@school.test");
        let student_id = student(&db, "s@school.test", &teacher_id);

        let err = db
            .update_user(
                &student_id,
                &UserUpdate {
                    name: Some("Changed".into()),
                    email: Some("t@school.test".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_conflict());

        let user = db.get_user_by_id(&student_id).unwrap().unwrap();
        assert_eq!(user.name, "Sam Student");
        assert_eq!(user.email, "s@school.test");
    }

    #[test]
    fn test_lookup_by_email() {
        let db = db();
        let id = teacher(&db, "t@school.test");
        assert_eq!(db.get_user_by_email("t@school.test").unwrap().unwrap().id, id);
        assert!(db.get_user_by_email("x@school.test").unwrap().is_none());
    }
}
