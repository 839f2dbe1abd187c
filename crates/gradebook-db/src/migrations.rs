use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        // Only membership tables carry foreign keys; every other reference is
        // checked by the handlers that care about it.
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                role            TEXT NOT NULL,
                bio             TEXT NOT NULL DEFAULT '',
                profile_photo   TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE students (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL,
                teacher_id      TEXT,
                profile_photo   TEXT
            );

            CREATE INDEX idx_students_teacher ON students(teacher_id);

            CREATE TABLE grades (
                id          TEXT PRIMARY KEY,
                student_id  TEXT NOT NULL,
                subject     TEXT NOT NULL,
                score       INTEGER NOT NULL,
                grade       TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_grades_student ON grades(student_id, created_at);

            CREATE TABLE targets (
                id          TEXT PRIMARY KEY,
                student_id  TEXT NOT NULL,
                subject     TEXT NOT NULL,
                target      INTEGER NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_targets_student ON targets(student_id);

            CREATE TABLE remarks (
                id          TEXT PRIMARY KEY,
                student_id  TEXT NOT NULL,
                teacher_id  TEXT,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_remarks_student ON remarks(student_id);

            CREATE TABLE chatrooms (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                teacher_id  TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE chatroom_members (
                chatroom_id TEXT NOT NULL REFERENCES chatrooms(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL,
                PRIMARY KEY (chatroom_id, user_id)
            );

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                chatroom_id TEXT NOT NULL,
                user_id     TEXT NOT NULL,
                content     TEXT NOT NULL,
                type        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_messages_chatroom ON messages(chatroom_id, created_at);

            CREATE TABLE student_groups (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                teacher_id  TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE group_members (
                group_id    TEXT NOT NULL REFERENCES student_groups(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL,
                PRIMARY KEY (group_id, user_id)
            );

            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, created_at);

            CREATE TABLE private_messages (
                id          TEXT PRIMARY KEY,
                sender_id   TEXT NOT NULL,
                receiver_id TEXT NOT NULL,
                content     TEXT NOT NULL,
                type        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_private_messages_sender ON private_messages(sender_id);
            CREATE INDEX idx_private_messages_receiver ON private_messages(receiver_id);

            CREATE TABLE assignments (
                id          TEXT PRIMARY KEY,
                student_id  TEXT NOT NULL,
                teacher_id  TEXT NOT NULL,
                title       TEXT NOT NULL,
                file_path   TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'Submitted',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_assignments_student ON assignments(student_id);
            CREATE INDEX idx_assignments_teacher ON assignments(teacher_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
