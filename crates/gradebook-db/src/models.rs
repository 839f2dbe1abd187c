//! Database row types. These map directly to SQLite rows.
//! Distinct from gradebook-types API models to keep the DB layer independent.
//! Timestamps stay as the stored RFC 3339 text.

use gradebook_types::grading::LetterGrade;
use gradebook_types::models::{AssignmentStatus, Role};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub bio: String,
    pub profile_photo: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub teacher_id: Option<String>,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GradeRow {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub score: i64,
    pub grade: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct TargetRow {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub target: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RemarkRow {
    pub id: String,
    pub student_id: String,
    pub teacher_id: Option<String>,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ChatroomRow {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ChatMessageRow {
    pub id: String,
    pub chatroom_id: String,
    pub user_id: String,
    pub content: String,
    pub msg_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub is_read: bool,
}

#[derive(Debug, Clone)]
pub struct PrivateMessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub msg_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct AssignmentRow {
    pub id: String,
    pub student_id: String,
    pub teacher_id: String,
    pub title: String,
    pub file_path: String,
    pub status: String,
    pub created_at: String,
}

// -- Composite reads --

/// A student with their scores in creation order.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub student: StudentRow,
    pub scores: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub student: StudentRow,
    pub grades: Vec<GradeRow>,
    pub targets: Vec<TargetRow>,
    pub remarks: Vec<RemarkRow>,
}

// -- Write inputs --

pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    /// Only stored for students.
    pub teacher_id: Option<&'a str>,
}

/// Partial user update. `None` and empty strings leave the column untouched.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
}

pub struct NewGrade<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub subject: &'a str,
    pub score: i64,
    pub grade: LetterGrade,
}

#[derive(Debug)]
pub enum GradeInsert {
    Inserted(GradeRow),
    /// The student already holds the maximum number of grades.
    LimitReached,
}

pub struct NewAssignment<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub teacher_id: &'a str,
    pub title: &'a str,
    pub file_path: &'a str,
    pub status: AssignmentStatus,
}
