use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grading::{LetterGrade, SubjectAverage};
use crate::models::{AssignmentStatus, Role};

// -- JWT Claims --

/// JWT claims shared across gradebook-api (token issue) and
/// gradebook-gateway (WebSocket authentication).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

// -- Generic acknowledgements --

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub message: String,
    pub id: String,
}

// -- Auth & profile --

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub teacher_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub profile_photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoUploaded {
    pub message: String,
    pub photo: String,
}

// -- Students --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_photo: Option<String>,
    pub teacher_id: Option<String>,
}

/// Roster entry. `general_grade` is `null` when the stored scores do not
/// classify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSummary {
    #[serde(flatten)]
    pub student: StudentInfo,
    pub general_grade: Option<LetterGrade>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub teacher_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameStudentRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentDetail {
    pub student: StudentInfo,
    pub grades: Vec<GradeEntry>,
    pub targets: Vec<TargetEntry>,
    pub remarks: Vec<RemarkEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrendPoint {
    pub subject: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrendResponse {
    pub grades: Vec<TrendPoint>,
    pub average_score: f64,
    pub subject_averages: Vec<SubjectAverage>,
}

// -- Grades, targets, remarks --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeEntry {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub score: i64,
    pub grade: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddGradeRequest {
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub score: Option<Value>,
    #[serde(alias = "teacherId")]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEntry {
    pub id: String,
    pub subject: String,
    pub target: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SetTargetRequest {
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub target: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemarkEntry {
    pub id: String,
    pub teacher_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddRemarkRequest {
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    #[serde(alias = "teacherId")]
    pub teacher_id: Option<String>,
    pub content: Option<String>,
}

// -- Assignments --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub id: String,
    pub student_id: String,
    pub teacher_id: String,
    pub title: String,
    pub file_path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    pub teacher_id: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentSubmitted {
    pub message: String,
    pub id: String,
    pub file_path: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssignmentStatusRequest {
    pub status: Option<String>,
}

impl UpdateAssignmentStatusRequest {
    pub fn parsed_status(&self) -> Option<AssignmentStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

// -- Chatrooms & groups --

/// Create a chatroom or a group.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: Option<String>,
    #[serde(alias = "teacherId")]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatroomEntry {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub created_at: DateTime<Utc>,
}

/// Invite/remove a student to or from a chatroom or group.
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    #[serde(alias = "teacherId")]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendChatMessageRequest {
    pub user_id: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub msg_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageEntry {
    pub id: String,
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatroomMessages {
    pub messages: Vec<ChatMessageEntry>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: GroupEntry,
    pub members: Vec<String>,
}

// -- Notifications & private messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub notification_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendPrivateMessageRequest {
    pub receiver_id: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub msg_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessageEntry {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub created_at: DateTime<Utc>,
}
