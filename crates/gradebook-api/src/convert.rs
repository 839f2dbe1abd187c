//! Store rows to wire types.

use chrono::{DateTime, Utc};
use tracing::warn;

use gradebook_db::models::{
    AssignmentRow, ChatMessageRow, ChatroomRow, GradeRow, GroupRow, NotificationRow,
    PrivateMessageRow, RemarkRow, StudentRow, TargetRow, UserRow,
};
use gradebook_types::api::{
    AssignmentEntry, ChatMessageEntry, ChatroomEntry, GradeEntry, GroupEntry, NotificationEntry,
    PrivateMessageEntry, RemarkEntry, StudentInfo, TargetEntry, UserProfile,
};
use gradebook_types::models::Role;

pub fn timestamp(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!("Failed to parse stored timestamp '{}': {}", raw, e);
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

/// Profile view of a user. `student` supplies the teacher link for students.
pub fn user_profile(user: UserRow, student: Option<StudentRow>) -> UserProfile {
    let role = user.role.parse().unwrap_or_else(|e| {
        warn!("User {} has {}, treating as student", user.id, e);
        Role::Student
    });

    UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role,
        bio: user.bio,
        profile_photo: user.profile_photo,
        teacher_id: student.and_then(|s| s.teacher_id),
    }
}

pub fn student_info(row: StudentRow) -> StudentInfo {
    StudentInfo {
        id: row.id,
        name: row.name,
        email: row.email,
        profile_photo: row.profile_photo,
        teacher_id: row.teacher_id,
    }
}

pub fn grade_entry(row: GradeRow) -> GradeEntry {
    GradeEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        student_id: row.student_id,
        subject: row.subject,
        score: row.score,
        grade: row.grade,
    }
}

pub fn target_entry(row: TargetRow) -> TargetEntry {
    TargetEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        subject: row.subject,
        target: row.target,
    }
}

pub fn remark_entry(row: RemarkRow) -> RemarkEntry {
    RemarkEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        teacher_id: row.teacher_id,
        content: row.content,
    }
}

pub fn assignment_entry(row: AssignmentRow) -> AssignmentEntry {
    AssignmentEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        student_id: row.student_id,
        teacher_id: row.teacher_id,
        title: row.title,
        file_path: row.file_path,
        status: row.status,
    }
}

pub fn chatroom_entry(row: ChatroomRow) -> ChatroomEntry {
    ChatroomEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        name: row.name,
        teacher_id: row.teacher_id,
    }
}

pub fn chat_message_entry(row: ChatMessageRow) -> ChatMessageEntry {
    ChatMessageEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        user_id: row.user_id,
        content: row.content,
        msg_type: row.msg_type,
    }
}

pub fn group_entry(row: GroupRow) -> GroupEntry {
    GroupEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        name: row.name,
        teacher_id: row.teacher_id,
    }
}

pub fn notification_entry(row: NotificationRow) -> NotificationEntry {
    NotificationEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        content: row.content,
        is_read: row.is_read,
    }
}

pub fn private_message_entry(row: PrivateMessageRow) -> PrivateMessageEntry {
    PrivateMessageEntry {
        created_at: timestamp(&row.created_at),
        id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        content: row.content,
        msg_type: row.msg_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trips_store_format() {
        let ts = timestamp("2024-05-01T10:00:00.123456Z");
        assert_eq!(ts.timestamp_subsec_micros(), 123456);
    }

    #[test]
    fn test_bad_timestamp_falls_back_to_epoch() {
        assert_eq!(timestamp("yesterday"), DateTime::<Utc>::UNIX_EPOCH);
    }
}
