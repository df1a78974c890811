//! Domain entities shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a fresh entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A bot user, keyed by the chat platform's external id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub name: String,
    /// False after `/unregister`; inactive users get no reminders.
    pub active: bool,
    /// Per-user reminder toggle (`/notify on|off`).
    pub notify: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A scheduled class section for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSubject {
    pub id: String,
    /// Subject code, e.g. "IT003.P12".
    pub subject_id: String,
    pub subject_name: String,
    pub teacher: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    /// "HH:MM" local time.
    pub start_time: String,
    pub end_time: String,
    /// Academic year, e.g. "2025-2026".
    pub year: String,
    pub semester: u8,
    /// Main-track subjects are auto-enrolled on `/register`.
    pub is_main: bool,
}

/// Enrollment of a user into one class section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClassSubject {
    pub id: String,
    pub user_id: String,
    pub class_subject_id: String,
    pub year: String,
    pub semester: u8,
}

/// A class-wide assignment with a deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub class_subject_id: String,
    pub name: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub deadline_remind: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One user's copy of an assignment, carrying their status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAssignment {
    pub id: String,
    pub assignment_id: String,
    pub user_id: String,
    pub status: AssignmentStatus,
    pub is_deleted: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Completed,
    Overdue,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AssignmentStatus::Pending),
            "completed" => Some(AssignmentStatus::Completed),
            "overdue" => Some(AssignmentStatus::Overdue),
            _ => None,
        }
    }

    /// Icon used in assignment listings.
    pub fn icon(&self) -> &'static str {
        match self {
            AssignmentStatus::Completed => "✅",
            _ => "❌",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Incoming => "INCOMING",
            MessageDirection::Outgoing => "OUTGOING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Sticker,
    Photo,
    Template,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Sticker => "sticker",
            MessageKind::Photo => "photo",
            MessageKind::Template => "template",
        }
    }
}

/// Who sent an inbound event, as seen by the dispatch layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub external_id: String,
    pub display_name: String,
    pub chat_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            AssignmentStatus::Pending,
            AssignmentStatus::Completed,
            AssignmentStatus::Overdue,
        ] {
            assert_eq!(AssignmentStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(AssignmentStatus::parse("done"), None);
    }

    #[test]
    fn test_status_icon() {
        assert_eq!(AssignmentStatus::Completed.icon(), "✅");
        assert_eq!(AssignmentStatus::Pending.icon(), "❌");
        assert_eq!(AssignmentStatus::Overdue.icon(), "❌");
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
