use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Mentee,
    Mentor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Mentee => "mentee",
            UserRole::Mentor => "mentor",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mentee" => Some(UserRole::Mentee),
            "mentor" => Some(UserRole::Mentor),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Canonical booking lifecycle. The legal paths are
/// pending -> accepted -> confirmed -> completed, pending -> rejected,
/// and any pre-completion state -> canceled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Confirmed,
    Completed,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "rejected" => Some(BookingStatus::Rejected),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "canceled" => Some(BookingStatus::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Canceled
        )
    }

    /// Transition legality for the lifecycle state machine.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        match (self, next) {
            (BookingStatus::Pending, BookingStatus::Accepted) => true,
            (BookingStatus::Pending, BookingStatus::Rejected) => true,
            (BookingStatus::Accepted, BookingStatus::Confirmed) => true,
            (BookingStatus::Confirmed, BookingStatus::Completed) => true,
            // Cancellation is allowed from any non-terminal state.
            (current, BookingStatus::Canceled) => !current.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BookingRequest,
    BookingAccepted,
    BookingDeclined,
    BookingConfirmed,
    FeedbackReceived,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::BookingRequest => "booking_request",
            NotificationType::BookingAccepted => "booking_accepted",
            NotificationType::BookingDeclined => "booking_declined",
            NotificationType::BookingConfirmed => "booking_confirmed",
            NotificationType::FeedbackReceived => "feedback_received",
        }
    }

    /// In-app notification emitted when a booking enters the given status.
    /// Completion and cancellation record no notification row; feedback
    /// notifications are not tied to a status change.
    pub fn for_booking_status(status: BookingStatus) -> Option<Self> {
        match status {
            BookingStatus::Pending => Some(NotificationType::BookingRequest),
            BookingStatus::Accepted => Some(NotificationType::BookingAccepted),
            BookingStatus::Rejected => Some(NotificationType::BookingDeclined),
            BookingStatus::Confirmed => Some(NotificationType::BookingConfirmed),
            BookingStatus::Completed | BookingStatus::Canceled => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MenteeType {
    Individual,
    Organization,
}

impl MenteeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenteeType::Individual => "individual",
            MenteeType::Organization => "organization",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "individual" => Some(MenteeType::Individual),
            "organization" => Some(MenteeType::Organization),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(TaskStatus::Open),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EarningStatus {
    Pending,
    Paid,
}

impl EarningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarningStatus::Pending => "pending",
            EarningStatus::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Note,
    Task,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Note => "note",
            NoteType::Task => "task",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "note" => Some(NoteType::Note),
            "task" => Some(NoteType::Task),
            _ => None,
        }
    }
}

// Common response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_only_move_to_accepted_rejected_or_canceled() {
        let pending = BookingStatus::Pending;
        assert!(pending.can_transition_to(BookingStatus::Accepted));
        assert!(pending.can_transition_to(BookingStatus::Rejected));
        assert!(pending.can_transition_to(BookingStatus::Canceled));
        assert!(!pending.can_transition_to(BookingStatus::Confirmed));
        assert!(!pending.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn accepted_moves_to_confirmed_then_completed() {
        assert!(BookingStatus::Accepted.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Accepted.can_transition_to(BookingStatus::Completed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for terminal in [
            BookingStatus::Rejected,
            BookingStatus::Completed,
            BookingStatus::Canceled,
        ] {
            for next in [
                BookingStatus::Pending,
                BookingStatus::Accepted,
                BookingStatus::Rejected,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Canceled,
            ] {
                assert!(!terminal.can_transition_to(next), "{:?} -> {:?}", terminal, next);
            }
        }
    }

    #[test]
    fn cancellation_is_allowed_before_completion() {
        assert!(BookingStatus::Accepted.can_transition_to(BookingStatus::Canceled));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Canceled));
    }

    #[test]
    fn each_transition_emits_its_notification_type() {
        assert_eq!(
            NotificationType::for_booking_status(BookingStatus::Pending),
            Some(NotificationType::BookingRequest)
        );
        assert_eq!(
            NotificationType::for_booking_status(BookingStatus::Accepted),
            Some(NotificationType::BookingAccepted)
        );
        assert_eq!(
            NotificationType::for_booking_status(BookingStatus::Rejected),
            Some(NotificationType::BookingDeclined)
        );
        assert_eq!(
            NotificationType::for_booking_status(BookingStatus::Confirmed),
            Some(NotificationType::BookingConfirmed)
        );
    }

    #[test]
    fn completion_and_cancellation_emit_no_notification() {
        assert_eq!(NotificationType::for_booking_status(BookingStatus::Completed), None);
        assert_eq!(NotificationType::for_booking_status(BookingStatus::Canceled), None);
    }

    #[test]
    fn status_round_trips_through_database_strings() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::Rejected,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Canceled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("scheduled"), None);
        assert_eq!(BookingStatus::parse("clicked"), None);
    }
}
