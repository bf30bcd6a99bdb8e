use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use mentorhub_common::{BookingStatus, MenteeType, NoteType, TaskStatus, UserRole};
use mentorhub_database::{
    Booking, BookingNote, MenteeProfile, MentorActivity, MentorAvailabilitySlot, MentorEarning,
    MentorProfile, MentorTask, Notification, User,
};

// Auth DTOs

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,

    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    pub password: String,

    pub active_role: Option<UserRole>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<UserRole>,
    pub active_role: Option<UserRole>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl UserInfo {
    pub fn from_user(user: &User, active_role: Option<UserRole>) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.iter().filter_map(|r| UserRole::parse(r)).collect(),
            active_role,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,

    #[validate(length(min = 8))]
    pub new_password: String,
}

// Mentor DTOs

#[derive(Debug, Deserialize)]
pub struct MentorListQuery {
    pub expertise: Option<String>,
    pub industry: Option<String>,
    pub language: Option<String>,
    pub include_unavailable: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MentorResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub expertise: Vec<String>,
    pub industries: Vec<String>,
    pub languages: Vec<String>,
    pub timezone: Option<String>,
    pub calendar_url: Option<String>,
    pub photo_url: Option<String>,
    pub is_available: bool,
    pub average_rating: Decimal,
    pub total_ratings: i32,
}

impl MentorResponse {
    pub fn from_parts(user: &User, profile: &MentorProfile) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            bio: profile.bio.clone(),
            expertise: profile.expertise.clone(),
            industries: profile.industries.clone(),
            languages: profile.languages.clone(),
            timezone: profile.timezone.clone(),
            calendar_url: profile.calendar_url.clone(),
            photo_url: profile.photo_url.clone(),
            is_available: profile.is_available,
            average_rating: profile.average_rating,
            total_ratings: profile.total_ratings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateMentorProfileRequest {
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    pub expertise: Option<Vec<String>>,
    pub industries: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub timezone: Option<String>,
    #[validate(url)]
    pub calendar_url: Option<String>,
    pub photo_url: Option<String>,
}

// Mentee DTOs

#[derive(Debug, Serialize, Deserialize)]
pub struct MenteeResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub contact: Option<String>,
    pub mentee_type: MenteeType,
    pub languages: Vec<String>,
    pub interests: Vec<String>,
}

impl MenteeResponse {
    pub fn from_parts(user: &User, profile: &MenteeProfile) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            contact: profile.contact.clone(),
            mentee_type: MenteeType::parse(&profile.mentee_type).unwrap_or(MenteeType::Individual),
            languages: profile.languages.clone(),
            interests: profile.interests.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateMenteeProfileRequest {
    #[validate(length(max = 255))]
    pub contact: Option<String>,
    pub mentee_type: Option<MenteeType>,
    pub languages: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
}

// Booking DTOs

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub mentor_id: Uuid,

    #[validate(length(min = 1, max = 2000))]
    pub goal: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub status: BookingStatus,
    pub goal: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub calendar_event_ref: Option<String>,
    pub mentee_rating: Option<i16>,
    pub mentee_feedback: Option<String>,
    pub mentor_rating: Option<i16>,
    pub mentor_feedback: Option<String>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.booking_id,
            mentor_id: booking.mentor_id,
            mentee_id: booking.mentee_id,
            status: BookingStatus::parse(&booking.status).unwrap_or(BookingStatus::Pending),
            goal: booking.goal,
            requested_at: booking.requested_at,
            accepted_at: booking.accepted_at,
            scheduled_at: booking.scheduled_at,
            completed_at: booking.completed_at,
            canceled_at: booking.canceled_at,
            calendar_event_ref: booking.calendar_event_ref,
            mentee_rating: booking.mentee_rating,
            mentee_feedback: booking.mentee_feedback,
            mentor_rating: booking.mentor_rating,
            mentor_feedback: booking.mentor_feedback,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,

    #[validate(length(max = 4000))]
    pub feedback: Option<String>,
}

// Note DTOs

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,

    pub note_type: Option<NoteType>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub note_id: Uuid,
    pub booking_id: Uuid,
    pub author_id: Uuid,
    pub author_role: String,
    pub note_type: NoteType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<BookingNote> for NoteResponse {
    fn from(note: BookingNote) -> Self {
        Self {
            note_id: note.note_id,
            booking_id: note.booking_id,
            author_id: note.author_id,
            author_role: note.author_role,
            note_type: NoteType::parse(&note.note_type).unwrap_or(NoteType::Note),
            content: note.content,
            created_at: note.created_at,
        }
    }
}

// Notification DTOs

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub notification_id: Uuid,
    pub recipient_email: String,
    pub recipient_role: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub booking_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            notification_id: n.notification_id,
            recipient_email: n.recipient_email,
            recipient_role: n.recipient_role,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            booking_id: n.booking_id,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

// Mentor dashboard DTOs

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<MentorTask> for TaskResponse {
    fn from(task: MentorTask) -> Self {
        Self {
            task_id: task.task_id,
            title: task.title,
            description: task.description,
            status: TaskStatus::parse(&task.status).unwrap_or(TaskStatus::Open),
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub day_of_week: Option<i16>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilitySlotResponse {
    pub slot_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

impl From<MentorAvailabilitySlot> for AvailabilitySlotResponse {
    fn from(slot: MentorAvailabilitySlot) -> Self {
        Self {
            slot_id: slot.slot_id,
            day_of_week: slot.day_of_week,
            start_time: slot.start_time,
            end_time: slot.end_time,
            is_active: slot.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEarningRequest {
    pub booking_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EarningResponse {
    pub earning_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub earned_at: DateTime<Utc>,
}

impl From<MentorEarning> for EarningResponse {
    fn from(e: MentorEarning) -> Self {
        Self {
            earning_id: e.earning_id,
            booking_id: e.booking_id,
            amount: e.amount,
            currency: e.currency,
            status: e.status,
            earned_at: e.earned_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordActivityRequest {
    #[validate(length(min = 1, max = 50))]
    pub activity_type: String,

    #[validate(length(min = 1, max = 1000))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub activity_id: Uuid,
    pub activity_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<MentorActivity> for ActivityResponse {
    fn from(a: MentorActivity) -> Self {
        Self {
            activity_id: a.activity_id,
            activity_type: a.activity_type,
            description: a.description,
            created_at: a.created_at,
        }
    }
}

// Uploads

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub size_bytes: usize,
}

// Webhook response

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookOutcome {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    /// True when an existing accepted booking for the mentor/mentee pair was
    /// confirmed, false when the fallback path created a fresh booking.
    pub matched_existing: bool,
}
