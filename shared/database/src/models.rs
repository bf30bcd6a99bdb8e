use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>, // PostgreSQL text array
    pub hashed_password: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MentorProfile {
    pub user_id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenteeProfile {
    pub user_id: Uuid,
    pub contact: Option<String>,
    pub mentee_type: String,
    pub languages: Vec<String>,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub booking_id: Uuid,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub status: String,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingNote {
    pub note_id: Uuid,
    pub booking_id: Uuid,
    pub author_id: Uuid,
    pub author_role: String,
    pub note_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MentorTask {
    pub task_id: Uuid,
    pub mentor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MentorAvailabilitySlot {
    pub slot_id: Uuid,
    pub mentor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MentorEarning {
    pub earning_id: Uuid,
    pub mentor_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MentorActivity {
    pub activity_id: Uuid,
    pub mentor_id: Uuid,
    pub activity_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
