use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use mentorhub_auth::PasswordService;
use mentorhub_common::{AppError, BookingStatus, NotificationType, UserRole};
use mentorhub_database::{Booking, User};

use crate::models::WebhookOutcome;
use crate::notifications::NotificationService;
use crate::services::AppState;

const BOOKING_CREATED: &str = "BOOKING_CREATED";

/// Inbound scheduling webhook. Two payload shapes arrive on the same
/// endpoint: the Cal.com event envelope and a simplified internal shape,
/// distinguished by field presence.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WebhookPayload {
    CalCom(CalComEvent),
    Internal(InternalBookingEvent),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalComEvent {
    pub trigger_event: String,
    pub payload: CalComBookingPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalComBookingPayload {
    pub uid: Option<String>,
    pub title: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub attendees: Vec<CalComAttendee>,
    pub organizer: CalComOrganizer,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalComAttendee {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalComOrganizer {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InternalBookingEvent {
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub status: Option<BookingStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub event_ref: Option<String>,
}

/// Fallback username for accounts created from webhook attendees.
fn derive_username(name: Option<&str>, email: &str) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => email.split('@').next().unwrap_or(email).to_string(),
    }
}

pub struct WebhookService {
    db_pool: PgPool,
}

impl WebhookService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    /// Returns `None` for event types this system does not track.
    pub async fn handle(&self, payload: WebhookPayload) -> Result<Option<WebhookOutcome>, AppError> {
        match payload {
            WebhookPayload::CalCom(event) => self.handle_calcom(event).await,
            WebhookPayload::Internal(event) => self.handle_internal(event).await.map(Some),
        }
    }

    async fn handle_calcom(&self, event: CalComEvent) -> Result<Option<WebhookOutcome>, AppError> {
        if event.trigger_event != BOOKING_CREATED {
            tracing::debug!("Ignoring calendar event: {}", event.trigger_event);
            return Ok(None);
        }

        let payload = event.payload;

        let mentor = self.mentor_by_email(&payload.organizer.email).await?;

        let attendee = payload
            .attendees
            .first()
            .ok_or_else(|| AppError::Validation("Webhook payload has no attendees".to_string()))?;

        let outcome = self
            .confirm_or_create(
                &mentor,
                MenteeRef::Email {
                    email: &attendee.email,
                    name: attendee.name.as_deref(),
                },
                Some(payload.start_time),
                payload.uid.as_deref(),
            )
            .await?;

        Ok(Some(outcome))
    }

    async fn handle_internal(&self, event: InternalBookingEvent) -> Result<WebhookOutcome, AppError> {
        if let Some(status) = event.status {
            if status != BookingStatus::Confirmed {
                return Err(AppError::Validation(
                    "Internal webhook payloads can only confirm bookings".to_string(),
                ));
            }
        }

        let mentor = self.mentor_by_id(event.mentor_id).await?;

        self.confirm_or_create(
            &mentor,
            MenteeRef::Id(event.mentee_id),
            event.scheduled_at,
            event.event_ref.as_deref(),
        )
        .await
    }

    /// Matches an existing accepted booking for the mentor/mentee pair and
    /// confirms it, or creates a fresh confirmed booking when nothing
    /// matches (out-of-band scheduling).
    async fn confirm_or_create(
        &self,
        mentor: &User,
        mentee_ref: MenteeRef<'_>,
        scheduled_at: Option<DateTime<Utc>>,
        event_ref: Option<&str>,
    ) -> Result<WebhookOutcome, AppError> {
        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        let mentee = match mentee_ref {
            MenteeRef::Id(mentee_id) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
                    .bind(mentee_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(AppError::Database)?
                    .ok_or_else(|| AppError::NotFound("Mentee not found".to_string()))?
            }
            MenteeRef::Email { email, name } => {
                let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                    .bind(email)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;

                match existing {
                    Some(user) => user,
                    None => self.create_mentee_user(&mut tx, email, name).await?,
                }
            }
        };

        let existing = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE mentor_id = $1 AND mentee_id = $2 AND status = $3
            ORDER BY requested_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(mentor.user_id)
        .bind(mentee.user_id)
        .bind(BookingStatus::Accepted.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let (booking_id, matched_existing) = match existing {
            Some(booking) => {
                sqlx::query(
                    r#"
                    UPDATE bookings
                    SET status = $1, scheduled_at = $2, calendar_event_ref = $3, updated_at = NOW()
                    WHERE booking_id = $4 AND status = $5
                    "#,
                )
                .bind(BookingStatus::Confirmed.as_str())
                .bind(scheduled_at)
                .bind(event_ref)
                .bind(booking.booking_id)
                .bind(BookingStatus::Accepted.as_str())
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;

                (booking.booking_id, true)
            }
            None => {
                let booking_id = Uuid::new_v4();
                sqlx::query(
                    r#"
                    INSERT INTO bookings
                        (booking_id, mentor_id, mentee_id, status, scheduled_at, calendar_event_ref)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(booking_id)
                .bind(mentor.user_id)
                .bind(mentee.user_id)
                .bind(BookingStatus::Confirmed.as_str())
                .bind(scheduled_at)
                .bind(event_ref)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;

                (booking_id, false)
            }
        };

        let when = scheduled_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "a time to be confirmed".to_string());

        let notification_type = NotificationType::for_booking_status(BookingStatus::Confirmed)
            .ok_or_else(|| {
                AppError::Internal("No notification is defined for confirmed bookings".to_string())
            })?;

        NotificationService::create_in_tx(
            &mut tx,
            &mentor.email,
            UserRole::Mentor,
            notification_type,
            "Session scheduled",
            &format!("Your session with {} is scheduled for {}", mentee.username, when),
            Some(booking_id),
        )
        .await?;

        NotificationService::create_in_tx(
            &mut tx,
            &mentee.email,
            UserRole::Mentee,
            notification_type,
            "Session scheduled",
            &format!("Your session with {} is scheduled for {}", mentor.username, when),
            Some(booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Webhook confirmed booking {} (matched existing: {})",
            booking_id,
            matched_existing
        );

        Ok(WebhookOutcome {
            booking_id,
            status: BookingStatus::Confirmed,
            matched_existing,
        })
    }

    async fn create_mentee_user(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        email: &str,
        name: Option<&str>,
    ) -> Result<User, AppError> {
        let user_id = Uuid::new_v4();
        let username = derive_username(name, email);
        let hashed_password = PasswordService::hash_password(&PasswordService::generate_random_password())?;

        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, email, roles, hashed_password, email_verified)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            "#,
        )
        .bind(user_id)
        .bind(&username)
        .bind(email)
        .bind(vec![UserRole::Mentee.as_str().to_string()])
        .bind(&hashed_password)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        sqlx::query("INSERT INTO mentee_profiles (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        tracing::info!("Auto-created mentee account for webhook attendee");

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)
    }

    async fn mentor_by_email(&self, email: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN mentor_profiles mp ON mp.user_id = u.user_id
            WHERE u.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Mentor not found for organizer email".to_string()))
    }

    async fn mentor_by_id(&self, mentor_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN mentor_profiles mp ON mp.user_id = u.user_id
            WHERE u.user_id = $1
            "#,
        )
        .bind(mentor_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Mentor not found".to_string()))
    }
}

enum MenteeRef<'a> {
    Id(Uuid),
    Email { email: &'a str, name: Option<&'a str> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calcom_payload_parses_into_calcom_variant() {
        let json = r#"{
            "triggerEvent": "BOOKING_CREATED",
            "createdAt": "2024-05-01T09:00:00Z",
            "payload": {
                "uid": "evt_abc123",
                "title": "Mentorship session",
                "startTime": "2024-05-02T10:00:00Z",
                "endTime": "2024-05-02T10:30:00Z",
                "attendees": [{"email": "mentee@example.com", "name": "Mina Mentee"}],
                "organizer": {"email": "mentor@example.com", "name": "Mo Mentor"},
                "metadata": {}
            }
        }"#;

        let parsed: WebhookPayload = serde_json::from_str(json).unwrap();
        match parsed {
            WebhookPayload::CalCom(event) => {
                assert_eq!(event.trigger_event, BOOKING_CREATED);
                assert_eq!(event.payload.uid.as_deref(), Some("evt_abc123"));
                assert_eq!(event.payload.attendees[0].email, "mentee@example.com");
                assert_eq!(event.payload.organizer.email, "mentor@example.com");
            }
            WebhookPayload::Internal(_) => panic!("expected Cal.com shape"),
        }
    }

    #[test]
    fn simplified_payload_parses_into_internal_variant() {
        let json = r#"{
            "mentor_id": "2fa84f5a-8f4d-43cd-b8f9-8a2d0b4a2f11",
            "mentee_id": "7c9b3a21-41a7-4c1e-bb8e-2f4e27a1d6d3",
            "status": "confirmed",
            "scheduled_at": "2024-05-02T10:00:00Z"
        }"#;

        let parsed: WebhookPayload = serde_json::from_str(json).unwrap();
        match parsed {
            WebhookPayload::Internal(event) => {
                assert_eq!(event.status, Some(BookingStatus::Confirmed));
                assert!(event.scheduled_at.is_some());
                assert!(event.event_ref.is_none());
            }
            WebhookPayload::CalCom(_) => panic!("expected internal shape"),
        }
    }

    #[test]
    fn minimal_internal_payload_needs_only_the_pair() {
        let json = r#"{
            "mentor_id": "2fa84f5a-8f4d-43cd-b8f9-8a2d0b4a2f11",
            "mentee_id": "7c9b3a21-41a7-4c1e-bb8e-2f4e27a1d6d3"
        }"#;

        let parsed: WebhookPayload = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, WebhookPayload::Internal(_)));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let json = r#"{"hello": "world"}"#;
        assert!(serde_json::from_str::<WebhookPayload>(json).is_err());
    }

    #[test]
    fn username_falls_back_to_email_prefix() {
        assert_eq!(derive_username(Some("Mina Mentee"), "m@example.com"), "Mina Mentee");
        assert_eq!(derive_username(Some("  "), "mina@example.com"), "mina");
        assert_eq!(derive_username(None, "mina@example.com"), "mina");
    }
}
