use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use mentorhub_auth::Claims;
use mentorhub_common::{AppError, BookingStatus, NotificationType, NoteType, UserRole};
use mentorhub_database::{Booking, BookingNote, User};

use crate::config::AppConfig;
use crate::email::EmailService;
use crate::models::*;
use crate::notifications::NotificationService;
use crate::ratings;
use crate::services::AppState;

/// Booking lifecycle manager. Every transition is a conditional update on
/// the expected current status, and each transition commits together with
/// the notification row it emits.
pub struct BookingService {
    db_pool: PgPool,
    email_service: EmailService,
    config: AppConfig,
}

/// Notification type for a status the booking just entered; the mapping
/// itself lives next to the enums.
fn transition_notification(status: BookingStatus) -> Result<NotificationType, AppError> {
    NotificationType::for_booking_status(status).ok_or_else(|| {
        AppError::Internal(format!(
            "No notification is defined for status {}",
            status.as_str()
        ))
    })
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
            email_service: state.email_service.clone(),
            config: state.config.clone(),
        }
    }

    pub async fn create_request(
        &self,
        claims: &Claims,
        request: CreateBookingRequest,
    ) -> Result<BookingResponse, AppError> {
        let mentee_id = claims.user_id()?;

        // Unknown mentor fails before anything is written.
        let mentor = self.fetch_mentor_user(request.mentor_id).await?;

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        // A user booking for the first time may not have a mentee profile yet.
        sqlx::query("INSERT INTO mentee_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(mentee_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let booking_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO bookings (booking_id, mentor_id, mentee_id, status, goal)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(booking_id)
        .bind(mentor.user_id)
        .bind(mentee_id)
        .bind(BookingStatus::Pending.as_str())
        .bind(&request.goal)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let message = match &request.goal {
            Some(goal) => format!("{} requested a session: {}", claims.username, goal),
            None => format!("{} requested a session", claims.username),
        };
        NotificationService::create_in_tx(
            &mut tx,
            &mentor.email,
            UserRole::Mentor,
            transition_notification(BookingStatus::Pending)?,
            "New booking request",
            &message,
            Some(booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Booking {} requested by {} for mentor {}", booking_id, mentee_id, mentor.user_id);

        let booking = self.fetch_booking(booking_id).await?;
        Ok(booking.into())
    }

    pub async fn accept(&self, claims: &Claims, booking_id: Uuid) -> Result<BookingResponse, AppError> {
        let mentor_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        if booking.mentor_id != mentor_id {
            return Err(AppError::Authorization("Booking does not belong to this mentor".to_string()));
        }

        let mentee = self.fetch_user(booking.mentee_id).await?;

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1, accepted_at = NOW(), updated_at = NOW()
            WHERE booking_id = $2 AND status = $3
            "#,
        )
        .bind(BookingStatus::Accepted.as_str())
        .bind(booking_id)
        .bind(BookingStatus::Pending.as_str())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Validation("Booking is not pending".to_string()));
        }

        NotificationService::create_in_tx(
            &mut tx,
            &mentee.email,
            UserRole::Mentee,
            transition_notification(BookingStatus::Accepted)?,
            "Booking accepted",
            &format!("{} accepted your booking request", claims.username),
            Some(booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        // Best-effort: the transition stands even if the email never leaves.
        let calendar_url: Option<String> =
            sqlx::query_scalar("SELECT calendar_url FROM mentor_profiles WHERE user_id = $1")
                .bind(mentor_id)
                .fetch_optional(&self.db_pool)
                .await
                .map_err(AppError::Database)?
                .flatten();

        if let Err(err) = self
            .email_service
            .send_booking_accepted(&mentee.email, &claims.username, calendar_url.as_deref())
            .await
        {
            tracing::warn!("Failed to send acceptance email for booking {}: {:?}", booking_id, err);
        }

        let booking = self.fetch_booking(booking_id).await?;
        Ok(booking.into())
    }

    pub async fn decline(&self, claims: &Claims, booking_id: Uuid) -> Result<BookingResponse, AppError> {
        let mentor_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        if booking.mentor_id != mentor_id {
            return Err(AppError::Authorization("Booking does not belong to this mentor".to_string()));
        }

        let mentee = self.fetch_user(booking.mentee_id).await?;

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1, updated_at = NOW()
            WHERE booking_id = $2 AND status = $3
            "#,
        )
        .bind(BookingStatus::Rejected.as_str())
        .bind(booking_id)
        .bind(BookingStatus::Pending.as_str())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Validation("Booking is not pending".to_string()));
        }

        NotificationService::create_in_tx(
            &mut tx,
            &mentee.email,
            UserRole::Mentee,
            transition_notification(BookingStatus::Rejected)?,
            "Booking declined",
            &format!("{} declined your booking request", claims.username),
            Some(booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        let booking = self.fetch_booking(booking_id).await?;
        Ok(booking.into())
    }

    /// Mentor-initiated overwrite, restricted to the terminal statuses the
    /// dashboard exposes.
    pub async fn update_status(
        &self,
        claims: &Claims,
        booking_id: Uuid,
        target: BookingStatus,
    ) -> Result<BookingResponse, AppError> {
        if !matches!(target, BookingStatus::Completed | BookingStatus::Canceled) {
            return Err(AppError::Validation(
                "Status must be one of: completed, canceled".to_string(),
            ));
        }

        let mentor_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        if booking.mentor_id != mentor_id {
            return Err(AppError::Authorization("Booking does not belong to this mentor".to_string()));
        }

        let current = BookingStatus::parse(&booking.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown booking status: {}", booking.status)))?;

        if !current.can_transition_to(target) {
            return Err(AppError::Validation(format!(
                "Cannot move booking from {} to {}",
                current.as_str(),
                target.as_str()
            )));
        }

        let timestamp_column = match target {
            BookingStatus::Completed => "completed_at",
            _ => "canceled_at",
        };

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query(&format!(
            "UPDATE bookings SET status = $1, {} = NOW(), updated_at = NOW() \
             WHERE booking_id = $2 AND status = $3",
            timestamp_column
        ))
        .bind(target.as_str())
        .bind(booking_id)
        .bind(current.as_str())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        // Same answer whether the state was wrong up front or changed
        // under us: the transition is not valid from the current state.
        if updated.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "Booking is no longer {}",
                current.as_str()
            )));
        }

        if target == BookingStatus::Completed {
            self.record_completion(&mut tx, &booking).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        let booking = self.fetch_booking(booking_id).await?;
        Ok(booking.into())
    }

    pub async fn submit_mentee_feedback(
        &self,
        claims: &Claims,
        booking_id: Uuid,
        request: FeedbackRequest,
    ) -> Result<BookingResponse, AppError> {
        let mentee_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        if booking.mentee_id != mentee_id {
            return Err(AppError::Authorization("Booking does not belong to this mentee".to_string()));
        }

        if booking.mentee_rating.is_some() {
            return Err(AppError::Conflict("Feedback already submitted for this booking".to_string()));
        }

        let mentor = self.fetch_user(booking.mentor_id).await?;

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        // Guard against a concurrent double submission.
        let updated = sqlx::query(
            r#"
            UPDATE bookings
            SET mentee_rating = $1, mentee_feedback = $2, updated_at = NOW()
            WHERE booking_id = $3 AND mentee_rating IS NULL
            "#,
        )
        .bind(request.rating)
        .bind(&request.feedback)
        .bind(booking_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict("Feedback already submitted for this booking".to_string()));
        }

        let (average, total) = ratings::recompute_mentor_rating(&mut tx, booking.mentor_id).await?;

        NotificationService::create_in_tx(
            &mut tx,
            &mentor.email,
            UserRole::Mentor,
            NotificationType::FeedbackReceived,
            "New feedback received",
            &format!("{} rated your session {}/5", claims.username, request.rating),
            Some(booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "Mentor {} rating recomputed: {} across {} ratings",
            booking.mentor_id,
            average,
            total
        );

        let booking = self.fetch_booking(booking_id).await?;
        Ok(booking.into())
    }

    pub async fn submit_mentor_feedback(
        &self,
        claims: &Claims,
        booking_id: Uuid,
        request: FeedbackRequest,
    ) -> Result<BookingResponse, AppError> {
        let mentor_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        if booking.mentor_id != mentor_id {
            return Err(AppError::Authorization("Booking does not belong to this mentor".to_string()));
        }

        if booking.mentor_rating.is_some() {
            return Err(AppError::Conflict("Feedback already submitted for this booking".to_string()));
        }

        let mentee = self.fetch_user(booking.mentee_id).await?;

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query(
            r#"
            UPDATE bookings
            SET mentor_rating = $1, mentor_feedback = $2, updated_at = NOW()
            WHERE booking_id = $3 AND mentor_rating IS NULL
            "#,
        )
        .bind(request.rating)
        .bind(&request.feedback)
        .bind(booking_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict("Feedback already submitted for this booking".to_string()));
        }

        // No mentee-side aggregate is maintained.
        NotificationService::create_in_tx(
            &mut tx,
            &mentee.email,
            UserRole::Mentee,
            NotificationType::FeedbackReceived,
            "New feedback received",
            &format!("{} rated your session {}/5", claims.username, request.rating),
            Some(booking_id),
        )
        .await?;

        tx.commit().await.map_err(AppError::Database)?;

        let booking = self.fetch_booking(booking_id).await?;
        Ok(booking.into())
    }

    pub async fn list_for_user(&self, claims: &Claims) -> Result<Vec<BookingResponse>, AppError> {
        let user_id = claims.user_id()?;

        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE mentor_id = $1 OR mentee_id = $1 ORDER BY requested_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(bookings.into_iter().map(Into::into).collect())
    }

    pub async fn get_booking(&self, claims: &Claims, booking_id: Uuid) -> Result<BookingResponse, AppError> {
        let user_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        if booking.mentor_id != user_id && booking.mentee_id != user_id {
            return Err(AppError::Authorization("Not a participant of this booking".to_string()));
        }

        Ok(booking.into())
    }

    // Notes

    pub async fn add_note(
        &self,
        claims: &Claims,
        booking_id: Uuid,
        request: CreateNoteRequest,
    ) -> Result<NoteResponse, AppError> {
        let user_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        let author_role = if booking.mentor_id == user_id {
            UserRole::Mentor
        } else if booking.mentee_id == user_id {
            UserRole::Mentee
        } else {
            return Err(AppError::Authorization("Not a participant of this booking".to_string()));
        };

        let note_id = Uuid::new_v4();
        let note_type = request.note_type.unwrap_or(NoteType::Note);

        sqlx::query(
            r#"
            INSERT INTO booking_notes (note_id, booking_id, author_id, author_role, note_type, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(note_id)
        .bind(booking_id)
        .bind(user_id)
        .bind(author_role.as_str())
        .bind(note_type.as_str())
        .bind(&request.content)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let note = sqlx::query_as::<_, BookingNote>("SELECT * FROM booking_notes WHERE note_id = $1")
            .bind(note_id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        Ok(note.into())
    }

    pub async fn list_notes(&self, claims: &Claims, booking_id: Uuid) -> Result<Vec<NoteResponse>, AppError> {
        let user_id = claims.user_id()?;
        let booking = self.fetch_booking(booking_id).await?;

        if booking.mentor_id != user_id && booking.mentee_id != user_id {
            return Err(AppError::Authorization("Not a participant of this booking".to_string()));
        }

        let notes = sqlx::query_as::<_, BookingNote>(
            "SELECT * FROM booking_notes WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(notes.into_iter().map(Into::into).collect())
    }

    pub async fn delete_note(&self, claims: &Claims, note_id: Uuid) -> Result<(), AppError> {
        let user_id = claims.user_id()?;

        let note = sqlx::query_as::<_, BookingNote>("SELECT * FROM booking_notes WHERE note_id = $1")
            .bind(note_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

        if note.author_id != user_id {
            return Err(AppError::Authorization("Only the author can delete a note".to_string()));
        }

        sqlx::query("DELETE FROM booking_notes WHERE note_id = $1")
            .bind(note_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    // Helpers

    async fn record_completion(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        booking: &Booking,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO mentor_activity_log (activity_id, mentor_id, activity_type, description)
            VALUES ($1, $2, 'booking_completed', $3)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.mentor_id)
        .bind(format!("Completed session {}", booking.booking_id))
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        if self.config.booking.session_fee > rust_decimal::Decimal::ZERO {
            sqlx::query(
                r#"
                INSERT INTO mentor_earnings (earning_id, mentor_id, booking_id, amount, currency, status, earned_at)
                VALUES ($1, $2, $3, $4, $5, 'pending', $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(booking.mentor_id)
            .bind(booking.booking_id)
            .bind(self.config.booking.session_fee)
            .bind(&self.config.booking.currency)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;
        }

        Ok(())
    }

    async fn fetch_booking(&self, booking_id: Uuid) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_id = $1")
            .bind(booking_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    async fn fetch_user(&self, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn fetch_mentor_user(&self, mentor_id: Uuid) -> Result<User, AppError> {
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
