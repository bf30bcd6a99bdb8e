use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use mentorhub_common::{AppError, NotificationType, UserRole};
use mentorhub_database::Notification;

use crate::services::AppState;

/// Persists in-app notification rows. Lifecycle transitions call
/// `create_in_tx` so the row commits or rolls back together with the
/// booking write that triggered it.
pub struct NotificationService {
    db_pool: PgPool,
}

impl NotificationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        recipient_email: &str,
        recipient_role: UserRole,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        booking_id: Option<Uuid>,
    ) -> Result<Uuid, AppError> {
        let notification_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO notifications
                (notification_id, recipient_email, recipient_role, notification_type,
                 title, message, booking_id, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)
            "#,
        )
        .bind(notification_id)
        .bind(recipient_email)
        .bind(recipient_role.as_str())
        .bind(notification_type.as_str())
        .bind(title)
        .bind(message)
        .bind(booking_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(notification_id)
    }

    pub async fn list_for_recipient(&self, email: &str) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE recipient_email = $1 ORDER BY created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn unread_count(&self, email: &str) -> Result<i64, AppError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_email = $1 AND NOT is_read",
        )
        .bind(email)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn mark_read(&self, notification_id: Uuid, email: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE notification_id = $1 AND recipient_email = $2",
        )
        .bind(notification_id)
        .bind(email)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }

        Ok(())
    }

    pub async fn mark_all_read(&self, email: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_email = $1 AND NOT is_read",
        )
        .bind(email)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
