use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use mentorhub_auth::{Claims, JwtService, PasswordService};
use mentorhub_common::{AppError, RedisService, UserRole};
use mentorhub_database::User;

use crate::config::AppConfig;
use crate::email::EmailService;
use crate::models::*;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_service: RedisService,
    pub jwt_service: JwtService,
    pub email_service: EmailService,
    pub config: AppConfig,
}

pub struct UserService {
    db_pool: PgPool,
    redis_service: RedisService,
    jwt_service: JwtService,
    config: AppConfig,
    email_service: EmailService,
}

const RESET_TOKEN_TTL_SECONDS: u64 = 30 * 60;

/// Signup races its existence pre-check; the unique index on users.email is
/// the arbiter, and losing that race is a conflict, not a server fault.
fn unique_violation_to_conflict(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
            redis_service: state.redis_service.clone(),
            jwt_service: state.jwt_service.clone(),
            config: state.config.clone(),
            email_service: state.email_service.clone(),
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, AppError> {
        PasswordService::validate_password_strength(&request.password)?;

        let existing_user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1 OR username = $2",
        )
        .bind(&request.email)
        .bind(&request.username)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if existing_user.is_some() {
            return Err(AppError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }

        let hashed_password = PasswordService::hash_password(&request.password)?;
        let user_id = Uuid::new_v4();

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, email, roles, hashed_password, email_verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(vec![request.role.as_str().to_string()])
        .bind(&hashed_password)
        .bind(false)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation_to_conflict(e, "User with this email or username already exists")
        })?;

        match request.role {
            UserRole::Mentor => {
                sqlx::query("INSERT INTO mentor_profiles (user_id) VALUES ($1)")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
            }
            UserRole::Mentee => {
                sqlx::query("INSERT INTO mentee_profiles (user_id) VALUES ($1)")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
            }
            UserRole::Admin => {}
        }

        tx.commit().await.map_err(AppError::Database)?;

        let roles = vec![request.role];
        let token = self.issue_session(user_id, &request.username, &request.email, &roles, Some(request.role)).await?;

        tracing::info!("User registered: {} ({})", request.username, request.email);

        Ok(AuthResponse {
            token,
            user: UserInfo {
                user_id,
                username: request.username,
                email: request.email,
                roles,
                active_role: Some(request.role),
                email_verified: false,
                created_at: Utc::now(),
            },
            expires_at: Utc::now() + Duration::hours(self.config.jwt.expiration_hours as i64),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&request.email)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !PasswordService::verify_password(&request.password, &user.hashed_password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let roles: Vec<UserRole> = user.roles.iter().filter_map(|r| UserRole::parse(r)).collect();

        let active_role = if let Some(requested_role) = request.active_role {
            if roles.contains(&requested_role) {
                Some(requested_role)
            } else {
                return Err(AppError::Authorization(
                    "User does not have the requested role".to_string(),
                ));
            }
        } else {
            roles.first().copied()
        };

        let token = self
            .issue_session(user.user_id, &user.username, &user.email, &roles, active_role)
            .await?;

        Ok(AuthResponse {
            token,
            user: UserInfo::from_user(&user, active_role),
            expires_at: Utc::now() + Duration::hours(self.config.jwt.expiration_hours as i64),
        })
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.redis_service.delete_session(&user_id.to_string()).await
    }

    pub async fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.jwt_service.validate_token(token)?;

        // A token is only good while its session is still live in Redis.
        let session = self.redis_service.get_session(&claims.sub).await?;
        match session {
            Some(stored) if stored == token => Ok(claims),
            _ => Err(AppError::Authentication("Session expired".to_string())),
        }
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&request.email)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        // No account enumeration: unknown addresses get the same response.
        let Some(user) = user else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = PasswordService::generate_reset_token();
        self.redis_service
            .set_reset_token(&token, &user.user_id.to_string(), RESET_TOKEN_TTL_SECONDS)
            .await?;

        if let Err(err) = self.email_service.send_password_reset(&user.email, &token).await {
            tracing::warn!("Failed to send password reset email: {:?}", err);
        }

        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AppError> {
        PasswordService::validate_password_strength(&request.new_password)?;

        let user_id = self
            .redis_service
            .take_reset_token(&request.token)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid or expired reset token".to_string()))?;

        let user_id = Uuid::parse_str(&user_id)
            .map_err(|_| AppError::Internal("Malformed reset token mapping".to_string()))?;

        let hashed_password = PasswordService::hash_password(&request.new_password)?;

        let result = sqlx::query(
            "UPDATE users SET hashed_password = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(&hashed_password)
        .bind(user_id)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        // Force re-login everywhere.
        self.redis_service.delete_session(&user_id.to_string()).await?;

        Ok(())
    }

    async fn issue_session(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
        roles: &[UserRole],
        active_role: Option<UserRole>,
    ) -> Result<String, AppError> {
        let claims = Claims::new(
            user_id,
            username.to_string(),
            email.to_string(),
            roles.to_vec(),
            active_role,
            &self.config.jwt,
        );

        let token = self.jwt_service.generate_token(&claims)?;

        self.redis_service
            .set_session(
                &user_id.to_string(),
                &token,
                self.config.jwt.expiration_hours * 3600,
            )
            .await?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct DuplicateKey;

    impl fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl StdError for DuplicateKey {}

    impl sqlx::error::DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn duplicate_user_insert_maps_to_conflict() {
        let err = sqlx::Error::Database(Box::new(DuplicateKey));
        let mapped = unique_violation_to_conflict(err, "User with this email or username already exists");
        assert!(matches!(mapped, AppError::Conflict(_)));
        assert_eq!(mapped.status_code(), 409);
    }

    #[test]
    fn other_database_errors_stay_database_errors() {
        let mapped = unique_violation_to_conflict(sqlx::Error::RowNotFound, "unused");
        assert!(matches!(mapped, AppError::Database(_)));
        assert_eq!(mapped.status_code(), 500);
    }
}
