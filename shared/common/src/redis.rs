use redis::{aio::ConnectionManager, AsyncCommands, Client};
use crate::{AppError, RedisConfig};

/// Session store backed by Redis. A login writes the issued token under the
/// user's session key; logout deletes it.
#[derive(Clone)]
pub struct RedisService {
    manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(config: &RedisConfig) -> Result<Self, AppError> {
        let client = Client::open(config.connection_string()).map_err(AppError::Redis)?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(AppError::Redis)?;

        tracing::info!("Redis connection established");

        Ok(Self { manager })
    }

    pub async fn set_session(&self, user_id: &str, token: &str, expiry_seconds: u64) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        conn.set_ex(Self::session_key(user_id), token, expiry_seconds)
            .await
            .map_err(AppError::Redis)
    }

    pub async fn get_session(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.manager.clone();
        conn.get(Self::session_key(user_id))
            .await
            .map_err(AppError::Redis)
    }

    pub async fn delete_session(&self, user_id: &str) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        conn.del(Self::session_key(user_id))
            .await
            .map_err(AppError::Redis)
    }

    // Password reset tokens are single-use and short-lived.
    pub async fn set_reset_token(&self, token: &str, user_id: &str, expiry_seconds: u64) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        conn.set_ex(Self::reset_key(token), user_id, expiry_seconds)
            .await
            .map_err(AppError::Redis)
    }

    pub async fn take_reset_token(&self, token: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.manager.clone();
        let key = Self::reset_key(token);
        let user_id: Option<String> = conn.get(&key).await.map_err(AppError::Redis)?;
        if user_id.is_some() {
            let _: () = conn.del(&key).await.map_err(AppError::Redis)?;
        }
        Ok(user_id)
    }

    fn session_key(user_id: &str) -> String {
        format!("session:{}", user_id)
    }

    fn reset_key(token: &str) -> String {
        format!("password_reset:{}", token)
    }
}
