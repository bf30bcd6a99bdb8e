use bcrypt::{hash, verify, DEFAULT_COST};
use rand::{distributions::Alphanumeric, Rng};
use mentorhub_common::AppError;

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Authentication(format!("Failed to verify password: {}", e)))
    }

    pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
        if password.len() < 8 {
            return Err(AppError::Validation("Password must be at least 8 characters long".to_string()));
        }

        let has_uppercase = password.chars().any(|c| c.is_uppercase());
        let has_lowercase = password.chars().any(|c| c.is_lowercase());
        let has_digit = password.chars().any(|c| c.is_numeric());

        if !has_uppercase {
            return Err(AppError::Validation("Password must contain at least one uppercase letter".to_string()));
        }

        if !has_lowercase {
            return Err(AppError::Validation("Password must contain at least one lowercase letter".to_string()));
        }

        if !has_digit {
            return Err(AppError::Validation("Password must contain at least one digit".to_string()));
        }

        Ok(())
    }

    /// Opaque token for the forgot/reset password flow.
    pub fn generate_reset_token() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect()
    }

    /// Placeholder credential for accounts created from webhook attendees;
    /// such users must go through the reset flow before logging in.
    pub fn generate_random_password() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = PasswordService::hash_password("Sup3rSecret").unwrap();
        assert!(PasswordService::verify_password("Sup3rSecret", &hashed).unwrap());
        assert!(!PasswordService::verify_password("wrong", &hashed).unwrap());
    }

    #[test]
    fn strength_rules_reject_weak_passwords() {
        assert!(PasswordService::validate_password_strength("short1A").is_err());
        assert!(PasswordService::validate_password_strength("alllowercase1").is_err());
        assert!(PasswordService::validate_password_strength("ALLUPPERCASE1").is_err());
        assert!(PasswordService::validate_password_strength("NoDigitsHere").is_err());
        assert!(PasswordService::validate_password_strength("GoodPass1").is_ok());
    }

    #[test]
    fn reset_tokens_are_unique_and_sized() {
        let a = PasswordService::generate_reset_token();
        let b = PasswordService::generate_reset_token();
        assert_eq!(a.len(), 48);
        assert_ne!(a, b);
    }
}
