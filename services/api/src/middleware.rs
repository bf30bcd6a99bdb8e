use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};

use mentorhub_auth::Claims;
use mentorhub_common::{ApiResponse, AppError, UserRole};

use crate::services::{AppState, UserService};

// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<()>>)> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let token = match auth_header {
        Some(token) => token,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Missing or invalid authorization header".to_string())),
            ));
        }
    };

    let user_service = UserService::new(&state);
    let claims = match user_service.validate_token(token).await {
        Ok(claims) => claims,
        Err(_) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Invalid or expired token".to_string())),
            ));
        }
    };

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Role gate used by role-scoped handlers. The role must be granted AND,
/// when a session carries an active role, it must match.
pub fn require_role(claims: &Claims, role: UserRole) -> Result<(), AppError> {
    if !claims.has_role(role) {
        return Err(AppError::Authorization(format!(
            "Role {} required",
            role.as_str()
        )));
    }

    if let Some(active_role) = claims.active_role {
        if active_role != role {
            return Err(AppError::Authorization(format!(
                "Active role must be {}",
                role.as_str()
            )));
        }
    }

    Ok(())
}
