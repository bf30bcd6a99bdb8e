use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use mentorhub_auth::Claims;
use mentorhub_common::{ApiResponse, AppError, UserRole};

use crate::bookings::BookingService;
use crate::mentors::MentorService;
use crate::middleware::require_role;
use crate::models::*;
use crate::notifications::NotificationService;
use crate::services::{AppState, UserService};
use crate::uploads::UploadService;
use crate::webhook::{WebhookPayload, WebhookService};

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

fn error_response(err: AppError) -> HandlerError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Request failed: {:?}", err);
        return (
            status,
            Json(ApiResponse::error("Internal server error".to_string())),
        );
    }

    (status, Json(ApiResponse::error(err.to_string())))
}

fn validate_request<T: Validate>(request: &T) -> Result<(), HandlerError> {
    request.validate().map_err(|validation_errors| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!(
                "Validation error: {:?}",
                validation_errors
            ))),
        )
    })
}

// Health check
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("MentorHub API is healthy".to_string()))
}

// Authentication

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, HandlerError> {
    validate_request(&request)?;

    let user_service = UserService::new(&state);
    user_service
        .signup(request)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, HandlerError> {
    validate_request(&request)?;

    let user_service = UserService::new(&state);
    user_service
        .login(request)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    let user_id = claims.user_id().map_err(error_response)?;

    let user_service = UserService::new(&state);
    user_service
        .logout(user_id)
        .await
        .map(|_| Json(ApiResponse::success("Logged out successfully".to_string())))
        .map_err(error_response)
}

pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<UserInfo>>, HandlerError> {
    let user_id = claims.user_id().map_err(error_response)?;

    let user_service = UserService::new(&state);
    let user = user_service
        .get_user_by_id(user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::success(UserInfo::from_user(
        &user,
        claims.active_role,
    ))))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    validate_request(&request)?;

    let user_service = UserService::new(&state);
    user_service
        .forgot_password(request)
        .await
        .map(|_| {
            Json(ApiResponse::success(
                "If the address is registered, a reset email has been sent".to_string(),
            ))
        })
        .map_err(error_response)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    validate_request(&request)?;

    let user_service = UserService::new(&state);
    user_service
        .reset_password(request)
        .await
        .map(|_| Json(ApiResponse::success("Password updated".to_string())))
        .map_err(error_response)
}

// Mentor directory

pub async fn list_mentors(
    State(state): State<AppState>,
    Query(query): Query<MentorListQuery>,
) -> Result<Json<ApiResponse<Vec<MentorResponse>>>, HandlerError> {
    let mentor_service = MentorService::new(&state);
    mentor_service
        .list_mentors(query)
        .await
        .map(|mentors| Json(ApiResponse::success(mentors)))
        .map_err(error_response)
}

pub async fn get_mentor(
    State(state): State<AppState>,
    Path(mentor_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MentorResponse>>, HandlerError> {
    let mentor_service = MentorService::new(&state);
    mentor_service
        .get_mentor(mentor_id)
        .await
        .map(|mentor| Json(ApiResponse::success(mentor)))
        .map_err(error_response)
}

pub async fn update_mentor_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<UpdateMentorProfileRequest>,
) -> Result<Json<ApiResponse<MentorResponse>>, HandlerError> {
    validate_request(&request)?;
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .update_mentor_profile(mentor_id, request)
        .await
        .map(|mentor| Json(ApiResponse::success(mentor)))
        .map_err(error_response)
}

pub async fn toggle_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<bool>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .toggle_availability(mentor_id)
        .await
        .map(|is_available| Json(ApiResponse::success(is_available)))
        .map_err(error_response)
}

// Mentee profile

pub async fn get_mentee_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<MenteeResponse>>, HandlerError> {
    let mentee_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .get_mentee(mentee_id)
        .await
        .map(|mentee| Json(ApiResponse::success(mentee)))
        .map_err(error_response)
}

pub async fn update_mentee_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<UpdateMenteeProfileRequest>,
) -> Result<Json<ApiResponse<MenteeResponse>>, HandlerError> {
    validate_request(&request)?;
    require_role(&claims, UserRole::Mentee).map_err(error_response)?;
    let mentee_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .update_mentee_profile(mentee_id, request)
        .await
        .map(|mentee| Json(ApiResponse::success(mentee)))
        .map_err(error_response)
}

// Booking lifecycle

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, HandlerError> {
    validate_request(&request)?;
    require_role(&claims, UserRole::Mentee).map_err(error_response)?;

    let booking_service = BookingService::new(&state);
    booking_service
        .create_request(&claims, request)
        .await
        .map(|booking| Json(ApiResponse::success(booking)))
        .map_err(error_response)
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<BookingResponse>>>, HandlerError> {
    let booking_service = BookingService::new(&state);
    booking_service
        .list_for_user(&claims)
        .await
        .map(|bookings| Json(ApiResponse::success(bookings)))
        .map_err(error_response)
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, HandlerError> {
    let booking_service = BookingService::new(&state);
    booking_service
        .get_booking(&claims, booking_id)
        .await
        .map(|booking| Json(ApiResponse::success(booking)))
        .map_err(error_response)
}

pub async fn accept_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;

    let booking_service = BookingService::new(&state);
    booking_service
        .accept(&claims, booking_id)
        .await
        .map(|booking| Json(ApiResponse::success(booking)))
        .map_err(error_response)
}

pub async fn decline_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingResponse>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;

    let booking_service = BookingService::new(&state);
    booking_service
        .decline(&claims, booking_id)
        .await
        .map(|booking| Json(ApiResponse::success(booking)))
        .map_err(error_response)
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, HandlerError> {
    let booking_service = BookingService::new(&state);
    booking_service
        .update_status(&claims, booking_id, request.status)
        .await
        .map(|booking| Json(ApiResponse::success(booking)))
        .map_err(error_response)
}

pub async fn submit_mentee_feedback(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, HandlerError> {
    validate_request(&request)?;
    require_role(&claims, UserRole::Mentee).map_err(error_response)?;

    let booking_service = BookingService::new(&state);
    booking_service
        .submit_mentee_feedback(&claims, booking_id, request)
        .await
        .map(|booking| Json(ApiResponse::success(booking)))
        .map_err(error_response)
}

pub async fn submit_mentor_feedback(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, HandlerError> {
    validate_request(&request)?;
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;

    let booking_service = BookingService::new(&state);
    booking_service
        .submit_mentor_feedback(&claims, booking_id, request)
        .await
        .map(|booking| Json(ApiResponse::success(booking)))
        .map_err(error_response)
}

// Booking notes

pub async fn add_booking_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<Json<ApiResponse<NoteResponse>>, HandlerError> {
    validate_request(&request)?;

    let booking_service = BookingService::new(&state);
    booking_service
        .add_note(&claims, booking_id, request)
        .await
        .map(|note| Json(ApiResponse::success(note)))
        .map_err(error_response)
}

pub async fn list_booking_notes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<NoteResponse>>>, HandlerError> {
    let booking_service = BookingService::new(&state);
    booking_service
        .list_notes(&claims, booking_id)
        .await
        .map(|notes| Json(ApiResponse::success(notes)))
        .map_err(error_response)
}

pub async fn delete_booking_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(note_id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    let booking_service = BookingService::new(&state);
    booking_service
        .delete_note(&claims, note_id)
        .await
        .map(|_| Json(ApiResponse::success("Note deleted".to_string())))
        .map_err(error_response)
}

// Notifications

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<NotificationResponse>>>, HandlerError> {
    let notification_service = NotificationService::new(&state);
    notification_service
        .list_for_recipient(&claims.email)
        .await
        .map(|notifications| {
            Json(ApiResponse::success(
                notifications.into_iter().map(NotificationResponse::from).collect::<Vec<_>>(),
            ))
        })
        .map_err(error_response)
}

pub async fn unread_notification_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<UnreadCountResponse>>, HandlerError> {
    let notification_service = NotificationService::new(&state);
    notification_service
        .unread_count(&claims.email)
        .await
        .map(|unread| Json(ApiResponse::success(UnreadCountResponse { unread })))
        .map_err(error_response)
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    let notification_service = NotificationService::new(&state);
    notification_service
        .mark_read(notification_id, &claims.email)
        .await
        .map(|_| Json(ApiResponse::success("Notification marked as read".to_string())))
        .map_err(error_response)
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<u64>>, HandlerError> {
    let notification_service = NotificationService::new(&state);
    notification_service
        .mark_all_read(&claims.email)
        .await
        .map(|count| Json(ApiResponse::success(count)))
        .map_err(error_response)
}

// Mentor dashboard

pub async fn create_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<ApiResponse<TaskResponse>>, HandlerError> {
    validate_request(&request)?;
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .create_task(mentor_id, request)
        .await
        .map(|task| Json(ApiResponse::success(task)))
        .map_err(error_response)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<TaskResponse>>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .list_tasks(mentor_id)
        .await
        .map(|tasks| Json(ApiResponse::success(tasks)))
        .map_err(error_response)
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<ApiResponse<TaskResponse>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .update_task(mentor_id, task_id, request)
        .await
        .map(|task| Json(ApiResponse::success(task)))
        .map_err(error_response)
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .delete_task(mentor_id, task_id)
        .await
        .map(|_| Json(ApiResponse::success("Task deleted".to_string())))
        .map_err(error_response)
}

pub async fn add_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<ApiResponse<AvailabilitySlotResponse>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .add_availability(mentor_id, request)
        .await
        .map(|slot| Json(ApiResponse::success(slot)))
        .map_err(error_response)
}

pub async fn list_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<AvailabilitySlotResponse>>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .list_availability(mentor_id)
        .await
        .map(|slots| Json(ApiResponse::success(slots)))
        .map_err(error_response)
}

pub async fn update_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slot_id): Path<Uuid>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<ApiResponse<AvailabilitySlotResponse>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .update_availability(mentor_id, slot_id, request)
        .await
        .map(|slot| Json(ApiResponse::success(slot)))
        .map_err(error_response)
}

pub async fn delete_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .delete_availability(mentor_id, slot_id)
        .await
        .map(|_| Json(ApiResponse::success("Availability slot deleted".to_string())))
        .map_err(error_response)
}

pub async fn list_earnings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<EarningResponse>>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .list_earnings(mentor_id)
        .await
        .map(|earnings| Json(ApiResponse::success(earnings)))
        .map_err(error_response)
}

pub async fn record_earning(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateEarningRequest>,
) -> Result<Json<ApiResponse<EarningResponse>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .record_earning(mentor_id, request)
        .await
        .map(|earning| Json(ApiResponse::success(earning)))
        .map_err(error_response)
}

pub async fn list_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<ActivityResponse>>>, HandlerError> {
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .list_activity(mentor_id)
        .await
        .map(|entries| Json(ApiResponse::success(entries)))
        .map_err(error_response)
}

pub async fn record_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RecordActivityRequest>,
) -> Result<Json<ApiResponse<ActivityResponse>>, HandlerError> {
    validate_request(&request)?;
    require_role(&claims, UserRole::Mentor).map_err(error_response)?;
    let mentor_id = claims.user_id().map_err(error_response)?;

    let mentor_service = MentorService::new(&state);
    mentor_service
        .record_activity(mentor_id, request)
        .await
        .map(|entry| Json(ApiResponse::success(entry)))
        .map_err(error_response)
}

// Uploads

pub async fn upload_image(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, HandlerError> {
    let upload_service = UploadService::new(&state);

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Malformed multipart body: {}", e))),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(|ct| ct.to_string());
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Failed to read upload: {}", e))),
            )
        })?;

        return upload_service
            .save_image(content_type.as_deref(), &data)
            .await
            .map(|response| Json(ApiResponse::success(response)))
            .map_err(error_response);
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error("Missing file field in multipart body".to_string())),
    ))
}

// Calendar webhook

pub async fn calendar_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<ApiResponse<Option<WebhookOutcome>>>, HandlerError> {
    let webhook_service = WebhookService::new(&state);
    webhook_service
        .handle(payload)
        .await
        .map(|outcome| Json(ApiResponse::success(outcome)))
        .map_err(error_response)
}
