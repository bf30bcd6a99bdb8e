use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::AppState;

pub fn create_routes(state: AppState) -> Router {
    // Multipart framing adds overhead on top of the file itself.
    let upload_body_limit = state.config.uploads.max_bytes + 64 * 1024;

    let public = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/reset-password", post(handlers::reset_password))
        // Mentor directory is browsable without an account
        .route("/mentors", get(handlers::list_mentors))
        .route("/mentors/:mentor_id", get(handlers::get_mentor))
        // Calendar webhook (called by the scheduling provider)
        .route("/webhooks/calcom", post(handlers::calendar_webhook));

    let protected = Router::new()
        // Session
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::get_current_user))
        // Mentor self-service
        .route("/mentors/me", put(handlers::update_mentor_profile))
        .route("/mentors/me/availability", post(handlers::toggle_availability))
        // Mentee self-service
        .route("/mentees/me", get(handlers::get_mentee_profile))
        .route("/mentees/me", put(handlers::update_mentee_profile))
        // Booking lifecycle
        .route("/bookings", post(handlers::create_booking))
        .route("/bookings", get(handlers::list_bookings))
        .route("/bookings/:booking_id", get(handlers::get_booking))
        .route("/bookings/:booking_id/accept", post(handlers::accept_booking))
        .route("/bookings/:booking_id/decline", post(handlers::decline_booking))
        .route("/bookings/:booking_id/status", put(handlers::update_booking_status))
        .route("/bookings/:booking_id/mentee-feedback", post(handlers::submit_mentee_feedback))
        .route("/bookings/:booking_id/mentor-feedback", post(handlers::submit_mentor_feedback))
        // Session notes
        .route("/bookings/:booking_id/notes", post(handlers::add_booking_note))
        .route("/bookings/:booking_id/notes", get(handlers::list_booking_notes))
        .route("/notes/:note_id", delete(handlers::delete_booking_note))
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/unread-count", get(handlers::unread_notification_count))
        .route("/notifications/:notification_id/read", post(handlers::mark_notification_read))
        .route("/notifications/read-all", post(handlers::mark_all_notifications_read))
        // Mentor dashboard
        .route("/dashboard/tasks", post(handlers::create_task))
        .route("/dashboard/tasks", get(handlers::list_tasks))
        .route("/dashboard/tasks/:task_id", put(handlers::update_task))
        .route("/dashboard/tasks/:task_id", delete(handlers::delete_task))
        .route("/dashboard/availability", post(handlers::add_availability))
        .route("/dashboard/availability", get(handlers::list_availability))
        .route("/dashboard/availability/:slot_id", put(handlers::update_availability))
        .route("/dashboard/availability/:slot_id", delete(handlers::delete_availability))
        .route("/dashboard/earnings", get(handlers::list_earnings))
        .route("/dashboard/earnings", post(handlers::record_earning))
        .route("/dashboard/activity", get(handlers::list_activity))
        .route("/dashboard/activity", post(handlers::record_activity))
        // Profile image uploads
        .route(
            "/uploads/images",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public.merge(protected).with_state(state)
}
