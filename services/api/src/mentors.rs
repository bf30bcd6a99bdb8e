use sqlx::PgPool;
use uuid::Uuid;

use mentorhub_common::{AppError, EarningStatus, TaskStatus};
use mentorhub_database::{
    MenteeProfile, MentorActivity, MentorAvailabilitySlot, MentorEarning, MentorProfile,
    MentorTask, User,
};

use crate::models::*;
use crate::services::AppState;

pub struct MentorService {
    db_pool: PgPool,
}

impl MentorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    pub async fn list_mentors(&self, query: MentorListQuery) -> Result<Vec<MentorResponse>, AppError> {
        let include_unavailable = query.include_unavailable.unwrap_or(false);

        let rows = sqlx::query_as::<_, MentorProfile>(
            r#"
            SELECT mp.* FROM mentor_profiles mp
            WHERE ($1 OR mp.is_available)
              AND ($2::text IS NULL OR $2 = ANY(mp.expertise))
              AND ($3::text IS NULL OR $3 = ANY(mp.industries))
              AND ($4::text IS NULL OR $4 = ANY(mp.languages))
            ORDER BY mp.average_rating DESC, mp.total_ratings DESC
            "#,
        )
        .bind(include_unavailable)
        .bind(&query.expertise)
        .bind(&query.industry)
        .bind(&query.language)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let mut mentors = Vec::with_capacity(rows.len());
        for profile in rows {
            let user = self.fetch_user(profile.user_id).await?;
            mentors.push(MentorResponse::from_parts(&user, &profile));
        }

        Ok(mentors)
    }

    pub async fn get_mentor(&self, mentor_id: Uuid) -> Result<MentorResponse, AppError> {
        let profile = self.fetch_mentor_profile(mentor_id).await?;
        let user = self.fetch_user(mentor_id).await?;
        Ok(MentorResponse::from_parts(&user, &profile))
    }

    pub async fn update_mentor_profile(
        &self,
        mentor_id: Uuid,
        request: UpdateMentorProfileRequest,
    ) -> Result<MentorResponse, AppError> {
        // Ensure the profile exists before patching it.
        self.fetch_mentor_profile(mentor_id).await?;

        sqlx::query(
            r#"
            UPDATE mentor_profiles
            SET bio = COALESCE($1, bio),
                expertise = COALESCE($2, expertise),
                industries = COALESCE($3, industries),
                languages = COALESCE($4, languages),
                timezone = COALESCE($5, timezone),
                calendar_url = COALESCE($6, calendar_url),
                photo_url = COALESCE($7, photo_url),
                updated_at = NOW()
            WHERE user_id = $8
            "#,
        )
        .bind(&request.bio)
        .bind(&request.expertise)
        .bind(&request.industries)
        .bind(&request.languages)
        .bind(&request.timezone)
        .bind(&request.calendar_url)
        .bind(&request.photo_url)
        .bind(mentor_id)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        self.get_mentor(mentor_id).await
    }

    pub async fn toggle_availability(&self, mentor_id: Uuid) -> Result<bool, AppError> {
        let is_available: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE mentor_profiles
            SET is_available = NOT is_available, updated_at = NOW()
            WHERE user_id = $1
            RETURNING is_available
            "#,
        )
        .bind(mentor_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        is_available.ok_or_else(|| AppError::NotFound("Mentor not found".to_string()))
    }

    // Mentee profiles

    pub async fn get_mentee(&self, mentee_id: Uuid) -> Result<MenteeResponse, AppError> {
        let profile = sqlx::query_as::<_, MenteeProfile>(
            "SELECT * FROM mentee_profiles WHERE user_id = $1",
        )
        .bind(mentee_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Mentee not found".to_string()))?;

        let user = self.fetch_user(mentee_id).await?;
        Ok(MenteeResponse::from_parts(&user, &profile))
    }

    pub async fn update_mentee_profile(
        &self,
        mentee_id: Uuid,
        request: UpdateMenteeProfileRequest,
    ) -> Result<MenteeResponse, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE mentee_profiles
            SET contact = COALESCE($1, contact),
                mentee_type = COALESCE($2, mentee_type),
                languages = COALESCE($3, languages),
                interests = COALESCE($4, interests),
                updated_at = NOW()
            WHERE user_id = $5
            "#,
        )
        .bind(&request.contact)
        .bind(request.mentee_type.map(|t| t.as_str().to_string()))
        .bind(&request.languages)
        .bind(&request.interests)
        .bind(mentee_id)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Mentee not found".to_string()));
        }

        self.get_mentee(mentee_id).await
    }

    // Mentor tasks

    pub async fn create_task(&self, mentor_id: Uuid, request: CreateTaskRequest) -> Result<TaskResponse, AppError> {
        let task_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO mentor_tasks (task_id, mentor_id, title, description, status, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task_id)
        .bind(mentor_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(TaskStatus::Open.as_str())
        .bind(request.due_date)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let task = sqlx::query_as::<_, MentorTask>("SELECT * FROM mentor_tasks WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        Ok(task.into())
    }

    pub async fn list_tasks(&self, mentor_id: Uuid) -> Result<Vec<TaskResponse>, AppError> {
        let tasks = sqlx::query_as::<_, MentorTask>(
            "SELECT * FROM mentor_tasks WHERE mentor_id = $1 ORDER BY created_at DESC",
        )
        .bind(mentor_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(tasks.into_iter().map(Into::into).collect())
    }

    pub async fn update_task(
        &self,
        mentor_id: Uuid,
        task_id: Uuid,
        request: UpdateTaskRequest,
    ) -> Result<TaskResponse, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE mentor_tasks
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                status = COALESCE($3, status),
                due_date = COALESCE($4, due_date),
                updated_at = NOW()
            WHERE task_id = $5 AND mentor_id = $6
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.status.map(|s| s.as_str().to_string()))
        .bind(request.due_date)
        .bind(task_id)
        .bind(mentor_id)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Task not found".to_string()));
        }

        let task = sqlx::query_as::<_, MentorTask>("SELECT * FROM mentor_tasks WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        Ok(task.into())
    }

    pub async fn delete_task(&self, mentor_id: Uuid, task_id: Uuid) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM mentor_tasks WHERE task_id = $1 AND mentor_id = $2")
            .bind(task_id)
            .bind(mentor_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Task not found".to_string()));
        }

        Ok(())
    }

    // Availability slots

    pub async fn add_availability(
        &self,
        mentor_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilitySlotResponse, AppError> {
        if !(0..=6).contains(&request.day_of_week) {
            return Err(AppError::Validation("day_of_week must be between 0 and 6".to_string()));
        }
        if request.start_time >= request.end_time {
            return Err(AppError::Validation("start_time must be before end_time".to_string()));
        }

        let slot_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO mentor_availability (slot_id, mentor_id, day_of_week, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(slot_id)
        .bind(mentor_id)
        .bind(request.day_of_week)
        .bind(request.start_time)
        .bind(request.end_time)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let slot = sqlx::query_as::<_, MentorAvailabilitySlot>(
            "SELECT * FROM mentor_availability WHERE slot_id = $1",
        )
        .bind(slot_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(slot.into())
    }

    pub async fn list_availability(&self, mentor_id: Uuid) -> Result<Vec<AvailabilitySlotResponse>, AppError> {
        let slots = sqlx::query_as::<_, MentorAvailabilitySlot>(
            "SELECT * FROM mentor_availability WHERE mentor_id = $1 ORDER BY day_of_week, start_time",
        )
        .bind(mentor_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(slots.into_iter().map(Into::into).collect())
    }

    pub async fn update_availability(
        &self,
        mentor_id: Uuid,
        slot_id: Uuid,
        request: UpdateAvailabilityRequest,
    ) -> Result<AvailabilitySlotResponse, AppError> {
        let current = sqlx::query_as::<_, MentorAvailabilitySlot>(
            "SELECT * FROM mentor_availability WHERE slot_id = $1 AND mentor_id = $2",
        )
        .bind(slot_id)
        .bind(mentor_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Availability slot not found".to_string()))?;

        let day_of_week = request.day_of_week.unwrap_or(current.day_of_week);
        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        let is_active = request.is_active.unwrap_or(current.is_active);

        if !(0..=6).contains(&day_of_week) {
            return Err(AppError::Validation("day_of_week must be between 0 and 6".to_string()));
        }
        if start_time >= end_time {
            return Err(AppError::Validation("start_time must be before end_time".to_string()));
        }

        sqlx::query(
            r#"
            UPDATE mentor_availability
            SET day_of_week = $1, start_time = $2, end_time = $3, is_active = $4, updated_at = NOW()
            WHERE slot_id = $5 AND mentor_id = $6
            "#,
        )
        .bind(day_of_week)
        .bind(start_time)
        .bind(end_time)
        .bind(is_active)
        .bind(slot_id)
        .bind(mentor_id)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(AvailabilitySlotResponse {
            slot_id,
            day_of_week,
            start_time,
            end_time,
            is_active,
        })
    }

    pub async fn delete_availability(&self, mentor_id: Uuid, slot_id: Uuid) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM mentor_availability WHERE slot_id = $1 AND mentor_id = $2")
            .bind(slot_id)
            .bind(mentor_id)
            .execute(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability slot not found".to_string()));
        }

        Ok(())
    }

    // Earnings

    pub async fn list_earnings(&self, mentor_id: Uuid) -> Result<Vec<EarningResponse>, AppError> {
        let earnings = sqlx::query_as::<_, MentorEarning>(
            "SELECT * FROM mentor_earnings WHERE mentor_id = $1 ORDER BY earned_at DESC",
        )
        .bind(mentor_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(earnings.into_iter().map(Into::into).collect())
    }

    pub async fn record_earning(
        &self,
        mentor_id: Uuid,
        request: CreateEarningRequest,
    ) -> Result<EarningResponse, AppError> {
        if request.amount <= rust_decimal::Decimal::ZERO {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }

        let earning_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO mentor_earnings (earning_id, mentor_id, booking_id, amount, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(earning_id)
        .bind(mentor_id)
        .bind(request.booking_id)
        .bind(request.amount)
        .bind(request.currency.unwrap_or_else(|| "USD".to_string()))
        .bind(EarningStatus::Pending.as_str())
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let earning = sqlx::query_as::<_, MentorEarning>(
            "SELECT * FROM mentor_earnings WHERE earning_id = $1",
        )
        .bind(earning_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(earning.into())
    }

    // Activity log

    pub async fn list_activity(&self, mentor_id: Uuid) -> Result<Vec<ActivityResponse>, AppError> {
        let entries = sqlx::query_as::<_, MentorActivity>(
            "SELECT * FROM mentor_activity_log WHERE mentor_id = $1 ORDER BY created_at DESC LIMIT 100",
        )
        .bind(mentor_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(entries.into_iter().map(Into::into).collect())
    }

    pub async fn record_activity(
        &self,
        mentor_id: Uuid,
        request: RecordActivityRequest,
    ) -> Result<ActivityResponse, AppError> {
        let activity_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO mentor_activity_log (activity_id, mentor_id, activity_type, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(activity_id)
        .bind(mentor_id)
        .bind(&request.activity_type)
        .bind(&request.description)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let entry = sqlx::query_as::<_, MentorActivity>(
            "SELECT * FROM mentor_activity_log WHERE activity_id = $1",
        )
        .bind(activity_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(entry.into())
    }

    // Helpers

    async fn fetch_user(&self, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn fetch_mentor_profile(&self, mentor_id: Uuid) -> Result<MentorProfile, AppError> {
        sqlx::query_as::<_, MentorProfile>("SELECT * FROM mentor_profiles WHERE user_id = $1")
            .bind(mentor_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Mentor not found".to_string()))
    }
}
