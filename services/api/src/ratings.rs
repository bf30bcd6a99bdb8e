use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use mentorhub_common::AppError;

/// Mean and count over a mentor's collected ratings, rounded to two places.
pub fn aggregate_ratings(ratings: &[i16]) -> (Decimal, i32) {
    if ratings.is_empty() {
        return (Decimal::ZERO, 0);
    }

    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let mean = Decimal::from(sum) / Decimal::from(ratings.len() as i64);
    (mean.round_dp(2), ratings.len() as i32)
}

/// Full recompute of a mentor's aggregate rating: scan every booking with a
/// non-null mentee rating and average. Runs inside the feedback transaction
/// so the aggregate never drifts from the bookings it summarizes.
pub async fn recompute_mentor_rating(
    tx: &mut Transaction<'_, Postgres>,
    mentor_id: Uuid,
) -> Result<(Decimal, i32), AppError> {
    let ratings: Vec<i16> = sqlx::query_scalar(
        "SELECT mentee_rating FROM bookings WHERE mentor_id = $1 AND mentee_rating IS NOT NULL",
    )
    .bind(mentor_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    let (average, total) = aggregate_ratings(&ratings);

    sqlx::query(
        r#"
        UPDATE mentor_profiles
        SET average_rating = $1, total_ratings = $2, updated_at = NOW()
        WHERE user_id = $3
        "#,
    )
    .bind(average)
    .bind(total)
    .bind(mentor_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok((average, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn empty_ratings_yield_zero_aggregate() {
        assert_eq!(aggregate_ratings(&[]), (Decimal::ZERO, 0));
    }

    #[test]
    fn mean_matches_submitted_ratings() {
        let (average, total) = aggregate_ratings(&[5, 4, 3]);
        assert_eq!(average, dec("4.00"));
        assert_eq!(total, 3);
    }

    #[test]
    fn mean_rounds_to_two_places() {
        let (average, total) = aggregate_ratings(&[5, 4, 4]);
        assert_eq!(average, dec("4.33"));
        assert_eq!(total, 3);
    }

    #[test]
    fn single_rating_is_its_own_mean() {
        let (average, total) = aggregate_ratings(&[2]);
        assert_eq!(average, dec("2"));
        assert_eq!(total, 1);
    }
}
