//! Database query functions for the `completed_sets` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::CompletedSet;

/// Parameters for recording one performed set.
#[derive(Debug, Clone)]
pub struct NewCompletedSet<'a> {
    pub exercise_progress_id: Uuid,
    pub workout_session_id: Uuid,
    pub set_number: i32,
    pub reps_completed: i32,
    pub weight_used: Option<f64>,
    pub notes: Option<&'a str>,
}

/// Append a completed set.
pub async fn insert_completed_set<'e, E>(
    executor: E,
    new: &NewCompletedSet<'_>,
) -> Result<CompletedSet>
where
    E: PgExecutor<'e>,
{
    let set = sqlx::query_as::<_, CompletedSet>(
        "INSERT INTO completed_sets \
         (exercise_progress_id, workout_session_id, set_number, reps_completed, weight_used, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.exercise_progress_id)
    .bind(new.workout_session_id)
    .bind(new.set_number)
    .bind(new.reps_completed)
    .bind(new.weight_used)
    .bind(new.notes)
    .fetch_one(executor)
    .await
    .context("failed to insert completed set")?;

    Ok(set)
}

/// Count the sets already recorded against an exercise progress row.
pub async fn count_for_progress<'e, E>(executor: E, exercise_progress_id: Uuid) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM completed_sets WHERE exercise_progress_id = $1")
            .bind(exercise_progress_id)
            .fetch_one(executor)
            .await
            .context("failed to count completed sets")?;

    Ok(row.0)
}

/// List the sets recorded against an exercise progress row, oldest first.
pub async fn list_for_progress<'e, E>(
    executor: E,
    exercise_progress_id: Uuid,
) -> Result<Vec<CompletedSet>>
where
    E: PgExecutor<'e>,
{
    let sets = sqlx::query_as::<_, CompletedSet>(
        "SELECT * FROM completed_sets \
         WHERE exercise_progress_id = $1 \
         ORDER BY completed_at ASC, set_number ASC",
    )
    .bind(exercise_progress_id)
    .fetch_all(executor)
    .await
    .context("failed to list completed sets")?;

    Ok(sets)
}

/// List the sets recorded in one workout session, in set order.
pub async fn list_for_session<'e, E>(
    executor: E,
    workout_session_id: Uuid,
) -> Result<Vec<CompletedSet>>
where
    E: PgExecutor<'e>,
{
    let sets = sqlx::query_as::<_, CompletedSet>(
        "SELECT * FROM completed_sets \
         WHERE workout_session_id = $1 \
         ORDER BY exercise_progress_id, set_number",
    )
    .bind(workout_session_id)
    .fetch_all(executor)
    .await
    .context("failed to list session sets")?;

    Ok(sets)
}
