//! Database query functions for the `workout_sessions` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::WorkoutSession;

/// Record a performed workout.
pub async fn insert_session<'e, E>(
    executor: E,
    user_id: Uuid,
    user_program_id: Option<Uuid>,
    notes: Option<&str>,
) -> Result<WorkoutSession>
where
    E: PgExecutor<'e>,
{
    let session = sqlx::query_as::<_, WorkoutSession>(
        "INSERT INTO workout_sessions (user_id, user_program_id, notes) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(user_program_id)
    .bind(notes)
    .fetch_one(executor)
    .await
    .context("failed to insert workout session")?;

    Ok(session)
}

/// List the sessions recorded for a program run, newest first.
pub async fn list_for_user_program<'e, E>(
    executor: E,
    user_program_id: Uuid,
) -> Result<Vec<WorkoutSession>>
where
    E: PgExecutor<'e>,
{
    let sessions = sqlx::query_as::<_, WorkoutSession>(
        "SELECT * FROM workout_sessions \
         WHERE user_program_id = $1 \
         ORDER BY performed_at DESC",
    )
    .bind(user_program_id)
    .fetch_all(executor)
    .await
    .context("failed to list workout sessions")?;

    Ok(sessions)
}
