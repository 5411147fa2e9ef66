//! Database query functions for the `exercise_progress` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::ExerciseProgress;

/// Insert a progress row for an exercise unless one already exists for the
/// same `(user_program_id, program_exercise_id)` pair.
///
/// Returns `true` when a new row was created.
pub async fn insert_if_absent<'e, E>(
    executor: E,
    user_program_id: Uuid,
    program_exercise_id: Uuid,
    current_weight: Option<f64>,
    current_reps_target: i32,
) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO exercise_progress \
         (user_program_id, program_exercise_id, current_weight, current_reps_target) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_program_id, program_exercise_id) DO NOTHING",
    )
    .bind(user_program_id)
    .bind(program_exercise_id)
    .bind(current_weight)
    .bind(current_reps_target)
    .execute(executor)
    .await
    .context("failed to insert exercise progress")?;

    Ok(result.rows_affected() == 1)
}

/// Fetch the progress row for one exercise of a run.
pub async fn find_for_exercise<'e, E>(
    executor: E,
    user_program_id: Uuid,
    program_exercise_id: Uuid,
) -> Result<Option<ExerciseProgress>>
where
    E: PgExecutor<'e>,
{
    let progress = sqlx::query_as::<_, ExerciseProgress>(
        "SELECT * FROM exercise_progress \
         WHERE user_program_id = $1 AND program_exercise_id = $2",
    )
    .bind(user_program_id)
    .bind(program_exercise_id)
    .fetch_optional(executor)
    .await
    .context("failed to fetch exercise progress")?;

    Ok(progress)
}

/// Fetch a progress row by ID.
pub async fn get_exercise_progress<'e, E>(executor: E, id: Uuid) -> Result<Option<ExerciseProgress>>
where
    E: PgExecutor<'e>,
{
    let progress =
        sqlx::query_as::<_, ExerciseProgress>("SELECT * FROM exercise_progress WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("failed to fetch exercise progress")?;

    Ok(progress)
}

/// Apply a progression result: set the working weight and stamp the update.
pub async fn apply_progression<'e, E>(
    executor: E,
    id: Uuid,
    current_weight: Option<f64>,
    last_update: DateTime<Utc>,
) -> Result<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE exercise_progress \
         SET current_weight = $1, last_update = $2 \
         WHERE id = $3",
    )
    .bind(current_weight)
    .bind(last_update)
    .bind(id)
    .execute(executor)
    .await
    .context("failed to update exercise progress")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("exercise progress {id} not found");
    }

    Ok(())
}

/// An exercise progress row joined with the exercise it tracks.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExerciseProgressWithName {
    pub id: Uuid,
    pub user_program_id: Uuid,
    pub program_exercise_id: Uuid,
    pub current_weight: Option<f64>,
    pub current_reps_target: i32,
    pub last_update: DateTime<Utc>,
    pub exercise_name: String,
    pub is_barbell: bool,
}

/// List every progress row of a run with exercise names, alphabetically.
pub async fn list_for_user_program<'e, E>(
    executor: E,
    user_program_id: Uuid,
) -> Result<Vec<ExerciseProgressWithName>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ExerciseProgressWithName>(
        "SELECT ep.id, ep.user_program_id, ep.program_exercise_id, ep.current_weight, \
                ep.current_reps_target, ep.last_update, \
                pe.exercise_name, pe.is_barbell \
         FROM exercise_progress ep \
         JOIN program_exercises pe ON pe.id = ep.program_exercise_id \
         WHERE ep.user_program_id = $1 \
         ORDER BY pe.exercise_name, ep.last_update",
    )
    .bind(user_program_id)
    .fetch_all(executor)
    .await
    .context("failed to list exercise progress")?;

    Ok(rows)
}
