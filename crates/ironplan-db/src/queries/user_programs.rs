//! Database query functions for the `user_programs` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::UserProgram;

/// Insert an active run of a program at week 1, day 1.
///
/// The check for an existing active run and the insert are one statement:
/// the partial unique index on `(user_id, program_id) WHERE is_active` makes
/// the insert a no-op when another active run exists, in which case `None`
/// is returned.
pub async fn insert_active_user_program<'e, E>(
    executor: E,
    user_id: Uuid,
    program_id: Uuid,
) -> Result<Option<UserProgram>>
where
    E: PgExecutor<'e>,
{
    let user_program = sqlx::query_as::<_, UserProgram>(
        "INSERT INTO user_programs (user_id, program_id, current_week, current_day, is_active) \
         VALUES ($1, $2, 1, 1, TRUE) \
         ON CONFLICT (user_id, program_id) WHERE is_active DO NOTHING \
         RETURNING *",
    )
    .bind(user_id)
    .bind(program_id)
    .fetch_optional(executor)
    .await
    .context("failed to insert user program")?;

    Ok(user_program)
}

/// Fetch a user program by ID.
pub async fn get_user_program<'e, E>(executor: E, id: Uuid) -> Result<Option<UserProgram>>
where
    E: PgExecutor<'e>,
{
    let user_program = sqlx::query_as::<_, UserProgram>("SELECT * FROM user_programs WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch user program")?;

    Ok(user_program)
}

/// Fetch a user program and hold a row lock on it until the surrounding
/// transaction ends.
///
/// Every mutating engine operation goes through this so that two requests
/// against the same run are serialized.
pub async fn lock_user_program<'e, E>(executor: E, id: Uuid) -> Result<Option<UserProgram>>
where
    E: PgExecutor<'e>,
{
    let user_program =
        sqlx::query_as::<_, UserProgram>("SELECT * FROM user_programs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("failed to lock user program")?;

    Ok(user_program)
}

/// List a user's active program runs, oldest first.
pub async fn list_active_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<UserProgram>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, UserProgram>(
        "SELECT * FROM user_programs \
         WHERE user_id = $1 AND is_active \
         ORDER BY started_at ASC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .context("failed to list active user programs")?;

    Ok(rows)
}

/// Move the week/day pointer of an active run.
pub async fn update_position<'e, E>(
    executor: E,
    id: Uuid,
    current_week: i32,
    current_day: i32,
) -> Result<UserProgram>
where
    E: PgExecutor<'e>,
{
    let user_program = sqlx::query_as::<_, UserProgram>(
        "UPDATE user_programs \
         SET current_week = $1, current_day = $2 \
         WHERE id = $3 AND is_active \
         RETURNING *",
    )
    .bind(current_week)
    .bind(current_day)
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("failed to update user program position")?;

    user_program.with_context(|| format!("active user program {id} not found"))
}

/// Deactivate a run after its final week, stamping `completed_at`.
pub async fn mark_completed<'e, E>(executor: E, id: Uuid) -> Result<UserProgram>
where
    E: PgExecutor<'e>,
{
    let user_program = sqlx::query_as::<_, UserProgram>(
        "UPDATE user_programs \
         SET is_active = FALSE, completed_at = now() \
         WHERE id = $1 AND is_active \
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("failed to complete user program")?;

    user_program.with_context(|| format!("active user program {id} not found"))
}

/// Deactivate a run without completing it.
///
/// Returns `None` if the run does not exist or is already inactive.
pub async fn deactivate<'e, E>(executor: E, id: Uuid) -> Result<Option<UserProgram>>
where
    E: PgExecutor<'e>,
{
    let user_program = sqlx::query_as::<_, UserProgram>(
        "UPDATE user_programs \
         SET is_active = FALSE \
         WHERE id = $1 AND is_active \
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("failed to deactivate user program")?;

    Ok(user_program)
}
