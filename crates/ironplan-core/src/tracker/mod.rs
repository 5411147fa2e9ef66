//! Program progress tracking.
//!
//! A [`UserProgram`] moves `NotStarted -> Active -> Completed`, or
//! `Active -> Stopped` when the user gives up on it. Its week/day pointer is
//! only written here, and every write happens with the row locked
//! (`SELECT ... FOR UPDATE`) inside the caller's transaction.

mod position;

pub use position::{NextPosition, next_position};

use anyhow::Context;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use ironplan_db::models::{
    CompletedSet, ExerciseProgress, ProgramExercise, ProgramState, ProgramWorkout, UserProgram,
    WorkoutSession,
};
use ironplan_db::queries::exercise_progress::{self, ExerciseProgressWithName};
use ironplan_db::queries::{completed_sets, programs, sessions, user_programs};

use crate::error::EngineError;

/// Which prescription field seeds `current_reps_target` for a new
/// [`ExerciseProgress`].
///
/// Rows created when a workout becomes current (start, advance) use
/// `initial_reps`. Rows created on demand while planning use `target_reps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSeed {
    InitialReps,
    TargetReps,
}

impl ProgressSeed {
    pub fn reps_for(self, exercise: &ProgramExercise) -> i32 {
        match self {
            Self::InitialReps => exercise.initial_reps,
            Self::TargetReps => exercise.target_reps,
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Start `program_id` for `user_id` at week 1, day 1.
///
/// Progress rows for the week 1/day 1 workout are created eagerly in the
/// same transaction. Returns [`EngineError::Conflict`] if the user already
/// has an active run of this program.
pub async fn start_program(
    pool: &PgPool,
    user_id: Uuid,
    program_id: Uuid,
) -> Result<UserProgram, EngineError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let program = programs::get_program(&mut *tx, program_id).await?;
    match program {
        Some(program) if program.is_visible_to(user_id) => {}
        _ => return Err(EngineError::not_found(format!("program {program_id}"))),
    }

    let user_program = user_programs::insert_active_user_program(&mut *tx, user_id, program_id)
        .await?
        .ok_or_else(|| {
            EngineError::Conflict(format!(
                "program {program_id} is already active for this user"
            ))
        })?;

    let initialized = init_workout_progress(&mut tx, &user_program, ProgressSeed::InitialReps).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        user_program_id = %user_program.id,
        %user_id,
        %program_id,
        initialized,
        "program started"
    );
    Ok(user_program)
}

/// Deactivate an active run without completing it, so it can be started
/// again later. History is kept.
pub async fn stop_program(
    pool: &PgPool,
    user_id: Uuid,
    user_program_id: Uuid,
) -> Result<UserProgram, EngineError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    lock_owned(&mut tx, user_id, user_program_id).await?;
    let stopped = user_programs::deactivate(&mut *tx, user_program_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("active user program {user_program_id}")))?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(user_program_id = %stopped.id, %user_id, "program stopped");
    Ok(stopped)
}

/// Move the pointer past the current workout.
///
/// Completes the run after the final week. Otherwise moves to the next
/// (week, day) and eagerly creates progress rows for the workout scheduled
/// there, if any. Each call moves the pointer exactly once; the caller must
/// hold the row lock.
pub async fn advance(
    conn: &mut PgConnection,
    user_program: &UserProgram,
) -> Result<UserProgram, EngineError> {
    let program = programs::get_program(&mut *conn, user_program.program_id)
        .await?
        .with_context(|| format!("program {} missing for user program", user_program.program_id))?;

    let max_day =
        programs::max_day_in_week(&mut *conn, program.id, user_program.current_week).await?;

    match next_position(
        user_program.current_week,
        user_program.current_day,
        max_day,
        program.duration_weeks,
    ) {
        NextPosition::Finished => {
            let completed = user_programs::mark_completed(&mut *conn, user_program.id).await?;
            info!(
                user_program_id = %completed.id,
                program_id = %program.id,
                "program completed"
            );
            Ok(completed)
        }
        NextPosition::Advance { week, day } => {
            let moved = user_programs::update_position(&mut *conn, user_program.id, week, day).await?;
            let initialized = init_workout_progress(conn, &moved, ProgressSeed::InitialReps).await?;
            info!(
                user_program_id = %moved.id,
                from_week = user_program.current_week,
                from_day = user_program.current_day,
                week,
                day,
                initialized,
                "advanced"
            );
            Ok(moved)
        }
    }
}

// ---------------------------------------------------------------------------
// Row access
// ---------------------------------------------------------------------------

/// Lock a user program owned by `user_id` for the rest of the transaction.
///
/// Programs that do not exist and programs of other users are both
/// reported as [`EngineError::NotFound`].
pub async fn lock_owned(
    conn: &mut PgConnection,
    user_id: Uuid,
    user_program_id: Uuid,
) -> Result<UserProgram, EngineError> {
    match user_programs::lock_user_program(&mut *conn, user_program_id).await? {
        Some(user_program) if user_program.user_id == user_id => Ok(user_program),
        _ => Err(EngineError::not_found(format!(
            "user program {user_program_id}"
        ))),
    }
}

/// The workout scheduled at the run's current position.
pub async fn todays_workout(
    conn: &mut PgConnection,
    user_program: &UserProgram,
) -> Result<ProgramWorkout, EngineError> {
    if !user_program.is_active {
        return Err(EngineError::not_found(format!(
            "user program {} is not active",
            user_program.id
        )));
    }

    programs::find_workout_at(
        &mut *conn,
        user_program.program_id,
        user_program.current_week,
        user_program.current_day,
    )
    .await?
    .ok_or_else(|| {
        EngineError::not_found(format!(
            "no workout scheduled at week {}, day {}",
            user_program.current_week, user_program.current_day
        ))
    })
}

/// Fetch the progress row for `exercise`, creating it from the
/// prescription if this run has never seen the exercise.
pub async fn get_or_init_progress(
    conn: &mut PgConnection,
    user_program_id: Uuid,
    exercise: &ProgramExercise,
    seed: ProgressSeed,
) -> Result<ExerciseProgress, EngineError> {
    let created = exercise_progress::insert_if_absent(
        &mut *conn,
        user_program_id,
        exercise.id,
        exercise.initial_weight,
        seed.reps_for(exercise),
    )
    .await?;
    if created {
        debug!(
            %user_program_id,
            exercise = %exercise.exercise_name,
            ?seed,
            "initialized exercise progress"
        );
    }

    let progress = exercise_progress::find_for_exercise(&mut *conn, user_program_id, exercise.id)
        .await?
        .with_context(|| {
            format!(
                "exercise progress for {} missing after insert",
                exercise.exercise_name
            )
        })?;
    Ok(progress)
}

/// Create progress rows for every exercise of the workout at the run's
/// current position. Returns how many exercises were visited; zero when
/// nothing is scheduled there.
async fn init_workout_progress(
    conn: &mut PgConnection,
    user_program: &UserProgram,
    seed: ProgressSeed,
) -> Result<usize, EngineError> {
    let Some(workout) = programs::find_workout_at(
        &mut *conn,
        user_program.program_id,
        user_program.current_week,
        user_program.current_day,
    )
    .await?
    else {
        return Ok(0);
    };

    let exercises = programs::list_exercises_for_workout(&mut *conn, workout.id).await?;
    for exercise in &exercises {
        get_or_init_progress(conn, user_program.id, exercise, seed).await?;
    }
    Ok(exercises.len())
}

// ---------------------------------------------------------------------------
// Read-only views
// ---------------------------------------------------------------------------

/// A run together with every progress row it has accumulated.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressDetail {
    pub user_program: UserProgram,
    pub state: ProgramState,
    pub exercises: Vec<ExerciseProgressWithName>,
}

/// The user's active runs, oldest first.
pub async fn list_active_programs(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<UserProgram>, EngineError> {
    Ok(user_programs::list_active_for_user(pool, user_id).await?)
}

/// A run owned by `user_id` and its per-exercise progress.
pub async fn progress_detail(
    pool: &PgPool,
    user_id: Uuid,
    user_program_id: Uuid,
) -> Result<ProgressDetail, EngineError> {
    let user_program = match user_programs::get_user_program(pool, user_program_id).await? {
        Some(up) if up.user_id == user_id => up,
        _ => {
            return Err(EngineError::not_found(format!(
                "user program {user_program_id}"
            )));
        }
    };
    let exercises = exercise_progress::list_for_user_program(pool, user_program.id).await?;

    Ok(ProgressDetail {
        state: user_program.state(),
        user_program,
        exercises,
    })
}

/// One recorded workout and the sets logged in it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub sets: Vec<CompletedSet>,
}

/// Workouts recorded for a run owned by `user_id`, newest first.
pub async fn session_history(
    pool: &PgPool,
    user_id: Uuid,
    user_program_id: Uuid,
) -> Result<Vec<SessionRecord>, EngineError> {
    match user_programs::get_user_program(pool, user_program_id).await? {
        Some(up) if up.user_id == user_id => {}
        _ => {
            return Err(EngineError::not_found(format!(
                "user program {user_program_id}"
            )));
        }
    }

    let mut records = Vec::new();
    for session in sessions::list_for_user_program(pool, user_program_id).await? {
        let sets = completed_sets::list_for_session(pool, session.id).await?;
        records.push(SessionRecord { session, sets });
    }
    Ok(records)
}

/// Sets recorded against one progress row, oldest first.
pub async fn exercise_history(
    pool: &PgPool,
    user_id: Uuid,
    exercise_progress_id: Uuid,
) -> Result<Vec<CompletedSet>, EngineError> {
    let not_found = || EngineError::not_found(format!("exercise progress {exercise_progress_id}"));

    let progress = exercise_progress::get_exercise_progress(pool, exercise_progress_id)
        .await?
        .ok_or_else(not_found)?;
    let owner = user_programs::get_user_program(pool, progress.user_program_id).await?;
    if owner.is_none_or(|up| up.user_id != user_id) {
        return Err(not_found());
    }

    Ok(completed_sets::list_for_progress(pool, progress.id).await?)
}
