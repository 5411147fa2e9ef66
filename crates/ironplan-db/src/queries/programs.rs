//! Database query functions for the `programs`, `program_workouts`, and
//! `program_exercises` tables.
//!
//! Functions that participate in engine transactions take any
//! [`PgExecutor`], so they accept both `&PgPool` and `&mut *tx`.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Program, ProgramExercise, ProgramWorkout, ProgressionStrategy};

/// Parameters for inserting a program header.
#[derive(Debug, Clone)]
pub struct NewProgram<'a> {
    pub creator_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub duration_weeks: i32,
    pub is_public: bool,
}

/// Parameters for inserting a scheduled workout.
#[derive(Debug, Clone)]
pub struct NewWorkout<'a> {
    pub program_id: Uuid,
    pub name: &'a str,
    pub week_number: i32,
    pub day_number: i32,
    pub sort_order: i32,
}

/// Parameters for inserting an exercise prescription.
#[derive(Debug, Clone)]
pub struct NewExercise<'a> {
    pub workout_id: Uuid,
    pub exercise_name: &'a str,
    pub sets: i32,
    pub initial_reps: i32,
    pub target_reps: i32,
    pub initial_weight: Option<f64>,
    pub progression_strategy: &'a ProgressionStrategy,
    pub progression_value: f64,
    pub progression_frequency: i32,
    pub is_barbell: bool,
    pub sort_order: i32,
    pub notes: Option<&'a str>,
    pub category: Option<&'a str>,
}

/// Insert a program header. Returns the row with server-generated defaults
/// (id, created_at).
pub async fn insert_program<'e, E>(executor: E, new: &NewProgram<'_>) -> Result<Program>
where
    E: PgExecutor<'e>,
{
    let program = sqlx::query_as::<_, Program>(
        "INSERT INTO programs (creator_id, name, description, duration_weeks, is_public) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.creator_id)
    .bind(new.name)
    .bind(new.description)
    .bind(new.duration_weeks)
    .bind(new.is_public)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert program {:?}", new.name))?;

    Ok(program)
}

/// Insert a scheduled workout.
///
/// Rejected by the UNIQUE constraint if the program already has a workout at
/// the same (week, day).
pub async fn insert_workout<'e, E>(executor: E, new: &NewWorkout<'_>) -> Result<ProgramWorkout>
where
    E: PgExecutor<'e>,
{
    let workout = sqlx::query_as::<_, ProgramWorkout>(
        "INSERT INTO program_workouts (program_id, name, week_number, day_number, sort_order) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.program_id)
    .bind(new.name)
    .bind(new.week_number)
    .bind(new.day_number)
    .bind(new.sort_order)
    .fetch_one(executor)
    .await
    .with_context(|| {
        format!(
            "failed to insert workout {:?} (week {}, day {})",
            new.name, new.week_number, new.day_number
        )
    })?;

    Ok(workout)
}

/// Insert an exercise prescription into a workout.
pub async fn insert_exercise<'e, E>(executor: E, new: &NewExercise<'_>) -> Result<ProgramExercise>
where
    E: PgExecutor<'e>,
{
    let exercise = sqlx::query_as::<_, ProgramExercise>(
        "INSERT INTO program_exercises (workout_id, exercise_name, sets, initial_reps, \
         target_reps, initial_weight, progression_strategy, progression_value, \
         progression_frequency, is_barbell, sort_order, notes, category) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING *",
    )
    .bind(new.workout_id)
    .bind(new.exercise_name)
    .bind(new.sets)
    .bind(new.initial_reps)
    .bind(new.target_reps)
    .bind(new.initial_weight)
    .bind(new.progression_strategy.as_str())
    .bind(new.progression_value)
    .bind(new.progression_frequency)
    .bind(new.is_barbell)
    .bind(new.sort_order)
    .bind(new.notes)
    .bind(new.category)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert exercise {:?}", new.exercise_name))?;

    Ok(exercise)
}

/// Fetch a program by its ID.
pub async fn get_program<'e, E>(executor: E, id: Uuid) -> Result<Option<Program>>
where
    E: PgExecutor<'e>,
{
    let program = sqlx::query_as::<_, Program>("SELECT * FROM programs WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch program")?;

    Ok(program)
}

/// List the programs a user can see (public ones and their own), newest first.
pub async fn list_visible_programs<'e, E>(executor: E, viewer_id: Uuid) -> Result<Vec<Program>>
where
    E: PgExecutor<'e>,
{
    let programs = sqlx::query_as::<_, Program>(
        "SELECT * FROM programs \
         WHERE is_public OR creator_id = $1 \
         ORDER BY created_at DESC",
    )
    .bind(viewer_id)
    .fetch_all(executor)
    .await
    .context("failed to list programs")?;

    Ok(programs)
}

/// List every scheduled workout of a program in calendar order.
pub async fn list_workouts_for_program<'e, E>(
    executor: E,
    program_id: Uuid,
) -> Result<Vec<ProgramWorkout>>
where
    E: PgExecutor<'e>,
{
    let workouts = sqlx::query_as::<_, ProgramWorkout>(
        "SELECT * FROM program_workouts \
         WHERE program_id = $1 \
         ORDER BY week_number, day_number, sort_order",
    )
    .bind(program_id)
    .fetch_all(executor)
    .await
    .context("failed to list program workouts")?;

    Ok(workouts)
}

/// Find the workout scheduled at an exact (week, day) coordinate.
pub async fn find_workout_at<'e, E>(
    executor: E,
    program_id: Uuid,
    week_number: i32,
    day_number: i32,
) -> Result<Option<ProgramWorkout>>
where
    E: PgExecutor<'e>,
{
    let workout = sqlx::query_as::<_, ProgramWorkout>(
        "SELECT * FROM program_workouts \
         WHERE program_id = $1 AND week_number = $2 AND day_number = $3",
    )
    .bind(program_id)
    .bind(week_number)
    .bind(day_number)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to look up workout at week {week_number}, day {day_number}"))?;

    Ok(workout)
}

/// Highest `day_number` scheduled within one week of a program, or `None`
/// when the week has no workouts.
pub async fn max_day_in_week<'e, E>(
    executor: E,
    program_id: Uuid,
    week_number: i32,
) -> Result<Option<i32>>
where
    E: PgExecutor<'e>,
{
    let max_day: Option<i32> = sqlx::query_scalar(
        "SELECT MAX(day_number) FROM program_workouts \
         WHERE program_id = $1 AND week_number = $2",
    )
    .bind(program_id)
    .bind(week_number)
    .fetch_one(executor)
    .await
    .context("failed to find last scheduled day of week")?;

    Ok(max_day)
}

/// List the exercises of a workout in prescription order.
pub async fn list_exercises_for_workout<'e, E>(
    executor: E,
    workout_id: Uuid,
) -> Result<Vec<ProgramExercise>>
where
    E: PgExecutor<'e>,
{
    let exercises = sqlx::query_as::<_, ProgramExercise>(
        "SELECT * FROM program_exercises \
         WHERE workout_id = $1 \
         ORDER BY sort_order, id",
    )
    .bind(workout_id)
    .fetch_all(executor)
    .await
    .context("failed to list workout exercises")?;

    Ok(exercises)
}

/// Fetch a single exercise prescription by ID.
pub async fn get_exercise<'e, E>(executor: E, id: Uuid) -> Result<Option<ProgramExercise>>
where
    E: PgExecutor<'e>,
{
    let exercise =
        sqlx::query_as::<_, ProgramExercise>("SELECT * FROM program_exercises WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("failed to fetch program exercise")?;

    Ok(exercise)
}
