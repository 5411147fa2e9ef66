//! Program service layer.
//!
//! Inserts a validated [`ProgramFile`] (program row, workouts, exercises) in
//! a single transaction and reads programs back with the "public or own"
//! visibility rule.

use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use ironplan_db::models::{Program, ProgramExercise, ProgramWorkout};
use ironplan_db::queries::programs::{self, NewExercise, NewProgram, NewWorkout};

use super::barbell::detect_barbell;
use super::format::ProgramFile;
use super::parser;
use crate::error::EngineError;

/// A program with its full schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramWithWorkouts {
    pub program: Program,
    pub workouts: Vec<WorkoutWithExercises>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutWithExercises {
    pub workout: ProgramWorkout,
    pub exercises: Vec<ProgramExercise>,
}

/// Create a program owned by `creator_id` from a program file.
///
/// The file is validated again here so callers that build a
/// [`ProgramFile`] by hand get the same guarantees as parsed files. Workouts
/// and exercises keep their file order. Exercises without an explicit
/// `is_barbell` flag get one from [`detect_barbell`].
pub async fn create_program(
    pool: &PgPool,
    creator_id: Uuid,
    file: &ProgramFile,
) -> Result<Program, EngineError> {
    parser::validate(file)?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let program = programs::insert_program(
        &mut *tx,
        &NewProgram {
            creator_id,
            name: &file.program.name,
            description: &file.program.description,
            duration_weeks: file.program.duration_weeks,
            is_public: file.program.is_public,
        },
    )
    .await?;

    let mut exercise_count = 0usize;
    for (workout_idx, entry) in file.workouts.iter().enumerate() {
        let workout = programs::insert_workout(
            &mut *tx,
            &NewWorkout {
                program_id: program.id,
                name: &entry.name,
                week_number: entry.week_number,
                day_number: entry.day_number,
                sort_order: position(workout_idx)?,
            },
        )
        .await?;

        for (exercise_idx, exercise) in entry.exercises.iter().enumerate() {
            let is_barbell = exercise
                .is_barbell
                .unwrap_or_else(|| detect_barbell(&exercise.exercise_name));
            programs::insert_exercise(
                &mut *tx,
                &NewExercise {
                    workout_id: workout.id,
                    exercise_name: &exercise.exercise_name,
                    sets: exercise.sets,
                    initial_reps: exercise.initial_reps,
                    target_reps: exercise.target_reps,
                    initial_weight: exercise.initial_weight,
                    progression_strategy: &exercise.progression_strategy,
                    progression_value: exercise.progression_value,
                    progression_frequency: exercise.progression_frequency,
                    is_barbell,
                    sort_order: position(exercise_idx)?,
                    notes: exercise.notes.as_deref(),
                    category: exercise.category.as_deref(),
                },
            )
            .await?;
            exercise_count += 1;
        }
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        program_id = %program.id,
        %creator_id,
        workouts = file.workouts.len(),
        exercises = exercise_count,
        "program created"
    );
    Ok(program)
}

fn position(idx: usize) -> Result<i32, EngineError> {
    i32::try_from(idx).map_err(|_| EngineError::validation("program file has too many entries"))
}

/// Fetch a program and its schedule if `viewer_id` may see it.
pub async fn get_program_with_workouts(
    pool: &PgPool,
    viewer_id: Uuid,
    program_id: Uuid,
) -> Result<ProgramWithWorkouts, EngineError> {
    let program = match programs::get_program(pool, program_id).await? {
        Some(program) if program.is_visible_to(viewer_id) => program,
        _ => return Err(EngineError::not_found(format!("program {program_id}"))),
    };

    let mut workouts = Vec::new();
    for workout in programs::list_workouts_for_program(pool, program.id).await? {
        let exercises = programs::list_exercises_for_workout(pool, workout.id).await?;
        workouts.push(WorkoutWithExercises { workout, exercises });
    }

    Ok(ProgramWithWorkouts { program, workouts })
}

/// Programs `viewer_id` can see: public ones and their own.
pub async fn list_programs(pool: &PgPool, viewer_id: Uuid) -> Result<Vec<Program>, EngineError> {
    Ok(programs::list_visible_programs(pool, viewer_id).await?)
}
