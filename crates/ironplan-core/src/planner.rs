//! Workout execution: what to lift today, and recording what was lifted.

use std::collections::HashMap;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use ironplan_db::models::{ProgramExercise, UserProgram};
use ironplan_db::queries::completed_sets::{self, NewCompletedSet};
use ironplan_db::queries::{exercise_progress, programs, sessions};

use crate::error::EngineError;
use crate::plates::{self, PlateResult};
use crate::progression::{self, SetOutcome};
use crate::tracker::{self, ProgressSeed};

/// One set the lifter should perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSet {
    pub exercise_progress_id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub set_number: i32,
    pub target_reps: i32,
    /// Working weight, or 0 for exercises without one.
    pub target_weight: f64,
    pub is_barbell: bool,
    pub plate_calculation: Option<PlateResult>,
}

/// Today's workout for one user program, set by set.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    pub user_program_id: Uuid,
    pub program_id: Uuid,
    pub program_name: String,
    pub workout_id: Uuid,
    pub workout_name: String,
    pub week: i32,
    pub day: i32,
    /// Exercises in prescription order, sets ascending within each.
    pub sets: Vec<PlannedSet>,
}

/// A set reported by the lifter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSetInput {
    pub exercise_progress_id: Uuid,
    pub set_number: i32,
    pub reps_completed: i32,
    #[serde(default)]
    pub weight_used: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Build today's plan for a user program.
///
/// Progress rows for exercises this run has not seen yet are created on
/// the way (seeded from `target_reps`) and persist after the call.
pub async fn plan_today(
    pool: &PgPool,
    user_id: Uuid,
    user_program_id: Uuid,
) -> Result<ExecutionPlan, EngineError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let user_program = tracker::lock_owned(&mut tx, user_id, user_program_id).await?;
    let workout = tracker::todays_workout(&mut tx, &user_program).await?;
    let program = programs::get_program(&mut *tx, user_program.program_id)
        .await?
        .with_context(|| format!("program {} missing for user program", user_program.program_id))?;
    let exercises = programs::list_exercises_for_workout(&mut *tx, workout.id).await?;

    let mut sets = Vec::new();
    for exercise in &exercises {
        let progress =
            tracker::get_or_init_progress(&mut tx, user_program.id, exercise, ProgressSeed::TargetReps)
                .await?;
        let plate_calculation = plate_calculation(exercise, progress.current_weight);
        for set_number in 1..=exercise.sets {
            sets.push(PlannedSet {
                exercise_progress_id: progress.id,
                exercise_id: exercise.id,
                exercise_name: exercise.exercise_name.clone(),
                set_number,
                target_reps: progress.current_reps_target,
                target_weight: progress.current_weight.unwrap_or(0.0),
                is_barbell: exercise.is_barbell,
                plate_calculation: plate_calculation.clone(),
            });
        }
    }

    tx.commit().await.context("failed to commit transaction")?;

    Ok(ExecutionPlan {
        user_program_id: user_program.id,
        program_id: program.id,
        program_name: program.name,
        workout_id: workout.id,
        workout_name: workout.name,
        week: user_program.current_week,
        day: user_program.current_day,
        sets,
    })
}

fn plate_calculation(exercise: &ProgramExercise, weight: Option<f64>) -> Option<PlateResult> {
    match weight {
        Some(weight) if exercise.is_barbell && weight != 0.0 => Some(plates::resolve(weight)),
        _ => None,
    }
}

/// Reject malformed submissions before anything is written.
pub fn validate_sets(sets: &[CompletedSetInput]) -> Result<(), EngineError> {
    for set in sets {
        if set.set_number < 1 {
            return Err(EngineError::validation(format!(
                "set_number must be at least 1, got {}",
                set.set_number
            )));
        }
        if set.reps_completed < 0 {
            return Err(EngineError::validation(format!(
                "reps_completed must not be negative, got {}",
                set.reps_completed
            )));
        }
        match set.weight_used {
            Some(weight) if !(weight.is_finite() && weight >= 0.0) => {
                return Err(EngineError::validation(format!(
                    "weight_used must be a non-negative number, got {weight}"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Record today's workout and move the run forward.
///
/// Everything happens in one transaction: the session record, each
/// completed set with its progression, and the single pointer advance.
/// Sets that reference progress rows of another run are skipped.
pub async fn complete_workout(
    pool: &PgPool,
    user_id: Uuid,
    user_program_id: Uuid,
    sets: &[CompletedSetInput],
) -> Result<UserProgram, EngineError> {
    validate_sets(sets)?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let user_program = tracker::lock_owned(&mut tx, user_id, user_program_id).await?;
    tracker::todays_workout(&mut tx, &user_program).await?;
    let program = programs::get_program(&mut *tx, user_program.program_id)
        .await?
        .with_context(|| format!("program {} missing for user program", user_program.program_id))?;

    let notes = format!(
        "Program: {} - Week {}, Day {}",
        program.name, user_program.current_week, user_program.current_day
    );
    let session =
        sessions::insert_session(&mut *tx, user_id, Some(user_program.id), Some(&notes)).await?;

    let mut exercises: HashMap<Uuid, ProgramExercise> = HashMap::new();
    let mut recorded = 0usize;
    let mut progressed = 0usize;
    for set in sets {
        let progress = exercise_progress::get_exercise_progress(&mut *tx, set.exercise_progress_id)
            .await?;
        let Some(mut progress) = progress.filter(|p| p.user_program_id == user_program.id) else {
            debug!(
                %user_program_id,
                exercise_progress_id = %set.exercise_progress_id,
                "skipping set for progress outside this user program"
            );
            continue;
        };

        if !exercises.contains_key(&progress.program_exercise_id) {
            let exercise = programs::get_exercise(&mut *tx, progress.program_exercise_id)
                .await?
                .with_context(|| {
                    format!("program exercise {} missing", progress.program_exercise_id)
                })?;
            exercises.insert(exercise.id, exercise);
        }
        let exercise = &exercises[&progress.program_exercise_id];

        let prior = completed_sets::count_for_progress(&mut *tx, progress.id).await?;
        completed_sets::insert_completed_set(
            &mut *tx,
            &NewCompletedSet {
                exercise_progress_id: progress.id,
                workout_session_id: session.id,
                set_number: set.set_number,
                reps_completed: set.reps_completed,
                weight_used: set.weight_used,
                notes: set.notes.as_deref(),
            },
        )
        .await?;
        recorded += 1;

        let outcome = SetOutcome {
            reps_completed: set.reps_completed,
        };
        if let Some(delta) = progression::evaluate(&progress, exercise, prior, outcome, Utc::now()) {
            exercise_progress::apply_progression(
                &mut *tx,
                progress.id,
                delta.new_weight,
                delta.new_last_update,
            )
            .await?;
            debug!(
                exercise = %exercise.exercise_name,
                from = ?progress.current_weight,
                to = ?delta.new_weight,
                "progression applied"
            );
            delta.apply_to(&mut progress);
            progressed += 1;
        }
    }

    let updated = tracker::advance(&mut tx, &user_program).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        %user_program_id,
        session_id = %session.id,
        submitted = sets.len(),
        recorded,
        progressed,
        state = %updated.state(),
        "workout completed"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use ironplan_db::models::ProgressionStrategy;

    use super::*;

    fn input(set_number: i32, reps: i32, weight: Option<f64>) -> CompletedSetInput {
        CompletedSetInput {
            exercise_progress_id: Uuid::new_v4(),
            set_number,
            reps_completed: reps,
            weight_used: weight,
            notes: None,
        }
    }

    fn exercise(is_barbell: bool) -> ProgramExercise {
        ProgramExercise {
            id: Uuid::new_v4(),
            workout_id: Uuid::new_v4(),
            exercise_name: "Bench Press".to_owned(),
            sets: 3,
            initial_reps: 5,
            target_reps: 5,
            initial_weight: Some(135.0),
            progression_strategy: ProgressionStrategy::Linear,
            progression_value: 5.0,
            progression_frequency: 1,
            is_barbell,
            sort_order: 0,
            notes: None,
            category: None,
        }
    }

    #[test]
    fn accepts_well_formed_sets() {
        let sets = vec![input(1, 5, Some(135.0)), input(2, 0, None)];
        assert!(validate_sets(&sets).is_ok());
        assert!(validate_sets(&[]).is_ok());
    }

    #[test]
    fn rejects_bad_set_number() {
        let err = validate_sets(&[input(0, 5, None)]).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn rejects_negative_reps_and_weight() {
        assert!(matches!(
            validate_sets(&[input(1, -1, None)]),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            validate_sets(&[input(1, 5, Some(-2.5))]),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            validate_sets(&[input(1, 5, Some(f64::NAN))]),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn plates_only_for_loaded_barbells() {
        assert!(plate_calculation(&exercise(true), Some(225.0)).is_some());
        assert!(plate_calculation(&exercise(true), Some(0.0)).is_none());
        assert!(plate_calculation(&exercise(true), None).is_none());
        assert!(plate_calculation(&exercise(false), Some(225.0)).is_none());
    }

    #[test]
    fn completed_set_input_defaults() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"exercise_progress_id":"{id}","set_number":1,"reps_completed":5}}"#);
        let parsed: CompletedSetInput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.exercise_progress_id, id);
        assert!(parsed.weight_used.is_none());
        assert!(parsed.notes.is_none());
    }
}
