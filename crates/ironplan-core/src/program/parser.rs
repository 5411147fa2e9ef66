//! Program file parsing with validation.
//!
//! A file is rejected as a whole before anything reaches the database:
//! - at least one workout, each on a distinct (week, day) within the
//!   program's duration;
//! - non-empty names;
//! - positive sets, reps, and progression frequency;
//! - finite, non-negative weights and increments.

use std::collections::HashSet;

use thiserror::Error;

use super::format::{ExerciseEntry, ProgramFile};

/// Errors that can occur during program parsing and validation.
#[derive(Debug, Error)]
pub enum ProgramParseError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("program name must not be empty")]
    EmptyName,

    #[error("duration_weeks must be at least 1, got {0}")]
    InvalidDuration(i32),

    #[error("program must contain at least one workout")]
    NoWorkouts,

    #[error("workout {workout:?} is at week {week}, day {day}; weeks and days start at 1")]
    InvalidCoordinate { workout: String, week: i32, day: i32 },

    #[error("workout {workout:?} is scheduled in week {week} but the program lasts {duration} weeks")]
    WeekOutOfRange {
        workout: String,
        week: i32,
        duration: i32,
    },

    #[error("more than one workout scheduled at week {week}, day {day}")]
    DuplicateSlot { week: i32, day: i32 },

    #[error("workout {workout:?} has an exercise with an empty name")]
    EmptyExerciseName { workout: String },

    #[error("exercise {exercise:?}: {field} must be at least 1, got {value}")]
    NotPositive {
        exercise: String,
        field: &'static str,
        value: i32,
    },

    #[error("exercise {exercise:?}: {field} must be a non-negative number")]
    InvalidNumber {
        exercise: String,
        field: &'static str,
    },
}

/// Parse and validate a TOML program file.
pub fn parse_program_toml(content: &str) -> Result<ProgramFile, ProgramParseError> {
    let file: ProgramFile = toml::from_str(content)?;
    validate(&file)?;
    Ok(file)
}

/// Parse and validate a JSON program file.
pub fn parse_program_json(content: &str) -> Result<ProgramFile, ProgramParseError> {
    let file: ProgramFile = serde_json::from_str(content)?;
    validate(&file)?;
    Ok(file)
}

/// Validate an already-deserialized program file.
pub fn validate(file: &ProgramFile) -> Result<(), ProgramParseError> {
    if file.program.name.trim().is_empty() {
        return Err(ProgramParseError::EmptyName);
    }
    let duration = file.program.duration_weeks;
    if duration < 1 {
        return Err(ProgramParseError::InvalidDuration(duration));
    }
    if file.workouts.is_empty() {
        return Err(ProgramParseError::NoWorkouts);
    }

    let mut slots = HashSet::new();
    for workout in &file.workouts {
        let (week, day) = (workout.week_number, workout.day_number);
        if week < 1 || day < 1 {
            return Err(ProgramParseError::InvalidCoordinate {
                workout: workout.name.clone(),
                week,
                day,
            });
        }
        if week > duration {
            return Err(ProgramParseError::WeekOutOfRange {
                workout: workout.name.clone(),
                week,
                duration,
            });
        }
        if !slots.insert((week, day)) {
            return Err(ProgramParseError::DuplicateSlot { week, day });
        }

        for exercise in &workout.exercises {
            if exercise.exercise_name.trim().is_empty() {
                return Err(ProgramParseError::EmptyExerciseName {
                    workout: workout.name.clone(),
                });
            }
            validate_exercise(exercise)?;
        }
    }

    Ok(())
}

fn validate_exercise(exercise: &ExerciseEntry) -> Result<(), ProgramParseError> {
    for (field, value) in [
        ("sets", exercise.sets),
        ("initial_reps", exercise.initial_reps),
        ("target_reps", exercise.target_reps),
        ("progression_frequency", exercise.progression_frequency),
    ] {
        if value < 1 {
            return Err(ProgramParseError::NotPositive {
                exercise: exercise.exercise_name.clone(),
                field,
                value,
            });
        }
    }

    let non_negative = |v: f64| v.is_finite() && v >= 0.0;
    if !exercise.initial_weight.is_none_or(non_negative) {
        return Err(ProgramParseError::InvalidNumber {
            exercise: exercise.exercise_name.clone(),
            field: "initial_weight",
        });
    }
    if !non_negative(exercise.progression_value) {
        return Err(ProgramParseError::InvalidNumber {
            exercise: exercise.exercise_name.clone(),
            field: "progression_value",
        });
    }

    Ok(())
}
