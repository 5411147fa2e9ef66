//! Serde types for program definition files.
//!
//! The same structure is accepted as TOML (`ironplan program create`) and
//! as JSON (`POST /api/programs`).

use ironplan_db::models::ProgressionStrategy;
use serde::{Deserialize, Serialize};

/// Top-level structure of a program file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramFile {
    pub program: ProgramMeta,
    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,
}

/// `[program]` header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_weeks: i32,
    #[serde(default)]
    pub is_public: bool,
}

/// A `[[workouts]]` entry, scheduled at one (week, day).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutEntry {
    pub name: String,
    pub week_number: i32,
    pub day_number: i32,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

/// A `[[workouts.exercises]]` prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseEntry {
    pub exercise_name: String,
    #[serde(default = "default_sets")]
    pub sets: i32,
    #[serde(default = "default_initial_reps")]
    pub initial_reps: i32,
    #[serde(default = "default_target_reps")]
    pub target_reps: i32,
    /// Starting weight; absent for bodyweight work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_weight: Option<f64>,
    #[serde(default)]
    pub progression_strategy: ProgressionStrategy,
    #[serde(default = "default_progression_value")]
    pub progression_value: f64,
    #[serde(default = "default_progression_frequency")]
    pub progression_frequency: i32,
    /// Explicit barbell flag. When absent it is guessed from the name.
    #[serde(
        default,
        alias = "is_barbell_exercise",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_barbell: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_sets() -> i32 {
    3
}

fn default_initial_reps() -> i32 {
    8
}

fn default_target_reps() -> i32 {
    12
}

fn default_progression_value() -> f64 {
    5.0
}

fn default_progression_frequency() -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_exercise_applies_defaults() {
        let toml_str = r#"
[program]
name = "Beginner"
duration_weeks = 2

[[workouts]]
name = "Day A"
week_number = 1
day_number = 1

[[workouts.exercises]]
exercise_name = "Push-up"
"#;
        let file: ProgramFile = toml::from_str(toml_str).expect("should parse");
        assert_eq!(file.program.description, "");
        assert!(!file.program.is_public);

        let ex = &file.workouts[0].exercises[0];
        assert_eq!(ex.sets, 3);
        assert_eq!(ex.initial_reps, 8);
        assert_eq!(ex.target_reps, 12);
        assert_eq!(ex.initial_weight, None);
        assert_eq!(ex.progression_strategy, ProgressionStrategy::Linear);
        assert_eq!(ex.progression_value, 5.0);
        assert_eq!(ex.progression_frequency, 1);
        assert_eq!(ex.is_barbell, None);
    }

    #[test]
    fn deserialize_json_with_legacy_barbell_key() {
        let json = r#"{
            "program": {"name": "5x5", "duration_weeks": 12, "is_public": true},
            "workouts": [{
                "name": "A", "week_number": 1, "day_number": 1,
                "exercises": [{
                    "exercise_name": "Squat", "sets": 5, "initial_reps": 5,
                    "target_reps": 5, "initial_weight": 135.0,
                    "progression_strategy": "undulating",
                    "is_barbell_exercise": false
                }]
            }]
        }"#;
        let file: ProgramFile = serde_json::from_str(json).expect("should parse");
        assert!(file.program.is_public);
        let ex = &file.workouts[0].exercises[0];
        assert_eq!(ex.progression_strategy, ProgressionStrategy::Undulating);
        assert_eq!(ex.is_barbell, Some(false));
        assert_eq!(ex.initial_weight, Some(135.0));
    }
}
