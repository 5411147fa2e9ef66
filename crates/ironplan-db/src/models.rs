use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Rule used to adjust an exercise's target after qualifying performance.
///
/// Stored as free text. Labels that are not recognised are kept verbatim in
/// [`ProgressionStrategy::Unknown`] and never change the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProgressionStrategy {
    /// Add a fixed increment to the working weight.
    #[default]
    Linear,
    /// Accepted label; currently leaves the target unchanged.
    Undulating,
    /// Any other label.
    Unknown(String),
}

impl ProgressionStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Linear => "linear",
            Self::Undulating => "undulating",
            Self::Unknown(label) => label,
        }
    }
}

impl fmt::Display for ProgressionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressionStrategy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "linear" => Self::Linear,
            "undulating" => Self::Undulating,
            other => Self::Unknown(other.to_owned()),
        })
    }
}

impl From<String> for ProgressionStrategy {
    fn from(s: String) -> Self {
        match s.as_str() {
            "linear" => Self::Linear,
            "undulating" => Self::Undulating,
            _ => Self::Unknown(s),
        }
    }
}

impl From<ProgressionStrategy> for String {
    fn from(strategy: ProgressionStrategy) -> Self {
        match strategy {
            ProgressionStrategy::Unknown(label) => label,
            known => known.as_str().to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------

/// Lifecycle state of a [`UserProgram`], derived from its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramState {
    Active,
    Completed,
    /// Deactivated by the user before the final week.
    Stopped,
}

impl fmt::Display for ProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A program definition header.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Program {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_weeks: i32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Program {
    /// Whether `user_id` may read or start this program.
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.is_public || self.creator_id == user_id
    }
}

/// A workout scheduled at one (week, day) coordinate of a program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgramWorkout {
    pub id: Uuid,
    pub program_id: Uuid,
    pub name: String,
    pub week_number: i32,
    pub day_number: i32,
    pub sort_order: i32,
}

/// One exercise prescription inside a scheduled workout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgramExercise {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub exercise_name: String,
    pub sets: i32,
    pub initial_reps: i32,
    pub target_reps: i32,
    pub initial_weight: Option<f64>,
    #[sqlx(try_from = "String")]
    pub progression_strategy: ProgressionStrategy,
    pub progression_value: f64,
    pub progression_frequency: i32,
    pub is_barbell: bool,
    pub sort_order: i32,
    pub notes: Option<String>,
    pub category: Option<String>,
}

/// A user's position within one program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProgram {
    pub id: Uuid,
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub current_week: i32,
    pub current_day: i32,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UserProgram {
    pub fn state(&self) -> ProgramState {
        if self.is_active {
            ProgramState::Active
        } else if self.completed_at.is_some() {
            ProgramState::Completed
        } else {
            ProgramState::Stopped
        }
    }
}

/// Rolling target for one exercise within a [`UserProgram`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseProgress {
    pub id: Uuid,
    pub user_program_id: Uuid,
    pub program_exercise_id: Uuid,
    pub current_weight: Option<f64>,
    pub current_reps_target: i32,
    pub last_update: DateTime<Utc>,
}

/// History record for one performed workout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_program_id: Option<Uuid>,
    pub notes: Option<String>,
    pub performed_at: DateTime<Utc>,
}

/// An append-only record of one performed set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletedSet {
    pub id: Uuid,
    pub exercise_progress_id: Uuid,
    pub workout_session_id: Uuid,
    pub set_number: i32,
    pub reps_completed: i32,
    pub weight_used: Option<f64>,
    pub notes: Option<String>,
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn user_program(is_active: bool, completed: bool) -> UserProgram {
        UserProgram {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            current_week: 1,
            current_day: 1,
            is_active,
            started_at: Utc::now(),
            completed_at: completed.then(Utc::now),
        }
    }

    #[test]
    fn progression_strategy_known_labels() {
        assert_eq!(
            "linear".parse::<ProgressionStrategy>().unwrap(),
            ProgressionStrategy::Linear
        );
        assert_eq!(
            ProgressionStrategy::from("undulating".to_owned()),
            ProgressionStrategy::Undulating
        );
    }

    #[test]
    fn progression_strategy_keeps_unknown_label() {
        let strategy = ProgressionStrategy::from("wave".to_owned());
        assert_eq!(strategy, ProgressionStrategy::Unknown("wave".to_owned()));
        assert_eq!(strategy.to_string(), "wave");
        assert_eq!(String::from(strategy), "wave");
    }

    #[test]
    fn progression_strategy_serde_is_plain_string() {
        let json = serde_json::to_string(&ProgressionStrategy::Linear).unwrap();
        assert_eq!(json, "\"linear\"");
        let back: ProgressionStrategy = serde_json::from_str("\"5/3/1\"").unwrap();
        assert_eq!(back, ProgressionStrategy::Unknown("5/3/1".to_owned()));
    }

    #[test]
    fn user_program_state_derivation() {
        assert_eq!(user_program(true, false).state(), ProgramState::Active);
        assert_eq!(user_program(false, true).state(), ProgramState::Completed);
        assert_eq!(user_program(false, false).state(), ProgramState::Stopped);
    }

    #[test]
    fn program_visibility() {
        let creator = Uuid::new_v4();
        let mut program = Program {
            id: Uuid::new_v4(),
            creator_id: creator,
            name: "5x5".to_owned(),
            description: String::new(),
            duration_weeks: 4,
            is_public: false,
            created_at: Utc::now(),
        };
        assert!(program.is_visible_to(creator));
        assert!(!program.is_visible_to(Uuid::new_v4()));
        program.is_public = true;
        assert!(program.is_visible_to(Uuid::new_v4()));
    }
}
