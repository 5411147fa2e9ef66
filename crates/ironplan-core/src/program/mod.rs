//! Program authoring: the program file format, validation, and inserting a
//! complete program definition.

pub mod barbell;
pub mod format;
pub mod parser;
pub mod service;

pub use barbell::detect_barbell;
pub use format::{ExerciseEntry, ProgramFile, ProgramMeta, WorkoutEntry};
pub use parser::{ProgramParseError, parse_program_json, parse_program_toml};
pub use service::{
    ProgramWithWorkouts, WorkoutWithExercises, create_program, get_program_with_workouts,
    list_programs,
};
