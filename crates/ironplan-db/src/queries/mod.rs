//! Query functions grouped by table.

pub mod completed_sets;
pub mod exercise_progress;
pub mod programs;
pub mod sessions;
pub mod user_programs;
