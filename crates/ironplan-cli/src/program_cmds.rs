//! CLI handlers for `ironplan program` subcommands.
//!
//! - `ironplan program create <file> --user <id>`
//! - `ironplan program show <program-id> --user <id>`
//! - `ironplan program list --user <id>`

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use ironplan_core::program::{
    ProgramFile, create_program, get_program_with_workouts, list_programs, parse_program_json,
    parse_program_toml,
};

use crate::ProgramCommands;

pub async fn run_program_command(command: ProgramCommands, pool: &PgPool) -> Result<()> {
    match command {
        ProgramCommands::Create { file, user } => cmd_create(pool, user, &file).await,
        ProgramCommands::Show { program_id, user } => cmd_show(pool, user, program_id).await,
        ProgramCommands::List { user } => cmd_list(pool, user).await,
    }
}

/// Parse a program file, choosing the format from the extension. Anything
/// other than `.json` is read as TOML.
fn parse_program_file(file_path: &str, content: &str) -> Result<ProgramFile> {
    let is_json = Path::new(file_path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        parse_program_json(content)
    } else {
        parse_program_toml(content)
    };
    parsed.with_context(|| format!("failed to parse program file: {file_path}"))
}

// -----------------------------------------------------------------------
// ironplan program create <file>
// -----------------------------------------------------------------------

async fn cmd_create(pool: &PgPool, user_id: Uuid, file_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read program file: {file_path}"))?;
    let file = parse_program_file(file_path, &content)?;

    let program = create_program(pool, user_id, &file).await?;
    let exercise_count: usize = file.workouts.iter().map(|w| w.exercises.len()).sum();

    println!("Program created successfully.");
    println!();
    println!("  Program ID: {}", program.id);
    println!("  Name:       {}", program.name);
    println!("  Weeks:      {}", program.duration_weeks);
    println!("  Workouts:   {}", file.workouts.len());
    println!("  Exercises:  {exercise_count}");
    println!("  Public:     {}", program.is_public);

    Ok(())
}

// -----------------------------------------------------------------------
// ironplan program show <program-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, user_id: Uuid, program_id: Uuid) -> Result<()> {
    let detail = get_program_with_workouts(pool, user_id, program_id).await?;
    let program = &detail.program;

    println!("Program: {}", program.name);
    println!("  ID:      {}", program.id);
    println!("  Weeks:   {}", program.duration_weeks);
    println!("  Public:  {}", program.is_public);
    if !program.description.is_empty() {
        println!("  About:   {}", program.description);
    }

    for entry in &detail.workouts {
        let workout = &entry.workout;
        println!();
        println!(
            "Week {}, Day {}: {}",
            workout.week_number, workout.day_number, workout.name
        );
        for exercise in &entry.exercises {
            let weight = exercise
                .initial_weight
                .map(|w| format!(" @ {w} lb"))
                .unwrap_or_default();
            let barbell = if exercise.is_barbell { " [barbell]" } else { "" };
            println!(
                "  {} {}x{}-{}{}  (+{} {} every {}){}",
                exercise.exercise_name,
                exercise.sets,
                exercise.initial_reps,
                exercise.target_reps,
                weight,
                exercise.progression_value,
                exercise.progression_strategy,
                exercise.progression_frequency,
                barbell,
            );
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------
// ironplan program list
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let programs = list_programs(pool, user_id).await?;

    if programs.is_empty() {
        println!("No programs found. Use `ironplan program create <file>` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let name_w = programs
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<id_w$}  {:<name_w$}  WEEKS  PUBLIC  CREATED", "ID", "NAME");
    for program in &programs {
        let created = program.created_at.format("%Y-%m-%d %H:%M");
        println!(
            "{:<id_w$}  {:<name_w$}  {:>5}  {:<6}  {}",
            program.id, program.name, program.duration_weeks, program.is_public, created,
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_PROGRAM: &str = r#"
[program]
name = "Starter"
duration_weeks = 1

[[workouts]]
name = "A"
week_number = 1
day_number = 1

[[workouts.exercises]]
exercise_name = "Squat"
initial_weight = 135.0
"#;

    const JSON_PROGRAM: &str = r#"{
        "program": {"name": "Starter", "duration_weeks": 1},
        "workouts": [{
            "name": "A", "week_number": 1, "day_number": 1,
            "exercises": [{"exercise_name": "Squat", "initial_weight": 135.0}]
        }]
    }"#;

    #[test]
    fn toml_is_the_default_format() {
        let file = parse_program_file("starter.toml", TOML_PROGRAM).unwrap();
        assert_eq!(file.program.name, "Starter");
        let file = parse_program_file("starter", TOML_PROGRAM).unwrap();
        assert_eq!(file.workouts.len(), 1);
    }

    #[test]
    fn json_extension_selects_json() {
        let file = parse_program_file("starter.JSON", JSON_PROGRAM).unwrap();
        assert_eq!(file.workouts[0].exercises[0].exercise_name, "Squat");
        assert!(parse_program_file("starter.toml", JSON_PROGRAM).is_err());
    }

    #[test]
    fn parse_error_names_the_file() {
        let err = parse_program_file("broken.toml", "[program]\nname = 1").unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }
}
