//! CLI handlers for running a program: `plates`, `start`, `today`,
//! `complete` and `stop`.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use ironplan_core::planner::{self, CompletedSetInput, ExecutionPlan};
use ironplan_core::plates::{self, PlateResult};
use ironplan_core::tracker;
use ironplan_db::models::{ProgramState, UserProgram};

// -----------------------------------------------------------------------
// ironplan plates <weight>
// -----------------------------------------------------------------------

pub fn cmd_plates(weight: f64, json: bool) -> Result<()> {
    let result = plates::resolve(weight);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", describe_plates(&result));
    }
    Ok(())
}

/// One-line human summary of a plate calculation.
fn describe_plates(result: &PlateResult) -> String {
    match result {
        PlateResult::Loadout(loadout) => {
            let per_side = if loadout.plates_per_side.is_empty() {
                "empty bar".to_string()
            } else {
                let plates: Vec<String> = loadout
                    .plates_per_side
                    .iter()
                    .map(|p| p.to_string())
                    .collect();
                format!("{} per side", plates.join(" + "))
            };
            let shortfall = if loadout.actual_weight < loadout.target_weight {
                format!(" (target {} lb)", loadout.target_weight)
            } else {
                String::new()
            };
            format!(
                "{} lb: {} on a {} lb bar{}",
                loadout.actual_weight, per_side, loadout.bar_weight, shortfall
            )
        }
        PlateResult::Unloadable { error, bar_weight } => {
            format!("cannot load: {error} (bar is {bar_weight} lb)")
        }
    }
}

// -----------------------------------------------------------------------
// ironplan start / stop
// -----------------------------------------------------------------------

pub async fn cmd_start(pool: &PgPool, user_id: Uuid, program_id: Uuid) -> Result<()> {
    let user_program = tracker::start_program(pool, user_id, program_id).await?;

    println!("Program started.");
    println!();
    println!("  User program ID: {}", user_program.id);
    println!("  Position:        {}", position(&user_program));
    println!();
    println!(
        "Next: run `ironplan today {} --user {user_id}`.",
        user_program.id
    );
    Ok(())
}

pub async fn cmd_stop(pool: &PgPool, user_id: Uuid, user_program_id: Uuid) -> Result<()> {
    let stopped = tracker::stop_program(pool, user_id, user_program_id).await?;
    println!(
        "User program {} stopped at {}.",
        stopped.id,
        position(&stopped)
    );
    Ok(())
}

fn position(user_program: &UserProgram) -> String {
    format!(
        "week {}, day {}",
        user_program.current_week, user_program.current_day
    )
}

// -----------------------------------------------------------------------
// ironplan today
// -----------------------------------------------------------------------

pub async fn cmd_today(
    pool: &PgPool,
    user_id: Uuid,
    user_program_id: Uuid,
    json: bool,
) -> Result<()> {
    let plan = planner::plan_today(pool, user_id, user_program_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &ExecutionPlan) {
    println!(
        "{}: {} (week {}, day {})",
        plan.program_name, plan.workout_name, plan.week, plan.day
    );

    let name_w = plan
        .sets
        .iter()
        .map(|s| s.exercise_name.len())
        .max()
        .unwrap_or(8)
        .max(8);

    println!();
    println!(
        "{:<name_w$}  SET  REPS  WEIGHT  PROGRESS ID",
        "EXERCISE"
    );
    for set in &plan.sets {
        println!(
            "{:<name_w$}  {:>3}  {:>4}  {:>6}  {}",
            set.exercise_name,
            set.set_number,
            set.target_reps,
            set.target_weight,
            set.exercise_progress_id,
        );
    }

    // Every set of an exercise carries the same plates.
    let mut plate_lines = Vec::new();
    let mut last_exercise = None;
    for set in &plan.sets {
        if last_exercise == Some(set.exercise_id) {
            continue;
        }
        last_exercise = Some(set.exercise_id);
        if let Some(result) = &set.plate_calculation {
            plate_lines.push(format!("  {}: {}", set.exercise_name, describe_plates(result)));
        }
    }
    if !plate_lines.is_empty() {
        println!();
        println!("Plates:");
        for line in &plate_lines {
            println!("{line}");
        }
    }
}

// -----------------------------------------------------------------------
// ironplan complete
// -----------------------------------------------------------------------

/// Read the completed sets file: a JSON array of set objects.
fn read_sets_file(file_path: &str) -> Result<Vec<CompletedSetInput>> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read sets file: {file_path}"))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse sets file: {file_path}"))
}

pub async fn cmd_complete(
    pool: &PgPool,
    user_id: Uuid,
    user_program_id: Uuid,
    file_path: &str,
) -> Result<()> {
    let sets = read_sets_file(file_path)?;
    let updated = planner::complete_workout(pool, user_id, user_program_id, &sets).await?;

    println!("Workout recorded ({} sets).", sets.len());
    match updated.state() {
        ProgramState::Completed => println!("Program complete."),
        _ => println!("Next workout: {}.", position(&updated)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_loaded_bar() {
        let text = describe_plates(&plates::resolve(225.0));
        assert_eq!(text, "225 lb: 45 + 45 per side on a 45 lb bar");
    }

    #[test]
    fn describes_empty_bar_and_shortfall() {
        assert_eq!(
            describe_plates(&plates::resolve(45.0)),
            "45 lb: empty bar on a 45 lb bar"
        );
        let text = describe_plates(&plates::resolve(138.0));
        assert!(text.starts_with("135 lb:"), "unexpected: {text}");
        assert!(text.ends_with("(target 138 lb)"), "unexpected: {text}");
    }

    #[test]
    fn describes_unloadable_weight() {
        let text = describe_plates(&plates::resolve(20.0));
        assert_eq!(text, "cannot load: weight is less than bar weight (bar is 45 lb)");
    }

    #[test]
    fn reads_sets_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sets.json");
        let id = Uuid::new_v4();
        std::fs::write(
            &path,
            format!(
                r#"[{{"exercise_progress_id":"{id}","set_number":1,"reps_completed":5,"weight_used":135.0}},
                   {{"exercise_progress_id":"{id}","set_number":2,"reps_completed":4}}]"#
            ),
        )
        .unwrap();

        let sets = read_sets_file(path.to_str().unwrap()).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].weight_used, Some(135.0));
        assert_eq!(sets[1].weight_used, None);
    }

    #[test]
    fn rejects_non_array_sets_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sets.json");
        std::fs::write(&path, r#"{"set_number": 1}"#).unwrap();
        assert!(read_sets_file(path.to_str().unwrap()).is_err());
    }
}
