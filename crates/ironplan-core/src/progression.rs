//! Progression rules applied after each completed set.
//!
//! [`evaluate`] is pure: it reads the current progress and the exercise
//! prescription and returns what should change. The planner writes the
//! delta in the same transaction as the completed set.

use chrono::{DateTime, Utc};
use ironplan_db::models::{ExerciseProgress, ProgramExercise, ProgressionStrategy};

/// What the lifter actually did in one set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetOutcome {
    pub reps_completed: i32,
}

/// Changes to apply to an [`ExerciseProgress`] row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDelta {
    /// Working weight after progression. Unchanged (possibly `None`) for
    /// strategies that do not adjust weight.
    pub new_weight: Option<f64>,
    pub new_last_update: DateTime<Utc>,
}

impl ProgressDelta {
    /// Apply the delta to an in-memory copy of the progress row.
    pub fn apply_to(&self, progress: &mut ExerciseProgress) {
        progress.current_weight = self.new_weight;
        progress.last_update = self.new_last_update;
    }
}

/// Decide whether a completed set triggers progression.
///
/// `prior_completed_sets` is the number of sets recorded for this progress
/// row before the set being evaluated. Progression fires on every
/// `progression_frequency`-th set that meets the rep target.
pub fn evaluate(
    progress: &ExerciseProgress,
    exercise: &ProgramExercise,
    prior_completed_sets: i64,
    outcome: SetOutcome,
    now: DateTime<Utc>,
) -> Option<ProgressDelta> {
    if outcome.reps_completed < progress.current_reps_target {
        return None;
    }

    // Rejected when programs are authored; never divide by it here.
    let frequency = i64::from(exercise.progression_frequency);
    if frequency <= 0 || (prior_completed_sets + 1) % frequency != 0 {
        return None;
    }

    let new_weight = match exercise.progression_strategy {
        ProgressionStrategy::Linear => progress
            .current_weight
            .map(|weight| weight + exercise.progression_value),
        ProgressionStrategy::Undulating | ProgressionStrategy::Unknown(_) => {
            progress.current_weight
        }
    };

    Some(ProgressDelta {
        new_weight,
        new_last_update: now,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn exercise(strategy: ProgressionStrategy, frequency: i32) -> ProgramExercise {
        ProgramExercise {
            id: Uuid::new_v4(),
            workout_id: Uuid::new_v4(),
            exercise_name: "Squat".to_owned(),
            sets: 3,
            initial_reps: 5,
            target_reps: 5,
            initial_weight: Some(200.0),
            progression_strategy: strategy,
            progression_value: 5.0,
            progression_frequency: frequency,
            is_barbell: true,
            sort_order: 0,
            notes: None,
            category: None,
        }
    }

    fn progress(weight: Option<f64>) -> ExerciseProgress {
        ExerciseProgress {
            id: Uuid::new_v4(),
            user_program_id: Uuid::new_v4(),
            program_exercise_id: Uuid::new_v4(),
            current_weight: weight,
            current_reps_target: 5,
            last_update: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn reps(n: i32) -> SetOutcome {
        SetOutcome { reps_completed: n }
    }

    #[test]
    fn missed_target_never_progresses() {
        let ex = exercise(ProgressionStrategy::Linear, 1);
        assert_eq!(evaluate(&progress(Some(200.0)), &ex, 0, reps(4), now()), None);
    }

    #[test]
    fn linear_adds_increment() {
        let ex = exercise(ProgressionStrategy::Linear, 1);
        let delta = evaluate(&progress(Some(200.0)), &ex, 0, reps(5), now()).unwrap();
        assert_eq!(delta.new_weight, Some(205.0));
        assert_eq!(delta.new_last_update, now());
    }

    #[test]
    fn exceeding_target_also_qualifies() {
        let ex = exercise(ProgressionStrategy::Linear, 1);
        let delta = evaluate(&progress(Some(200.0)), &ex, 7, reps(8), now()).unwrap();
        assert_eq!(delta.new_weight, Some(205.0));
    }

    #[test]
    fn frequency_gates_on_every_nth_set() {
        let ex = exercise(ProgressionStrategy::Linear, 3);
        let p = progress(Some(100.0));
        let fired: Vec<i64> = (0..9)
            .filter(|prior| evaluate(&p, &ex, *prior, reps(5), now()).is_some())
            .collect();
        assert_eq!(fired, vec![2, 5, 8]);
    }

    #[test]
    fn bodyweight_is_left_alone_but_stamped() {
        let ex = exercise(ProgressionStrategy::Linear, 1);
        let delta = evaluate(&progress(None), &ex, 0, reps(5), now()).unwrap();
        assert_eq!(delta.new_weight, None);
        assert_eq!(delta.new_last_update, now());
    }

    #[test]
    fn non_linear_strategies_are_no_ops() {
        for strategy in [
            ProgressionStrategy::Undulating,
            ProgressionStrategy::Unknown("wave".to_owned()),
        ] {
            let ex = exercise(strategy, 1);
            let delta = evaluate(&progress(Some(150.0)), &ex, 0, reps(5), now()).unwrap();
            assert_eq!(delta.new_weight, Some(150.0));
        }
    }

    #[test]
    fn zero_frequency_never_fires() {
        let ex = exercise(ProgressionStrategy::Linear, 0);
        assert_eq!(evaluate(&progress(Some(100.0)), &ex, 0, reps(5), now()), None);
    }

    #[test]
    fn apply_to_updates_copy() {
        let ex = exercise(ProgressionStrategy::Linear, 1);
        let mut p = progress(Some(100.0));
        let delta = evaluate(&p, &ex, 0, reps(5), now()).unwrap();
        delta.apply_to(&mut p);
        assert_eq!(p.current_weight, Some(105.0));
        assert_eq!(p.last_update, now());
    }
}
