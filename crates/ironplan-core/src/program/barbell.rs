//! Keyword-based barbell detection used when a program file leaves
//! `is_barbell` unset.

/// Lowercase fragments that mark an exercise as a barbell lift.
const BARBELL_KEYWORDS: &[&str] = &[
    "barbell",
    "bench press",
    "squat",
    "deadlift",
    "overhead press",
    "ohp",
    "row",
    "powerclean",
    "clean and jerk",
    "snatch",
    "front squat",
    "sumo deadlift",
    "romanian deadlift",
    "good morning",
    "push press",
    "military press",
];

/// Guess whether `exercise_name` is performed with a barbell.
///
/// Only consulted while creating a program; the engine itself trusts the
/// stored flag.
pub fn detect_barbell(exercise_name: &str) -> bool {
    let name = exercise_name.to_lowercase();
    BARBELL_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}
