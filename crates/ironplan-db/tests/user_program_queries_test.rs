//! Tests for user program, exercise progress, session, and completed set
//! queries.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use ironplan_db::models::{ProgramExercise, ProgramState, ProgressionStrategy};
use ironplan_db::queries::completed_sets::{self, NewCompletedSet};
use ironplan_db::queries::programs::{self, NewExercise, NewProgram, NewWorkout};
use ironplan_db::queries::{exercise_progress, sessions, user_programs};
use ironplan_test_utils::{create_test_db, drop_test_db};

/// One public program with a single squat prescription at week 1, day 1.
async fn seed(pool: &PgPool) -> (Uuid, ProgramExercise) {
    let program = programs::insert_program(
        pool,
        &NewProgram {
            creator_id: Uuid::new_v4(),
            name: "Squat Every Day",
            description: "",
            duration_weeks: 2,
            is_public: true,
        },
    )
    .await
    .unwrap();
    let workout = programs::insert_workout(
        pool,
        &NewWorkout {
            program_id: program.id,
            name: "Day 1",
            week_number: 1,
            day_number: 1,
            sort_order: 0,
        },
    )
    .await
    .unwrap();
    let exercise = programs::insert_exercise(
        pool,
        &NewExercise {
            workout_id: workout.id,
            exercise_name: "Squat",
            sets: 5,
            initial_reps: 5,
            target_reps: 5,
            initial_weight: Some(225.0),
            progression_strategy: &ProgressionStrategy::Linear,
            progression_value: 5.0,
            progression_frequency: 1,
            is_barbell: true,
            sort_order: 0,
            notes: None,
            category: None,
        },
    )
    .await
    .unwrap();
    (program.id, exercise)
}

#[tokio::test]
async fn second_active_run_is_refused() {
    let (pool, db_name) = create_test_db().await;
    let (program_id, _) = seed(&pool).await;
    let user = Uuid::new_v4();

    let first = user_programs::insert_active_user_program(&pool, user, program_id)
        .await
        .unwrap()
        .expect("first run should be created");
    assert_eq!((first.current_week, first.current_day), (1, 1));
    assert_eq!(first.state(), ProgramState::Active);

    let second = user_programs::insert_active_user_program(&pool, user, program_id)
        .await
        .unwrap();
    assert!(second.is_none());

    // A different user is unaffected.
    assert!(
        user_programs::insert_active_user_program(&pool, Uuid::new_v4(), program_id)
            .await
            .unwrap()
            .is_some()
    );

    // Once deactivated, the same user may start again.
    let stopped = user_programs::deactivate(&pool, first.id)
        .await
        .unwrap()
        .expect("active run should deactivate");
    assert_eq!(stopped.state(), ProgramState::Stopped);
    assert!(user_programs::deactivate(&pool, first.id).await.unwrap().is_none());
    assert!(
        user_programs::insert_active_user_program(&pool, user, program_id)
            .await
            .unwrap()
            .is_some()
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn position_updates_and_completion() {
    let (pool, db_name) = create_test_db().await;
    let (program_id, _) = seed(&pool).await;
    let user = Uuid::new_v4();
    let run = user_programs::insert_active_user_program(&pool, user, program_id)
        .await
        .unwrap()
        .unwrap();

    let moved = user_programs::update_position(&pool, run.id, 2, 3)
        .await
        .unwrap();
    assert_eq!((moved.current_week, moved.current_day), (2, 3));

    let mut tx = pool.begin().await.unwrap();
    let locked = user_programs::lock_user_program(&mut *tx, run.id)
        .await
        .unwrap()
        .expect("run should exist");
    assert_eq!(locked.current_week, 2);
    let done = user_programs::mark_completed(&mut *tx, run.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(done.state(), ProgramState::Completed);
    assert!(done.completed_at.is_some());
    assert!(
        user_programs::list_active_for_user(&pool, user)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(user_programs::update_position(&pool, run.id, 1, 1).await.is_err());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn progress_insert_is_idempotent() {
    let (pool, db_name) = create_test_db().await;
    let (program_id, exercise) = seed(&pool).await;
    let run = user_programs::insert_active_user_program(&pool, Uuid::new_v4(), program_id)
        .await
        .unwrap()
        .unwrap();

    assert!(
        exercise_progress::insert_if_absent(&pool, run.id, exercise.id, Some(225.0), 5)
            .await
            .unwrap()
    );
    assert!(
        !exercise_progress::insert_if_absent(&pool, run.id, exercise.id, Some(999.0), 99)
            .await
            .unwrap()
    );

    let progress = exercise_progress::find_for_exercise(&pool, run.id, exercise.id)
        .await
        .unwrap()
        .expect("progress should exist");
    assert_eq!(progress.current_weight, Some(225.0));
    assert_eq!(progress.current_reps_target, 5);

    let now = Utc::now();
    exercise_progress::apply_progression(&pool, progress.id, Some(230.0), now)
        .await
        .unwrap();
    let updated = exercise_progress::get_exercise_progress(&pool, progress.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.current_weight, Some(230.0));
    assert!(
        exercise_progress::apply_progression(&pool, Uuid::new_v4(), None, now)
            .await
            .is_err()
    );

    let listed = exercise_progress::list_for_user_program(&pool, run.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].exercise_name, "Squat");
    assert!(listed[0].is_barbell);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn completed_sets_are_counted_per_progress() {
    let (pool, db_name) = create_test_db().await;
    let (program_id, exercise) = seed(&pool).await;
    let user = Uuid::new_v4();
    let run = user_programs::insert_active_user_program(&pool, user, program_id)
        .await
        .unwrap()
        .unwrap();
    exercise_progress::insert_if_absent(&pool, run.id, exercise.id, Some(225.0), 5)
        .await
        .unwrap();
    let progress = exercise_progress::find_for_exercise(&pool, run.id, exercise.id)
        .await
        .unwrap()
        .unwrap();

    let session = sessions::insert_session(&pool, user, Some(run.id), Some("heavy day"))
        .await
        .unwrap();
    assert_eq!(session.user_program_id, Some(run.id));

    assert_eq!(
        completed_sets::count_for_progress(&pool, progress.id).await.unwrap(),
        0
    );
    for set_number in 1..=3 {
        completed_sets::insert_completed_set(
            &pool,
            &NewCompletedSet {
                exercise_progress_id: progress.id,
                workout_session_id: session.id,
                set_number,
                reps_completed: 5,
                weight_used: Some(225.0),
                notes: None,
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(
        completed_sets::count_for_progress(&pool, progress.id).await.unwrap(),
        3
    );

    let in_session = completed_sets::list_for_session(&pool, session.id)
        .await
        .unwrap();
    let numbers: Vec<i32> = in_session.iter().map(|s| s.set_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(
        completed_sets::list_for_progress(&pool, progress.id)
            .await
            .unwrap()
            .len(),
        3
    );
    assert_eq!(
        sessions::list_for_user_program(&pool, run.id)
            .await
            .unwrap()
            .len(),
        1
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}
