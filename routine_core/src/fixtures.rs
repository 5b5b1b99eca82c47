//! In-memory backups shared by the unit tests.

use crate::schema;
use crate::store::Store;
use rusqlite::Connection;

/// A loaded in-memory store seeded with `sql`
pub fn store_with(sql: &str) -> Store {
    let conn = Connection::open_in_memory().unwrap();
    schema::install(&conn).unwrap();
    conn.execute_batch(sql).unwrap();

    let mut store = Store::from_connection(conn);
    store.load().unwrap();
    store
}

pub fn empty_store() -> Store {
    store_with("")
}

/// Push Day → Main → Bench Press (Chest) → 5 x 100
pub const PUSH_DAY: &str = "
    INSERT INTO Category (id, name, colour, sort_order) VALUES (1, 'Chest', 16711680, 1);
    INSERT INTO exercise (id, name, category_id, exercise_type_id, weight_increment)
        VALUES (1, 'Bench Press', 1, 0, 2.5);
    INSERT INTO Routine (id, name, notes) VALUES (1, 'Push Day', 'Heavy');
    INSERT INTO RoutineSection (id, routine_id, name, sort_number) VALUES (1, 1, 'Main', 1);
    INSERT INTO RoutineSectionExercise (id, routine_section_id, exercise_id, sort_order)
        VALUES (1, 1, 1, 1);
    INSERT INTO RoutineSectionExerciseSet (id, routine_section_exercise_id, metric_weight, reps,
        sort_order, distance, duration_seconds, unit)
        VALUES (1, 1, 100.0, 5, 1, 0, 0, 0);
";

pub fn push_day_store() -> Store {
    store_with(PUSH_DAY)
}

/// Two sections sharing Squat, two Chest exercises, plus an empty routine
pub const FULL_BODY: &str = "
    INSERT INTO Category (id, name, colour, sort_order) VALUES (1, 'Chest', 1, 1);
    INSERT INTO Category (id, name, colour, sort_order) VALUES (2, 'Legs', 2, 2);
    INSERT INTO Category (id, name, colour, sort_order) VALUES (3, 'Unused', 3, 3);
    INSERT INTO exercise (id, name, category_id, exercise_type_id) VALUES (10, 'Squat', 2, 0);
    INSERT INTO exercise (id, name, category_id, exercise_type_id) VALUES (11, 'Bench Press', 1, 0);
    INSERT INTO exercise (id, name, category_id, exercise_type_id) VALUES (12, 'Incline Bench Press', 1, 0);
    INSERT INTO Routine (id, name, notes) VALUES (1, 'Full Body', NULL);
    INSERT INTO Routine (id, name, notes) VALUES (2, 'Rest', 'Nothing planned');
    INSERT INTO RoutineSection (id, routine_id, name, sort_number) VALUES (1, 1, 'Day A', 1);
    INSERT INTO RoutineSection (id, routine_id, name, sort_number) VALUES (2, 1, 'Day B', 2);
    INSERT INTO RoutineSectionExercise (id, routine_section_id, exercise_id, sort_order) VALUES (1, 1, 10, 1);
    INSERT INTO RoutineSectionExercise (id, routine_section_id, exercise_id, sort_order) VALUES (2, 1, 11, 2);
    INSERT INTO RoutineSectionExercise (id, routine_section_id, exercise_id, sort_order) VALUES (3, 2, 10, 1);
    INSERT INTO RoutineSectionExercise (id, routine_section_id, exercise_id, sort_order) VALUES (4, 2, 12, 2);
    INSERT INTO RoutineSectionExerciseSet (id, routine_section_exercise_id, metric_weight, reps,
        sort_order, distance, duration_seconds, unit) VALUES (1, 1, 120.0, 5, 1, 0, 0, 0);
    INSERT INTO RoutineSectionExerciseSet (id, routine_section_exercise_id, metric_weight, reps,
        sort_order, distance, duration_seconds, unit) VALUES (2, 1, 120.0, 5, 2, 0, 0, 0);
    INSERT INTO RoutineSectionExerciseSet (id, routine_section_exercise_id, metric_weight, reps,
        sort_order, distance, duration_seconds, unit) VALUES (3, 1, 120.0, 5, 3, 0, 0, 0);
    INSERT INTO RoutineSectionExerciseSet (id, routine_section_exercise_id, metric_weight, reps,
        sort_order, distance, duration_seconds, unit) VALUES (4, 2, 80.0, 8, 1, 0, 0, 0);
    INSERT INTO RoutineSectionExerciseSet (id, routine_section_exercise_id, metric_weight, reps,
        sort_order, distance, duration_seconds, unit) VALUES (5, 3, 100.0, 8, 1, 0, 0, 0);
    INSERT INTO RoutineSectionExerciseSet (id, routine_section_exercise_id, metric_weight, reps,
        sort_order, distance, duration_seconds, unit) VALUES (6, 4, 60.0, 10, 1, 0, 0, 0);
";

pub fn full_body_store() -> Store {
    store_with(FULL_BODY)
}
