//! Backup schema checks.
//!
//! A backup is accepted when every table a routine touches exists and carries
//! at least the columns the record model reads. Extra tables and columns are
//! left alone.

use crate::types::{
    Category, Exercise, Record, Routine, RoutineSection, RoutineSectionExercise,
    RoutineSectionExerciseSet,
};
use crate::{Error, Result};
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Table name and column list of every table the store reads
pub fn required_tables() -> [(&'static str, &'static [&'static str]); 6] {
    [
        (Category::TABLE, Category::COLUMNS),
        (Exercise::TABLE, Exercise::COLUMNS),
        (Routine::TABLE, Routine::COLUMNS),
        (RoutineSection::TABLE, RoutineSection::COLUMNS),
        (RoutineSectionExercise::TABLE, RoutineSectionExercise::COLUMNS),
        (
            RoutineSectionExerciseSet::TABLE,
            RoutineSectionExerciseSet::COLUMNS,
        ),
    ]
}

/// Verify that the connection holds a usable backup
pub fn verify(conn: &Connection) -> Result<()> {
    for (table, columns) in required_tables() {
        let present = table_columns(conn, table)?;
        if present.is_empty() {
            return Err(Error::Schema(format!("missing table {}", table)));
        }

        for column in columns {
            if !present.contains(&column.to_lowercase()) {
                return Err(Error::Schema(format!(
                    "table {} is missing column {}",
                    table, column
                )));
            }
        }
    }

    tracing::debug!("Backup schema verified");
    Ok(())
}

/// Lowercased column names of a table; empty if the table does not exist
fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let mut rows = stmt.query([])?;
    let mut columns = BTreeSet::new();
    while let Some(row) = rows.next()? {
        columns.insert(row.get::<_, String>(1)?.to_lowercase());
    }
    Ok(columns)
}

/// Create the six tables on an empty connection
///
/// Ids use AUTOINCREMENT so a deleted row's id is never handed out again.
pub fn install(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS Category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            colour INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS exercise (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            exercise_type_id INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            weight_increment REAL,
            default_graph_id INTEGER,
            default_rest_time INTEGER
        );
        CREATE TABLE IF NOT EXISTS Routine (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            notes TEXT
        );
        CREATE TABLE IF NOT EXISTS RoutineSection (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            routine_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            sort_number INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS RoutineSectionExercise (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            routine_section_id INTEGER NOT NULL,
            exercise_id INTEGER NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS RoutineSectionExerciseSet (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            routine_section_exercise_id INTEGER NOT NULL,
            metric_weight REAL NOT NULL DEFAULT 0,
            reps INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0,
            distance REAL NOT NULL DEFAULT 0,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            unit INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_schema_verifies() {
        let conn = Connection::open_in_memory().unwrap();
        install(&conn).unwrap();
        verify(&conn).unwrap();
    }

    #[test]
    fn test_empty_database_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = verify(&conn).unwrap_err();
        assert!(err.to_string().contains("missing table Category"));
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        install(&conn).unwrap();
        conn.execute_batch(
            "DROP TABLE Routine; CREATE TABLE Routine (id INTEGER PRIMARY KEY, name TEXT);",
        )
        .unwrap();

        let err = verify(&conn).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("Routine is missing column notes"));
    }

    #[test]
    fn test_extra_columns_are_tolerated() {
        let conn = Connection::open_in_memory().unwrap();
        install(&conn).unwrap();
        conn.execute_batch("ALTER TABLE exercise ADD COLUMN is_favourite INTEGER DEFAULT 0;")
            .unwrap();
        verify(&conn).unwrap();
    }
}
