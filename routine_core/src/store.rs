//! SQLite-backed store for one backup file.
//!
//! A `Store` owns its own connection. `load` pulls every table into id-keyed
//! maps; relationship queries run against those maps. Inserts go through a
//! single write transaction that stays open until `save_changes` commits it.
//! Dropping a store with pending changes rolls them back.

use crate::config::StoreConfig;
use crate::schema;
use crate::types::{
    Category, Exercise, Id, Record, Routine, RoutineSection, RoutineSectionExercise,
    RoutineSectionExerciseSet, Tables,
};
use crate::{Error, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
    tables: Tables,
}

impl Store {
    /// Open an existing backup for reading and writing
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self> {
        Self::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE, config)
    }

    /// Open an existing backup for reading only
    pub fn open_read_only(path: &Path, config: &StoreConfig) -> Result<Self> {
        Self::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY, config)
    }

    // No SQLITE_OPEN_CREATE: a backup is never created by opening it
    fn open_with_flags(path: &Path, flags: OpenFlags, config: &StoreConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
        conn.busy_timeout(config.busy_timeout())?;

        tracing::info!("Opened backup {:?}", path);
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            tables: Tables::default(),
        })
    }

    /// Wrap an already open connection (in-memory databases, tests)
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            path: None,
            tables: Tables::default(),
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Read every table into memory, replacing what was loaded before
    pub fn load(&mut self) -> Result<()> {
        schema::verify(&self.conn)?;

        let mut tables = Tables::default();
        self.load_table::<Category>(&mut tables)?;
        self.load_table::<Exercise>(&mut tables)?;
        self.load_table::<Routine>(&mut tables)?;
        self.load_table::<RoutineSection>(&mut tables)?;
        self.load_table::<RoutineSectionExercise>(&mut tables)?;
        self.load_table::<RoutineSectionExerciseSet>(&mut tables)?;

        tracing::info!(
            categories = tables.categories.len(),
            exercises = tables.exercises.len(),
            routines = tables.routines.len(),
            "Loaded backup"
        );
        self.tables = tables;
        Ok(())
    }

    fn load_table<R: Record>(&self, tables: &mut Tables) -> Result<()> {
        let sql = format!("SELECT {} FROM \"{}\"", R::COLUMNS.join(", "), R::TABLE);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let map = R::map_mut(tables);
        while let Some(row) = rows.next()? {
            let values = (0..R::COLUMNS.len())
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let record = R::load(&values)?;
            map.insert(record.id(), record);
        }

        tracing::debug!("Loaded {} rows from {}", map.len(), R::TABLE);
        Ok(())
    }

    // ========================================================================
    // Relationship queries
    // ========================================================================

    /// All routines, ordered by id
    pub fn routines(&self) -> Vec<&Routine> {
        self.tables.routines.values().collect()
    }

    pub fn list_sections(&self, routine: &Routine) -> Vec<&RoutineSection> {
        self.tables
            .routine_sections
            .values()
            .filter(|s| s.routine_id == routine.id)
            .collect()
    }

    pub fn list_exercises(&self, section: &RoutineSection) -> Vec<&RoutineSectionExercise> {
        self.tables
            .routine_exercises
            .values()
            .filter(|e| e.routine_section_id == section.id)
            .collect()
    }

    pub fn list_sets(
        &self,
        section_exercise: &RoutineSectionExercise,
    ) -> Vec<&RoutineSectionExerciseSet> {
        self.tables
            .routine_sets
            .values()
            .filter(|s| s.routine_section_exercise_id == section_exercise.id)
            .collect()
    }

    /// Distinct exercises used anywhere in the routine
    pub fn exercises_in_routine(&self, routine: &Routine) -> Result<Vec<&Exercise>> {
        let ids: BTreeSet<Id> = self
            .list_sections(routine)
            .into_iter()
            .flat_map(|section| self.list_exercises(section))
            .map(|e| e.exercise_id)
            .collect();

        ids.into_iter()
            .map(|id| self.tables.require::<Exercise>(id))
            .collect()
    }

    /// Distinct categories of the exercises used in the routine
    pub fn categories_in_routine(&self, routine: &Routine) -> Result<Vec<&Category>> {
        let ids: BTreeSet<Id> = self
            .exercises_in_routine(routine)?
            .into_iter()
            .map(|e| e.category_id)
            .collect();

        ids.into_iter()
            .map(|id| self.tables.require::<Category>(id))
            .collect()
    }

    // ========================================================================
    // Inserts
    // ========================================================================

    /// Insert a copy of `record` and return the copy with its new id
    ///
    /// Every foreign key must already point at a record of this store.
    pub fn add<R: Record>(&mut self, record: &R) -> Result<R> {
        record.check_references(&self.tables)?;
        self.begin()?;

        let columns = &R::COLUMNS[1..];
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            R::TABLE,
            columns.join(", "),
            placeholders
        );

        let mut inserted = record.clone();
        self.conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(inserted.pack()))?;

        let id = self.conn.last_insert_rowid();
        inserted.set_id(id);
        R::map_mut(&mut self.tables).insert(id, inserted.clone());

        tracing::debug!("Inserted {} row {}", R::TABLE, id);
        Ok(inserted)
    }

    pub fn add_category(&mut self, category: &Category) -> Result<Category> {
        self.add(category)
    }

    pub fn add_exercise(&mut self, exercise: &Exercise) -> Result<Exercise> {
        self.add(exercise)
    }

    pub fn add_routine(&mut self, routine: &Routine) -> Result<Routine> {
        self.add(routine)
    }

    pub fn add_routine_section(&mut self, section: &RoutineSection) -> Result<RoutineSection> {
        self.add(section)
    }

    pub fn add_routine_section_exercise(
        &mut self,
        section_exercise: &RoutineSectionExercise,
    ) -> Result<RoutineSectionExercise> {
        self.add(section_exercise)
    }

    pub fn add_routine_section_exercise_set(
        &mut self,
        set: &RoutineSectionExerciseSet,
    ) -> Result<RoutineSectionExerciseSet> {
        self.add(set)
    }

    // ========================================================================
    // Transaction control
    // ========================================================================

    fn begin(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
            tracing::debug!("Opened write transaction");
        }
        Ok(())
    }

    /// Whether inserts are waiting for `save_changes`
    pub fn has_pending_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Make every pending insert durable
    pub fn save_changes(&mut self) -> Result<()> {
        if self.has_pending_changes() {
            self.conn.execute_batch("COMMIT")?;
            tracing::info!("Committed changes to {:?}", self.path);
        } else {
            tracing::debug!("No pending changes to commit");
        }
        Ok(())
    }

    /// Roll back pending inserts and reload the in-memory maps
    pub fn discard_changes(&mut self) -> Result<()> {
        if self.has_pending_changes() {
            self.conn.execute_batch("ROLLBACK")?;
            tracing::info!("Rolled back pending changes to {:?}", self.path);
            self.load()?;
        }
        Ok(())
    }
}
