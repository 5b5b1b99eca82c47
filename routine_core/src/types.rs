//! Record model for the backup tables a routine touches.
//!
//! This module defines:
//! - The `Record` trait shared by the six entity kinds
//! - Reference data (categories, exercises)
//! - The routine tree (routine, sections, section exercises, sets)
//! - `Tables`, the id-keyed maps a store keeps in memory
//!
//! Every record loads from and packs into a positional tuple of SQLite values
//! in the column order of its table. `load` and `pack` are inverses modulo the
//! leading id column.

use crate::{Error, Result};
use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Row id assigned by the backing store
pub type Id = i64;

// ============================================================================
// Record Trait
// ============================================================================

/// Common operations of every entity kind
///
/// `Default` is the empty record and `Clone` the independent copy (id
/// included). A clone is only fit for another store once its foreign keys
/// have been rewritten; the store then assigns it a fresh id.
pub trait Record: Clone + Default + std::fmt::Debug {
    /// Backing table name
    const TABLE: &'static str;

    /// Column order of the backing table, id first
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Id;

    fn set_id(&mut self, id: Id);

    /// Build a record from a full positional row (id included)
    fn load(values: &[Value]) -> Result<Self>;

    /// Insertable column values, id excluded
    fn pack(&self) -> Vec<Value>;

    /// Fail if any foreign key does not resolve within `tables`
    fn check_references(&self, tables: &Tables) -> Result<()>;

    /// The id-keyed map holding this kind
    fn map(tables: &Tables) -> &BTreeMap<Id, Self>;

    fn map_mut(tables: &mut Tables) -> &mut BTreeMap<Id, Self>;
}

/// Records that are reconciled across stores by name
pub trait Named {
    fn name(&self) -> &str;
}

/// In-memory copy of every table, keyed by id
#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub categories: BTreeMap<Id, Category>,
    pub exercises: BTreeMap<Id, Exercise>,
    pub routines: BTreeMap<Id, Routine>,
    pub routine_sections: BTreeMap<Id, RoutineSection>,
    pub routine_exercises: BTreeMap<Id, RoutineSectionExercise>,
    pub routine_sets: BTreeMap<Id, RoutineSectionExerciseSet>,
}

impl Tables {
    /// Look up a record of any kind by id
    pub fn get<R: Record>(&self, id: Id) -> Option<&R> {
        R::map(self).get(&id)
    }

    /// Look up a record of any kind by id, failing if it is absent
    pub fn require<R: Record>(&self, id: Id) -> Result<&R> {
        self.get(id).ok_or_else(|| Error::UnknownRecord {
            table: R::TABLE,
            id,
        })
    }
}

fn ensure_present<R: Record>(
    tables: &Tables,
    owner: &'static str,
    column: &'static str,
    id: Id,
) -> Result<()> {
    if R::map(tables).contains_key(&id) {
        Ok(())
    } else {
        Err(Error::MissingReference {
            table: owner,
            column,
            id,
        })
    }
}

// ============================================================================
// Positional Decoding
// ============================================================================

/// Cursor over a positional row, checked against the record's column list
struct Fields<'a> {
    table: &'static str,
    columns: &'static [&'static str],
    values: &'a [Value],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new<R: Record>(values: &'a [Value]) -> Result<Self> {
        if values.len() != R::COLUMNS.len() {
            return Err(Error::Decode {
                table: R::TABLE,
                message: format!(
                    "expected {} columns, got {}",
                    R::COLUMNS.len(),
                    values.len()
                ),
            });
        }

        Ok(Self {
            table: R::TABLE,
            columns: R::COLUMNS,
            values,
            pos: 0,
        })
    }

    fn next(&mut self) -> (&'static str, &'a Value) {
        let column = self.columns[self.pos];
        let value = &self.values[self.pos];
        self.pos += 1;
        (column, value)
    }

    fn mismatch(&self, column: &str, expected: &str, found: &Value) -> Error {
        Error::Decode {
            table: self.table,
            message: format!(
                "column {}: expected {}, found {}",
                column,
                expected,
                found.data_type()
            ),
        }
    }

    fn integer(&mut self) -> Result<i64> {
        match self.next() {
            (_, Value::Integer(v)) => Ok(*v),
            (column, other) => Err(self.mismatch(column, "integer", other)),
        }
    }

    fn opt_integer(&mut self) -> Result<Option<i64>> {
        match self.next() {
            (_, Value::Null) => Ok(None),
            (_, Value::Integer(v)) => Ok(Some(*v)),
            (column, other) => Err(self.mismatch(column, "integer or null", other)),
        }
    }

    // SQLite stores whole-number reals as integers under numeric affinity
    fn real(&mut self) -> Result<f64> {
        match self.next() {
            (_, Value::Real(v)) => Ok(*v),
            (_, Value::Integer(v)) => Ok(*v as f64),
            (column, other) => Err(self.mismatch(column, "real", other)),
        }
    }

    fn opt_real(&mut self) -> Result<Option<f64>> {
        match self.next() {
            (_, Value::Null) => Ok(None),
            (_, Value::Real(v)) => Ok(Some(*v)),
            (_, Value::Integer(v)) => Ok(Some(*v as f64)),
            (column, other) => Err(self.mismatch(column, "real or null", other)),
        }
    }

    fn text(&mut self) -> Result<String> {
        match self.next() {
            (_, Value::Text(v)) => Ok(v.clone()),
            (column, other) => Err(self.mismatch(column, "text", other)),
        }
    }

    fn opt_text(&mut self) -> Result<Option<String>> {
        match self.next() {
            (_, Value::Null) => Ok(None),
            (_, Value::Text(v)) => Ok(Some(v.clone())),
            (column, other) => Err(self.mismatch(column, "text or null", other)),
        }
    }
}

// ============================================================================
// Reference Data
// ============================================================================

/// A named grouping of exercises (e.g., "Chest")
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Category {
    pub id: Id,
    pub name: String,
    pub colour: i64,
    pub sort_order: i64,
}

impl Record for Category {
    const TABLE: &'static str = "Category";
    const COLUMNS: &'static [&'static str] = &["id", "name", "colour", "sort_order"];

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn load(values: &[Value]) -> Result<Self> {
        let mut f = Fields::new::<Self>(values)?;
        Ok(Self {
            id: f.integer()?,
            name: f.text()?,
            colour: f.integer()?,
            sort_order: f.integer()?,
        })
    }

    fn pack(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.colour.into(),
            self.sort_order.into(),
        ]
    }

    fn check_references(&self, _tables: &Tables) -> Result<()> {
        Ok(())
    }

    fn map(tables: &Tables) -> &BTreeMap<Id, Self> {
        &tables.categories
    }

    fn map_mut(tables: &mut Tables) -> &mut BTreeMap<Id, Self> {
        &mut tables.categories
    }
}

impl Named for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

/// An exercise definition (e.g., "Bench Press")
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Exercise {
    pub id: Id,
    pub name: String,
    pub category_id: Id,
    /// Measurement type code
    pub exercise_type_id: i64,
    pub notes: Option<String>,
    pub weight_increment: Option<f64>,
    pub default_graph_id: Option<i64>,
    pub default_rest_time: Option<i64>,
}

impl Record for Exercise {
    const TABLE: &'static str = "exercise";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "category_id",
        "exercise_type_id",
        "notes",
        "weight_increment",
        "default_graph_id",
        "default_rest_time",
    ];

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn load(values: &[Value]) -> Result<Self> {
        let mut f = Fields::new::<Self>(values)?;
        Ok(Self {
            id: f.integer()?,
            name: f.text()?,
            category_id: f.integer()?,
            exercise_type_id: f.integer()?,
            notes: f.opt_text()?,
            weight_increment: f.opt_real()?,
            default_graph_id: f.opt_integer()?,
            default_rest_time: f.opt_integer()?,
        })
    }

    fn pack(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.category_id.into(),
            self.exercise_type_id.into(),
            self.notes.clone().into(),
            self.weight_increment.into(),
            self.default_graph_id.into(),
            self.default_rest_time.into(),
        ]
    }

    fn check_references(&self, tables: &Tables) -> Result<()> {
        ensure_present::<Category>(tables, Self::TABLE, "category_id", self.category_id)
    }

    fn map(tables: &Tables) -> &BTreeMap<Id, Self> {
        &tables.exercises
    }

    fn map_mut(tables: &mut Tables) -> &mut BTreeMap<Id, Self> {
        &mut tables.exercises
    }
}

impl Named for Exercise {
    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Routine Tree
// ============================================================================

/// A named workout template, the unit selected for import
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Routine {
    pub id: Id,
    pub name: String,
    pub notes: Option<String>,
}

impl Record for Routine {
    const TABLE: &'static str = "Routine";
    const COLUMNS: &'static [&'static str] = &["id", "name", "notes"];

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn load(values: &[Value]) -> Result<Self> {
        let mut f = Fields::new::<Self>(values)?;
        Ok(Self {
            id: f.integer()?,
            name: f.text()?,
            notes: f.opt_text()?,
        })
    }

    fn pack(&self) -> Vec<Value> {
        vec![self.name.clone().into(), self.notes.clone().into()]
    }

    fn check_references(&self, _tables: &Tables) -> Result<()> {
        Ok(())
    }

    fn map(tables: &Tables) -> &BTreeMap<Id, Self> {
        &tables.routines
    }

    fn map_mut(tables: &mut Tables) -> &mut BTreeMap<Id, Self> {
        &mut tables.routines
    }
}

impl Named for Routine {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A subdivision of a routine (a day or phase)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoutineSection {
    pub id: Id,
    pub routine_id: Id,
    pub name: String,
    pub sort_number: i64,
}

impl Record for RoutineSection {
    const TABLE: &'static str = "RoutineSection";
    const COLUMNS: &'static [&'static str] = &["id", "routine_id", "name", "sort_number"];

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn load(values: &[Value]) -> Result<Self> {
        let mut f = Fields::new::<Self>(values)?;
        Ok(Self {
            id: f.integer()?,
            routine_id: f.integer()?,
            name: f.text()?,
            sort_number: f.integer()?,
        })
    }

    fn pack(&self) -> Vec<Value> {
        vec![
            self.routine_id.into(),
            self.name.clone().into(),
            self.sort_number.into(),
        ]
    }

    fn check_references(&self, tables: &Tables) -> Result<()> {
        ensure_present::<Routine>(tables, Self::TABLE, "routine_id", self.routine_id)
    }

    fn map(tables: &Tables) -> &BTreeMap<Id, Self> {
        &tables.routine_sections
    }

    fn map_mut(tables: &mut Tables) -> &mut BTreeMap<Id, Self> {
        &mut tables.routine_sections
    }
}

/// One exercise placed in a section
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoutineSectionExercise {
    pub id: Id,
    pub routine_section_id: Id,
    pub exercise_id: Id,
    pub sort_order: i64,
}

impl Record for RoutineSectionExercise {
    const TABLE: &'static str = "RoutineSectionExercise";
    const COLUMNS: &'static [&'static str] =
        &["id", "routine_section_id", "exercise_id", "sort_order"];

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn load(values: &[Value]) -> Result<Self> {
        let mut f = Fields::new::<Self>(values)?;
        Ok(Self {
            id: f.integer()?,
            routine_section_id: f.integer()?,
            exercise_id: f.integer()?,
            sort_order: f.integer()?,
        })
    }

    fn pack(&self) -> Vec<Value> {
        vec![
            self.routine_section_id.into(),
            self.exercise_id.into(),
            self.sort_order.into(),
        ]
    }

    fn check_references(&self, tables: &Tables) -> Result<()> {
        ensure_present::<RoutineSection>(
            tables,
            Self::TABLE,
            "routine_section_id",
            self.routine_section_id,
        )?;
        ensure_present::<Exercise>(tables, Self::TABLE, "exercise_id", self.exercise_id)
    }

    fn map(tables: &Tables) -> &BTreeMap<Id, Self> {
        &tables.routine_exercises
    }

    fn map_mut(tables: &mut Tables) -> &mut BTreeMap<Id, Self> {
        &mut tables.routine_exercises
    }
}

/// One planned set of a section exercise
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoutineSectionExerciseSet {
    pub id: Id,
    pub routine_section_exercise_id: Id,
    pub metric_weight: f64,
    pub reps: i64,
    pub sort_order: i64,
    pub distance: f64,
    pub duration_seconds: i64,
    /// Unit code
    pub unit: i64,
}

impl Record for RoutineSectionExerciseSet {
    const TABLE: &'static str = "RoutineSectionExerciseSet";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "routine_section_exercise_id",
        "metric_weight",
        "reps",
        "sort_order",
        "distance",
        "duration_seconds",
        "unit",
    ];

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    fn load(values: &[Value]) -> Result<Self> {
        let mut f = Fields::new::<Self>(values)?;
        Ok(Self {
            id: f.integer()?,
            routine_section_exercise_id: f.integer()?,
            metric_weight: f.real()?,
            reps: f.integer()?,
            sort_order: f.integer()?,
            distance: f.real()?,
            duration_seconds: f.integer()?,
            unit: f.integer()?,
        })
    }

    fn pack(&self) -> Vec<Value> {
        vec![
            self.routine_section_exercise_id.into(),
            self.metric_weight.into(),
            self.reps.into(),
            self.sort_order.into(),
            self.distance.into(),
            self.duration_seconds.into(),
            self.unit.into(),
        ]
    }

    fn check_references(&self, tables: &Tables) -> Result<()> {
        ensure_present::<RoutineSectionExercise>(
            tables,
            Self::TABLE,
            "routine_section_exercise_id",
            self.routine_section_exercise_id,
        )
    }

    fn map(tables: &Tables) -> &BTreeMap<Id, Self> {
        &tables.routine_sets
    }

    fn map_mut(tables: &mut Tables) -> &mut BTreeMap<Id, Self> {
        &mut tables.routine_sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Re-attach the id that `pack` leaves out
    fn with_id(id: Id, packed: Vec<Value>) -> Vec<Value> {
        let mut row = vec![Value::Integer(id)];
        row.extend(packed);
        row
    }

    #[test]
    fn test_exercise_pack_load_roundtrip_with_nulls() {
        let exercise = Exercise {
            id: 42,
            name: "Bench Press".into(),
            category_id: 7,
            exercise_type_id: 0,
            notes: None,
            weight_increment: Some(2.5),
            default_graph_id: None,
            default_rest_time: Some(90),
        };

        let packed = exercise.pack();
        assert_eq!(packed.len(), Exercise::COLUMNS.len() - 1);

        let loaded = Exercise::load(&with_id(42, packed)).unwrap();
        assert_eq!(loaded, exercise);
    }

    #[test]
    fn test_set_pack_load_roundtrip() {
        let set = RoutineSectionExerciseSet {
            id: 3,
            routine_section_exercise_id: 9,
            metric_weight: 100.0,
            reps: 5,
            sort_order: 1,
            distance: 0.0,
            duration_seconds: 0,
            unit: 0,
        };

        let loaded = RoutineSectionExerciseSet::load(&with_id(3, set.pack())).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_category_pack_load_roundtrip() {
        let category = Category {
            id: 4,
            name: "Chest".into(),
            colour: 0xff0000,
            sort_order: 3,
        };

        let loaded = Category::load(&with_id(4, category.pack())).unwrap();
        assert_eq!(loaded, category);
    }

    #[test]
    fn test_routine_pack_load_roundtrip_with_notes() {
        let routine = Routine {
            id: 8,
            name: "Push Day".into(),
            notes: Some("Heavy week".into()),
        };

        let loaded = Routine::load(&with_id(8, routine.pack())).unwrap();
        assert_eq!(loaded, routine);
    }

    #[test]
    fn test_section_pack_load_roundtrip() {
        let section = RoutineSection {
            id: 11,
            routine_id: 8,
            name: "Day B".into(),
            sort_number: 2,
        };

        let loaded = RoutineSection::load(&with_id(11, section.pack())).unwrap();
        assert_eq!(loaded, section);
    }

    #[test]
    fn test_section_exercise_pack_load_roundtrip() {
        let section_exercise = RoutineSectionExercise {
            id: 21,
            routine_section_id: 11,
            exercise_id: 42,
            sort_order: 5,
        };

        let loaded =
            RoutineSectionExercise::load(&with_id(21, section_exercise.pack())).unwrap();
        assert_eq!(loaded, section_exercise);
    }

    #[test]
    fn test_routine_notes_may_be_null() {
        let row = vec![Value::Integer(1), Value::Text("Push Day".into()), Value::Null];
        let routine = Routine::load(&row).unwrap();
        assert_eq!(routine.name, "Push Day");
        assert_eq!(routine.notes, None);
        assert_eq!(routine.pack()[1], Value::Null);
    }

    #[test]
    fn test_integer_accepted_for_real_column() {
        let row = vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(80),
            Value::Integer(8),
            Value::Integer(0),
            Value::Integer(0),
            Value::Integer(0),
            Value::Integer(0),
        ];
        let set = RoutineSectionExerciseSet::load(&row).unwrap();
        assert_eq!(set.metric_weight, 80.0);
    }

    #[test]
    fn test_load_rejects_wrong_arity() {
        let row = vec![Value::Integer(1), Value::Text("Chest".into())];
        let err = Category::load(&row).unwrap_err();
        assert!(matches!(err, Error::Decode { table: "Category", .. }));
    }

    #[test]
    fn test_load_rejects_wrong_type() {
        let row = vec![
            Value::Integer(1),
            Value::Integer(5),
            Value::Integer(0),
            Value::Integer(0),
        ];
        let err = Category::load(&row).unwrap_err();
        assert!(err.to_string().contains("column name"));
    }

    #[test]
    fn test_clone_keeps_id() {
        let category = Category {
            id: 12,
            name: "Legs".into(),
            colour: 0xff00ff,
            sort_order: 2,
        };
        let copy = category.clone();
        assert_eq!(copy.id(), 12);
        assert_eq!(copy, category);
    }

    #[test]
    fn test_check_references() {
        let mut tables = Tables::default();
        let exercise = Exercise {
            id: 1,
            name: "Squat".into(),
            category_id: 4,
            ..Default::default()
        };

        let err = exercise.check_references(&tables).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingReference {
                table: "exercise",
                column: "category_id",
                id: 4
            }
        ));

        tables.categories.insert(
            4,
            Category {
                id: 4,
                name: "Legs".into(),
                ..Default::default()
            },
        );
        assert!(exercise.check_references(&tables).is_ok());
    }

    #[test]
    fn test_tables_require_unknown_id() {
        let tables = Tables::default();
        let err = tables.require::<Routine>(99).unwrap_err();
        assert!(matches!(err, Error::UnknownRecord { table: "Routine", id: 99 }));
    }
}
