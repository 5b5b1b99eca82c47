//! Reconciling importer for copying one routine between backups.
//!
//! The import runs in two phases:
//! 1. **Reference data**: every category and exercise the routine uses is
//!    matched to a destination record by exact name, or chosen/created with
//!    the operator's help when no name matches.
//! 2. **Routine tree**: routine, sections, section exercises and sets are
//!    copied top-down, each foreign key rewritten to the destination id of its
//!    parent or of the reconciled exercise.
//!
//! Nothing is committed here; the caller decides whether to save or discard
//! the destination's pending changes.

use crate::decision::{self, Decider, Question, Selection, CREATE_NEW};
use crate::store::Store;
use crate::types::{
    Category, Exercise, Id, Named, Record, Routine, RoutineSection, RoutineSectionExercise,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many reference records ended up in each state
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileCounts {
    /// Found by name in the destination
    pub matched: usize,
    /// Picked by the operator from the destination list
    pub chosen: usize,
    /// Inserted from the source definition
    pub created: usize,
}

impl ReconcileCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Matched => self.matched += 1,
            Outcome::Chosen => self.chosen += 1,
            Outcome::Created => self.created += 1,
        }
    }
}

/// What one import wrote to the destination
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportSummary {
    /// Id of the new routine in the destination
    pub routine_id: Id,
    pub routine_name: String,
    pub categories: ReconcileCounts,
    pub exercises: ReconcileCounts,
    pub sections: usize,
    pub section_exercises: usize,
    pub sets: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Matched,
    Chosen,
    Created,
}

/// Copies routines from `source` into `destination`
pub struct RoutineImporter<'a, D> {
    source: &'a Store,
    destination: &'a mut Store,
    decider: D,
    create_missing: bool,
}

impl<'a, D: Decider> RoutineImporter<'a, D> {
    pub fn new(source: &'a Store, destination: &'a mut Store, decider: D) -> Self {
        Self {
            source,
            destination,
            decider,
            create_missing: false,
        }
    }

    /// Create unmatched reference data without asking the operator
    pub fn create_missing(mut self, create_missing: bool) -> Self {
        self.create_missing = create_missing;
        self
    }

    /// Let the operator pick a source routine, then import it
    pub fn select_and_import(&mut self) -> Result<ImportSummary> {
        let source = self.source;
        let routines = source.routines();
        if routines.is_empty() {
            return Err(Error::Selection("source backup has no routines".into()));
        }

        let question = Question {
            title: "Available routines".into(),
            prompt: "Routine to import".into(),
            options: routines.iter().map(|r| r.name().to_string()).collect(),
            create_sentinel: None,
        };

        let routine = match decision::select(&mut self.decider, &question)? {
            Selection::Existing(index) => routines[index],
            Selection::CreateNew => {
                return Err(Error::Selection("a routine must be picked from the list".into()))
            }
        };

        self.import_routine(routine)
    }

    /// Copy `routine` and everything below it into the destination
    pub fn import_routine(&mut self, routine: &Routine) -> Result<ImportSummary> {
        let source = self.source;
        tracing::info!("Importing routine {:?} (id {})", routine.name, routine.id);

        let mut summary = ImportSummary::default();

        let mut categories: HashMap<Id, Id> = HashMap::new();
        for category in source.categories_in_routine(routine)? {
            let (target, outcome) = self.reconcile(category)?;
            summary.categories.record(outcome);
            categories.insert(category.id, target.id);
        }

        let mut exercises: HashMap<Id, Id> = HashMap::new();
        for exercise in source.exercises_in_routine(routine)? {
            let mut candidate = exercise.clone();
            candidate.category_id = mapped(&categories, Category::TABLE, exercise.category_id)?;

            let (target, outcome) = self.reconcile(&candidate)?;
            summary.exercises.record(outcome);
            exercises.insert(exercise.id, target.id);
        }

        let new_routine = self.destination.add_routine(routine)?;
        summary.routine_id = new_routine.id;
        summary.routine_name = new_routine.name.clone();

        for section in source.list_sections(routine) {
            self.copy_section(section, new_routine.id, &exercises, &mut summary)?;
        }

        tracing::info!(
            routine_id = summary.routine_id,
            sections = summary.sections,
            section_exercises = summary.section_exercises,
            sets = summary.sets,
            "Imported routine {:?}",
            summary.routine_name
        );
        Ok(summary)
    }

    fn copy_section(
        &mut self,
        section: &RoutineSection,
        routine_id: Id,
        exercises: &HashMap<Id, Id>,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let source = self.source;

        let mut copy = section.clone();
        copy.routine_id = routine_id;
        let new_section = self.destination.add_routine_section(&copy)?;
        summary.sections += 1;

        for section_exercise in source.list_exercises(section) {
            let mut copy = section_exercise.clone();
            copy.routine_section_id = new_section.id;
            copy.exercise_id = mapped(exercises, Exercise::TABLE, section_exercise.exercise_id)?;
            let new_section_exercise = self.destination.add_routine_section_exercise(&copy)?;
            summary.section_exercises += 1;

            self.copy_sets(section_exercise, &new_section_exercise, summary)?;
        }

        Ok(())
    }

    fn copy_sets(
        &mut self,
        from: &RoutineSectionExercise,
        to: &RoutineSectionExercise,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        for set in self.source.list_sets(from) {
            let mut copy = set.clone();
            copy.routine_section_exercise_id = to.id;
            self.destination.add_routine_section_exercise_set(&copy)?;
            summary.sets += 1;
        }
        Ok(())
    }

    /// Find the destination record standing in for `wanted`, creating it if needed
    ///
    /// `wanted` must already carry destination foreign keys.
    fn reconcile<R: Record + Named>(&mut self, wanted: &R) -> Result<(R, Outcome)> {
        let label = R::TABLE.to_lowercase();

        let existing = R::map(self.destination.tables())
            .values()
            .find(|r| r.name() == wanted.name())
            .cloned();
        if let Some(found) = existing {
            tracing::debug!("Matched {} {:?} to id {}", label, wanted.name(), found.id());
            return Ok((found, Outcome::Matched));
        }

        if self.create_missing {
            let created = self.destination.add(wanted)?;
            tracing::info!("Created {} {:?} as id {}", label, wanted.name(), created.id());
            return Ok((created, Outcome::Created));
        }

        let mut candidates: Vec<R> = R::map(self.destination.tables()).values().cloned().collect();
        let question = Question {
            title: format!("No {} named {:?} in destination", label, wanted.name()),
            prompt: format!("Use existing {} ({} = create new)", label, CREATE_NEW),
            options: candidates.iter().map(|c| c.name().to_string()).collect(),
            create_sentinel: Some(CREATE_NEW),
        };

        match decision::select(&mut self.decider, &question)? {
            Selection::Existing(index) => {
                let chosen = candidates.swap_remove(index);
                tracing::info!(
                    "Operator mapped {} {:?} to {:?} (id {})",
                    label,
                    wanted.name(),
                    chosen.name(),
                    chosen.id()
                );
                Ok((chosen, Outcome::Chosen))
            }
            Selection::CreateNew => {
                let created = self.destination.add(wanted)?;
                tracing::info!("Created {} {:?} as id {}", label, wanted.name(), created.id());
                Ok((created, Outcome::Created))
            }
        }
    }
}

fn mapped(map: &HashMap<Id, Id>, table: &'static str, id: Id) -> Result<Id> {
    map.get(&id)
        .copied()
        .ok_or(Error::UnknownRecord { table, id })
}
