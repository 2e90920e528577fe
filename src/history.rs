//! Session state: the current dataset and the snapshots that led to it.
//!
//! The log only grows through [`Workspace::push`] / [`Workspace::apply`] and
//! only shrinks through [`Workspace::undo`], which never removes the first
//! snapshot. There is no redo.

use chrono::{DateTime, Utc};
use log::debug;
use uuid::Uuid;

use crate::{
    data::{Dataset, Row, leading_columns},
    error::{EngineError, EngineResult},
    profile::{self, DatasetProfile},
};

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub dataset: Dataset,
}

impl Snapshot {
    fn new(dataset: Dataset, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            description: description.into(),
            dataset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    entries: Vec<Snapshot>,
}

impl Workspace {
    pub fn new(dataset: Dataset) -> Self {
        let description = format!("Imported {}", dataset.name);
        Self {
            entries: vec![Snapshot::new(dataset, description)],
        }
    }

    /// Discards every snapshot and starts over from `dataset`.
    pub fn init(&mut self, dataset: Dataset) {
        *self = Workspace::new(dataset);
    }

    pub fn current(&self) -> &Dataset {
        &self.latest().dataset
    }

    pub fn latest(&self) -> &Snapshot {
        // `entries` is never empty: construction seeds it and undo keeps the first.
        &self.entries[self.entries.len() - 1]
    }

    pub fn push(&mut self, dataset: Dataset, description: impl Into<String>) {
        let snapshot = Snapshot::new(dataset, description);
        debug!(
            "History +1 ({}): {} row(s) after '{}'",
            self.entries.len() + 1,
            snapshot.dataset.len(),
            snapshot.description
        );
        self.entries.push(snapshot);
    }

    /// Records `rows` as the next state. Columns follow the first new row,
    /// falling back to the current columns when `rows` is empty.
    pub fn apply(&mut self, rows: Vec<Row>, description: impl Into<String>) -> &Dataset {
        let current = self.current();
        let columns = if rows.is_empty() {
            current.columns.clone()
        } else {
            leading_columns(&rows)
        };
        let dataset = Dataset::new(current.name.clone(), columns, rows);
        self.push(dataset, description);
        self.current()
    }

    pub fn undo(&mut self) -> EngineResult<&Dataset> {
        if self.entries.len() <= 1 {
            return Err(EngineError::NothingToUndo);
        }
        if let Some(popped) = self.entries.pop() {
            debug!("Undid '{}'", popped.description);
        }
        Ok(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn profile(&self) -> DatasetProfile {
        profile::profile(&self.current().rows)
    }
}
