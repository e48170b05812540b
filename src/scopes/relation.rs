//! Query seam between scopes and the data store.

use crate::error::EvaluationError;
use crate::types::{ModelName, Record, RecordId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A materialized scope query.
///
/// Implemented by the ORM collaborator. Both probes run against the
/// current state of the data store, not against in-memory records.
pub trait Relation: Send {
    /// Probe the relation. An error means the query cannot be evaluated.
    fn exists(&self) -> Result<bool, EvaluationError>;

    /// Whether a row with this primary key is part of the relation.
    fn contains(&self, id: RecordId) -> Result<bool, EvaluationError>;
}

type RowFilter = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Thread-safe in-memory table of records.
///
/// Reference data store for embedding and tests: relations created by
/// [`MemoryTable::filter`] are evaluated lazily against the rows present
/// at probe time.
pub struct MemoryTable {
    model: ModelName,
    rows: RwLock<BTreeMap<RecordId, Record>>,
    next_id: AtomicU64,
}

impl MemoryTable {
    pub fn new(model: ModelName) -> Arc<Self> {
        Arc::new(Self {
            model,
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    /// Insert a record, assigning the next primary key when it has none.
    pub fn insert(&self, mut record: Record) -> Record {
        let id = match record.id {
            Some(id) => {
                self.next_id.fetch_max(id.0.saturating_add(1), Ordering::SeqCst);
                id
            }
            None => RecordId(self.next_id.fetch_add(1, Ordering::SeqCst)),
        };
        record.id = Some(id);
        self.rows.write().insert(id, record.clone());
        record
    }

    /// Overwrite the stored row with the record's current attributes.
    pub fn save(&self, record: &Record) {
        if let Some(id) = record.id {
            self.rows.write().insert(id, record.clone());
        }
    }

    pub fn delete(&self, id: RecordId) -> Option<Record> {
        self.rows.write().remove(&id)
    }

    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.rows.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Relation over the rows matching `filter`.
    pub fn filter<F>(self: &Arc<Self>, filter: F) -> Box<dyn Relation>
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Box::new(MemoryRelation {
            table: Arc::clone(self),
            filter: Arc::new(filter),
        })
    }

    /// Relation over every row.
    pub fn all(self: &Arc<Self>) -> Box<dyn Relation> {
        self.filter(|_| true)
    }
}

impl fmt::Debug for MemoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTable")
            .field("model", &self.model)
            .field("rows", &self.len())
            .finish()
    }
}

struct MemoryRelation {
    table: Arc<MemoryTable>,
    filter: RowFilter,
}

impl Relation for MemoryRelation {
    fn exists(&self) -> Result<bool, EvaluationError> {
        Ok(self.table.rows.read().values().any(|row| (self.filter)(row)))
    }

    fn contains(&self, id: RecordId) -> Result<bool, EvaluationError> {
        Ok(self
            .table
            .rows
            .read()
            .get(&id)
            .map(|row| (self.filter)(row))
            .unwrap_or(false))
    }
}
