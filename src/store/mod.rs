//! Remote record-store boundary.
//!
//! The tabular store is external and authoritative; the core only talks to it
//! through the [`RecordStore`] trait (select / create / destroy) and never
//! caches records. The production implementation is the Airtable REST client
//! in [`airtable`]; tests substitute in-memory fakes.

pub mod airtable;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StoreError;

pub use airtable::AirtableStore;

/// The tables the bot touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Meals,
    Log,
    Vitals,
}

impl Table {
    /// Table name as the store spells it.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Meals => "Meals",
            Table::Log => "Log",
            Table::Vitals => "Vitals",
        }
    }
}

/// A record as returned by the store: an opaque id plus named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Record id, for destroy calls.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value as text.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Field value as a number.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }
}

/// Sort direction for select queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Parameters for a select call. Built with the chained setters below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub view: Option<String>,
    pub filter_by_formula: Option<String>,
    pub sort: Option<(String, SortDirection)>,
    pub max_records: Option<u32>,
    pub fields: Vec<String>,
}

impl SelectQuery {
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn filter(mut self, formula: impl Into<String>) -> Self {
        self.filter_by_formula = Some(formula.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    pub fn max_records(mut self, max: u32) -> Self {
        self.max_records = Some(max);
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}

/// Trait every record store must implement.
///
/// One store operation per command; calls are sequential, no fan-out, and no
/// optimistic concurrency control — racing commands may both act on a
/// since-deleted record and see a store-level error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch records from `table` matching `query`.
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<Record>, StoreError>;

    /// Create a record in `table` with the given fields.
    async fn create(&self, table: Table, fields: Map<String, Value>) -> Result<Record, StoreError>;

    /// Delete the record with `id` from `table`.
    async fn destroy(&self, table: Table, id: &str) -> Result<(), StoreError>;
}
