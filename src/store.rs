// 📋 Record Store - the in-memory table behind the dashboard
//
// Ordered, keyed by record id. Records are edited in place and the whole set
// can be restored to the built-in defaults. Nothing is ever added or removed
// one at a time.

use crate::error::{BudgetError, BudgetResult};
use crate::record::{BudgetRecord, Field};

/// The universities shown on first launch and after a reset
pub fn default_records() -> Vec<BudgetRecord> {
    vec![
        BudgetRecord::new("DU", "Dhaka University", 10_354_500_000.0, 37_018),
        BudgetRecord::new("RU", "Rajshahi University", 5_643_400_000.0, 35_000),
        BudgetRecord::new("JNU", "Jagannath University", 2_978_200_000.0, 12_000),
        BudgetRecord::new("JU", "Jahangirnagar University", 3_233_500_000.0, 19_000),
        BudgetRecord::new("KU", "Khulna University", 0.0, 10_000),
        BudgetRecord::new("CU", "Chittagong University", 0.0, 25_000),
    ]
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<BudgetRecord>,
}

impl RecordStore {
    /// Create new store with the default universities
    pub fn new() -> Self {
        RecordStore {
            records: default_records(),
        }
    }

    /// Start from a custom record set; `reset` still goes back to the defaults
    pub fn with_records(records: Vec<BudgetRecord>) -> Self {
        RecordStore { records }
    }

    pub fn records(&self) -> &[BudgetRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&BudgetRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Update one field of the record with `id` from raw text
    pub fn update_field(&mut self, id: &str, field: Field, raw: &str) -> BudgetResult<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| BudgetError::UnknownRecord(id.to_string()))?;

        record.apply(field, raw);
        tracing::debug!(id, field = field.as_str(), value = raw, "record updated");
        Ok(())
    }

    /// Restore the default record set
    pub fn reset(&mut self) {
        self.records = default_records();
        tracing::info!(records = self.records.len(), "records reset to defaults");
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
