// Derived per-student figures for the table, chart and summary

use crate::record::BudgetRecord;
use serde::{Serialize, Serializer};

/// Budget per enrolled student, rounded; 0 when there are no students
///
/// Whole-valued `f64`, not bounded by `u64`.
pub fn per_student(record: &BudgetRecord) -> f64 {
    if record.students == 0 {
        return 0.0;
    }
    let value = (record.budget / record.students as f64).round();
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Serialize a whole-valued amount as an integer when it fits in `u64`
pub fn serialize_whole<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && *value >= 0.0 && *value < u64::MAX as f64 {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// One bar of the comparison chart (keyed by short id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    #[serde(serialize_with = "serialize_whole")]
    pub per: f64,
}

pub fn chart_points(records: &[BudgetRecord]) -> Vec<ChartPoint> {
    records
        .iter()
        .map(|r| ChartPoint {
            name: r.id.clone(),
            per: per_student(r),
        })
        .collect()
}

/// One line of the summary panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_whole")]
    pub per_student: f64,
}

pub fn summary(records: &[BudgetRecord]) -> Vec<SummaryLine> {
    records
        .iter()
        .map(|r| SummaryLine {
            id: r.id.clone(),
            name: r.name.clone(),
            per_student: per_student(r),
        })
        .collect()
}
