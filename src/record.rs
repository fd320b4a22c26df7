// 🎓 Budget Record - one university row of the dashboard
//
// "Identifier is IDENTITY (never changes), name/budget/students are VALUES"
//
// Edits arrive as raw text from the table (or the API) and are coerced here,
// so the rest of the crate only ever sees clean non-negative numbers.

use serde::{Deserialize, Serialize};

// ============================================================================
// BUDGET RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    /// Short stable key ("DU", "RU", ...) - NEVER changes
    pub id: String,

    /// Display label, user-editable
    pub name: String,

    /// Annual budget in Taka
    #[serde(default)]
    pub budget: f64,

    /// Enrolled regular students
    #[serde(default)]
    pub students: u64,
}

impl BudgetRecord {
    pub fn new(id: &str, name: &str, budget: f64, students: u64) -> Self {
        BudgetRecord {
            id: id.to_string(),
            name: name.to_string(),
            budget: sanitize_amount(budget),
            students,
        }
    }

    /// Apply a raw text edit to one field
    pub fn apply(&mut self, field: Field, raw: &str) {
        match field {
            Field::Name => self.name = raw.to_string(),
            Field::Budget => self.budget = coerce_amount(raw),
            Field::Students => self.students = coerce_count(raw),
        }
    }

    /// Current value of a field rendered as editable text
    pub fn field_text(&self, field: Field) -> String {
        match field {
            Field::Name => self.name.clone(),
            Field::Budget if self.budget == 0.0 => String::new(),
            Field::Budget => self.budget.to_string(),
            Field::Students if self.students == 0 => String::new(),
            Field::Students => self.students.to_string(),
        }
    }
}

// ============================================================================
// EDITABLE FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Budget,
    Students,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Budget, Field::Students];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Budget => "budget",
            Field::Students => "students",
        }
    }

    pub fn parse(s: &str) -> Option<Field> {
        match s.trim().to_lowercase().as_str() {
            "name" => Some(Field::Name),
            "budget" => Some(Field::Budget),
            "students" => Some(Field::Students),
            _ => None,
        }
    }
}

// ============================================================================
// COERCION
// ============================================================================

/// Parse a budget amount; anything unusable becomes 0
pub fn coerce_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(sanitize_amount)
        .unwrap_or(0.0)
}

/// Parse a student count, keeping the integer part
pub fn coerce_count(raw: &str) -> u64 {
    let value = coerce_amount(raw).trunc();
    if value >= u64::MAX as f64 {
        u64::MAX
    } else {
        value as u64
    }
}

fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
