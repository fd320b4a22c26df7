// 📤 CSV Export - what the "Download CSV" button produces
//
// Fixed 4-column header, one row per record in table order. Values are
// written as-is: no quoting, so a comma inside a name shifts the columns.

use crate::error::{BudgetError, BudgetResult};
use crate::metrics::per_student;
use crate::record::BudgetRecord;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: [&str; 4] = ["University", "Budget_Tk", "Students", "Per_Student_Tk"];

pub const EXPORT_FILE_NAME: &str = "university_budget_per_student.csv";

/// Render the record set as CSV text (rows joined by "\n", no trailing newline)
pub fn to_csv_string(records: &[BudgetRecord]) -> BudgetResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)?;

    for record in records {
        wtr.write_record([
            record.name.clone(),
            record.budget.to_string(),
            record.students.to_string(),
            per_student(record).to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| BudgetError::Io(e.into_error()))?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| BudgetError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;

    if text.ends_with('\n') {
        text.pop();
    }

    Ok(text)
}

/// Write the CSV into `dir` under the fixed export file name
pub fn write_csv_file(records: &[BudgetRecord], dir: &Path) -> BudgetResult<PathBuf> {
    fs::create_dir_all(dir)?;

    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, to_csv_string(records)?)?;

    tracing::info!(path = %path.display(), rows = records.len(), "CSV exported");
    Ok(path)
}
