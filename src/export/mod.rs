//! XLSX export: a caller's tasks → single-sheet workbook bytes.
//!
//! The workbook is built entirely in memory and serialized with
//! `save_to_buffer`, so an encoding failure never leaks a partial file to
//! the response sink.

use rust_xlsxwriter::{Workbook, XlsxError};

use crate::tasks::TaskRow;

pub const SHEET_NAME: &str = "Tasks";
pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CONTENT_DISPOSITION: &str = "attachment; filename=tasks.xlsx";

/// Column headers, in output order.
const COLUMNS: [(&str, f64); 4] = [
    ("Title", 30.0),
    ("Description", 30.0),
    ("Effort (Days)", 15.0),
    ("Due Date", 20.0),
];

/// Serialize `tasks` into a one-sheet workbook. With no tasks the result
/// is a valid workbook containing only the header row.
pub fn tasks_workbook(tasks: &[TaskRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (header, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string(0, col, *header)?;
        sheet.set_column_width(col, *width)?;
    }

    for (i, task) in tasks.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &task.title)?;
        if let Some(description) = &task.description {
            sheet.write_string(row, 1, description)?;
        }
        if let Some(effort) = task.effort {
            sheet.write_number(row, 2, effort)?;
        }
        if let Some(due_date) = &task.due_date {
            sheet.write_string(row, 3, due_date)?;
        }
    }

    workbook.save_to_buffer()
}
