//! CSV bulk import: raw upload bytes → validated [`TaskDraft`]s.
//!
//! The header row maps columns to task field names. Typed fields follow a
//! sentinel-on-failure policy: an `effort` that is not a number or a
//! `dueDate` that is not a date becomes `None` (persisted as NULL) instead
//! of rejecting the row. Any `owner` or `id` column is ignored outright —
//! imported rows always belong to the authenticated caller.

use csv::StringRecord;

use crate::tasks::TaskDraft;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: title")]
    MissingTitleColumn,
    #[error("row {row} has no title")]
    MissingTitle { row: usize },
}

/// Typed parse for the `effort` column. `None` is the not-a-number
/// sentinel.
pub fn parse_effort(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Typed parse for the `dueDate` column (ISO `YYYY-MM-DD`). `None` is the
/// invalid-date sentinel.
pub fn parse_due_date(raw: &str) -> Option<String> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.to_string())
}

/// Column positions resolved from the header row.
struct Columns {
    title: usize,
    description: Option<usize>,
    effort: Option<usize>,
    due_date: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, ImportError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
        };
        let title = find("title").ok_or(ImportError::MissingTitleColumn)?;
        Ok(Self {
            title,
            description: find("description"),
            effort: find("effort"),
            // Accept both the wire spelling and the snake_case field name.
            due_date: find("dueDate").or_else(|| find("due_date")),
        })
    }
}

fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Parse an uploaded CSV buffer into task drafts.
///
/// Fully empty records are skipped; a record with a blank title fails the
/// whole batch (title is required). Nothing is persisted here — the caller
/// submits the returned drafts as one batch insert.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<TaskDraft>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let columns = Columns::resolve(reader.headers()?)?;

    let mut drafts = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let title = field(&record, Some(columns.title)).trim();
        if title.is_empty() {
            // Header row is row 1 on the wire.
            return Err(ImportError::MissingTitle { row: i + 2 });
        }

        let description = match field(&record, columns.description) {
            "" => None,
            s => Some(s.to_string()),
        };

        drafts.push(TaskDraft {
            title: title.to_string(),
            description,
            effort: parse_effort(field(&record, columns.effort)),
            due_date: parse_due_date(field(&record, columns.due_date)),
        });
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_row() {
        let csv = b"title,description,effort,dueDate\nBuy milk,,2,2024-01-01\n";
        let drafts = parse_csv(csv).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Buy milk");
        assert_eq!(drafts[0].description, None);
        assert_eq!(drafts[0].effort, Some(2.0));
        assert_eq!(drafts[0].due_date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_non_numeric_effort_becomes_sentinel() {
        let csv = b"title,effort\nThink hard,abc\n";
        let drafts = parse_csv(csv).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].effort, None);
    }

    #[test]
    fn test_invalid_due_date_becomes_sentinel() {
        let csv = b"title,dueDate\nSomeday,tomorrow-ish\n";
        let drafts = parse_csv(csv).unwrap();
        assert_eq!(drafts[0].due_date, None);
    }

    #[test]
    fn test_owner_column_is_ignored() {
        let csv = b"title,owner\nSneaky,u2\n";
        let drafts = parse_csv(csv).unwrap();
        assert_eq!(drafts[0].title, "Sneaky");
        // TaskDraft has no owner field at all; nothing to assert beyond
        // the parse not failing.
    }

    #[test]
    fn test_empty_records_are_skipped() {
        let csv = b"title,effort\nA,1\n,\n";
        let drafts = parse_csv(csv).unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_blank_title_fails_the_batch() {
        let csv = b"title,effort\nA,1\n,2\n";
        let err = parse_csv(csv).unwrap_err();
        assert!(matches!(err, ImportError::MissingTitle { row: 3 }));
    }

    #[test]
    fn test_missing_title_column_is_rejected() {
        let csv = b"effort,dueDate\n1,2024-01-01\n";
        assert!(matches!(
            parse_csv(csv).unwrap_err(),
            ImportError::MissingTitleColumn
        ));
    }

    #[test]
    fn test_effort_edge_cases() {
        assert_eq!(parse_effort("2"), Some(2.0));
        assert_eq!(parse_effort(" 2.5 "), Some(2.5));
        assert_eq!(parse_effort(""), None);
        assert_eq!(parse_effort("abc"), None);
        assert_eq!(parse_effort("inf"), None);
        assert_eq!(parse_effort("NaN"), None);
    }

    #[test]
    fn test_due_date_edge_cases() {
        assert_eq!(parse_due_date("2024-01-01").as_deref(), Some("2024-01-01"));
        assert_eq!(parse_due_date("2024-13-40"), None);
        assert_eq!(parse_due_date(""), None);
    }
}
