//! Tabular OCR adapter: maps diverse bank-statement headers onto the
//! Date/Description/Amount columns and normalizes each row.

use std::io::Read;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::{parse_flexible_date, parse_money};

use super::{DocumentKind, ExtractedDocument, ExtractionError};

/// Header keywords signalling the outgoing-amount column.
const AMOUNT_KEYWORDS: &[&str] = &[
    "out",
    "paid out",
    "money out",
    "debit",
    "payment",
    "withdrawal",
    "expense",
    "spent",
    "charge",
    "outflow",
    "amount deducted",
    "transfer out",
    "outgoing",
    "cost",
    "disbursement",
];

const DATE_KEYWORDS: &[&str] = &["date"];

const DESCRIPTION_KEYWORDS: &[&str] = &["description", "detail"];

/// One normalized statement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub date: Option<NaiveDate>,
    /// Outgoing amount in minor units; None when the cell was empty or the
    /// row is an inflow.
    pub amount_minor: Option<i64>,
    pub description: String,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    date: usize,
    description: usize,
    amount: usize,
}

fn map_headers(headers: &[String]) -> Result<ColumnMap, ExtractionError> {
    let mut date = None;
    let mut description = None;
    let mut amount = None;

    for (index, header) in headers.iter().enumerate() {
        let lower = header.to_lowercase();
        if date.is_none() && DATE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            date = Some(index);
        } else if description.is_none() && DESCRIPTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
            description = Some(index);
        } else if amount.is_none() && AMOUNT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            amount = Some(index);
        }
    }

    match (date, description, amount) {
        (Some(date), Some(description), Some(amount)) => Ok(ColumnMap {
            date,
            description,
            amount,
        }),
        _ => Err(ExtractionError::Unreadable(
            "required columns (date, description, amount) were not found".to_string(),
        )),
    }
}

/// Normalize a header-plus-data table into transaction rows.
pub fn parse_table(rows: &[Vec<String>]) -> Result<Vec<TransactionRow>, ExtractionError> {
    let headers = rows
        .first()
        .ok_or_else(|| ExtractionError::Unreadable("table has no header row".to_string()))?;
    let columns = map_headers(headers)?;

    let transactions = rows[1..]
        .iter()
        .map(|row| {
            let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or("");
            TransactionRow {
                date: parse_flexible_date(cell(columns.date)),
                amount_minor: parse_money(cell(columns.amount)),
                description: cell(columns.description).trim().to_string(),
            }
        })
        .collect();

    Ok(transactions)
}

/// Read a CSV export of the extracted table.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<TransactionRow>, ExtractionError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record =
            record.map_err(|err| ExtractionError::Unreadable(format!("invalid CSV: {err}")))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    parse_table(&rows)
}

/// Wrap normalized rows in the common document shape.
pub fn statement_document(transactions: Vec<TransactionRow>) -> ExtractedDocument {
    let mut document = ExtractedDocument::new(DocumentKind::BankStatement);
    document.transactions = transactions;
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table(headers: &[&str], data: &[&[&str]]) -> Vec<Vec<String>> {
        let mut rows = vec![headers.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        rows.extend(
            data.iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect::<Vec<_>>()),
        );
        rows
    }

    #[test]
    fn maps_varied_statement_headers() {
        let rows = table(
            &["Transaction Date", "Details", "Money Out", "Money In"],
            &[&["05/01/2024", "AGRITECH LTD", "£12,500.00", ""]],
        );
        let transactions = parse_table(&rows).expect("parses");
        assert_eq!(transactions.len(), 1);
        let row = &transactions[0];
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(row.amount_minor, Some(1_250_000));
        assert_eq!(row.description, "AGRITECH LTD");
    }

    #[test]
    fn missing_required_column_is_an_extraction_error() {
        let rows = table(&["Date", "Balance"], &[&["05/01/2024", "100.00"]]);
        let err = parse_table(&rows).expect_err("missing columns rejected");
        assert!(matches!(err, ExtractionError::Unreadable(_)));
    }

    #[test]
    fn empty_amount_cells_become_none() {
        let rows = table(
            &["Date", "Description", "Debit"],
            &[&["06/01/2024", "SALARY", ""]],
        );
        let transactions = parse_table(&rows).expect("parses");
        assert_eq!(transactions[0].amount_minor, None);
    }

    #[test]
    fn csv_round_trips_into_transactions() {
        let csv = "Date,Description,Paid Out\n2024-01-05,AgriTech Ltd,12500.00\n2024-01-06,Groceries,54.20\n";
        let transactions = parse_csv(Cursor::new(csv)).expect("parses");
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[1].amount_minor, Some(5_420));
    }

    #[test]
    fn unparseable_dates_become_none_rather_than_failing() {
        let rows = table(
            &["Date", "Description", "Out"],
            &[&["??", "AGRITECH LTD", "10.00"]],
        );
        let transactions = parse_table(&rows).expect("parses");
        assert_eq!(transactions[0].date, None);
    }
}
