use crate::error::TableError;
use crate::models::{Measurement, MeasurementField};
use crate::utils::constants::{MISSING_VALUE_SENTINEL, MISSING_VALUE_TOKENS};
use std::collections::HashSet;

type TableResult<T> = std::result::Result<T, TableError>;

/// The body of a sounding after the header row, restricted to known columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    /// Header tokens in file order.
    pub columns: Vec<String>,
    /// Header tokens that are not among the known fields and were dropped.
    pub ignored_columns: Vec<String>,
    /// One record per non-blank data line, in file order.
    pub records: Vec<Measurement>,
}

impl ParsedTable {
    pub fn loaded_fields(&self) -> Vec<MeasurementField> {
        self.columns
            .iter()
            .filter_map(|c| MeasurementField::from_column_name(c))
            .filter(|f| !self.ignored_columns.iter().any(|c| c == f.column_name()))
            .collect()
    }
}

/// Reads the whitespace-delimited table that follows the header row.
pub struct TableParser {
    known_fields: Vec<MeasurementField>,
}

impl TableParser {
    pub fn new() -> Self {
        Self::with_known_fields(&MeasurementField::ALL)
    }

    /// Restrict loading to a subset of the schema; other columns are dropped.
    pub fn with_known_fields(fields: &[MeasurementField]) -> Self {
        Self {
            known_fields: fields.to_vec(),
        }
    }

    pub fn parse(&self, raw_text: &str, header_line: usize) -> TableResult<Vec<Measurement>> {
        self.parse_table(raw_text, header_line).map(|table| table.records)
    }

    pub fn parse_table(&self, raw_text: &str, header_line: usize) -> TableResult<ParsedTable> {
        let mut lines = raw_text.lines().enumerate().skip(header_line);

        let header = match lines.next() {
            Some((_, line)) => line,
            None => {
                return Err(TableError::HeaderOutOfRange {
                    index: header_line,
                    line_count: raw_text.lines().count(),
                })
            }
        };

        let columns: Vec<String> = header.split_whitespace().map(str::to_string).collect();
        if columns.is_empty() {
            return Err(TableError::EmptyHeader { index: header_line });
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        // Position -> target field, `None` for columns that are not loaded.
        let layout: Vec<Option<MeasurementField>> = columns
            .iter()
            .map(|name| {
                MeasurementField::from_column_name(name).filter(|f| self.known_fields.contains(f))
            })
            .collect();

        let ignored_columns = columns
            .iter()
            .zip(&layout)
            .filter(|(_, field)| field.is_none())
            .map(|(name, _)| name.clone())
            .collect();

        let mut records = Vec::new();
        for (index, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            records.push(parse_row(line, index + 1, &columns, &layout)?);
        }

        if records.is_empty() {
            return Err(TableError::NoRecords);
        }

        Ok(ParsedTable {
            columns,
            ignored_columns,
            records,
        })
    }
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one data line; `line_number` is one-based for error messages.
fn parse_row(
    line: &str,
    line_number: usize,
    columns: &[String],
    layout: &[Option<MeasurementField>],
) -> TableResult<Measurement> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() > columns.len() {
        return Err(TableError::TooManyFields {
            line: line_number,
            expected: columns.len(),
            found: tokens.len(),
        });
    }

    // Short rows leave their trailing columns missing.
    let mut record = Measurement::default();
    for (position, token) in tokens.iter().enumerate() {
        let Some(field) = layout[position] else {
            continue;
        };

        let value = parse_value(token).ok_or_else(|| TableError::InvalidNumber {
            line: line_number,
            column: columns[position].clone(),
            token: token.to_string(),
        })?;

        if field.is_integer() {
            let integer = match value {
                Some(v) if v.fract() != 0.0 || v.abs() > i64::MAX as f64 => {
                    return Err(TableError::NonIntegral {
                        line: line_number,
                        column: columns[position].clone(),
                        value: v,
                    })
                }
                Some(v) => Some(v as i64),
                None => None,
            };
            record.set_integer(field, integer);
        } else {
            record.set_real(field, value);
        }
    }

    Ok(record)
}

/// `None` when the token is not a number, `Some(None)` for a missing value.
fn parse_value(token: &str) -> Option<Option<f64>> {
    if MISSING_VALUE_TOKENS.contains(&token) {
        return Some(None);
    }

    let value: f64 = token.parse().ok()?;
    if value.is_nan() || value == MISSING_VALUE_SENTINEL {
        Some(None)
    } else {
        Some(Some(value))
    }
}
