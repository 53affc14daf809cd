//! CSV tabulation of decoded recipe files
//!
//! Standard CSV quoting applies: quoted fields may contain delimiters,
//! doubled quotes and newlines, and surrounding whitespace is kept as-is.
//! Rows may have differing field counts; no header row is assumed.

use csv::ReaderBuilder;
use thiserror::Error;

/// One parsed line of delimited text
pub type Row = Vec<String>;

/// Ordered rows in source order
pub type RowTable = Vec<Row>;

/// Longest field accepted, in characters
pub const FIELD_SIZE_LIMIT: usize = 131_072;

/// Reasons a decoded text cannot be tabulated
#[derive(Debug, Error)]
pub enum TabulateError {
    /// NUL bytes indicate binary content, not delimited text
    #[error("line {line} contains NUL")]
    NulByte { line: usize },

    #[error("field larger than field limit ({limit}) in row {row}: {len} characters")]
    FieldTooLarge { row: usize, len: usize, limit: usize },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parse CSV text into rows of fields
///
/// Empty input yields an empty table. A blank line yields an empty row, so
/// row positions match line positions in the source.
pub fn tabulate(text: &str) -> Result<RowTable, TabulateError> {
    if let Some(pos) = text.find('\0') {
        let line = text[..pos].matches('\n').count() + 1;
        return Err(TabulateError::NulByte { line });
    }

    // The csv reader drops empty records; count them separately and splice
    // them back in front of the record that follows.
    let (blanks_before, trailing_blanks) = blank_lines(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = RowTable::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let blanks = blanks_before.get(index).copied().unwrap_or(0);
        rows.extend(std::iter::repeat_with(Row::new).take(blanks));

        let mut row = Row::with_capacity(record.len());
        for field in record.iter() {
            let len = field.chars().count();
            if len > FIELD_SIZE_LIMIT {
                return Err(TabulateError::FieldTooLarge {
                    row: rows.len() + 1,
                    len,
                    limit: FIELD_SIZE_LIMIT,
                });
            }
            row.push(field.to_owned());
        }
        rows.push(row);
    }
    rows.extend(std::iter::repeat_with(Row::new).take(trailing_blanks));

    Ok(rows)
}

/// Count blank lines preceding each non-empty record, plus those after the last
///
/// Record boundaries follow the csv reader: `\r`, `\n` and `\r\n` terminate a
/// record outside quotes, and a quote only opens a quoted field at the start
/// of a field.
fn blank_lines(text: &str) -> (Vec<usize>, usize) {
    let mut blanks_before = Vec::new();
    let mut blanks = 0;
    let mut has_content = false;
    let mut field_start = true;
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match c {
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if has_content {
                    blanks_before.push(blanks);
                    blanks = 0;
                } else {
                    blanks += 1;
                }
                has_content = false;
                field_start = true;
            }
            '"' if field_start => {
                in_quotes = true;
                has_content = true;
                field_start = false;
            }
            ',' => {
                has_content = true;
                field_start = true;
            }
            _ => {
                has_content = true;
                field_start = false;
            }
        }
    }

    if has_content {
        blanks_before.push(blanks);
        blanks = 0;
    }
    (blanks_before, blanks)
}
