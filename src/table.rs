use crate::record::{HEADER, PredictionRecord};
use std::error::Error;

/// In-memory image of the full backend table: one header row plus data rows.
///
/// Both persistence sinks operate on whole tables (read full table, append,
/// write full table back), so this is the unit of exchange between the
/// recorder and the sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// An empty table seeded with the canonical record header.
    pub fn empty() -> Self {
        SheetTable {
            header: HEADER.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append one record as a row in header order.
    pub fn append_record(&mut self, record: &PredictionRecord) {
        self.rows.push(record.to_row());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a table from the wire shape of the worksheet backend: the first
    /// row is the header, the rest are data. No rows at all yields an empty
    /// table with the canonical header.
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut values = values.into_iter();
        match values.next() {
            Some(header) => SheetTable {
                header,
                rows: values.collect(),
            },
            None => SheetTable::empty(),
        }
    }

    /// Flatten back into the wire shape: header first, then data rows.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.header.clone());
        values.extend(self.rows.iter().cloned());
        values
    }

    /// Serialize the table to CSV.
    ///
    /// Fields containing commas, quotes, or newlines are quoted, with
    /// embedded quotes doubled.
    pub fn to_csv(&self) -> String {
        let mut csv_content = String::new();

        write_csv_row(&mut csv_content, &self.header);
        for row in &self.rows {
            write_csv_row(&mut csv_content, row);
        }

        csv_content
    }

    /// Parse a table from CSV content.
    ///
    /// The first line is the header. Empty content yields an empty table
    /// with the canonical header.
    pub fn from_csv(content: &str) -> Result<Self, Box<dyn Error>> {
        let lines: Vec<&str> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Ok(SheetTable::empty());
        }

        let header = parse_csv_row(lines[0])?;
        let mut rows = Vec::with_capacity(lines.len() - 1);
        for line in &lines[1..] {
            rows.push(parse_csv_row(line)?);
        }

        Ok(SheetTable { header, rows })
    }
}

fn write_csv_row(out: &mut String, row: &[String]) {
    for (i, value) in row.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }

        // Escape commas, quotes, newlines as needed
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            let escaped = value.replace("\"", "\"\"");
            out.push_str(&format!("\"{}\"", escaped));
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
}

// Parse a CSV row into a vector of strings
fn parse_csv_row(line: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if let Some(&next) = chars.peek() {
                    if next == '"' && in_quotes {
                        // Double quote inside quoted field - add a single quote
                        current_field.push('"');
                        chars.next();
                    } else {
                        // Toggle quote state
                        in_quotes = !in_quotes;
                    }
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                // End of field
                result.push(current_field);
                current_field = String::new();
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    // Add the last field
    result.push(current_field);

    Ok(result)
}
