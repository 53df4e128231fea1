//! Minimal delimited-text table support
//!
//! All external interfaces of the pipeline are flat comma-delimited tables with
//! a fixed header row. This module provides the shared reader/writer: header-
//! indexed column access with a `SchemaMismatch` error when an expected column
//! is absent, and quoting for fields that contain the delimiter.

use crate::error::PipelineError;

/// A parsed table: one header row plus data rows, all fields as text.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given header row.
    pub fn new(headers: &[&str]) -> Self {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Parse delimited text. The first non-empty line is the header.
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header_line = lines.next().ok_or(PipelineError::EmptyInput)?;
        let headers = split_fields(header_line);

        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            let fields = split_fields(line);
            if fields.len() != headers.len() {
                return Err(PipelineError::MalformedRow {
                    // +2: header line plus 1-based numbering
                    row: i + 2,
                    reason: format!(
                        "expected {} fields, found {}",
                        headers.len(),
                        fields.len()
                    ),
                });
            }
            rows.push(fields);
        }

        Ok(Table { headers, rows })
    }

    /// Index of a named column, or `SchemaMismatch` if the header lacks it.
    pub fn column(&self, name: &str) -> Result<usize, PipelineError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::SchemaMismatch(name.to_string()))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a data row. Field count must match the header.
    pub fn push_row(&mut self, fields: Vec<String>) {
        debug_assert_eq!(fields.len(), self.headers.len());
        self.rows.push(fields);
    }

    /// Encode the table back to delimited text, quoting where required.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push_str(&encode_row(&self.headers));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&encode_row(row));
            out.push('\n');
        }
        out
    }
}

/// Split one line into fields, honoring double-quoted fields with `""` escapes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn encode_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| encode_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
