use anyhow::{Context, Result};
use std::path::Path;

/// Field separator, picked from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    /// `.csv` files are comma-separated; everything else is tab-separated.
    pub fn for_path(path: &Path) -> Self {
        if path.to_string_lossy().ends_with("csv") {
            Delimiter::Comma
        } else {
            Delimiter::Tab
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }
}

/// A delimited file split into a header row and data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Table::default();
        }
        let headers = rows.remove(0);
        Table { headers, rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell `column` of `row`, empty when the row is short.
    pub fn cell<'a>(row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Split delimited text into rows of fields.
///
/// Fields may be double-quoted; inside quotes the delimiter and newlines are
/// literal and `""` is an escaped quote. Blank lines are dropped.
pub fn parse_rows(text: &str, delimiter: Delimiter) -> Vec<Vec<String>> {
    let sep = delimiter.as_char();
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            c if c == sep => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                finish_row(&mut rows, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        finish_row(&mut rows, row);
    }
    rows
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.len() == 1 && row[0].is_empty() {
        return;
    }
    rows.push(row);
}

/// Render rows as delimited text, quoting fields that need it.
pub fn format_rows(rows: &[Vec<String>], delimiter: Delimiter) -> String {
    let sep = delimiter.as_char();
    let mut out = String::new();
    for row in rows {
        let line = row
            .iter()
            .map(|field| quote_field(field, sep))
            .collect::<Vec<_>>()
            .join(&sep.to_string());
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn quote_field(field: &str, sep: char) -> String {
    if field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Read a delimited file with its header row.
pub fn read_table(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read table {}", path.display()))?;
    Ok(Table::from_rows(parse_rows(&text, Delimiter::for_path(path))))
}

/// Write rows to `path`, delimiter chosen by extension.
pub fn write_table(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let text = format_rows(rows, Delimiter::for_path(path));
    std::fs::write(path, text).with_context(|| format!("write table {}", path.display()))
}
