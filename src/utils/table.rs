//! Table rendering utilities for CLI outputs.

use regex::Regex;
use std::sync::OnceLock;

pub struct Column {
    pub header: String,
    pub width: usize,
}

impl Column {
    pub fn new(header: &str) -> Self {
        Self {
            header: header.to_string(),
            width: header.len(),
        }
    }
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*[mK]").expect("valid ANSI regex"))
}

/// Printable width of a cell, ignoring ANSI color sequences.
pub fn visible_len(s: &str) -> usize {
    ansi_re().replace_all(s, "").chars().count()
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_headers(headers: &[&str]) -> Self {
        Self::new(headers.iter().map(|h| Column::new(h)).collect())
    }

    /// Add a row; columns widen to fit their content.
    pub fn add_row(&mut self, row: Vec<String>) {
        for (col, cell) in self.columns.iter_mut().zip(row.iter()) {
            col.width = col.width.max(visible_len(cell));
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        // Header
        for col in &self.columns {
            out.push_str(&format!("{:<width$} ", col.header, width = col.width));
        }
        out.push('\n');

        // Rows
        for row in &self.rows {
            for (i, col) in self.columns.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = col.width.saturating_sub(visible_len(cell));
                out.push_str(cell);
                out.push_str(&" ".repeat(pad + 1));
            }
            out.push('\n');
        }

        out
    }
}
