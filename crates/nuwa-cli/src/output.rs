//! Output rendering: plain tables for text mode, pretty JSON otherwise.

use std::io::{self, Write};

use anyhow::Context;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Column alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// Table column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            alignment: Alignment::Left,
            max_width: None,
        }
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Plain-text table. Widths are measured in terminal columns, so CJK text lines up.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<impl Into<String>>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let content = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| display_width(cell))
                    .max()
                    .unwrap_or(0);
                let width = content.max(display_width(&col.header));
                col.max_width.map_or(width, |max| width.min(max))
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut output = String::new();

        let header: Vec<_> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| format_cell(&col.header, w, col.alignment))
            .collect();
        push_line(&mut output, &header);

        let sep: Vec<_> = widths.iter().map(|&w| "-".repeat(w)).collect();
        push_line(&mut output, &sep);

        for row in &self.rows {
            let cells: Vec<_> = self
                .columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (col, &w))| format_cell(row.get(i).map_or("", String::as_str), w, col.alignment))
                .collect();
            push_line(&mut output, &cells);
        }

        output
    }
}

fn push_line(output: &mut String, cells: &[String]) {
    output.push_str(cells.join("   ").trim_end());
    output.push('\n');
}

fn format_cell(text: &str, width: usize, alignment: Alignment) -> String {
    let text = truncate(text, width);
    let pad = " ".repeat(width.saturating_sub(display_width(&text)));
    match alignment {
        Alignment::Left => format!("{text}{pad}"),
        Alignment::Right => format!("{pad}{text}"),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = char_width(c);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Terminal columns occupied by `text`.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    match c {
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FE30}'..='\u{FE4F}'
        | '\u{FF00}'..='\u{FF60}'
        | '\u{FFE0}'..='\u{FFE6}'
        | '\u{20000}'..='\u{2FFFD}' => 2,
        _ => 1,
    }
}

/// Write `value` as JSON, or `text()` in text mode.
pub fn emit<T, F>(format: OutputFormat, value: &T, text: F) -> Result<(), CliError>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("failed to encode output")?,
        OutputFormat::Text => text(),
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end()).context("failed to write output")?;
    Ok(())
}

/// Write a notice to stderr unless quiet.
pub fn notice(quiet: bool, message: &str) {
    if !quiet {
        eprintln!("{message}");
    }
}
