//! Line-oriented terminal I/O for the menu.
//!
//! Generic over reader and writer so menu sessions can be scripted in tests.

use crate::errors::ServiceError;
use std::fmt::Display;
use std::io::{self, BufRead, Write};

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.output)
    }

    /// Prints `label`, reads one line and returns it trimmed. A closed input
    /// stream is reported as `UnexpectedEof`.
    pub fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    /// Prompt that must not be answered with an empty line
    pub fn prompt_required(&mut self, label: &str, what: &str) -> Result<String, ServiceError> {
        let value = self.prompt(label)?;
        if value.is_empty() {
            return Err(ServiceError::ValidationError(format!("{} must not be empty", what)));
        }
        Ok(value)
    }

    /// Prompt whose empty answer means "keep"
    pub fn prompt_optional(&mut self, label: &str) -> io::Result<Option<String>> {
        let value = self.prompt(label)?;
        Ok((!value.is_empty()).then_some(value))
    }

    pub fn prompt_int(&mut self, label: &str) -> Result<i32, ServiceError> {
        let value = self.prompt(label)?;
        parse_int(&value)
    }

    pub fn prompt_optional_int(&mut self, label: &str) -> Result<Option<i32>, ServiceError> {
        match self.prompt_optional(label)? {
            Some(value) => parse_int(&value).map(Some),
            None => Ok(None),
        }
    }

    pub fn prompt_optional_decimal(&mut self, label: &str) -> Result<Option<f64>, ServiceError> {
        match self.prompt_optional(label)? {
            Some(value) => parse_decimal(&value).map(Some),
            None => Ok(None),
        }
    }

    /// Yes/no question; `j`, `ja`, `y` and `yes` confirm
    pub fn confirm(&mut self, label: &str) -> io::Result<bool> {
        let answer = self.prompt(label)?.to_lowercase();
        Ok(matches!(answer.as_str(), "j" | "ja" | "y" | "yes"))
    }

    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
        write!(self.output, "{}", render_table(headers, rows))
    }
}

pub fn parse_int(value: &str) -> Result<i32, ServiceError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| ServiceError::ValidationError(format!("'{}' is not a whole number", value)))
}

/// Accepts `,` as well as `.` as the decimal separator
pub fn parse_decimal(value: &str) -> Result<f64, ServiceError> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ServiceError::ValidationError(format!("'{}' is not a number", value)))
}

/// Renders rows as a left-aligned text table; an empty row set renders as
/// a notice.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "No data.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let separator = "-".repeat(widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1));
    let mut out = String::new();
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&format_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&separator);
    out.push('\n');
    out
}

fn format_row<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    widths
        .iter()
        .map(|w| {
            let cell = cells.next().unwrap_or("");
            let pad = w.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
