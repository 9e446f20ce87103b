//! Output strategies over a parsed lease list.
//!
//! Every front end parses once and hands the records to a [`Render`]
//! implementation together with an output sink. The terminal table and the
//! JSON dump live here; the HTML page lives in [`crate::html`].

use std::io::Write;

use crate::error::Result;
use crate::lease::LeaseRecord;

pub const COLUMN_HEADERS: [&str; 5] = [
    "Expiry Time",
    "MAC Address",
    "IP Address",
    "Hostname",
    "Client ID",
];

pub const NO_ENTRIES_MESSAGE: &str = "No lease entries found or file is empty.";

/// Spaces between the widest cell of a column and the next column.
const COLUMN_PADDING: usize = 2;

/// Writes a lease list to a sink.
pub trait Render {
    fn render(&self, leases: &[LeaseRecord], out: &mut dyn Write) -> Result<()>;
}

/// The five display cells of a record, in column order.
pub(crate) fn display_cells(record: &LeaseRecord) -> [String; 5] {
    [
        record.formatted_expiry(),
        record.mac_address.clone(),
        record.ip_address.clone(),
        record.hostname_or_placeholder().to_string(),
        record.client_id_or_placeholder().to_string(),
    ]
}

/// Aligned plain-text table for terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTable;

impl TextTable {
    fn write_row<S: AsRef<str>>(
        out: &mut dyn Write,
        cells: &[S],
        widths: &[usize; 5],
    ) -> std::io::Result<()> {
        let last = cells.len().saturating_sub(1);
        let mut line = String::new();
        for (index, cell) in cells.iter().enumerate() {
            if index == last {
                line.push_str(cell.as_ref());
            } else {
                let width = widths[index] + COLUMN_PADDING;
                line.push_str(&format!("{:<width$}", cell.as_ref(), width = width));
            }
        }
        writeln!(out, "{}", line)
    }
}

impl Render for TextTable {
    fn render(&self, leases: &[LeaseRecord], out: &mut dyn Write) -> Result<()> {
        if leases.is_empty() {
            writeln!(out, "{}", NO_ENTRIES_MESSAGE)?;
            return Ok(());
        }

        let rows: Vec<[String; 5]> = leases.iter().map(display_cells).collect();

        let mut widths = COLUMN_HEADERS.map(|header| header.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let separators = COLUMN_HEADERS.map(|header| "-".repeat(header.len()));

        Self::write_row(out, &COLUMN_HEADERS, &widths)?;
        Self::write_row(out, &separators, &widths)?;
        for row in &rows {
            Self::write_row(out, row, &widths)?;
        }

        out.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON array of records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Render for Json {
    fn render(&self, leases: &[LeaseRecord], out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, leases)?;
        writeln!(out)?;
        Ok(())
    }
}
