//! dnsmasq lease file parsing.
//!
//! A lease file holds one lease per line, fields separated by runs of
//! whitespace:
//!
//! ```text
//! <expiry-epoch> <mac-address> <ip-address> <hostname|*> [<client-id|*>]
//! ```
//!
//! Lines that do not fit this shape are skipped with a warning so that a
//! single corrupt or half-written line (dnsmasq rewrites the file in place)
//! does not hide the rest of the leases. Only I/O failures abort a parse.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ParseMode;
use crate::error::{Error, LineError, Result};

/// Marker dnsmasq writes for an unknown hostname or client ID.
const UNKNOWN_MARKER: &str = "*";

/// Text shown wherever a hostname or client ID is unknown.
pub const UNKNOWN_PLACEHOLDER: &str = "N/A";

/// Format used for expiry times in every human-readable output.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One lease line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseRecord {
    /// When the lease expires, in local time.
    ///
    /// Epoch `0` is kept as-is and displays as the epoch date.
    pub expiry: DateTime<Local>,

    pub mac_address: String,

    pub ip_address: String,

    /// `None` when dnsmasq recorded `*`.
    pub hostname: Option<String>,

    /// `None` when the field was `*` or missing.
    pub client_id: Option<String>,
}

impl LeaseRecord {
    /// Parses a single lease line.
    pub fn parse_line(line: &str, mode: ParseMode) -> std::result::Result<Self, LineError> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if !mode.accepts_field_count(fields.len()) {
            return Err(LineError::FieldCount {
                found: fields.len(),
                expected: mode.expected_fields(),
            });
        }

        let seconds: i64 = fields[0].parse().map_err(|source| LineError::Timestamp {
            value: fields[0].to_string(),
            source,
        })?;

        let expiry = DateTime::from_timestamp(seconds, 0)
            .map(|utc| utc.with_timezone(&Local))
            .ok_or(LineError::TimestampOutOfRange(seconds))?;

        Ok(Self {
            expiry,
            mac_address: fields[1].to_string(),
            ip_address: fields[2].to_string(),
            hostname: known(fields[3]),
            client_id: fields.get(4).copied().and_then(known),
        })
    }

    pub fn formatted_expiry(&self) -> String {
        self.expiry.format(EXPIRY_FORMAT).to_string()
    }

    pub fn hostname_or_placeholder(&self) -> &str {
        self.hostname.as_deref().unwrap_or(UNKNOWN_PLACEHOLDER)
    }

    pub fn client_id_or_placeholder(&self) -> &str {
        self.client_id.as_deref().unwrap_or(UNKNOWN_PLACEHOLDER)
    }
}

fn known(field: &str) -> Option<String> {
    (field != UNKNOWN_MARKER).then(|| field.to_string())
}

/// The outcome of parsing a whole lease file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLeases {
    /// Records in file order.
    pub records: Vec<LeaseRecord>,
    /// Number of lines that were skipped as malformed.
    pub skipped: usize,
}

impl ParsedLeases {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Parses lease lines from any buffered reader.
///
/// Lines are split on `\n`; invalid UTF-8 is replaced rather than treated as
/// a read error, so a garbled hostname only affects its own line.
pub fn parse_reader<R: BufRead>(reader: R, mode: ParseMode) -> std::io::Result<ParsedLeases> {
    let mut parsed = ParsedLeases::default();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line_number = index + 1;
        let bytes = line?;
        let line = String::from_utf8_lossy(&bytes);

        match LeaseRecord::parse_line(&line, mode) {
            Ok(record) => parsed.records.push(record),
            Err(error) => {
                warn!(
                    "Skipping line {}: {}. Line: '{}'",
                    line_number,
                    error,
                    line.trim_end()
                );
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

/// Opens `path`, parses it, and closes it again before returning.
///
/// # Errors
///
/// Returns [`Error::FileAccess`] if the file cannot be opened or a read
/// fails part-way through.
pub fn parse_file<P: AsRef<Path>>(path: P, mode: ParseMode) -> Result<ParsedLeases> {
    let path = path.as_ref();
    let file_access = |source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(file_access)?;
    let parsed = parse_reader(BufReader::new(file), mode).map_err(file_access)?;

    debug!(
        "Parsed {} lease(s) from {} ({} line(s) skipped)",
        parsed.len(),
        path.display(),
        parsed.skipped
    );

    Ok(parsed)
}
