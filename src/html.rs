//! HTML page rendering.
//!
//! Hostnames and client IDs are chosen by DHCP clients, so every dynamic
//! value written into the page goes through [`Escaped`]. Static markup is
//! written with `write!` directly; nothing else reaches the page unescaped.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::lease::{EXPIRY_FORMAT, LeaseRecord};
use crate::render::{COLUMN_HEADERS, Render, display_cells};

pub const NO_ACTIVE_LEASES: &str = "No active leases";

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>dnsmasq leases</title>
<style>
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ccc; padding: 0.3em 0.8em; text-align: left; }
th { background: #eee; }
td.empty { font-style: italic; text-align: center; }
footer { margin-top: 1em; color: #666; font-size: 0.9em; }
</style>
</head>
<body>
<h1>dnsmasq leases</h1>
"#;

/// Displays a string with HTML special characters replaced by entities.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a>(pub &'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(position) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..position])?;
            let entity = match rest.as_bytes()[position] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            };
            f.write_str(entity)?;
            rest = &rest[position + 1..];
        }
        f.write_str(rest)
    }
}

/// A complete HTML document listing the leases, with a footer naming the
/// source file and the time the page was rendered.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    source: PathBuf,
    rendered_at: DateTime<Local>,
}

impl HtmlPage {
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self::rendered_at(source, Local::now())
    }

    pub fn rendered_at<P: AsRef<Path>>(source: P, rendered_at: DateTime<Local>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            rendered_at,
        }
    }
}

impl Render for HtmlPage {
    fn render(&self, leases: &[LeaseRecord], out: &mut dyn Write) -> Result<()> {
        out.write_all(PAGE_HEAD.as_bytes())?;

        writeln!(out, "<table>")?;
        write!(out, "<thead><tr>")?;
        for header in COLUMN_HEADERS {
            write!(out, "<th>{}</th>", Escaped(header))?;
        }
        writeln!(out, "</tr></thead>")?;

        writeln!(out, "<tbody>")?;
        if leases.is_empty() {
            writeln!(
                out,
                "<tr><td colspan=\"{}\" class=\"empty\">{}</td></tr>",
                COLUMN_HEADERS.len(),
                NO_ACTIVE_LEASES
            )?;
        }
        for record in leases {
            write!(out, "<tr>")?;
            for cell in display_cells(record) {
                write!(out, "<td>{}</td>", Escaped(&cell))?;
            }
            writeln!(out, "</tr>")?;
        }
        writeln!(out, "</tbody>")?;
        writeln!(out, "</table>")?;

        let source = self.source.display().to_string();
        let rendered_at = self.rendered_at.format(EXPIRY_FORMAT).to_string();
        writeln!(
            out,
            "<footer>Source: <code>{}</code> &middot; Rendered at {}</footer>",
            Escaped(&source),
            Escaped(&rendered_at)
        )?;
        writeln!(out, "</body>\n</html>")?;

        Ok(())
    }
}
