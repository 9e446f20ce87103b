//! # dnsmasq-leases
//!
//! Reads a dnsmasq lease file and shows it as a terminal table, a JSON
//! document, or a web page.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dnsmasq_leases::{Config, Render, TextTable, parse_file};
//!
//! fn main() -> dnsmasq_leases::Result<()> {
//!     let config = Config::from_env();
//!     let parsed = parse_file(&config.leases_file, config.parse_mode)?;
//!     TextTable.render(&parsed.records, &mut std::io::stdout())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`Config`] - Lease file path, parse mode and listen address
//! - [`parse_file`] / [`parse_reader`] - Line parser producing [`LeaseRecord`]s
//! - [`Render`] - Output strategy implemented by [`TextTable`], [`Json`] and [`HtmlPage`]
//! - [`LeaseServer`] - HTTP service rendering [`HtmlPage`] on every request

pub mod config;
pub mod error;
pub mod html;
pub mod lease;
pub mod render;
pub mod server;

pub use config::{Config, ParseMode};
pub use error::{Error, LineError, Result};
pub use html::{Escaped, HtmlPage};
pub use lease::{LeaseRecord, ParsedLeases, parse_file, parse_reader};
pub use render::{Json, Render, TextTable};
pub use server::LeaseServer;
