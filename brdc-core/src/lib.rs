//! brdc-core: archive naming, scheduling and state for the ephemeris feeder.
//!
//! No network, no processes. This crate holds the pure pieces used by
//! `brdc-feeder`: the archive URL scheme, the update-due rule, params.ini
//! parsing and netrc entries.

pub mod config;
pub mod netrc;
pub mod schedule;
pub mod types;
pub mod url;

pub use config::PARAMS_FILE;
