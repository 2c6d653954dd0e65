//! params.ini handling.
//!
//! The file is a plain INI document kept next to the simulator:
//!
//! ```text
//! [parameters]
//! is_first_start = 0
//!
//! [update]
//! last_date = 2025-03-29 10:15:02.123456
//! last_file_name = brdc0870.25n.gz
//! ```
//!
//! The optional `archive`, `simulator` and `transmitter` sections override
//! the built-in defaults. Unknown sections and keys are ignored.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::schedule::{format_timestamp, parse_timestamp};
use crate::types::{BrdcError, Result, ARCHIVE_ROOT, CREDENTIAL_HOST};

/// Default params file name, resolved against the working directory.
pub const PARAMS_FILE: &str = "params.ini";

/// Full persisted state and settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Params {
    pub first_start: bool,
    pub update: UpdateState,
    pub archive: ArchiveConfig,
    pub simulator: SimulatorConfig,
    pub transmitter: TransmitterConfig,
}

/// Result of the most recent successful ephemeris update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateState {
    pub last_date: Option<NaiveDateTime>,
    /// Compressed file name, relative to the working directory.
    pub last_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveConfig {
    pub url: String,
    pub credential_host: String,
}

/// gps-sdr-sim build and run settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatorConfig {
    pub source: String,
    pub binary: String,
    /// Static receiver position as `lat,lon,height`.
    pub location: String,
    /// I/Q sample format in bits (`-b`).
    pub iq_bits: u8,
}

/// hackrf_transfer settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransmitterConfig {
    pub binary: String,
    pub signal_file: String,
    pub frequency: u64,
    pub sample_rate: u32,
    pub amp_enable: bool,
    pub tx_gain: u32,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            first_start: true,
            update: UpdateState::default(),
            archive: ArchiveConfig {
                url: ARCHIVE_ROOT.into(),
                credential_host: CREDENTIAL_HOST.into(),
            },
            simulator: SimulatorConfig {
                source: "gpssim_generator/gpssim.c".into(),
                binary: "gps-sdr-sim".into(),
                location: "50.450441,30.523550,100".into(),
                iq_bits: 8,
            },
            transmitter: TransmitterConfig {
                binary: "hackrf_transfer".into(),
                signal_file: "gpssim.bin".into(),
                frequency: 1_575_420_000,
                sample_rate: 2_600_000,
                amp_enable: true,
                tx_gain: 0,
            },
        }
    }
}

/// Load params from `path`.
///
/// Returns default params (a first start) if the file doesn't exist.
pub fn load_params(path: &Path) -> Result<Params> {
    if !path.exists() {
        return Ok(Params::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse_params(&text)
}

/// Save params to `path`, replacing the previous content.
pub fn save_params(path: &Path, params: &Params) -> Result<()> {
    std::fs::write(path, serialize_params(params))?;
    Ok(())
}

/// Parse INI text. `=` and `:` both separate keys from values, `#` and `;`
/// start comment lines, key names are case-insensitive.
pub fn parse_params(text: &str) -> Result<Params> {
    let mut params = Params::default();
    let mut section = String::new();

    for (lineno, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') || stripped.starts_with(';') {
            continue;
        }

        if let Some(name) = stripped.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }

        let Some(idx) = stripped.find(['=', ':']) else {
            return Err(BrdcError::Config(format!(
                "line {}: expected 'key = value', got '{stripped}'",
                lineno + 1
            )));
        };
        let key = stripped[..idx].trim().to_ascii_lowercase();
        let val = stripped[idx + 1..].trim();

        match (section.as_str(), key.as_str()) {
            ("parameters", "is_first_start") => params.first_start = parse_bool(&key, val)?,

            ("update", "last_date") => {
                params.update.last_date = if val.is_empty() {
                    None
                } else {
                    Some(parse_timestamp(val)?)
                }
            }
            ("update", "last_file_name") => params.update.last_file_name = non_empty(val),

            ("archive", "url") => params.archive.url = val.to_string(),
            ("archive", "credential_host") => params.archive.credential_host = val.to_string(),

            ("simulator", "source") => params.simulator.source = val.to_string(),
            ("simulator", "binary") => params.simulator.binary = val.to_string(),
            ("simulator", "location") => params.simulator.location = parse_location(val)?,
            ("simulator", "iq_bits") => params.simulator.iq_bits = parse_num(&key, val)?,

            ("transmitter", "binary") => params.transmitter.binary = val.to_string(),
            ("transmitter", "signal_file") => params.transmitter.signal_file = val.to_string(),
            ("transmitter", "frequency") => params.transmitter.frequency = parse_num(&key, val)?,
            ("transmitter", "sample_rate") => {
                params.transmitter.sample_rate = parse_num(&key, val)?
            }
            ("transmitter", "amp_enable") => params.transmitter.amp_enable = parse_bool(&key, val)?,
            ("transmitter", "tx_gain") => params.transmitter.tx_gain = parse_num(&key, val)?,

            _ => {}
        }
    }

    Ok(params)
}

fn non_empty(val: &str) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val.to_string())
    }
}

fn parse_bool(key: &str, val: &str) -> Result<bool> {
    match val.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BrdcError::Config(format!("{key}: not a boolean '{val}'"))),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    val.parse()
        .map_err(|_| BrdcError::Config(format!("{key}: not a number '{val}'")))
}

/// Accepts `lat,lon,height` with three decimal numbers, keeps the text as written.
fn parse_location(val: &str) -> Result<String> {
    let parts: Vec<&str> = val.split(',').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.parse::<f64>().is_err()) {
        return Err(BrdcError::Config(format!(
            "location: expected 'lat,lon,height', got '{val}'"
        )));
    }
    Ok(parts.join(","))
}

/// Serialize params to INI text.
pub fn serialize_params(params: &Params) -> String {
    let mut lines = vec!["[parameters]".to_string()];
    lines.push(format!("is_first_start = {}", u8::from(params.first_start)));
    lines.push(String::new());

    lines.push("[update]".into());
    if let Some(ts) = params.update.last_date {
        lines.push(format!("last_date = {}", format_timestamp(ts)));
    }
    if let Some(name) = &params.update.last_file_name {
        lines.push(format!("last_file_name = {name}"));
    }
    lines.push(String::new());

    lines.push("[archive]".into());
    lines.push(format!("url = {}", params.archive.url));
    lines.push(format!("credential_host = {}", params.archive.credential_host));
    lines.push(String::new());

    let sim = &params.simulator;
    lines.push("[simulator]".into());
    lines.push(format!("source = {}", sim.source));
    lines.push(format!("binary = {}", sim.binary));
    lines.push(format!("location = {}", sim.location));
    lines.push(format!("iq_bits = {}", sim.iq_bits));
    lines.push(String::new());

    let tx = &params.transmitter;
    lines.push("[transmitter]".into());
    lines.push(format!("binary = {}", tx.binary));
    lines.push(format!("signal_file = {}", tx.signal_file));
    lines.push(format!("frequency = {}", tx.frequency));
    lines.push(format!("sample_rate = {}", tx.sample_rate));
    lines.push(format!("amp_enable = {}", u8::from(tx.amp_enable)));
    lines.push(format!("tx_gain = {}", tx.tx_gain));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
