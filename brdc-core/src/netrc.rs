//! netrc credential file naming and entries.
//!
//! The archive authenticates through NASA Earthdata, which expects an entry
//! of the form:
//!
//! ```text
//! machine urs.earthdata.nasa.gov login <username> password <password>
//! ```

use std::fs;
use std::path::{Path, PathBuf};

/// Operating system families with a known credential file location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `%USERPROFILE%\_netrc`
    Windows,
    /// `~/.netrc`
    Unix,
}

impl Platform {
    /// Platform of the running process, `None` when unsupported.
    pub fn current() -> Option<Platform> {
        if cfg!(windows) {
            Some(Platform::Windows)
        } else if cfg!(unix) {
            Some(Platform::Unix)
        } else {
            None
        }
    }

    pub fn credential_filename(&self) -> &'static str {
        match self {
            Platform::Windows => "_netrc",
            Platform::Unix => ".netrc",
        }
    }

    /// Credential file inside the user's home (profile) directory.
    pub fn credential_path(&self, home: &Path) -> PathBuf {
        home.join(self.credential_filename())
    }
}

/// A single `machine` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetrcEntry {
    pub machine: String,
    pub login: String,
    pub password: String,
}

impl NetrcEntry {
    pub fn new(machine: &str, login: &str, password: &str) -> Self {
        NetrcEntry {
            machine: machine.to_string(),
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    /// One-line netrc representation.
    pub fn to_line(&self) -> String {
        format!(
            "machine {} login {} password {}",
            self.machine, self.login, self.password
        )
    }
}

/// Find the entry for `machine` in netrc `contents`.
///
/// Tokens may be spread over several lines. Entries missing either login or
/// password are skipped.
pub fn find_entry(contents: &str, machine: &str) -> Option<NetrcEntry> {
    let mut tokens = contents.split_whitespace();
    let mut current: Option<(String, Option<String>, Option<String>)> = None;

    while let Some(tok) = tokens.next() {
        match tok {
            "machine" | "default" => {
                if let Some(entry) = complete(current.take(), machine) {
                    return Some(entry);
                }
                let name = if tok == "machine" {
                    tokens.next().unwrap_or_default().to_string()
                } else {
                    String::new()
                };
                current = Some((name, None, None));
            }
            "login" => {
                let v = tokens.next().map(str::to_string);
                if let Some((_, login, _)) = current.as_mut() {
                    *login = v;
                }
            }
            "password" => {
                let v = tokens.next().map(str::to_string);
                if let Some((_, _, password)) = current.as_mut() {
                    *password = v;
                }
            }
            "account" => {
                tokens.next();
            }
            _ => {}
        }
    }

    complete(current, machine)
}

/// Read the netrc file at `path` and return the entry for `machine`.
///
/// A missing or unreadable file has no entries.
pub fn load_entry(path: &Path, machine: &str) -> Option<NetrcEntry> {
    let contents = fs::read_to_string(path).ok()?;
    find_entry(&contents, machine)
}

fn complete(
    entry: Option<(String, Option<String>, Option<String>)>,
    machine: &str,
) -> Option<NetrcEntry> {
    match entry {
        Some((name, Some(login), Some(password))) if name == machine => Some(NetrcEntry {
            machine: name,
            login,
            password,
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
