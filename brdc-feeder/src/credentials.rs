//! Guided netrc setup for NASA Earthdata.
//!
//! The archive only serves files to authenticated Earthdata users. On the
//! first run we make sure the netrc file in the user's home directory holds
//! an entry for the login host, and walk the user through creating one if
//! it doesn't.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use brdc_core::netrc::{self, NetrcEntry, Platform};
use brdc_core::types::{
    BrdcError, Result, NETRC_GUIDE_URL, NETRC_INFO_URL, REGISTRATION_URL,
};

use crate::prompt::{confirm, Prompter};

/// Answers accepted per yes/no question.
pub const ANSWER_LIMIT: usize = 3;

/// Home (profile) directory of the current user.
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Make sure the netrc file in `home` has an entry for `host`.
///
/// Returns the netrc path. Declining or failing the guided setup is an
/// error and leaves the file untouched.
pub fn ensure_credentials(
    home: &Path,
    platform: Option<Platform>,
    host: &str,
    prompter: &mut dyn Prompter,
) -> Result<PathBuf> {
    let platform = platform.ok_or(BrdcError::UnsupportedPlatform)?;
    let path = platform.credential_path(home);
    let exists = path.exists();

    if exists && netrc::load_entry(&path, host).is_some() {
        info!(path = %path.display(), "using existing netrc entry for {host}");
        return Ok(path);
    }

    prompter.say(
        "A netrc file has to be created and configured. Set it up here?\n\
         If not, you will get links to configure it manually. [y/n]",
    );
    match confirm(prompter, ANSWER_LIMIT)? {
        Some(true) => {}
        Some(false) => {
            prompter.say(&format!(
                "Register at NASA Earthdata {REGISTRATION_URL}\n\
                 Read the NASA netrc introduction {NETRC_GUIDE_URL}\n\
                 More about netrc {NETRC_INFO_URL}\n\
                 Then run the program again to continue the setup.\n\n\
                 Press Enter to exit"
            ));
            prompter.read_line()?;
            return Err(BrdcError::SetupDeclined);
        }
        None => {
            prompter.say("Attempt limit exceeded");
            return Err(BrdcError::AttemptsExhausted);
        }
    }

    prompter.say(&format!("More about netrc {NETRC_INFO_URL}"));
    prompter.say(&format!(
        "Are you registered at NASA Earthdata ({REGISTRATION_URL})? [y/n]"
    ));
    match confirm(prompter, ANSWER_LIMIT)? {
        Some(true) => {}
        Some(false) => {
            prompter.say(&format!(
                "Register at NASA Earthdata {REGISTRATION_URL}\n\
                 Then run the program again to continue the setup.\n\n\
                 Press Enter to exit"
            ));
            prompter.read_line()?;
            return Err(BrdcError::SetupDeclined);
        }
        None => {
            prompter.say("Attempt limit exceeded");
            return Err(BrdcError::AttemptsExhausted);
        }
    }

    prompter.say("Enter the account login:");
    let login = prompter.read_line()?.trim().to_string();
    prompter.say("Enter the account password (input is hidden):");
    let password = prompter.read_hidden()?;

    if !is_netrc_token(&login) || !is_netrc_token(&password) {
        return Err(BrdcError::Config(
            "login and password must be non-empty and contain no whitespace".into(),
        ));
    }

    let entry = NetrcEntry::new(host, &login, &password);
    write_entry(&path, &entry, exists)?;

    prompter.say(&format!(
        "netrc file written to {}\nOpen it in a text editor and make sure the data is correct.",
        path.display()
    ));
    Ok(path)
}

fn is_netrc_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

/// Create the file with the entry, or append it on a new line.
fn write_entry(path: &Path, entry: &NetrcEntry, append: bool) -> Result<()> {
    if append {
        let mut file = OpenOptions::new().append(true).open(path)?;
        write!(file, "\n{}", entry.to_line())?;
    } else {
        let mut file = create_private(path)?;
        file.write_all(entry.to_line().as_bytes())?;
    }
    Ok(())
}

/// Create a new file readable only by the owner.
#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
