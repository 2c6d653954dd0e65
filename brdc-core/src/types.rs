//! Shared error enum and archive constants for brdc-core.

use thiserror::Error;

/// All errors produced by brdc-core and brdc-feeder.
#[derive(Debug, Error)]
pub enum BrdcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("failed to decompress {path}: {reason}")]
    Decompress { path: String, reason: String },
    #[error("operating system is not supported or has a specific configuration")]
    UnsupportedPlatform,
    #[error("credential setup declined")]
    SetupDeclined,
    #[error("attempt limit exceeded")]
    AttemptsExhausted,
    #[error("no ephemeris could be downloaded; check the internet connection and the netrc file")]
    NoEphemeris,
}

pub type Result<T> = std::result::Result<T, BrdcError>;

// ---------------------------------------------------------------------------
// Archive constants
// ---------------------------------------------------------------------------

/// Root of the daily GNSS data tree on CDDIS.
pub const ARCHIVE_ROOT: &str = "https://cddis.nasa.gov/archive/gnss/data/daily";

/// Earthdata login host the archive redirects to for authentication.
pub const CREDENTIAL_HOST: &str = "urs.earthdata.nasa.gov";

/// Earthdata registration page.
pub const REGISTRATION_URL: &str = "https://urs.earthdata.nasa.gov/";

/// CDDIS guide for creating a netrc file.
pub const NETRC_GUIDE_URL: &str =
    "https://cddis.nasa.gov/Data_and_Derived_Products/CreateNetrcFile.html";

/// General netrc documentation.
pub const NETRC_INFO_URL: &str = "https://www.labkey.org/Documentation/wiki-page.view?name=netrc";

/// HackRF installation notes shown before the first build.
pub const HACKRF_INSTALL_URL: &str = "https://hackware.ru/?p=8249";

/// Suffix of compressed ephemeris files.
pub const COMPRESSED_SUFFIX: &str = ".gz";
