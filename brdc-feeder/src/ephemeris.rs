//! Local ephemeris file pair: `brdcDDD0.YYn.gz` and its decompressed
//! sibling `brdcDDD0.YYn`.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};

use brdc_core::types::{BrdcError, Result, COMPRESSED_SUFFIX};

/// Decompressed sibling of a compressed ephemeris file.
pub fn decompressed_path(compressed: &Path) -> Result<PathBuf> {
    let name = compressed
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(COMPRESSED_SUFFIX))
        .filter(|n| !n.is_empty())
        .ok_or_else(|| decompress_error(compressed, "not a .gz file name"))?;
    Ok(compressed.with_file_name(name))
}

/// Gunzip `compressed` next to itself and return the decompressed path.
pub fn decompress(compressed: &Path) -> Result<PathBuf> {
    let target = decompressed_path(compressed)?;

    let input = File::open(compressed)?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let mut output = BufWriter::new(File::create(&target)?);

    let copied = io::copy(&mut decoder, &mut output).and_then(|n| output.flush().map(|_| n));
    match copied {
        Ok(n) => {
            debug!(bytes = n, "decompressed {}", target.display());
            Ok(target)
        }
        Err(e) => {
            drop(output);
            let _ = fs::remove_file(&target);
            Err(decompress_error(compressed, &e.to_string()))
        }
    }
}

/// Remove the previous file pair once a new compressed file is in place.
///
/// Only deletes when the previous compressed file, its decompressed sibling
/// and `new` all exist, and never when the previous file *is* `new`.
/// Returns true if the pair was removed.
pub fn prune_previous(dir: &Path, previous: Option<&str>, new: &Path) -> Result<bool> {
    let Some(previous) = previous else {
        return Ok(false);
    };
    let old = dir.join(previous);
    if new.file_name() == old.file_name() {
        return Ok(false);
    }
    let old_raw = decompressed_path(&old)?;

    if old.exists() && old_raw.exists() && new.exists() {
        info!("removing previous ephemeris {}", old.display());
        fs::remove_file(&old)?;
        fs::remove_file(&old_raw)?;
        return Ok(true);
    }
    Ok(false)
}

fn decompress_error(path: &Path, reason: &str) -> BrdcError {
    BrdcError::Decompress {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
