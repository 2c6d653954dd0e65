//! Ephemeris download with a bounded walk back through the archive.
//!
//! The file for "yesterday" is not always published yet, so on any miss we
//! try the day before, up to `MAX_RETRIES` times.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client, ClientBuilder, Response, StatusCode, Url};
use tracing::{debug, info, warn};

use brdc_core::netrc::{self, NetrcEntry};
use brdc_core::types::{BrdcError, Result};
use brdc_core::url::{build_url, url_file_name};

/// Retries after the first request, one day further back each time.
pub const MAX_RETRIES: u32 = 5;

/// Anything that can place the archive file behind `url` at `dest`.
#[async_trait::async_trait]
pub trait EphemerisSource: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// Any error counts as "no file for this date"; implementations must not
    /// leave a partial `dest` behind.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Fetch the newest available ephemeris file, starting at `target`.
///
/// Returns the local path of the compressed file, or `None` after
/// `MAX_RETRIES + 1` misses.
pub async fn fetch_ephemeris(
    source: &dyn EphemerisSource,
    root: &str,
    target: NaiveDate,
    dir: &Path,
) -> Option<PathBuf> {
    let mut date = target;

    for attempt in 0..=MAX_RETRIES {
        let url = build_url(root, date);
        info!(%url, "requesting ephemeris");

        let name = url_file_name(&url)?;
        let dest = dir.join(name);

        match source.download(&url, &dest).await {
            Ok(bytes) => {
                info!(
                    date = %date.format("%d.%m.%Y"),
                    bytes,
                    "ephemeris downloaded to {}",
                    dest.display()
                );
                return Some(dest);
            }
            Err(e) if attempt < MAX_RETRIES => {
                warn!(
                    "no ephemeris for {} ({e}), trying the previous day",
                    date.format("%d.%m.%Y")
                );
                date = date.pred_opt()?;
            }
            Err(e) => {
                warn!("no ephemeris for {} ({e})", date.format("%d.%m.%Y"));
            }
        }
    }

    warn!("could not download ephemeris");
    None
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Redirect hops followed per download.
pub const MAX_REDIRECTS: usize = 10;

/// reqwest based source authenticating with the Earthdata netrc entry.
///
/// The archive redirects to the Earthdata login host and back. Redirects are
/// followed here instead of by reqwest, which drops `Authorization` on a
/// cross-host hop, so the netrc credentials can be sent to the login host.
/// The netrc file is read on every request so credentials created during
/// the same run are picked up.
pub struct HttpSource {
    client: Client,
    netrc_path: Option<PathBuf>,
    host: String,
}

impl HttpSource {
    pub fn new(netrc_path: Option<PathBuf>, host: &str) -> Result<Self> {
        let client = client_builder()
            .build()
            .map_err(|e| BrdcError::Http(e.to_string()))?;
        Ok(HttpSource::with_client(client, netrc_path, host))
    }

    fn with_client(client: Client, netrc_path: Option<PathBuf>, host: &str) -> Self {
        HttpSource {
            client,
            netrc_path,
            host: host.to_string(),
        }
    }

    fn credentials(&self) -> Option<NetrcEntry> {
        netrc::load_entry(self.netrc_path.as_deref()?, &self.host)
    }

    /// GET `url`, following redirects and authenticating on the login host.
    async fn get(&self, url: &str) -> Result<Response> {
        let mut url = Url::parse(url).map_err(|e| BrdcError::Http(e.to_string()))?;

        for _ in 0..=MAX_REDIRECTS {
            let mut req = self.client.get(url.clone());
            if url.host_str() == Some(self.host.as_str()) {
                if let Some(c) = self.credentials() {
                    req = req.basic_auth(&c.login, Some(&c.password));
                }
            }

            let response = req
                .send()
                .await
                .map_err(|e| BrdcError::Http(e.to_string()))?;
            if !response.status().is_redirection() {
                return Ok(response);
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| BrdcError::Http("redirect without a location".into()))?;
            url = url
                .join(location)
                .map_err(|e| BrdcError::Http(e.to_string()))?;
            debug!(%url, "following redirect");
        }

        Err(BrdcError::Http(format!("more than {MAX_REDIRECTS} redirects")))
    }

    async fn stream_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self.get(url).await?;

        match response.status() {
            StatusCode::OK => {}
            other => return Err(BrdcError::Http(format!("response status {other}"))),
        }

        let mut file = File::create(dest)?;
        let mut len: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BrdcError::Http(e.to_string()))?
        {
            if len == 0 && is_html(&chunk) {
                return Err(BrdcError::Http(
                    "received an HTML page instead of ephemeris data".into(),
                ));
            }
            len += chunk.len() as u64;
            file.write_all(&chunk)?;
        }

        file.flush()?;
        Ok(len)
    }
}

/// Cookie-keeping client that leaves redirects to `HttpSource::get`.
fn client_builder() -> ClientBuilder {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
}

#[async_trait::async_trait]
impl EphemerisSource for HttpSource {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let result = self.stream_to(url, dest).await;
        if result.is_err() && dest.exists() {
            let _ = fs::remove_file(dest);
        }
        result
    }
}

/// Earthdata answers unauthenticated requests with a login page.
fn is_html(data: &[u8]) -> bool {
    let start = &data[..data.len().min(16)];
    let text = String::from_utf8_lossy(start).trim_start().to_ascii_lowercase();
    text.starts_with("<!doc") || text.starts_with("<html")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
