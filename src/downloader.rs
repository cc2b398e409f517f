use std::{path::PathBuf, time::Duration};

use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::location::{MalformedAddress, SourceLocation};

/// Sent with every network request.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Malformed(#[from] MalformedAddress),
    #[error("unsupported scheme `{0}`, expected http, https or file")]
    UnsupportedScheme(String),
    #[error("invalid address: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("local files must be on `localhost` or this host, not `{0}`")]
    ForeignHost(String),
    #[error("local path `{0}` is not absolute")]
    RelativePath(String),
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Retrieval settings for one run.
#[derive(Debug, Clone)]
pub(crate) struct FetchOptions {
    pub(crate) timeout: Duration,
    /// Skip TLS certificate verification.
    pub(crate) insecure: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            insecure: false,
        }
    }
}

/// A retrieved document and the address it was finally served from.
#[derive(Debug)]
pub(crate) struct Document {
    pub(crate) html: String,
    pub(crate) location: SourceLocation,
}

/// Retrieves the one document a run scans. The HTTP client is built once with
/// the run's timeout and certificate policy.
#[derive(Debug)]
pub(crate) struct Downloader(reqwest::Client);

impl Downloader {
    pub(crate) fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure)
            .build()?;
        Ok(Self(client))
    }

    /// Fetch the document at `address`, over the network or from disk
    /// depending on its scheme. Addresses without a scheme are fetched over https.
    pub(crate) async fn download(&self, address: &str) -> Result<Document, FetchError> {
        let location = SourceLocation::parse(address, "https")?;

        match location.scheme.as_str() {
            "http" | "https" => self.download_http(&location).await,
            "file" => read_file(location).await,
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }

    async fn download_http(&self, location: &SourceLocation) -> Result<Document, FetchError> {
        let url = Url::parse(&location.to_string())?;
        let response = self.0.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered with {}", response.url(), status);
        }

        let effective = response.url().to_string();
        info!("Fetched {}", effective);
        let location = SourceLocation::parse(&effective, "https")?;

        Ok(Document {
            html: response.text().await?,
            location,
        })
    }
}

async fn read_file(location: SourceLocation) -> Result<Document, FetchError> {
    let path = local_path(&location)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
    info!("Read {}", path.display());

    Ok(Document {
        html: String::from_utf8_lossy(&bytes).into_owned(),
        location,
    })
}

/// Map a `file` location onto the local filesystem.
fn local_path(location: &SourceLocation) -> Result<PathBuf, FetchError> {
    if !is_local_host(&location.authority) {
        return Err(FetchError::ForeignHost(location.authority.clone()));
    }

    let decoded: Vec<u8> = percent_decode_str(&location.path).collect();
    let path = path_from_bytes(decoded);
    if !path.is_absolute() {
        return Err(FetchError::RelativePath(path.display().to_string()));
    }

    Ok(path)
}

fn is_local_host(authority: &str) -> bool {
    authority.is_empty()
        || authority.eq_ignore_ascii_case("localhost")
        || gethostname::gethostname()
            .to_str()
            .map_or(false, |host| authority.eq_ignore_ascii_case(host))
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::{ffi::OsString, os::unix::ffi::OsStringExt};

    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}
