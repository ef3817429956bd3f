use std::fs;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, error, info, warn};

use crate::credentials::UserCredentials;
use crate::error::FetchError;

const BUFFER_SIZE: usize = 1024 * 1024;

/// An opened remote product body. The declared length may be absent when
/// the server does not advertise one.
pub struct RemoteFile {
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

/// Remote side of the transfer engine. Implementations classify their
/// failures up front: `ProductNotFound` for a missing remote file,
/// `Timeout` for an expired connect/read deadline, `TransferHttp` /
/// `TransferStatus` for everything else.
pub trait RemoteSource: Send + Sync {
    fn open(&self, url: &str) -> Result<RemoteFile, FetchError>;
}

#[derive(Clone)]
pub struct HttpRemoteSource {
    client: Client,
    credentials: Option<UserCredentials>,
}

impl HttpRemoteSource {
    pub fn new(credentials: Option<UserCredentials>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("s2-archiver/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::TransferHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| FetchError::TransferHttp(err.to_string()))?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

impl RemoteSource for HttpRemoteSource {
    fn open(&self, url: &str) -> Result<RemoteFile, FetchError> {
        let mut request = self.client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let response = request.send().map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::TransferHttp(err.to_string())
            }
        })?;
        let status = response.status();
        if status.as_u16() == 404 || status.as_u16() == 410 {
            return Err(FetchError::ProductNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::TransferStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            });
        }
        Ok(RemoteFile {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

/// Downloads `url` to `destination`. The file is considered already
/// complete only when it exists and its size equals the declared remote
/// size exactly; in that case no body read happens at all. Otherwise the
/// body is streamed into a temp file next to the destination and renamed
/// into place after an uninterrupted read, so a failed transfer never
/// touches the destination.
///
/// `Ok(None)` means the product was skipped (missing remote file or a
/// non-timeout transport failure); a timeout or local filesystem failure
/// propagates as an error.
pub fn download(
    source: &dyn RemoteSource,
    url: &str,
    destination: &Utf8Path,
    overwrite: bool,
) -> Result<Option<Utf8PathBuf>, FetchError> {
    debug!("begin download for {url}");
    let remote = match source.open(url) {
        Ok(remote) => remote,
        Err(FetchError::ProductNotFound(_)) => {
            warn!("cannot download {url}: no such file");
            return Ok(None);
        }
        Err(err @ FetchError::Timeout(_)) => {
            error!("operation timed out");
            return Err(err);
        }
        Err(err) => {
            error!("cannot download {url}: {err}");
            return Ok(None);
        }
    };

    let local_length = fs::metadata(destination.as_std_path()).ok().map(|m| m.len());
    let cached = !overwrite
        && matches!(
            (remote.content_length, local_length),
            (Some(remote_len), Some(local_len)) if remote_len == local_len
        );
    if cached {
        debug!("file already downloaded");
        ensure_permissions(destination)?;
        return Ok(Some(destination.to_owned()));
    }

    if let (Some(remote_len), Some(local_len)) = (remote.content_length, local_length) {
        debug!(
            "remote file size: {remote_len}, local file size: {local_len}, file will be downloaded again"
        );
    }

    let parent = destination
        .parent()
        .ok_or_else(|| FetchError::Filesystem("destination has no parent directory".to_string()))?;
    let kbytes = remote.content_length.unwrap_or(0) / 1024;
    info!(
        "{} [size: {kbytes}kB]",
        destination.file_name().unwrap_or(destination.as_str())
    );

    let mut temp = tempfile::Builder::new()
        .prefix("s2dl")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    debug!("local temporary file {} created", temp.path().display());

    let start = Instant::now();
    match copy_stream(remote.body, temp.as_file_mut()) {
        Ok(_) => {}
        Err(err) if is_timeout(&err) => {
            error!("operation timed out");
            return Err(FetchError::Timeout(url.to_string()));
        }
        Err(err) => {
            error!("cannot download {url}: {err}");
            return Ok(None);
        }
    }

    if destination.as_std_path().exists() {
        fs::remove_file(destination.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    }
    temp.persist(destination.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    info!(
        "{} [elapsed: {}s]",
        destination.file_name().unwrap_or(destination.as_str()),
        start.elapsed().as_secs()
    );
    debug!("end download for {url}");

    ensure_permissions(destination)?;
    Ok(Some(destination.to_owned()))
}

fn copy_stream(mut reader: Box<dyn Read + Send>, writer: &mut fs::File) -> io::Result<u64> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        writer.write_all(&buffer[..read])?;
        total += read as u64;
    }
    writer.flush()?;
    Ok(total)
}

fn is_timeout(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::TimedOut || err.to_string().contains("timed out")
}

fn ensure_permissions(path: &Utf8Path) -> Result<(), FetchError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path.as_std_path(), fs::Permissions::from_mode(0o755))
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
