//! Asset fetch primitives
//!
//! Fetching is the only suspension point of an environment load. Every
//! fetcher resolves a package-relative path (already joined with the
//! package base) to raw bytes.

use lumen_core::AssetError;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: usize = 3;
const RETRY_BASE_DELAY_MS: u64 = 250;

/// Source of raw asset bytes
pub trait AssetFetcher {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>>;
}

impl<F: AssetFetcher + ?Sized> AssetFetcher for &F {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> {
        (**self).fetch(path)
    }
}

impl<F: AssetFetcher + ?Sized> AssetFetcher for Rc<F> {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> {
        (**self).fetch(path)
    }
}

/// Join a package base (URL or directory) with a file name.
///
/// An empty base yields the file name unchanged.
pub fn join_url(base: &str, file: &str) -> String {
    if base.is_empty() {
        file.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, file)
    } else {
        format!("{}/{}", base, file)
    }
}

/// Reads assets from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    /// Resolve paths relative to the working directory (or as absolute paths)
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl AssetFetcher for FileFetcher {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> {
        let resolved = self.resolve(path);
        let path = path.to_string();
        async move {
            std::fs::read(&resolved).map_err(|e| AssetError::FetchFailed {
                path,
                reason: e.to_string(),
            })
        }
    }
}

/// Downloads assets over HTTP(S).
///
/// The request itself is blocking; the returned future completes in a
/// single poll. Transient failures are retried with exponential backoff.
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            agent: build_agent(),
        }
    }

    fn download_with_retry(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        for attempt in 0..MAX_RETRIES {
            match self.agent.get(url).call() {
                Ok(ok) => {
                    let mut reader = ok.into_body().into_reader();
                    let mut bytes = Vec::new();
                    std::io::Read::read_to_end(&mut reader, &mut bytes).map_err(|e| {
                        AssetError::FetchFailed {
                            path: url.to_string(),
                            reason: format!("Failed to read body: {}", e),
                        }
                    })?;
                    log::debug!("Fetched {} ({} bytes)", url, bytes.len());
                    return Ok(bytes);
                }
                Err(e) => {
                    if attempt + 1 < MAX_RETRIES && is_retryable_error(&e) {
                        log::warn!("Retrying {} after error: {}", url, e);
                        sleep_backoff(attempt);
                        continue;
                    }
                    return Err(AssetError::FetchFailed {
                        path: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(AssetError::FetchFailed {
            path: url.to_string(),
            reason: "Request failed after retries".to_string(),
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> {
        let url = path.to_string();
        async move { self.download_with_retry(&url) }
    }
}

fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .build();
    config.into()
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        ureq::Error::StatusCode(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

fn sleep_backoff(attempt: usize) {
    let delay = RETRY_BASE_DELAY_MS * (1 << attempt) as u64;
    std::thread::sleep(Duration::from_millis(delay));
}

/// Serves assets from an in-memory table, keyed by full path
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Builder-style insert
    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

impl AssetFetcher for MemoryFetcher {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> {
        let result = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::FetchFailed {
                path: path.to_string(),
                reason: "not found".to_string(),
            });
        async move { result }
    }
}
