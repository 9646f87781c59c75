// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Direct retrieval of archives by URL.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::Url;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./fetch_test.rs"]
mod fetch_test;

/// Suffix of the file a transfer is written to before it completes.
const PARTIAL_SUFFIX: &str = "partial";

/// Retrieves a remote file to a local path.
pub trait Fetcher: Send + Sync {
    /// Write the body of `url` to `dest`, replacing any existing file.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Blocking HTTP(S) [`Fetcher`].
///
/// No timeout is applied; a stalled transfer blocks until the server gives up.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|e| Error::DownloadFailed {
                url: String::new(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("Downloading {url}");
        let failed = |message: String| Error::DownloadFailed {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let partial = partial_path(dest);
        let written = File::create(&partial).and_then(|mut file| io::copy(&mut response, &mut file));
        let written = match written {
            Ok(written) => written,
            Err(err) => {
                let _ = fs::remove_file(&partial);
                return Err(failed(err.to_string()));
            }
        };
        fs::rename(&partial, dest)?;
        tracing::debug!("Wrote {written} bytes to {}", dest.display());
        Ok(())
    }
}

/// The final path segment of `url`, which names the archive.
pub fn url_filename(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// `<dest>.partial`, next to the final file.
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory fetcher for tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves fixed bodies by URL and records every request.
    #[derive(Default)]
    pub struct FakeFetcher {
        bodies: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<(String, PathBuf)>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn serve(mut self, url: &str, body: &[u8]) -> Self {
            self.bodies.insert(url.to_string(), body.to_vec());
            self
        }

        pub fn requests(&self) -> Vec<(String, PathBuf)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
            match self.bodies.get(url) {
                Some(body) => Ok(fs::write(dest, body)?),
                None => Err(Error::DownloadFailed {
                    url: url.to_string(),
                    message: "HTTP 404 Not Found".to_string(),
                }),
            }
        }
    }
}
