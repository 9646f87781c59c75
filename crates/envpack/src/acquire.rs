// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Per-ecosystem strategies that put one package's archive into a bundle.
//!
//! A strategy never fails the run: the cause of a failed acquisition is
//! logged and reported as `false` so the driver can move on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::exec::CommandOutput;
use crate::fetch::{url_filename, Fetcher};
use crate::{CondaCli, Ecosystem, PackageRecord, PipCli, Platform, RuntimeVersion, TextEncoding};

#[cfg(test)]
#[path = "./acquire_test.rs"]
mod acquire_test;

/// Channel searched when neither the run nor the record names one.
pub const DEFAULT_CHANNEL: &str = "defaults";

/// `url: https://.../<archive>` in `conda search --info` output.
static SEARCH_URL: Lazy<Regex> = Lazy::new(|| {
    let extensions = Ecosystem::Conda
        .extensions()
        .iter()
        .map(|ext| regex::escape(ext))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"url\s*:\s*(https?://\S+\.(?:{extensions}))"))
        .expect("search url pattern is valid")
});

/// Ensures an archive for one record exists in a directory.
pub trait Acquire {
    /// Place the archive for `record` into `dest_dir`.
    ///
    /// With `dry_run` nothing is written; the lookup is still performed.
    fn acquire(&self, record: &PackageRecord, dest_dir: &Path, dry_run: bool) -> bool;
}

/// Where a conda archive may come from, in the order they are tried.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Cached(PathBuf),
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Acquired,
    /// This source does not have the package; try the next one.
    Unavailable,
    Failed,
}

/// Cache-first, search-fallback strategy for conda packages.
pub struct CondaAcquirer {
    conda: CondaCli,
    fetcher: Arc<dyn Fetcher>,
    platform: Option<Platform>,
    channels: Vec<String>,
}

impl CondaAcquirer {
    pub fn new(conda: CondaCli, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            conda,
            fetcher,
            platform: None,
            channels: Vec::new(),
        }
    }

    /// Resolve packages for another platform instead of the host.
    pub fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    /// Channels that override every record's own channel.
    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }

    fn sources(&self, record: &PackageRecord) -> Vec<Source> {
        let cache = &self.conda.config().pkgs_dir;
        Ecosystem::Conda
            .extensions()
            .iter()
            .map(|ext| Source::Cached(cache.join(format!("{}.{ext}", record.archive_stem()))))
            .chain([Source::Search])
            .collect()
    }

    /// Explicit channels, else the record's channel, else [`DEFAULT_CHANNEL`].
    pub fn search_channels(&self, record: &PackageRecord) -> Vec<String> {
        if !self.channels.is_empty() {
            self.channels.clone()
        } else if !record.channel().is_empty() {
            vec![record.channel().to_string()]
        } else {
            vec![DEFAULT_CHANNEL.to_string()]
        }
    }

    fn from_cache(&self, cached: &Path, dest_dir: &Path, dry_run: bool) -> Attempt {
        if !cached.is_file() {
            return Attempt::Unavailable;
        }
        let Some(filename) = cached.file_name() else {
            return Attempt::Unavailable;
        };
        if dry_run {
            tracing::info!("Would copy {} from the package cache", cached.display());
            return Attempt::Acquired;
        }
        match std::fs::copy(cached, dest_dir.join(filename)) {
            Ok(_) => {
                tracing::info!("Copied {} from the package cache", cached.display());
                Attempt::Acquired
            }
            Err(err) => {
                tracing::error!("Failed to copy {}: {err}", cached.display());
                Attempt::Failed
            }
        }
    }

    fn from_search(&self, record: &PackageRecord, dest_dir: &Path, dry_run: bool) -> Attempt {
        let channels = self.search_channels(record);
        let info = match self.conda.search_info(record, self.platform, &channels) {
            Ok(info) => info,
            Err(err) => {
                tracing::error!("Failed to search for {record}: {err}");
                return Attempt::Failed;
            }
        };
        let Some(url) = SEARCH_URL.captures(&info).map(|caps| caps[1].to_string()) else {
            tracing::warn!("Package {record} was not found in channels {channels:?}");
            return Attempt::Failed;
        };
        let Some(filename) = url_filename(&url) else {
            tracing::warn!("Cannot determine an archive name from {url}");
            return Attempt::Failed;
        };
        if dry_run {
            tracing::info!("Would download {url}");
            return Attempt::Acquired;
        }
        match self.fetcher.fetch(&url, &dest_dir.join(filename)) {
            Ok(()) => Attempt::Acquired,
            Err(err) => {
                tracing::error!("Failed to download {record}: {err}");
                Attempt::Failed
            }
        }
    }
}

impl Acquire for CondaAcquirer {
    fn acquire(&self, record: &PackageRecord, dest_dir: &Path, dry_run: bool) -> bool {
        for source in self.sources(record) {
            let attempt = match &source {
                Source::Cached(path) => self.from_cache(path, dest_dir, dry_run),
                Source::Search => self.from_search(record, dest_dir, dry_run),
            };
            match attempt {
                Attempt::Acquired => return true,
                Attempt::Failed => return false,
                Attempt::Unavailable => continue,
            }
        }
        false
    }
}

/// Download strategy for PyPI packages.
///
/// Absence from the index is final; there is no fallback.
pub struct PypiAcquirer {
    pip: PipCli,
    runtime: RuntimeVersion,
    platform: Option<Platform>,
}

impl PypiAcquirer {
    pub fn new(pip: PipCli, runtime: RuntimeVersion, platform: Option<Platform>) -> Self {
        Self {
            pip,
            runtime,
            platform,
        }
    }
}

impl Acquire for PypiAcquirer {
    fn acquire(&self, record: &PackageRecord, dest_dir: &Path, dry_run: bool) -> bool {
        let result = if dry_run {
            self.pip
                .install_dry_run(record, &self.runtime, self.platform, dest_dir)
        } else {
            self.pip
                .download(record, &self.runtime, self.platform, dest_dir)
        };
        match result {
            Ok(output) => report_output(record, &output, self.pip.encoding()),
            Err(err) => {
                tracing::error!("Failed to run pip for {record}: {err}");
                false
            }
        }
    }
}

fn report_output(record: &PackageRecord, output: &CommandOutput, encoding: TextEncoding) -> bool {
    let stdout = encoding.decode(&output.stdout);
    if !stdout.trim().is_empty() {
        tracing::info!("{}", stdout.trim_end());
    }
    if output.success() {
        return true;
    }
    tracing::warn!("Failed to acquire {record} (exit code {:?})", output.code);
    tracing::error!("{}", encoding.decode(&output.stderr).trim_end());
    false
}
