// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Reconstruct the package identities already present in a bundle directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Ecosystem, IdentityKey, PackageRecord, Result};

#[cfg(test)]
#[path = "./scan_test.rs"]
mod scan_test;

/// `<name>-<version>-<build>.<ext>`; the version starts with a digit and is
/// matched lazily so hyphenated names and builds split correctly.
static CONDA_ARCHIVE: Lazy<Vec<(&'static str, Regex)>> =
    Lazy::new(|| archive_patterns(Ecosystem::Conda, r"^(.+)-(\d+.+?)-(.+)\."));

/// `<name>-<version>-<tags>.<ext>`
static PYPI_ARCHIVE: Lazy<Vec<(&'static str, Regex)>> =
    Lazy::new(|| archive_patterns(Ecosystem::Pypi, r"^(.+)-(\d+.+?)-.+\."));

fn archive_patterns(ecosystem: Ecosystem, prefix: &str) -> Vec<(&'static str, Regex)> {
    ecosystem
        .extensions()
        .iter()
        .map(|ext| {
            let pattern = format!("{prefix}{}$", regex::escape(ext));
            (*ext, Regex::new(&pattern).expect("archive pattern is valid"))
        })
        .collect()
}

/// Identities of the artifacts found in a directory tree.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingArtifacts {
    conda: HashSet<IdentityKey>,
    pypi: HashSet<IdentityKey>,
}

impl ExistingArtifacts {
    /// An empty set: nothing is skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn conda(&self) -> &HashSet<IdentityKey> {
        &self.conda
    }

    pub fn pypi(&self) -> &HashSet<IdentityKey> {
        &self.pypi
    }

    pub fn is_empty(&self) -> bool {
        self.conda.is_empty() && self.pypi.is_empty()
    }

    /// Whether an artifact for `record` is already materialized.
    pub fn contains(&self, record: &PackageRecord) -> bool {
        let key = record.identity();
        match key.ecosystem() {
            Ecosystem::Conda => self.conda.contains(&key),
            Ecosystem::Pypi => self.pypi.contains(&key),
        }
    }

    /// Record a conda archive filename; returns false if it does not parse.
    pub fn insert_conda_filename(&mut self, filename: &str) -> bool {
        let Some(caps) = match_archive(&CONDA_ARCHIVE, filename) else {
            return false;
        };
        self.conda
            .insert(IdentityKey::conda(&caps[1], &caps[2], &caps[3]));
        true
    }

    /// Record a PyPI archive filename under both its literal name and the
    /// name with underscores replaced by hyphens.
    pub fn insert_pypi_filename(&mut self, filename: &str) -> bool {
        let Some(caps) = match_archive(&PYPI_ARCHIVE, filename) else {
            return false;
        };
        let (name, version) = (&caps[1], &caps[2]);
        self.pypi.insert(IdentityKey::pypi(name, version));
        self.pypi
            .insert(IdentityKey::pypi(name.replace('_', "-"), version));
        true
    }
}

fn match_archive<'t>(
    patterns: &[(&'static str, Regex)],
    filename: &'t str,
) -> Option<regex::Captures<'t>> {
    patterns
        .iter()
        .filter(|(ext, _)| filename.ends_with(&format!(".{ext}")))
        .find_map(|(_, regex)| regex.captures(filename))
}

/// Recursively find files under `dir` with the given extension.
pub fn find_archives(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(ext)
    );
    let paths = glob::glob(&pattern).map_err(|err| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{pattern}: {err}"))
    })?;
    let mut found = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => found.push(path),
            Ok(_) => {}
            Err(err) => tracing::debug!("Skipping unreadable path: {err}"),
        }
    }
    Ok(found)
}

/// Scan a directory tree for conda and PyPI archives.
///
/// Files whose names do not follow the archive naming conventions are ignored.
pub fn scan(dir: &Path) -> Result<ExistingArtifacts> {
    let mut existing = ExistingArtifacts::empty();
    for ecosystem in [Ecosystem::Conda, Ecosystem::Pypi] {
        for ext in ecosystem.extensions() {
            for path in find_archives(dir, ext)? {
                let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let parsed = match ecosystem {
                    Ecosystem::Conda => existing.insert_conda_filename(filename),
                    Ecosystem::Pypi => existing.insert_pypi_filename(filename),
                };
                if !parsed {
                    tracing::debug!("Ignoring unrecognized archive name: {filename}");
                }
            }
        }
    }
    tracing::debug!(
        "Found {} conda and {} pypi artifacts in {}",
        existing.conda.len(),
        existing.pypi.len(),
        dir.display()
    );
    Ok(existing)
}
