// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Offline installation of a bundle into an existing environment.

use std::path::{Path, PathBuf};

use crate::exec::CommandOutput;
use crate::{
    find_archives, CondaCli, Ecosystem, Error, ProgressSink, Result, TextEncoding, RUNTIME_PACKAGE,
};

#[cfg(test)]
#[path = "./install_test.rs"]
mod install_test;

/// The archives of a bundle directory, in installation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleArchives {
    /// Runtime archives first, then by file name.
    pub conda: Vec<PathBuf>,
    /// By file name.
    pub pypi: Vec<PathBuf>,
}

impl BundleArchives {
    /// Recursively collect every archive under `bundle_dir`.
    pub fn collect(bundle_dir: &Path) -> Result<Self> {
        if !bundle_dir.is_dir() {
            return Err(Error::BundleNotFound(bundle_dir.to_path_buf()));
        }
        let collect = |ecosystem: Ecosystem| -> Result<Vec<PathBuf>> {
            let mut found = Vec::new();
            for ext in ecosystem.extensions() {
                found.extend(find_archives(bundle_dir, ext)?);
            }
            Ok(found)
        };

        let mut conda = collect(Ecosystem::Conda)?;
        conda.sort_by_key(|path| (!is_runtime_archive(path), file_name(path)));
        let mut pypi = collect(Ecosystem::Pypi)?;
        pypi.sort_by_key(|path| file_name(path));
        Ok(Self { conda, pypi })
    }

    pub fn len(&self) -> usize {
        self.conda.len() + self.pypi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether an archive holds the runtime itself (`python-*` or `python_*`).
pub fn is_runtime_archive(path: &Path) -> bool {
    let name = file_name(path).to_lowercase();
    ["-", "_"]
        .iter()
        .any(|sep| name.starts_with(&format!("{RUNTIME_PACKAGE}{sep}")))
}

/// Outcome of installing a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub conda_total: usize,
    pub pypi_total: usize,
    pub conda_failed: Vec<PathBuf>,
    pub pypi_failed: Vec<PathBuf>,
}

impl InstallReport {
    pub fn total(&self) -> usize {
        self.conda_total + self.pypi_total
    }

    pub fn n_failed(&self) -> usize {
        self.conda_failed.len() + self.pypi_failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.n_failed() == 0
    }

    fn log_summary(&self) {
        for (label, failed) in [("conda", &self.conda_failed), ("PyPI", &self.pypi_failed)] {
            if failed.is_empty() {
                tracing::info!("All {label} packages installed successfully.");
                continue;
            }
            tracing::warn!("Failed to install {} {label} packages.", failed.len());
            for path in failed {
                tracing::warn!("  - {}", path.display());
            }
        }
        tracing::info!(
            "Installed {} of {} packages.",
            self.total() - self.n_failed(),
            self.total()
        );
        if !self.is_success() {
            tracing::warn!("Some packages failed to install. Please check the logs.");
        }
    }
}

/// Install every archive of `bundle_dir` into the environment `env_name`.
///
/// conda archives are installed offline first, then PyPI archives through
/// the environment's pip. A failed archive is logged and recorded; the
/// remaining archives are still installed.
pub fn install_packages(
    conda: &CondaCli,
    env_name: &str,
    bundle_dir: &Path,
    progress: &dyn ProgressSink,
) -> Result<InstallReport> {
    conda.check_env_name(env_name)?;
    let archives = BundleArchives::collect(bundle_dir)?;
    tracing::info!(
        "Installing packages from '{}' into '{env_name}'",
        bundle_dir.display()
    );

    let mut report = InstallReport {
        conda_total: archives.conda.len(),
        pypi_total: archives.pypi.len(),
        ..Default::default()
    };

    let encoding = conda.encoding();
    report.conda_failed = install_each(&archives.conda, encoding, progress, |archive| {
        conda.install_offline(env_name, archive)
    });
    report.pypi_failed = install_each(&archives.pypi, encoding, progress, |archive| {
        conda.pip_install(env_name, archive)
    });

    report.log_summary();
    Ok(report)
}

fn install_each<F>(
    archives: &[PathBuf],
    encoding: TextEncoding,
    progress: &dyn ProgressSink,
    install: F,
) -> Vec<PathBuf>
where
    F: Fn(&Path) -> std::io::Result<CommandOutput>,
{
    let mut failed = Vec::new();
    progress.start(archives.len() as u64);
    for archive in archives {
        progress.set_description(&file_name(archive));
        if !installed(archive, install(archive), encoding) {
            failed.push(archive.clone());
        }
        progress.advance();
    }
    progress.close();
    failed
}

fn installed(
    archive: &Path,
    result: std::io::Result<CommandOutput>,
    encoding: TextEncoding,
) -> bool {
    match result {
        Ok(output) => {
            let stdout = encoding.decode(&output.stdout);
            if !stdout.trim().is_empty() {
                tracing::info!("{}", stdout.trim_end());
            }
            if output.success() {
                return true;
            }
            tracing::warn!("Failed to install package: {}", archive.display());
            tracing::error!("{}", encoding.decode(&output.stderr).trim_end());
            false
        }
        Err(err) => {
            tracing::error!("Failed to run installer for {}: {err}", archive.display());
            false
        }
    }
}
