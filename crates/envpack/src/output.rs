// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Layout of the bundle directory a run writes into.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::{scan, Ecosystem, Error, ExistingArtifacts, Result};

#[cfg(test)]
#[path = "./output_test.rs"]
mod output_test;

/// Sub-directory holding one directory per diff run.
pub const DIFFS_DIRNAME: &str = "diffs";

/// Timestamp format of diff run directories.
pub const DIFF_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// Where a run writes and what it may skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedOutput {
    /// The environment's bundle directory, `<target_root>/<env_name>`.
    pub env_dir: PathBuf,
    /// Directory receiving this run's archives; differs from `env_dir` only for diff runs.
    pub output_dir: PathBuf,
    /// Artifacts already present in `env_dir`; empty unless this is a diff run.
    pub existing: ExistingArtifacts,
}

impl PreparedOutput {
    /// Directory receiving archives of one ecosystem.
    pub fn ecosystem_dir(&self, ecosystem: Ecosystem) -> PathBuf {
        self.output_dir.join(ecosystem.dirname())
    }
}

/// Decide the output directory for `env_name` under `target_root`.
pub fn prepare(
    target_root: &Path,
    env_name: &str,
    diff_only: bool,
    dry_run: bool,
) -> Result<PreparedOutput> {
    prepare_at(target_root, env_name, diff_only, dry_run, Local::now())
}

/// [`prepare`] with an explicit clock reading for the diff directory name.
pub fn prepare_at(
    target_root: &Path,
    env_name: &str,
    diff_only: bool,
    dry_run: bool,
    now: DateTime<Local>,
) -> Result<PreparedOutput> {
    if !target_root.is_dir() {
        return Err(Error::TargetDirNotFound(target_root.to_path_buf()));
    }
    let env_dir = target_root.join(env_name);

    let (output_dir, existing) = if !env_dir.exists() {
        tracing::info!("Creating new bundle directory {}", env_dir.display());
        (env_dir.clone(), ExistingArtifacts::empty())
    } else if diff_only {
        let existing = scan(&env_dir)?;
        let diff_dir = env_dir
            .join(DIFFS_DIRNAME)
            .join(now.format(DIFF_TIMESTAMP_FORMAT).to_string());
        tracing::info!(
            "Writing only new packages to {} ({} conda and {} pypi packages already present)",
            diff_dir.display(),
            existing.conda().len(),
            existing.pypi().len()
        );
        (diff_dir, existing)
    } else {
        tracing::info!("Adding packages to existing directory {}", env_dir.display());
        (env_dir.clone(), ExistingArtifacts::empty())
    };

    let prepared = PreparedOutput {
        env_dir,
        output_dir,
        existing,
    };
    if dry_run {
        tracing::debug!("Dry run; not creating {}", prepared.output_dir.display());
        return Ok(prepared);
    }
    for ecosystem in [Ecosystem::Conda, Ecosystem::Pypi] {
        std::fs::create_dir_all(prepared.ecosystem_dir(ecosystem))?;
    }
    Ok(prepared)
}
