// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Enumeration of the packages that make up an environment.

use std::path::PathBuf;

use crate::{detect_runtime_version, CondaCli, Manifest, PackageRecord, Result, RuntimeVersion};

#[cfg(test)]
#[path = "./enumerate_test.rs"]
mod enumerate_test;

/// Where the package list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    /// A live environment known to conda, by name or prefix.
    LiveEnv(String),
    /// A declarative `environment.yaml` file.
    Manifest(PathBuf),
}

/// The authoritative package list for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerated {
    pub env_name: String,
    /// Records in listing or declaration order.
    pub records: Vec<PackageRecord>,
    pub runtime_version: RuntimeVersion,
    /// Channels declared by a manifest; empty for live environments.
    pub channels: Vec<String>,
}

/// List the packages of `source` and detect its runtime version.
///
/// Live environments are validated against `conda info -e` first.
pub fn enumerate(conda: &CondaCli, source: &PackageSource) -> Result<Enumerated> {
    let (env_name, records, channels) = match source {
        PackageSource::LiveEnv(name) => {
            conda.check_env_name(name)?;
            tracing::info!("Listing packages of environment '{name}'");
            (name.clone(), conda.list_packages(name)?, Vec::new())
        }
        PackageSource::Manifest(path) => {
            tracing::info!("Reading environment manifest {}", path.display());
            let manifest = Manifest::load(path)?;
            (manifest.name, manifest.packages, manifest.channels)
        }
    };
    let runtime_version = detect_runtime_version(&records)?;
    tracing::info!(
        "Environment '{env_name}' has {} packages (Python {runtime_version})",
        records.len()
    );
    Ok(Enumerated {
        env_name,
        records,
        runtime_version,
        channels,
    })
}
