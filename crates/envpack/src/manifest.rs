// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Parsing of conda environment files (`environment.yaml`).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, PackageRecord, Result};

#[cfg(test)]
#[path = "./manifest_test.rs"]
mod manifest_test;

/// Key of the nested mapping that lists PyPI requirements.
const PIP_KEY: &str = "pip";

/// Raw document shape; dependencies are validated one by one afterwards.
#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,
    #[serde(default)]
    channels: Vec<String>,
    #[serde(default)]
    dependencies: Vec<serde_yaml::Value>,
}

/// A declared environment: its name, channels and pinned packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    /// Channels in priority order.
    pub channels: Vec<String>,
    /// Packages in declaration order.
    pub packages: Vec<PackageRecord>,
    /// Path to the file this was loaded from (None when parsed from text).
    pub source_path: Option<PathBuf>,
}

impl Manifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawManifest =
            serde_yaml::from_str(yaml).map_err(|error| Error::InvalidManifest { error })?;

        let mut packages = Vec::new();
        for entry in &raw.dependencies {
            parse_dependency(entry, &mut packages)?;
        }

        Ok(Self {
            name: raw.name,
            channels: raw.channels,
            packages,
            source_path: None,
        })
    }

    /// Load a manifest from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ManifestNotFound(path.to_path_buf()));
        }
        let yaml = std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
            path: path.to_path_buf(),
            error,
        })?;
        let mut manifest = Self::from_yaml(&yaml)?;
        manifest.source_path = Some(path.to_path_buf());
        Ok(manifest)
    }
}

fn invalid(entry: &serde_yaml::Value) -> Error {
    let entry = serde_yaml::to_string(entry)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{entry:?}"));
    Error::InvalidDependency { entry }
}

/// Append the record(s) described by one `dependencies` entry.
fn parse_dependency(entry: &serde_yaml::Value, out: &mut Vec<PackageRecord>) -> Result<()> {
    match entry {
        serde_yaml::Value::String(spec) => {
            let parts: Vec<&str> = spec.split('=').collect();
            let [name, version, build] = parts.as_slice() else {
                return Err(invalid(entry));
            };
            if name.is_empty() || version.is_empty() {
                return Err(invalid(entry));
            }
            out.push(PackageRecord::conda(name.trim(), version.trim(), build.trim()));
        }
        serde_yaml::Value::Mapping(mapping) => {
            let Some(serde_yaml::Value::Sequence(requirements)) = mapping.get(PIP_KEY) else {
                return Err(invalid(entry));
            };
            for requirement in requirements {
                let Some((name, version)) = requirement.as_str().and_then(|r| r.split_once("=="))
                else {
                    return Err(invalid(requirement));
                };
                if name.trim().is_empty() || version.trim().is_empty() {
                    return Err(invalid(requirement));
                }
                out.push(PackageRecord::pypi(name.trim(), version.trim()));
            }
        }
        _ => return Err(invalid(entry)),
    }
    Ok(())
}
