// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Package identities shared by every stage of a run.

use std::fmt;

#[cfg(test)]
#[path = "./record_test.rs"]
mod record_test;

/// Channel value that marks a package as coming from the Python package index.
pub const INDEX_CHANNEL: &str = "pypi";

/// Which package ecosystem an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// conda: channel and build pinned archives
    Conda,
    /// PyPI: `name==version` addressed distributions
    Pypi,
}

impl Ecosystem {
    /// Archive extensions produced by this ecosystem, in lookup order.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Conda => crate::EXTENSIONS_CONDA,
            Self::Pypi => crate::EXTENSIONS_PYPI,
        }
    }

    /// Name of the bundle sub-directory holding this ecosystem's archives.
    pub fn dirname(self) -> &'static str {
        match self {
            Self::Conda => "conda",
            Self::Pypi => "pypi",
        }
    }
}

/// One pinned package: name, version, build and channel.
///
/// Records are immutable once built. Equality and hashing cover all four
/// fields; use [`PackageRecord::identity`] to compare artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageRecord {
    name: String,
    version: String,
    build: String,
    channel: String,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build: build.into(),
            channel: channel.into(),
        }
    }

    /// A conda record from the default channel.
    pub fn conda(
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self::new(name, version, build, "")
    }

    /// A PyPI record; the build is always empty.
    pub fn pypi(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, version, "", INDEX_CHANNEL)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn build(&self) -> &str {
        &self.build
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn ecosystem(&self) -> Ecosystem {
        if self.channel == INDEX_CHANNEL {
            Ecosystem::Pypi
        } else {
            Ecosystem::Conda
        }
    }

    /// The key that identifies this record's artifact within its ecosystem.
    ///
    /// The channel never takes part in the key.
    pub fn identity(&self) -> IdentityKey {
        match self.ecosystem() {
            Ecosystem::Conda => IdentityKey::Conda {
                name: self.name.clone(),
                version: self.version.clone(),
                build: self.build.clone(),
            },
            Ecosystem::Pypi => IdentityKey::Pypi {
                name: self.name.clone(),
                version: self.version.clone(),
            },
        }
    }

    /// `name=version=build`, the conda match spec for this exact record.
    pub fn conda_spec(&self) -> String {
        format!("{}={}={}", self.name, self.version, self.build)
    }

    /// `name==version`, the pip requirement for this exact record.
    pub fn pip_spec(&self) -> String {
        format!("{}=={}", self.name, self.version)
    }

    /// Conda archive filename stem: `name-version-build`.
    pub fn archive_stem(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.build)
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ecosystem() {
            Ecosystem::Conda if self.channel.is_empty() => f.write_str(&self.conda_spec()),
            Ecosystem::Conda => write!(f, "{}::{}", self.channel, self.conda_spec()),
            Ecosystem::Pypi => f.write_str(&self.pip_spec()),
        }
    }
}

/// Artifact identity used for existing-vs-required comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityKey {
    Conda {
        name: String,
        version: String,
        build: String,
    },
    Pypi {
        name: String,
        version: String,
    },
}

impl IdentityKey {
    pub fn conda(
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self::Conda {
            name: name.into(),
            version: version.into(),
            build: build.into(),
        }
    }

    pub fn pypi(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::Pypi {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            Self::Conda { .. } => Ecosystem::Conda,
            Self::Pypi { .. } => Ecosystem::Pypi,
        }
    }
}
