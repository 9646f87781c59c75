// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Detection of the Python runtime pinned by an environment.

use std::fmt;

use crate::{Error, PackageRecord, Result};

#[cfg(test)]
#[path = "./runtime_test.rs"]
mod runtime_test;

/// Package name of the language runtime.
pub const RUNTIME_PACKAGE: &str = "python";

/// A runtime version string such as `3.11.5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeVersion(String);

impl RuntimeVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric major and minor components, if the version has them.
    pub fn major_minor(&self) -> Option<(u32, u32)> {
        let mut parts = self.0.split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = parts
            .next()?
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok()?;
        Some((major, minor))
    }

    /// `X.Y` form used to constrain pip, or the full string if it does not parse.
    pub fn short(&self) -> String {
        match self.major_minor() {
            Some((major, minor)) => format!("{major}.{minor}"),
            None => self.0.clone(),
        }
    }

    /// Parse the output of `python --version` (`Python 3.11.5`).
    pub fn from_version_output(text: &str) -> Option<Self> {
        let version = text
            .split_whitespace()
            .skip_while(|token| !token.eq_ignore_ascii_case("python"))
            .nth(1)?;
        let version = Self::new(version);
        version.major_minor().map(|_| version)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find the runtime version among enumerated records.
///
/// The first record whose name matches [`RUNTIME_PACKAGE`] case-insensitively wins.
pub fn detect_runtime_version(records: &[PackageRecord]) -> Result<RuntimeVersion> {
    records
        .iter()
        .find(|r| r.name().eq_ignore_ascii_case(RUNTIME_PACKAGE))
        .map(|r| RuntimeVersion::new(r.version()))
        .ok_or_else(|| Error::RuntimeNotFound {
            package: RUNTIME_PACKAGE.to_string(),
        })
}

/// Warn when the environment's runtime differs from the host interpreter.
///
/// Returns whether the two agree on major.minor; an unknown host counts as agreeing.
pub fn check_runtime_version(env: &RuntimeVersion, host: Option<&RuntimeVersion>) -> bool {
    let Some(host) = host else {
        tracing::debug!("Host Python version is unknown; skipping version check");
        return true;
    };
    if env.major_minor() == host.major_minor() {
        return true;
    }
    tracing::warn!(
        "The Python version of the conda environment ({env}) and the current Python version ({host}) do not match. \
         It is recommended to use the same Python version."
    );
    false
}
