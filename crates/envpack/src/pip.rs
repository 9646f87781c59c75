// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Thin client over `python -m pip`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::exec::{Args, CommandOutput, CommandRunner};
use crate::{PackageRecord, Platform, RuntimeVersion, TextEncoding};

#[cfg(test)]
#[path = "./pip_test.rs"]
mod pip_test;

/// Runs pip through a specific Python interpreter.
#[derive(Clone)]
pub struct PipCli {
    python: PathBuf,
    runner: Arc<dyn CommandRunner>,
    encoding: TextEncoding,
}

impl PipCli {
    pub fn new(
        python: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        encoding: TextEncoding,
    ) -> Self {
        Self {
            python: python.into(),
            runner,
            encoding,
        }
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Version of the interpreter pip runs under, if it can be determined.
    pub fn host_version(&self) -> Option<RuntimeVersion> {
        let output = match self.runner.run(&self.python, Args::new(["--version"]).as_slice()) {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!("Failed to run {}: {err}", self.python.display());
                return None;
            }
        };
        // Python 2 printed its version on stderr.
        RuntimeVersion::from_version_output(&self.encoding.decode(&output.stdout))
            .or_else(|| RuntimeVersion::from_version_output(&self.encoding.decode(&output.stderr)))
    }

    /// `pip download <name>==<version> --no-deps` into `dest`.
    pub fn download(
        &self,
        record: &PackageRecord,
        runtime: &RuntimeVersion,
        platform: Option<Platform>,
        dest: &Path,
    ) -> std::io::Result<CommandOutput> {
        let mut args = Args::new(["-m", "pip", "download"]);
        args.arg(record.pip_spec())
            .arg("--no-deps")
            .arg("--python-version")
            .arg(runtime.short())
            .arg("-d")
            .arg(dest);
        if let Some(platform) = platform {
            args.arg("--platform").arg(platform.pypi_tag());
        }
        self.runner.run(&self.python, args.as_slice())
    }

    /// `pip install --dry-run` resolution of one exact requirement.
    ///
    /// Without a platform the simulation targets `target`, so the host
    /// site-packages is never consulted.
    pub fn install_dry_run(
        &self,
        record: &PackageRecord,
        runtime: &RuntimeVersion,
        platform: Option<Platform>,
        target: &Path,
    ) -> std::io::Result<CommandOutput> {
        let mut args = Args::new(["-m", "pip", "install"]);
        args.arg(record.pip_spec())
            .arg("--no-deps")
            .arg("--no-build-isolation")
            .arg("--python-version")
            .arg(runtime.short())
            .arg("--dry-run")
            .arg("--force-reinstall");
        match platform {
            Some(platform) => {
                args.arg("--platform").arg(platform.pypi_tag());
            }
            None => {
                args.arg("--target").arg(target);
            }
        }
        self.runner.run(&self.python, args.as_slice())
    }
}
