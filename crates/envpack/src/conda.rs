// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Thin client over the conda command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::exec::{run_checked, Args, CommandOutput, CommandRunner};
use crate::{Error, PackageRecord, Platform, Result, TextEncoding};

#[cfg(test)]
#[path = "./conda_test.rs"]
mod conda_test;

/// Location of a conda installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondaConfig {
    /// The conda executable (what `CONDA_EXE` points at).
    pub executable: PathBuf,
    /// The package cache holding downloaded archives.
    pub pkgs_dir: PathBuf,
}

impl CondaConfig {
    /// Validate a conda executable and derive the default package cache
    /// (`<root>/pkgs`, where the executable lives in `<root>/bin`).
    pub fn locate(executable: Option<PathBuf>) -> Result<Self> {
        let executable = executable.ok_or(Error::CondaNotConfigured(None))?;
        if !executable.is_file() {
            return Err(Error::CondaNotConfigured(Some(executable)));
        }
        let executable = dunce::canonicalize(&executable)?;
        let root = executable
            .parent()
            .and_then(Path::parent)
            .ok_or_else(|| Error::CondaNotConfigured(Some(executable.clone())))?;
        let pkgs_dir = root.join("pkgs");
        Ok(Self {
            executable,
            pkgs_dir,
        })
    }

    /// Replace the package cache location.
    pub fn with_pkgs_dir(mut self, pkgs_dir: impl Into<PathBuf>) -> Self {
        self.pkgs_dir = pkgs_dir.into();
        self
    }
}

/// Runs conda subcommands and decodes their output.
#[derive(Clone)]
pub struct CondaCli {
    config: CondaConfig,
    runner: Arc<dyn CommandRunner>,
    encoding: TextEncoding,
}

impl CondaCli {
    pub fn new(config: CondaConfig, runner: Arc<dyn CommandRunner>, encoding: TextEncoding) -> Self {
        Self {
            config,
            runner,
            encoding,
        }
    }

    pub fn config(&self) -> &CondaConfig {
        &self.config
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    fn run(&self, args: &Args) -> std::io::Result<CommandOutput> {
        self.runner.run(&self.config.executable, args.as_slice())
    }

    fn environment_listing(&self) -> Result<String> {
        let output = run_checked(
            self.runner.as_ref(),
            &self.config.executable,
            &Args::new(["info", "-e"]),
        )?;
        Ok(self.encoding.decode(&output.stdout))
    }

    /// Names of all environments known to conda (`conda info -e`).
    pub fn environments(&self) -> Result<Vec<String>> {
        Ok(parse_environments(&self.environment_listing()?))
    }

    /// Fail with [`Error::UnknownEnvironment`] unless `name` is a known
    /// environment name, or the prefix of one when given as an absolute path.
    pub fn check_env_name(&self, name: &str) -> Result<()> {
        let listing = self.environment_listing()?;
        let known = parse_environments(&listing);
        let found = if is_prefix(name) {
            parse_environment_prefixes(&listing)
                .iter()
                .any(|prefix| Path::new(prefix) == Path::new(name))
        } else {
            known.iter().any(|env| env == name)
        };
        if found {
            Ok(())
        } else {
            Err(Error::UnknownEnvironment {
                name: name.to_string(),
                known,
            })
        }
    }

    /// Packages installed in an environment (`conda list -n <env>`), in listing order.
    pub fn list_packages(&self, env_name: &str) -> Result<Vec<PackageRecord>> {
        let output = run_checked(
            self.runner.as_ref(),
            &self.config.executable,
            &Args::new(["list", env_flag(env_name), env_name]),
        )?;
        if !output.success() {
            tracing::warn!(
                "conda list exited with {:?}: {}",
                output.code,
                self.encoding.decode(&output.stderr)
            );
        }
        parse_package_list(&self.encoding.decode(&output.stdout))
    }

    /// Repository metadata for one exact package (`conda search --info`).
    pub fn search_info(
        &self,
        record: &PackageRecord,
        platform: Option<Platform>,
        channels: &[String],
    ) -> std::io::Result<String> {
        let mut args = Args::new(["search".to_string(), record.conda_spec(), "--info".to_string()]);
        if let Some(platform) = platform {
            args.arg("--platform").arg(platform.conda_subdir());
        }
        for channel in channels {
            args.arg("-c").arg(channel);
        }
        let output = self.run(&args)?;
        if !output.success() {
            tracing::debug!(
                "conda search exited with {:?}: {}",
                output.code,
                self.encoding.decode(&output.stderr)
            );
        }
        Ok(self.encoding.decode(&output.stdout))
    }

    /// Install a local archive without touching the network.
    pub fn install_offline(&self, env_name: &str, archive: &Path) -> std::io::Result<CommandOutput> {
        let mut args = Args::new([
            "install",
            "-y",
            env_flag(env_name),
            env_name,
            "--offline",
            "--use-local",
        ]);
        args.arg(archive);
        self.run(&args)
    }

    /// Install a local distribution with the environment's own pip.
    pub fn pip_install(&self, env_name: &str, archive: &Path) -> std::io::Result<CommandOutput> {
        let mut args = Args::new([
            "run",
            env_flag(env_name),
            env_name,
            "pip",
            "install",
            "--no-deps",
            "--no-build-isolation",
        ]);
        args.arg(archive);
        self.run(&args)
    }
}

/// Whether an environment argument is a prefix path rather than a name.
fn is_prefix(env: &str) -> bool {
    Path::new(env).is_absolute()
}

/// `-p` for environments given by prefix, `-n` for names.
pub(crate) fn env_flag(env: &str) -> &'static str {
    if is_prefix(env) { "-p" } else { "-n" }
}

/// Extract environment prefixes (the last column) from `conda info -e` output.
pub fn parse_environment_prefixes(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next_back())
        .map(String::from)
        .collect()
}

/// Extract environment names from `conda info -e` output.
pub fn parse_environments(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(String::from)
        .collect()
}

/// Parse `conda list` output into package records.
///
/// Each data line is `name version build [channel]`; comment lines start with `#`.
pub fn parse_package_list(text: &str) -> Result<Vec<PackageRecord>> {
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [name, version, build, rest @ ..] = tokens.as_slice() else {
            return Err(Error::MalformedListing {
                line: line.to_string(),
            });
        };
        let channel = rest.first().copied().unwrap_or("");
        records.push(PackageRecord::new(*name, *version, *build, channel));
    }
    Ok(records)
}
