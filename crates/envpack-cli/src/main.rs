// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! envpack - Offline bundles of conda environments CLI

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_install;
mod cmd_pack;
mod cmd_pack_yaml;

use cmd_install::CmdInstall;
use cmd_pack::CmdPack;
use cmd_pack_yaml::CmdPackYaml;

#[derive(Parser)]
#[clap(
    name = "envpack",
    about = "Bundle conda environments for offline installation",
    version,
    long_about = "Collect the conda and PyPI archives of an environment into a directory that can be installed without network access"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(flatten)]
    tools: ToolFlags,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Locations of the package managers envpack drives.
#[derive(Parser, Clone, Debug, Default)]
pub struct ToolFlags {
    /// The conda executable
    #[clap(long, global = true, env = "CONDA_EXE")]
    pub conda_exe: Option<PathBuf>,

    /// conda package cache (default: <conda root>/pkgs)
    #[clap(long, global = true, env = "ENVPACK_PKGS_DIR")]
    pub pkgs_dir: Option<PathBuf>,

    /// Python interpreter used to run pip
    #[clap(long, global = true, env = "ENVPACK_PYTHON", default_value = "python")]
    pub python: PathBuf,
}

impl ToolFlags {
    pub fn conda(&self, encoding: envpack::TextEncoding) -> Result<envpack::CondaCli> {
        let mut config = envpack::CondaConfig::locate(self.conda_exe.clone())?;
        if let Some(pkgs_dir) = &self.pkgs_dir {
            config = config.with_pkgs_dir(pkgs_dir);
        }
        tracing::debug!(
            "Using conda at {} with package cache {}",
            config.executable.display(),
            config.pkgs_dir.display()
        );
        Ok(envpack::CondaCli::new(
            config,
            Arc::new(envpack::SystemRunner),
            encoding,
        ))
    }

    pub fn pip(&self, encoding: envpack::TextEncoding) -> envpack::PipCli {
        envpack::PipCli::new(&self.python, Arc::new(envpack::SystemRunner), encoding)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Pack the packages of an installed environment
    Pack(CmdPack),

    /// Pack the packages declared in an environment.yaml
    PackYaml(CmdPackYaml),

    /// Install a packed bundle into an environment
    Install(CmdInstall),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::INFO,
            (false, 1) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        let bar = (!self.logging.quiet).then(envpack::BarProgress::new);
        match &bar {
            // log lines clear the bar while they are written
            Some(bar) => {
                let bar = bar.clone();
                tracing_subscriber::fmt()
                    .with_max_level(log_level)
                    .with_writer(move || bar.writer(std::io::stderr()))
                    .init();
            }
            None => {
                tracing_subscriber::fmt()
                    .with_max_level(log_level)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }

        let progress: Box<dyn envpack::ProgressSink> = match bar {
            Some(bar) => Box::new(bar),
            None => Box::new(envpack::NoProgress),
        };

        // Dispatch to command
        match self.cmd {
            Command::Pack(mut cmd) => cmd.run(&self.tools, progress.as_ref()),
            Command::PackYaml(mut cmd) => cmd.run(&self.tools, progress.as_ref()),
            Command::Install(mut cmd) => cmd.run(&self.tools, progress.as_ref()),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
