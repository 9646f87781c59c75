// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envpack install` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;

use crate::ToolFlags;

/// Install a packed bundle into an environment
#[derive(Debug, Args)]
pub struct CmdInstall {
    /// Bundle directory to install from
    #[clap(default_value = ".")]
    dir: PathBuf,

    /// Environment to install into (default: the active environment, or
    /// the bundle directory's name with --generate-scripts)
    #[clap(short = 'n', long)]
    env_name: Option<String>,

    /// The active conda environment
    #[clap(long, env = "CONDA_DEFAULT_ENV", hide = true)]
    active_env: Option<String>,

    /// Text encoding of conda output (default: utf-8)
    #[clap(short = 'e', long)]
    encoding: Option<String>,

    /// Write install_packages.bat and install_packages.sh instead of installing
    #[clap(long)]
    generate_scripts: bool,

    /// Where to write the generated scripts (default: the bundle directory)
    #[clap(long, requires = "generate_scripts")]
    output_dir: Option<PathBuf>,
}

impl CmdInstall {
    pub fn run(&mut self, tools: &ToolFlags, progress: &dyn envpack::ProgressSink) -> Result<i32> {
        if self.generate_scripts {
            return self.generate();
        }

        let Some(env_name) = self.env_name.as_ref().or(self.active_env.as_ref()) else {
            return Err(miette::miette!(
                help = "Pass -n <ENV> or activate the target environment",
                "No target environment given"
            ));
        };
        let encoding = envpack::TextEncoding::resolve(self.encoding.as_deref())?;
        let conda = tools.conda(encoding)?;
        let report = envpack::install_packages(&conda, env_name, &self.dir, progress)?;

        println!();
        println!("{}", "Install Summary:".bold());
        println!("  Environment: {}", env_name.cyan());
        println!(
            "  conda:       {} of {} installed",
            (report.conda_total - report.conda_failed.len()).to_string().green(),
            report.conda_total
        );
        println!(
            "  PyPI:        {} of {} installed",
            (report.pypi_total - report.pypi_failed.len()).to_string().green(),
            report.pypi_total
        );
        for path in report.conda_failed.iter().chain(&report.pypi_failed) {
            println!("  {} {}", "failed:".red(), path.display());
        }
        Ok(0)
    }

    fn generate(&self) -> Result<i32> {
        let options = envpack::ScriptOptions {
            env_name: self.env_name.clone(),
            output_dir: self.output_dir.clone(),
            ..Default::default()
        };
        let scripts = envpack::generate_install_scripts(&self.dir, &options)?;

        println!("{}", "Generated Scripts:".bold());
        println!("  Windows batch:     {}", scripts.batch.display().to_string().cyan());
        println!("  Unix/Linux shell:  {}", scripts.shell.display().to_string().cyan());
        Ok(0)
    }
}
