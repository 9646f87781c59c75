// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envpack pack` command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use miette::Result;

use crate::ToolFlags;

/// Pack the packages of an installed environment
#[derive(Debug, Args)]
pub struct CmdPack {
    /// Environment to pack (name or prefix)
    #[clap(short = 'n', long, env = "CONDA_DEFAULT_ENV")]
    env_name: String,

    #[clap(flatten)]
    flags: PackFlags,
}

/// Options shared by the pack commands.
#[derive(Debug, Clone, Args)]
pub struct PackFlags {
    /// Directory that receives the bundle
    #[clap(short = 'd', long, default_value = ".")]
    pub target_dir: PathBuf,

    /// Resolve packages without writing any files
    #[clap(short = 'D', long)]
    pub dry_run: bool,

    /// Text encoding of conda and pip output (default: utf-8)
    #[clap(short = 'e', long)]
    pub encoding: Option<String>,

    /// Write only packages missing from an existing bundle, into diffs/<timestamp>
    #[clap(long)]
    pub diff_only: bool,

    /// Target platform, e.g. win-64, linux-64, osx-arm64 (default: this machine)
    #[clap(short = 'p', long)]
    pub platform: Option<String>,
}

impl PackFlags {
    /// Run the pack pipeline for `source` and print its summary.
    pub fn pack(
        &self,
        source: envpack::PackageSource,
        tools: &ToolFlags,
        progress: &dyn envpack::ProgressSink,
    ) -> Result<i32> {
        let encoding = envpack::TextEncoding::resolve(self.encoding.as_deref())?;
        let platform = self
            .platform
            .as_deref()
            .map(envpack::Platform::parse)
            .transpose()?;

        let context = envpack::PackContext {
            conda: tools.conda(encoding)?,
            pip: tools.pip(encoding),
            fetcher: Arc::new(envpack::HttpFetcher::new()?),
        };
        let request = envpack::PackRequest {
            source,
            target_dir: self.target_dir.clone(),
            dry_run: self.dry_run,
            diff_only: self.diff_only,
            platform,
        };

        let report = envpack::pack(&context, &request, progress)?;
        print_report(&report, self.dry_run);
        Ok(0)
    }
}

impl CmdPack {
    pub fn run(&mut self, tools: &ToolFlags, progress: &dyn envpack::ProgressSink) -> Result<i32> {
        let source = envpack::PackageSource::LiveEnv(self.env_name.clone());
        self.flags.pack(source, tools, progress)
    }
}

fn print_report(report: &envpack::PackReport, dry_run: bool) {
    let summary = &report.reconcile;
    let title = if dry_run { "Dry Run Summary:" } else { "Pack Summary:" };
    println!();
    println!("{}", title.bold());
    println!("  Environment: {}", report.env_name.cyan());
    println!("  Python:      {}", report.runtime_version.to_string().cyan());
    println!("  Output:      {}", report.output_dir.display());
    println!(
        "  Packages:    {} succeeded, {} already present, {} failed (of {})",
        summary.n_success().to_string().green(),
        summary.skipped,
        summary.failures.len().to_string().red(),
        summary.total
    );

    if !summary.failures.is_empty() {
        println!();
        println!("{}", "Failed Packages:".bold());
        for record in summary.failures.iter() {
            println!("  - {}", record.to_string().red());
        }
    }
}
