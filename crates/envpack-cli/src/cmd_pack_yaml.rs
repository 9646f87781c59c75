// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `envpack pack-yaml` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

use crate::cmd_pack::PackFlags;
use crate::ToolFlags;

/// Pack the packages declared in an environment.yaml
#[derive(Debug, Args)]
pub struct CmdPackYaml {
    /// Environment manifest to pack
    file: PathBuf,

    #[clap(flatten)]
    flags: PackFlags,
}

impl CmdPackYaml {
    pub fn run(&mut self, tools: &ToolFlags, progress: &dyn envpack::ProgressSink) -> Result<i32> {
        let source = envpack::PackageSource::Manifest(self.file.clone());
        self.flags.pack(source, tools, progress)
    }
}
