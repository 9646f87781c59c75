// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Blocking execution of external package manager commands.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./exec_test.rs"]
mod exec_test;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program to completion and captures its output.
///
/// There is no timeout: a hung child blocks the caller.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<CommandOutput> {
        tracing::debug!("Running {} {:?}", program.display(), args);
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Argument list builder that keeps paths as OS strings.
#[derive(Debug, Clone, Default)]
pub(crate) struct Args(Vec<OsString>);

impl Args {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.0.push(arg.into());
        self
    }

    pub fn as_slice(&self) -> &[OsString] {
        &self.0
    }
}

/// Run a command whose failure to start is fatal.
pub(crate) fn run_checked(
    runner: &dyn CommandRunner,
    program: &Path,
    args: &Args,
) -> Result<CommandOutput> {
    runner
        .run(program, args.as_slice())
        .map_err(|error| Error::CommandFailed {
            program: program.to_path_buf(),
            error,
        })
}
