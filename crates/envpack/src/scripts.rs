// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Standalone install scripts that replay a bundle without envpack.

use std::path::{Component, Path, PathBuf};

use crate::conda::env_flag;
use crate::{BundleArchives, Error, Result};

#[cfg(test)]
#[path = "./scripts_test.rs"]
mod scripts_test;

pub const BATCH_SCRIPT_NAME: &str = "install_packages.bat";
pub const SHELL_SCRIPT_NAME: &str = "install_packages.sh";

/// Archives per install command when not configured.
pub const DEFAULT_PACKAGES_PER_LINE: usize = 1;

/// Options for [`generate_install_scripts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Target environment; defaults to the bundle directory's name.
    pub env_name: Option<String>,
    /// Where the scripts are written; defaults to the bundle directory.
    pub output_dir: Option<PathBuf>,
    /// Number of archives passed to each install command.
    pub packages_per_line: usize,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            env_name: None,
            output_dir: None,
            packages_per_line: DEFAULT_PACKAGES_PER_LINE,
        }
    }
}

/// Paths of the generated scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallScripts {
    pub batch: PathBuf,
    pub shell: PathBuf,
}

/// Shell dialect of a generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Batch,
    Shell,
}

impl Dialect {
    fn line_ending(self) -> &'static str {
        match self {
            Self::Batch => "\r\n",
            Self::Shell => "\n",
        }
    }

    fn header(self) -> &'static [&'static str] {
        match self {
            Self::Batch => &[
                "@echo off",
                "setlocal enabledelayedexpansion",
                "",
                "REM Get the directory where this script is located",
                r#"set "SCRIPT_DIR=%~dp0""#,
                "REM Remove trailing backslash for proper path concatenation",
                r#"if "!SCRIPT_DIR:~-1!"=="\" set "SCRIPT_DIR=!SCRIPT_DIR:~0,-1!""#,
                r#"cd /d "!SCRIPT_DIR!""#,
                "",
            ],
            Self::Shell => &[
                "#!/bin/bash",
                "# Shell script to install packages",
                "",
                "set -e  # Exit on error",
                "",
                "# Get the directory where this script is located",
                r#"SCRIPT_DIR="$(cd "$(dirname "$0")" && pwd)""#,
                r#"cd "$SCRIPT_DIR""#,
                "",
            ],
        }
    }

    fn comment(self, text: &str) -> String {
        match self {
            Self::Batch => format!("REM {text}"),
            Self::Shell => format!("# {text}"),
        }
    }

    /// Prefix that runs `conda` as a sub-command of the script.
    fn call(self) -> &'static str {
        match self {
            Self::Batch => "call ",
            Self::Shell => "",
        }
    }

    fn archive_arg(self, path: &str) -> String {
        match self {
            Self::Batch if is_relative(path) => {
                format!(r#""!SCRIPT_DIR!\{}""#, path.replace('/', "\\"))
            }
            Self::Batch => format!(r#""{}""#, path.replace('/', "\\")),
            Self::Shell if is_relative(path) => format!(r#""$SCRIPT_DIR/{path}""#),
            Self::Shell => format!(r#""{path}""#),
        }
    }

    fn footer(self) -> &'static str {
        match self {
            Self::Batch => "echo Installation completed.",
            Self::Shell => r#"echo "Installation completed.""#,
        }
    }
}

fn is_relative(path: &str) -> bool {
    Path::new(path).is_relative() && !path.starts_with('/')
}

/// Write `install_packages.bat` and `install_packages.sh` for a bundle.
pub fn generate_install_scripts(
    bundle_dir: &Path,
    options: &ScriptOptions,
) -> Result<InstallScripts> {
    if !bundle_dir.is_dir() {
        return Err(Error::BundleNotFound(bundle_dir.to_path_buf()));
    }
    let bundle_dir = dunce::canonicalize(bundle_dir)?;
    let env_name = match &options.env_name {
        Some(name) => name.clone(),
        None => bundle_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let output_dir = match &options.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dunce::canonicalize(dir)?
        }
        None => bundle_dir.clone(),
    };

    let archives = BundleArchives::collect(&bundle_dir)?;
    let conda: Vec<String> = archives
        .conda
        .iter()
        .map(|path| script_path(path, &output_dir))
        .collect();
    let pypi: Vec<String> = archives
        .pypi
        .iter()
        .map(|path| script_path(path, &output_dir))
        .collect();
    let per_line = options.packages_per_line.max(1);

    let batch = output_dir.join(BATCH_SCRIPT_NAME);
    let content = render(Dialect::Batch, &env_name, &conda, &pypi, per_line);
    std::fs::write(&batch, content)?;

    let shell = output_dir.join(SHELL_SCRIPT_NAME);
    let content = render(Dialect::Shell, &env_name, &conda, &pypi, per_line);
    std::fs::write(&shell, content)?;
    make_executable(&shell)?;

    tracing::info!("Generated install scripts in '{}':", output_dir.display());
    tracing::info!("  - Windows batch: {}", batch.display());
    tracing::info!("  - Unix/Linux shell: {}", shell.display());
    Ok(InstallScripts { batch, shell })
}

fn render(
    dialect: Dialect,
    env_name: &str,
    conda: &[String],
    pypi: &[String],
    per_line: usize,
) -> String {
    let flag = env_flag(env_name);
    let mut lines: Vec<String> = dialect.header().iter().map(|l| l.to_string()).collect();
    let sections = [
        (
            "Install conda packages",
            format!("conda install -y {flag} {env_name} --offline --use-local"),
            conda,
        ),
        (
            "Install PyPI packages",
            format!("conda run {flag} {env_name} pip install --no-deps --no-build-isolation"),
            pypi,
        ),
    ];
    for (title, command, paths) in sections {
        if paths.is_empty() {
            continue;
        }
        lines.push(dialect.comment(title));
        for chunk in paths.chunks(per_line) {
            let args: Vec<String> = chunk.iter().map(|p| dialect.archive_arg(p)).collect();
            lines.push(format!("{}{command} {}", dialect.call(), args.join(" ")));
        }
        lines.push(String::new());
    }
    lines.push(dialect.footer().to_string());

    let ending = dialect.line_ending();
    let mut content = lines.join(ending);
    content.push_str(ending);
    content
}

/// `path` relative to `base` with forward slashes, or absolute when it is
/// not under `base`.
fn script_path(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) => relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
