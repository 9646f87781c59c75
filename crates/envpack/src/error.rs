// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for envpack operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with envpack Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole run.
///
/// Failures to acquire or install a single package are not represented here;
/// those are logged and collected by the caller instead.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// The conda executable is not configured or does not exist
    #[error("conda executable not found: {0:?}")]
    #[diagnostic(
        code(envpack::conda_not_configured),
        help("Install conda and set CONDA_EXE, or pass --conda-exe")
    )]
    CondaNotConfigured(Option<PathBuf>),

    /// Target directory for the bundle does not exist
    #[error("Target directory not found: {0:?}")]
    #[diagnostic(
        code(envpack::target_dir_not_found),
        help("Create the directory first or pass an existing one with -d")
    )]
    TargetDirNotFound(PathBuf),

    /// Environment manifest does not exist
    #[error("Manifest file not found: {0:?}")]
    #[diagnostic(code(envpack::manifest_not_found))]
    ManifestNotFound(PathBuf),

    /// Bundle directory to install from does not exist
    #[error("Package directory not found: {0:?}")]
    #[diagnostic(code(envpack::bundle_not_found))]
    BundleNotFound(PathBuf),

    /// Environment name that does not end in a directory name
    #[error("Invalid environment name: {0:?}")]
    #[diagnostic(
        code(envpack::invalid_env_name),
        help("The name (or the last component of a prefix) names the bundle directory")
    )]
    InvalidEnvName(String),

    /// Unrecognized text encoding label
    #[error("Invalid encoding: {0}")]
    #[diagnostic(
        code(envpack::invalid_encoding),
        help("Use a WHATWG encoding label such as utf-8, shift_jis or windows-1252")
    )]
    InvalidEncoding(String),

    /// Environment name is not known to conda
    #[error("Environment '{name}' not found; known environments: [{}]", .known.join(", "))]
    #[diagnostic(
        code(envpack::unknown_environment),
        help("Pass an environment name or prefix listed by 'conda info -e'")
    )]
    UnknownEnvironment { name: String, known: Vec<String> },

    /// Manifest dependency entry has an unsupported shape
    #[error("Invalid dependency entry: {entry}")]
    #[diagnostic(
        code(envpack::invalid_dependency),
        help("Dependencies must be 'name=version=build' strings or a 'pip' list of 'name==version' strings")
    )]
    InvalidDependency { entry: String },

    /// No runtime package among the enumerated packages
    #[error("Runtime package '{package}' not found")]
    #[diagnostic(
        code(envpack::runtime_not_found),
        help("The environment must pin '{package}' so index packages can be matched to it")
    )]
    RuntimeNotFound { package: String },

    /// Invalid YAML in the manifest file
    #[error("Invalid manifest file: {error}")]
    #[diagnostic(
        code(envpack::invalid_manifest),
        help("Check YAML syntax and ensure 'name' and 'dependencies' are present")
    )]
    InvalidManifest {
        #[source]
        error: serde_yaml::Error,
    },

    /// A `conda list` line could not be split into name, version and build
    #[error("Malformed package listing line: {line:?}")]
    #[diagnostic(code(envpack::malformed_listing))]
    MalformedListing { line: String },

    /// Unknown platform name
    #[error("Unknown platform: {0}")]
    #[diagnostic(
        code(envpack::unknown_platform),
        help("Expected one of: win-64, win-32, linux-64, linux-aarch64, linux-ppc64le, linux-s390x, osx-64, osx-arm64")
    )]
    UnknownPlatform(String),

    /// An external command could not be started
    #[error("Failed to run {program:?}")]
    #[diagnostic(code(envpack::command_failed))]
    CommandFailed {
        program: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(envpack::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to transfer a remote file
    #[error("Failed to download {url}: {message}")]
    #[diagnostic(code(envpack::download_failed))]
    DownloadFailed { url: String, message: String },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(envpack::io_error))]
    Io(#[from] std::io::Error),
}
