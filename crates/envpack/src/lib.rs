// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! envpack - Offline bundles of conda environments
//!
//! This crate provides the core library for packing the packages of a conda
//! environment into a directory of archives that can be carried to a machine
//! without network access and installed there.
//!
//! # Overview
//!
//! A pack run enumerates the packages of a live environment (`conda list`)
//! or of an `environment.yaml` manifest, decides which of them are already
//! present in the output directory, and acquires the rest:
//!
//! - conda packages are copied from the local package cache, or located with
//!   `conda search --info` and downloaded directly;
//! - PyPI packages are downloaded with `pip download --no-deps`, pinned to
//!   the environment's Python version and optionally a foreign platform.
//!
//! A failed package never aborts the run; failures are collected and
//! reported at the end.
//!
//! # Layout
//!
//! ```text
//! <target>/<env>/conda/*.{tar.bz2,conda}
//! <target>/<env>/pypi/*.{whl,tar.gz}
//! <target>/<env>/diffs/<YYYYMMDD_HHMM>/{conda,pypi}/...
//! ```

pub mod acquire;
pub mod conda;
pub mod encoding;
pub mod enumerate;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod install;
pub mod manifest;
pub mod output;
pub mod pack;
pub mod pip;
pub mod platform;
pub mod progress;
pub mod reconcile;
pub mod record;
pub mod runtime;
pub mod scan;
pub mod scripts;

pub use acquire::{Acquire, CondaAcquirer, PypiAcquirer, DEFAULT_CHANNEL};
pub use conda::{
    parse_environment_prefixes, parse_environments, parse_package_list, CondaCli, CondaConfig,
};
pub use encoding::TextEncoding;
pub use enumerate::{enumerate, Enumerated, PackageSource};
pub use error::{Error, Result};
pub use exec::{CommandOutput, CommandRunner, SystemRunner};
pub use fetch::{Fetcher, HttpFetcher};
pub use install::{install_packages, BundleArchives, InstallReport};
pub use manifest::Manifest;
pub use output::{prepare, prepare_at, PreparedOutput};
pub use pack::{pack, PackContext, PackReport, PackRequest};
pub use pip::PipCli;
pub use platform::Platform;
pub use progress::{BarProgress, BarWriter, NoProgress, ProgressSink};
pub use reconcile::{reconcile, FailureLedger, ReconcileReport, RunPlan, Strategies};
pub use record::{Ecosystem, IdentityKey, PackageRecord, INDEX_CHANNEL};
pub use runtime::{check_runtime_version, detect_runtime_version, RuntimeVersion, RUNTIME_PACKAGE};
pub use scan::{find_archives, scan, ExistingArtifacts};
pub use scripts::{generate_install_scripts, InstallScripts, ScriptOptions};

/// Archive extensions of conda packages, in cache lookup order.
pub const EXTENSIONS_CONDA: &[&str] = &["tar.bz2", "conda"];

/// Archive extensions of PyPI distributions.
pub const EXTENSIONS_PYPI: &[&str] = &["whl", "tar.gz"];
