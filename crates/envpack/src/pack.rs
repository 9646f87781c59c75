// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! The pack pipeline: enumerate, prepare, reconcile.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::{
    check_runtime_version, enumerate, prepare, reconcile, CondaAcquirer, CondaCli, PackageSource,
    Error, PipCli, Platform, ProgressSink, PypiAcquirer, ReconcileReport, Result, RunPlan,
    RuntimeVersion, Strategies,
};

#[cfg(test)]
#[path = "./pack_test.rs"]
mod pack_test;

/// The external tools a pack run talks to.
#[derive(Clone)]
pub struct PackContext {
    pub conda: CondaCli,
    pub pip: PipCli,
    pub fetcher: Arc<dyn Fetcher>,
}

/// What to pack and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRequest {
    pub source: PackageSource,
    /// Existing directory that receives `<env>/`.
    pub target_dir: PathBuf,
    pub dry_run: bool,
    pub diff_only: bool,
    /// Resolve for this platform instead of the host.
    pub platform: Option<Platform>,
}

/// Outcome of a pack run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub env_name: String,
    pub runtime_version: RuntimeVersion,
    /// Directory that received this run's archives.
    pub output_dir: PathBuf,
    pub reconcile: ReconcileReport,
}

/// Bundle the packages of `request.source` under `request.target_dir`.
pub fn pack(
    context: &PackContext,
    request: &PackRequest,
    progress: &dyn ProgressSink,
) -> Result<PackReport> {
    if request.dry_run {
        tracing::warn!("Dry run: no files will be downloaded or copied");
    }
    match request.platform {
        Some(platform) => tracing::info!("Resolving packages for platform {platform}"),
        None => tracing::info!("No platform given; resolving packages for the host platform"),
    }

    let enumerated = enumerate(&context.conda, &request.source)?;
    check_runtime_version(
        &enumerated.runtime_version,
        context.pip.host_version().as_ref(),
    );

    let dirname = bundle_dirname(&enumerated.env_name)?;
    let output = prepare(
        &request.target_dir,
        &dirname,
        request.diff_only,
        request.dry_run,
    )?;
    let plan = RunPlan::new(
        enumerated.env_name.clone(),
        output,
        request.dry_run,
        request.diff_only,
    );

    let conda = CondaAcquirer::new(context.conda.clone(), context.fetcher.clone())
        .with_platform(request.platform)
        .with_channels(enumerated.channels.clone());
    let pypi = PypiAcquirer::new(
        context.pip.clone(),
        enumerated.runtime_version.clone(),
        request.platform,
    );
    let strategies = Strategies {
        conda: &conda,
        pypi: &pypi,
    };

    tracing::info!(
        "Packing {} packages into {}",
        enumerated.records.len(),
        plan.output_dir.display()
    );
    let report = reconcile(&enumerated.records, &plan, strategies, progress);

    Ok(PackReport {
        env_name: enumerated.env_name,
        runtime_version: enumerated.runtime_version,
        output_dir: plan.output_dir,
        reconcile: report,
    })
}

/// Directory name for an environment given by name or by prefix path.
///
/// Only a trailing normal component is accepted, so the bundle always lands
/// directly under the target directory.
pub fn bundle_dirname(env_name: &str) -> Result<String> {
    match Path::new(env_name).components().next_back() {
        Some(Component::Normal(name)) => Ok(name.to_string_lossy().into_owned()),
        _ => Err(Error::InvalidEnvName(env_name.to_string())),
    }
}
