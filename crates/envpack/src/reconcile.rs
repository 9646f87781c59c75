// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! The driver that walks the required packages and acquires what is missing.

use std::path::{Path, PathBuf};

use crate::{Acquire, Ecosystem, ExistingArtifacts, PackageRecord, PreparedOutput, ProgressSink};

#[cfg(test)]
#[path = "./reconcile_test.rs"]
mod reconcile_test;

/// Everything a reconciliation run needs to know up front.
///
/// Built once per run and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub env_name: String,
    /// Directory receiving this run's archives.
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub diff_only: bool,
    /// Artifacts that are skipped instead of acquired.
    pub existing: ExistingArtifacts,
}

impl RunPlan {
    pub fn new(
        env_name: impl Into<String>,
        output: PreparedOutput,
        dry_run: bool,
        diff_only: bool,
    ) -> Self {
        Self {
            env_name: env_name.into(),
            output_dir: output.output_dir,
            dry_run,
            diff_only,
            existing: output.existing,
        }
    }

    /// Directory receiving archives of one ecosystem.
    pub fn ecosystem_dir(&self, ecosystem: Ecosystem) -> PathBuf {
        self.output_dir.join(ecosystem.dirname())
    }
}

/// One acquisition strategy per ecosystem.
#[derive(Clone, Copy)]
pub struct Strategies<'a> {
    pub conda: &'a dyn Acquire,
    pub pypi: &'a dyn Acquire,
}

impl<'a> Strategies<'a> {
    pub fn for_ecosystem(&self, ecosystem: Ecosystem) -> &'a dyn Acquire {
        match ecosystem {
            Ecosystem::Conda => self.conda,
            Ecosystem::Pypi => self.pypi,
        }
    }
}

/// Records whose acquisition failed, in the order they were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLedger(Vec<PackageRecord>);

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PackageRecord) {
        self.0.push(record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[PackageRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PackageRecord> {
        self.0.iter()
    }
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Number of records considered, skipped ones included.
    pub total: usize,
    /// Records skipped because their artifact already exists.
    pub skipped: usize,
    pub failures: FailureLedger,
}

impl ReconcileReport {
    pub fn n_success(&self) -> usize {
        self.total - self.failures.len()
    }

    /// Log the tally and every failed package.
    pub fn log_summary(&self) {
        tracing::info!(
            "{} of {} packages succeeded ({} already present)",
            self.n_success(),
            self.total,
            self.skipped
        );
        if self.failures.is_empty() {
            return;
        }
        tracing::warn!("{} packages failed:", self.failures.len());
        for record in self.failures.iter() {
            tracing::warn!("  {record}");
        }
        if self.failures.len() > self.n_success() {
            tracing::warn!(
                "More packages failed than succeeded. Check that the platform (-p) matches the target machine."
            );
        }
    }
}

/// Acquire every record not already present, in order.
///
/// Failures are collected, never raised; the run always visits every record.
pub fn reconcile(
    records: &[PackageRecord],
    plan: &RunPlan,
    strategies: Strategies<'_>,
    progress: &dyn ProgressSink,
) -> ReconcileReport {
    let mut report = ReconcileReport {
        total: records.len(),
        ..Default::default()
    };
    progress.start(records.len() as u64);

    for record in records {
        progress.set_description(record.name());
        if plan.existing.contains(record) {
            tracing::info!("Skipping {record}: already present");
            report.skipped += 1;
            progress.advance();
            continue;
        }

        let ecosystem = record.ecosystem();
        let dest_dir = plan.ecosystem_dir(ecosystem);
        tracing::info!("Acquiring {record}");
        if !acquire_one(strategies.for_ecosystem(ecosystem), record, &dest_dir, plan.dry_run) {
            report.failures.push(record.clone());
        }
        progress.advance();
    }

    progress.close();
    report.log_summary();
    report
}

fn acquire_one(
    strategy: &dyn Acquire,
    record: &PackageRecord,
    dest_dir: &Path,
    dry_run: bool,
) -> bool {
    let acquired = strategy.acquire(record, dest_dir, dry_run);
    if !acquired {
        tracing::warn!("Failed to acquire {record}");
    }
    acquired
}
