// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Mutex;

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::progress::fake::RecordingProgress;
use crate::{prepare, NoProgress};

/// Succeeds unless the record's name is listed, remembering each call.
#[derive(Default)]
struct Scripted {
    failing: Vec<&'static str>,
    calls: Mutex<Vec<(String, PathBuf, bool)>>,
}

impl Scripted {
    fn failing(names: &[&'static str]) -> Self {
        Self {
            failing: names.to_vec(),
            ..Default::default()
        }
    }

    fn names(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect()
    }
}

impl Acquire for Scripted {
    fn acquire(&self, record: &PackageRecord, dest_dir: &Path, dry_run: bool) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push((record.name().to_string(), dest_dir.to_path_buf(), dry_run));
        !self.failing.iter().any(|name| *name == record.name())
    }
}

fn plan(output_dir: &Path, existing: ExistingArtifacts) -> RunPlan {
    RunPlan {
        env_name: "env".to_string(),
        output_dir: output_dir.to_path_buf(),
        dry_run: false,
        diff_only: false,
        existing,
    }
}

#[rstest]
fn test_failure_does_not_stop_the_run() {
    let records = vec![
        PackageRecord::conda("python", "3.11.5", "h955ad1f_0"),
        PackageRecord::conda("numpy", "1.21.0", "py39_0"),
        PackageRecord::pypi("requests", "2.31.0"),
    ];
    let conda = Scripted::failing(&["numpy"]);
    let pypi = Scripted::default();
    let strategies = Strategies {
        conda: &conda,
        pypi: &pypi,
    };

    let report = reconcile(
        &records,
        &plan(Path::new("/out/env"), ExistingArtifacts::empty()),
        strategies,
        &NoProgress,
    );
    assert_eq!(report.total, 3);
    assert_eq!(report.n_success(), 2);
    assert_eq!(report.failures.records(), &records[1..2]);
    assert_eq!(conda.names(), vec!["python", "numpy"]);
    assert_eq!(pypi.names(), vec!["requests"]);
}

#[rstest]
fn test_records_dispatch_to_ecosystem_dirs() {
    let records = vec![
        PackageRecord::conda("python", "3.11.5", "h955ad1f_0"),
        PackageRecord::pypi("requests", "2.31.0"),
    ];
    let conda = Scripted::default();
    let pypi = Scripted::default();
    let mut plan = plan(Path::new("/out/env"), ExistingArtifacts::empty());
    plan.dry_run = true;

    reconcile(
        &records,
        &plan,
        Strategies {
            conda: &conda,
            pypi: &pypi,
        },
        &NoProgress,
    );
    assert_eq!(
        conda.calls.lock().unwrap()[0],
        ("python".to_string(), PathBuf::from("/out/env/conda"), true)
    );
    assert_eq!(
        pypi.calls.lock().unwrap()[0],
        ("requests".to_string(), PathBuf::from("/out/env/pypi"), true)
    );
}

#[rstest]
fn test_existing_artifacts_are_skipped() {
    let mut existing = ExistingArtifacts::empty();
    existing.insert_conda_filename("numpy-1.21.0-py39_0.conda");
    existing.insert_pypi_filename("my_pkg-2.0.0-py3-none-any.whl");
    let records = vec![
        PackageRecord::conda("numpy", "1.21.0", "py39_0"),
        PackageRecord::conda("numpy", "1.21.1", "py39_0"),
        PackageRecord::pypi("my-pkg", "2.0.0"),
    ];
    let conda = Scripted::default();
    let pypi = Scripted::default();

    let report = reconcile(
        &records,
        &plan(Path::new("/out"), existing),
        Strategies {
            conda: &conda,
            pypi: &pypi,
        },
        &NoProgress,
    );
    assert_eq!(report.skipped, 2);
    assert_eq!(report.n_success(), 3);
    assert_eq!(conda.names(), vec!["numpy"]);
    assert!(pypi.names().is_empty());
}

#[rstest]
fn test_diff_run_only_attempts_new_packages() {
    let tmp = TempDir::new().unwrap();
    let env_dir = tmp.path().join("env");
    std::fs::create_dir_all(env_dir.join("conda")).unwrap();
    std::fs::write(env_dir.join("conda").join("numpy-1.21.0-py39_0.conda"), b"").unwrap();

    let output = prepare(tmp.path(), "env", true, false).unwrap();
    let plan = RunPlan::new("env", output, false, true);
    assert!(plan.output_dir.starts_with(env_dir.join("diffs")));

    let records = vec![
        PackageRecord::conda("numpy", "1.21.0", "py39_0"),
        PackageRecord::conda("numpy", "1.21.1", "py39_0"),
    ];
    let conda = Scripted::default();
    let pypi = Scripted::default();
    reconcile(
        &records,
        &plan,
        Strategies {
            conda: &conda,
            pypi: &pypi,
        },
        &NoProgress,
    );
    let calls = conda.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, plan.output_dir.join("conda"));
}

#[rstest]
fn test_progress_sees_every_record() {
    let records = vec![
        PackageRecord::conda("python", "3.11.5", "h955ad1f_0"),
        PackageRecord::pypi("requests", "2.31.0"),
    ];
    let mut existing = ExistingArtifacts::empty();
    existing.insert_conda_filename("python-3.11.5-h955ad1f_0.conda");
    let strategy = Scripted::default();
    let progress = RecordingProgress::default();

    reconcile(
        &records,
        &plan(Path::new("/out"), existing),
        Strategies {
            conda: &strategy,
            pypi: &strategy,
        },
        &progress,
    );
    assert_eq!(
        progress.events(),
        vec![
            "start 2",
            "describe python",
            "advance",
            "describe requests",
            "advance",
            "close",
        ]
    );
}

#[rstest]
fn test_empty_run() {
    let strategy = Scripted::default();
    let report = reconcile(
        &[],
        &plan(Path::new("/out"), ExistingArtifacts::empty()),
        Strategies {
            conda: &strategy,
            pypi: &strategy,
        },
        &NoProgress,
    );
    assert_eq!(report, ReconcileReport::default());
    assert_eq!(report.n_success(), 0);
}
