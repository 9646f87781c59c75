// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::exec::fake::{ok, ScriptedRunner};

fn pip(runner: ScriptedRunner) -> (PipCli, Arc<ScriptedRunner>) {
    let runner = Arc::new(runner);
    (
        PipCli::new("/usr/bin/python3", runner.clone(), TextEncoding::default()),
        runner,
    )
}

#[rstest]
fn test_download_arguments() {
    let (pip, runner) = pip(ScriptedRunner::new());
    let record = PackageRecord::pypi("requests", "2.31.0");
    pip.download(
        &record,
        &RuntimeVersion::new("3.11.5"),
        Some(Platform::Linux64),
        Path::new("/out/pypi"),
    )
    .unwrap();

    let call = &runner.calls()[0];
    assert_eq!(call.program, PathBuf::from("/usr/bin/python3"));
    assert_eq!(
        call.args,
        vec![
            "-m",
            "pip",
            "download",
            "requests==2.31.0",
            "--no-deps",
            "--python-version",
            "3.11",
            "-d",
            "/out/pypi",
            "--platform",
            "manylinux2014_x86_64",
        ]
    );
}

#[rstest]
fn test_download_without_platform() {
    let (pip, runner) = pip(ScriptedRunner::new());
    let record = PackageRecord::pypi("requests", "2.31.0");
    pip.download(&record, &RuntimeVersion::new("3.10"), None, Path::new("/out"))
        .unwrap();

    let call = &runner.calls()[0];
    assert!(!call.has_arg("--platform"));
    assert_eq!(call.flag_value("--python-version"), Some("3.10"));
}

#[rstest]
fn test_install_dry_run_targets_output_without_platform() {
    let (pip, runner) = pip(ScriptedRunner::new());
    let record = PackageRecord::pypi("rich", "13.7.0");
    pip.install_dry_run(&record, &RuntimeVersion::new("3.11.5"), None, Path::new("/out/pypi"))
        .unwrap();

    let call = &runner.calls()[0];
    assert_eq!(call.args[..4], ["-m", "pip", "install", "rich==13.7.0"]);
    assert!(call.has_arg("--dry-run"));
    assert!(call.has_arg("--no-deps"));
    assert!(call.has_arg("--no-build-isolation"));
    assert_eq!(call.flag_value("--target"), Some("/out/pypi"));
    assert!(!call.has_arg("--platform"));
}

#[rstest]
fn test_install_dry_run_with_platform() {
    let (pip, runner) = pip(ScriptedRunner::new());
    let record = PackageRecord::pypi("rich", "13.7.0");
    pip.install_dry_run(
        &record,
        &RuntimeVersion::new("3.11.5"),
        Some(Platform::OsxArm64),
        Path::new("/out/pypi"),
    )
    .unwrap();

    let call = &runner.calls()[0];
    assert_eq!(call.flag_value("--platform"), Some("macosx_11_0_arm64"));
    assert!(!call.has_arg("--target"));
}

#[rstest]
fn test_host_version_from_stdout() {
    let (pip, _) = pip(ScriptedRunner::new().on("--version", ok("Python 3.12.1\n")));
    assert_eq!(pip.host_version(), Some(RuntimeVersion::new("3.12.1")));
}

#[rstest]
fn test_host_version_from_stderr() {
    let output = CommandOutput {
        code: Some(0),
        stdout: Vec::new(),
        stderr: b"Python 2.7.18\n".to_vec(),
    };
    let (pip, _) = pip(ScriptedRunner::new().on("--version", output));
    assert_eq!(pip.host_version(), Some(RuntimeVersion::new("2.7.18")));
}

#[rstest]
fn test_host_version_unavailable() {
    let (pip, _) = pip(ScriptedRunner::new().on_call(|_| {
        Some(Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no python",
        )))
    }));
    assert_eq!(pip.host_version(), None);
}
