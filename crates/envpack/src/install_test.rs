// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::exec::fake::{failed, ok, ScriptedRunner};
use crate::{CondaConfig, NoProgress};

const INFO_OUTPUT: &str = "\
# conda environments:
base                  *  /opt/conda
offline                  /opt/conda/envs/offline
";

fn cli(runner: ScriptedRunner) -> (CondaCli, Arc<ScriptedRunner>) {
    let runner = Arc::new(runner);
    let config = CondaConfig {
        executable: PathBuf::from("/opt/conda/bin/conda"),
        pkgs_dir: PathBuf::from("/opt/conda/pkgs"),
    };
    (
        CondaCli::new(config, runner.clone(), TextEncoding::default()),
        runner,
    )
}

/// A bundle with a base run and one diff run.
#[fixture]
fn bundle() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let diff = root.join("diffs").join("20240307_1205");
    for dir in [root.join("conda"), root.join("pypi"), diff.join("conda")] {
        std::fs::create_dir_all(dir).unwrap();
    }
    for path in [
        root.join("conda").join("zlib-1.2.13-h5eee18b_0.conda"),
        root.join("conda").join("numpy-1.26.4-py311h08b1b3b_0.tar.bz2"),
        root.join("conda").join("python-3.11.5-h955ad1f_0.conda"),
        root.join("conda").join("python-dateutil-2.8.2-pyhd3eb1b0_0.conda"),
        diff.join("conda").join("attrs-23.1.0-py311h06a4308_0.conda"),
        root.join("pypi").join("rich-13.7.0-py3-none-any.whl"),
        root.join("pypi").join("docopt-0.6.2.tar.gz"),
        root.join("README.txt"),
    ] {
        std::fs::write(path, b"").unwrap();
    }
    tmp
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| file_name(p)).collect()
}

#[rstest]
fn test_collect_orders_runtime_first(bundle: TempDir) {
    let archives = BundleArchives::collect(bundle.path()).unwrap();
    assert_eq!(
        names(&archives.conda),
        vec![
            "python-3.11.5-h955ad1f_0.conda",
            "python-dateutil-2.8.2-pyhd3eb1b0_0.conda",
            "attrs-23.1.0-py311h06a4308_0.conda",
            "numpy-1.26.4-py311h08b1b3b_0.tar.bz2",
            "zlib-1.2.13-h5eee18b_0.conda",
        ]
    );
    assert_eq!(
        names(&archives.pypi),
        vec!["docopt-0.6.2.tar.gz", "rich-13.7.0-py3-none-any.whl"]
    );
    assert_eq!(archives.len(), 7);
}

#[rstest]
#[case("python-3.11.5-h955ad1f_0.conda", true)]
#[case("Python_abi-3.11-2_cp311.conda", true)]
#[case("pythonnet-3.0.1-py311_0.conda", false)]
#[case("cpython-3.11.5-py311_0.conda", false)]
fn test_is_runtime_archive(#[case] name: &str, #[case] expected: bool) {
    assert_eq!(is_runtime_archive(Path::new(name)), expected);
}

#[rstest]
fn test_collect_missing_bundle() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing");
    match BundleArchives::collect(&missing) {
        Err(Error::BundleNotFound(p)) => assert_eq!(p, missing),
        other => panic!("Expected BundleNotFound, got: {:?}", other),
    }
}

#[rstest]
fn test_install_packages_runs_every_archive(bundle: TempDir) {
    let (conda, runner) = cli(ScriptedRunner::new().on("info", ok(INFO_OUTPUT)));

    let report = install_packages(&conda, "offline", bundle.path(), &NoProgress).unwrap();
    assert_eq!(report.conda_total, 5);
    assert_eq!(report.pypi_total, 2);
    assert!(report.is_success());

    let calls = runner.calls();
    assert_eq!(calls.len(), 1 + 7);
    let first = &calls[1];
    assert_eq!(
        first.args[..6],
        ["install", "-y", "-n", "offline", "--offline", "--use-local"]
    );
    assert!(first.args[6].ends_with("python-3.11.5-h955ad1f_0.conda"));
    let last = &calls[7];
    assert_eq!(
        last.args[..7],
        ["run", "-n", "offline", "pip", "install", "--no-deps", "--no-build-isolation"]
    );
    assert!(last.args[7].ends_with("rich-13.7.0-py3-none-any.whl"));
}

#[rstest]
fn test_install_failures_are_collected(bundle: TempDir) {
    let (conda, _) = cli(
        ScriptedRunner::new()
            .on("info", ok(INFO_OUTPUT))
            .on_call(|call| {
                call.args
                    .iter()
                    .any(|a| a.ends_with("zlib-1.2.13-h5eee18b_0.conda") || a.ends_with(".tar.gz"))
                    .then(|| Ok(failed("CondaVerificationError")))
            }),
    );

    let report = install_packages(&conda, "offline", bundle.path(), &NoProgress).unwrap();
    assert_eq!(names(&report.conda_failed), vec!["zlib-1.2.13-h5eee18b_0.conda"]);
    assert_eq!(names(&report.pypi_failed), vec!["docopt-0.6.2.tar.gz"]);
    assert_eq!(report.n_failed(), 2);
    assert!(!report.is_success());
}

#[rstest]
fn test_install_unknown_environment(bundle: TempDir) {
    let (conda, runner) = cli(ScriptedRunner::new().on("info", ok(INFO_OUTPUT)));
    match install_packages(&conda, "nope", bundle.path(), &NoProgress) {
        Err(Error::UnknownEnvironment { name, .. }) => assert_eq!(name, "nope"),
        other => panic!("Expected UnknownEnvironment, got: {:?}", other),
    }
    assert_eq!(runner.calls().len(), 1);
}
