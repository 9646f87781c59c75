// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use rstest::rstest;

use super::*;

#[rstest]
fn test_conda_identity_ignores_channel() {
    let default = PackageRecord::conda("numpy", "1.21.0", "py39_0");
    let forge = PackageRecord::new("numpy", "1.21.0", "py39_0", "conda-forge");

    assert_ne!(default, forge);
    assert_eq!(default.identity(), forge.identity());

    let mut existing = HashSet::new();
    existing.insert(default.identity());
    assert!(existing.contains(&forge.identity()));
}

#[rstest]
fn test_pypi_identity_ignores_build() {
    let record = PackageRecord::new("requests", "2.31.0", "pypi_0", INDEX_CHANNEL);
    assert_eq!(record.ecosystem(), Ecosystem::Pypi);
    assert_eq!(record.identity(), IdentityKey::pypi("requests", "2.31.0"));
}

#[rstest]
#[case("", Ecosystem::Conda)]
#[case("defaults", Ecosystem::Conda)]
#[case("conda-forge", Ecosystem::Conda)]
#[case("pypi", Ecosystem::Pypi)]
fn test_ecosystem_from_channel(#[case] channel: &str, #[case] expected: Ecosystem) {
    let record = PackageRecord::new("pkg", "1.0", "0", channel);
    assert_eq!(record.ecosystem(), expected);
}

#[rstest]
fn test_display_forms() {
    assert_eq!(
        PackageRecord::conda("python", "3.10.4", "h12debd9_0").to_string(),
        "python=3.10.4=h12debd9_0"
    );
    assert_eq!(
        PackageRecord::new("zlib", "1.2.13", "h5eee18b_0", "conda-forge").to_string(),
        "conda-forge::zlib=1.2.13=h5eee18b_0"
    );
    assert_eq!(
        PackageRecord::pypi("requests", "2.31.0").to_string(),
        "requests==2.31.0"
    );
}

#[rstest]
fn test_archive_stem() {
    let record = PackageRecord::conda("ca-certificates", "2023.01.10", "h06a4308_0");
    assert_eq!(record.archive_stem(), "ca-certificates-2023.01.10-h06a4308_0");
}
