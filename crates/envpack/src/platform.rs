// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Target platforms for cross-resolving packages.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::Error;

#[cfg(test)]
#[path = "./platform_test.rs"]
mod platform_test;

/// A platform the bundle can be built for, named by its conda subdir.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum Platform {
    #[strum(serialize = "win-64")]
    Win64,
    #[strum(serialize = "win-32")]
    Win32,
    #[strum(serialize = "linux-64")]
    Linux64,
    #[strum(serialize = "linux-aarch64")]
    LinuxAarch64,
    #[strum(serialize = "linux-ppc64le")]
    LinuxPpc64le,
    #[strum(serialize = "linux-s390x")]
    LinuxS390x,
    #[strum(serialize = "osx-64")]
    Osx64,
    #[strum(serialize = "osx-arm64")]
    OsxArm64,
}

impl Platform {
    /// The `--platform` value for `conda search`.
    pub fn conda_subdir(self) -> &'static str {
        self.into()
    }

    /// The `--platform` tag for `pip download`.
    pub fn pypi_tag(self) -> &'static str {
        match self {
            Self::Win64 => "win_amd64",
            Self::Win32 => "win32",
            Self::Linux64 => "manylinux2014_x86_64",
            Self::LinuxAarch64 => "manylinux2014_aarch64",
            Self::LinuxPpc64le => "manylinux2014_ppc64le",
            Self::LinuxS390x => "manylinux2014_s390x",
            Self::Osx64 => "macosx_10_9_x86_64",
            Self::OsxArm64 => "macosx_11_0_arm64",
        }
    }

    /// Parse a platform name, reporting unknown names as [`Error::UnknownPlatform`].
    pub fn parse(name: &str) -> crate::Result<Self> {
        name.parse()
            .map_err(|_| Error::UnknownPlatform(name.to_string()))
    }
}
