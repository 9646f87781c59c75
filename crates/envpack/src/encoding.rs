// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Text decoding for subprocess output.

use encoding_rs::Encoding;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./encoding_test.rs"]
mod encoding_test;

/// A validated text encoding used to decode command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    /// Resolve an encoding label, falling back to UTF-8 when none is given.
    pub fn resolve(label: Option<&str>) -> Result<Self> {
        match label {
            None => {
                tracing::info!("Use default encoding: {}.", encoding_rs::UTF_8.name());
                Ok(Self::default())
            }
            Some(label) => label.parse(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Decode bytes, replacing malformed sequences.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _, had_errors) = self.0.decode(bytes);
        if had_errors {
            tracing::debug!("Output was not valid {}; replaced malformed bytes", self.name());
        }
        text.into_owned()
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self(encoding_rs::UTF_8)
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| Error::InvalidEncoding(label.to_string()))
    }
}
