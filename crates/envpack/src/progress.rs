// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

//! Progress reporting for long package loops.

use std::io::{self, Write};

use indicatif::{ProgressBar, ProgressStyle};

#[cfg(test)]
#[path = "./progress_test.rs"]
mod progress_test;

/// Receives progress of a loop over packages.
///
/// Reporting never changes what the loop does or in which order.
pub trait ProgressSink {
    /// Begin a loop of `total` steps.
    fn start(&self, total: u64);
    fn advance(&self);
    fn set_description(&self, description: &str);
    fn close(&self);
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self) {}
    fn set_description(&self, _description: &str) {}
    fn close(&self) {}
}

/// Terminal progress bar.
#[derive(Debug, Clone)]
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} ({pos}/{len}) [{bar:40.green/dim}] {percent}%")
                .expect("Invalid progress bar template")
                .progress_chars("##-"),
        );
        Self { bar }
    }

    /// A bar that draws nothing, for non-interactive output.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Wrap `inner` so every write clears the bar first and redraws it after.
    pub fn writer<W: Write>(&self, inner: W) -> BarWriter<W> {
        BarWriter {
            bar: self.bar.clone(),
            inner,
        }
    }
}

/// A writer that never interleaves with a live [`BarProgress`].
#[derive(Debug)]
pub struct BarWriter<W> {
    bar: ProgressBar,
    inner: W,
}

impl<W> BarWriter<W> {
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for BarWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn set_description(&self, description: &str) {
        self.bar.set_message(description.to_string());
    }

    fn close(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use super::ProgressSink;

    /// Remembers every call, in order.
    #[derive(Debug, Default)]
    pub struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ProgressSink for RecordingProgress {
        fn start(&self, total: u64) {
            self.push(format!("start {total}"));
        }

        fn advance(&self) {
            self.push("advance".to_string());
        }

        fn set_description(&self, description: &str) {
            self.push(format!("describe {description}"));
        }

        fn close(&self) {
            self.push("close".to_string());
        }
    }
}
