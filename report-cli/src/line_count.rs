// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use clover_coverage::LineCounter;
use std::io;

/// Counts lines in source files on disk.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct FsLineCounter;

impl LineCounter for FsLineCounter {
    fn line_count(&self, path: &Utf8Path) -> io::Result<usize> {
        let contents = std::fs::read(path)?;
        Ok(count_lines(&contents))
    }
}

/// Returns the number of physical lines in `contents`.
///
/// A final line without a trailing newline still counts as a line.
fn count_lines(contents: &[u8]) -> usize {
    let newlines = contents.iter().filter(|&&b| b == b'\n').count();
    match contents.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}
