// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::InvalidMarkerError;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, map};
use std::{fmt, str::FromStr};

/// The coverage status of a single source line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineCoverage {
    /// A statement that was executed at least once. Rendered as `C`.
    Covered,

    /// A statement that was never executed. Rendered as `U`.
    Uncovered,

    /// Not a statement, or not instrumented by the coverage tool. Rendered as `N`.
    NotApplicable,
}

impl LineCoverage {
    /// Returns the single-character marker for this status.
    pub fn as_char(self) -> char {
        match self {
            LineCoverage::Covered => 'C',
            LineCoverage::Uncovered => 'U',
            LineCoverage::NotApplicable => 'N',
        }
    }

    /// Parses a single-character marker.
    pub fn from_char(marker: char) -> Option<Self> {
        match marker {
            'C' => Some(LineCoverage::Covered),
            'U' => Some(LineCoverage::Uncovered),
            'N' => Some(LineCoverage::NotApplicable),
            _ => None,
        }
    }

    /// Returns true if this line is a statement (covered or not).
    pub fn is_statement(self) -> bool {
        matches!(self, LineCoverage::Covered | LineCoverage::Uncovered)
    }
}

/// Coverage for a single source file: exactly one [`LineCoverage`] per physical line.
///
/// The string form is dense: character *i* (counting from 1) describes source line *i*.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FileCoverage {
    // Invariant: every byte is one of b'C', b'U', b'N'.
    markers: String,
}

impl FileCoverage {
    /// Creates a new `FileCoverage` from a sequence of line statuses, starting at line 1.
    pub fn from_lines(lines: impl IntoIterator<Item = LineCoverage>) -> Self {
        Self {
            markers: lines.into_iter().map(LineCoverage::as_char).collect(),
        }
    }

    /// Returns a `FileCoverage` for a file with `line_count` lines, none of them statements.
    pub fn not_applicable(line_count: usize) -> Self {
        Self {
            markers: "N".repeat(line_count),
        }
    }

    pub(crate) fn push(&mut self, line: LineCoverage) {
        self.markers.push(line.as_char());
    }

    /// Returns the dense marker string.
    pub fn as_str(&self) -> &str {
        &self.markers
    }

    /// Returns the number of lines described, which is the line count of the source file.
    pub fn line_count(&self) -> usize {
        self.markers.len()
    }

    /// Returns the status of the given 1-based line, or `None` if it is out of range.
    pub fn line(&self, line: usize) -> Option<LineCoverage> {
        let index = line.checked_sub(1)?;
        self.markers
            .as_bytes()
            .get(index)
            .and_then(|&b| LineCoverage::from_char(b as char))
    }

    /// Iterates over the status of every line, starting at line 1.
    pub fn lines(&self) -> impl Iterator<Item = LineCoverage> + '_ {
        self.markers.chars().filter_map(LineCoverage::from_char)
    }

    /// Returns the number of covered statement lines.
    pub fn covered(&self) -> usize {
        self.count(LineCoverage::Covered)
    }

    /// Returns the number of uncovered statement lines.
    pub fn uncovered(&self) -> usize {
        self.count(LineCoverage::Uncovered)
    }

    /// Returns the number of statement lines, covered or not.
    pub fn statements(&self) -> usize {
        self.lines().filter(|line| line.is_statement()).count()
    }

    fn count(&self, status: LineCoverage) -> usize {
        let marker = status.as_char() as u8;
        self.markers.bytes().filter(|&b| b == marker).count()
    }
}

impl FromStr for FileCoverage {
    type Err = InvalidMarkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((index, marker)) = s
            .chars()
            .enumerate()
            .find(|(_, c)| LineCoverage::from_char(*c).is_none())
        {
            return Err(InvalidMarkerError::new(marker, index + 1));
        }
        Ok(Self {
            markers: s.to_owned(),
        })
    }
}

impl fmt::Display for FileCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.markers)
    }
}

/// A map from project-relative source paths to their [`FileCoverage`].
///
/// Paths iterate in the order they were inserted, which for a synthesized map is the order in
/// which files appear in the Clover report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageMap {
    files: IndexMap<Utf8PathBuf, FileCoverage>,
}

impl CoverageMap {
    /// Creates a new, empty `CoverageMap`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts coverage for a path, returning the previous coverage if any.
    pub fn insert(
        &mut self,
        path: impl Into<Utf8PathBuf>,
        coverage: FileCoverage,
    ) -> Option<FileCoverage> {
        self.files.insert(path.into(), coverage)
    }

    /// Returns the coverage for the given relative path.
    pub fn get(&self, path: impl AsRef<Utf8Path>) -> Option<&FileCoverage> {
        self.files.get(path.as_ref())
    }

    /// Returns true if the map contains coverage for the given relative path.
    pub fn contains(&self, path: impl AsRef<Utf8Path>) -> bool {
        self.files.contains_key(path.as_ref())
    }

    /// Returns the number of files in this map.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if this map has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates over paths and their coverage.
    pub fn iter(&self) -> map::Iter<'_, Utf8PathBuf, FileCoverage> {
        self.files.iter()
    }
}

impl<'a> IntoIterator for &'a CoverageMap {
    type Item = (&'a Utf8PathBuf, &'a FileCoverage);
    type IntoIter = map::Iter<'a, Utf8PathBuf, FileCoverage>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

impl FromIterator<(Utf8PathBuf, FileCoverage)> for CoverageMap {
    fn from_iter<T: IntoIterator<Item = (Utf8PathBuf, FileCoverage)>>(iter: T) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn file_coverage_accessors() {
        let coverage: FileCoverage = "NCUNC".parse().expect("valid markers");
        assert_eq!(coverage.line_count(), 5);
        assert_eq!(coverage.covered(), 2);
        assert_eq!(coverage.uncovered(), 1);
        assert_eq!(coverage.statements(), 3);
        assert_eq!(coverage.line(0), None);
        assert_eq!(coverage.line(2), Some(LineCoverage::Covered));
        assert_eq!(coverage.line(3), Some(LineCoverage::Uncovered));
        assert_eq!(coverage.line(5), Some(LineCoverage::Covered));
        assert_eq!(coverage.line(6), None);
    }

    #[test_case("", None ; "empty")]
    #[test_case("CUN", None ; "all markers")]
    #[test_case("CUx", Some(InvalidMarkerError::new('x', 3)) ; "invalid at end")]
    #[test_case("c", Some(InvalidMarkerError::new('c', 1)) ; "lowercase")]
    fn parse_markers(input: &str, expected_err: Option<InvalidMarkerError>) {
        let result = input.parse::<FileCoverage>();
        match expected_err {
            None => assert_eq!(result.expect("parse succeeded").as_str(), input),
            Some(err) => assert_eq!(result.expect_err("parse failed"), err),
        }
    }

    #[test]
    fn from_lines_round_trips_through_display() {
        let coverage = FileCoverage::from_lines([
            LineCoverage::NotApplicable,
            LineCoverage::Covered,
            LineCoverage::Uncovered,
        ]);
        assert_eq!(coverage.to_string(), "NCU");
        assert_eq!(
            coverage.lines().collect::<Vec<_>>(),
            vec![
                LineCoverage::NotApplicable,
                LineCoverage::Covered,
                LineCoverage::Uncovered,
            ]
        );
    }

    #[test]
    fn map_preserves_insertion_order() {
        let mut map = CoverageMap::new();
        map.insert("src/B.php", FileCoverage::not_applicable(1));
        map.insert("src/A.php", FileCoverage::not_applicable(2));

        let paths: Vec<_> = map.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths, ["src/B.php", "src/A.php"]);
        assert!(map.contains("src/A.php"));
        assert_eq!(map.get("src/A.php").map(FileCoverage::as_str), Some("NN"));
    }
}
