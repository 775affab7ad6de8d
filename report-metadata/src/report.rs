// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// The normalized outcome of a single test.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestOutcome {
    /// The test passed.
    Pass,

    /// An assertion in the test failed.
    Fail,

    /// The test was skipped or marked incomplete.
    Skip,

    /// The test errored out in a way that wasn't an assertion failure.
    Broken,
}

impl TestOutcome {
    /// Returns the kebab-case name of this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Pass => "pass",
            TestOutcome::Fail => "fail",
            TestOutcome::Skip => "skip",
            TestOutcome::Broken => "broken",
        }
    }

    /// Returns true if this outcome should fail the overall run.
    pub fn is_failure(self) -> bool {
        matches!(self, TestOutcome::Fail | TestOutcome::Broken)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable information about a single normalized test result.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestResultSummary {
    /// The display name of the test.
    pub name: String,

    /// The outcome of the test.
    pub outcome: TestOutcome,

    /// The time taken by the test, in seconds.
    pub time: f64,

    /// Diagnostic output: the failure message followed by `file:line` trace entries.
    ///
    /// Empty for passing tests.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub diagnostic: String,
}

/// Counts of test results by outcome.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutcomeCounts {
    /// The number of passing tests.
    pub passed: usize,

    /// The number of failing tests.
    pub failed: usize,

    /// The number of skipped or incomplete tests.
    pub skipped: usize,

    /// The number of broken tests.
    pub broken: usize,
}

impl OutcomeCounts {
    /// Records a single outcome.
    pub fn add(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Pass => self.passed += 1,
            TestOutcome::Fail => self.failed += 1,
            TestOutcome::Skip => self.skipped += 1,
            TestOutcome::Broken => self.broken += 1,
        }
    }

    /// Returns the total number of tests.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.broken
    }

    /// Returns true if any test failed or was broken.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.broken > 0
    }
}

impl FromIterator<TestOutcome> for OutcomeCounts {
    fn from_iter<T: IntoIterator<Item = TestOutcome>>(iter: T) -> Self {
        let mut counts = Self::default();
        for outcome in iter {
            counts.add(outcome);
        }
        counts
    }
}

/// The full normalized output for one test-runner invocation.
///
/// Coverage is the same for every test in an invocation, so it is stored once here rather than
/// per result.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NormalizedReport {
    /// Outcome counts across `results`.
    pub counts: OutcomeCounts,

    /// Test results, in the order the test runner reported them.
    pub results: Vec<TestResultSummary>,

    /// Map of project-relative source paths to dense coverage strings (`C`, `U` or `N` per
    /// line).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub coverage: BTreeMap<String, String>,
}

impl NormalizedReport {
    /// Creates a new report from results and coverage, computing counts.
    pub fn new(
        results: impl IntoIterator<Item = TestResultSummary>,
        coverage: BTreeMap<String, String>,
    ) -> Self {
        let results: Vec<_> = results.into_iter().collect();
        let counts = results.iter().map(|result| result.outcome).collect();
        Self {
            counts,
            results,
            coverage,
        }
    }

    /// Parse JSON output produced by `normalize-report --message-format json`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}
