// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code to generate JUnit XML reports from normalized results.

use crate::{assembler::TestResult, config::NormalizerConfig, errors::WriteResultsError};
use indexmap::IndexMap;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use report_metadata::TestOutcome;
use std::{io, time::Duration};

/// Converts normalized results into a JUnit report.
///
/// Each result is placed in a `<testsuite>` named after its suite. Results without a suite are
/// grouped by the class portion of a `Class::method` name, and any remaining results go into a
/// suite named after the report.
#[derive(Clone, Debug)]
pub struct JunitExporter<'cfg> {
    config: &'cfg NormalizerConfig,
}

impl<'cfg> JunitExporter<'cfg> {
    /// Creates a new exporter.
    pub fn new(config: &'cfg NormalizerConfig) -> Self {
        Self { config }
    }

    /// Builds a JUnit report out of `results`.
    pub fn to_report(&self, results: &[TestResult]) -> Report {
        let mut test_suites: IndexMap<&str, TestSuite> = IndexMap::new();
        let mut total_time = Duration::ZERO;

        for result in results {
            total_time += result.time();
            let suite_name = self.suite_name(result);
            let test_suite = test_suites
                .entry(suite_name)
                .or_insert_with(|| TestSuite::new(suite_name));

            let mut testcase = TestCase::new(result.name(), testcase_status(result));
            testcase
                .set_classname(test_suite.name.clone())
                .set_time(result.time());
            test_suite.add_test_case(testcase);
        }

        let mut report = Report::new(self.config.report_name());
        report
            .set_time(total_time)
            .add_test_suites(test_suites.into_values());
        report
    }

    /// Writes `results` as JUnit XML to `writer`.
    pub fn write(
        &self,
        results: &[TestResult],
        writer: impl io::Write,
    ) -> Result<(), WriteResultsError> {
        self.to_report(results).serialize(writer)?;
        Ok(())
    }

    fn suite_name<'a>(&'a self, result: &'a TestResult) -> &'a str {
        result
            .suite()
            .or_else(|| result.name().split_once("::").map(|(class, _)| class))
            .unwrap_or_else(|| self.config.report_name())
    }
}

fn testcase_status(result: &TestResult) -> TestCaseStatus {
    let (mut status, ty) = match result.outcome() {
        TestOutcome::Pass => return TestCaseStatus::success(),
        TestOutcome::Skip => (TestCaseStatus::skipped(), None),
        TestOutcome::Fail => (
            TestCaseStatus::non_success(NonSuccessKind::Failure),
            Some("assertion failure"),
        ),
        TestOutcome::Broken => (
            TestCaseStatus::non_success(NonSuccessKind::Error),
            Some("error"),
        ),
    };

    let diagnostic = result.diagnostic();
    if let Some(message) = diagnostic.lines().next().filter(|line| !line.is_empty()) {
        status.set_message(message);
    }
    if !diagnostic.is_empty() {
        status.set_description(diagnostic);
    }
    if let Some(ty) = ty {
        status.set_type(ty);
    }
    status
}
