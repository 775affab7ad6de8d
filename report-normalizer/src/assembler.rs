// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of decoded events into normalized test results.

use crate::{
    config::NormalizerConfig,
    decoder::{EventKind, EventStatus, TestEvent},
};
use clover_coverage::CoverageMap;
use report_metadata::{TestOutcome, TestResultSummary};
use std::{sync::Arc, time::Duration};
use swrite::{SWrite, swrite};

/// The normalized result of a single test.
///
/// Every result produced from one runner invocation shares the same coverage map.
#[derive(Clone, Debug, PartialEq)]
pub struct TestResult {
    name: String,
    suite: Option<String>,
    outcome: TestOutcome,
    time: Duration,
    coverage: Arc<CoverageMap>,
    diagnostic: String,
}

impl TestResult {
    /// The display name of the test.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The suite the runner reported for this test, if any.
    pub fn suite(&self) -> Option<&str> {
        self.suite.as_deref()
    }

    /// The outcome of the test.
    pub fn outcome(&self) -> TestOutcome {
        self.outcome
    }

    /// The time taken by the test.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Coverage for the invocation this test ran in.
    pub fn coverage(&self) -> &Arc<CoverageMap> {
        &self.coverage
    }

    /// The failure message followed by one `file:line` entry per trace frame.
    ///
    /// Empty for passing tests.
    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }

    /// Returns the serializable summary of this result, without coverage.
    pub fn to_summary(&self) -> TestResultSummary {
        TestResultSummary {
            name: self.name.clone(),
            outcome: self.outcome,
            time: self.time.as_secs_f64(),
            diagnostic: self.diagnostic.clone(),
        }
    }
}

/// Turns decoded events into [`TestResult`]s according to a [`NormalizerConfig`].
#[derive(Clone, Debug)]
pub struct ResultAssembler<'cfg> {
    config: &'cfg NormalizerConfig,
}

impl<'cfg> ResultAssembler<'cfg> {
    /// Creates a new assembler.
    pub fn new(config: &'cfg NormalizerConfig) -> Self {
        Self { config }
    }

    /// Assembles one result per `test` event, in order. Other events are skipped.
    pub fn assemble(
        &self,
        events: impl IntoIterator<Item = TestEvent>,
        coverage: Arc<CoverageMap>,
    ) -> Vec<TestResult> {
        events
            .into_iter()
            .filter(|event| event.kind == EventKind::Test)
            .map(|event| self.assemble_one(event, Arc::clone(&coverage)))
            .collect()
    }

    /// Returns the normalized outcome of an event.
    pub fn classify(&self, event: &TestEvent) -> TestOutcome {
        match event.status {
            EventStatus::Pass => TestOutcome::Pass,
            EventStatus::Fail => TestOutcome::Fail,
            EventStatus::Error => {
                if self
                    .config
                    .error_classification()
                    .is_skip(&event.message, self.config.skip_markers())
                {
                    TestOutcome::Skip
                } else {
                    TestOutcome::Broken
                }
            }
        }
    }

    /// Returns the display name of an event's test.
    pub fn display_name(&self, event: &TestEvent) -> String {
        self.config
            .naming_strategy()
            .display_name(&event.test, event.suite.as_deref())
            .into_owned()
    }

    fn assemble_one(&self, event: TestEvent, coverage: Arc<CoverageMap>) -> TestResult {
        let outcome = self.classify(&event);
        let name = self.display_name(&event);
        let diagnostic = diagnostic(outcome, &event);
        TestResult {
            name,
            suite: event.suite,
            outcome,
            time: event.time,
            coverage,
            diagnostic,
        }
    }
}

fn diagnostic(outcome: TestOutcome, event: &TestEvent) -> String {
    let mut out = match outcome {
        TestOutcome::Pass => return String::new(),
        TestOutcome::Skip => return event.message.clone(),
        TestOutcome::Fail => format!("{}\n", event.message),
        TestOutcome::Broken => event.message.clone(),
    };
    for frame in &event.trace {
        swrite!(out, "\n{frame}");
    }
    out
}
