// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The normalization pipeline: decode, synthesize coverage, and assemble results for the output
//! of one runner invocation.

use crate::{
    assembler::{ResultAssembler, TestResult},
    config::NormalizerConfig,
    decoder::ReportDecoder,
    errors::NormalizeError,
};
use camino::{Utf8Path, Utf8PathBuf};
use clover_coverage::{CoverageMap, CoverageSynthesizer, LineCounter};
use report_metadata::NormalizedReport;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

/// A map from absolute source paths to the test that exercises them.
///
/// Only the keys are used during normalization, to decide which files to synthesize coverage
/// for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AffectedTests {
    tests: BTreeMap<Utf8PathBuf, String>,
}

impl AffectedTests {
    /// Creates a new, empty `AffectedTests`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over source paths and their tests.
    pub fn iter(&self) -> impl Iterator<Item = (&Utf8Path, &str)> + '_ {
        self.tests
            .iter()
            .map(|(source, test)| (source.as_path(), test.as_str()))
    }

    /// Iterates over the source paths.
    pub fn sources(&self) -> impl Iterator<Item = &Utf8Path> + '_ {
        self.tests.keys().map(Utf8PathBuf::as_path)
    }

    /// Returns the number of source paths.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if there are no source paths.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Extends `self` with the entries of `other`. Entries in `other` win.
    pub fn extend(&mut self, other: AffectedTests) {
        self.tests.extend(other.tests);
    }
}

impl<S: Into<Utf8PathBuf>, T: Into<String>> FromIterator<(S, T)> for AffectedTests {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self {
            tests: iter
                .into_iter()
                .map(|(source, test)| (source.into(), test.into()))
                .collect(),
        }
    }
}

/// The raw inputs from one runner invocation.
#[derive(Clone, Copy, Debug)]
pub struct RunInputs<'a> {
    /// The raw JSON event stream.
    pub report: &'a str,

    /// The raw Clover XML document, if coverage was collected.
    pub coverage: Option<&'a str>,

    /// The source files to synthesize coverage for.
    pub affected: &'a AffectedTests,

    /// The project root, used to relativize coverage paths.
    pub project_root: &'a Utf8Path,
}

/// The normalized output of one runner invocation.
#[derive(Clone, Debug)]
pub struct NormalizedRun {
    results: Vec<TestResult>,
    coverage: Arc<CoverageMap>,
}

impl NormalizedRun {
    /// The results, in the order the runner reported them.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Coverage for the invocation, shared with every result.
    pub fn coverage(&self) -> &Arc<CoverageMap> {
        &self.coverage
    }

    /// Returns true if any test failed or was broken.
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.outcome().is_failure())
    }

    /// Returns the serializable form of this run.
    pub fn to_report(&self) -> NormalizedReport {
        let coverage = self
            .coverage
            .iter()
            .map(|(path, coverage)| (path.to_string(), coverage.to_string()))
            .collect();
        NormalizedReport::new(self.results.iter().map(TestResult::to_summary), coverage)
    }
}

/// Normalizes the output of one runner invocation.
///
/// The report is decoded before coverage is read, so a runner that crashed is reported as an
/// empty report rather than as empty coverage. Coverage is only synthesized if it is enabled
/// in `config` and `inputs` has a coverage document; otherwise results share an empty map.
///
/// No state is held across calls, so independent invocations can be normalized in parallel.
pub fn normalize<L: LineCounter>(
    inputs: RunInputs<'_>,
    config: &NormalizerConfig,
    line_counter: L,
) -> Result<NormalizedRun, NormalizeError> {
    let events = ReportDecoder::new().decode(inputs.report)?;

    let coverage = match inputs.coverage {
        Some(raw) if config.coverage_enabled() => {
            let synthesizer = CoverageSynthesizer::new(
                inputs.project_root,
                inputs.affected.sources(),
                line_counter,
            );
            synthesizer.synthesize(raw)?
        }
        Some(_) => {
            debug!("coverage is disabled, ignoring coverage report");
            CoverageMap::new()
        }
        None => CoverageMap::new(),
    };
    let coverage = Arc::new(coverage);

    let results = ResultAssembler::new(config).assemble(events, Arc::clone(&coverage));
    debug!(
        "normalized {} results with coverage for {} files",
        results.len(),
        coverage.len()
    );

    Ok(NormalizedRun { results, coverage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NormalizeErrorKind;
    use indoc::indoc;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;
    use report_metadata::TestOutcome;
    use std::io;

    const REPORT: &str = concat!(
        r#"{"event":"suiteStart","suite":"FooTest","tests":1}"#,
        r#"{"event":"test","test":"FooTest::testBar","suite":"FooTest","status":"fail","#,
        r#""message":"boom","trace":[{"file":"/p/FooTest.php","line":12}],"time":0.01}"#,
    );

    const COVERAGE: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <coverage generated="1700000000">
          <project timestamp="1700000000">
            <file name="/p/src/Foo.php">
              <line num="2" type="stmt" count="1"/>
              <line num="3" type="stmt" count="0"/>
            </file>
            <file name="/p/src/Bar.php">
              <line num="1" type="stmt" count="1"/>
            </file>
          </project>
        </coverage>
    "#};

    fn four_lines(_: &Utf8Path) -> io::Result<usize> {
        Ok(4)
    }

    fn affected() -> AffectedTests {
        [("/p/src/Foo.php", "/p/tests/FooTest.php")]
            .into_iter()
            .collect()
    }

    #[test]
    fn fail_event_without_coverage() {
        let affected = AffectedTests::new();
        let inputs = RunInputs {
            report: REPORT,
            coverage: None,
            affected: &affected,
            project_root: Utf8Path::new("/p"),
        };
        let run = normalize(inputs, &NormalizerConfig::default(), four_lines)
            .expect("normalization succeeded");

        assert_eq!(run.results().len(), 1);
        let result = &run.results()[0];
        assert_eq!(result.name(), "FooTest::testBar");
        assert_eq!(result.outcome(), TestOutcome::Fail);
        assert_eq!(result.time().as_secs_f64(), 0.01);
        assert!(result.diagnostic().contains("boom"));
        assert!(result.diagnostic().contains("/p/FooTest.php:12"));
        assert!(result.coverage().is_empty());
        assert!(run.has_failures());
    }

    #[test]
    fn coverage_for_affected_files() {
        let affected = affected();
        let inputs = RunInputs {
            report: REPORT,
            coverage: Some(COVERAGE),
            affected: &affected,
            project_root: Utf8Path::new("/p"),
        };
        let run = normalize(inputs, &NormalizerConfig::default(), four_lines)
            .expect("normalization succeeded");

        let report = run.to_report();
        assert_eq!(
            report.coverage,
            btreemap! { "src/Foo.php".to_owned() => "NCUN".to_owned() }
        );
        assert!(Arc::ptr_eq(run.results()[0].coverage(), run.coverage()));
        assert_eq!(report.counts.failed, 1);
    }

    #[test]
    fn coverage_disabled_in_config() {
        let affected = affected();
        let inputs = RunInputs {
            report: REPORT,
            coverage: Some(COVERAGE),
            affected: &affected,
            project_root: Utf8Path::new("/p"),
        };
        let mut config = NormalizerConfig::default();
        config.set_coverage_enabled(false);

        let counter = |path: &Utf8Path| -> io::Result<usize> {
            panic!("line counter called for {path} with coverage disabled")
        };
        let run = normalize(inputs, &config, counter).expect("normalization succeeded");
        assert!(run.coverage().is_empty());
    }

    #[test]
    fn empty_report_wins_over_empty_coverage() {
        let affected = affected();
        let inputs = RunInputs {
            report: " \n",
            coverage: Some(""),
            affected: &affected,
            project_root: Utf8Path::new("/p"),
        };
        let error = normalize(inputs, &NormalizerConfig::default(), four_lines)
            .expect_err("empty report is an error");
        assert!(matches!(error, NormalizeError::Decode(_)), "{error:?}");
        assert_eq!(error.kind(), NormalizeErrorKind::RunnerProducedNoOutput);
    }

    #[test]
    fn empty_coverage_is_an_error() {
        let affected = affected();
        let inputs = RunInputs {
            report: REPORT,
            coverage: Some("   "),
            affected: &affected,
            project_root: Utf8Path::new("/p"),
        };
        let error = normalize(inputs, &NormalizerConfig::default(), four_lines)
            .expect_err("empty coverage is an error");
        assert!(matches!(error, NormalizeError::Coverage(_)), "{error:?}");
        assert_eq!(error.kind(), NormalizeErrorKind::RunnerProducedNoOutput);
    }

    #[test]
    fn affected_tests_from_json() {
        let json = r#"{"/p/src/Foo.php": "/p/tests/FooTest.php", "/p/src/Bar.php": "/p/tests/BarTest.php"}"#;
        let mut affected: AffectedTests = serde_json::from_str(json).expect("valid JSON");
        assert_eq!(affected.len(), 2);

        affected.extend([("/p/src/Bar.php", "/p/tests/OtherTest.php")].into_iter().collect());
        assert_eq!(
            affected.iter().collect::<Vec<_>>(),
            vec![
                (Utf8Path::new("/p/src/Bar.php"), "/p/tests/OtherTest.php"),
                (Utf8Path::new("/p/src/Foo.php"), "/p/tests/FooTest.php"),
            ]
        );
        assert_eq!(
            affected.sources().collect::<Vec<_>>(),
            vec![Utf8Path::new("/p/src/Bar.php"), Utf8Path::new("/p/src/Foo.php")]
        );
    }
}
