// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for normalizing recorded runner output.

use camino::Utf8Path;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use report_metadata::{OutcomeCounts, TestOutcome};
use report_normalizer::{
    config::{ErrorClassification, NamingStrategy, NormalizerConfig},
    errors::{NormalizeError, NormalizeErrorKind},
    junit::JunitExporter,
    pipeline::{AffectedTests, RunInputs, normalize},
};
use std::{collections::BTreeMap, io, sync::Arc};

static CART_LOG: &str = include_str!("fixtures/cart-log.json");
static CART_CLOVER: &str = include_str!("fixtures/cart-clover.xml");

fn line_counts() -> BTreeMap<&'static str, usize> {
    btreemap! {
        "/repo/src/Cart.php" => 17,
        "/repo/src/Money.php" => 8,
        "/repo/src/Unrelated.php" => 3,
    }
}

fn counter(path: &Utf8Path) -> io::Result<usize> {
    line_counts()
        .get(path.as_str())
        .copied()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
}

fn affected() -> AffectedTests {
    [
        ("/repo/src/Cart.php", "/repo/tests/CartTest.php"),
        ("/repo/src/Money.php", "/repo/tests/CartTest.php"),
    ]
    .into_iter()
    .collect()
}

fn inputs<'a>(affected: &'a AffectedTests, coverage: Option<&'a str>) -> RunInputs<'a> {
    RunInputs {
        report: CART_LOG,
        coverage,
        affected,
        project_root: Utf8Path::new("/repo"),
    }
}

#[test]
fn cart_fixture() {
    let affected = affected();
    let run = normalize(
        inputs(&affected, Some(CART_CLOVER)),
        &NormalizerConfig::default(),
        counter,
    )
    .expect("fixture normalizes");

    let outcomes: Vec<_> = run
        .results()
        .iter()
        .map(|result| (result.name(), result.outcome()))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("CartTest::testAddItem with data set #0", TestOutcome::Pass),
            ("CartTest::testTotal", TestOutcome::Fail),
            ("CartTest::testDiscount", TestOutcome::Skip),
            ("CartTest::testCheckout", TestOutcome::Broken),
            ("CartTest::testShipping", TestOutcome::Skip),
        ]
    );

    let report = run.to_report();
    assert_eq!(
        report.counts,
        OutcomeCounts {
            passed: 1,
            failed: 1,
            skipped: 2,
            broken: 1,
        }
    );
    assert_eq!(
        report.coverage,
        btreemap! {
            "src/Cart.php".to_owned() => "NNNNNNCCNNNNNUUNN".to_owned(),
            "src/Money.php".to_owned() => "NNNNNCNN".to_owned(),
        }
    );

    let checkout = &run.results()[3];
    assert_eq!(
        checkout.diagnostic(),
        "RuntimeException: payment gateway unreachable\n/repo/src/Cart.php:14\n/repo/tests/CartTest.php:47"
    );
    for result in run.results() {
        assert!(Arc::ptr_eq(result.coverage(), run.coverage()));
    }
}

#[test]
fn cart_fixture_strict_classification() {
    let affected = affected();
    let mut config = NormalizerConfig::default();
    config
        .set_error_classification(ErrorClassification::Exact)
        .set_naming_strategy(NamingStrategy::StripSuitePrefix);
    let run = normalize(inputs(&affected, None), &config, counter).expect("fixture normalizes");

    // The runner decorates skip messages, so exact matching classifies them as broken.
    let counts = run.to_report().counts;
    assert_eq!(counts.skipped, 0);
    assert_eq!(counts.broken, 3);
    assert_eq!(
        run.results()[0].name(),
        "testAddItem with data set #0 (1, 100)"
    );
}

#[test]
fn stale_coverage_is_rejected() {
    let affected = affected();
    let shrunk = |path: &Utf8Path| -> io::Result<usize> {
        if path.as_str() == "/repo/src/Cart.php" {
            Ok(10)
        } else {
            counter(path)
        }
    };
    let error = normalize(
        inputs(&affected, Some(CART_CLOVER)),
        &NormalizerConfig::default(),
        shrunk,
    )
    .expect_err("line 12 is past the end of a 10-line file");
    assert!(matches!(error, NormalizeError::Coverage(_)), "{error:?}");
    assert_eq!(error.kind(), NormalizeErrorKind::MalformedOutput);
}

#[test]
fn missing_source_file() {
    let affected: AffectedTests = [("/repo/src/Gone.php", "/repo/tests/GoneTest.php")]
        .into_iter()
        .collect();
    let coverage = r#"<coverage><project><file name="/repo/src/Gone.php"/></project></coverage>"#;
    let error = normalize(
        inputs(&affected, Some(coverage)),
        &NormalizerConfig::default(),
        counter,
    )
    .expect_err("line count fails");
    assert_eq!(error.kind(), NormalizeErrorKind::Environment);
}

#[test]
fn cart_fixture_junit() {
    let affected = affected();
    let config = NormalizerConfig::default();
    let run = normalize(inputs(&affected, None), &config, counter).expect("fixture normalizes");

    let report = JunitExporter::new(&config).to_report(run.results());
    assert_eq!(report.tests, 5);
    assert_eq!(report.failures, 1);
    assert_eq!(report.errors, 1);
    assert_eq!(report.test_suites.len(), 1);
    assert_eq!(report.test_suites[0].name.as_str(), "CartTest");
}
