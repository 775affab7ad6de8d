// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use clover_coverage::{
    CoverageParseErrorKind, CoverageSynthesizer, LineCoverage, SynthesizeError,
};
use pretty_assertions::assert_eq;
use std::io;

static PHPUNIT_CLOVER: &str = include_str!("fixtures/phpunit-clover.xml");

fn fixture_line_counts(path: &Utf8Path) -> io::Result<usize> {
    match path.as_str() {
        "/www/project/src/Billing/Invoice.php" => Ok(22),
        "/www/project/src/Billing/Ledger.php" => Ok(11),
        "/www/project/src/helpers.php" => Ok(4),
        _ => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no fixture for {path}"),
        )),
    }
}

#[test]
fn phpunit_clover_report() {
    let synthesizer = CoverageSynthesizer::new(
        Utf8Path::new("/www/project"),
        [
            Utf8Path::new("/www/project/src/Billing/Invoice.php"),
            Utf8Path::new("/www/project/src/helpers.php"),
        ],
        fixture_line_counts,
    );
    let map = synthesizer
        .synthesize(PHPUNIT_CLOVER)
        .expect("fixture is a valid Clover report");

    let actual: Vec<_> = map
        .iter()
        .map(|(path, coverage)| (path.as_str(), coverage.as_str()))
        .collect();
    assert_eq!(
        actual,
        vec![
            ("src/Billing/Invoice.php", "NNNNNNNNNNCCNNNNUUNCNN"),
            ("src/helpers.php", "NNNN"),
        ]
    );

    let invoice = map.get("src/Billing/Invoice.php").unwrap();
    assert_eq!(invoice.line_count(), 22);
    assert_eq!(invoice.covered(), 3);
    assert_eq!(invoice.uncovered(), 2);
    assert_eq!(invoice.line(9), Some(LineCoverage::NotApplicable));
    assert_eq!(invoice.line(20), Some(LineCoverage::Covered));
    assert!(!map.contains("src/Billing/Ledger.php"));
}

#[test]
fn stale_report_is_rejected() {
    // Invoice.php has shrunk since coverage was collected.
    let synthesizer = CoverageSynthesizer::new(
        Utf8Path::new("/www/project"),
        [Utf8Path::new("/www/project/src/Billing/Invoice.php")],
        |_: &Utf8Path| -> io::Result<usize> { Ok(18) },
    );
    let err = synthesizer
        .synthesize(PHPUNIT_CLOVER)
        .expect_err("line 20 is past the end of the file");
    match err {
        SynthesizeError::Parse(err) => match err.kind() {
            CoverageParseErrorKind::LineOutOfRange {
                num, line_count, ..
            } => {
                assert_eq!((*num, *line_count), (20, 18));
            }
            other => panic!("unexpected error kind: {other:?}"),
        },
        other => panic!("unexpected error: {other:?}"),
    }
}
