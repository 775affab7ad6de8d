// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use regex::Regex;
use serde::Deserialize;
use std::{borrow::Cow, sync::LazyLock};

/// A trailing ` (...)` suffix, as added by data providers.
static DATASET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(.*\)$").expect("dataset suffix regex is valid"));

/// How the display name of a test is derived from the name the runner reports.
///
/// Runners embed either a data set qualifier or the suite name in the reported name, and which
/// of the two is reliably present depends on the runner version.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// Strip a trailing parenthesized data set suffix: `Foo::testBar (data set #0)` becomes
    /// `Foo::testBar`.
    #[default]
    StripDatasetSuffix,

    /// Strip a leading `<suite>::` prefix: `Foo::testBar` in suite `Foo` becomes `testBar`.
    ///
    /// Names that don't start with the suite name, or events without a suite, are kept as-is.
    StripSuitePrefix,
}

impl NamingStrategy {
    /// Returns the display name for a test with the given raw name and suite.
    pub fn display_name<'a>(self, test: &'a str, suite: Option<&str>) -> Cow<'a, str> {
        match self {
            NamingStrategy::StripDatasetSuffix => DATASET_SUFFIX.replace(test, ""),
            NamingStrategy::StripSuitePrefix => {
                let stripped = suite
                    .and_then(|suite| test.strip_prefix(suite))
                    .and_then(|rest| rest.strip_prefix("::"));
                Cow::Borrowed(stripped.unwrap_or(test))
            }
        }
    }
}

/// How messages on errored tests are matched against skip markers.
///
/// The runner reports skipped and incomplete tests through its error channel, distinguishable
/// only by their message.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClassification {
    /// The message contains a marker anywhere.
    #[default]
    Contains,

    /// The message is exactly equal to a marker.
    ///
    /// Misses runner versions that decorate the message, e.g. with trailing punctuation.
    Exact,
}

impl ErrorClassification {
    /// Returns true if `message` marks the test as skipped.
    pub fn is_skip(self, message: &str, markers: &[String]) -> bool {
        markers.iter().any(|marker| match self {
            ErrorClassification::Contains => message.contains(marker.as_str()),
            ErrorClassification::Exact => message == marker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("FooTest::testBar", None, "FooTest::testBar" ; "plain")]
    #[test_case("FooTest::testBar (data set #0)", None, "FooTest::testBar" ; "numbered data set")]
    #[test_case(
        r#"FooTest::testBar with data set "empty" (array())"#,
        None,
        r#"FooTest::testBar with data set "empty""#
        ; "named data set"
    )]
    #[test_case("FooTest::testBar(1)", None, "FooTest::testBar(1)" ; "no leading space")]
    #[test_case("FooTest::testBar (1) trailing", None, "FooTest::testBar (1) trailing" ; "not at end")]
    fn strip_dataset_suffix(test: &str, suite: Option<&str>, expected: &str) {
        assert_eq!(
            NamingStrategy::StripDatasetSuffix.display_name(test, suite),
            expected
        );
    }

    #[test_case("FooTest::testBar", Some("FooTest"), "testBar" ; "with suite")]
    #[test_case("FooTest::testBar", None, "FooTest::testBar" ; "no suite")]
    #[test_case("FooTest::testBar", Some("BarTest"), "FooTest::testBar" ; "other suite")]
    #[test_case("FooTestExtra::testBar", Some("FooTest"), "FooTestExtra::testBar" ; "suite is a prefix")]
    fn strip_suite_prefix(test: &str, suite: Option<&str>, expected: &str) {
        assert_eq!(
            NamingStrategy::StripSuitePrefix.display_name(test, suite),
            expected
        );
    }

    #[test_case(ErrorClassification::Contains, "Skipped Test", true ; "contains exact")]
    #[test_case(ErrorClassification::Contains, "Skipped Test: needs redis", true ; "contains decorated")]
    #[test_case(ErrorClassification::Contains, "Incomplete Test.", true ; "contains incomplete")]
    #[test_case(ErrorClassification::Contains, "Exception: boom", false ; "contains other")]
    #[test_case(ErrorClassification::Exact, "Skipped Test", true ; "exact match")]
    #[test_case(ErrorClassification::Exact, "Skipped Test.", false ; "exact decorated")]
    fn is_skip(mode: ErrorClassification, message: &str, expected: bool) {
        let markers = vec!["Skipped Test".to_owned(), "Incomplete Test".to_owned()];
        assert_eq!(mode.is_skip(message, &markers), expected);
    }
}
