// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable output for normalized results.

use owo_colors::{OwoColorize, Style, style};
use report_metadata::{OutcomeCounts, TestOutcome};
use report_normalizer::pipeline::NormalizedRun;
use std::io::{self, Write};

pub(crate) struct HumanDisplayer {
    styles: Styles,
}

impl HumanDisplayer {
    pub(crate) fn new(colorize: bool) -> Self {
        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }
        Self { styles }
    }

    pub(crate) fn write(&self, run: &NormalizedRun, writer: &mut dyn Write) -> io::Result<()> {
        for result in run.results() {
            let (label, label_style) = match result.outcome() {
                TestOutcome::Pass => ("PASS", self.styles.pass),
                TestOutcome::Fail => ("FAIL", self.styles.fail),
                TestOutcome::Skip => ("SKIP", self.styles.skip),
                TestOutcome::Broken => ("BROKEN", self.styles.fail),
            };

            // * > means right-align.
            // * 8 is the number of characters to pad to.
            // * .3 means print three digits after the decimal point.
            writeln!(
                writer,
                "{:>12} [{:>8.3}s] {}",
                label.style(label_style),
                result.time().as_secs_f64(),
                result.name().style(self.styles.name),
            )?;

            if result.outcome() != TestOutcome::Pass {
                for line in result.diagnostic().lines() {
                    if line.is_empty() {
                        writeln!(writer)?;
                    } else {
                        writeln!(writer, "    {}", line.style(self.styles.diagnostic))?;
                    }
                }
            }
        }

        let coverage = run.coverage();
        if !coverage.is_empty() {
            writeln!(writer, "------------")?;
            for (path, file) in coverage.iter() {
                writeln!(
                    writer,
                    "{:>12} {}: {}/{} statements covered",
                    "Coverage".style(self.styles.count),
                    path,
                    file.covered().style(self.styles.count),
                    file.statements().style(self.styles.count),
                )?;
            }
        }

        let counts: OutcomeCounts = run.results().iter().map(|r| r.outcome()).collect();
        let summary_style = if counts.has_failures() {
            self.styles.fail
        } else if counts.total() == 0 {
            self.styles.skip
        } else {
            self.styles.pass
        };
        writeln!(
            writer,
            "------------\n{:>12} {} {} run: {} passed, {} failed, {} skipped, {} broken",
            "Summary".style(summary_style),
            counts.total().style(self.styles.count),
            if counts.total() == 1 { "test" } else { "tests" },
            counts.passed.style(self.styles.count),
            counts.failed.style(self.styles.count),
            counts.skipped.style(self.styles.count),
            counts.broken.style(self.styles.count),
        )
    }
}

#[derive(Debug, Default)]
struct Styles {
    pass: Style,
    fail: Style,
    skip: Style,
    name: Style,
    count: Style,
    diagnostic: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.pass = style().green().bold();
        self.fail = style().red().bold();
        self.skip = style().yellow().bold();
        self.name = style().bold();
        self.count = style().bold();
        self.diagnostic = style().dimmed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use report_normalizer::{
        config::NormalizerConfig,
        pipeline::{AffectedTests, RunInputs, normalize},
    };

    fn render(report: &str, coverage: Option<&str>) -> String {
        let affected: AffectedTests = [("/p/src/Foo.php", "/p/tests/FooTest.php")]
            .into_iter()
            .collect();
        let inputs = RunInputs {
            report,
            coverage,
            affected: &affected,
            project_root: Utf8Path::new("/p"),
        };
        let counter = |_: &Utf8Path| -> io::Result<usize> { Ok(5) };
        let run = normalize(inputs, &NormalizerConfig::default(), counter)
            .expect("normalization succeeded");

        let mut out = Vec::new();
        HumanDisplayer::new(false)
            .write(&run, &mut out)
            .expect("writing to a Vec succeeds");
        String::from_utf8(out).expect("output is UTF-8")
    }

    #[test]
    fn mixed_results() {
        let report = concat!(
            r#"{"event":"test","test":"FooTest::testOk","status":"pass","time":0.5}"#,
            r#"{"event":"test","test":"FooTest::testBar","status":"fail","message":"boom","#,
            r#""trace":[{"file":"/p/FooTest.php","line":12}],"time":0.01}"#,
            r#"{"event":"test","test":"FooTest::testLater","status":"error","message":"Skipped Test"}"#,
        );
        let coverage = indoc! {r#"
            <coverage>
              <project>
                <file name="/p/src/Foo.php">
                  <line num="2" type="stmt" count="3"/>
                  <line num="3" type="stmt" count="0"/>
                </file>
              </project>
            </coverage>
        "#};

        assert_eq!(
            render(report, Some(coverage)),
            indoc! {"
                        PASS [   0.500s] FooTest::testOk
                        FAIL [   0.010s] FooTest::testBar
                    boom

                    /p/FooTest.php:12
                        SKIP [   0.000s] FooTest::testLater
                    Skipped Test
                ------------
                    Coverage src/Foo.php: 1/2 statements covered
                ------------
                     Summary 3 tests run: 1 passed, 1 failed, 1 skipped, 0 broken
            "}
        );
    }

    #[test]
    fn single_pass() {
        let report = r#"{"event":"test","test":"FooTest::testOk","time":0.25}"#;
        assert_eq!(
            render(report, None),
            indoc! {"
                        PASS [   0.250s] FooTest::testOk
                ------------
                     Summary 1 test run: 1 passed, 0 failed, 0 skipped, 0 broken
            "}
        );
    }
}
