// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argument parsing and command execution.

use crate::{
    ExpectedError, Result,
    displayer::HumanDisplayer,
    line_count::FsLineCounter,
    output::{OutputContext, OutputOpts},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use report_metadata::ReportExitCode;
use report_normalizer::{
    config::NormalizerConfig,
    errors::WriteResultsError,
    junit::JunitExporter,
    pipeline::{AffectedTests, NormalizedRun, RunInputs, normalize},
};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufWriter, Write},
};
use tracing::{debug, warn};

/// Normalize a test runner's JSON event stream and Clover coverage into structured results.
#[derive(Debug, Parser)]
#[command(
    name = "normalize-report",
    version,
    max_term_width = 100,
)]
pub struct NormalizeReportApp {
    /// Path to the runner's JSON event stream
    #[arg(long, value_name = "PATH")]
    report: Utf8PathBuf,

    /// Path to the runner's Clover XML coverage report
    ///
    /// If not specified, results are reported without coverage.
    #[arg(long, value_name = "PATH")]
    coverage: Option<Utf8PathBuf>,

    /// Project root, used to make coverage paths relative [default: current directory]
    #[arg(long, value_name = "DIR")]
    project_root: Option<Utf8PathBuf>,

    /// A source file and the test that exercises it, as SOURCE=TEST
    ///
    /// Coverage is only synthesized for source files named here or in --affected-file. Relative
    /// source paths are resolved against the project root. May be specified multiple times.
    #[arg(long = "affected", value_name = "SOURCE=TEST", value_parser = parse_affected)]
    affected: Vec<(Utf8PathBuf, String)>,

    /// Path to a JSON object mapping source files to tests
    #[arg(long, value_name = "PATH")]
    affected_file: Option<Utf8PathBuf>,

    /// Config file [default: <project-root>/.config/report-normalizer.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,

    /// Write results to this file instead of standard output
    #[arg(long, short, value_name = "PATH")]
    output: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output_opts: OutputOpts,
}

/// The format results are written in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// Human-readable output
    #[default]
    Human,

    /// A JSON object, as described by `report_metadata::NormalizedReport`
    Json,

    /// JUnit XML
    Junit,
}

impl NormalizeReportApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output_opts.init()
    }

    /// Executes the app, returning the process exit code on success.
    ///
    /// Results are written to `stdout` unless `--output` is given.
    pub fn exec(self, stdout: &mut dyn Write) -> Result<i32> {
        let project_root = match &self.project_root {
            Some(project_root) => project_root.clone(),
            None => current_dir()?,
        };

        let config = NormalizerConfig::from_sources(
            &project_root,
            self.config_file.as_deref(),
            warn_unknown_keys,
        )?;

        let affected = self.affected_tests(&project_root)?;
        let report = read_input("JSON report", &self.report)?;
        let coverage = self
            .coverage
            .as_deref()
            .map(|path| read_input("coverage report", path))
            .transpose()?;
        if coverage.is_some() && affected.is_empty() {
            warn!("a coverage report was provided, but no affected source files were specified");
        }

        let inputs = RunInputs {
            report: &report,
            coverage: coverage.as_deref(),
            affected: &affected,
            project_root: &project_root,
        };
        let run = normalize(inputs, &config, FsLineCounter)?;

        match &self.output {
            Some(path) => {
                let file = File::create(path).map_err(|err| ExpectedError::OutputCreateError {
                    path: path.clone(),
                    err,
                })?;
                let mut writer = BufWriter::new(file);
                self.write_results(&run, &config, &mut writer, false)?;
                writer.flush().map_err(WriteResultsError::from)?;
            }
            None => {
                let colorize = self
                    .output_opts
                    .color
                    .should_colorize(supports_color::Stream::Stdout);
                self.write_results(&run, &config, stdout, colorize)?;
                stdout.flush().map_err(WriteResultsError::from)?;
            }
        }

        if run.has_failures() {
            Err(ExpectedError::TestRunFailed)
        } else {
            Ok(ReportExitCode::OK)
        }
    }

    fn affected_tests(&self, project_root: &Utf8Path) -> Result<AffectedTests> {
        let mut affected = match &self.affected_file {
            Some(path) => {
                let contents = read_input("affected tests file", path)?;
                serde_json::from_str(&contents).map_err(|err| {
                    ExpectedError::AffectedFileParseError {
                        path: path.clone(),
                        err,
                    }
                })?
            }
            None => AffectedTests::new(),
        };
        affected.extend(self.affected.iter().cloned().collect());

        // Coverage reports name files by absolute path.
        let resolved: AffectedTests = affected
            .iter()
            .map(|(source, test)| (project_root.join(source), test))
            .collect();
        debug!("synthesizing coverage for {} source files", resolved.len());
        Ok(resolved)
    }

    fn write_results(
        &self,
        run: &NormalizedRun,
        config: &NormalizerConfig,
        writer: &mut dyn Write,
        colorize: bool,
    ) -> Result<(), WriteResultsError> {
        match self.message_format {
            MessageFormat::Human => HumanDisplayer::new(colorize).write(run, writer)?,
            MessageFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, &run.to_report())?;
                writeln!(writer)?;
            }
            MessageFormat::Junit => JunitExporter::new(config).write(run.results(), writer)?,
        }
        Ok(())
    }
}

fn parse_affected(arg: &str) -> Result<(Utf8PathBuf, String), String> {
    match arg.split_once('=') {
        Some((source, test)) if !source.is_empty() && !test.is_empty() => {
            Ok((source.into(), test.to_owned()))
        }
        _ => Err(format!("expected SOURCE=TEST, found `{arg}`")),
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
    Utf8PathBuf::try_from(dir).map_err(|err| ExpectedError::CurrentDirFailed {
        err: err.into_io_error(),
    })
}

fn read_input(kind: &'static str, path: &Utf8Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| ExpectedError::input_read_error(kind, path, err))
}

fn warn_unknown_keys(config_file: &Utf8Path, unknown: &BTreeSet<String>) {
    let mut unknown_str = String::new();
    if let [single] = unknown.iter().collect::<Vec<_>>().as_slice() {
        // Print this on the same line.
        unknown_str.push(' ');
        unknown_str.push_str(single);
    } else {
        for ignored_key in unknown {
            unknown_str.push_str("\n  - ");
            unknown_str.push_str(ignored_key);
        }
    }

    warn!("ignoring unknown configuration keys in config file {config_file}:{unknown_str}");
}
