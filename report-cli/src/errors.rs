// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{CONTINUATION_TARGET, OutputContext};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use report_metadata::ReportExitCode;
use report_normalizer::errors::{
    ConfigParseError, NormalizeError, NormalizeErrorKind, WriteResultsError,
};
use std::{error::Error, io};
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that `normalize-report` expects to hit, as opposed to a bug.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    CurrentDirFailed {
        #[source]
        err: io::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to read {kind}")]
    InputReadError {
        kind: &'static str,
        path: Utf8PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("failed to parse affected tests file")]
    AffectedFileParseError {
        path: Utf8PathBuf,
        #[source]
        err: serde_json::Error,
    },
    #[error("normalization failed")]
    NormalizeError {
        #[from]
        err: NormalizeError,
    },
    #[error("failed to create output file")]
    OutputCreateError {
        path: Utf8PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("failed to write results")]
    WriteResultsError {
        #[from]
        err: WriteResultsError,
    },
    #[error("test run failed")]
    TestRunFailed,
}

impl ExpectedError {
    pub(crate) fn input_read_error(
        kind: &'static str,
        path: impl Into<Utf8PathBuf>,
        err: io::Error,
    ) -> Self {
        Self::InputReadError {
            kind,
            path: path.into(),
            err,
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::ConfigParseError { .. }
            | Self::InputReadError { .. }
            | Self::AffectedFileParseError { .. } => ReportExitCode::SETUP_ERROR,
            Self::NormalizeError { err } => match err.kind() {
                NormalizeErrorKind::RunnerProducedNoOutput => {
                    ReportExitCode::RUNNER_PRODUCED_NO_OUTPUT
                }
                NormalizeErrorKind::MalformedOutput => ReportExitCode::MALFORMED_RUNNER_OUTPUT,
                NormalizeErrorKind::Environment => ReportExitCode::SETUP_ERROR,
                // NormalizeErrorKind is non-exhaustive.
                _ => ReportExitCode::SETUP_ERROR,
            },
            Self::OutputCreateError { .. } | Self::WriteResultsError { .. } => {
                ReportExitCode::WRITE_OUTPUT_ERROR
            }
            Self::TestRunFailed => ReportExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, output: &OutputContext) {
        let path_style = output.path_style();
        let mut next_error = match self {
            Self::CurrentDirFailed { err } => {
                tracing::error!("could not determine current directory");
                Some(err as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::InputReadError { kind, path, err } => {
                tracing::error!("failed to read {kind} at `{}`", path.style(path_style));
                Some(err as &dyn Error)
            }
            Self::AffectedFileParseError { path, err } => {
                tracing::error!(
                    "failed to parse affected tests file at `{}`",
                    path.style(path_style)
                );
                Some(err as &dyn Error)
            }
            Self::NormalizeError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::OutputCreateError { path, err } => {
                tracing::error!("failed to create output file `{}`", path.style(path_style));
                Some(err as &dyn Error)
            }
            Self::WriteResultsError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::TestRunFailed => {
                tracing::error!("test run failed");
                None
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: CONTINUATION_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
