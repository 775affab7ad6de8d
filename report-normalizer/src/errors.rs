// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the report normalizer.

use camino::{Utf8Path, Utf8PathBuf};
use clover_coverage::SynthesizeError;
use config::ConfigError;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse report normalizer config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurs while decoding a raw test-runner event stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The report was empty or contained only whitespace.
    ///
    /// This almost always means that the test runner crashed before writing any output.
    #[error(
        "JSON report is empty: the test runner probably failed to run tests \
         (try running the test runner command directly to see its output)"
    )]
    EmptyReport,

    /// The report could not be parsed as a sequence of JSON objects, even after repair.
    #[error("JSON report could not be decoded")]
    MalformedReport {
        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurs while normalizing the output of one test-runner invocation.
///
/// Returned by [`normalize`](crate::pipeline::normalize).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NormalizeError {
    /// The event stream could not be decoded.
    #[error("error decoding test report")]
    Decode(#[from] DecodeError),

    /// Coverage could not be synthesized.
    #[error("error reading coverage report")]
    Coverage(#[from] SynthesizeError),
}

impl NormalizeError {
    /// Classifies this error, so that callers can decide whether to re-run the test runner.
    pub fn kind(&self) -> NormalizeErrorKind {
        match self {
            Self::Decode(DecodeError::EmptyReport)
            | Self::Coverage(SynthesizeError::EmptyCoverage) => {
                NormalizeErrorKind::RunnerProducedNoOutput
            }
            Self::Decode(DecodeError::MalformedReport { .. })
            | Self::Coverage(SynthesizeError::Parse(_)) => NormalizeErrorKind::MalformedOutput,
            Self::Coverage(_) => NormalizeErrorKind::Environment,
        }
    }
}

/// A broad classification of a [`NormalizeError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizeErrorKind {
    /// The test runner wrote nothing, which usually means it crashed. Re-running it directly is the
    /// best way to diagnose the problem.
    RunnerProducedNoOutput,

    /// The test runner wrote output, but it wasn't in the expected format.
    MalformedOutput,

    /// Something in the environment, such as a source file, could not be read.
    Environment,
}

/// An error that occurs while writing normalized results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteResultsError {
    /// An error occurred while writing to the provided output.
    #[error("error writing to output")]
    Io(#[from] std::io::Error),

    /// An error occurred while serializing JSON.
    #[error("error serializing results as JSON")]
    Json(#[from] serde_json::Error),

    /// An error occurred while producing JUnit XML.
    #[error("error serializing results as JUnit XML")]
    Junit(#[from] quick_junit::SerializeError),
}
