// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use std::{io, num::ParseIntError};
use thiserror::Error;

/// An error that occurs while synthesizing a [`CoverageMap`](crate::CoverageMap).
///
/// Returned by [`CoverageSynthesizer::synthesize`](crate::CoverageSynthesizer::synthesize).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SynthesizeError {
    /// The coverage report was empty or contained only whitespace.
    ///
    /// This almost always means that the test runner crashed before writing any output.
    #[error(
        "Clover coverage report is empty: the test runner probably failed to run tests \
         (try running the test runner command directly to see its output)"
    )]
    EmptyCoverage,

    /// The coverage report could not be parsed.
    #[error(transparent)]
    Parse(#[from] CoverageParseError),

    /// The line count of a source file could not be determined.
    #[error("failed to determine line count for `{path}`")]
    LineCount {
        /// The source file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurs while parsing a Clover XML document.
#[derive(Debug, Error)]
#[error("failed to parse Clover coverage report at byte {position}")]
pub struct CoverageParseError {
    position: usize,
    #[source]
    kind: CoverageParseErrorKind,
}

impl CoverageParseError {
    pub(crate) fn new(position: usize, kind: CoverageParseErrorKind) -> Self {
        Self { position, kind }
    }

    /// Returns the byte offset into the document at which the error was detected.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &CoverageParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a Clover XML document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoverageParseErrorKind {
    /// The document is not well-formed XML.
    #[error("invalid XML")]
    Xml(#[from] quick_xml::Error),

    /// An attribute on an element is malformed.
    #[error("malformed attribute")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// The document ended before all elements were closed, or contained no elements at all.
    #[error("document ended unexpectedly ({open_elements} unclosed elements)")]
    IncompleteDocument {
        /// The number of elements still open at the end of the document.
        open_elements: usize,
    },

    /// A required attribute was missing.
    #[error("<{element}> element is missing the `{attribute}` attribute")]
    MissingAttribute {
        /// The element name.
        element: &'static str,

        /// The attribute name.
        attribute: &'static str,
    },

    /// An attribute that must be an integer was not.
    #[error("<{element}> attribute `{attribute}` has non-integer value `{value}`")]
    InvalidInteger {
        /// The element name.
        element: &'static str,

        /// The attribute name.
        attribute: &'static str,

        /// The value that failed to parse.
        value: String,

        /// The underlying error.
        #[source]
        error: ParseIntError,
    },

    /// A `<line>` element refers to a line past the end of the source file.
    ///
    /// This usually means that the report is stale, i.e. the source file changed after coverage
    /// was collected.
    #[error("line {num} in `{path}` is out of range (file has {line_count} lines)")]
    LineOutOfRange {
        /// The source file, as named in the report.
        path: Utf8PathBuf,

        /// The line number reported.
        num: usize,

        /// The actual number of lines in the source file.
        line_count: usize,
    },
}

/// An error returned while parsing a [`FileCoverage`](crate::FileCoverage) from a string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid coverage marker `{marker}` at line {line} (expected one of C, U, N)")]
pub struct InvalidMarkerError {
    marker: char,
    line: usize,
}

impl InvalidMarkerError {
    pub(crate) fn new(marker: char, line: usize) -> Self {
        Self { marker, line }
    }
}
