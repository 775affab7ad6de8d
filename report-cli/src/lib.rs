// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalizes the output of a test runner into structured results.
//!
//! `normalize-report` reads a runner's JSON event stream and, optionally, its Clover coverage
//! report, and writes the results as human-readable text, JSON, or JUnit XML. The exit code is
//! one of the codes documented in [`report_metadata::ReportExitCode`].

#![warn(missing_docs)]

mod dispatch;
mod displayer;
mod errors;
mod line_count;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputContext;
