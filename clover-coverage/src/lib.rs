// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Synthesize dense, per-line coverage maps from Clover XML reports.
//!
//! Clover reports only list the lines a coverage tool chose to instrument. This crate
//! cross-references those entries against the real line count of each source file and produces
//! one marker per physical line (see [`LineCoverage`]), so that consumers can index coverage by
//! line number without gaps.

mod coverage;
mod errors;
mod synthesize;

pub use coverage::*;
pub use errors::*;
pub use synthesize::*;
