// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for normalizing test runner output.
//!
//! The test runner writes two independently malformed artifacts: a JSON event stream made of
//! concatenated objects, and a Clover XML coverage report. This crate turns them into a list of
//! [`TestResult`](assembler::TestResult)s:
//!
//! 1. [`ReportDecoder`](decoder::ReportDecoder) repairs and decodes the event stream.
//! 2. [`CoverageSynthesizer`](clover_coverage::CoverageSynthesizer) turns the coverage report
//!    into dense per-line coverage strings for the affected source files.
//! 3. [`ResultAssembler`](assembler::ResultAssembler) classifies each test event and attaches the
//!    shared coverage.
//!
//! [`normalize`](pipeline::normalize) runs all three for one runner invocation.

pub mod assembler;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod junit;
pub mod pipeline;
