// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output for the test-report normalizer.
//!
//! The types in this crate describe the JSON emitted by `normalize-report --message-format
//! json`, and can be used to parse it back. They are kept in a separate crate with minimal
//! dependencies so that consumers don't need to pull in the normalizer itself.

mod exit_codes;
mod report;

pub use exit_codes::*;
pub use report::*;
