// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `normalize-report` failures.
///
/// Normalization may fail for a variety of reasons. This structure documents the exit codes that
/// may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ReportExitCode {}

impl ReportExitCode {
    /// No errors occurred, and every test passed or was skipped.
    pub const OK: i32 = 0;

    /// Normalization succeeded, but one or more tests failed or were broken.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// The test runner produced an empty report or coverage file.
    ///
    /// This usually means that the runner crashed before it could write anything. Re-running the
    /// runner by hand is the best way to find out why.
    pub const RUNNER_PRODUCED_NO_OUTPUT: i32 = 105;

    /// The report or coverage file was not in the expected format.
    pub const MALFORMED_RUNNER_OUTPUT: i32 = 106;

    /// Writing output to stdout or to a file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up the invocation, e.g. an input file could not be
    /// read or the config file is invalid.
    pub const SETUP_ERROR: i32 = 96;
}
