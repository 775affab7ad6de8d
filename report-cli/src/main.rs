// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use report_cli::NormalizeReportApp;
use std::io::{self, BufWriter};

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    let app = NormalizeReportApp::parse();
    let output = app.init_output();

    let mut stdout = BufWriter::new(io::stdout().lock());
    match app.exec(&mut stdout) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output);
            std::process::exit(error.process_exit_code())
        }
    }
}
