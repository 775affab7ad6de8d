// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Color selection and diagnostics on stderr.
//!
//! Results go to stdout (or `--output`). Everything else, including errors, is logged through
//! `tracing` and printed to stderr as `level: message`.

use clap::{Args, ValueEnum};
use owo_colors::{OwoColorize, Style, style};
use std::{fmt, io};
use supports_color::Stream;
use tracing::{Event, Level, Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    Layer,
    filter::{ParseError, Targets},
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Overrides log levels, in `tracing_subscriber` `Targets` syntax (e.g. `debug` or
/// `clover_coverage=trace`).
pub(crate) const LOG_ENV: &str = "REPORT_NORMALIZER_LOG";

/// Events logged with this target continue the previous message, so they get no level prefix.
pub(crate) const CONTINUATION_TARGET: &str = "normalize_report::continuation";

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Log debug messages, including skipped events and ignored coverage lines
    #[arg(long, short, global = true, env = "REPORT_NORMALIZER_VERBOSE")]
    pub(crate) verbose: bool,

    /// When to color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        global = true,
        value_name = "WHEN",
        env = "REPORT_NORMALIZER_COLOR"
    )]
    pub(crate) color: ColorChoice,
}

impl OutputOpts {
    /// Installs the stderr logger. Only the first call in a process has an effect.
    pub(crate) fn init(self) -> OutputContext {
        let colorize_stderr = self.color.should_colorize(Stream::Stderr);

        let env_value = std::env::var(LOG_ENV).ok();
        let (targets, invalid) = log_targets(self.verbose, env_value.as_deref());
        let layer = tracing_subscriber::fmt::layer()
            .event_format(LogFormatter {
                colorize: colorize_stderr,
            })
            .with_writer(io::stderr)
            .with_filter(targets);

        let installed = tracing_subscriber::registry().with(layer).try_init().is_ok();
        if let (true, Some(error)) = (installed, invalid) {
            tracing::warn!(
                "ignoring invalid {LOG_ENV} value `{}`: {error}",
                env_value.unwrap_or_default()
            );
        }

        OutputContext { colorize_stderr }
    }
}

/// Output settings resolved at startup.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    colorize_stderr: bool,
}

impl OutputContext {
    /// The style for paths quoted in error messages.
    pub fn path_style(&self) -> Style {
        if self.colorize_stderr {
            style().bold()
        } else {
            Style::new()
        }
    }
}

/// When to color output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum ColorChoice {
    /// Color if the stream is a terminal that supports it.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

impl ColorChoice {
    pub(crate) fn should_colorize(self, stream: Stream) -> bool {
        match self {
            ColorChoice::Auto => supports_color::on_cached(stream).is_some(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Picks log filters: `env_value` if it is set and valid, otherwise INFO (DEBUG if verbose).
///
/// Also returns the parse error for an invalid `env_value`, so it can be reported once logging
/// is up.
fn log_targets(verbose: bool, env_value: Option<&str>) -> (Targets, Option<ParseError>) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let default_targets = Targets::new().with_default(default_level);

    match env_value.filter(|value| !value.is_empty()) {
        None => (default_targets, None),
        Some(value) => match value.parse::<Targets>() {
            Ok(targets) => (targets, None),
            Err(error) => (default_targets, Some(error)),
        },
    }
}

struct LogFormatter {
    colorize: bool,
}

impl LogFormatter {
    fn prefix(&self, level: Level) -> (&'static str, Style) {
        let (label, color) = match level {
            Level::ERROR => ("error", style().red().bold()),
            Level::WARN => ("warning", style().yellow().bold()),
            Level::INFO => ("info", style().bold()),
            Level::DEBUG => ("debug", style().bold()),
            Level::TRACE => ("trace", style().dimmed()),
        };
        (label, if self.colorize { color } else { Style::new() })
    }
}

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if metadata.target() != CONTINUATION_TARGET {
            let (label, label_style) = self.prefix(*metadata.level());
            write!(writer, "{}: ", label.style(label_style))?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(false, None, LevelFilter::INFO, false ; "default")]
    #[test_case(true, None, LevelFilter::DEBUG, false ; "verbose")]
    #[test_case(false, Some(""), LevelFilter::INFO, false ; "empty env")]
    #[test_case(false, Some("trace"), LevelFilter::TRACE, false ; "env level")]
    #[test_case(true, Some("warn"), LevelFilter::WARN, false ; "env overrides verbose")]
    #[test_case(true, Some("foo=notalevel"), LevelFilter::DEBUG, true ; "invalid env")]
    fn targets_from_env(
        verbose: bool,
        env_value: Option<&str>,
        expected: LevelFilter,
        expect_error: bool,
    ) {
        let (targets, error) = log_targets(verbose, env_value);
        assert_eq!(targets.default_level(), Some(expected));
        assert_eq!(error.is_some(), expect_error);
    }

    #[test]
    fn prefix_styles() {
        let plain = LogFormatter { colorize: false };
        assert_eq!(plain.prefix(Level::WARN), ("warning", Style::new()));

        let colored = LogFormatter { colorize: true };
        let (label, label_style) = colored.prefix(Level::ERROR);
        assert_eq!(label, "error");
        assert_eq!(label_style, style().red().bold());
    }

    #[test]
    fn path_style_follows_color() {
        let plain = OutputContext {
            colorize_stderr: false,
        };
        assert_eq!(plain.path_style(), Style::new());
        let colored = OutputContext {
            colorize_stderr: true,
        };
        assert_eq!(colored.path_style(), style().bold());
    }
}
