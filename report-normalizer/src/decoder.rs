// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of the test runner's JSON event stream.
//!
//! The runner writes one JSON object per event, back to back, with no separators and no
//! enclosing array:
//!
//! ```text
//! {"event":"suiteStart","suite":"FooTest","tests":1}{"event":"test","test":"FooTest::testBar",...}
//! ```
//!
//! [`ReportDecoder`] repairs the stream into a JSON array and decodes it into [`TestEvent`]s.

use crate::errors::DecodeError;
use regex::Regex;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use std::{fmt, sync::LazyLock, time::Duration};
use tracing::{debug, warn};

/// The boundary between two objects: a closing brace followed by an opening brace and a quoted
/// key, with optional whitespace in between.
static OBJECT_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\}\s*\{\s*""#).expect("object boundary regex is valid"));

/// The kind of an event in the stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A test finished.
    Test,

    /// A suite started.
    Suite,

    /// Any other event, e.g. `testStart`.
    Other,
}

impl EventKind {
    fn from_event(event: &str) -> Self {
        match event {
            "test" => EventKind::Test,
            "suiteStart" | "suite" => EventKind::Suite,
            _ => EventKind::Other,
        }
    }
}

/// The status of a finished test, as reported by the runner.
///
/// `Error` is overloaded by the runner: it covers tests that errored out as well as tests that
/// were skipped or are incomplete. Telling these apart is up to the
/// [`ResultAssembler`](crate::assembler::ResultAssembler).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EventStatus {
    /// The test passed, or reported no status.
    #[default]
    Pass,

    /// An assertion failed.
    Fail,

    /// The test errored, was skipped, or is incomplete.
    Error,
}

impl EventStatus {
    fn from_status(status: Option<&str>) -> Self {
        match status {
            None | Some("pass") => EventStatus::Pass,
            Some("fail") => EventStatus::Fail,
            Some("error") => EventStatus::Error,
            Some(other) => {
                debug!("treating unknown test status `{other}` as a pass");
                EventStatus::Pass
            }
        }
    }
}

/// A single frame of a failure trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceFrame {
    /// The source file.
    pub file: String,

    /// The line within `file`.
    pub line: u64,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One decoded event from the stream.
#[derive(Clone, Debug, PartialEq)]
pub struct TestEvent {
    /// The kind of event.
    pub kind: EventKind,

    /// The raw test name, e.g. `FooTest::testBar (data set #0)`. Empty for events that don't
    /// name a test.
    pub test: String,

    /// The suite the event belongs to, if reported.
    pub suite: Option<String>,

    /// The status of the test.
    pub status: EventStatus,

    /// The message reported with the status. Empty for passing tests.
    pub message: String,

    /// The failure trace. Empty unless the test failed or errored.
    pub trace: Vec<TraceFrame>,

    /// The time taken.
    pub time: Duration,
}

/// Decodes a test runner's concatenated JSON event stream.
///
/// The decoder holds no state, so a single instance can be shared across threads and used for
/// any number of streams.
#[derive(Copy, Clone, Debug, Default)]
pub struct ReportDecoder;

impl ReportDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decodes `raw`, returning the `test` events in stream order.
    ///
    /// Events of other kinds are skipped.
    pub fn decode(&self, raw: &str) -> Result<Vec<TestEvent>, DecodeError> {
        let mut events = self.decode_all(raw)?;
        let total = events.len();
        events.retain(|event| event.kind == EventKind::Test);
        debug!(
            "decoded {} test events, skipped {} other events",
            events.len(),
            total - events.len()
        );
        Ok(events)
    }

    /// Decodes `raw`, returning every event in stream order.
    ///
    /// Objects whose `event` field can't be read (e.g. a number in its place) are skipped with a
    /// warning. Any other field with an unexpected value is treated as absent, so a `test` event
    /// always produces a [`TestEvent`].
    pub fn decode_all(&self, raw: &str) -> Result<Vec<TestEvent>, DecodeError> {
        if raw.trim().is_empty() {
            return Err(DecodeError::EmptyReport);
        }

        let repaired = repair(raw);
        let values: Vec<serde_json::Value> = serde_json::from_str(&repaired)
            .map_err(|error| DecodeError::MalformedReport { error })?;

        let mut events = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<RawEvent>(value) {
                Ok(raw_event) => events.push(raw_event.into_event()),
                Err(error) => {
                    warn!("skipping undecodable event at index {index}: {error}");
                }
            }
        }

        Ok(events)
    }
}

/// Inserts commas between back-to-back objects and wraps the result in an array.
fn repair(raw: &str) -> String {
    let joined = OBJECT_BOUNDARY.replace_all(raw, "},{\"");
    let mut repaired = String::with_capacity(joined.len() + 2);
    repaired.push('[');
    repaired.push_str(&joined);
    repaired.push(']');
    repaired
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    event: String,
    #[serde(default, deserialize_with = "lenient")]
    test: String,
    #[serde(default, deserialize_with = "lenient")]
    suite: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_trace")]
    trace: Vec<RawTraceFrame>,
    #[serde(default, deserialize_with = "lenient")]
    time: Option<NumberOrString>,
}

#[derive(Debug, Deserialize)]
struct RawTraceFrame {
    #[serde(default, deserialize_with = "lenient")]
    file: String,
    #[serde(default, deserialize_with = "lenient")]
    line: Option<NumberOrString>,
}

/// A number the runner may have written as a JSON string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn to_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(n) => Some(*n),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }

    fn to_u64(&self) -> Option<u64> {
        match self {
            NumberOrString::Number(n) if n.fract() == 0.0 && *n >= 0.0 => Some(*n as u64),
            NumberOrString::Number(_) => None,
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

/// Deserializes a field, falling back to its default if the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|error| {
        debug!("ignoring unexpected field value: {error}");
        T::default()
    }))
}

/// Deserializes a trace, dropping frames that aren't objects.
fn lenient_trace<'de, D>(deserializer: D) -> Result<Vec<RawTraceFrame>, D::Error>
where
    D: Deserializer<'de>,
{
    let frames: Vec<serde_json::Value> = lenient(deserializer)?;
    Ok(frames
        .into_iter()
        .filter_map(|frame| match serde_json::from_value(frame) {
            Ok(frame) => Some(frame),
            Err(error) => {
                debug!("ignoring unexpected trace frame: {error}");
                None
            }
        })
        .collect())
}

impl RawEvent {
    fn into_event(self) -> TestEvent {
        let time = match self.time.as_ref().map(|time| (time, time.to_f64())) {
            None => Duration::ZERO,
            Some((_, Some(secs))) => Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
                warn!("test `{}` reported invalid time {secs}, using 0", self.test);
                Duration::ZERO
            }),
            Some((raw, None)) => {
                warn!("test `{}` reported invalid time {raw:?}, using 0", self.test);
                Duration::ZERO
            }
        };

        TestEvent {
            kind: EventKind::from_event(&self.event),
            status: EventStatus::from_status(self.status.as_deref()),
            test: self.test,
            suite: self.suite,
            message: self.message.unwrap_or_default(),
            trace: self
                .trace
                .into_iter()
                .map(|frame| TraceFrame {
                    line: frame.line.as_ref().and_then(NumberOrString::to_u64).unwrap_or(0),
                    file: frame.file,
                })
                .collect(),
            time,
        }
    }
}
