// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthesize a [`CoverageMap`] from a Clover report.

use crate::{
    coverage::{CoverageMap, FileCoverage, LineCoverage},
    errors::{CoverageParseError, CoverageParseErrorKind, SynthesizeError},
};
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{collections::BTreeSet, io};
use tracing::debug;

static FILE_TAG: &[u8] = b"file";
static LINE_TAG: &[u8] = b"line";

static STATEMENT_TYPE: &str = "stmt";

/// Provides the physical line count of a source file.
///
/// Implemented for closures of the form `Fn(&Utf8Path) -> io::Result<usize>`, which is
/// convenient for tests.
pub trait LineCounter {
    /// Returns the number of lines in the file at `path`.
    fn line_count(&self, path: &Utf8Path) -> io::Result<usize>;
}

impl<F> LineCounter for F
where
    F: Fn(&Utf8Path) -> io::Result<usize>,
{
    fn line_count(&self, path: &Utf8Path) -> io::Result<usize> {
        self(path)
    }
}

/// Builds [`CoverageMap`]s out of Clover XML reports.
///
/// Only `<file>` elements whose `name` is one of the files of interest are considered; all
/// others are skipped without looking at their lines.
#[derive(Debug)]
pub struct CoverageSynthesizer<'a, L> {
    project_root: &'a Utf8Path,
    files_of_interest: BTreeSet<&'a Utf8Path>,
    line_counter: L,
}

impl<'a, L: LineCounter> CoverageSynthesizer<'a, L> {
    /// Creates a new synthesizer.
    ///
    /// Paths in the output map are made relative to `project_root`.
    pub fn new(
        project_root: &'a Utf8Path,
        files_of_interest: impl IntoIterator<Item = &'a Utf8Path>,
        line_counter: L,
    ) -> Self {
        Self {
            project_root,
            files_of_interest: files_of_interest.into_iter().collect(),
            line_counter,
        }
    }

    /// Parses `raw` as a Clover XML document and synthesizes coverage for every file of interest
    /// it mentions.
    pub fn synthesize(&self, raw: &str) -> Result<CoverageMap, SynthesizeError> {
        if raw.trim().is_empty() {
            return Err(SynthesizeError::EmptyCoverage);
        }

        let mut reader = Reader::from_str(raw);
        reader.trim_text(true);

        let mut map = CoverageMap::new();
        let mut current: Option<CurrentFile> = None;
        let mut depth = 0_usize;
        let mut saw_element = false;

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|error| CoverageParseError::new(position, error.into()))?;
            let err_at = |kind: CoverageParseErrorKind| CoverageParseError::new(position, kind);

            match event {
                Event::Start(tag) => {
                    depth += 1;
                    saw_element = true;
                    match tag.name().as_ref() {
                        name if name == FILE_TAG => {
                            current = Some(self.start_file(&tag).map_err(|e| e.at(position))?);
                        }
                        name if name == LINE_TAG => {
                            Self::push_line(current.as_mut(), &tag).map_err(err_at)?;
                        }
                        _ => {}
                    }
                }
                Event::Empty(tag) => {
                    saw_element = true;
                    match tag.name().as_ref() {
                        name if name == FILE_TAG => {
                            // A self-closing <file/> has no lines.
                            let file = self.start_file(&tag).map_err(|e| e.at(position))?;
                            self.finish_file(file, &mut map);
                        }
                        name if name == LINE_TAG => {
                            Self::push_line(current.as_mut(), &tag).map_err(err_at)?;
                        }
                        _ => {}
                    }
                }
                Event::End(tag) => {
                    depth = depth.saturating_sub(1);
                    if tag.name().as_ref() == FILE_TAG {
                        if let Some(file) = current.take() {
                            self.finish_file(file, &mut map);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if depth != 0 || !saw_element {
            return Err(CoverageParseError::new(
                reader.buffer_position(),
                CoverageParseErrorKind::IncompleteDocument {
                    open_elements: depth,
                },
            )
            .into());
        }

        Ok(map)
    }

    fn start_file(&self, tag: &BytesStart<'_>) -> Result<CurrentFile, StartFileError> {
        let name = required_attribute(tag, "file", "name")?;
        let path = Utf8PathBuf::from(name);
        if !self.files_of_interest.contains(path.as_path()) {
            return Ok(CurrentFile::Skipped);
        }

        let line_count =
            self.line_counter
                .line_count(&path)
                .map_err(|error| SynthesizeError::LineCount {
                    path: path.clone(),
                    error,
                })?;
        Ok(CurrentFile::Interesting(FileBuilder::new(path, line_count)))
    }

    fn push_line(
        current: Option<&mut CurrentFile>,
        tag: &BytesStart<'_>,
    ) -> Result<(), CoverageParseErrorKind> {
        match current {
            Some(CurrentFile::Interesting(builder)) => builder.push(LineEntry::parse(tag)?),
            // Lines outside a file, or within a file that isn't of interest.
            Some(CurrentFile::Skipped) | None => Ok(()),
        }
    }

    fn finish_file(&self, file: CurrentFile, map: &mut CoverageMap) {
        if let CurrentFile::Interesting(builder) = file {
            let key = self.relative_key(&builder.path);
            map.insert(key, builder.finish());
        }
    }

    fn relative_key(&self, path: &Utf8Path) -> Utf8PathBuf {
        match path.strip_prefix(self.project_root) {
            Ok(relative) => relative.to_owned(),
            Err(_) => {
                debug!("coverage path `{path}` is outside project root, keeping it as-is");
                path.to_owned()
            }
        }
    }
}

enum StartFileError {
    Parse(CoverageParseErrorKind),
    Synthesize(SynthesizeError),
}

impl StartFileError {
    fn at(self, position: usize) -> SynthesizeError {
        match self {
            StartFileError::Parse(kind) => CoverageParseError::new(position, kind).into(),
            StartFileError::Synthesize(error) => error,
        }
    }
}

impl From<CoverageParseErrorKind> for StartFileError {
    fn from(kind: CoverageParseErrorKind) -> Self {
        StartFileError::Parse(kind)
    }
}

impl From<SynthesizeError> for StartFileError {
    fn from(error: SynthesizeError) -> Self {
        StartFileError::Synthesize(error)
    }
}

enum CurrentFile {
    Interesting(FileBuilder),
    Skipped,
}

/// Accumulates markers for one file, filling gaps between reported lines.
struct FileBuilder {
    path: Utf8PathBuf,
    line_count: usize,
    coverage: FileCoverage,
    // The next line that needs a marker.
    pos: usize,
}

impl FileBuilder {
    fn new(path: Utf8PathBuf, line_count: usize) -> Self {
        Self {
            path,
            line_count,
            coverage: FileCoverage::default(),
            pos: 1,
        }
    }

    fn push(&mut self, entry: LineEntry) -> Result<(), CoverageParseErrorKind> {
        if entry.num < self.pos {
            debug!(
                "ignoring duplicate or out-of-order coverage entry for line {} in `{}`",
                entry.num, self.path,
            );
            return Ok(());
        }
        if entry.num > self.line_count {
            return Err(CoverageParseErrorKind::LineOutOfRange {
                path: self.path.clone(),
                num: entry.num,
                line_count: self.line_count,
            });
        }

        for _ in self.pos..entry.num {
            self.coverage.push(LineCoverage::NotApplicable);
        }
        self.coverage.push(entry.status);
        self.pos = entry.num + 1;
        Ok(())
    }

    fn finish(mut self) -> FileCoverage {
        for _ in self.pos..=self.line_count {
            self.coverage.push(LineCoverage::NotApplicable);
        }
        self.coverage
    }
}

struct LineEntry {
    num: usize,
    status: LineCoverage,
}

impl LineEntry {
    fn parse(tag: &BytesStart<'_>) -> Result<Self, CoverageParseErrorKind> {
        let num = required_attribute(tag, "line", "num")?;
        let num = parse_integer::<usize>("num", num)?;

        let is_statement = attribute(tag, "type")?.as_deref() == Some(STATEMENT_TYPE);
        let status = if is_statement {
            let count = match attribute(tag, "count")? {
                Some(count) => parse_integer::<i64>("count", count)?,
                None => 0,
            };
            if count > 0 {
                LineCoverage::Covered
            } else {
                LineCoverage::Uncovered
            }
        } else {
            LineCoverage::NotApplicable
        };

        Ok(Self { num, status })
    }
}

fn parse_integer<T>(attribute: &'static str, value: String) -> Result<T, CoverageParseErrorKind>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    value
        .trim()
        .parse()
        .map_err(|error| CoverageParseErrorKind::InvalidInteger {
            element: "line",
            attribute,
            value,
            error,
        })
}

fn required_attribute(
    tag: &BytesStart<'_>,
    element: &'static str,
    name: &'static str,
) -> Result<String, CoverageParseErrorKind> {
    attribute(tag, name)?.ok_or(CoverageParseErrorKind::MissingAttribute {
        element,
        attribute: name,
    })
}

fn attribute(tag: &BytesStart<'_>, name: &str) -> Result<Option<String>, CoverageParseErrorKind> {
    for attr in tag.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
