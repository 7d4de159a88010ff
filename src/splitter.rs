//! Line splitter for InterOp `dumptext` output.
//!
//! A dump is a run of sections, each opened by one or more `#` marker lines
//! followed by CSV content lines:
//!
//! ```text
//! # Version: v1.1.1
//! # Tile,2
//! Lane,Tile,code,value
//! 1,1101,100,2.5
//! # Error,3
//! Lane,Tile,Cycle,ErrorRate
//! ```
//!
//! Lines are buffered until a marker line follows content, at which point the
//! buffer is appended to the current target file (`TileMetricsOut.csv` above).
//! Marker lines carrying a `,` name the target for the next flush.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use regex::bytes::Regex;

use crate::error::{Result, SplitError};

pub const MARKER_PREFIX: u8 = b'#';
pub const SEPARATOR: u8 = b',';
pub const TARGET_SUFFIX: &str = "MetricsOut.csv";

/// One raw input line, terminator included.
pub type Line = Vec<u8>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Marker,
    Content,
}

pub fn classify(line: &[u8]) -> LineKind {
    if line.first() == Some(&MARKER_PREFIX) {
        LineKind::Marker
    } else {
        LineKind::Content
    }
}

/// Extracts the target file name from marker lines such as `# Tile,2`.
///
/// The name is everything between the prefix (plus one optional space) and
/// the first separator. Matching is byte-wise, so non-UTF-8 input never
/// fails here; the name itself is decoded lossily.
#[derive(Debug, Clone)]
pub struct MarkerPattern {
    re: Regex,
}

impl MarkerPattern {
    pub fn new() -> Result<Self> {
        let prefix = regex::escape(&char::from(MARKER_PREFIX).to_string());
        let sep = regex::escape(&char::from(SEPARATOR).to_string());
        let re = Regex::new(&format!(r"(?-u)^{prefix} ?([^{sep}]*){sep}"))?;
        Ok(MarkerPattern { re })
    }

    pub fn target_name(&self, line: &[u8]) -> Option<String> {
        let caps = self.re.captures(line)?;
        let name = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
        Some(format!("{}{}", String::from_utf8_lossy(name), TARGET_SUFFIX))
    }
}

/// Destination for flushed sections.
pub trait SectionSink {
    /// Append `lines`, byte for byte and in order, to the file named `target`.
    fn append(&mut self, target: &str, lines: &[Line]) -> Result<()>;
}

/// Appends each section to `<dir>/<target>`, creating the file if needed.
///
/// The file is opened per flush and closed when the write is done.
#[derive(Debug, Clone)]
pub struct AppendFileSink {
    dir: PathBuf,
}

impl AppendFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        AppendFileSink { dir: dir.into() }
    }
}

impl SectionSink for AppendFileSink {
    fn append(&mut self, target: &str, lines: &[Line]) -> Result<()> {
        let path = self.dir.join(target);
        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            for line in lines {
                file.write_all(line)?;
            }
            file.flush()
        };
        write().map_err(|source| SplitError::Write { path, source })
    }
}

impl<S: SectionSink + ?Sized> SectionSink for &mut S {
    fn append(&mut self, target: &str, lines: &[Line]) -> Result<()> {
        (**self).append(target, lines)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub lines_read: usize,
    pub sections_flushed: usize,
    pub lines_written: usize,
    /// Every target file appended to, in name order
    pub targets: BTreeSet<String>,
}

/// Splitter state: the pending buffer, the current target and whether any
/// content line arrived since the last flush.
pub struct Splitter<S> {
    pattern: MarkerPattern,
    sink: S,
    buffer: Vec<Line>,
    target: Option<String>,
    in_content: bool,
    report: SplitReport,
}

impl<S: SectionSink> Splitter<S> {
    pub fn new(sink: S) -> Result<Self> {
        Ok(Splitter {
            pattern: MarkerPattern::new()?,
            sink,
            buffer: Vec::new(),
            target: None,
            in_content: false,
            report: SplitReport::default(),
        })
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Feed one raw line, terminator included.
    pub fn push_line(&mut self, line: Line) -> Result<()> {
        self.report.lines_read += 1;
        match classify(&line) {
            LineKind::Marker => {
                if self.in_content {
                    self.flush()?;
                    self.in_content = false;
                }
                // A marker without a separator keeps the previous target.
                if let Some(target) = self.pattern.target_name(&line) {
                    tracing::trace!(file = %target, line = self.report.lines_read, "target changed");
                    self.target = Some(target);
                }
            }
            LineKind::Content => self.in_content = true,
        }
        self.buffer.push(line);
        Ok(())
    }

    /// Flush whatever is left, even an empty buffer, and return the report.
    pub fn finish(mut self) -> Result<SplitReport> {
        self.flush()?;
        Ok(self.report)
    }

    fn flush(&mut self) -> Result<()> {
        let target = self.target.as_deref().ok_or_else(|| SplitError::UndefinedTarget {
            line: self.report.lines_read,
        })?;
        tracing::debug!(file = target, lines = self.buffer.len(), "flushing section");
        self.sink.append(target, &self.buffer)?;

        self.report.sections_flushed += 1;
        self.report.lines_written += self.buffer.len();
        if !self.report.targets.contains(target) {
            self.report.targets.insert(target.to_owned());
        }
        self.buffer.clear();
        Ok(())
    }
}

/// Run `reader` through a fresh splitter until end of input.
pub fn split<R: BufRead, S: SectionSink>(mut reader: R, sink: S) -> Result<SplitReport> {
    let mut splitter = Splitter::new(sink)?;
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line).map_err(SplitError::Read)? == 0 {
            break;
        }
        splitter.push_line(line)?;
    }
    let report = splitter.finish()?;
    tracing::info!(
        lines = report.lines_read,
        sections = report.sections_flushed,
        files = report.targets.len(),
        "split complete"
    );
    Ok(report)
}
