//! Split an InterOp `dumptext` listing into one CSV file per metric section.

pub mod error;
pub mod logging;
pub mod splitter;

pub use error::{Result, SplitError};
pub use splitter::{split, AppendFileSink, LineKind, SectionSink, SplitReport, Splitter};
