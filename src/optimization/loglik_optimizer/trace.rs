//! loglik_optimizer::trace — optional append-only log of evaluated points.
//!
//! Every cost evaluation can be mirrored into a [`TraceSink`] as a row of
//! `(flat parameters, objective)`, keyed by a caller-chosen table name. The
//! engine only ever appends; it never reads a sink back. Write failures are
//! logged and otherwise ignored, since tracing is a diagnostic side channel.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::types::Theta,
};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    io::Write,
    sync::{Arc, Mutex},
};

/// Append-only destination for optimization paths.
pub trait TraceSink {
    fn append(&mut self, name: &str, theta: &Theta, value: f64) -> OptResult<()>;
}

/// Shared handle to a sink; the mutex serializes appends from one run.
pub type SharedSink = Arc<Mutex<dyn TraceSink + Send>>;

/// Sink plus the table name a run writes under.
#[derive(Clone)]
pub struct TracePath {
    pub name: String,
    pub sink: SharedSink,
}

impl TracePath {
    pub fn new(name: impl Into<String>, sink: SharedSink) -> Self {
        Self { name: name.into(), sink }
    }

    /// Append one row, logging (not propagating) failures.
    pub fn record(&self, theta: &Theta, value: f64) {
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = sink.append(&self.name, theta, value) {
            log::warn!("trace '{}': {}", self.name, err);
        }
    }
}

impl fmt::Debug for TracePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracePath").field("name", &self.name).finish_non_exhaustive()
    }
}

/// In-memory sink: rows grouped by table name.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrace {
    tables: HashMap<String, Vec<(Theta, f64)>>,
}

impl MemoryTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, name: &str) -> &[(Theta, f64)] {
        self.tables.get(name).map_or(&[], |rows| rows.as_slice())
    }
}

impl TraceSink for MemoryTrace {
    fn append(&mut self, name: &str, theta: &Theta, value: f64) -> OptResult<()> {
        self.tables.entry(name.to_string()).or_default().push((theta.clone(), value));
        Ok(())
    }
}

/// Tab-separated sink over any writer.
///
/// The first row written for a name is preceded by a header
/// `name  p0 .. p{n-1}  ll`; every row starts with the table name.
#[derive(Debug)]
pub struct DelimitedTrace<W: Write> {
    writer: W,
    seen: HashSet<String>,
}

impl<W: Write> DelimitedTrace<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, seen: HashSet::new() }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for DelimitedTrace<W> {
    fn append(&mut self, name: &str, theta: &Theta, value: f64) -> OptResult<()> {
        let io_err = |e: std::io::Error| OptError::TraceWrite { text: e.to_string() };
        if self.seen.insert(name.to_string()) {
            let mut header = String::from("name");
            for i in 0..theta.len() {
                header.push_str(&format!("\tp{i}"));
            }
            writeln!(self.writer, "{header}\tll").map_err(io_err)?;
        }
        let mut row = name.to_string();
        for x in theta.iter() {
            row.push_str(&format!("\t{x}"));
        }
        writeln!(self.writer, "{row}\t{value}").map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The delimited sink writes one header per table and one row per append.
    //
    // Given
    // -----
    // - Two appends under "run" and one under "other".
    //
    // Expect
    // ------
    // - Header, two rows, header, one row, tab separated.
    fn delimited_trace_writes_header_once_per_name() {
        // Arrange
        let mut sink = DelimitedTrace::new(Vec::new());

        // Act
        sink.append("run", &array![1.0, 2.5], -3.0).unwrap();
        sink.append("run", &array![1.5, 2.0], -1.0).unwrap();
        sink.append("other", &array![0.0], 0.0).unwrap();

        // Assert
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name\tp0\tp1\tll");
        assert_eq!(lines[1], "run\t1\t2.5\t-3");
        assert_eq!(lines[2], "run\t1.5\t2\t-1");
        assert_eq!(lines[3], "name\tp0\tll");
        assert_eq!(lines[4], "other\t0\t0");
    }

    #[test]
    // Purpose
    // -------
    // `TracePath::record` routes rows into a shared in-memory sink.
    //
    // Given
    // -----
    // - A `MemoryTrace` behind an `Arc<Mutex<_>>`.
    //
    // Expect
    // ------
    // - The row is readable under the configured name only.
    fn trace_path_records_into_shared_memory_sink() {
        // Arrange
        let memory = Arc::new(Mutex::new(MemoryTrace::new()));
        let path = TracePath::new("fit", memory.clone());

        // Act
        path.record(&array![4.0], -9.0);

        // Assert
        let guard = memory.lock().unwrap();
        assert_eq!(guard.rows("fit"), &[(array![4.0], -9.0)]);
        assert!(guard.rows("missing").is_empty());
    }
}
