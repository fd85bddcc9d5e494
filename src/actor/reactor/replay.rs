//! Event recording and replay.
//!
//! Events are serialized one JSON object per line, so a recording is also a
//! valid stdin stream for the binary: `drift --record session.jsonl` during
//! a live run, `drift --replay session.jsonl` to reproduce it later.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::actor::reactor::Event;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("could not open recording: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad event on line {line}: {source}")]
    Decode {
        line: usize,
        source: serde_json::Error,
    },
}

/// Tees every incoming event to a file, one JSON object per line.
pub struct Record {
    writer: Option<BufWriter<File>>,
}

impl Record {
    pub fn new(path: Option<&Path>) -> std::io::Result<Record> {
        let writer = match path {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        Ok(Record { writer })
    }

    pub fn disabled() -> Record {
        Record { writer: None }
    }

    pub fn on_event(&mut self, event: &Event) {
        let Some(writer) = &mut self.writer else {
            return;
        };
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "could not serialize event for recording");
                return;
            }
        };
        if writeln!(writer, "{line}").and_then(|_| writer.flush()).is_err() {
            warn!("recording write failed, disabling recorder");
            self.writer = None;
        }
    }
}

/// Load a recorded event stream. Blank lines are skipped; a malformed line
/// is an error, since replaying half a session gives misleading results.
pub fn replay(path: &Path) -> Result<Vec<Event>, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| ReplayError::Decode {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}
