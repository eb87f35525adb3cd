use std::{
    fs::File,
    io::{BufRead, BufWriter, Write},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::{render::DrawCommand, Frame, Result};

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub output_path: PathBuf,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("frames.jsonl"),
        }
    }
}

/// Draw calls issued during one host frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: Frame,
    pub effective: Frame,
    pub commands: Vec<DrawCommand>,
}

/// Writes rendered frames as JSON lines, one [`FrameRecord`] per line.
#[derive(Debug)]
pub struct Recorder<W: Write> {
    writer: W,
    frames_written: u64,
}

impl Recorder<BufWriter<File>> {
    /// Opens (and truncates) the file named in `settings`.
    pub fn create(settings: RecordingSettings) -> Result<Self> {
        let file = File::create(&settings.output_path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> Recorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    pub fn record(&mut self, record: &FrameRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flushes pending output and hands the writer back.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        tracing::debug!(frames = self.frames_written, "recording finished");
        Ok(self.writer)
    }
}

/// Parses a JSON-lines recording back into frames. Blank lines are skipped.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<FrameRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
