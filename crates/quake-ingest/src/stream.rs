//! Lazy, one-time-use catalog stream over an on-disk event-set file.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use quake_core::catalog::{Catalog, Event};
use quake_core::errors::{ErrorInfo, QuakeError};
use serde::{Deserialize, Serialize};

/// On-disk layout of a stochastic event-set file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogSetFormat {
    /// One JSON array of events per line.
    JsonLines,
    /// Length-prefixed bincode frames, one event vector per frame.
    Binary,
}

impl CatalogSetFormat {
    /// Parses a format label as it appears in configuration files.
    pub fn parse(label: &str) -> Result<Self, QuakeError> {
        match label {
            "json-lines" => Ok(Self::JsonLines),
            "binary" => Ok(Self::Binary),
            other => Err(QuakeError::Stream(
                ErrorInfo::new("quake_ingest.unknown_format", "unknown catalog set format")
                    .with_context("format", other.to_string())
                    .with_hint("expected json-lines or binary"),
            )),
        }
    }
}

fn stream_error(code: &str, err: impl ToString, path: &Path) -> QuakeError {
    QuakeError::Stream(
        ErrorInfo::new(format!("quake_ingest.{code}"), err.to_string())
            .with_context("path", path.display().to_string()),
    )
}

/// Lazy iterator over the simulated catalogs of an event-set file.
///
/// Catalogs are decoded one at a time as the orchestrator pulls them; the
/// stream is one-time-use and fuses permanently after the first decode
/// error. Each produced catalog carries its ensemble index for progress
/// reporting.
pub struct CatalogStream {
    reader: BufReader<File>,
    format: CatalogSetFormat,
    name: String,
    path: std::path::PathBuf,
    next_index: usize,
    done: bool,
}

/// Opens the event-set file at `path` as a lazy catalog sequence.
///
/// `name` labels every produced catalog (typically the forecast name).
pub fn load_stochastic_event_sets(
    path: &Path,
    format: CatalogSetFormat,
    name: &str,
) -> Result<CatalogStream, QuakeError> {
    let file = File::open(path).map_err(|err| stream_error("open", err, path))?;
    Ok(CatalogStream {
        reader: BufReader::new(file),
        format,
        name: name.to_string(),
        path: path.to_path_buf(),
        next_index: 0,
        done: false,
    })
}

impl CatalogStream {
    fn next_json_lines(&mut self) -> Option<Result<Vec<Event>, QuakeError>> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|err| {
                        stream_error("decode_json", err, &self.path)
                    }));
                }
                Err(err) => return Some(Err(stream_error("read", err, &self.path))),
            }
        }
    }

    fn next_binary(&mut self) -> Option<Result<Vec<Event>, QuakeError>> {
        let mut prefix = [0u8; 4];
        match self.reader.read_exact(&mut prefix) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return None,
            Err(err) => return Some(Err(stream_error("read", err, &self.path))),
        }
        let frame_len = u32::from_le_bytes(prefix) as usize;
        let mut frame = vec![0u8; frame_len];
        if let Err(err) = self.reader.read_exact(&mut frame) {
            return Some(Err(stream_error("read_frame", err, &self.path)));
        }
        Some(bincode::deserialize(&frame).map_err(|err| {
            stream_error("decode_binary", err, &self.path)
        }))
    }
}

impl Iterator for CatalogStream {
    type Item = Result<Catalog, QuakeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let events = match self.format {
            CatalogSetFormat::JsonLines => self.next_json_lines(),
            CatalogSetFormat::Binary => self.next_binary(),
        };
        match events {
            Some(Ok(events)) => {
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok(Catalog::new(self.name.clone(), Some(index), events)))
            }
            Some(Err(err)) => {
                self.done = true;
                Some(Err(add_ensemble_index(err, self.next_index)))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

fn add_ensemble_index(err: QuakeError, index: usize) -> QuakeError {
    match err {
        QuakeError::Stream(info) => {
            QuakeError::Stream(info.with_context("ensemble_index", index.to_string()))
        }
        other => other,
    }
}

/// Writes an ensemble of event vectors in the requested format.
pub fn write_event_sets(
    path: &Path,
    format: CatalogSetFormat,
    event_sets: &[Vec<Event>],
) -> Result<(), QuakeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| stream_error("write_dir", err, path))?;
    }
    let file = File::create(path).map_err(|err| stream_error("create", err, path))?;
    let mut writer = std::io::BufWriter::new(file);
    for events in event_sets {
        match format {
            CatalogSetFormat::JsonLines => {
                let line = serde_json::to_string(events)
                    .map_err(|err| stream_error("encode_json", err, path))?;
                writeln!(writer, "{line}").map_err(|err| stream_error("write", err, path))?;
            }
            CatalogSetFormat::Binary => {
                let frame = bincode::serialize(events)
                    .map_err(|err| stream_error("encode_binary", err, path))?;
                let prefix = (frame.len() as u32).to_le_bytes();
                writer
                    .write_all(&prefix)
                    .and_then(|()| writer.write_all(&frame))
                    .map_err(|err| stream_error("write", err, path))?;
            }
        }
    }
    writer
        .flush()
        .map_err(|err| stream_error("flush", err, path))
}
