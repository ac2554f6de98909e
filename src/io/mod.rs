//! Input/Output operations module.
//!
//! Handles the read files coming in and the small files the pipeline
//! writes next to its outputs.

pub mod fastq; // Sub-module specifically for FASTQ handling

pub use fastq::{count_reads, ReadSet};

use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::Result;

/// Write `value` as pretty JSON to `path`, replacing any previous file only
/// once the new content is fully on disk.
pub fn write_json_atomic<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value).map_err(std::io::Error::from)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
