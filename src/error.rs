//! Error type shared by the trimming pipeline.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

use crate::pipeline::passes::Pass;

#[derive(Error, Debug)]
pub enum TrimError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// `pass` is the pass blamed for the failure; `diagnostics` holds the
    /// logs of every pass that failed, in pipeline order.
    #[error("cutadapt {pass} failed ({status}):\n{diagnostics}")]
    Tool {
        pass: Pass,
        status: ExitStatus,
        diagnostics: String,
    },

    /// Trimming finished; `trimmed` and `report` are still valid outputs.
    #[error("Error while preparing FastQC report ({status}):\n{diagnostics}")]
    Qc {
        status: String,
        diagnostics: String,
        trimmed: PathBuf,
        report: PathBuf,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TrimError {
    /// Files left on disk by a run that failed after trimming succeeded.
    pub fn surviving_outputs(&self) -> Option<(&PathBuf, &PathBuf)> {
        match self {
            TrimError::Qc {
                trimmed, report, ..
            } => Some((trimmed, report)),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrimError>;
