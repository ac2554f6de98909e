//! FastQC report for the trimmed reads.
//!
//! The wrapper script takes the reads, an output directory and the names of
//! the archive and HTML output slots. Read grouping is disabled so the
//! per-base plots show every position.

use itertools::Itertools;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Result, TrimError};

pub const QC_DIR: &str = "fastqc";
const ARCHIVE_SLOT: &str = "fastqc_archive";
const HTML_SLOT: &str = "fastqc_url";
const NO_GROUP: &str = "--nogroup";

/// Artifacts FastQC leaves in the QC directory.
#[derive(Debug, Clone)]
pub struct QcArtifacts {
    pub html: PathBuf,
    pub archive: PathBuf,
}

pub fn qc_args(reads_file: &str) -> Vec<String> {
    vec![
        reads_file.to_string(),
        QC_DIR.to_string(),
        ARCHIVE_SLOT.to_string(),
        HTML_SLOT.to_string(),
        NO_GROUP.to_string(),
    ]
}

/// FastQC names its outputs after the reads file minus its read suffix.
pub fn expected_artifacts(work_dir: &Path, reads_stem: &str) -> QcArtifacts {
    let qc_dir = work_dir.join(QC_DIR);
    QcArtifacts {
        html: qc_dir.join(format!("{}_fastqc.html", reads_stem)),
        archive: qc_dir.join(format!("{}_fastqc.zip", reads_stem)),
    }
}

/// Run the QC wrapper on `reads_file` (relative to `work_dir`).
///
/// `report` is only carried into the error so callers know which outputs
/// survived.
pub fn run_fastqc(
    program: &Path,
    work_dir: &Path,
    reads_file: &str,
    reads_stem: &str,
    report: &Path,
) -> Result<QcArtifacts> {
    let trimmed = work_dir.join(reads_file);
    let qc_error = |status: String, diagnostics: String| TrimError::Qc {
        status,
        diagnostics,
        trimmed: trimmed.clone(),
        report: report.to_path_buf(),
    };

    let args = qc_args(reads_file);
    debug!("{} {}", program.display(), args.iter().join(" "));

    let output = Command::new(program)
        .args(&args)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            qc_error(
                "not started".to_string(),
                format!("failed to spawn {}: {}", program.display(), e),
            )
        })?;

    let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
    diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
    for line in diagnostics.lines() {
        info!("fastqc: {}", line);
    }

    if !output.status.success() {
        error!("Error while preparing FASTQC report.");
        return Err(qc_error(output.status.to_string(), diagnostics));
    }

    let artifacts = expected_artifacts(work_dir, reads_stem);
    for artifact in [&artifacts.html, &artifacts.archive] {
        if !artifact.is_file() {
            return Err(qc_error(
                output.status.to_string(),
                format!("expected QC artifact {} was not produced", artifact.display()),
            ));
        }
    }
    info!("FastQC report: {}", artifacts.html.display());
    Ok(artifacts)
}
