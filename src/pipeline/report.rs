use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{TrimOptions, TrimStrategy};
use crate::error::Result;
use crate::io::write_json_atomic;

pub const REPORT_FILE: &str = "cutadapt_report.txt";
pub const SUMMARY_FILE: &str = "trim_summary.json";

/// Read counts collected after trimming, when the files could be parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadCounts {
    pub input_reads: Option<u64>,
    pub output_reads: Option<u64>,
}

impl ReadCounts {
    /// Fraction of input reads that survived all three passes.
    pub fn retained_fraction(&self) -> Option<f64> {
        match (self.input_reads, self.output_reads) {
            (Some(input), Some(output)) if input > 0 => Some(output as f64 / input as f64),
            _ => None,
        }
    }
}

/// Outputs of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimResult {
    pub sample_name: String,
    pub trimmed: PathBuf,
    pub report: PathBuf,
    pub qc_html: PathBuf,
    pub qc_archive: PathBuf,
    pub strategy: TrimStrategy,
    pub options: TrimOptions,
    pub counts: ReadCounts,
}

impl TrimResult {
    pub fn write_summary(&self, work_dir: &Path) -> Result<PathBuf> {
        let path = work_dir.join(SUMMARY_FILE);
        write_json_atomic(self, &path)?;
        Ok(path)
    }
}

/// Join the per-pass logs, in pass order, into the report file.
pub fn assemble_report(logs: &[PathBuf], report: &Path) -> Result<()> {
    let mut text = String::new();
    for log in logs {
        // A pass that never started has no log
        if let Ok(content) = fs::read(log) {
            text.push_str(&String::from_utf8_lossy(&content));
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
        }
    }
    fs::write(report, text)?;
    Ok(())
}

/// Generate a short text summary for the console.
pub fn generate_report(result: &TrimResult) -> String {
    let mut report = String::new();

    report.push_str(&format!("Trimming Report for Sample: {}\n", result.sample_name));
    report.push_str("=================================================\n\n");

    report.push_str(&format!("  Strategy: {}\n", result.strategy));
    report.push_str(&format!(
        "  Min length: {}, min overlap: {}, times: {}, cores: {}\n",
        result.options.min_len,
        result.options.min_overlap,
        result.options.times,
        result.options.cores
    ));

    match (result.counts.input_reads, result.counts.output_reads) {
        (Some(input), Some(output)) => {
            report.push_str(&format!(
                "  Reads kept: {}/{} ({:.1}%)\n",
                output,
                input,
                100.0 * result.counts.retained_fraction().unwrap_or(0.0)
            ));
        }
        _ => report.push_str("  Reads kept: N/A\n"),
    }
    report.push('\n');

    report.push_str("----\n");
    report.push_str(&format!("Trimmed reads: {}\n", result.trimmed.display()));
    report.push_str(&format!("Cutadapt report: {}\n", result.report.display()));
    report.push_str(&format!("FastQC report: {}\n", result.qc_html.display()));
    report.push_str(&format!("FastQC archive: {}\n", result.qc_archive.display()));

    report
}
