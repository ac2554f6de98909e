//! Trimming options, tool locations and the declared process metadata.
//!
//! Options can be read from a JSON file and then overridden field by field
//! from the command line. Every field has a default, so an empty JSON object
//! is a valid option file.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrimError};

/// Numeric options controlling the three cutadapt passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimOptions {
    /// NextSeq/NovaSeq quality trimming threshold. Also trims dark cycles
    /// that read out as high-quality G bases.
    pub nextseq_trim: u32,
    /// Standard 3' quality trimming. Overrides `nextseq_trim` when set.
    pub quality_cutoff: Option<u32>,
    /// Discard reads shorter than this after trimming.
    pub min_len: u32,
    /// Minimum overlap between adapter and read for an adapter to be found.
    pub min_overlap: u32,
    /// Remove up to this many adapters from each read.
    pub times: u32,
    /// Worker count handed to cutadapt (`-j`).
    pub cores: u32,
}

impl Default for TrimOptions {
    fn default() -> Self {
        TrimOptions {
            nextseq_trim: 10,
            quality_cutoff: None,
            min_len: 20,
            min_overlap: 20,
            times: 2,
            cores: Resources::default().cores,
        }
    }
}

impl TrimOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TrimError::Config(format!("cannot open option file {}: {}", path.display(), e))
        })?;
        let options: TrimOptions = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            TrimError::Config(format!("invalid option file {}: {}", path.display(), e))
        })?;
        debug!("Loaded options from {}: {:?}", path.display(), options);
        Ok(options)
    }

    /// Resolve which quality trimming flag pass 2 uses.
    pub fn strategy(&self) -> TrimStrategy {
        match self.quality_cutoff {
            Some(cutoff) => TrimStrategy::QualityCutoff(cutoff),
            None => TrimStrategy::NextSeqTrim(self.nextseq_trim),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.times == 0 {
            return Err(TrimError::Config("times must be at least 1".to_string()));
        }
        if self.min_overlap == 0 {
            return Err(TrimError::Config("min_overlap must be at least 1".to_string()));
        }
        if self.cores == 0 {
            return Err(TrimError::Config("cores must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// The two mutually exclusive quality trimming strategies of pass 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimStrategy {
    QualityCutoff(u32),
    NextSeqTrim(u32),
}

impl TrimStrategy {
    /// The cutadapt flag implementing this strategy.
    pub fn flag(&self) -> String {
        match self {
            TrimStrategy::QualityCutoff(n) => format!("--quality-cutoff={}", n),
            TrimStrategy::NextSeqTrim(n) => format!("--nextseq-trim={}", n),
        }
    }
}

impl fmt::Display for TrimStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimStrategy::QualityCutoff(n) => write!(f, "quality cutoff {}", n),
            TrimStrategy::NextSeqTrim(n) => write!(f, "NextSeq trim {}", n),
        }
    }
}

/// Programs invoked by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPaths {
    pub cutadapt: PathBuf,
    pub fastqc: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            cutadapt: PathBuf::from("cutadapt"),
            fastqc: PathBuf::from("fastqc.sh"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingClass {
    Interactive,
    Batch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resources {
    pub cores: u32,
    /// Memory in MB.
    pub memory: u32,
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            cores: 10,
            memory: 16384,
        }
    }
}

/// Metadata the surrounding workflow system reads to schedule a run.
/// Declared here and printed by `describe`; nothing in the crate enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub slug: String,
    pub name: String,
    pub process_type: String,
    pub version: String,
    pub category: String,
    pub scheduling_class: SchedulingClass,
    pub entity_type: String,
    pub docker_image: String,
    pub resources: Resources,
    pub default_options: TrimOptions,
}

impl Default for ProcessDescriptor {
    fn default() -> Self {
        ProcessDescriptor {
            slug: "cutadapt-3prime-single".to_string(),
            name: "Cutadapt (3' mRNA-seq, single-end)".to_string(),
            process_type: "data:reads:fastq:single:cutadapt:".to_string(),
            version: "1.0.1".to_string(),
            category: "Other".to_string(),
            scheduling_class: SchedulingClass::Batch,
            entity_type: "sample".to_string(),
            docker_image: "resolwebio/rnaseq:4.7.0".to_string(),
            resources: Resources::default(),
            default_options: TrimOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let options = TrimOptions::default();
        assert_eq!(options.nextseq_trim, 10);
        assert_eq!(options.quality_cutoff, None);
        assert_eq!(options.min_len, 20);
        assert_eq!(options.min_overlap, 20);
        assert_eq!(options.times, 2);
        assert_eq!(options.cores, 10);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_quality_cutoff_takes_precedence() {
        for nextseq_trim in [0, 10, 30] {
            let options = TrimOptions {
                nextseq_trim,
                quality_cutoff: Some(25),
                ..TrimOptions::default()
            };
            assert_eq!(options.strategy(), TrimStrategy::QualityCutoff(25));
            assert_eq!(options.strategy().flag(), "--quality-cutoff=25");
        }
    }

    #[test]
    fn test_nextseq_trim_without_cutoff() {
        let options = TrimOptions {
            nextseq_trim: 17,
            ..TrimOptions::default()
        };
        assert_eq!(options.strategy(), TrimStrategy::NextSeqTrim(17));
        assert_eq!(options.strategy().flag(), "--nextseq-trim=17");
    }

    #[test]
    fn test_validate_rejects_zero_times_overlap_and_cores() {
        let options = TrimOptions {
            times: 0,
            ..TrimOptions::default()
        };
        assert!(matches!(options.validate(), Err(TrimError::Config(_))));

        let options = TrimOptions {
            min_overlap: 0,
            ..TrimOptions::default()
        };
        match options.validate() {
            Err(TrimError::Config(message)) => assert!(message.contains("min_overlap")),
            other => panic!("expected a configuration error, got {:?}", other),
        }

        // A zero minimum length is allowed
        let options = TrimOptions {
            min_len: 0,
            ..TrimOptions::default()
        };
        assert!(options.validate().is_ok());

        let options = TrimOptions {
            cores: 0,
            ..TrimOptions::default()
        };
        assert!(matches!(options.validate(), Err(TrimError::Config(_))));
    }

    #[test]
    fn test_partial_json_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"quality_cutoff": 20, "min_len": 30}}"#).unwrap();

        let options = TrimOptions::from_json_file(&path).unwrap();
        assert_eq!(options.quality_cutoff, Some(20));
        assert_eq!(options.min_len, 30);
        assert_eq!(options.times, 2);
    }

    #[test]
    fn test_json_file_rejects_unknown_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"min_length": 30}"#).unwrap();

        let result = TrimOptions::from_json_file(&path);
        assert!(matches!(result, Err(TrimError::Config(_))));
    }

    #[test]
    fn test_descriptor_serializes_scheduling_class() {
        let json = serde_json::to_value(ProcessDescriptor::default()).unwrap();
        assert_eq!(json["scheduling_class"], "batch");
        assert_eq!(json["docker_image"], "resolwebio/rnaseq:4.7.0");
        assert_eq!(json["resources"]["memory"], 16384);
    }
}
