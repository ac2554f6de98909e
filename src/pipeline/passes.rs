//! Command lines of the three cutadapt passes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{TrimOptions, TrimStrategy};

/// Poly-A run trimmed from the 3' end in pass 1.
pub const POLY_A_ADAPTER: &str = "polyA=A{20}";
/// Poly-G run left by dark cycles on two-color instruments.
pub const POLY_G_ADAPTER: &str = "QUALITY=G{20}";
/// TruSeq adapter behind an 18 base poly-A anchor.
pub const TRUSEQ_ADAPTER: &str = "truseq=A{18}AGATCGGAAGAGCACACGTCTGAACTCCAGTCAC";

/// cutadapt reads from stdin when given `-`.
const STDIN: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pass {
    /// Strip poly-A and poly-G artifacts.
    ArtifactStrip,
    /// Quality trim and remove the TruSeq adapter from the 3' end.
    QualityAdapterTrim,
    /// Drop reads in which the TruSeq adapter is still found.
    AdapterFilter,
}

impl Pass {
    pub const ALL: [Pass; 3] = [
        Pass::ArtifactStrip,
        Pass::QualityAdapterTrim,
        Pass::AdapterFilter,
    ];

    pub fn number(&self) -> usize {
        match self {
            Pass::ArtifactStrip => 1,
            Pass::QualityAdapterTrim => 2,
            Pass::AdapterFilter => 3,
        }
    }

    /// Name of the file collecting this pass's diagnostic output.
    pub fn log_file_name(&self) -> String {
        format!("cutadapt_pass{}.log", self.number())
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Pass::ArtifactStrip => "artifact stripping",
            Pass::QualityAdapterTrim => "quality/adapter trimming",
            Pass::AdapterFilter => "adapter filtering",
        };
        write!(f, "pass {} ({})", self.number(), label)
    }
}

/// One cutadapt invocation.
#[derive(Debug, Clone)]
pub struct PassCommand {
    pub pass: Pass,
    pub args: Vec<String>,
}

impl PassCommand {
    /// Whether the argument list contains `flag` as a standalone argument.
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }

    /// Value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Pass 1 reads the concatenated lane file and writes to stdout.
pub fn artifact_strip(options: &TrimOptions, input: &str) -> PassCommand {
    PassCommand {
        pass: Pass::ArtifactStrip,
        args: vec![
            "-m".to_string(),
            options.min_len.to_string(),
            "-O".to_string(),
            options.min_overlap.to_string(),
            "-n".to_string(),
            options.times.to_string(),
            "-a".to_string(),
            POLY_A_ADAPTER.to_string(),
            "-a".to_string(),
            POLY_G_ADAPTER.to_string(),
            "-j".to_string(),
            options.cores.to_string(),
            input.to_string(),
        ],
    }
}

/// Pass 2 reads stdin and writes to stdout.
pub fn quality_adapter_trim(options: &TrimOptions, strategy: TrimStrategy) -> PassCommand {
    PassCommand {
        pass: Pass::QualityAdapterTrim,
        args: vec![
            "-m".to_string(),
            options.min_len.to_string(),
            strategy.flag(),
            "-a".to_string(),
            TRUSEQ_ADAPTER.to_string(),
            "-j".to_string(),
            options.cores.to_string(),
            STDIN.to_string(),
        ],
    }
}

/// Pass 3 reads stdin and writes the kept reads to `output`.
pub fn adapter_filter(options: &TrimOptions, output: &str) -> PassCommand {
    PassCommand {
        pass: Pass::AdapterFilter,
        args: vec![
            "-m".to_string(),
            options.min_len.to_string(),
            "-O".to_string(),
            options.min_overlap.to_string(),
            "-g".to_string(),
            TRUSEQ_ADAPTER.to_string(),
            "--discard-trimmed".to_string(),
            "-j".to_string(),
            options.cores.to_string(),
            "-o".to_string(),
            output.to_string(),
            STDIN.to_string(),
        ],
    }
}

/// All three passes in pipeline order.
pub fn plan(options: &TrimOptions, input: &str, output: &str) -> [PassCommand; 3] {
    let strategy = options.strategy();
    [
        artifact_strip(options, input),
        quality_adapter_trim(options, strategy),
        adapter_filter(options, output),
    ]
}
