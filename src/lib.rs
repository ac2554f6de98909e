//! Adapter and quality trimming for 3' mRNA-seq single-end reads.
//!
//! Lane files of one sample are concatenated and streamed through three
//! cutadapt passes (poly-A/poly-G stripping, quality and TruSeq adapter
//! trimming, then removal of reads still carrying the adapter). FastQC is
//! run on the trimmed reads afterwards.

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;

pub use config::{ProcessDescriptor, ToolPaths, TrimOptions, TrimStrategy};
pub use error::TrimError;
pub use io::ReadSet;
pub use pipeline::{TrimResult, Trimmer};
