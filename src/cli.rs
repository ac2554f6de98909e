use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

use crate::config::{ProcessDescriptor, ToolPaths, TrimOptions};
use crate::io::ReadSet;
use crate::pipeline::{generate_report, Trimmer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trim the lane files of one sample with cutadapt and run FastQC
    Trim(TrimArgs),

    /// Print the process metadata and default options as JSON
    Describe,
}

#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Read files of one sample (one per lane), concatenated in this order
    #[arg(short, long, required = true, num_args = 1..)]
    pub reads: Vec<PathBuf>,

    /// Working directory for intermediate and output files
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// JSON file with trimming options; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// NextSeq/NovaSeq-specific quality trimming threshold
    #[arg(long)]
    pub nextseq_trim: Option<u32>,

    /// Standard 3' quality cutoff; overrides --nextseq-trim
    #[arg(long)]
    pub quality_cutoff: Option<u32>,

    /// Discard reads shorter than this after trimming
    #[arg(long)]
    pub min_len: Option<u32>,

    /// Minimum overlap between adapter and read
    #[arg(long)]
    pub min_overlap: Option<u32>,

    /// Remove up to this many adapters from each read
    #[arg(long)]
    pub times: Option<u32>,

    /// Number of cores cutadapt may use
    #[arg(short = 'j', long)]
    pub cores: Option<u32>,

    /// cutadapt executable
    #[arg(long, default_value = "cutadapt")]
    pub cutadapt: PathBuf,

    /// FastQC wrapper script
    #[arg(long, default_value = "fastqc.sh")]
    pub fastqc: PathBuf,
}

impl TrimArgs {
    /// Defaults, then the option file, then explicit flags.
    pub fn resolve_options(&self) -> crate::error::Result<TrimOptions> {
        let mut options = match &self.config {
            Some(path) => TrimOptions::from_json_file(path)?,
            None => TrimOptions::default(),
        };
        if let Some(n) = self.nextseq_trim {
            options.nextseq_trim = n;
        }
        if self.quality_cutoff.is_some() {
            options.quality_cutoff = self.quality_cutoff;
        }
        if let Some(n) = self.min_len {
            options.min_len = n;
        }
        if let Some(n) = self.min_overlap {
            options.min_overlap = n;
        }
        if let Some(n) = self.times {
            options.times = n;
        }
        if let Some(n) = self.cores {
            options.cores = n;
        }
        options.validate()?;
        Ok(options)
    }

    pub fn tool_paths(&self) -> ToolPaths {
        ToolPaths {
            cutadapt: self.cutadapt.clone(),
            fastqc: self.fastqc.clone(),
        }
    }
}

/// Main entry point for CLI
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Trim(args) => run_trim(args),
        Commands::Describe => {
            let descriptor = ProcessDescriptor::default();
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            Ok(())
        }
    }
}

fn run_trim(args: TrimArgs) -> Result<()> {
    let options = args.resolve_options()?;
    info!("Trimming options: {:?}", options);

    let reads = ReadSet::new(args.reads.clone())?;
    let trimmer = Trimmer::new(&args.workdir, args.tool_paths())
        .with_context(|| format!("cannot use working directory {}", args.workdir.display()))?;

    match trimmer.run(&reads, &options) {
        Ok(result) => {
            println!("{}", generate_report(&result));
            Ok(())
        }
        Err(e) => {
            if let Some((trimmed, report)) = e.surviving_outputs() {
                error!(
                    "Trimming succeeded but the run failed; kept {} and {}",
                    trimmed.display(),
                    report.display()
                );
            }
            Err(e).with_context(|| format!("sample {} failed", reads.sample_name()))
        }
    }
}
