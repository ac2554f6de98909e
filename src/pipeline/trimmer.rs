//! The trimming run: concatenate lanes, stream them through three cutadapt
//! passes joined by pipes, then run FastQC on the result.

use itertools::Itertools;
use log::{debug, error, info, warn};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::time::Instant;

use crate::config::{TrimOptions, ToolPaths};
use crate::error::{Result, TrimError};
use crate::io::fastq::{count_reads, ReadSet};
use crate::pipeline::passes::{self, Pass, PassCommand};
use crate::pipeline::qc;
use crate::pipeline::report::{assemble_report, ReadCounts, TrimResult, REPORT_FILE};

/// Runs the pipeline inside one working directory.
///
/// All files are created in `work_dir` and child processes are started
/// there; the current directory of this process is never changed.
#[derive(Debug, Clone)]
pub struct Trimmer {
    work_dir: PathBuf,
    tools: ToolPaths,
}

impl Trimmer {
    pub fn new(work_dir: impl AsRef<Path>, tools: ToolPaths) -> Result<Self> {
        let work_dir = work_dir.as_ref();
        fs::create_dir_all(work_dir)?;
        Ok(Trimmer {
            work_dir: work_dir.canonicalize()?,
            tools,
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Trim one sample.
    ///
    /// A failing cutadapt pass stops the run before QC. A failing QC step
    /// returns [`TrimError::Qc`] with the trimmed reads and report left in
    /// place.
    pub fn run(&self, reads: &ReadSet, options: &TrimOptions) -> Result<TrimResult> {
        let start_time = Instant::now();
        options.validate()?;
        let strategy = options.strategy();

        info!(
            "Trimming sample {} from {} lane file(s), {}",
            reads.sample_name(),
            reads.files().len(),
            strategy
        );

        let input_name = reads.concatenated_file_name();
        let input_path = self.work_dir.join(&input_name);
        reads.concatenate_to(&input_path)?;

        let trimmed_name = reads.trimmed_file_name();
        let trimmed = self.work_dir.join(&trimmed_name);
        let report = self.work_dir.join(REPORT_FILE);

        let commands = passes::plan(options, &input_name, &trimmed_name);
        self.run_passes(&commands, &report)?;
        info!("Cutadapt report written to {}", report.display());

        let stem = format!("{}_trimmed", reads.sample_name());
        let artifacts = qc::run_fastqc(
            &self.tools.fastqc,
            &self.work_dir,
            &trimmed_name,
            &stem,
            &report,
        )?;

        let counts = ReadCounts {
            input_reads: count_or_warn(&input_path),
            output_reads: count_or_warn(&trimmed),
        };

        let result = TrimResult {
            sample_name: reads.sample_name().to_string(),
            trimmed,
            report,
            qc_html: artifacts.html,
            qc_archive: artifacts.archive,
            strategy,
            options: options.clone(),
            counts,
        };
        let summary = result.write_summary(&self.work_dir)?;
        debug!("Run summary written to {}", summary.display());

        info!(
            "Trimmed sample {} in {:.2} seconds",
            result.sample_name,
            start_time.elapsed().as_secs_f64()
        );
        Ok(result)
    }

    /// Run the three passes as one pipe chain and write the combined report.
    fn run_passes(&self, commands: &[PassCommand; 3], report: &Path) -> Result<()> {
        let logs: Vec<PathBuf> = commands
            .iter()
            .map(|cmd| self.work_dir.join(cmd.pass.log_file_name()))
            .collect();

        let outcome = self.spawn_chain(commands, &logs);
        // The report is kept even when a pass failed
        assemble_report(&logs, report)?;
        let statuses = outcome?;

        match failed_pass(&statuses) {
            Some(i) => {
                let (pass, status) = statuses[i];
                let diagnostics = collect_diagnostics(&statuses, &logs);
                error!("cutadapt {} exited with {}", pass, status);
                Err(TrimError::Tool {
                    pass,
                    status,
                    diagnostics,
                })
            }
            None => {
                debug!("All cutadapt passes finished");
                Ok(())
            }
        }
    }

    /// Start every pass with stdout feeding the next pass's stdin, then
    /// wait for all of them.
    fn spawn_chain(
        &self,
        commands: &[PassCommand; 3],
        logs: &[PathBuf],
    ) -> Result<Vec<(Pass, ExitStatus)>> {
        let mut children: Vec<(Pass, Child)> = Vec::with_capacity(commands.len());
        let mut upstream: Option<ChildStdout> = None;

        for (i, (cmd, log_path)) in commands.iter().zip(logs).enumerate() {
            let is_last = i + 1 == commands.len();
            match self.spawn_pass(cmd, log_path, upstream.take(), is_last) {
                Ok(mut child) => {
                    upstream = child.stdout.take();
                    children.push((cmd.pass, child));
                }
                Err(e) => {
                    abort(children);
                    return Err(e);
                }
            }
        }

        let mut statuses = Vec::with_capacity(children.len());
        let mut remaining = children.into_iter();
        while let Some((pass, mut child)) = remaining.next() {
            match child.wait() {
                Ok(status) => statuses.push((pass, status)),
                Err(e) => {
                    abort(std::iter::once((pass, child)).chain(remaining).collect());
                    return Err(e.into());
                }
            }
        }
        Ok(statuses)
    }

    fn spawn_pass(
        &self,
        cmd: &PassCommand,
        log_path: &Path,
        upstream: Option<ChildStdout>,
        is_last: bool,
    ) -> Result<Child> {
        let log = File::create(log_path)?;

        let mut command = Command::new(&self.tools.cutadapt);
        command
            .args(&cmd.args)
            .current_dir(&self.work_dir)
            .stderr(Stdio::from(log.try_clone()?));
        match upstream {
            Some(stdout) => command.stdin(Stdio::from(stdout)),
            None => command.stdin(Stdio::null()),
        };
        if is_last {
            // cutadapt prints its report on stdout when writing reads to -o
            command.stdout(Stdio::from(log));
        } else {
            command.stdout(Stdio::piped());
        }

        debug!(
            "{} {}",
            self.tools.cutadapt.display(),
            cmd.args.iter().join(" ")
        );
        command.spawn().map_err(|source| TrimError::Spawn {
            program: self.tools.cutadapt.display().to_string(),
            source,
        })
    }
}

/// Kill and reap passes already started when the chain cannot complete.
fn abort(children: Vec<(Pass, Child)>) {
    for (pass, mut child) in children {
        if let Err(e) = child.kill() {
            debug!("cutadapt {} already exited: {}", pass, e);
        }
        let _ = child.wait();
    }
}

/// Index of the pass to blame for a failed chain.
///
/// A failure travels upstream: when a pass dies, the passes feeding it fail
/// on a broken pipe, either by SIGPIPE or with an error code of their own.
/// The most downstream pass that exited with a code is blamed; signal deaths
/// are only blamed when no pass exited with a code.
fn failed_pass(statuses: &[(Pass, ExitStatus)]) -> Option<usize> {
    let failed = || {
        statuses
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, (_, status))| !status.success())
    };
    failed()
        .find(|(_, (_, status))| status.code().is_some())
        .or_else(|| failed().next())
        .map(|(i, _)| i)
}

/// Logs of every failed pass, in pipeline order, each under a header.
fn collect_diagnostics(statuses: &[(Pass, ExitStatus)], logs: &[PathBuf]) -> String {
    let mut diagnostics = String::new();
    for ((pass, status), log) in statuses.iter().zip(logs) {
        if status.success() {
            continue;
        }
        let text = fs::read(log)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        diagnostics.push_str(&format!("--- cutadapt {} ({}) ---\n", pass, status));
        diagnostics.push_str(&text);
        if !text.is_empty() && !text.ends_with('\n') {
            diagnostics.push('\n');
        }
    }
    diagnostics
}

fn count_or_warn(path: &Path) -> Option<u64> {
    match count_reads(path) {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Could not count reads in {}: {}", path.display(), e);
            None
        }
    }
}
