//! Lane files of one sample and the operations done on them directly.
//!
//! A sample sequenced on several lanes arrives as several gzip-compressed
//! FASTQ files. They are byte-concatenated in the order given (gzip members
//! concatenate into a valid gzip stream) before any trimming happens.

use log::{debug, info};
use needletail::parse_fastx_file;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrimError};

/// Recognised read file suffixes, matched literally against the file name.
pub const READ_SUFFIXES: &[&str] = &[".fastq.gz", ".fq.gz"];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Ordered lane files belonging to one sample.
#[derive(Debug, Clone)]
pub struct ReadSet {
    files: Vec<PathBuf>,
    sample_name: String,
    suffix: &'static str,
}

impl ReadSet {
    /// Build a read set, checking that it is non-empty, that every file is
    /// a readable gzip file and that all files share one suffix.
    pub fn new(files: Vec<PathBuf>) -> Result<Self> {
        let first = files
            .first()
            .ok_or_else(|| TrimError::Input("no read files given".to_string()))?;

        let (sample_name, suffix) = split_read_suffix(first)?;
        let sample_name = sample_name.to_string();
        if sample_name.is_empty() {
            return Err(TrimError::Input(format!(
                "cannot derive a sample name from {}",
                first.display()
            )));
        }

        for path in &files {
            let (_, other) = split_read_suffix(path)?;
            if other != suffix {
                return Err(TrimError::Input(format!(
                    "{} does not match the format of {} ({} vs {})",
                    path.display(),
                    first.display(),
                    other,
                    suffix
                )));
            }
            check_gzip(path)?;
        }

        Ok(ReadSet {
            files,
            sample_name,
            suffix,
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Sample identity, taken from the first lane file.
    pub fn sample_name(&self) -> &str {
        &self.sample_name
    }

    /// File suffix shared by every lane, including the leading dot.
    pub fn suffix(&self) -> &'static str {
        self.suffix
    }

    pub fn trimmed_file_name(&self) -> String {
        format!("{}_trimmed{}", self.sample_name, self.suffix)
    }

    pub fn concatenated_file_name(&self) -> String {
        format!("input_reads{}", self.suffix)
    }

    /// Copy every lane, in order, into `writer`. Returns the bytes written.
    pub fn concatenate_into<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let mut total = 0;
        for path in &self.files {
            let file = File::open(path).map_err(|e| unreadable(path, e))?;
            let mut lane = LaneReader {
                inner: file,
                failed: false,
            };
            let copied = io::copy(&mut lane, writer).map_err(|e| {
                if lane.failed {
                    unreadable(path, e)
                } else {
                    TrimError::Io(e)
                }
            })?;
            debug!("Appended {} ({} bytes)", path.display(), copied);
            total += copied;
        }
        Ok(total)
    }

    /// Concatenate the lanes into a new file at `destination`, which must not
    /// be one of the lanes.
    pub fn concatenate_to(&self, destination: impl AsRef<Path>) -> Result<u64> {
        let destination = destination.as_ref();
        if let Ok(target) = destination.canonicalize() {
            let clobbers_lane = self
                .files
                .iter()
                .any(|path| path.canonicalize().is_ok_and(|lane| lane == target));
            if clobbers_lane {
                return Err(TrimError::Input(format!(
                    "{} is one of the lane files and cannot receive the concatenation",
                    destination.display()
                )));
            }
        }

        let mut writer = BufWriter::new(File::create(destination)?);
        let total = self.concatenate_into(&mut writer)?;
        writer.flush()?;
        info!(
            "Concatenated {} lane file(s) into {} ({} bytes)",
            self.files.len(),
            destination.display(),
            total
        );
        Ok(total)
    }
}

/// Remembers whether a copy error came from the lane rather than the sink.
struct LaneReader {
    inner: File,
    failed: bool,
}

impl Read for LaneReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| {
            if e.kind() != io::ErrorKind::Interrupted {
                self.failed = true;
            }
            e
        })
    }
}

/// Split a read file name into its sample name and recognised suffix.
///
/// Only an exact trailing match counts, so `ng_sample.fastq.gz` keeps its
/// leading letters.
pub fn split_read_suffix(path: &Path) -> Result<(&str, &'static str)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TrimError::Input(format!("invalid read file name: {}", path.display())))?;

    READ_SUFFIXES
        .iter()
        .find_map(|suffix| {
            file_name
                .strip_suffix(suffix)
                .map(|stem| (stem, *suffix))
        })
        .ok_or_else(|| {
            TrimError::Input(format!(
                "{} is not a compressed FASTQ file (expected one of: {})",
                path.display(),
                READ_SUFFIXES.join(", ")
            ))
        })
}

fn check_gzip(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| unreadable(path, e))?;
    if !metadata.is_file() {
        return Err(TrimError::Input(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let mut magic = [0u8; 2];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut magic))
        .map_err(|e| unreadable(path, e))?;
    if magic != GZIP_MAGIC {
        return Err(TrimError::Input(format!(
            "{} is not gzip-compressed",
            path.display()
        )));
    }
    Ok(())
}

fn unreadable(path: &Path, err: io::Error) -> TrimError {
    TrimError::Input(format!("cannot read {}: {}", path.display(), err))
}

/// Count the records in a (possibly compressed) FASTQ file.
pub fn count_reads(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let mut reader = parse_fastx_file(path)
        .map_err(|e| TrimError::Input(format!("cannot parse {}: {}", path.display(), e)))?;

    let mut count = 0;
    while let Some(record) = reader.next() {
        record.map_err(|e| {
            TrimError::Input(format!("malformed record in {}: {}", path.display(), e))
        })?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    // Helper function to create a dummy compressed FASTQ file
    fn create_dummy_fastq_gz(path: &Path, content: &str) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_sample_name_uses_exact_suffix() {
        let (name, suffix) = split_read_suffix(Path::new("/data/sample.fastq.gz")).unwrap();
        assert_eq!(name, "sample");
        assert_eq!(suffix, ".fastq.gz");

        // Leading and trailing letters from ".fastq.gz" survive
        let (name, _) = split_read_suffix(Path::new("qfastsample_zq.fastq.gz")).unwrap();
        assert_eq!(name, "qfastsample_zq");

        let (name, suffix) = split_read_suffix(Path::new("lane1.fq.gz")).unwrap();
        assert_eq!(name, "lane1");
        assert_eq!(suffix, ".fq.gz");
    }

    #[test]
    fn test_unrecognised_suffix_is_input_error() {
        let result = split_read_suffix(Path::new("reads.fastq"));
        assert!(matches!(result, Err(TrimError::Input(_))));
    }

    #[test]
    fn test_empty_read_set() {
        assert!(matches!(ReadSet::new(vec![]), Err(TrimError::Input(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = ReadSet::new(vec![dir.path().join("absent.fastq.gz")]);
        assert!(matches!(result, Err(TrimError::Input(_))));
    }

    #[test]
    fn test_uncompressed_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.fastq.gz");
        fs::write(&path, "@r1\nACGT\n+\nIIII\n").unwrap();
        assert!(matches!(ReadSet::new(vec![path]), Err(TrimError::Input(_))));
    }

    #[test]
    fn test_mixed_suffixes_rejected() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.fastq.gz");
        let b = dir.path().join("b.fq.gz");
        create_dummy_fastq_gz(&a, "@r1\nACGT\n+\nIIII\n");
        create_dummy_fastq_gz(&b, "@r2\nACGT\n+\nIIII\n");
        assert!(matches!(ReadSet::new(vec![a, b]), Err(TrimError::Input(_))));
    }

    #[test]
    fn test_concatenation_preserves_order_and_bytes() {
        let dir = tempdir().unwrap();
        let lanes: Vec<PathBuf> = ["S1_L003", "S1_L001", "S1_L002"]
            .iter()
            .map(|lane| dir.path().join(format!("{}.fastq.gz", lane)))
            .collect();
        for (i, path) in lanes.iter().enumerate() {
            create_dummy_fastq_gz(path, &format!("@read{}\nACGTACGT\n+\nIIIIIIII\n", i));
        }

        let read_set = ReadSet::new(lanes.clone()).unwrap();
        assert_eq!(read_set.sample_name(), "S1_L003");
        assert_eq!(read_set.trimmed_file_name(), "S1_L003_trimmed.fastq.gz");

        let mut joined = Vec::new();
        let written = read_set.concatenate_into(&mut joined).unwrap();

        let expected: Vec<u8> = lanes
            .iter()
            .flat_map(|path| fs::read(path).unwrap())
            .collect();
        assert_eq!(written as usize, expected.len());
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_concatenated_lanes_count_as_one_file() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("s.fastq.gz");
        let b = dir.path().join("s2.fastq.gz");
        create_dummy_fastq_gz(&a, "@r1\nACGT\n+\nIIII\n@r2\nACGT\n+\nIIII\n");
        create_dummy_fastq_gz(&b, "@r3\nACGT\n+\nIIII\n");

        let read_set = ReadSet::new(vec![a, b]).unwrap();
        let out = dir.path().join(read_set.concatenated_file_name());
        read_set.concatenate_to(&out).unwrap();

        assert_eq!(count_reads(&out).unwrap(), 3);
    }

    #[test]
    fn test_concatenation_refuses_to_overwrite_a_lane() {
        let dir = tempdir().unwrap();
        let lane = dir.path().join("input_reads.fastq.gz");
        create_dummy_fastq_gz(&lane, "@r1\nACGT\n+\nIIII\n");
        let before = fs::read(&lane).unwrap();

        let read_set = ReadSet::new(vec![lane.clone()]).unwrap();
        let out = dir.path().join(read_set.concatenated_file_name());
        assert_eq!(out, lane);

        let result = read_set.concatenate_to(&out);
        assert!(matches!(result, Err(TrimError::Input(_))));
        assert_eq!(fs::read(&lane).unwrap(), before);
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_io_error_not_input_error() {
        let dir = tempdir().unwrap();
        let lane = dir.path().join("s.fastq.gz");
        create_dummy_fastq_gz(&lane, "@r1\nACGT\n+\nIIII\n");

        let read_set = ReadSet::new(vec![lane]).unwrap();
        let result = read_set.concatenate_into(&mut FullDisk);
        assert!(matches!(result, Err(TrimError::Io(_))));
    }
}
