//! Input/Output file handling with [`InputFile`] and [`OutputFile`].
//!
//! These types abstract over reading/writing both plaintext and gzip-compressed
//! input/output.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Check if a file is a gzipped by looking for the magic numbers
pub fn is_gzipped_file(file_path: impl AsRef<Path>) -> io::Result<bool> {
    let mut file = File::open(file_path)?;
    let mut buffer = [0; 2];
    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(buffer == [0x1f, 0x8b]),
        // files shorter than the magic number are plaintext (possibly empty)
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Represents an input file.
///
/// This abstracts how data is read in, allowing for both plaintext and
/// gzip-compressed input to be read through a common interface.
#[derive(Clone, Debug)]
pub struct InputFile {
    pub filepath: PathBuf,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - the path to the file. Gzip-compressed input is detected
    /// from the file's magic number and uncompressed automatically.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    /// Opens the file and returns a buffered reader.
    ///
    /// # Returns
    ///
    /// A result containing a `BufReader<Box<dyn Read>>` on success, or an `io::Error` on failure.
    pub fn reader(&self) -> io::Result<BufReader<Box<dyn Read>>> {
        let file = File::open(&self.filepath)?;
        let reader: Box<dyn Read> = if is_gzipped_file(&self.filepath)? {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }
}

enum OutputDestination {
    File(PathBuf),
    Stdout,
}

/// Represents an output file.
///
/// This abstracts writing both plaintext and gzip-compressed files.
pub struct OutputFile {
    destination: OutputDestination,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - the path to the file. If the file extension is `.gz`,
    /// `OutputFile` will automatically write gzip-compressed output.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            destination: OutputDestination::File(filepath.into()),
        }
    }

    /// Constructs a new [`OutputFile`] for standard output.
    pub fn new_stdout() -> Self {
        Self {
            destination: OutputDestination::Stdout,
        }
    }

    /// An [`OutputFile`] for `filepath` if given, standard output otherwise.
    pub fn from_option(filepath: Option<&PathBuf>) -> Self {
        filepath.map_or_else(OutputFile::new_stdout, OutputFile::new)
    }

    /// Opens the file and returns a writer.
    ///
    /// # Returns
    ///
    /// A result containing a `Box<dyn Write>` on success, or an `io::Error` on failure.
    pub fn writer(&self) -> io::Result<Box<dyn Write>> {
        let writer: Box<dyn Write> = match &self.destination {
            OutputDestination::File(path) => {
                let is_gzip = path.extension().map_or(false, |ext| ext == "gz");
                if is_gzip {
                    Box::new(BufWriter::new(GzEncoder::new(
                        File::create(path)?,
                        Compression::default(),
                    )))
                } else {
                    Box::new(BufWriter::new(File::create(path)?))
                }
            }
            OutputDestination::Stdout => Box::new(BufWriter::new(io::stdout())),
        };
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn test_gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.tsv.gz");
        {
            let mut writer = OutputFile::new(&path).writer().unwrap();
            writeln!(writer, "chr1\t100").unwrap();
        }
        assert!(is_gzipped_file(&path).unwrap());
        let lines: Vec<String> = InputFile::new(&path)
            .reader()
            .unwrap()
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["chr1\t100".to_string()]);
    }

    #[test]
    fn test_empty_file_is_not_gzipped() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(!is_gzipped_file(file.path()).unwrap());
    }
}
