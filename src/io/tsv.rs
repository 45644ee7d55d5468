//! Essential TSV parsing functionality, which wraps the blazingly-fast [`csv`] crate's
//! deserialization method using [`serde`].
//!
//! Variant call files are tab-delimited with a header row naming the
//! [`VariantCallRecord`] columns; columns may appear in any order and
//! unknown columns are ignored. Range files are BED (0-based, half-open).

use csv::{DeserializeRecordsIntoIter, QuoteStyle, Reader, ReaderBuilder, WriterBuilder};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flate2::read::GzDecoder;
use log::{debug, warn};

use super::file::{is_gzipped_file, InputFile, OutputFile};
use crate::error::VarsetsError;
use crate::ranges::GenomicRange;
use crate::variants::{VariantCall, VariantCallRecord, VariantCollection};
use crate::Position;

/// Build a TSV reader which ignores comment lines, works on gzip-compressed
/// files, and optionally reads a header row.
pub fn build_tsv_reader(
    filepath: impl Into<PathBuf>,
    has_headers: bool,
) -> Result<Reader<Box<dyn Read>>, VarsetsError> {
    let filepath = filepath.into();
    let file = File::open(&filepath)?;
    let stream: Box<dyn Read> = if is_gzipped_file(&filepath)? {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .comment(Some(b'#'))
        .quoting(false)
        .from_reader(stream);
    Ok(reader)
}

/// Deserializes some value of type `t` with some possible missing
/// character `missing_chars` into [`Option<T>`].
pub fn deserialize_option_generic<'de, D, T>(
    deserializer: D,
    missing_chars: &'de [&'de str],
) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    let s = s.trim();
    if missing_chars.contains(&s) {
        Ok(None)
    } else {
        s.parse::<T>()
            .map(Some)
            .map_err(|e| DeError::custom(format!("parsing error: {}", e)))
    }
}

/// An iterator over deserialized rows of a headed TSV file.
pub struct TsvRecordIterator<T> {
    inner: DeserializeRecordsIntoIter<Box<dyn std::io::Read>, T>,
}

impl<T> std::fmt::Debug for TsvRecordIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsvRecordIterator").finish_non_exhaustive()
    }
}

impl<T> TsvRecordIterator<T>
where
    for<'de> T: Deserialize<'de>,
{
    /// Create a new TSV reader. The first non-comment line must be the
    /// header; lines that begin with `'#'` are skipped.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, VarsetsError> {
        let reader = build_tsv_reader(filepath, true)?;
        let inner = reader.into_deserialize();
        Ok(Self { inner })
    }
}

impl<T> Iterator for TsvRecordIterator<T>
where
    for<'de> T: Deserialize<'de>,
{
    type Item = Result<T, VarsetsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|res| res.map_err(VarsetsError::from))
    }
}

/// The collection name used for a file: its name with any `.gz` and
/// `.tsv` extensions removed.
pub fn collection_name(filepath: &Path) -> String {
    let name = filepath
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let name = name.strip_suffix(".tsv").unwrap_or(name);
    name.to_string()
}

/// Read and validate a variant call TSV file into a [`VariantCollection`].
///
/// # Arguments
///
/// * `filepath` - the TSV file, optionally gzip-compressed.
/// * `name` - the collection name; if `None`, derived from the file name.
pub fn read_variant_collection(
    filepath: impl AsRef<Path>,
    name: Option<&str>,
) -> Result<VariantCollection, VarsetsError> {
    let filepath = filepath.as_ref();
    let name = name.map_or_else(|| collection_name(filepath), str::to_string);
    let mut calls = Vec::new();
    let iter: TsvRecordIterator<VariantCallRecord> = TsvRecordIterator::new(filepath)?;
    for (row, result) in iter.enumerate() {
        calls.push(result?.validate(&name, row)?);
    }
    if calls.is_empty() {
        warn!("collection '{}' ({}) has no variant calls", name, filepath.display());
    }
    debug!("read {} variant calls into collection '{}'", calls.len(), name);
    Ok(VariantCollection::new(name, calls))
}

/// Write variant calls as a headed TSV.
pub fn write_variant_calls<'a>(
    calls: impl IntoIterator<Item = &'a VariantCall>,
    output: &OutputFile,
) -> Result<usize, VarsetsError> {
    // JSON annotations are written as-is; tabs and newlines inside them
    // are escaped by serde_json
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .has_headers(true)
        .from_writer(output.writer()?);
    let mut count = 0;
    for call in calls {
        writer.serialize(VariantCallRecord::from(call))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Read BED ranges (0-based, half-open) into 1-based, end-inclusive
/// [`GenomicRange`]s. Columns after the third are ignored.
pub fn read_bed_ranges(filepath: impl Into<PathBuf>) -> Result<Vec<GenomicRange>, VarsetsError> {
    let reader = InputFile::new(filepath).reader()?;
    let mut ranges = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("track") {
            continue;
        }
        let mut columns = line.split('\t');
        let (chromosome, start, end) = match (columns.next(), columns.next(), columns.next()) {
            (Some(chromosome), Some(start), Some(end)) => (chromosome, start, end),
            _ => return Err(VarsetsError::BedTooFewColumns(line.clone())),
        };
        let start: Position = start.trim().parse()?;
        let end: Position = end.trim().parse()?;
        let first_base = start
            .checked_add(1)
            .ok_or(VarsetsError::InvalidGenomicRange(start as i64, end as i64))?;
        // zero-length intervals mark the base after `start`
        let end = if end == start {
            warn!("zero-length BED range {}:{}-{} treated as one base", chromosome, start, end);
            first_base
        } else {
            end
        };
        ranges.push(GenomicRange::try_new(chromosome, first_base, end)?);
    }
    Ok(ranges)
}
