//! Types and methods for reading and parsing input and writing output.

pub mod file;
pub mod tsv;

pub use file::{InputFile, OutputFile};
pub use tsv::{read_bed_ranges, read_variant_collection, write_variant_calls, TsvRecordIterator};
