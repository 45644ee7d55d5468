//! The canonical variant call record model.
//!
//! A [`VariantCall`] is one called event, small or structural, from some
//! caller on some sample. Its geometry is exposed through one or two
//! [`Breakpoint`] views, which are what the spatial index and the match
//! predicate reason about.
//!
//! Records are immutable once they enter the engine: set operations that
//! produce new records (merge and collapse) build fresh [`VariantCall`]s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::Position;

pub mod record;

pub use record::VariantCallRecord;

/// Delimiter used when several distinct provenance values are folded into
/// one field of a merged record.
pub const LIST_DELIMITER: char = ';';

/// The enumerated variant types.
///
/// Translocations and breakends belong to the same matching class; see
/// [`VariantType::matching_class()`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum VariantType {
    Snv,
    Mnv,
    Insertion,
    Deletion,
    Duplication,
    Inversion,
    Translocation,
    Breakend,
    #[default]
    Other,
}

impl VariantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantType::Snv => "SNV",
            VariantType::Mnv => "MNV",
            VariantType::Insertion => "INS",
            VariantType::Deletion => "DEL",
            VariantType::Duplication => "DUP",
            VariantType::Inversion => "INV",
            VariantType::Translocation => "TRA",
            VariantType::Breakend => "BND",
            VariantType::Other => "OTHER",
        }
    }

    /// The class used when variant types must agree for two calls to match.
    pub fn matching_class(&self) -> VariantType {
        match self {
            VariantType::Breakend => VariantType::Translocation,
            other => *other,
        }
    }

    /// Whether this is a translocation-style call whose two breakpoints
    /// may be paired in either orientation.
    pub fn is_breakend_kind(&self) -> bool {
        matches!(self, VariantType::Translocation | VariantType::Breakend)
    }

    /// Whether this is a single- or multi-nucleotide variant.
    pub fn is_small(&self) -> bool {
        matches!(self, VariantType::Snv | VariantType::Mnv)
    }

    /// Whether the size of this variant is given by the span between its
    /// two breakpoints.
    pub fn has_span_size(&self) -> bool {
        matches!(
            self,
            VariantType::Deletion | VariantType::Duplication | VariantType::Inversion
        )
    }
}

impl From<&str> for VariantType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "SNV" | "SNP" => VariantType::Snv,
            "MNV" | "MNP" => VariantType::Mnv,
            "INS" | "INSERTION" => VariantType::Insertion,
            "DEL" | "DELETION" => VariantType::Deletion,
            "DUP" | "DUPLICATION" => VariantType::Duplication,
            "INV" | "INVERSION" => VariantType::Inversion,
            "TRA" | "TRANSLOCATION" => VariantType::Translocation,
            "BND" | "BREAKEND" => VariantType::Breakend,
            _ => VariantType::Other,
        }
    }
}

impl From<String> for VariantType {
    fn from(value: String) -> Self {
        VariantType::from(value.as_str())
    }
}

impl From<VariantType> for String {
    fn from(value: VariantType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A confidence interval around a breakpoint position, as offsets
/// relative to the position (e.g. `-10,25`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfidenceInterval {
    pub lower: i32,
    pub upper: i32,
}

impl ConfidenceInterval {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lower, self.upper)
    }
}

/// An annotation value attached by some external layer. The engine copies
/// these but never inspects them.
///
/// Numbers keep their JSON representation, so an integer is written back as
/// an integer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

/// Opaque annotation key → value mapping.
pub type Annotations = BTreeMap<String, AnnotationValue>;

/// Which of the two breakpoints of a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BreakpointEnd {
    First,
    Second,
}

/// A derived (chromosome, position) view onto one end of a [`VariantCall`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Breakpoint<'a> {
    pub chromosome: &'a str,
    pub position: Position,
    pub confidence_interval: Option<ConfidenceInterval>,
}

impl<'a> Breakpoint<'a> {
    /// Whether the other breakpoint lies on the same chromosome within
    /// `distance` basepairs (inclusive).
    pub fn is_near(&self, other: &Breakpoint<'_>, distance: Position) -> bool {
        self.chromosome == other.chromosome && self.position.abs_diff(other.position) <= distance
    }
}

/// One called variant.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantCall {
    pub id: String,
    pub source_id: String,
    pub sample_id: String,
    pub case_id: Option<String>,
    pub control_id: Option<String>,
    pub variant_calling_method: String,
    pub sequencing_platform: String,
    pub chromosome_1: String,
    pub position_1: Position,
    pub chromosome_2: String,
    pub position_2: Position,
    pub confidence_interval_1: Option<ConfidenceInterval>,
    pub confidence_interval_2: Option<ConfidenceInterval>,
    pub variant_type: VariantType,
    pub variant_size: Option<i64>,
    pub precise: bool,
    pub reference_allele_read_count: Option<u64>,
    pub alternate_allele_read_count: Option<u64>,
    pub total_read_count: Option<u64>,
    pub alternate_allele_fraction: Option<f64>,
    pub quality_score: Option<f64>,
    pub filter: String,
    pub annotations: Annotations,
    /// The cluster this record was grouped into, set on the member records
    /// returned by intersect and compare.
    pub cluster_id: Option<u64>,
}

impl VariantCall {
    /// Create a new [`VariantCall`] with the given identity and geometry;
    /// every other field is empty or absent.
    pub fn new(
        id: impl Into<String>,
        chromosome_1: impl Into<String>,
        position_1: Position,
        chromosome_2: impl Into<String>,
        position_2: Position,
        variant_type: VariantType,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: String::new(),
            sample_id: String::new(),
            case_id: None,
            control_id: None,
            variant_calling_method: String::new(),
            sequencing_platform: String::new(),
            chromosome_1: chromosome_1.into(),
            position_1,
            chromosome_2: chromosome_2.into(),
            position_2,
            confidence_interval_1: None,
            confidence_interval_2: None,
            variant_type,
            variant_size: None,
            precise: false,
            reference_allele_read_count: None,
            alternate_allele_read_count: None,
            total_read_count: None,
            alternate_allele_fraction: None,
            quality_score: None,
            filter: String::new(),
            annotations: Annotations::new(),
            cluster_id: None,
        }
    }

    pub fn breakpoint_1(&self) -> Breakpoint<'_> {
        Breakpoint {
            chromosome: &self.chromosome_1,
            position: self.position_1,
            confidence_interval: self.confidence_interval_1,
        }
    }

    pub fn breakpoint_2(&self) -> Breakpoint<'_> {
        Breakpoint {
            chromosome: &self.chromosome_2,
            position: self.position_2,
            confidence_interval: self.confidence_interval_2,
        }
    }

    pub fn breakpoint(&self, end: BreakpointEnd) -> Breakpoint<'_> {
        match end {
            BreakpointEnd::First => self.breakpoint_1(),
            BreakpointEnd::Second => self.breakpoint_2(),
        }
    }

    /// Whether the second locus differs from the first, i.e. whether
    /// this call yields two breakpoints rather than one.
    pub fn has_second_breakpoint(&self) -> bool {
        self.chromosome_1 != self.chromosome_2 || self.position_1 != self.position_2
    }

    /// The breakpoint ends this call yields (one or two).
    pub fn breakpoint_ends(&self) -> &'static [BreakpointEnd] {
        if self.has_second_breakpoint() {
            &[BreakpointEnd::First, BreakpointEnd::Second]
        } else {
            &[BreakpointEnd::First]
        }
    }

    pub fn is_interchromosomal(&self) -> bool {
        self.chromosome_1 != self.chromosome_2
    }

    /// The chromosome whose partition owns this call: the lexicographically
    /// smaller of its two chromosomes.
    pub fn partition_chromosome(&self) -> &str {
        if self.chromosome_2 < self.chromosome_1 {
            &self.chromosome_2
        } else {
            &self.chromosome_1
        }
    }

    /// Whether the caller-reported filter status is `PASS`.
    pub fn is_pass(&self) -> bool {
        self.filter.eq_ignore_ascii_case("PASS")
    }

    /// The distinct values of a possibly list-valued provenance field.
    pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
        value
            .split(LIST_DELIMITER)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// A named, ordered collection of variant calls, e.g. the calls from one
/// caller on one sample.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariantCollection {
    pub name: String,
    pub calls: Vec<VariantCall>,
}

impl VariantCollection {
    pub fn new(name: impl Into<String>, calls: Vec<VariantCall>) -> Self {
        Self {
            name: name.into(),
            calls,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariantCall> {
        self.calls.iter()
    }

    pub fn push(&mut self, call: VariantCall) {
        self.calls.push(call)
    }
}
