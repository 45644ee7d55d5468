//! Row-wise filtering on declared record attributes.
//!
//! A [`VariantFilter`] names an attribute, a comparison operator and a value,
//! and optionally the samples it applies to. Filters are read from JSON, e.g.
//!
//! ```json
//! [{"attribute": "quality_score", "operator": ">=", "value": 20},
//!  {"attribute": "filter", "operator": "in", "value": ["PASS", "LowQual"],
//!   "sample_ids": ["tumor"]}]
//! ```
//!
//! or from the compact form `quality_score>=20` on the command line. Every
//! filter is checked against its attribute's type before any record is read.
//! A record passes when it passes every filter that applies to its sample;
//! an absent numeric value never satisfies a comparison.

use log::info;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

use crate::{
    error::VarsetsError,
    io::InputFile,
    operations::{Partitioned, VariantSetEngine},
    reporting::{CommandOutput, Report},
    variants::{VariantCall, VariantCollection, VariantType},
};

/// The record attributes a filter may test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAttribute {
    QualityScore,
    Filter,
    AlternateAlleleFraction,
    ReferenceAlleleReadCount,
    AlternateAlleleReadCount,
    TotalReadCount,
    VariantSize,
    VariantType,
    Precise,
    #[serde(rename = "chromosome_1")]
    Chromosome1,
    #[serde(rename = "chromosome_2")]
    Chromosome2,
    SourceId,
    SampleId,
    VariantCallingMethod,
    SequencingPlatform,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttributeKind {
    Number,
    Text,
    Flag,
}

impl FilterAttribute {
    fn kind(&self) -> AttributeKind {
        match self {
            Self::QualityScore
            | Self::AlternateAlleleFraction
            | Self::ReferenceAlleleReadCount
            | Self::AlternateAlleleReadCount
            | Self::TotalReadCount
            | Self::VariantSize => AttributeKind::Number,
            Self::Precise => AttributeKind::Flag,
            _ => AttributeKind::Text,
        }
    }

    fn number(&self, call: &VariantCall) -> Option<f64> {
        let value = match self {
            Self::QualityScore => call.quality_score,
            Self::AlternateAlleleFraction => call.alternate_allele_fraction,
            Self::ReferenceAlleleReadCount => call.reference_allele_read_count.map(|v| v as f64),
            Self::AlternateAlleleReadCount => call.alternate_allele_read_count.map(|v| v as f64),
            Self::TotalReadCount => call.total_read_count.map(|v| v as f64),
            Self::VariantSize => call.variant_size.map(|v| v as f64),
            _ => None,
        };
        value.filter(|v| !v.is_nan())
    }

    fn text<'a>(&self, call: &'a VariantCall) -> &'a str {
        match self {
            Self::Filter => &call.filter,
            Self::VariantType => call.variant_type.as_str(),
            Self::Chromosome1 => &call.chromosome_1,
            Self::Chromosome2 => &call.chromosome_2,
            Self::SourceId => &call.source_id,
            Self::SampleId => &call.sample_id,
            Self::VariantCallingMethod => &call.variant_calling_method,
            Self::SequencingPlatform => &call.sequencing_platform,
            _ => "",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::QualityScore => "quality_score",
            Self::Filter => "filter",
            Self::AlternateAlleleFraction => "alternate_allele_fraction",
            Self::ReferenceAlleleReadCount => "reference_allele_read_count",
            Self::AlternateAlleleReadCount => "alternate_allele_read_count",
            Self::TotalReadCount => "total_read_count",
            Self::VariantSize => "variant_size",
            Self::VariantType => "variant_type",
            Self::Precise => "precise",
            Self::Chromosome1 => "chromosome_1",
            Self::Chromosome2 => "chromosome_2",
            Self::SourceId => "source_id",
            Self::SampleId => "sample_id",
            Self::VariantCallingMethod => "variant_calling_method",
            Self::SequencingPlatform => "sequencing_platform",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    fn is_ordering(&self) -> bool {
        matches!(
            self,
            FilterOperator::LessThan
                | FilterOperator::LessThanOrEqual
                | FilterOperator::GreaterThan
                | FilterOperator::GreaterThanOrEqual
        )
    }

    fn compare(&self, actual: f64, expected: f64) -> bool {
        match self {
            FilterOperator::LessThan => actual < expected,
            FilterOperator::LessThanOrEqual => actual <= expected,
            FilterOperator::GreaterThan => actual > expected,
            FilterOperator::GreaterThanOrEqual => actual >= expected,
            FilterOperator::Equal => actual == expected,
            FilterOperator::NotEqual => actual != expected,
            FilterOperator::In => false,
        }
    }
}

/// One filter, as written by the user.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantFilter {
    pub attribute: FilterAttribute,
    pub operator: FilterOperator,
    pub value: Value,
    /// Samples this filter applies to; empty means all samples.
    #[serde(default)]
    pub sample_ids: Vec<String>,
}

/// The operand of a checked filter.
#[derive(Clone, Debug, PartialEq)]
enum Condition {
    Number(FilterOperator, f64),
    NumberIn(Vec<f64>),
    Text { equal: bool, value: String },
    TextIn(Vec<String>),
    Flag { equal: bool, value: bool },
}

/// A [`VariantFilter`] whose value has been checked against its attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckedFilter {
    attribute: FilterAttribute,
    condition: Condition,
    sample_ids: Vec<String>,
}

impl VariantFilter {
    fn invalid(&self, reason: impl Into<String>) -> VarsetsError {
        VarsetsError::InvalidFilter(self.attribute.name().to_string(), reason.into())
    }

    /// Check that the operator and value suit the attribute.
    pub fn check(&self) -> Result<CheckedFilter, VarsetsError> {
        let kind = self.attribute.kind();
        let condition = match (kind, self.operator) {
            (AttributeKind::Number, FilterOperator::In) => {
                let values = self
                    .value
                    .as_array()
                    .ok_or_else(|| self.invalid("'in' requires a list of numbers"))?;
                let numbers = values
                    .iter()
                    .map(|v| v.as_f64().ok_or_else(|| self.invalid(format!("'{}' is not a number", v))))
                    .collect::<Result<Vec<_>, _>>()?;
                Condition::NumberIn(numbers)
            }
            (AttributeKind::Number, operator) => {
                let number = self
                    .value
                    .as_f64()
                    .ok_or_else(|| self.invalid(format!("'{}' is not a number", self.value)))?;
                Condition::Number(operator, number)
            }
            (AttributeKind::Text, FilterOperator::In) => {
                let values = self
                    .value
                    .as_array()
                    .ok_or_else(|| self.invalid("'in' requires a list of strings"))?;
                let strings = values
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .map(|s| self.normalize_text(s))
                            .ok_or_else(|| self.invalid(format!("'{}' is not a string", v)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Condition::TextIn(strings)
            }
            (AttributeKind::Text, operator) if operator.is_ordering() => {
                return Err(self.invalid("text attributes only support ==, != and in"))
            }
            (AttributeKind::Text, operator) => {
                let value = self
                    .value
                    .as_str()
                    .ok_or_else(|| self.invalid(format!("'{}' is not a string", self.value)))?;
                Condition::Text {
                    equal: operator == FilterOperator::Equal,
                    value: self.normalize_text(value),
                }
            }
            (AttributeKind::Flag, FilterOperator::Equal | FilterOperator::NotEqual) => {
                let value = self
                    .value
                    .as_bool()
                    .ok_or_else(|| self.invalid(format!("'{}' is not true or false", self.value)))?;
                Condition::Flag {
                    equal: self.operator == FilterOperator::Equal,
                    value,
                }
            }
            (AttributeKind::Flag, _) => {
                return Err(self.invalid("boolean attributes only support == and !="))
            }
        };
        Ok(CheckedFilter {
            attribute: self.attribute,
            condition,
            sample_ids: self.sample_ids.clone(),
        })
    }

    /// Variant types are compared by their canonical abbreviation.
    fn normalize_text(&self, value: &str) -> String {
        if self.attribute == FilterAttribute::VariantType {
            VariantType::from(value).as_str().to_string()
        } else {
            value.to_string()
        }
    }
}

impl FromStr for VariantFilter {
    type Err = VarsetsError;

    /// Parse the compact form `attribute<op>value`, e.g. `quality_score>=20`,
    /// `filter==PASS` or `variant_type in DEL,DUP`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const OPERATORS: [(&str, FilterOperator); 7] = [
            ("<=", FilterOperator::LessThanOrEqual),
            (">=", FilterOperator::GreaterThanOrEqual),
            ("==", FilterOperator::Equal),
            ("!=", FilterOperator::NotEqual),
            (" in ", FilterOperator::In),
            ("<", FilterOperator::LessThan),
            (">", FilterOperator::GreaterThan),
        ];
        let (symbol, operator, at) = OPERATORS
            .iter()
            .filter_map(|(symbol, operator)| s.find(symbol).map(|at| (*symbol, *operator, at)))
            .min_by_key(|(symbol, _, at)| (*at, std::cmp::Reverse(symbol.len())))
            .ok_or_else(|| {
                VarsetsError::InvalidFilter(s.to_string(), "no comparison operator".to_string())
            })?;
        let attribute = s[..at].trim();
        let raw_value = s[at + symbol.len()..].trim();
        let attribute: FilterAttribute = serde_json::from_value(Value::String(attribute.to_string()))
            .map_err(|_| VarsetsError::InvalidFilter(attribute.to_string(), "unknown attribute".to_string()))?;

        let scalar = |text: &str| -> Value {
            match attribute.kind() {
                AttributeKind::Number => text
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map_or_else(|| Value::String(text.to_string()), Value::Number),
                AttributeKind::Flag => text
                    .parse::<bool>()
                    .map_or_else(|_| Value::String(text.to_string()), Value::Bool),
                AttributeKind::Text => Value::String(text.to_string()),
            }
        };
        let value = if operator == FilterOperator::In {
            Value::Array(raw_value.split(',').map(|v| scalar(v.trim())).collect())
        } else {
            scalar(raw_value)
        };
        Ok(VariantFilter {
            attribute,
            operator,
            value,
            sample_ids: Vec::new(),
        })
    }
}

impl CheckedFilter {
    /// Whether this filter applies to `call`'s sample.
    pub fn applies_to(&self, call: &VariantCall) -> bool {
        self.sample_ids.is_empty() || self.sample_ids.iter().any(|s| *s == call.sample_id)
    }

    /// Whether `call` passes this filter. Calls of other samples pass.
    pub fn passes(&self, call: &VariantCall) -> bool {
        if !self.applies_to(call) {
            return true;
        }
        match &self.condition {
            Condition::Number(operator, expected) => self
                .attribute
                .number(call)
                .map_or(false, |actual| operator.compare(actual, *expected)),
            Condition::NumberIn(values) => self
                .attribute
                .number(call)
                .map_or(false, |actual| values.contains(&actual)),
            Condition::Text { equal, value } => {
                (self.attribute.text(call) == value.as_str()) == *equal
            }
            Condition::TextIn(values) => {
                let actual = self.attribute.text(call);
                values.iter().any(|v| v == actual)
            }
            Condition::Flag { equal, value } => (call.precise == *value) == *equal,
        }
    }
}

/// Read a JSON list of filters.
pub fn read_filters(filepath: impl AsRef<Path>) -> Result<Vec<VariantFilter>, VarsetsError> {
    let reader = InputFile::new(filepath.as_ref()).reader()?;
    Ok(serde_json::from_reader(reader)?)
}

impl VariantSetEngine {
    /// Split a collection into the records passing every filter and the rest.
    pub fn filter(
        &self,
        collection: &VariantCollection,
        filters: &[VariantFilter],
    ) -> Result<CommandOutput<Partitioned>, VarsetsError> {
        let checked = filters
            .iter()
            .map(VariantFilter::check)
            .collect::<Result<Vec<_>, _>>()?;

        let passes: Vec<bool> = self.pool().install(|| {
            collection
                .calls
                .par_iter()
                .map(|call| checked.iter().all(|f| f.passes(call)))
                .collect()
        });

        let mut result = Partitioned {
            kept: VariantCollection::new(collection.name.clone(), Vec::new()),
            rejected: VariantCollection::new(collection.name.clone(), Vec::new()),
        };
        for (call, pass) in collection.iter().zip(passes) {
            if pass {
                result.kept.push(call.clone());
            } else {
                result.rejected.push(call.clone());
            }
        }

        let mut report = Report::new();
        report.add_issue(format!(
            "{} of {} records passed {} filter(s)",
            result.kept.len(),
            collection.len(),
            filters.len()
        ));
        info!("filter kept {} of {} records", result.kept.len(), collection.len());
        Ok(CommandOutput::new(result, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::RunConfig;

    fn call(id: &str, sample: &str, quality: Option<f64>, filter: &str) -> VariantCall {
        let mut call = VariantCall::new(id, "chr1", 100, "chr1", 400, VariantType::Deletion);
        call.sample_id = sample.to_string();
        call.quality_score = quality;
        call.filter = filter.to_string();
        call
    }

    fn collection() -> VariantCollection {
        VariantCollection::new(
            "a",
            vec![
                call("v1", "tumor", Some(35.0), "PASS"),
                call("v2", "tumor", Some(10.0), "PASS"),
                call("v3", "normal", Some(5.0), "LowQual"),
                call("v4", "tumor", None, "LowQual"),
            ],
        )
    }

    fn kept_ids(filters: &[VariantFilter]) -> Vec<String> {
        let engine = VariantSetEngine::new(RunConfig::default()).unwrap();
        let result = engine.filter(&collection(), filters).unwrap().into_value();
        assert_eq!(result.kept.len() + result.rejected.len(), 4);
        result.kept.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_numeric_filter_and_absent_values() {
        let filter: VariantFilter = "quality_score>=10".parse().unwrap();
        assert_eq!(kept_ids(&[filter]), vec!["v1", "v2"]);
    }

    #[test]
    fn test_sample_scoped_filter() {
        let filters: Vec<VariantFilter> = serde_json::from_str(
            r#"[{"attribute": "quality_score", "operator": ">", "value": 20, "sample_ids": ["tumor"]}]"#,
        )
        .unwrap();
        assert_eq!(kept_ids(&filters), vec!["v1", "v3"]);
    }

    #[test]
    fn test_text_filters() {
        let pass: VariantFilter = "filter==PASS".parse().unwrap();
        assert_eq!(kept_ids(&[pass]), vec!["v1", "v2"]);
        let not_pass: VariantFilter = "filter != PASS".parse().unwrap();
        assert_eq!(kept_ids(&[not_pass]), vec!["v3", "v4"]);
        let types: VariantFilter = "variant_type in deletion,DUP".parse().unwrap();
        assert_eq!(kept_ids(&[types]).len(), 4);
    }

    #[test]
    fn test_combined_filters() {
        let filters = vec![
            "filter==PASS".parse().unwrap(),
            "quality_score<20".parse().unwrap(),
        ];
        assert_eq!(kept_ids(&filters), vec!["v2"]);
    }

    #[test]
    fn test_invalid_filters() {
        let ordering_on_text: VariantFilter = "filter>PASS".parse().unwrap();
        assert!(ordering_on_text.check().unwrap_err().is_configuration_error());
        let text_on_number: VariantFilter = "quality_score==high".parse().unwrap();
        assert!(text_on_number.check().is_err());
        assert!("depth>=3".parse::<VariantFilter>().is_err());
        assert!("quality_score 20".parse::<VariantFilter>().is_err());
        let unknown_key = serde_json::from_str::<VariantFilter>(
            r#"{"attribute": "filter", "operator": "==", "value": "PASS", "samples": []}"#,
        );
        assert!(unknown_key.is_err());
    }

    #[test]
    fn test_precise_flag() {
        let filter: VariantFilter = "precise==true".parse().unwrap();
        assert!(kept_ids(&[filter]).is_empty());
        let filter: VariantFilter = "precise<true".parse().unwrap();
        assert!(filter.check().is_err());
    }
}
