//! The flat, loosely-typed TSV row for a variant call.
//!
//! Rows are deserialized with every geometry field optional, then checked
//! by [`VariantCallRecord::validate()`] which reports a schema error naming
//! the collection, record and field if the call cannot be placed on the
//! genome.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Annotations, ConfidenceInterval, VariantCall, VariantType};
use crate::error::VarsetsError;
use crate::io::tsv::deserialize_option_generic;
use crate::{Position, MAX_POSITION};

const MISSING: &[&str] = &["", ".", "NA", "-1", "-1.0"];

fn deserialize_missing_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_option_generic(deserializer, MISSING)
}

fn deserialize_missing_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_option_generic(deserializer, MISSING)
}

fn deserialize_missing_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_option_generic(deserializer, MISSING)
}

fn deserialize_missing_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    let s = s.trim();
    if s.is_empty() || s == "." || s == "NA" {
        Ok(None)
    } else {
        Ok(Some(s.to_string()))
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    ))
}

/// One row of a variant call TSV file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantCallRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub sample_id: String,
    #[serde(default, deserialize_with = "deserialize_missing_string")]
    pub case_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_missing_string")]
    pub control_id: Option<String>,
    #[serde(default)]
    pub variant_calling_method: String,
    #[serde(default)]
    pub sequencing_platform: String,
    #[serde(default, deserialize_with = "deserialize_missing_string")]
    pub chromosome_1: Option<String>,
    #[serde(default, deserialize_with = "deserialize_missing_i64")]
    pub position_1: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_missing_string")]
    pub chromosome_2: Option<String>,
    #[serde(default, deserialize_with = "deserialize_missing_i64")]
    pub position_2: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_missing_string")]
    pub confidence_interval_1: Option<String>,
    #[serde(default, deserialize_with = "deserialize_missing_string")]
    pub confidence_interval_2: Option<String>,
    #[serde(default = "unknown_variant_type")]
    pub variant_type: VariantType,
    #[serde(default, deserialize_with = "deserialize_missing_i64")]
    pub variant_size: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub precise: bool,
    #[serde(default, deserialize_with = "deserialize_missing_u64")]
    pub reference_allele_read_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_missing_u64")]
    pub alternate_allele_read_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_missing_u64")]
    pub total_read_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_missing_f64")]
    pub alternate_allele_fraction: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_missing_f64")]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub filter: String,
    #[serde(default, deserialize_with = "deserialize_missing_string")]
    pub annotations: Option<String>,
    #[serde(default, deserialize_with = "deserialize_missing_u64")]
    pub cluster_id: Option<u64>,
}

fn unknown_variant_type() -> VariantType {
    VariantType::Other
}

impl VariantCallRecord {
    /// Check that this row can be placed on the genome and convert it into a
    /// [`VariantCall`].
    ///
    /// # Arguments
    ///
    /// * `collection` - the name of the collection this row belongs to, used in errors.
    /// * `row` - the 0-indexed row number, used in errors when the row has no `id`.
    ///
    /// A missing second locus defaults to the first chromosome, and to the first
    /// position plus the variant size for span-sized types (deletions, duplications,
    /// inversions).
    pub fn validate(self, collection: &str, row: usize) -> Result<VariantCall, VarsetsError> {
        let record = if self.id.is_empty() {
            format!("row {}", row + 1)
        } else {
            self.id.clone()
        };
        let missing = |field: &'static str| VarsetsError::MissingField {
            collection: collection.to_string(),
            record: record.clone(),
            field,
        };
        let invalid = |field: &'static str, reason: String| VarsetsError::InvalidField {
            collection: collection.to_string(),
            record: record.clone(),
            field,
            reason,
        };
        let check_position = |field: &'static str, value: i64| -> Result<Position, VarsetsError> {
            if value < 0 || value > MAX_POSITION as i64 {
                return Err(invalid(
                    field,
                    format!("position {} is outside [0, {}]", value, MAX_POSITION),
                ));
            }
            Ok(value as Position)
        };

        let chromosome_1 = self.chromosome_1.ok_or_else(|| missing("chromosome_1"))?;
        let position_1 = check_position(
            "position_1",
            self.position_1.ok_or_else(|| missing("position_1"))?,
        )?;
        let chromosome_2 = self.chromosome_2.unwrap_or_else(|| chromosome_1.clone());
        let position_2 = match self.position_2 {
            Some(position) => check_position("position_2", position)?,
            None => match self.variant_size {
                Some(size) if self.variant_type.has_span_size() && chromosome_1 == chromosome_2 => {
                    check_position("position_2", position_1 as i64 + size.abs())?
                }
                _ => position_1,
            },
        };

        let confidence_interval_1 = self
            .confidence_interval_1
            .as_deref()
            .map(parse_confidence_interval)
            .transpose()
            .map_err(|reason| invalid("confidence_interval_1", reason))?;
        let confidence_interval_2 = self
            .confidence_interval_2
            .as_deref()
            .map(parse_confidence_interval)
            .transpose()
            .map_err(|reason| invalid("confidence_interval_2", reason))?;

        let annotations = match self.annotations.as_deref() {
            None => Annotations::new(),
            Some(json) => serde_json::from_str::<Annotations>(json)
                .map_err(|e| invalid("annotations", e.to_string()))?,
        };

        Ok(VariantCall {
            id: self.id,
            source_id: self.source_id,
            sample_id: self.sample_id,
            case_id: self.case_id,
            control_id: self.control_id,
            variant_calling_method: self.variant_calling_method,
            sequencing_platform: self.sequencing_platform,
            chromosome_1,
            position_1,
            chromosome_2,
            position_2,
            confidence_interval_1,
            confidence_interval_2,
            variant_type: self.variant_type,
            variant_size: self.variant_size,
            precise: self.precise,
            reference_allele_read_count: self.reference_allele_read_count,
            alternate_allele_read_count: self.alternate_allele_read_count,
            total_read_count: self.total_read_count,
            alternate_allele_fraction: self.alternate_allele_fraction.filter(|v| !v.is_nan()),
            quality_score: self.quality_score.filter(|v| !v.is_nan()),
            filter: self.filter,
            annotations,
            cluster_id: self.cluster_id,
        })
    }
}

/// Parse a `lower,upper` confidence interval.
fn parse_confidence_interval(value: &str) -> Result<ConfidenceInterval, String> {
    let (lower, upper) = value
        .split_once(',')
        .ok_or_else(|| format!("expected 'lower,upper', got '{}'", value))?;
    let lower = lower.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let upper = upper.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(ConfidenceInterval::new(lower, upper))
}

impl From<&VariantCall> for VariantCallRecord {
    fn from(call: &VariantCall) -> Self {
        let annotations = if call.annotations.is_empty() {
            None
        } else {
            // A map of strings and finite numbers always serializes.
            serde_json::to_string(&call.annotations).ok()
        };
        Self {
            id: call.id.clone(),
            source_id: call.source_id.clone(),
            sample_id: call.sample_id.clone(),
            case_id: call.case_id.clone(),
            control_id: call.control_id.clone(),
            variant_calling_method: call.variant_calling_method.clone(),
            sequencing_platform: call.sequencing_platform.clone(),
            chromosome_1: Some(call.chromosome_1.clone()),
            position_1: Some(call.position_1 as i64),
            chromosome_2: Some(call.chromosome_2.clone()),
            position_2: Some(call.position_2 as i64),
            confidence_interval_1: call.confidence_interval_1.map(|ci| ci.to_string()),
            confidence_interval_2: call.confidence_interval_2.map(|ci| ci.to_string()),
            variant_type: call.variant_type,
            variant_size: call.variant_size,
            precise: call.precise,
            reference_allele_read_count: call.reference_allele_read_count,
            alternate_allele_read_count: call.alternate_allele_read_count,
            total_read_count: call.total_read_count,
            alternate_allele_fraction: call.alternate_allele_fraction,
            quality_score: call.quality_score,
            filter: call.filter.clone(),
            annotations,
            cluster_id: call.cluster_id,
        }
    }
}
