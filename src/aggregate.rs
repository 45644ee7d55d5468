//! Reducing a cluster to one representative record.
//!
//! All choices are resolved by the order of `members`, which the caller
//! supplies in the fixed total order:
//!
//! - geometry (chromosomes, positions, confidence intervals, type, id) comes from
//!   the first precise member, or the first member if none is precise;
//! - `variant_size` is recomputed from that geometry for span-sized types;
//! - read counts are summed over the members that report them;
//! - `quality_score` is the maximum reported;
//! - `alternate_allele_fraction` is summed alternate reads over summed total reads
//!   when both are known, otherwise the maximum reported;
//! - provenance fields become `;`-separated lists of the distinct values;
//! - `filter` is `PASS` if any member passed, otherwise the most common value;
//! - annotations are unioned by key, the first member carrying a key wins.
//!
//! A single-member cluster reduces to an unchanged copy of its member.

use indexmap::{IndexMap, IndexSet};

use crate::{
    error::VarsetsError,
    variants::{VariantCall, LIST_DELIMITER},
};

/// Join the distinct values of a provenance field, in first-seen order.
fn distinct_list<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let distinct: IndexSet<&str> = values.flat_map(VariantCall::split_list).collect();
    let delimiter = LIST_DELIMITER.to_string();
    distinct.into_iter().collect::<Vec<_>>().join(&delimiter)
}

fn sum_reported(values: impl Iterator<Item = Option<u64>>) -> Option<u64> {
    values.flatten().reduce(|total, v| total.saturating_add(v))
}

fn max_reported(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values
        .flatten()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

fn merged_filter(members: &[&VariantCall]) -> String {
    if members.iter().any(|m| m.is_pass()) {
        return "PASS".to_string();
    }
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for member in members {
        if !member.filter.is_empty() {
            *counts.entry(member.filter.as_str()).or_insert(0) += 1;
        }
    }
    // ties go to the value seen first in the fixed order
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string()).unwrap_or_default()
}

/// The size implied by a geometry: the span between positions for
/// intrachromosomal deletions, duplications and inversions (keeping the sign
/// convention of the reported size), the reported size otherwise.
pub fn recompute_size(call: &VariantCall) -> Option<i64> {
    if call.variant_type.has_span_size() && !call.is_interchromosomal() {
        let span = call.position_1.abs_diff(call.position_2) as i64;
        match call.variant_size {
            Some(size) if size < 0 => Some(-span),
            _ => Some(span),
        }
    } else {
        call.variant_size
    }
}

/// Reduce the members of one cluster, given in the fixed total order, to a
/// single representative record.
pub fn aggregate(members: &[&VariantCall]) -> Result<VariantCall, VarsetsError> {
    let first = members.first().ok_or_else(|| {
        VarsetsError::InternalInvariantViolation("cannot aggregate an empty cluster".to_string())
    })?;
    if members.len() == 1 {
        return Ok((*first).clone());
    }

    let geometry = members.iter().find(|m| m.precise).unwrap_or(first);
    let mut merged = (*geometry).clone();
    merged.variant_size = recompute_size(geometry);

    merged.source_id = distinct_list(members.iter().map(|m| m.source_id.as_str()));
    merged.sample_id = distinct_list(members.iter().map(|m| m.sample_id.as_str()));
    merged.variant_calling_method =
        distinct_list(members.iter().map(|m| m.variant_calling_method.as_str()));
    merged.sequencing_platform =
        distinct_list(members.iter().map(|m| m.sequencing_platform.as_str()));

    merged.reference_allele_read_count =
        sum_reported(members.iter().map(|m| m.reference_allele_read_count));
    merged.alternate_allele_read_count =
        sum_reported(members.iter().map(|m| m.alternate_allele_read_count));
    merged.total_read_count = sum_reported(members.iter().map(|m| m.total_read_count));
    merged.quality_score = max_reported(members.iter().map(|m| m.quality_score));
    merged.alternate_allele_fraction =
        match (merged.alternate_allele_read_count, merged.total_read_count) {
            (Some(alt), Some(total)) if total > 0 => Some(alt as f64 / total as f64),
            _ => max_reported(members.iter().map(|m| m.alternate_allele_fraction)),
        };
    merged.filter = merged_filter(members);
    merged.cluster_id = None;

    merged.annotations.clear();
    for member in members {
        for (key, value) in &member.annotations {
            merged
                .annotations
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::{AnnotationValue, VariantType};

    fn call(id: &str, source: &str, position: u32) -> VariantCall {
        let mut call = VariantCall::new(id, "chr1", position, "chr1", position + 500, VariantType::Deletion);
        call.source_id = source.to_string();
        call.sample_id = "S1".to_string();
        call.variant_size = Some(-500);
        call
    }

    #[test]
    fn test_empty_cluster_is_invariant_violation() {
        assert!(matches!(
            aggregate(&[]),
            Err(VarsetsError::InternalInvariantViolation(_))
        ));
    }

    #[test]
    fn test_singleton_is_unchanged() {
        let mut a = call("a", "x", 100);
        a.alternate_allele_fraction = Some(0.3);
        assert_eq!(aggregate(&[&a]).unwrap(), a);
    }

    #[test]
    fn test_geometry_prefers_precise() {
        let a = call("a", "x", 100);
        let mut b = call("b", "y", 104);
        b.position_2 = 700;
        b.precise = true;
        let merged = aggregate(&[&a, &b]).unwrap();
        assert_eq!(merged.id, "b");
        assert_eq!(merged.position_1, 104);
        assert_eq!(merged.variant_size, Some(-596));
        assert_eq!(merged.source_id, "x;y");
        assert_eq!(merged.sample_id, "S1");

        let merged = aggregate(&[&a, &call("c", "y", 102)]).unwrap();
        assert_eq!(merged.id, "a");
    }

    #[test]
    fn test_evidence() {
        let mut a = call("a", "x", 100);
        a.alternate_allele_read_count = Some(5);
        a.total_read_count = Some(20);
        a.quality_score = Some(30.0);
        let mut b = call("b", "y", 105);
        b.alternate_allele_read_count = Some(7);
        b.total_read_count = Some(20);
        b.quality_score = Some(f64::NAN);
        let c = call("c", "z", 103);

        let merged = aggregate(&[&a, &b, &c]).unwrap();
        assert_eq!(merged.alternate_allele_read_count, Some(12));
        assert_eq!(merged.total_read_count, Some(40));
        assert_eq!(merged.reference_allele_read_count, None);
        assert_eq!(merged.quality_score, Some(30.0));
        assert_eq!(merged.alternate_allele_fraction, Some(0.3));
    }

    #[test]
    fn test_filter() {
        let mut a = call("a", "x", 100);
        let mut b = call("b", "y", 100);
        let mut c = call("c", "z", 100);
        a.filter = "LowQual".to_string();
        b.filter = "StrandBias".to_string();
        c.filter = "StrandBias".to_string();
        assert_eq!(aggregate(&[&a, &b, &c]).unwrap().filter, "StrandBias");
        c.filter = "LowQual".to_string();
        b.filter = "PASS".to_string();
        assert_eq!(aggregate(&[&a, &b, &c]).unwrap().filter, "PASS");
        b.filter = "StrandBias".to_string();
        c.filter = String::new();
        // tie resolved by the first member
        assert_eq!(aggregate(&[&a, &b, &c]).unwrap().filter, "LowQual");
    }

    #[test]
    fn test_annotations_union() {
        let mut a = call("a", "x", 100);
        let mut b = call("b", "y", 100);
        a.annotations.insert("gene".to_string(), AnnotationValue::Text("TP53".to_string()));
        b.annotations.insert("gene".to_string(), AnnotationValue::Text("MDM2".to_string()));
        b.annotations.insert("score".to_string(), AnnotationValue::Number(2.into()));
        let merged = aggregate(&[&a, &b]).unwrap();
        assert_eq!(merged.annotations.len(), 2);
        assert_eq!(
            merged.annotations.get("gene"),
            Some(&AnnotationValue::Text("TP53".to_string()))
        );
    }

    #[test]
    fn test_annotations_first_member_wins_over_geometry() {
        let mut a = call("a", "x", 100);
        let mut b = call("b", "y", 104);
        b.precise = true;
        a.annotations.insert("gene".to_string(), AnnotationValue::Text("FIRST".to_string()));
        b.annotations.insert("gene".to_string(), AnnotationValue::Text("SECOND".to_string()));
        let merged = aggregate(&[&a, &b]).unwrap();
        assert_eq!(merged.id, "b");
        assert_eq!(
            merged.annotations.get("gene"),
            Some(&AnnotationValue::Text("FIRST".to_string()))
        );
    }

    #[test]
    fn test_aggregate_is_stable_on_merged_provenance() {
        let a = call("a", "x;y", 100);
        let b = call("b", "y", 100);
        assert_eq!(aggregate(&[&a, &b]).unwrap().source_id, "x;y");
    }
}
