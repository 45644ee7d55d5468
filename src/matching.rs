//! The pairwise match predicate.
//!
//! Two calls match when (optionally) their type classes agree, when their
//! breakpoints pair up on the same chromosomes within the distance window,
//! and when (optionally) their sizes are similar enough. Translocation-style
//! calls may pair their breakpoints in either orientation.
//!
//! Every test below is symmetric in its two arguments, so
//! `matches(a, b) == matches(b, a)` for any criteria.

use crate::{
    criteria::MatchCriteria,
    traits::VariantMatcher,
    variants::{VariantCall, VariantType},
    Position,
};

impl MatchCriteria {
    /// Whether both calls agree on type class (and, for translocation-style
    /// calls, on their unordered pair of chromosomes).
    fn types_agree(&self, a: &VariantCall, b: &VariantCall) -> bool {
        if a.variant_type.matching_class() != b.variant_type.matching_class() {
            return false;
        }
        if a.variant_type.is_breakend_kind() {
            let pair_a = sorted_pair(&a.chromosome_1, &a.chromosome_2);
            let pair_b = sorted_pair(&b.chromosome_1, &b.chromosome_2);
            return pair_a == pair_b;
        }
        true
    }

    /// Whether insertion and deletion sizes are similar enough. Calls of
    /// other types, or with an unknown size, always pass.
    fn sizes_agree(&self, a: &VariantCall, b: &VariantCall) -> bool {
        let threshold = match (a.variant_type, b.variant_type) {
            (VariantType::Insertion, VariantType::Insertion) => self.min_ins_size_overlap,
            (VariantType::Deletion, VariantType::Deletion) => self.min_del_size_overlap,
            _ => return true,
        };
        if threshold <= 0.0 {
            return true;
        }
        match (a.variant_size, b.variant_size) {
            (Some(size_a), Some(size_b)) => {
                let (size_a, size_b) = (size_a.unsigned_abs(), size_b.unsigned_abs());
                let (min, max) = (size_a.min(size_b), size_a.max(size_b));
                max == 0 || (min as f64 / max as f64) >= threshold
            }
            _ => true,
        }
    }

    /// The window for this pair.
    fn distance_for(&self, a: &VariantCall, b: &VariantCall) -> Position {
        if self.exact_small_variant_positions
            && (a.variant_type.is_small() || b.variant_type.is_small())
        {
            0
        } else {
            self.max_neighbor_distance
        }
    }

    /// Whether both breakpoints must match for this pair.
    fn requires_both(&self, a: &VariantCall, b: &VariantCall) -> bool {
        let interchromosomal_breakend = |call: &VariantCall| {
            call.variant_type.is_breakend_kind() && call.is_interchromosomal()
        };
        self.match_all_breakpoints
            || (self.match_both_positions
                && (interchromosomal_breakend(a) || interchromosomal_breakend(b)))
    }

    /// The breakpoint test: the direct pairing, plus the swapped pairing
    /// when either call is translocation-style.
    fn breakpoints_agree(&self, a: &VariantCall, b: &VariantCall) -> bool {
        let distance = self.distance_for(a, b);
        let both = self.requires_both(a, b);
        let (a1, a2) = (a.breakpoint_1(), a.breakpoint_2());
        let (b1, b2) = (b.breakpoint_1(), b.breakpoint_2());

        let first_near = a1.is_near(&b1, distance);
        let direct = if both {
            first_near && a2.is_near(&b2, distance)
        } else {
            first_near
        };
        if direct {
            return true;
        }

        if a.variant_type.is_breakend_kind() || b.variant_type.is_breakend_kind() {
            let crossed_1 = a1.is_near(&b2, distance);
            let crossed_2 = a2.is_near(&b1, distance);
            return if both {
                crossed_1 && crossed_2
            } else {
                crossed_1 || crossed_2
            };
        }
        false
    }

    /// Decide whether `a` and `b` represent the same event.
    pub fn is_match(&self, a: &VariantCall, b: &VariantCall) -> bool {
        if self.match_variant_types && !(self.types_agree(a, b) && self.sizes_agree(a, b)) {
            return false;
        }
        self.breakpoints_agree(a, b)
    }
}

fn sorted_pair<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

impl VariantMatcher for MatchCriteria {
    fn matches(&self, a: &VariantCall, b: &VariantCall) -> bool {
        self.is_match(a, b)
    }

    fn search_distance(&self) -> Position {
        self.max_neighbor_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deletion(id: &str, position: Position, size: Position) -> VariantCall {
        let mut call = VariantCall::new(id, "chr1", position, "chr1", position + size, VariantType::Deletion);
        call.variant_size = Some(size as i64);
        call
    }

    fn translocation(id: &str, chrom_1: &str, pos_1: Position, chrom_2: &str, pos_2: Position) -> VariantCall {
        VariantCall::new(id, chrom_1, pos_1, chrom_2, pos_2, VariantType::Translocation)
    }

    fn criteria(distance: Position) -> MatchCriteria {
        MatchCriteria {
            max_neighbor_distance: distance,
            ..Default::default()
        }
    }

    fn assert_symmetric(criteria: &MatchCriteria, a: &VariantCall, b: &VariantCall) -> bool {
        let forward = criteria.is_match(a, b);
        assert_eq!(forward, criteria.is_match(b, a), "asymmetric on {} / {}", a.id, b.id);
        forward
    }

    #[test]
    fn test_distance_boundary() {
        let c = criteria(10);
        let a = deletion("a", 100, 500);
        assert!(assert_symmetric(&c, &a, &deletion("b", 110, 500)));
        assert!(!assert_symmetric(&c, &a, &deletion("b", 111, 500)));
    }

    #[test]
    fn test_zero_distance_is_exact() {
        let c = criteria(0);
        let a = deletion("a", 100, 500);
        assert!(c.is_match(&a, &deletion("b", 100, 500)));
        assert!(!c.is_match(&a, &deletion("b", 101, 500)));
    }

    #[test]
    fn test_variant_types() {
        let a = deletion("a", 100, 500);
        let mut b = deletion("b", 105, 500);
        b.variant_type = VariantType::Duplication;
        assert!(!assert_symmetric(&criteria(10), &a, &b));

        let relaxed = MatchCriteria {
            match_variant_types: false,
            ..criteria(10)
        };
        assert!(assert_symmetric(&relaxed, &a, &b));
    }

    #[test]
    fn test_all_breakpoints() {
        let a = deletion("a", 100, 500);
        let b = deletion("b", 105, 900);
        assert!(!assert_symmetric(&criteria(10), &a, &b));
        let one_sided = MatchCriteria {
            match_all_breakpoints: false,
            ..criteria(10)
        };
        assert!(assert_symmetric(&one_sided, &a, &b));
    }

    #[test]
    fn test_translocation_mate_chromosomes() {
        let a = translocation("a", "chr1", 1000, "chr5", 2000);
        let b = translocation("b", "chr1", 1005, "chr7", 2000);
        let strict = MatchCriteria {
            match_variant_types: false,
            ..criteria(10)
        };
        assert!(!assert_symmetric(&strict, &a, &b));
        let one_sided = MatchCriteria {
            match_all_breakpoints: false,
            ..strict.clone()
        };
        assert!(assert_symmetric(&one_sided, &a, &b));

        // with type matching, mate chromosomes must agree
        let typed_one_sided = MatchCriteria {
            match_all_breakpoints: false,
            ..criteria(10)
        };
        assert!(!assert_symmetric(&typed_one_sided, &a, &b));
    }

    #[test]
    fn test_swapped_breakend_orientation() {
        let a = translocation("a", "chr1", 1000, "chr5", 2000);
        let mut b = translocation("b", "chr5", 2003, "chr1", 998);
        b.variant_type = VariantType::Breakend;
        assert!(assert_symmetric(&criteria(10), &a, &b));

        // deletions never pair crossed
        let d1 = deletion("d1", 100, 100);
        let d2 = VariantCall::new("d2", "chr1", 200, "chr1", 100, VariantType::Deletion);
        assert!(!assert_symmetric(&criteria(5), &d1, &d2));
    }

    #[test]
    fn test_swapped_one_sided_is_symmetric() {
        let one_sided = MatchCriteria {
            match_all_breakpoints: false,
            match_variant_types: false,
            ..criteria(10)
        };
        let a = translocation("a", "chr1", 1000, "chr5", 2000);
        let b = translocation("b", "chr5", 9000, "chr1", 1002);
        assert!(assert_symmetric(&one_sided, &a, &b));
        let c = translocation("c", "chr5", 2001, "chr7", 5);
        assert!(assert_symmetric(&one_sided, &a, &c));
    }

    #[test]
    fn test_match_both_positions_scoped_to_breakends() {
        let c = MatchCriteria {
            match_all_breakpoints: false,
            match_both_positions: true,
            match_variant_types: false,
            ..criteria(10)
        };
        let a = translocation("a", "chr1", 1000, "chr5", 2000);
        let b = translocation("b", "chr1", 1000, "chr7", 2000);
        assert!(!assert_symmetric(&c, &a, &b));
        // deletions still match on breakpoint-1 alone
        assert!(assert_symmetric(&c, &deletion("d1", 100, 100), &deletion("d2", 100, 900)));
    }

    #[test]
    fn test_size_overlap() {
        let c = MatchCriteria {
            min_del_size_overlap: 0.8,
            ..criteria(10)
        };
        let a = deletion("a", 100, 1000);
        let mut b = deletion("b", 100, 1000);
        b.variant_size = Some(-850);
        assert!(assert_symmetric(&c, &a, &b));
        b.variant_size = Some(700);
        assert!(!assert_symmetric(&c, &a, &b));
        b.variant_size = None;
        assert!(assert_symmetric(&c, &a, &b));
    }

    #[test]
    fn test_exact_small_variant_positions() {
        let c = MatchCriteria {
            exact_small_variant_positions: true,
            ..criteria(10)
        };
        let a = VariantCall::new("a", "chr1", 100, "chr1", 100, VariantType::Snv);
        let b = VariantCall::new("b", "chr1", 101, "chr1", 101, VariantType::Snv);
        assert!(!assert_symmetric(&c, &a, &b));
        assert!(assert_symmetric(&criteria(10), &a, &b));
    }

    #[test]
    fn test_symmetric_on_random_collections() {
        use crate::test_utilities::random_collection;

        let x = random_collection("x", 400);
        let y = random_collection("y", 400);
        let all = criteria(20_000);
        let combinations = [
            all.clone(),
            MatchCriteria {
                match_all_breakpoints: false,
                match_variant_types: false,
                ..all.clone()
            },
            MatchCriteria {
                match_all_breakpoints: false,
                match_both_positions: true,
                ..all.clone()
            },
            MatchCriteria {
                exact_small_variant_positions: true,
                ..all.clone()
            },
            MatchCriteria {
                min_ins_size_overlap: 0.5,
                min_del_size_overlap: 0.8,
                ..all.clone()
            },
        ];
        for criteria in &combinations {
            let mut matches = 0;
            for a in x.iter() {
                for b in y.iter() {
                    if assert_symmetric(criteria, a, b) {
                        matches += 1;
                    }
                }
            }
            assert!(matches > 0, "no matches under {:?}", criteria);
        }
    }
}
