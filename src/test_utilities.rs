//! Test cases and test utility functions.
//!

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tempfile::NamedTempFile;

use crate::{
    io::{write_variant_calls, OutputFile},
    variants::{VariantCall, VariantCollection, VariantType},
    Position,
};

// Stochastic test collection defaults
//
// number of chromosome sequences
pub const NCHROM: usize = 5;

// positions are drawn from [1, MAX_RANDOM_POSITION]
pub const MAX_RANDOM_POSITION: Position = 2_000_000;

// structural variant sizes
pub const MIN_SV_SIZE: Position = 50;
pub const MAX_SV_SIZE: Position = 10_000;

const RANDOM_TYPES: [VariantType; 7] = [
    VariantType::Snv,
    VariantType::Insertion,
    VariantType::Deletion,
    VariantType::Duplication,
    VariantType::Inversion,
    VariantType::Translocation,
    VariantType::Breakend,
];

const SAMPLES: [&str; 2] = ["tumor", "normal"];

/// A deletion of `size` basepairs starting at `position`.
pub fn deletion(id: &str, chromosome: &str, position: Position, size: Position) -> VariantCall {
    let mut call = VariantCall::new(
        id,
        chromosome,
        position,
        chromosome,
        position + size,
        VariantType::Deletion,
    );
    call.variant_size = Some(size as i64);
    call
}

/// A translocation joining two loci.
pub fn translocation(
    id: &str,
    chromosome_1: &str,
    position_1: Position,
    chromosome_2: &str,
    position_2: Position,
) -> VariantCall {
    VariantCall::new(
        id,
        chromosome_1,
        position_1,
        chromosome_2,
        position_2,
        VariantType::Translocation,
    )
}

/// Sample a random chromosome
pub fn random_chrom(rng: &mut impl Rng) -> String {
    format!("chr{}", rng.gen_range(1..NCHROM + 1))
}

/// Build one random variant call with plausible geometry and evidence.
pub fn random_variant_call(rng: &mut impl Rng, id: String, source_id: &str) -> VariantCall {
    let variant_type = *RANDOM_TYPES.choose(rng).unwrap_or(&VariantType::Deletion);
    let chromosome_1 = random_chrom(rng);
    let position_1 = rng.gen_range(1..=MAX_RANDOM_POSITION);
    let size = rng.gen_range(MIN_SV_SIZE..=MAX_SV_SIZE);
    let (chromosome_2, position_2) = match variant_type {
        VariantType::Snv | VariantType::Insertion => (chromosome_1.clone(), position_1),
        VariantType::Translocation | VariantType::Breakend => {
            (random_chrom(rng), rng.gen_range(1..=MAX_RANDOM_POSITION))
        }
        _ => (chromosome_1.clone(), position_1 + size),
    };
    let mut call = VariantCall::new(
        id,
        chromosome_1,
        position_1,
        chromosome_2,
        position_2,
        variant_type,
    );
    call.source_id = source_id.to_string();
    call.sample_id = SAMPLES.choose(rng).unwrap_or(&"tumor").to_string();
    call.variant_calling_method = source_id.to_string();
    call.precise = rng.gen_bool(0.5);
    if variant_type != VariantType::Snv {
        call.variant_size = Some(size as i64);
    }
    let total = rng.gen_range(10..100);
    let alt = rng.gen_range(0..=total);
    call.total_read_count = Some(total);
    call.alternate_allele_read_count = Some(alt);
    call.reference_allele_read_count = Some(total - alt);
    call.alternate_allele_fraction = Some(alt as f64 / total as f64);
    call.quality_score = Some(rng.gen_range(0.0..60.0));
    call.filter = if rng.gen_bool(0.7) { "PASS" } else { "LowQual" }.to_string();
    call
}

/// Build a random [`VariantCollection`] of `n` calls whose `source_id` is
/// `name`. The same `name` and `n` always give the same collection.
pub fn random_collection(name: &str, n: usize) -> VariantCollection {
    let seed = name.bytes().fold(n as u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    let mut rng = StdRng::seed_from_u64(seed);
    let calls = (0..n)
        .map(|i| random_variant_call(&mut rng, format!("{}_{}", name, i), name))
        .collect();
    VariantCollection::new(name, calls)
}

/// Write calls to a temporary TSV file.
pub fn temp_variant_file(calls: &[VariantCall]) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".tsv")
        .tempfile()
        .expect("could not create temporary file");
    write_variant_calls(calls, &OutputFile::new(file.path()))
        .expect("could not write temporary variant file");
    file
}
