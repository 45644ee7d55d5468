//! Command functions behind the `varsets` command line tool.
//!
//! Each reads its input files, runs one operation on a [`VariantSetEngine`]
//! and writes the resulting records as TSV, to a file or standard output.

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::{
    criteria::RunConfig,
    error::VarsetsError,
    filters::VariantFilter,
    io::{read_bed_ranges, read_variant_collection, write_variant_calls, OutputFile},
    operations::{IntersectOutput, OverlapOptions, VariantSetEngine},
    reporting::{CommandOutput, Report},
    variants::VariantCollection,
};

fn read_collections(paths: &[PathBuf]) -> Result<Vec<VariantCollection>, VarsetsError> {
    paths
        .iter()
        .map(|path| read_variant_collection(path, None))
        .collect()
}

fn write_collection(
    collection: &VariantCollection,
    output: Option<&PathBuf>,
    report: &mut Report,
) -> Result<(), VarsetsError> {
    let written = write_variant_calls(collection.iter(), &OutputFile::from_option(output))?;
    if let Some(path) = output {
        info!("wrote {} records to {}", written, path.display());
    }
    report.add_issue(format!("{} records written", written));
    Ok(())
}

/// Remove from `target` all calls matching a call in any of the `queries`.
pub fn varsets_diff(
    target: &Path,
    queries: &[PathBuf],
    config: RunConfig,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, VarsetsError> {
    let engine = VariantSetEngine::new(config)?;
    let target = read_variant_collection(target, None)?;
    let queries = read_collections(queries)?;
    let query_refs: Vec<&VariantCollection> = queries.iter().collect();

    let (retained, mut report) = engine.diff(&target, &query_refs)?.into_parts();
    write_collection(&retained, output, &mut report)?;
    Ok(CommandOutput::new((), report))
}

/// Keep calls whose cluster spans enough of the `inputs`.
pub fn varsets_intersect(
    inputs: &[PathBuf],
    config: RunConfig,
    members: bool,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, VarsetsError> {
    let engine = VariantSetEngine::new(config)?;
    let collections = read_collections(inputs)?;
    let refs: Vec<&VariantCollection> = collections.iter().collect();
    let mode = if members {
        IntersectOutput::Members
    } else {
        IntersectOutput::Representatives
    };

    let (intersection, mut report) = engine.intersect(&refs, mode)?.into_parts();
    write_collection(&intersection, output, &mut report)?;
    Ok(CommandOutput::new((), report))
}

/// Merge the `inputs` into one call per cluster.
pub fn varsets_merge(
    inputs: &[PathBuf],
    config: RunConfig,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, VarsetsError> {
    let engine = VariantSetEngine::new(config)?;
    let collections = read_collections(inputs)?;
    let refs: Vec<&VariantCollection> = collections.iter().collect();

    let (merged, mut report) = engine.merge(&refs)?.into_parts();
    write_collection(&merged, output, &mut report)?;
    Ok(CommandOutput::new((), report))
}

/// Collapse matching calls within one file.
pub fn varsets_collapse(
    input: &Path,
    config: RunConfig,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<()>, VarsetsError> {
    let engine = VariantSetEngine::new(config)?;
    let collection = read_variant_collection(input, None)?;

    let (collapsed, mut report) = engine.collapse(&collection)?.into_parts();
    write_collection(&collapsed, output, &mut report)?;
    Ok(CommandOutput::new((), report))
}

/// Compare two files, writing `shared.tsv`, `<first>_only.tsv` and
/// `<second>_only.tsv` into `output_dir`. Inputs sharing a name are written
/// as `first_only.tsv` and `second_only.tsv`.
pub fn varsets_compare(
    first: &Path,
    second: &Path,
    config: RunConfig,
    output_dir: &Path,
) -> Result<CommandOutput<()>, VarsetsError> {
    let engine = VariantSetEngine::new(config)?;
    let first = read_variant_collection(first, None)?;
    let second = read_variant_collection(second, None)?;

    let (comparison, mut report) = engine.compare(&first, &second)?.into_parts();
    std::fs::create_dir_all(output_dir)?;
    let (first_name, second_name) = if first.name == second.name {
        warn!(
            "both inputs are named '{}', writing first_only.tsv and second_only.tsv",
            first.name
        );
        ("first".to_string(), "second".to_string())
    } else {
        (first.name.clone(), second.name.clone())
    };
    for (collection, filename) in [
        (&comparison.shared, "shared.tsv".to_string()),
        (&comparison.first_only, format!("{}_only.tsv", first_name)),
        (&comparison.second_only, format!("{}_only.tsv", second_name)),
    ] {
        let path = output_dir.join(filename);
        write_collection(collection, Some(&path), &mut report)?;
    }
    Ok(CommandOutput::new((), report))
}

/// Keep calls whose breakpoints fall within the ranges of a BED file.
pub fn varsets_overlap(
    input: &Path,
    bedfile: &Path,
    options: OverlapOptions,
    config: RunConfig,
    output: Option<&PathBuf>,
    rejected: Option<&PathBuf>,
) -> Result<CommandOutput<()>, VarsetsError> {
    let engine = VariantSetEngine::new(config)?;
    let collection = read_variant_collection(input, None)?;
    let ranges = read_bed_ranges(bedfile)?;

    let (result, mut report) = engine.overlap(&collection, &ranges, &options)?.into_parts();
    write_collection(&result.kept, output, &mut report)?;
    if let Some(path) = rejected {
        write_collection(&result.rejected, Some(path), &mut report)?;
    }
    Ok(CommandOutput::new((), report))
}

/// Keep calls passing every filter.
pub fn varsets_filter(
    input: &Path,
    filters: &[VariantFilter],
    config: RunConfig,
    output: Option<&PathBuf>,
    rejected: Option<&PathBuf>,
) -> Result<CommandOutput<()>, VarsetsError> {
    let engine = VariantSetEngine::new(config)?;
    for filter in filters {
        filter.check()?;
    }
    let collection = read_variant_collection(input, None)?;

    let (result, mut report) = engine.filter(&collection, filters)?.into_parts();
    write_collection(&result.kept, output, &mut report)?;
    if let Some(path) = rejected {
        write_collection(&result.rejected, Some(path), &mut report)?;
    }
    Ok(CommandOutput::new((), report))
}
