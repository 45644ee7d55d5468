//! End-to-end tests of the `varsets` command line tool.

use std::{io::Write, path::PathBuf, process::Command};

use tempfile::{tempdir, NamedTempFile};
use varsets::{
    io::{tsv::collection_name, write_variant_calls, OutputFile},
    prelude::*,
    test_utilities::{deletion, temp_variant_file, translocation},
};

fn varsets_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_varsets"))
}

fn with_source(mut calls: Vec<VariantCall>, source_id: &str) -> Vec<VariantCall> {
    for call in calls.iter_mut() {
        call.source_id = source_id.to_string();
    }
    calls
}

fn caller_a() -> Vec<VariantCall> {
    let mut low = deletion("a2", "chr2", 50_000, 800);
    low.quality_score = Some(5.0);
    low.filter = "LowQual".to_string();
    let mut high = deletion("a1", "chr1", 10_000, 2_000);
    high.quality_score = Some(45.0);
    with_source(
        vec![
            high,
            low,
            translocation("a3", "chr3", 7_000, "chr9", 120_000),
        ],
        "caller_a",
    )
}

fn caller_b() -> Vec<VariantCall> {
    with_source(
        vec![
            deletion("b1", "chr1", 10_004, 2_000),
            deletion("b2", "chr4", 1_000, 300),
            translocation("b3", "chr9", 120_006, "chr3", 7_003),
        ],
        "caller_b",
    )
}

fn ids(path: &std::path::Path) -> Vec<String> {
    read_variant_collection(path, None)
        .expect("could not read output")
        .iter()
        .map(|call| call.id.clone())
        .collect()
}

#[test]
fn test_merge() {
    let a = temp_variant_file(&caller_a());
    let b = temp_variant_file(&caller_b());
    let output = NamedTempFile::new().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("merge")
        .arg(a.path())
        .arg(b.path())
        .arg("--max-neighbor-distance")
        .arg("10")
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets merge failed");
    assert!(result.status.success(), "{:?}", result);

    let merged = read_variant_collection(output.path(), None).unwrap();
    // a1/b1 and the two translocations merge, a2 and b2 stay apart
    assert_eq!(merged.len(), 4);
    let sources: Vec<&str> = merged.iter().map(|call| call.source_id.as_str()).collect();
    assert!(sources.iter().any(|source| source.contains(';')));
}

#[test]
fn test_diff_to_stdout() {
    let a = temp_variant_file(&caller_a());
    let b = temp_variant_file(&caller_b());

    let result = Command::new(varsets_binary_path())
        .arg("diff")
        .arg(a.path())
        .arg(b.path())
        .output()
        .expect("varsets diff failed");
    assert!(result.status.success(), "{:?}", result);

    let mut output = NamedTempFile::new().unwrap();
    output.write_all(&result.stdout).unwrap();
    assert_eq!(ids(output.path()), vec!["a2"]);
}

#[test]
fn test_intersect_members() {
    let a = temp_variant_file(&caller_a());
    let b = temp_variant_file(&caller_b());
    let output = NamedTempFile::new().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("intersect")
        .arg(a.path())
        .arg(b.path())
        .arg("--members")
        .arg("--threads")
        .arg("2")
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets intersect failed");
    assert!(result.status.success(), "{:?}", result);
    assert_eq!(ids(output.path()), vec!["a1", "a3", "b1", "b3"]);
}

#[test]
fn test_collapse() {
    let mut calls = caller_a();
    calls.push(deletion("a4", "chr1", 10_002, 2_000));
    let a = temp_variant_file(&calls);
    let output = NamedTempFile::new().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("collapse")
        .arg(a.path())
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets collapse failed");
    assert!(result.status.success(), "{:?}", result);
    assert_eq!(ids(output.path()).len(), 3);
}

#[test]
fn test_compare() {
    let a = temp_variant_file(&caller_a());
    let b = temp_variant_file(&caller_b());
    let dir = tempdir().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("compare")
        .arg(a.path())
        .arg(b.path())
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .expect("varsets compare failed");
    assert!(result.status.success(), "{:?}", result);

    assert_eq!(ids(&dir.path().join("shared.tsv")), vec!["a1", "a3", "b1", "b3"]);
    let a_only = dir.path().join(format!("{}_only.tsv", collection_name(a.path())));
    let b_only = dir.path().join(format!("{}_only.tsv", collection_name(b.path())));
    assert_eq!(ids(&a_only), vec!["a2"]);
    assert_eq!(ids(&b_only), vec!["b2"]);
}

#[test]
fn test_compare_inputs_with_same_name() {
    let first_dir = tempdir().unwrap();
    let second_dir = tempdir().unwrap();
    let first = first_dir.path().join("calls.tsv");
    let second = second_dir.path().join("calls.tsv");
    write_variant_calls(&caller_a(), &OutputFile::new(&first)).unwrap();
    write_variant_calls(&caller_b(), &OutputFile::new(&second)).unwrap();
    let dir = tempdir().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("compare")
        .arg(&first)
        .arg(&second)
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .expect("varsets compare failed");
    assert!(result.status.success(), "{:?}", result);

    assert_eq!(ids(&dir.path().join("first_only.tsv")), vec!["a2"]);
    assert_eq!(ids(&dir.path().join("second_only.tsv")), vec!["b2"]);
    assert!(!dir.path().join("calls_only.tsv").exists());
}

#[test]
fn test_intersect_members_carry_cluster_ids() {
    let a = temp_variant_file(&caller_a());
    let b = temp_variant_file(&caller_b());
    let output = NamedTempFile::new().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("intersect")
        .arg(a.path())
        .arg(b.path())
        .arg("--members")
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets intersect failed");
    assert!(result.status.success(), "{:?}", result);

    let contents = std::fs::read_to_string(output.path()).unwrap();
    assert!(contents.lines().next().unwrap().ends_with("cluster_id"));
    let members = read_variant_collection(output.path(), None).unwrap();
    let cluster_of = |id: &str| {
        members
            .iter()
            .find(|call| call.id == id)
            .and_then(|call| call.cluster_id)
    };
    assert!(cluster_of("a1").is_some());
    assert_eq!(cluster_of("a1"), cluster_of("b1"));
    assert_eq!(cluster_of("a3"), cluster_of("b3"));
    assert_ne!(cluster_of("a1"), cluster_of("a3"));
}

#[test]
fn test_annotations_pass_through_diff_unchanged() {
    let json = r#"{"count":3,"depth":9007199254740993,"gene":"BRCA2","score":0.25}"#;
    let mut calls = caller_a();
    calls[1].annotations = serde_json::from_str(json).unwrap();
    let a = temp_variant_file(&calls);
    let b = temp_variant_file(&caller_b());
    let output = NamedTempFile::new().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("diff")
        .arg(a.path())
        .arg(b.path())
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets diff failed");
    assert!(result.status.success(), "{:?}", result);

    let contents = std::fs::read_to_string(output.path()).unwrap();
    assert!(contents.contains(json), "{}", contents);
}

#[test]
fn test_overlap_with_rejected() {
    let a = temp_variant_file(&caller_a());
    let mut bedfile = tempfile::Builder::new().suffix(".bed").tempfile().unwrap();
    writeln!(bedfile, "chr1\t9900\t10100").unwrap();
    writeln!(bedfile, "chr2\t49000\t49500").unwrap();
    bedfile.flush().unwrap();
    let output = NamedTempFile::new().unwrap();
    let rejected = NamedTempFile::new().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("overlap")
        .arg(a.path())
        .arg("--bedfile")
        .arg(bedfile.path())
        .arg("--output")
        .arg(output.path())
        .arg("--rejected")
        .arg(rejected.path())
        .output()
        .expect("varsets overlap failed");
    assert!(result.status.success(), "{:?}", result);
    assert_eq!(ids(output.path()), vec!["a1"]);
    assert_eq!(ids(rejected.path()), vec!["a2", "a3"]);

    let padded = Command::new(varsets_binary_path())
        .arg("overlap")
        .arg(a.path())
        .arg("--bedfile")
        .arg(bedfile.path())
        .arg("--padding")
        .arg("600")
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets overlap failed");
    assert!(padded.status.success(), "{:?}", padded);
    assert_eq!(ids(output.path()), vec!["a1", "a2"]);
}

#[test]
fn test_filter() {
    let a = temp_variant_file(&caller_a());
    let output = NamedTempFile::new().unwrap();

    let result = Command::new(varsets_binary_path())
        .arg("filter")
        .arg(a.path())
        .arg("--where")
        .arg("quality_score>=20")
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets filter failed");
    assert!(result.status.success(), "{:?}", result);
    assert_eq!(ids(output.path()), vec!["a1"]);
}

#[test]
fn test_config_file_and_unknown_key() {
    let a = temp_variant_file(&caller_a());
    let b = temp_variant_file(&caller_b());

    let mut config = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(config, r#"{{"max_neighbor_distance": 1, "num_threads": 2}}"#).unwrap();
    config.flush().unwrap();
    let output = NamedTempFile::new().unwrap();
    let result = Command::new(varsets_binary_path())
        .arg("merge")
        .arg(a.path())
        .arg(b.path())
        .arg("--config")
        .arg(config.path())
        .arg("--output")
        .arg(output.path())
        .output()
        .expect("varsets merge failed");
    assert!(result.status.success(), "{:?}", result);
    assert_eq!(ids(output.path()).len(), 6);

    let mut bad = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(bad, r#"{{"max_neighbour_distance": 10}}"#).unwrap();
    bad.flush().unwrap();
    let result = Command::new(varsets_binary_path())
        .arg("merge")
        .arg(a.path())
        .arg("--config")
        .arg(bad.path())
        .output()
        .expect("varsets merge failed");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("Error"));
}

#[test]
fn test_negative_distance_is_rejected() {
    let a = temp_variant_file(&caller_a());
    let result = Command::new(varsets_binary_path())
        .arg("collapse")
        .arg(a.path())
        .arg("--max-neighbor-distance=-5")
        .output()
        .expect("varsets collapse failed");
    assert!(!result.status.success());
}
