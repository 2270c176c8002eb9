//! Unit tests for the convert and inspect commands.

use super::helpers::{decode_walk_extract, workspace, write_street_snapshot};
use super::*;
use crate::convert::{ConvertArgs, ConvertConfig, default_snapshot_path, run_convert_with};
use crate::inspect::{InspectArgs, run_inspect_with};
use amble_data::NetworkSnapshot;
use camino::{Utf8Path, Utf8PathBuf};
use rstest::rstest;
use serde_json::Value;

#[rstest]
#[case("data/walk.osm.pbf", "data/walk.json")]
#[case("walk.pbf", "walk.json")]
#[case("/srv/extracts/city", "/srv/extracts/city.json")]
fn default_snapshot_path_replaces_extract_suffix(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(
        default_snapshot_path(Utf8Path::new(input)),
        Utf8PathBuf::from(expected)
    );
}

#[rstest]
fn converting_without_input_errors() {
    match ConvertConfig::try_from(ConvertArgs::default()).expect_err("input is required") {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_CONVERT_INPUT);
            assert_eq!(env, ENV_CONVERT_INPUT);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn convert_writes_a_loadable_snapshot() {
    let (_tmp, root) = workspace();
    let extract = decode_walk_extract(&root);
    let output = root.join("walk-network.json");
    let mut stdout = Vec::new();

    run_convert_with(
        ConvertArgs {
            input: Some(extract),
            output: Some(output.clone()),
        },
        &mut stdout,
    )
    .expect("convert should succeed");

    let summary: Value = serde_json::from_slice(&stdout).expect("summary JSON");
    assert_eq!(summary["nodes"].as_u64(), Some(5));
    assert_eq!(summary["edges"].as_u64(), Some(8));
    assert_eq!(summary["poi_candidates"].as_u64(), Some(2));

    let snapshot = NetworkSnapshot::read(&output).expect("snapshot readable");
    let graph = snapshot.to_graph().expect("snapshot valid");
    assert_eq!(graph.node_count(), 5);
    assert_eq!(snapshot.poi_candidates().len(), 2);
}

#[rstest]
fn convert_reports_missing_input() {
    let (_tmp, root) = workspace();
    let mut stdout = Vec::new();
    let err = run_convert_with(
        ConvertArgs {
            input: Some(root.join("absent.osm.pbf")),
            output: None,
        },
        &mut stdout,
    )
    .expect_err("missing input");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_CONVERT_INPUT),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
    assert!(stdout.is_empty());
}

#[rstest]
fn inspect_summarises_a_snapshot() {
    let (_tmp, root) = workspace();
    let path = root.join("street.json");
    write_street_snapshot(&path);
    let mut stdout = Vec::new();

    run_inspect_with(
        InspectArgs {
            network: Some(path),
        },
        &mut stdout,
    )
    .expect("inspect should succeed");

    let summary: Value = serde_json::from_slice(&stdout).expect("summary JSON");
    assert_eq!(summary["nodes"].as_u64(), Some(6));
    assert_eq!(summary["edges"].as_u64(), Some(10));
    assert_eq!(summary["components"].as_u64(), Some(1));
    assert_eq!(summary["poi_candidates"].as_u64(), Some(1));
    assert!(summary.get("extract").is_none());
}

#[rstest]
fn inspect_reports_extract_counts() {
    let (_tmp, root) = workspace();
    let extract = decode_walk_extract(&root);
    let mut stdout = Vec::new();

    run_inspect_with(
        InspectArgs {
            network: Some(extract),
        },
        &mut stdout,
    )
    .expect("inspect should succeed");

    let summary: Value = serde_json::from_slice(&stdout).expect("summary JSON");
    assert_eq!(summary["components"].as_u64(), Some(1));
    assert_eq!(summary["extract"]["ways"].as_u64(), Some(6));
    assert_eq!(summary["extract"]["walkable_ways"].as_u64(), Some(3));
}
