//! Contract tests for the graph artifact consumed by the front end
//!
//! The document shape is `{nodes: [...], links: [...]}` with camelCase field
//! names; these tests fail loudly if a field is renamed.

use serde_json::Value;
use tempfile::tempdir;
use tokengraph_core::serializer::{self, GraphDocument};
use tokengraph_core::{
    write_artifact, CorrelationGraphBuilder, EdgeMode, Graph, LogReturnPoint, ReturnSeries, Token,
    Unit,
};

fn graph_of(count: usize, edge_mode: EdgeMode) -> Graph {
    let mut builder = CorrelationGraphBuilder::new(edge_mode);
    for index in 0..count {
        let unit = Unit::parse(&format!("unit-{index:02}")).expect("unit");
        let token =
            Token::new(unit, format!("T{index}"), 1.0 + index as f64, 100.0).expect("token");
        let points = (0..6)
            .map(|time| LogReturnPoint {
                time,
                value: ((time as f64 + 1.0) * (index as f64 + 1.0)).sin() / 10.0,
            })
            .collect();
        builder
            .add(token, ReturnSeries::from_points(points))
            .expect("non-empty series");
    }
    builder.build()
}

// =============================================================================
// Artifact: Cardinality
// =============================================================================

#[test]
fn when_graph_round_trips_undirected_link_count_is_t_choose_two() {
    // Given: graphs of several sizes
    for count in [0usize, 1, 2, 5, 8] {
        let graph = graph_of(count, EdgeMode::Undirected);

        // When: rendered and parsed back
        let raw = serializer::to_pretty_string(&graph).expect("serializes");
        let parsed = serializer::from_json_str(&raw).expect("parses");

        // Then: T nodes and T(T-1)/2 links survive unchanged
        assert_eq!(parsed.nodes.len(), count);
        assert_eq!(parsed.edges.len(), count * count.saturating_sub(1) / 2);
        assert_eq!(parsed, graph);
    }
}

#[test]
fn when_graph_is_directed_link_count_is_t_times_t_minus_one() {
    let graph = graph_of(5, EdgeMode::Directed);

    let document = GraphDocument::from(&graph);

    assert_eq!(document.nodes.len(), 5);
    assert_eq!(document.links.len(), 20);
}

#[test]
fn when_links_are_rendered_they_are_sorted_and_never_self_loops() {
    let graph = graph_of(6, EdgeMode::Directed);

    let document = GraphDocument::from(&graph);

    let keys: Vec<(&str, &str)> = document
        .links
        .iter()
        .map(|link| (link.source.as_str(), link.target.as_str()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert!(keys.iter().all(|(source, target)| source != target));
    assert!(document
        .links
        .iter()
        .all(|link| (-1.0..=1.0).contains(&link.average_correlation)));
}

// =============================================================================
// Artifact: Field Names
// =============================================================================

#[test]
fn when_graph_is_serialized_fields_use_front_end_names() {
    // Given: a two-node graph
    let graph = graph_of(2, EdgeMode::Undirected);

    // When: rendered as a JSON value
    let value = serializer::to_json_value(&graph).expect("serializes");

    // Then: the documented keys are present and the legacy spelling is gone
    let node = &value["nodes"][0];
    for key in ["id", "name", "price", "liquidity", "avgLogReturn"] {
        assert!(node.get(key).is_some(), "node missing {key}");
    }
    let link = &value["links"][0];
    for key in ["source", "target", "averageCorrelation", "measurements"] {
        assert!(link.get(key).is_some(), "link missing {key}");
    }
    assert!(link.get("avarageCorilation").is_none());
    assert_eq!(link["source"], Value::from("unit-00"));
    assert_eq!(link["target"], Value::from("unit-01"));
    assert_eq!(link["measurements"], Value::from(6));
}

// =============================================================================
// Artifact: Writing
// =============================================================================

#[test]
fn when_artifact_is_written_file_holds_complete_pretty_json() {
    // Given: an output directory with a previous artifact
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("graph.json");
    write_artifact(&path, &graph_of(2, EdgeMode::Undirected)).expect("first write");

    // When: a bigger graph replaces it
    let graph = graph_of(4, EdgeMode::Undirected);
    write_artifact(&path, &graph).expect("second write");

    // Then: the file holds exactly the new document and no temp files remain
    let raw = std::fs::read_to_string(&path).expect("read artifact");
    assert!(raw.contains('\n'), "artifact should be pretty printed");
    let parsed = serializer::from_json_str(&raw).expect("valid json");
    assert_eq!(parsed, graph);

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .expect("list dir")
        .collect::<Result<_, _>>()
        .expect("entries");
    assert_eq!(entries.len(), 1);
}

#[test]
fn when_output_directory_is_missing_write_fails_with_io_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("graph.json");

    let err = write_artifact(&path, &graph_of(1, EdgeMode::Undirected)).expect_err("must fail");

    assert_eq!(err.code(), "core.io");
    assert!(!path.exists());
}
