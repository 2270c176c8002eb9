//! Inspect command implementation for the amble CLI.

use std::collections::HashMap;
use std::io::Write;

use amble_core::{Graph, NodeId};
use amble_data::OsmIngestSummary;
use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::network::{LoadedNetwork, load_network, write_json};
use crate::{ARG_NETWORK, CliError, ENV_INSPECT_NETWORK, require_existing};

/// CLI arguments for the `inspect` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "inspect",
    about = "Summarise a walking network from an OSM extract or JSON snapshot"
)]
#[ortho_config(prefix = "AMBLE")]
pub(crate) struct InspectArgs {
    /// OSM PBF extract or `.json` network snapshot.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) network: Option<Utf8PathBuf>,
}

impl InspectArgs {
    pub(crate) fn into_network_path(self) -> Result<Utf8PathBuf, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        let network = merged.network.ok_or(CliError::MissingArgument {
            field: ARG_NETWORK,
            env: ENV_INSPECT_NETWORK,
        })?;
        require_existing(&network, ARG_NETWORK)?;
        Ok(network)
    }
}

/// Latitude/longitude extent of the network nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct Bounds {
    pub(crate) min_lat: f64,
    pub(crate) min_lng: f64,
    pub(crate) max_lat: f64,
    pub(crate) max_lng: f64,
}

/// Element counts reported by OSM ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ExtractCounts {
    pub(crate) nodes: u64,
    pub(crate) ways: u64,
    pub(crate) relations: u64,
    pub(crate) walkable_ways: u64,
    pub(crate) skipped_segments: u64,
}

impl From<&OsmIngestSummary> for ExtractCounts {
    fn from(summary: &OsmIngestSummary) -> Self {
        Self {
            nodes: summary.nodes,
            ways: summary.ways,
            relations: summary.relations,
            walkable_ways: summary.walkable_ways,
            skipped_segments: summary.skipped_segments,
        }
    }
}

/// What `amble inspect` prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct NetworkSummary {
    pub(crate) nodes: usize,
    pub(crate) edges: usize,
    /// Groups of nodes joined by edges in either direction.
    pub(crate) components: usize,
    pub(crate) poi_candidates: usize,
    pub(crate) bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) extract: Option<ExtractCounts>,
}

impl NetworkSummary {
    pub(crate) fn of(network: &LoadedNetwork) -> Self {
        Self {
            nodes: network.graph.node_count(),
            edges: network.graph.edge_count(),
            components: component_count(&network.graph),
            poi_candidates: network.pois.len(),
            bounds: node_bounds(&network.graph),
            extract: network.ingest.as_ref().map(ExtractCounts::from),
        }
    }
}

fn node_bounds(graph: &Graph) -> Option<Bounds> {
    graph.nodes().fold(None, |bounds, node| {
        let (lat, lng) = (node.lat(), node.lng());
        Some(match bounds {
            None => Bounds {
                min_lat: lat,
                min_lng: lng,
                max_lat: lat,
                max_lng: lng,
            },
            Some(b) => Bounds {
                min_lat: b.min_lat.min(lat),
                min_lng: b.min_lng.min(lng),
                max_lat: b.max_lat.max(lat),
                max_lng: b.max_lng.max(lng),
            },
        })
    })
}

/// Count weakly connected components with a union-find over node ids.
fn component_count(graph: &Graph) -> usize {
    let mut parent: HashMap<NodeId, NodeId> = graph.nodes().map(|n| (n.id, n.id)).collect();
    let mut components = parent.len();
    for edge in graph.edges() {
        let a = find_root(&mut parent, edge.from);
        let b = find_root(&mut parent, edge.to);
        if a != b {
            parent.insert(a, b);
            components -= 1;
        }
    }
    components
}

fn find_root(parent: &mut HashMap<NodeId, NodeId>, id: NodeId) -> NodeId {
    let mut root = id;
    while let Some(&next) = parent.get(&root) {
        if next == root {
            break;
        }
        root = next;
    }
    let mut walk = id;
    while walk != root {
        let Some(next) = parent.insert(walk, root) else {
            break;
        };
        walk = next;
    }
    root
}

pub(crate) fn run_inspect(args: InspectArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_inspect_with(args, &mut stdout)
}

pub(crate) fn run_inspect_with(args: InspectArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let path = args.into_network_path()?;
    let network = load_network(&path)?;
    write_json(writer, &NetworkSummary::of(&network))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amble_core::test_support::{line_graph, two_component_graph};
    use rstest::rstest;

    fn loaded(graph: Graph) -> LoadedNetwork {
        LoadedNetwork {
            graph,
            pois: Vec::new(),
            ingest: None,
        }
    }

    #[rstest]
    fn line_is_one_component() {
        let summary = NetworkSummary::of(&loaded(line_graph(4, 100.0)));
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.edges, 6);
        assert_eq!(summary.components, 1);
        assert!(summary.extract.is_none());
    }

    #[rstest]
    fn split_network_reports_two_components() {
        let summary = NetworkSummary::of(&loaded(two_component_graph()));
        assert_eq!(summary.components, 2);
    }

    #[rstest]
    fn empty_network_has_no_bounds() {
        let summary = NetworkSummary::of(&loaded(amble_core::GraphBuilder::new().build()));
        assert_eq!(summary.components, 0);
        assert!(summary.bounds.is_none());
    }

    #[rstest]
    fn bounds_cover_every_node() {
        let summary = NetworkSummary::of(&loaded(line_graph(3, 111.195)));
        let bounds = summary.bounds.expect("nodes present");
        assert_eq!(bounds.min_lng, 0.0);
        assert!((bounds.max_lng - 0.002).abs() < 1e-6);
        assert_eq!(bounds.min_lat, bounds.max_lat);
    }
}
