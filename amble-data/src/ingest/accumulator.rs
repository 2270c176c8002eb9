//! Internal accumulator for OpenStreetMap (OSM) PBF ingestion.
//!
//! Collects walkable ways, POI candidates and the coordinates of every node
//! they reference, then turns them into a network and a candidate list.
use std::collections::{BTreeMap, HashMap, HashSet};

use amble_core::geodesy::great_circle_m;
use amble_core::{Edge, EdgeTags, GraphBuilder, NodeId, PoiCandidate, TagCatalogue};
use geo::Coord;
use log::{debug, warn};
use osmpbf::Element;

use super::ids::{OsmElementKind, encode_element_id};
use super::tags::{collect_tags, edge_tags, has_poi_key, is_walkable};
use super::{OsmIngestReport, OsmIngestSummary};

#[derive(Debug, Default)]
pub(super) struct OsmAccumulator {
    summary: OsmIngestSummary,
    nodes: HashMap<u64, Coord<f64>>,
    pending_way_nodes: HashSet<u64>,
    node_pois: Vec<PoiCandidate>,
    walk_ways: Vec<WalkWay>,
    poi_ways: Vec<WayCandidate>,
}

impl OsmAccumulator {
    pub(super) fn process_element(&mut self, element: Element<'_>, poi_keys: &TagCatalogue) {
        match element {
            Element::Node(node) => {
                let tags: Vec<(&str, &str)> = node.tags().collect();
                self.process_node(node.id(), node.lon(), node.lat(), &tags, poi_keys);
            }
            Element::DenseNode(node) => {
                let tags: Vec<(&str, &str)> = node.tags().collect();
                self.process_node(node.id(), node.lon(), node.lat(), &tags, poi_keys);
            }
            Element::Way(way) => {
                let tags: Vec<(&str, &str)> = way.tags().collect();
                self.process_way(way.id(), way.refs(), &tags, poi_keys);
            }
            Element::Relation(relation) => {
                self.summary.record_relation();
                // Encode to validate ID range and emit logs for unsupported values.
                let _ = encode_element_id(OsmElementKind::Relation, relation.id());
            }
        }
    }

    pub(super) fn process_node(
        &mut self,
        raw_id: i64,
        lon: f64,
        lat: f64,
        tags: &[(&str, &str)],
        poi_keys: &TagCatalogue,
    ) {
        self.summary.record_node(lon, lat);
        let Some(encoded_id) = encode_element_id(OsmElementKind::Node, raw_id) else {
            return;
        };
        let Some(location) = validated_coord(lon, lat) else {
            self.pending_way_nodes.remove(&encoded_id);
            return;
        };

        let is_poi = has_poi_key(tags, poi_keys);
        let was_pending = self.pending_way_nodes.remove(&encoded_id);
        if !is_poi && !was_pending {
            return;
        }

        self.nodes.insert(encoded_id, location);
        if is_poi {
            self.node_pois
                .push(PoiCandidate::new(encoded_id, location, collect_tags(tags)));
        }
    }

    pub(super) fn process_way<R>(
        &mut self,
        raw_id: i64,
        refs: R,
        tags: &[(&str, &str)],
        poi_keys: &TagCatalogue,
    ) where
        R: IntoIterator<Item = i64>,
    {
        self.summary.record_way();
        let walkable = is_walkable(tags);
        let is_poi = has_poi_key(tags, poi_keys);
        if !walkable && !is_poi {
            return;
        }
        let Some(encoded_id) = encode_element_id(OsmElementKind::Way, raw_id) else {
            return;
        };
        let node_refs: Vec<u64> = refs
            .into_iter()
            .filter_map(|node_id| encode_element_id(OsmElementKind::Node, node_id))
            .collect();
        for node_id in &node_refs {
            if !self.nodes.contains_key(node_id) {
                self.pending_way_nodes.insert(*node_id);
            }
        }
        if walkable {
            self.summary.walkable_ways += 1;
            self.walk_ways.push(WalkWay {
                id: encoded_id,
                node_refs: node_refs.clone(),
                tags: edge_tags(tags),
            });
        }
        if is_poi {
            self.poi_ways.push(WayCandidate {
                id: encoded_id,
                node_refs,
                tags: collect_tags(tags),
            });
        }
    }

    pub(super) fn combine(mut self, other: Self) -> Self {
        self.summary = self.summary.combine(other.summary);
        for (id, coord) in other.nodes {
            self.nodes.entry(id).or_insert(coord);
        }
        self.node_pois.extend(other.node_pois);
        self.walk_ways.extend(other.walk_ways);
        self.poi_ways.extend(other.poi_ways);
        self.pending_way_nodes.extend(other.pending_way_nodes);
        self.pending_way_nodes
            .retain(|node_id| !self.nodes.contains_key(node_id));
        self
    }

    pub(super) fn has_pending_nodes(&self) -> bool {
        !self.pending_way_nodes.is_empty()
    }

    pub(super) fn pending_way_node_count(&self) -> usize {
        self.pending_way_nodes.len()
    }

    pub(super) fn resolve_pending_node(&mut self, raw_id: i64, lon: f64, lat: f64) {
        let Some(encoded_id) = encode_element_id(OsmElementKind::Node, raw_id) else {
            return;
        };
        if !self.pending_way_nodes.remove(&encoded_id) {
            return;
        }
        if let Some(location) = validated_coord(lon, lat) {
            self.nodes.insert(encoded_id, location);
        }
    }

    pub(super) fn into_report(self) -> OsmIngestReport {
        let Self {
            mut summary,
            nodes,
            mut node_pois,
            mut walk_ways,
            poi_ways,
            ..
        } = self;

        // Parallel decoding yields ways in arbitrary order.
        walk_ways.sort_by_key(|way| way.id);
        let mut builder = GraphBuilder::new();
        for way in &walk_ways {
            summary.skipped_segments += add_way_segments(&mut builder, &nodes, way);
        }
        if summary.skipped_segments > 0 {
            warn!(
                "skipped {} way segments with unresolved or invalid nodes",
                summary.skipped_segments
            );
        }
        let graph = builder.build();
        debug!(
            "built walking network with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        // Anchor way POIs to the first resolved node reference.
        for candidate in poi_ways {
            if let Some(location) = candidate
                .node_refs
                .iter()
                .find_map(|node_id| nodes.get(node_id))
                .copied()
            {
                node_pois.push(PoiCandidate::new(candidate.id, location, candidate.tags));
            }
        }
        node_pois.sort_by_key(|poi| poi.id);

        OsmIngestReport {
            summary,
            graph,
            pois: node_pois,
        }
    }
}

/// Add a bidirectional edge for each consecutive pair of resolved refs and
/// return how many pairs were skipped.
fn add_way_segments(
    builder: &mut GraphBuilder,
    nodes: &HashMap<u64, Coord<f64>>,
    way: &WalkWay,
) -> u64 {
    let mut skipped = 0;
    for pair in way.node_refs.windows(2) {
        let [from, to] = *pair else { continue };
        if from == to {
            continue;
        }
        let (Some(&a), Some(&b)) = (nodes.get(&from), nodes.get(&to)) else {
            skipped += 1;
            continue;
        };
        if ensure_node(builder, from, a).is_none() || ensure_node(builder, to, b).is_none() {
            skipped += 1;
            continue;
        }
        let edge = Edge {
            from,
            to,
            length_m: great_circle_m(a, b),
            tags: way.tags.clone(),
        };
        if let Err(err) = builder.add_bidirectional(edge) {
            warn!("skipped segment {from} -> {to} of way {}: {err}", way.id);
            skipped += 1;
        }
    }
    skipped
}

fn ensure_node(builder: &mut GraphBuilder, id: NodeId, location: Coord<f64>) -> Option<()> {
    if builder.contains(id) {
        return Some(());
    }
    builder.add_node(id, location).ok()
}

#[derive(Debug)]
struct WalkWay {
    id: u64,
    node_refs: Vec<u64>,
    tags: EdgeTags,
}

#[derive(Debug)]
struct WayCandidate {
    id: u64,
    node_refs: Vec<u64>,
    tags: BTreeMap<String, String>,
}

pub(super) fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    amble_core::geodesy::is_valid_coordinate(lat, lon).then_some(Coord { x: lon, y: lat })
}
