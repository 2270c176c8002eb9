use amble_core::{Graph, PoiCandidate, TagCatalogue};
use camino::{Utf8Path, Utf8PathBuf};
use geo::{Coord, Rect};
use log::{info, warn};
use osmpbf::{Element, ElementReader};
use thiserror::Error;

mod accumulator;
mod ids;
mod tags;

use accumulator::OsmAccumulator;

/// Summary of raw OSM elements discovered during ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmIngestSummary {
    /// Number of nodes discovered, including dense-node entries.
    pub nodes: u64,
    /// Number of ways discovered.
    pub ways: u64,
    /// Number of relations discovered.
    pub relations: u64,
    /// Number of ways admitted to the walking network.
    pub walkable_ways: u64,
    /// Way segments dropped because a node was missing or invalid.
    pub skipped_segments: u64,
    /// Bounding box covering all node coordinates, if any nodes were present.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
}

impl OsmIngestSummary {
    fn combine(mut self, other: Self) -> Self {
        self.nodes += other.nodes;
        self.ways += other.ways;
        self.relations += other.relations;
        self.walkable_ways += other.walkable_ways;
        self.skipped_segments += other.skipped_segments;
        if let Some(bounds) = other.bounds {
            self.include_bounds(bounds);
        }
        self
    }

    fn include_bounds(&mut self, bounds: Rect<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(bounds),
        }
    }

    fn record_node(&mut self, lon: f64, lat: f64) {
        self.nodes += 1;
        if let Some(location) = accumulator::validated_coord(lon, lat) {
            self.include_bounds(Rect::new(location, location));
        }
    }

    fn record_way(&mut self) {
        self.ways += 1;
    }

    fn record_relation(&mut self) {
        self.relations += 1;
    }
}

/// Walking network and POI candidates built from one extract.
#[derive(Debug, Clone)]
pub struct OsmIngestReport {
    /// Element counts and bounding box information.
    pub summary: OsmIngestSummary,
    /// Walking network built from walkable ways.
    pub graph: Graph,
    /// POI candidates ordered by id. Way candidates carry ids with bit 62 set.
    pub pois: Vec<PoiCandidate>,
}

/// Options for [`ingest_osm_pbf_with`].
#[derive(Debug, Clone)]
pub struct OsmIngestConfig {
    /// Elements carrying any key of this catalogue become POI candidates.
    pub poi_keys: TagCatalogue,
}

impl Default for OsmIngestConfig {
    fn default() -> Self {
        Self {
            poi_keys: TagCatalogue::social(),
        }
    }
}

/// Errors returned when ingesting an OSM PBF file.
#[derive(Debug, Error)]
pub enum OsmIngestError {
    /// The file could not be opened.
    #[error("failed to open OSM PBF file at {path}")]
    Open {
        /// Underlying reader error.
        #[source]
        source: osmpbf::Error,
        /// File that was opened.
        path: Utf8PathBuf,
    },
    /// The file was opened but its contents could not be decoded.
    #[error("failed to decode OSM PBF data at {path}")]
    Decode {
        /// Underlying decoder error.
        #[source]
        source: osmpbf::Error,
        /// File being decoded.
        path: Utf8PathBuf,
    },
}

/// Ingest an OSM PBF file using the social catalogue to pick POIs.
///
/// # Errors
/// Returns [`OsmIngestError`] when the file cannot be opened or decoded.
///
/// # Examples
/// ```no_run
/// use amble_data::ingest_osm_pbf;
/// use camino::Utf8Path;
///
/// # fn main() -> Result<(), amble_data::OsmIngestError> {
/// let report = ingest_osm_pbf(Utf8Path::new("salzburg.osm.pbf"))?;
/// println!("{} walkable nodes", report.graph.node_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_osm_pbf(path: &Utf8Path) -> Result<OsmIngestReport, OsmIngestError> {
    ingest_osm_pbf_with(path, &OsmIngestConfig::default())
}

/// Ingest an OSM PBF file into a walking network and POI candidates.
///
/// The first pass decodes blocks in parallel, keeping walkable ways, POI
/// elements and the node ids they reference. A second sequential pass
/// resolves the coordinates of referenced nodes that carried no POI tags.
///
/// # Errors
/// Returns [`OsmIngestError`] when the file cannot be opened or decoded.
pub fn ingest_osm_pbf_with(
    path: &Utf8Path,
    config: &OsmIngestConfig,
) -> Result<OsmIngestReport, OsmIngestError> {
    let open = || {
        ElementReader::from_path(path.as_std_path()).map_err(|source| OsmIngestError::Open {
            source,
            path: path.to_owned(),
        })
    };
    let decode_error = |source| OsmIngestError::Decode {
        source,
        path: path.to_owned(),
    };

    let poi_keys = &config.poi_keys;
    let mut accumulator = open()?
        .par_map_reduce(
            |element| {
                let mut accumulator = OsmAccumulator::default();
                accumulator.process_element(element, poi_keys);
                accumulator
            },
            OsmAccumulator::default,
            OsmAccumulator::combine,
        )
        .map_err(decode_error)?;

    if accumulator.has_pending_nodes() {
        let accumulator_ref = &mut accumulator;
        open()?
            .for_each(|element| match element {
                Element::Node(node) => {
                    accumulator_ref.resolve_pending_node(node.id(), node.lon(), node.lat());
                }
                Element::DenseNode(node) => {
                    accumulator_ref.resolve_pending_node(node.id(), node.lon(), node.lat());
                }
                Element::Way(_) | Element::Relation(_) => {}
            })
            .map_err(decode_error)?;
        if accumulator.has_pending_nodes() {
            warn!(
                "skipped {} way node references without coordinates",
                accumulator.pending_way_node_count()
            );
        }
    }

    let report = accumulator.into_report();
    info!(
        "ingested {path}: {} nodes, {} ways ({} walkable), {} POI candidates",
        report.summary.nodes,
        report.summary.ways,
        report.summary.walkable_ways,
        report.pois.len()
    );
    Ok(report)
}
