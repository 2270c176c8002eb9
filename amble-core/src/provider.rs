//! Collaborator contracts for network and POI data.
//!
//! The optimiser never loads data itself. A [`RoadNetworkProvider`] hands it
//! a read-only [`Graph`] and a [`PoiProvider`] hands it candidate points for
//! a region.

use std::sync::Arc;

use geo::{Coord, Intersects, Rect};
use thiserror::Error;

use crate::cache::{Clock, GraphCache, SystemClock};
use crate::catalogue::TagCatalogue;
use crate::graph::{Graph, NodeId};
use crate::poi::PoiCandidate;

/// A data provider was unavailable or returned malformed data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The road network could not be obtained.
    #[error("road network unavailable: {message}")]
    NetworkUnavailable {
        /// Underlying cause.
        message: String,
    },
    /// The road network data could not be used.
    #[error("malformed road network data: {message}")]
    MalformedNetwork {
        /// Underlying cause.
        message: String,
    },
    /// The network has no nodes, so nothing can be routed.
    #[error("road network is empty")]
    EmptyNetwork,
    /// No node lies near a location.
    #[error("no network node near ({lat}, {lng})")]
    NoNearbyNode {
        /// Latitude queried.
        lat: f64,
        /// Longitude queried.
        lng: f64,
    },
    /// POI candidates could not be obtained.
    #[error("POI provider unavailable: {message}")]
    PoiUnavailable {
        /// Underlying cause.
        message: String,
    },
}

/// Supplies a read-only walking network.
///
/// Implementations may cache and rebuild the network on their own schedule;
/// each call returns a snapshot that stays valid for as long as it is held.
pub trait RoadNetworkProvider: Send + Sync {
    /// The current network snapshot.
    ///
    /// # Errors
    /// Returns [`ProviderError`] when the network cannot be produced.
    fn graph(&self) -> Result<Arc<Graph>, ProviderError>;

    /// Node nearest to `location` in the current snapshot.
    ///
    /// # Errors
    /// Returns [`ProviderError::NoNearbyNode`] when the network is empty, or
    /// any error raised by [`graph`](Self::graph).
    fn nearest_node(&self, location: Coord<f64>) -> Result<NodeId, ProviderError> {
        self.graph()?
            .nearest_node(location)
            .ok_or(ProviderError::NoNearbyNode {
                lat: location.y,
                lng: location.x,
            })
    }
}

/// Supplies raw POI candidates.
pub trait PoiProvider: Send + Sync {
    /// Candidates inside `region` carrying a tag listed in `filter`.
    ///
    /// # Errors
    /// Returns [`ProviderError`] when candidates cannot be produced.
    fn candidates(
        &self,
        region: &Rect<f64>,
        filter: &TagCatalogue,
    ) -> Result<Box<dyn Iterator<Item = PoiCandidate> + Send + '_>, ProviderError>;
}

/// Return `true` when any tag of `candidate` is listed in `filter`.
#[must_use]
pub fn matches_filter(candidate: &PoiCandidate, filter: &TagCatalogue) -> bool {
    candidate
        .tags
        .iter()
        .any(|(key, value)| filter.matches(key, value))
}

/// A fixed network shared by reference.
#[derive(Debug, Clone)]
pub struct StaticRoadNetwork {
    graph: Arc<Graph>,
}

impl StaticRoadNetwork {
    /// Serve `graph` to every caller.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }

    /// Serve an already shared graph.
    #[must_use]
    pub const fn from_shared(graph: Arc<Graph>) -> Self {
        Self { graph }
    }
}

impl RoadNetworkProvider for StaticRoadNetwork {
    fn graph(&self) -> Result<Arc<Graph>, ProviderError> {
        Ok(Arc::clone(&self.graph))
    }
}

/// In-memory POI provider performing a linear scan.
#[derive(Debug, Clone, Default)]
pub struct MemoryPoiProvider {
    candidates: Vec<PoiCandidate>,
}

impl MemoryPoiProvider {
    /// Create a provider from a collection of candidates.
    pub fn with_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = PoiCandidate>,
    {
        Self {
            candidates: candidates.into_iter().collect(),
        }
    }

    /// Number of stored candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Return `true` when no candidates are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl PoiProvider for MemoryPoiProvider {
    fn candidates(
        &self,
        region: &Rect<f64>,
        filter: &TagCatalogue,
    ) -> Result<Box<dyn Iterator<Item = PoiCandidate> + Send + '_>, ProviderError> {
        let region = *region;
        let catalogue = filter.clone();
        Ok(Box::new(
            self.candidates
                .iter()
                // `Intersects` treats boundary points as inside the rectangle.
                .filter(move |c| {
                    region.intersects(&c.location) && matches_filter(c, &catalogue)
                })
                .cloned(),
        ))
    }
}

/// Something that can build a network from scratch.
pub trait GraphSource: Send + Sync {
    /// Key identifying the network this source builds.
    fn cache_key(&self) -> String;

    /// Build the network.
    ///
    /// # Errors
    /// Returns [`ProviderError`] when the data cannot be read or is invalid.
    fn load(&self) -> Result<Graph, ProviderError>;
}

/// Road network provider backed by a [`GraphSource`] and a shared
/// [`GraphCache`].
#[derive(Debug)]
pub struct CachedRoadNetwork<S, C = SystemClock> {
    source: S,
    cache: Arc<GraphCache<String, C>>,
}

impl<S, C> CachedRoadNetwork<S, C>
where
    S: GraphSource,
    C: Clock,
{
    /// Serve networks built by `source` through `cache`.
    #[must_use]
    pub const fn new(source: S, cache: Arc<GraphCache<String, C>>) -> Self {
        Self { source, cache }
    }

    /// The underlying source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }
}

impl<S, C> RoadNetworkProvider for CachedRoadNetwork<S, C>
where
    S: GraphSource,
    C: Clock,
{
    fn graph(&self) -> Result<Arc<Graph>, ProviderError> {
        let key = self.source.cache_key();
        self.cache.get_or_build(&key, || self.source.load())
    }
}
