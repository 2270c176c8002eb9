//! Spatially indexed POI provider.

use amble_core::provider::matches_filter;
use amble_core::{PoiCandidate, PoiProvider, ProviderError, TagCatalogue};
use geo::Rect;
use log::warn;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// POI provider backed by an R*-tree over candidate locations.
///
/// # Examples
/// ```
/// use amble_core::geodesy::coord;
/// use amble_core::{PoiCandidate, PoiProvider, TagCatalogue};
/// use amble_data::IndexedPoiProvider;
/// use geo::Rect;
///
/// let provider = IndexedPoiProvider::new(vec![
///     PoiCandidate::new(1, coord(47.80, 13.04), [("amenity", "cafe")]),
///     PoiCandidate::new(2, coord(48.50, 13.04), [("amenity", "cafe")]),
/// ]);
/// let region = Rect::new(coord(47.79, 13.03), coord(47.81, 13.05));
/// let ids: Vec<u64> = provider
///     .candidates(&region, &TagCatalogue::social())
///     .expect("in-memory index")
///     .map(|poi| poi.id)
///     .collect();
/// assert_eq!(ids, vec![1]);
/// ```
#[derive(Debug, Clone)]
pub struct IndexedPoiProvider {
    candidates: Vec<PoiCandidate>,
    index: RTree<IndexedPoint>,
}

impl IndexedPoiProvider {
    /// Index `candidates`. Candidates with non-finite coordinates are dropped.
    #[must_use]
    pub fn new(candidates: Vec<PoiCandidate>) -> Self {
        let (candidates, dropped): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|poi| poi.location.x.is_finite() && poi.location.y.is_finite());
        if !dropped.is_empty() {
            warn!("dropped {} POI candidates with non-finite coordinates", dropped.len());
        }
        let points = candidates
            .iter()
            .enumerate()
            .map(|(slot, poi)| GeomWithData::new([poi.location.x, poi.location.y], slot))
            .collect();
        Self {
            candidates,
            index: RTree::bulk_load(points),
        }
    }

    /// Number of indexed candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Return `true` when no candidates are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl PoiProvider for IndexedPoiProvider {
    fn candidates(
        &self,
        region: &Rect<f64>,
        filter: &TagCatalogue,
    ) -> Result<Box<dyn Iterator<Item = PoiCandidate> + Send + '_>, ProviderError> {
        let envelope = AABB::from_corners(
            [region.min().x, region.min().y],
            [region.max().x, region.max().y],
        );
        let mut slots: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|point| point.data)
            .collect();
        // Tree order depends on bulk loading; report in input order instead.
        slots.sort_unstable();
        let matching: Vec<PoiCandidate> = slots
            .into_iter()
            .filter_map(|slot| self.candidates.get(slot))
            .filter(|poi| matches_filter(poi, filter))
            .cloned()
            .collect();
        Ok(Box::new(matching.into_iter()))
    }
}
