use log::warn;

/// Top two bits encode element type: 00=node, 01=way, 10=relation. Remaining 62 bits carry the raw ID.
const WAY_ID_PREFIX: u64 = 1 << 62;
const REL_ID_PREFIX: u64 = 1 << 63;
const TYPE_ID_MASK: u64 = (1 << 62) - 1;

#[derive(Copy, Clone, Debug)]
pub(super) enum OsmElementKind {
    Node,
    Way,
    Relation,
}

/// Map a raw OSM id into a single `u64` space shared by nodes and ways, so
/// node-derived and way-derived POI candidates never collide. Node ids map to
/// themselves and double as network node ids.
pub(super) fn encode_element_id(kind: OsmElementKind, raw_id: i64) -> Option<u64> {
    let Ok(base) = u64::try_from(raw_id) else {
        warn!("skipped OSM {kind:?} {raw_id}: negative identifiers are unsupported");
        return None;
    };
    if base > TYPE_ID_MASK {
        warn!("skipped OSM {kind:?} {raw_id}: exceeds supported maximum {TYPE_ID_MASK}");
        return None;
    }
    let prefix = match kind {
        OsmElementKind::Node => 0,
        OsmElementKind::Way => WAY_ID_PREFIX,
        OsmElementKind::Relation => REL_ID_PREFIX,
    };
    Some(prefix | base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OsmElementKind::Node, 42, Some(42))]
    #[case(OsmElementKind::Way, 42, Some((1 << 62) | 42))]
    #[case(OsmElementKind::Relation, 7, Some((1 << 63) | 7))]
    #[case(OsmElementKind::Node, -1, None)]
    #[case(OsmElementKind::Way, 1 << 62, None)]
    fn encodes_ids_by_kind(
        #[case] kind: OsmElementKind,
        #[case] raw: i64,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(encode_element_id(kind, raw), expected);
    }
}
