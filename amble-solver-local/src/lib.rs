//! Local-search waypoint sequencer for amble.
//!
//! This crate provides [`LocalSearchSequencer`], the default implementation of
//! the [`Sequencer`](amble_core::Sequencer) trait. It treats ordering as an
//! open-path, single-vehicle routing problem: waypoint 0 is fixed as the
//! start, every other waypoint is visited once, and the walk does not return.
//!
//! A greedy path-cheapest-arc tour seeds the search. First-improvement 2-opt
//! reversals and single-waypoint relocations then shorten it until no move
//! helps, the pass limit is reached or the wall-clock budget runs out. The
//! best order found so far is always returned. Equal-cost arcs resolve to the
//! lower waypoint index, so a search that converges is reproducible.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod search;
mod sequencer;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use sequencer::{LocalSearchConfig, LocalSearchSequencer};
