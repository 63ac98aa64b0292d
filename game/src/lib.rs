//! Road-program building game: players assemble road pieces into a graph
//! that encodes a program, then an agent traverses it.
//!
//! - [`road_graph`]: ports, pieces, links, path resolution.
//! - [`catalog`]: piece templates and geometric matching.
//! - [`templates`]: the built-in piece roster.
//! - [`instructions`]: instruction kinds and the per-level budget.
//! - [`placement`]: chain insertion, gap backfill, transactional undo.
//! - [`traversal`]: the agent state machine.
//! - [`session`]: button-press facade wiring everything together.

pub mod catalog;
pub mod instructions;
pub mod placement;
pub mod road_graph;
pub mod session;
pub mod templates;
pub mod traversal;
