//! Game-agnostic substrate for graph-based building games.
//!
//! The engine knows nothing about roads, pieces, or instruction budgets. It
//! provides the small parts every game layer needs:
//! - [`math::Vec3`], the coordinate type geometric matching runs on,
//! - [`world`], the traits a host environment implements (condition
//!   predicates, motion drivers, pose lookup),
//! - [`counter::Counter`], a clamped counter,
//! - [`fingerprint`], canonical state hashing for regression-style tests.

pub mod counter;
pub mod fingerprint;
pub mod math;
pub mod world;
