//! Game rules, independent of any terminal or physics backend.

pub mod cluster;
pub mod config;
pub mod events;
pub mod factory;
pub mod geometry;
pub mod overflow;
pub mod physics;
pub mod piece;
pub mod schedule;
pub mod score;
pub mod session;
#[cfg(test)]
pub mod testing;
