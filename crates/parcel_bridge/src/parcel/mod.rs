//! World grid addressing
//!
//! Parcels are the cells of the shared world. This module maps them to
//! world-space offsets for the scenes that own them.

mod grid;

pub use grid::{FloorHeight, GridPositioner, ParcelCoord};
