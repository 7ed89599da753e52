//! Grid-to-world positioning
//!
//! Parcels are addressed by integer grid coordinates. A scene places each of
//! its parcels relative to its base parcel, so the same relative layout always
//! yields the same local offsets no matter where the scene sits in the world.

use crate::core::config::ParcelSettings;
use crate::foundation::math::Vec3;
use serde::{Serialize, Deserialize};
use std::fmt;

/// One cell of the shared world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParcelCoord {
    /// Grid column
    pub x: i32,
    /// Grid row
    pub y: i32,
}

impl ParcelCoord {
    /// Create a grid coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ParcelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl From<(i32, i32)> for ParcelCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Where parcel floors sit vertically
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloorHeight {
    /// Pinned to the debug constant
    Debug(f32),
    /// Supplied from outside (renderer or configuration)
    External(f32),
}

impl FloorHeight {
    /// Height in world units
    pub const fn value(self) -> f32 {
        match self {
            Self::Debug(h) | Self::External(h) => h,
        }
    }
}

/// Maps grid coordinates to world-space offsets
#[derive(Debug, Clone, PartialEq)]
pub struct GridPositioner {
    parcel_size: f32,
    floor: FloorHeight,
}

impl GridPositioner {
    /// Create a positioner for the given cell size and floor policy
    pub const fn new(parcel_size: f32, floor: FloorHeight) -> Self {
        Self { parcel_size, floor }
    }

    /// Create a positioner from settings and the debug flag
    pub fn from_settings(settings: &ParcelSettings, debug: bool) -> Self {
        let floor = if debug {
            FloorHeight::Debug(settings.debug_floor_height)
        } else {
            FloorHeight::External(settings.floor_height)
        };
        Self::new(settings.parcel_size, floor)
    }

    /// Edge length of one parcel
    pub const fn parcel_size(&self) -> f32 {
        self.parcel_size
    }

    /// Current floor policy
    pub const fn floor(&self) -> FloorHeight {
        self.floor
    }

    /// Replace the floor policy
    pub fn set_floor(&mut self, floor: FloorHeight) {
        self.floor = floor;
    }

    /// Offset of `parcel`'s centre relative to the scene rooted at `base`
    #[allow(clippy::cast_precision_loss)]
    pub fn parcel_offset(&self, base: ParcelCoord, parcel: ParcelCoord) -> Vec3 {
        let half = self.parcel_size / 2.0;
        let dx = i64::from(parcel.x) - i64::from(base.x);
        let dy = i64::from(parcel.y) - i64::from(base.y);
        Vec3::new(
            dx as f32 * self.parcel_size + half,
            self.floor.value(),
            dy as f32 * self.parcel_size + half,
        )
    }

    /// Offsets for every parcel of a scene, in manifest order
    pub fn layout(&self, base: ParcelCoord, parcels: &[ParcelCoord]) -> Vec<Vec3> {
        parcels.iter().map(|p| self.parcel_offset(base, *p)).collect()
    }

    /// World-space origin of a scene whose base parcel is `base`
    #[allow(clippy::cast_precision_loss)]
    pub fn scene_origin(&self, base: ParcelCoord) -> Vec3 {
        Vec3::new(
            base.x as f32 * self.parcel_size,
            0.0,
            base.y as f32 * self.parcel_size,
        )
    }

    /// Grid cell containing a world-space position
    #[allow(clippy::cast_possible_truncation)]
    pub fn parcel_at(&self, world: Vec3) -> ParcelCoord {
        ParcelCoord::new(
            (world.x / self.parcel_size).floor() as i32,
            (world.z / self.parcel_size).floor() as i32,
        )
    }
}

impl Default for GridPositioner {
    fn default() -> Self {
        Self::from_settings(&ParcelSettings::default(), false)
    }
}
