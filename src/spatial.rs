//! Grid mapping and hashing for the uniform-grid spatial hash.
//!
//! World space is cut into axis-aligned cubes of edge `cell_size`. A point's
//! cell is `floor(position / cell_size)` per axis, and cells are folded into
//! a fixed number of buckets by [`hash_cell`]. Distinct cells may share a
//! bucket; equal cells always do.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, UVec3, Vec3};

use crate::error::{Result, SpatialError};

/// Per-axis hash multipliers. Each is the product of a large odd prime and a
/// small odd factor, folded into `i32` with wrapping arithmetic.
const HASH_X: i32 = 92_837_111i32.wrapping_mul(3);
const HASH_Y: i32 = 689_287_499i32.wrapping_mul(5);
const HASH_Z: i32 = 283_923_481i32.wrapping_mul(7);

/// Largest accepted table size; bucket ids must stay representable after the
/// signed remainder in [`hash_cell`].
pub const MAX_TABLE_SIZE: u32 = i32::MAX as u32;

/// Configuration for the spatial hash grid.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialConfig {
    /// Edge length of each cell in world units
    pub cell_size: f32,
    /// Number of hash buckets
    pub table_size: u32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cell_size: 0.1,
            table_size: 1024,
        }
    }
}

impl SpatialConfig {
    /// Create a validated configuration.
    pub fn new(cell_size: f32, table_size: u32) -> Result<Self> {
        let config = Self {
            cell_size,
            table_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration with the recommended table size of twice the point count.
    pub fn for_particles(cell_size: f32, count: usize) -> Result<Self> {
        Self::new(cell_size, default_table_size(count))
    }

    /// Derive the cell size from a bounding volume and a neighbour target.
    ///
    /// `cell_size = (volume / (max_neighbors_per_cell * count))^(1/3)`, table
    /// size `2 * count`.
    pub fn from_bounds(bounds: Vec3, max_neighbors_per_cell: u32, count: usize) -> Result<Self> {
        if !bounds.is_finite() || bounds.cmple(Vec3::ZERO).any() {
            return Err(SpatialError::InvalidBounds(bounds));
        }
        if max_neighbors_per_cell == 0 || count == 0 {
            return Err(SpatialError::InvalidNeighborTarget);
        }

        let volume = bounds.x as f64 * bounds.y as f64 * bounds.z as f64;
        let per_cell = volume / (max_neighbors_per_cell as f64 * count as f64);
        let cell_size = per_cell.cbrt() as f32;

        Self::for_particles(cell_size, count)
    }

    /// Reject configurations that would divide by zero or hash out of range.
    pub fn validate(&self) -> Result<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(SpatialError::InvalidCellSize(self.cell_size));
        }
        if self.table_size == 0 || self.table_size > MAX_TABLE_SIZE {
            return Err(SpatialError::InvalidTableSize(self.table_size));
        }
        Ok(())
    }

    /// Replace the table size, keeping the cell size.
    pub fn with_table_size(self, table_size: u32) -> Result<Self> {
        Self::new(self.cell_size, table_size)
    }

    /// Whole cells that fit along each axis of `bounds`.
    pub fn cells_per_axis(&self, bounds: Vec3) -> UVec3 {
        (bounds / self.cell_size).max(Vec3::ZERO).as_uvec3()
    }

    /// Cell containing `position` under this configuration.
    #[inline]
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        cell_of(position, self.cell_size)
    }

    /// Bucket for `cell` under this configuration.
    #[inline]
    pub fn hash_cell(&self, cell: IVec3) -> u32 {
        hash_cell(cell, self.table_size)
    }

    /// Bucket for a world position.
    #[inline]
    pub fn bucket_of(&self, position: Vec3) -> u32 {
        self.hash_cell(self.cell_of(position))
    }
}

/// Twice the point count, never less than one bucket.
pub fn default_table_size(count: usize) -> u32 {
    count
        .saturating_mul(2)
        .clamp(1, MAX_TABLE_SIZE as usize) as u32
}

/// Map a world position to its integer cell.
///
/// Floors toward negative infinity, so `-0.5` lands in cell `-1`. Values
/// beyond the `i32` range saturate. `cell_size` must be positive.
#[inline]
pub fn cell_of(position: Vec3, cell_size: f32) -> IVec3 {
    (position / cell_size).floor().as_ivec3()
}

/// Fold a cell coordinate into a bucket in `0..table_size`.
///
/// Not collision free: nearby cells spread well, but unrelated cells can land
/// in the same bucket. `table_size` is clamped to `1..=MAX_TABLE_SIZE`, so a
/// zero table maps every cell to bucket 0.
#[inline]
pub fn hash_cell(cell: IVec3, table_size: u32) -> u32 {
    let h = cell.x.wrapping_mul(HASH_X)
        ^ cell.y.wrapping_mul(HASH_Y)
        ^ cell.z.wrapping_mul(HASH_Z);
    let table = table_size.clamp(1, MAX_TABLE_SIZE) as i32;
    // remainder first: |i32::MIN| would overflow
    (h % table).unsigned_abs()
}

/// GPU-friendly header describing a built layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GridParams {
    pub cell_size: f32,
    pub table_size: u32,
    pub num_points: u32,
    pub _pad: u32,
}
