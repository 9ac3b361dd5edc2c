//! # boids-grid
//!
//! Uniform-grid spatial hash for neighbour queries in particle flocking
//! simulations.
//!
//! Every tick the simulation hands over a snapshot of N positions. The hash
//! buckets their indices by grid cell into two flat arrays (a counting sort,
//! O(N + T)), and each boid then asks for the candidates around it instead
//! of testing all N points.
//!
//! ## Quick Start
//!
//! ```ignore
//! use boids_grid::prelude::*;
//!
//! #[derive(Positioned, Clone)]
//! struct Boid {
//!     position: Vec3,
//!     velocity: Vec3,
//! }
//!
//! let config = SpatialConfig::from_bounds(Vec3::splat(20.0), 8, boids.len())?;
//! let hash = SpatialHash::build(config, &boids)?;
//!
//! let mut buffer = QueryBuffer::new();
//! for boid in &boids {
//!     for &other in hash.query(boid.position, view_radius, &mut buffer)? {
//!         // candidates only: filter by distance before steering
//!     }
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Cells and buckets
//!
//! Space is cut into cubes of edge `cell_size`; a point's cell is
//! `floor(position / cell_size)`. Cells are hashed into `table_size` buckets
//! (twice the point count is a good default). Different cells can share a
//! bucket, so a query may return points from far away. Those are candidates,
//! not neighbours: use [`SpatialHash::query_within`] when exact distances are
//! needed.
//!
//! ### Layout
//!
//! The built layout is compressed: `offsets` holds `table_size + 1` bucket
//! starts and `indices` holds every point index once, grouped by bucket. It is
//! read-only until the next rebuild, so queries can run on any number of
//! threads.
//!
//! ### Epochs
//!
//! [`DoubleBuffered`] keeps two layouts, builds the next tick into the back
//! one and swaps, so queries never observe a half-built table.
//!
//! ## Features
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `parallel` | Hash points on the rayon thread pool during builds |
//! | `serde` | `Serialize`/`Deserialize` for [`SpatialConfig`] |

extern crate self as boids_grid;

pub mod epoch;
pub mod error;
pub mod query;
pub mod spatial;
mod table;

pub use boids_grid_derive::Positioned;
pub use bytemuck;
pub use epoch::DoubleBuffered;
pub use error::{Result, SpatialError};
pub use glam::{IVec3, UVec3, Vec3};
pub use query::QueryBuffer;
pub use spatial::{cell_of, hash_cell, GridParams, SpatialConfig};
pub use table::{BucketStats, SpatialHash};

/// Anything with a position in world space.
///
/// Implemented for [`Vec3`] and `[f32; 3]`; derive it for your own particle
/// structs with `#[derive(Positioned)]`.
///
/// # Example
///
/// ```ignore
/// #[derive(Positioned, Clone)]
/// struct Boid {
///     position: Vec3,           // picked up by name
///     velocity: Vec3,
/// }
///
/// #[derive(Positioned, Clone)]
/// struct Marker {
///     #[position]
///     at: Vec3,                 // or marked explicitly
///     label: u32,
/// }
/// ```
pub trait Positioned: Send + Sync {
    /// World-space position used for bucketing.
    fn position(&self) -> Vec3;
}

impl Positioned for Vec3 {
    #[inline]
    fn position(&self) -> Vec3 {
        *self
    }
}

impl Positioned for [f32; 3] {
    #[inline]
    fn position(&self) -> Vec3 {
        Vec3::from_array(*self)
    }
}

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use boids_grid::prelude::*;
/// ```
pub mod prelude {
    pub use crate::epoch::DoubleBuffered;
    pub use crate::error::SpatialError;
    pub use crate::query::QueryBuffer;
    pub use crate::spatial::SpatialConfig;
    pub use crate::table::SpatialHash;
    pub use crate::Positioned;
    pub use crate::{IVec3, Vec3};
}
