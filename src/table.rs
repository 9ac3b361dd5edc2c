//! CSR bucket layout built by counting sort, and range queries over it.
//!
//! The layout is two flat arrays: `offsets` (one entry per bucket plus a
//! guard) and `indices` (every point index exactly once, grouped by bucket).
//! It is rebuilt from scratch every tick and is read-only between rebuilds,
//! so any number of threads may query it at once.

use glam::{IVec3, Vec3};
use log::{debug, log_enabled, trace, warn, Level};

use crate::error::{Result, SpatialError};
use crate::query::QueryBuffer;
use crate::spatial::{hash_cell, GridParams, SpatialConfig};
use crate::Positioned;

/// Marks a non-finite position in the bucket scratch. Never a valid bucket
/// because table sizes stop at `i32::MAX`.
const INVALID_BUCKET: u32 = u32::MAX;

/// Uniform-grid spatial hash in compressed (CSR) form.
#[derive(Clone, Debug)]
pub struct SpatialHash {
    config: SpatialConfig,
    /// Start of each bucket's segment in `indices`, plus a guard equal to N.
    offsets: Vec<u32>,
    /// Point indices grouped by bucket.
    indices: Vec<u32>,
    /// Bucket of every point, reused across rebuilds.
    scratch: Vec<u32>,
}

/// Bucket occupancy summary, for tuning the table size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BucketStats {
    /// Buckets holding at least one point.
    pub used: u32,
    /// Largest bucket.
    pub max: u32,
    /// Mean size of the used buckets.
    pub mean: f32,
}

impl SpatialHash {
    /// Create an empty layout (no points) for `config`.
    pub fn new(config: SpatialConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            offsets: vec![0; config.table_size as usize + 1],
            indices: Vec::new(),
            scratch: Vec::new(),
        })
    }

    /// Build a layout from a snapshot of positions.
    pub fn build<P: Positioned>(config: SpatialConfig, positions: &[P]) -> Result<Self> {
        let mut hash = Self::new(config)?;
        hash.rebuild(positions)?;
        Ok(hash)
    }

    /// Replace the configuration. The layout is reset to empty and must be
    /// rebuilt before it is queried again.
    pub fn set_config(&mut self, config: SpatialConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.offsets.clear();
        self.offsets.resize(config.table_size as usize + 1, 0);
        self.indices.clear();
        Ok(())
    }

    /// Rebuild the layout from a new snapshot, reusing the existing buffers.
    ///
    /// Runs a counting sort: count points per bucket, prefix-sum the counts
    /// into bucket end offsets, then scatter point indices while walking each
    /// bucket's offset back to its start. If any position is rejected the
    /// previous layout is left untouched.
    pub fn rebuild<P: Positioned>(&mut self, positions: &[P]) -> Result<()> {
        let count = u32::try_from(positions.len()).map_err(|_| {
            warn!("Rejected spatial hash build: {} points", positions.len());
            SpatialError::TooManyPoints(positions.len())
        })?;

        hash_points(&self.config, positions, &mut self.scratch);
        if let Some(index) = self.scratch.iter().position(|&b| b == INVALID_BUCKET) {
            warn!("Rejected spatial hash build: point {} is not finite", index);
            return Err(SpatialError::NonFinitePosition { index });
        }

        let table = self.config.table_size as usize;

        // Count
        self.offsets.clear();
        self.offsets.resize(table + 1, 0);
        for &bucket in &self.scratch {
            self.offsets[bucket as usize] += 1;
        }

        // Prefix sum: offsets[b] becomes the end of bucket b
        let mut end = 0u32;
        for offset in &mut self.offsets[..table] {
            end += *offset;
            *offset = end;
        }
        self.offsets[table] = end;
        debug_assert_eq!(end, count);

        // Scatter: walk each end back to the bucket start
        self.indices.clear();
        self.indices.resize(positions.len(), 0);
        for (point, &bucket) in self.scratch.iter().enumerate() {
            let slot = &mut self.offsets[bucket as usize];
            *slot -= 1;
            self.indices[*slot as usize] = point as u32;
        }

        if log_enabled!(Level::Debug) {
            let stats = self.occupancy();
            debug!(
                "Built spatial hash: {} points, {} buckets ({} used, max {}, mean {:.2})",
                count, table, stats.used, stats.max, stats.mean
            );
        }
        Ok(())
    }

    /// Collect candidate neighbours of `center` within `radius` into `buffer`.
    ///
    /// Scans the bucket of every cell in the inclusive box from
    /// `cell_of(center - radius)` to `cell_of(center + radius)`. The result is
    /// a superset of the true neighbours: it also holds points from unrelated
    /// cells that hash into a scanned bucket. Each bucket is scanned at most
    /// once, so no index is reported twice. When the box spans at least as
    /// many cells as there are buckets, every bucket is scanned.
    ///
    /// `radius` must be finite and non-negative and `center` finite.
    pub fn query<'b>(
        &self,
        center: Vec3,
        radius: f32,
        buffer: &'b mut QueryBuffer,
    ) -> Result<&'b [u32]> {
        if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
            warn!("Rejected query at {} with radius {}", center, radius);
            return Err(SpatialError::InvalidQuery { center, radius });
        }

        let table = self.config.table_size;
        let min = self.config.cell_of(center - radius);
        let max = self.config.cell_of(center + radius);
        let span = |lo: i32, hi: i32| (hi as i64 - lo as i64 + 1).max(0);
        let cells = span(min.x, max.x)
            .saturating_mul(span(min.y, max.y))
            .saturating_mul(span(min.z, max.z));

        buffer.begin(table);
        if cells >= table as i64 {
            buffer.push_slice(&self.indices);
        } else {
            for x in min.x..=max.x {
                for y in min.y..=max.y {
                    for z in min.z..=max.z {
                        let bucket = hash_cell(IVec3::new(x, y, z), table);
                        if buffer.visit(bucket) {
                            buffer.push_slice(self.bucket(bucket));
                        }
                    }
                }
            }
        }

        trace!(
            "Query at {} radius {}: {} cells, {} candidates",
            center,
            radius,
            cells,
            buffer.required()
        );
        buffer.finish()?;
        Ok(buffer.candidates())
    }

    /// Like [`query`](Self::query), then keep only candidates whose position
    /// lies within `radius` of `center`.
    ///
    /// `positions` must be the snapshot this layout was built from.
    pub fn query_within<'b, P: Positioned>(
        &self,
        center: Vec3,
        radius: f32,
        positions: &[P],
        buffer: &'b mut QueryBuffer,
    ) -> Result<&'b [u32]> {
        if positions.len() != self.len() {
            return Err(SpatialError::PositionCountMismatch {
                expected: self.len(),
                actual: positions.len(),
            });
        }
        self.query(center, radius, buffer)?;
        let radius_sq = radius * radius;
        buffer.retain(|index| {
            positions[index as usize].position().distance_squared(center) <= radius_sq
        });
        Ok(buffer.candidates())
    }

    /// Point indices stored in `bucket`. Empty for buckets outside the table.
    pub fn bucket(&self, bucket: u32) -> &[u32] {
        let b = bucket as usize;
        match (self.offsets.get(b), self.offsets.get(b + 1)) {
            (Some(&start), Some(&end)) => &self.indices[start as usize..end as usize],
            _ => &[],
        }
    }

    /// Bucket a position falls into.
    #[inline]
    pub fn bucket_of(&self, position: Vec3) -> u32 {
        self.config.bucket_of(position)
    }

    /// Occupancy summary over all buckets.
    pub fn occupancy(&self) -> BucketStats {
        let mut used = 0u32;
        let mut max = 0u32;
        for window in self.offsets.windows(2) {
            let size = window[1] - window[0];
            if size > 0 {
                used += 1;
                max = max.max(size);
            }
        }
        let mean = if used == 0 {
            0.0
        } else {
            self.indices.len() as f32 / used as f32
        };
        BucketStats { used, max, mean }
    }

    /// Configuration the layout was built with.
    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Edge length of a grid cell.
    pub fn cell_size(&self) -> f32 {
        self.config.cell_size
    }

    /// Number of buckets.
    pub fn table_size(&self) -> u32 {
        self.config.table_size
    }

    /// Number of points in the layout.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Bucket start offsets, `table_size + 1` entries.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Point indices grouped by bucket.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw bytes of [`offsets`](Self::offsets), for upload.
    pub fn offsets_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.offsets)
    }

    /// Raw bytes of [`indices`](Self::indices), for upload.
    pub fn indices_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Header describing this layout.
    pub fn params(&self) -> GridParams {
        GridParams {
            cell_size: self.config.cell_size,
            table_size: self.config.table_size,
            num_points: self.indices.len() as u32,
            _pad: 0,
        }
    }
}

/// Fill `out` with the bucket of every position, or `INVALID_BUCKET` for
/// positions that are not finite.
#[cfg(not(feature = "parallel"))]
fn hash_points<P: Positioned>(config: &SpatialConfig, positions: &[P], out: &mut Vec<u32>) {
    out.clear();
    out.extend(positions.iter().map(|p| bucket_or_invalid(config, p.position())));
}

#[cfg(feature = "parallel")]
fn hash_points<P: Positioned>(config: &SpatialConfig, positions: &[P], out: &mut Vec<u32>) {
    use rayon::prelude::*;

    out.clear();
    out.resize(positions.len(), 0);
    out.par_iter_mut()
        .zip(positions.par_iter())
        .for_each(|(slot, p)| *slot = bucket_or_invalid(config, p.position()));
}

#[inline]
fn bucket_or_invalid(config: &SpatialConfig, position: Vec3) -> u32 {
    if position.is_finite() {
        config.bucket_of(position)
    } else {
        INVALID_BUCKET
    }
}
