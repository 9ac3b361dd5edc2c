//! Double-buffered layouts with an epoch counter.
//!
//! Two [`SpatialHash`] instances ping-pong: the next tick is built into the
//! back layout while the front one keeps serving queries, then the two are
//! swapped. A failed build never reaches the front.
//!
//! # Example
//!
//! ```ignore
//! use boids_grid::prelude::*;
//!
//! let mut grid = DoubleBuffered::new(SpatialConfig::for_particles(0.5, positions.len())?)?;
//! let mut buffer = QueryBuffer::new();
//!
//! // once per tick
//! grid.rebuild(&positions)?;
//! for (i, p) in positions.iter().enumerate() {
//!     let candidates = grid.current().query(*p, radius, &mut buffer)?;
//!     // ...
//! }
//! ```

use log::debug;

use crate::error::Result;
use crate::spatial::SpatialConfig;
use crate::table::SpatialHash;
use crate::Positioned;

/// Front/back pair of spatial hash layouts.
#[derive(Clone, Debug)]
pub struct DoubleBuffered {
    front: SpatialHash,
    back: SpatialHash,
    /// Configuration applied to the back layout on its next build.
    config: SpatialConfig,
    epoch: u64,
}

impl DoubleBuffered {
    /// Create a pair of empty layouts at epoch 0.
    pub fn new(config: SpatialConfig) -> Result<Self> {
        let front = SpatialHash::new(config)?;
        let back = front.clone();
        Ok(Self {
            front,
            back,
            config,
            epoch: 0,
        })
    }

    /// Layout published by the last successful build.
    pub fn current(&self) -> &SpatialHash {
        &self.front
    }

    /// Number of successful builds so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Configuration used by upcoming builds.
    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Change the configuration for upcoming builds. The published layout
    /// keeps its old configuration until the next swap.
    pub fn set_config(&mut self, config: SpatialConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Build the next epoch and publish it.
    ///
    /// On error nothing is published and the epoch does not advance.
    pub fn rebuild<P: Positioned>(&mut self, positions: &[P]) -> Result<u64> {
        self.prepare_back()?;
        self.back.rebuild(positions)?;
        Ok(self.publish())
    }

    /// Build the next epoch on this thread while `read` runs against the
    /// published layout on a scoped thread, then publish.
    ///
    /// Returns the new epoch and whatever `read` produced. If the build fails
    /// the published layout and the epoch are left unchanged.
    pub fn rebuild_while<P, F, R>(&mut self, positions: &[P], read: F) -> Result<(u64, R)>
    where
        P: Positioned,
        F: FnOnce(&SpatialHash) -> R + Send,
        R: Send,
    {
        self.prepare_back()?;
        let front = &self.front;
        let back = &mut self.back;
        let (built, output) = std::thread::scope(|s| {
            let reader = s.spawn(move || read(front));
            let built = back.rebuild(positions);
            match reader.join() {
                Ok(output) => (built, output),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        });
        built?;
        Ok((self.publish(), output))
    }

    /// Swap the freshly built back layout to the front and advance the epoch.
    /// Only called after the back layout was rebuilt successfully.
    fn publish(&mut self) -> u64 {
        std::mem::swap(&mut self.front, &mut self.back);
        self.epoch += 1;
        debug!(
            "Published spatial hash epoch {} ({} points)",
            self.epoch,
            self.front.len()
        );
        self.epoch
    }

    fn prepare_back(&mut self) -> Result<()> {
        if *self.back.config() != self.config {
            self.back.set_config(self.config)?;
        }
        Ok(())
    }
}
