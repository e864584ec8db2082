//! # Valkyr Compositor
//!
//! Raster snapshot cache for a retained widget tree. Widget subtrees record
//! their draw commands once into a [Snapshot](snapshot::Snapshot); the cache
//! keeps the rasterized result alive across frames and decides, per frame,
//! which snapshots stay resident.
//!
//! Entries live in one of two partitions: the [Cache](cache::Cache) holds
//! everything intersecting the viewport, sorted by z for compositing, while
//! [Residuals](cache::Residuals) retains snapshots that scrolled out of view
//! in case they come back. [lru_resolve](cache::lru_resolve) is the per-frame
//! pass that moves entries between the two and reclaims surface memory from
//! residuals that have been out of view the longest.
//!
//! Rasterization itself is delegated to a
//! [SurfaceProvider](snapshot::SurfaceProvider), so the cache is independent
//! of the raster backend. Both the resolve pass and the providing backend are
//! expected to run on the single thread that owns the surfaces.

///Surface-space positions, extents and rectangles.
pub mod primitives;

///The two cache partitions and the per-frame resolve pass.
pub mod cache;

///Snapshot storage and the raster backend seam.
pub mod snapshot;

mod error;
pub use error::CompositorError;

pub use cache::{Cache, CacheBudget, CacheEntry, Residuals, lru_resolve};
pub use primitives::{Extent, Offset, Rect};
pub use snapshot::{Snapshot, SurfaceProvider};
