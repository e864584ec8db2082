//! # Valkyr
//!
//! Tracks how Vulkan images and buffers are accessed over a frame and derives
//! the pipeline barriers those accesses need. The trackers are plain state
//! machines over `ash`'s synchronization2 types: feed every access in
//! submission order through [ImageState::sync](state::ImageState::sync) or
//! [BufferState::sync](state::BufferState::sync) and record whatever barrier
//! comes back before encoding the access itself.
//!
//! Valkyr never talks to a device. Callers own command buffer recording and
//! submission; the crate only decides *whether* a barrier is needed and what
//! its scopes are. [BarrierBuilder](barrier::BarrierBuilder) batches the
//! derived barriers of one submission point into a single
//! [DependencyInfo](ash::vk::DependencyInfo).

pub use ash;

///Classification of access masks into read and write sets.
pub mod access;

///Barrier descriptors and batching helpers.
pub mod barrier;

///Per-resource access-sequence trackers.
pub mod state;

pub use barrier::{BarrierBuilder, BufferBarrier, ImageBarrier};
pub use state::{AccessSequence, BufferAccess, BufferState, ImageAccess, ImageState};
