//! Client-side snapshot smoothing
//!
//! Feed every snapshot received from a room into a [`SnapshotBuffer`] and ask
//! it for the state to draw once per frame.

pub mod buffer;
pub mod lerp;

pub use buffer::{Enqueued, Interpolate, InterpolationBuffer, Sample, SharedInterpolationBuffer};

use crate::game::tuning::CLIENT_BUFFER_DELAY_MS;
use crate::game::Snapshot;

pub type SnapshotBuffer = InterpolationBuffer<Snapshot>;

/// Buffer seeded with the first snapshot of a room, using the standard delay
pub fn snapshot_buffer(initial: Snapshot) -> SnapshotBuffer {
    InterpolationBuffer::new(initial, CLIENT_BUFFER_DELAY_MS)
}
