//! Core parts of the algorithms without abstraction.

mod back_propagation;
mod forward;
mod loss;

pub use back_propagation::*;
pub use forward::*;
pub use loss::*;

use crate::NodeId;

/// Arena index of `id`, where `layer_offsets[u]` is the index of the first node of layer `u`.
#[inline(always)]
fn arena_index(layer_offsets: &[usize], id: NodeId) -> usize {
    layer_offsets[id.layer] + id.position
}
