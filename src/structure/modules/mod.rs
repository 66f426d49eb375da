//! # Network Units
//!
//! Building blocks registered in a network: each unit owns its signal
//! buffers and implements the forward/backward transfer for one time step.
//!
//! ## Available Units
//!
//! - [`LinearLayer`]: identity transfer, the standard input/output layer
//! - [`SigmoidLayer`], [`TanhLayer`]: squashing transfer layers
//! - [`BiasUnit`]: constant 1.0 source, for bias weights via connections
//! - [`LstmLayer`]: gated recurrent cell with an internal state buffer
//! - [`ModuleMesh`]: a regular multi-dimensional grid of uniform units

pub mod activations;
pub mod bias;
pub mod linear;
pub mod lstm;
pub mod mesh;

pub use activations::{SigmoidLayer, TanhLayer};
pub use bias::BiasUnit;
pub use linear::LinearLayer;
pub use lstm::LstmLayer;
pub use mesh::ModuleMesh;

use crate::structure::module::{ModuleKind, NetworkModule};
use crate::structure::{StructureError, StructureResult};

/// Instantiates a unit of the given kind and output dimension, used by
/// the layered shortcuts and by network reconstruction.
pub fn module_from_kind(
    kind: ModuleKind,
    dim: usize,
    name: impl Into<String>,
) -> StructureResult<Box<dyn NetworkModule>> {
    Ok(match kind {
        ModuleKind::Linear => Box::new(LinearLayer::new(dim, name)),
        ModuleKind::Sigmoid => Box::new(SigmoidLayer::new(dim, name)),
        ModuleKind::Tanh => Box::new(TanhLayer::new(dim, name)),
        ModuleKind::Lstm => Box::new(LstmLayer::new(dim, name)),
        ModuleKind::Bias => {
            if dim != 1 {
                return Err(StructureError::BadDescription(format!(
                    "bias unit always has width 1, got {}",
                    dim
                )));
            }
            Box::new(BiasUnit::new(name))
        }
    })
}
