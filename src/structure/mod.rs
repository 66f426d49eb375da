//! # Network Structure
//!
//! The core data model: modules with time-indexed buffers, parametrized
//! connections between them, shared ("mother") parameter stores, the
//! two-phase network container, and the swiping-lattice builder.

pub mod buffer;
pub mod connections;
pub mod module;
pub mod modules;
pub mod network;
pub mod swiping;

pub use buffer::Buffer;
pub use connections::{
    ConnectionBase, ConnectionKind, FullConnection, IdentityConnection, MotherConnection,
    NetworkConnection, ParamRef, ParameterStore,
};
pub use module::{ModuleBase, ModuleId, ModuleKind, NetworkModule};
pub use modules::{BiasUnit, LinearLayer, LstmLayer, ModuleMesh, SigmoidLayer, TanhLayer};
pub use network::{Network, NetworkBuilder};
pub use swiping::{build_swiping_network, PredefinedMothers, SwipeDirection, SwipingOptions};

use thiserror::Error;

pub type StructureResult<T> = std::result::Result<T, StructureError>;

/// Errors of network assembly and propagation.
///
/// Configuration and shared-state errors surface at construction time,
/// structural errors at the offending call. Nothing is retried or
/// silently corrected; every error propagates to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("Module with id {0} is not registered in this builder")]
    ModuleNotFound(module::ModuleId),

    #[error(
        "Connection '{connection}': slice {from}..{to} does not fit module '{module}' of width {width}"
    )]
    SliceOutOfBounds {
        connection: String,
        module: String,
        from: usize,
        to: usize,
        width: usize,
    },

    #[error(
        "Connection '{connection}' expects {expected} parameters, but mother connection '{mother}' holds {actual}. \
         Every connection sharing one mother must have identical indim and outdim."
    )]
    SharedSizeMismatch {
        connection: String,
        mother: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Connection '{connection}' ({indim} -> {outdim}) does not match the shape \
         {bound_indim} -> {bound_outdim} already bound to mother connection '{mother}'"
    )]
    SharedShapeMismatch {
        connection: String,
        mother: String,
        indim: usize,
        outdim: usize,
        bound_indim: usize,
        bound_outdim: usize,
    },

    #[error("Identity connection '{connection}' requires equal slice widths, got {indim} -> {outdim}")]
    IdentityDimensionMismatch {
        connection: String,
        indim: usize,
        outdim: usize,
    },

    #[error("Parameter vector of length {actual} does not match the expected size {expected}")]
    ParameterSizeMismatch { expected: usize, actual: usize },

    #[error("Parameter index {index} is out of range for a connection with {size} parameters")]
    ParameterIndexOutOfRange { index: usize, size: usize },

    #[error("Network input has length {actual}, but the input modules expect {expected}")]
    InputSizeMismatch { expected: usize, actual: usize },

    #[error("Output error has length {actual}, but the output modules produce {expected}")]
    OutputSizeMismatch { expected: usize, actual: usize },

    #[error("backActivate called without a matching prior activation")]
    NoPriorActivation,

    #[error(
        "Feed-forward connections form a cycle through module '{0}'. \
         Close loops with recurrent connections instead."
    )]
    ForwardCycle(String),

    #[error("Mesh '{mesh}': expected dimensions {expected:?}, got {actual:?}")]
    MeshDimensionMismatch {
        mesh: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Mesh '{mesh}' must have uniform per-cell dimensions; module '{module}' differs")]
    MeshNotUniform { mesh: String, module: String },

    #[error("Swiping networks need every axis larger than 1, but axis {axis} has size {size}")]
    AxisTooSmall { axis: usize, size: usize },

    #[error("buildNetwork needs at least an input and an output layer, got {0}")]
    TooFewLayers(usize),

    #[error("Network description references unknown mother connection '{0}'")]
    UnknownMother(String),

    #[error("Network description is inconsistent: {0}")]
    BadDescription(String),
}
