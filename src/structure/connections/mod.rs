//! # Connections
//!
//! Directed parametrized edges between module buffers. A connection reads
//! a slice of its source module's output-buffer row and deposits into a
//! slice of its destination module's input-buffer row; the backward pass
//! mirrors the flow and accumulates parameter derivatives.
//!
//! Parameters live in a [`ParameterStore`] behind a shared handle, which
//! is what makes weight-tying possible: a [`MotherConnection`] owns one
//! canonical store, and any number of shared full connections reference it.

pub mod full;
pub mod identity;
pub mod shared;

pub use full::FullConnection;
pub use identity::IdentityConnection;
pub use shared::{MotherConnection, ParamRef, ParameterStore};

use ndarray::{ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use crate::structure::module::ModuleId;

/// Closed set of connection kinds, for introspection and serialization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    Full,
    SharedFull,
    Identity,
}

/// Endpoints and buffer slices common to every connection.
#[derive(Debug, Clone)]
pub struct ConnectionBase {
    pub name: String,
    pub source: ModuleId,
    pub dest: ModuleId,
    /// Slice of the source module's output buffer this connection reads.
    pub in_from: usize,
    pub in_to: usize,
    /// Slice of the destination module's input buffer this connection writes.
    pub out_from: usize,
    pub out_to: usize,
}

/// Trait defining the common interface for all connections.
///
/// `forward` and `backward` receive full buffer rows of the endpoint
/// modules and apply themselves to their declared slices. Both only ever
/// accumulate (`+=`) into their target row, so several connections can
/// share an endpoint.
pub trait NetworkConnection {
    fn base(&self) -> &ConnectionBase;

    fn kind(&self) -> ConnectionKind;

    /// dest_input[out_slice] += f(source_output[in_slice])
    fn forward(&self, source_output: ArrayView1<f32>, dest_input: ArrayViewMut1<f32>);

    /// source_error[in_slice] += fᵀ(dest_error[out_slice]), and parameter
    /// derivatives accumulate into the connection's store, if it has one.
    fn backward(
        &self,
        dest_error: ArrayView1<f32>,
        source_output: ArrayView1<f32>,
        source_error: ArrayViewMut1<f32>,
    );

    /// The parameter store, for connections that carry weights.
    fn parameters(&self) -> Option<&ParamRef> {
        None
    }

    /// Name of the mother connection the store is shared with, if any.
    fn mother_name(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> &str {
        &self.base().name
    }

    fn source(&self) -> ModuleId {
        self.base().source
    }

    fn dest(&self) -> ModuleId {
        self.base().dest
    }

    /// Width of the source-side slice.
    fn indim(&self) -> usize {
        self.base().in_to - self.base().in_from
    }

    /// Width of the destination-side slice.
    fn outdim(&self) -> usize {
        self.base().out_to - self.base().out_from
    }
}
