//! Модуль, реализующий тождественную связь без параметров.

use std::ops::Range;

use ndarray::{ArrayView1, ArrayViewMut1};

use crate::structure::connections::{ConnectionBase, ConnectionKind, NetworkConnection};
use crate::structure::module::ModuleId;
use crate::structure::network::NetworkBuilder;
use crate::structure::{StructureError, StructureResult};

/// Тождественная связь: переносит срез буфера без преобразования.
///
/// Ширины срезов обязаны совпадать, это проверяется при создании.
pub struct IdentityConnection {
    base: ConnectionBase,
}

impl IdentityConnection {
    pub fn new(
        builder: &NetworkBuilder,
        source: ModuleId,
        dest: ModuleId,
        name: impl Into<String>,
    ) -> StructureResult<Self> {
        let (_, src_out) = builder.module_dims(source)?;
        let (dst_in, _) = builder.module_dims(dest)?;
        Self::with_slices(builder, source, dest, 0..src_out, 0..dst_in, name)
    }

    pub fn with_slices(
        builder: &NetworkBuilder,
        source: ModuleId,
        dest: ModuleId,
        in_slice: Range<usize>,
        out_slice: Range<usize>,
        name: impl Into<String>,
    ) -> StructureResult<Self> {
        let name = name.into();
        let (_, src_out) = builder.module_dims(source)?;
        let (dst_in, _) = builder.module_dims(dest)?;
        if in_slice.end > src_out {
            return Err(StructureError::SliceOutOfBounds {
                connection: name,
                module: builder.module_name(source)?.to_string(),
                from: in_slice.start,
                to: in_slice.end,
                width: src_out,
            });
        }
        if out_slice.end > dst_in {
            return Err(StructureError::SliceOutOfBounds {
                connection: name,
                module: builder.module_name(dest)?.to_string(),
                from: out_slice.start,
                to: out_slice.end,
                width: dst_in,
            });
        }
        if in_slice.len() != out_slice.len() {
            return Err(StructureError::IdentityDimensionMismatch {
                connection: name,
                indim: in_slice.len(),
                outdim: out_slice.len(),
            });
        }
        Ok(Self {
            base: ConnectionBase {
                name,
                source,
                dest,
                in_from: in_slice.start,
                in_to: in_slice.end,
                out_from: out_slice.start,
                out_to: out_slice.end,
            },
        })
    }
}

impl NetworkConnection for IdentityConnection {
    fn base(&self) -> &ConnectionBase {
        &self.base
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Identity
    }

    fn forward(&self, source_output: ArrayView1<f32>, mut dest_input: ArrayViewMut1<f32>) {
        let src = source_output.slice(ndarray::s![self.base.in_from..self.base.in_to]);
        let mut dst = dest_input.slice_mut(ndarray::s![self.base.out_from..self.base.out_to]);
        dst += &src;
    }

    fn backward(
        &self,
        dest_error: ArrayView1<f32>,
        _source_output: ArrayView1<f32>,
        mut source_error: ArrayViewMut1<f32>,
    ) {
        let derr = dest_error.slice(ndarray::s![self.base.out_from..self.base.out_to]);
        let mut serr = source_error.slice_mut(ndarray::s![self.base.in_from..self.base.in_to]);
        serr += &derr;
    }
}
