//! Модуль, реализующий полную (плотную) связь.
//!
//! Полная связь соединяет каждый элемент выбранного среза выходного буфера
//! источника с каждым элементом среза входного буфера приёмника. Вектор её
//! параметров имеет длину `indim * outdim` и читается как матрица
//! `(outdim, indim)` в построчном порядке.

use std::ops::Range;
use std::rc::Rc;

use ndarray::{ArrayView1, ArrayViewMut1};

use crate::structure::connections::{
    ConnectionBase, ConnectionKind, MotherConnection, NetworkConnection, ParamRef, ParameterStore,
};
use crate::structure::module::ModuleId;
use crate::structure::network::NetworkBuilder;
use crate::structure::{StructureError, StructureResult};

/// Плотная линейная связь: `dest += W · src` на прямом проходе.
///
/// Создаётся либо с собственным хранилищем параметров (`new`), либо от
/// материнской связи (`shared`), и тогда веса и накопитель производных
/// физически общие со всеми её разделяемыми связями.
pub struct FullConnection {
    base: ConnectionBase,
    store: ParamRef,
    mother: Option<String>,
}

impl FullConnection {
    /// Связь между полными буферами двух модулей, с собственными весами.
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

    /// Связь между срезами буферов. Срезы проверяются на границы сразу.
    pub fn with_slices(
        builder: &NetworkBuilder,
        source: ModuleId,
        dest: ModuleId,
        in_slice: Range<usize>,
        out_slice: Range<usize>,
        name: impl Into<String>,
    ) -> StructureResult<Self> {
        let base = validated_base(builder, source, dest, in_slice, out_slice, name)?;
        let size = (base.in_to - base.in_from) * (base.out_to - base.out_from);
        Ok(Self {
            base,
            store: ParameterStore::new_shared(size),
            mother: None,
        })
    }

    /// Разделяемая полная связь: параметры делегируются материнской связи.
    ///
    /// Размер хранилища материнской связи обязан совпадать с
    /// `indim * outdim` этой связи, иначе это ошибка конфигурации.
    pub fn shared(
        builder: &NetworkBuilder,
        mother: &MotherConnection,
        source: ModuleId,
        dest: ModuleId,
        name: impl Into<String>,
    ) -> StructureResult<Self> {
        let (_, src_out) = builder.module_dims(source)?;
        let (dst_in, _) = builder.module_dims(dest)?;
        let base = validated_base(builder, source, dest, 0..src_out, 0..dst_in, name)?;
        let indim = base.in_to - base.in_from;
        let outdim = base.out_to - base.out_from;
        if mother.size() != indim * outdim {
            return Err(StructureError::SharedSizeMismatch {
                connection: base.name,
                mother: mother.name().to_string(),
                expected: indim * outdim,
                actual: mother.size(),
            });
        }
        {
            let mut store = mother.store().borrow_mut();
            match store.bound_shape() {
                None => store.bind_shape(outdim, indim),
                Some(bound) if bound != (outdim, indim) => {
                    return Err(StructureError::SharedShapeMismatch {
                        connection: base.name,
                        mother: mother.name().to_string(),
                        indim,
                        outdim,
                        bound_indim: bound.1,
                        bound_outdim: bound.0,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            base,
            store: Rc::clone(mother.store()),
            mother: Some(mother.name().to_string()),
        })
    }

    /// Для плоского индекса параметра возвращает пару (смещение в выходном
    /// буфере источника, смещение во входном буфере приёмника), которую
    /// этот вес соединяет.
    pub fn param_index_to_buffers(&self, index: usize) -> StructureResult<(usize, usize)> {
        let size = self.indim() * self.outdim();
        if index >= size {
            return Err(StructureError::ParameterIndexOutOfRange { index, size });
        }
        Ok((index % self.indim(), index / self.indim()))
    }
}

fn validated_base(
    builder: &NetworkBuilder,
    source: ModuleId,
    dest: ModuleId,
    in_slice: Range<usize>,
    out_slice: Range<usize>,
    name: impl Into<String>,
) -> StructureResult<ConnectionBase> {
    let name = name.into();
    let (_, src_out) = builder.module_dims(source)?;
    let (dst_in, _) = builder.module_dims(dest)?;
    if in_slice.end > src_out || in_slice.start > in_slice.end {
        return Err(StructureError::SliceOutOfBounds {
            connection: name,
            module: builder.module_name(source)?.to_string(),
            from: in_slice.start,
            to: in_slice.end,
            width: src_out,
        });
    }
    if out_slice.end > dst_in || out_slice.start > out_slice.end {
        return Err(StructureError::SliceOutOfBounds {
            connection: name,
            module: builder.module_name(dest)?.to_string(),
            from: out_slice.start,
            to: out_slice.end,
            width: dst_in,
        });
    }
    Ok(ConnectionBase {
        name,
        source,
        dest,
        in_from: in_slice.start,
        in_to: in_slice.end,
        out_from: out_slice.start,
        out_to: out_slice.end,
    })
}

impl NetworkConnection for FullConnection {
    fn base(&self) -> &ConnectionBase {
        &self.base
    }

    fn kind(&self) -> ConnectionKind {
        if self.mother.is_some() {
            ConnectionKind::SharedFull
        } else {
            ConnectionKind::Full
        }
    }

    fn parameters(&self) -> Option<&ParamRef> {
        Some(&self.store)
    }

    fn mother_name(&self) -> Option<&str> {
        self.mother.as_deref()
    }

    fn forward(&self, source_output: ArrayView1<f32>, mut dest_input: ArrayViewMut1<f32>) {
        let src = source_output.slice(ndarray::s![self.base.in_from..self.base.in_to]);
        let store = self.store.borrow();
        let w = store.matrix(self.outdim(), self.indim());
        let contribution = w.dot(&src);
        let mut dst = dest_input.slice_mut(ndarray::s![self.base.out_from..self.base.out_to]);
        dst += &contribution;
    }

    fn backward(
        &self,
        dest_error: ArrayView1<f32>,
        source_output: ArrayView1<f32>,
        mut source_error: ArrayViewMut1<f32>,
    ) {
        let derr = dest_error.slice(ndarray::s![self.base.out_from..self.base.out_to]);
        let src = source_output.slice(ndarray::s![self.base.in_from..self.base.in_to]);

        let carried = {
            let mut store = self.store.borrow_mut();
            let (w, mut derivs) = store.matrix_and_derivs_mut(self.outdim(), self.indim());
            // derivs[o, i] += derr[o] * src[i]
            for (o, mut row) in derivs.outer_iter_mut().enumerate() {
                row.scaled_add(derr[o], &src);
            }
            w.t().dot(&derr)
        };

        let mut serr = source_error.slice_mut(ndarray::s![self.base.in_from..self.base.in_to]);
        serr += &carried;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::modules::LinearLayer;

    #[test]
    fn param_index_maps_to_buffer_offsets() {
        let mut builder = NetworkBuilder::new("map");
        let a = builder.add_input_module(LinearLayer::new(3, "a"));
        let b = builder.add_output_module(LinearLayer::new(2, "b"));
        let conn = FullConnection::new(&builder, a, b, "a->b").unwrap();

        // построчная матрица (outdim x indim): вес k связывает
        // (k mod indim) источника с (k div indim) приёмника
        assert_eq!(conn.param_index_to_buffers(0).unwrap(), (0, 0));
        assert_eq!(conn.param_index_to_buffers(2).unwrap(), (2, 0));
        assert_eq!(conn.param_index_to_buffers(3).unwrap(), (0, 1));
        assert_eq!(conn.param_index_to_buffers(5).unwrap(), (2, 1));
        assert!(matches!(
            conn.param_index_to_buffers(6),
            Err(StructureError::ParameterIndexOutOfRange { index: 6, size: 6 })
        ));
    }

    #[test]
    fn mother_of_wrong_size_is_rejected() {
        let mut builder = NetworkBuilder::new("shared");
        let a = builder.add_input_module(LinearLayer::new(2, "a"));
        let b = builder.add_output_module(LinearLayer::new(2, "b"));
        let mother = MotherConnection::new("m", 3);
        assert!(matches!(
            FullConnection::shared(&builder, &mother, a, b, "a->b"),
            Err(StructureError::SharedSizeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    /// Совпадения одного только размера недостаточно: форма матрицы тоже
    /// закрепляется за материнской связью.
    #[test]
    fn mother_shape_is_bound_by_the_first_sharer() {
        let mut builder = NetworkBuilder::new("shared");
        let a2 = builder.add_input_module(LinearLayer::new(2, "a2"));
        let b6 = builder.add_module(LinearLayer::new(6, "b6"));
        let a3 = builder.add_module(LinearLayer::new(3, "a3"));
        let b4 = builder.add_output_module(LinearLayer::new(4, "b4"));

        let mother = MotherConnection::new("m", 12);
        let first = FullConnection::shared(&builder, &mother, a2, b6, "2->6");
        assert!(first.is_ok());
        assert!(matches!(
            FullConnection::shared(&builder, &mother, a3, b4, "3->4"),
            Err(StructureError::SharedShapeMismatch { .. })
        ));
    }
}
