//! Модуль, реализующий разделяемые хранилища параметров.
//!
//! Хранилище (`ParameterStore`) владеет вектором параметров и накопителем
//! производных той же формы. Связи держат на него разделяемую ссылку
//! `Rc<RefCell<…>>`: обычная полная связь создаёт собственное хранилище,
//! а разделяемые связи получают его от материнской связи. Так несколько
//! структурных рёбер решётки физически пишут градиенты в один накопитель.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array1, ArrayView2, ArrayViewMut2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::structure::{StructureError, StructureResult};

/// Разделяемая ссылка на хранилище параметров.
pub type ParamRef = Rc<RefCell<ParameterStore>>;

/// Вектор параметров и накопитель производных фиксированного размера.
///
/// Инвариант: размер неизменен после создания; производные всегда той же
/// длины, что и параметры.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    params: Array1<f32>,
    derivs: Array1<f32>,
    /// Матричная форма, закреплённая первой разделяющей связью. Все
    /// последующие обязаны совпасть с ней, а не только с размером.
    bound_shape: Option<(usize, usize)>,
}

impl ParameterStore {
    pub fn new(size: usize) -> Self {
        Self {
            params: Array1::zeros(size),
            derivs: Array1::zeros(size),
            bound_shape: None,
        }
    }

    pub fn new_shared(size: usize) -> ParamRef {
        Rc::new(RefCell::new(Self::new(size)))
    }

    pub fn size(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &Array1<f32> {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Array1<f32> {
        &mut self.params
    }

    pub fn derivs(&self) -> &Array1<f32> {
        &self.derivs
    }

    pub fn set_params(&mut self, values: &[f32]) -> StructureResult<()> {
        if values.len() != self.params.len() {
            return Err(StructureError::ParameterSizeMismatch {
                expected: self.params.len(),
                actual: values.len(),
            });
        }
        self.params.assign(&ndarray::ArrayView1::from(values));
        Ok(())
    }

    /// Параметры как матрица `(outdim, indim)` для полной связи.
    pub fn matrix(&self, outdim: usize, indim: usize) -> ArrayView2<'_, f32> {
        self.params
            .view()
            .into_shape((outdim, indim))
            .expect("parameter length equals indim * outdim by construction")
    }

    /// Матрица весов вместе с изменяемым накопителем производных той же
    /// формы, для обратного прохода.
    pub fn matrix_and_derivs_mut(
        &mut self,
        outdim: usize,
        indim: usize,
    ) -> (ArrayView2<'_, f32>, ArrayViewMut2<'_, f32>) {
        let w = self
            .params
            .view()
            .into_shape((outdim, indim))
            .expect("parameter length equals indim * outdim by construction");
        let d = self
            .derivs
            .view_mut()
            .into_shape((outdim, indim))
            .expect("derivative length equals indim * outdim by construction");
        (w, d)
    }

    pub fn bound_shape(&self) -> Option<(usize, usize)> {
        self.bound_shape
    }

    pub fn bind_shape(&mut self, outdim: usize, indim: usize) {
        self.bound_shape = Some((outdim, indim));
    }

    pub fn reset_derivatives(&mut self) {
        self.derivs.fill(0.0);
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.params.len();
        self.params = Array1::random_using(n, Uniform::new(-0.5, 0.5), rng);
    }
}

/// Материнская связь: именованный контейнер параметров без собственной
/// топологии. Все разделяемые полные связи, созданные от неё, пишут
/// производные в её накопитель.
#[derive(Debug, Clone)]
pub struct MotherConnection {
    name: String,
    store: ParamRef,
}

impl MotherConnection {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            store: ParameterStore::new_shared(size),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.store.borrow().size()
    }

    pub fn store(&self) -> &ParamRef {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_store_accumulates_from_all_handles() {
        let mother = MotherConnection::new("m", 4);
        let a = Rc::clone(mother.store());
        let b = Rc::clone(mother.store());
        a.borrow_mut().derivs.fill(1.0);
        {
            let mut s = b.borrow_mut();
            let (_, mut d) = s.matrix_and_derivs_mut(2, 2);
            d[[0, 0]] += 2.0;
        }
        assert_eq!(mother.store().borrow().derivs()[0], 3.0);
    }

    #[test]
    fn set_params_rejects_wrong_length() {
        let mut store = ParameterStore::new(3);
        assert!(store.set_params(&[1.0, 2.0]).is_err());
        assert!(store.set_params(&[1.0, 2.0, 3.0]).is_ok());
        assert_eq!(store.params()[2], 3.0);
    }
}
