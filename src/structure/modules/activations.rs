//! Модуль, содержащий слои со сжимающими передаточными функциями.

use crate::structure::module::{ModuleBase, ModuleKind, NetworkModule};

// --- Сигмоидный слой ---

/// Слой с логистической передаточной функцией `1 / (1 + e^-x)`.
#[derive(Debug, Clone)]
pub struct SigmoidLayer {
    base: ModuleBase,
}

impl SigmoidLayer {
    pub fn new(dim: usize, name: impl Into<String>) -> Self {
        Self { base: ModuleBase::new(name, dim, dim) }
    }
}

impl NetworkModule for SigmoidLayer {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Sigmoid
    }

    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn forward_step(&mut self, t: usize) {
        let x = self.base.input.row_owned(t);
        let mut out = self.base.output.row_mut(t);
        for (o, &v) in out.iter_mut().zip(x.iter()) {
            *o = 1.0 / (1.0 + (-v).exp());
        }
    }

    /// Производная выражается через уже вычисленный выход: `y * (1 - y)`.
    fn backward_step(&mut self, t: usize) {
        let y = self.base.output.row_owned(t);
        let err = self.base.output_error.row_owned(t);
        let mut inerr = self.base.input_error.row_mut(t);
        for ((ie, &e), &o) in inerr.iter_mut().zip(err.iter()).zip(y.iter()) {
            *ie = e * o * (1.0 - o);
        }
    }
}

// --- Слой гиперболического тангенса ---

/// Слой с передаточной функцией `tanh(x)`.
#[derive(Debug, Clone)]
pub struct TanhLayer {
    base: ModuleBase,
}

impl TanhLayer {
    pub fn new(dim: usize, name: impl Into<String>) -> Self {
        Self { base: ModuleBase::new(name, dim, dim) }
    }
}

impl NetworkModule for TanhLayer {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Tanh
    }

    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn forward_step(&mut self, t: usize) {
        let x = self.base.input.row_owned(t);
        let mut out = self.base.output.row_mut(t);
        for (o, &v) in out.iter_mut().zip(x.iter()) {
            *o = v.tanh();
        }
    }

    fn backward_step(&mut self, t: usize) {
        let y = self.base.output.row_owned(t);
        let err = self.base.output_error.row_owned(t);
        let mut inerr = self.base.input_error.row_mut(t);
        for ((ie, &e), &o) in inerr.iter_mut().zip(err.iter()).zip(y.iter()) {
            *ie = e * (1.0 - o * o);
        }
    }
}
