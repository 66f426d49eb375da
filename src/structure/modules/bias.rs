//! Модуль-источник постоянного смещения.

use crate::structure::module::{ModuleBase, ModuleKind, NetworkModule};

/// Единичный модуль без входа, выход которого всегда равен 1.0.
///
/// Веса смещения реализуются полной связью от этого модуля к любому слою.
#[derive(Debug, Clone)]
pub struct BiasUnit {
    base: ModuleBase,
}

impl BiasUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { base: ModuleBase::new(name, 0, 1) }
    }
}

impl NetworkModule for BiasUnit {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Bias
    }

    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn forward_step(&mut self, t: usize) {
        self.base.output.row_mut(t)[0] = 1.0;
    }

    fn backward_step(&mut self, _t: usize) {
        // входа нет, ошибке некуда течь
    }
}
