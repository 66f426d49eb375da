//! Модуль, реализующий линейный (тождественный) слой.

use crate::structure::module::{ModuleBase, ModuleKind, NetworkModule};

/// Линейный слой: выходной буфер равен входному.
///
/// Используется как входной и выходной слой сети. Вся линейная алгебра
/// живёт в связях, поэтому слою остаётся только перенос сигнала.
#[derive(Debug, Clone)]
pub struct LinearLayer {
    base: ModuleBase,
}

impl LinearLayer {
    pub fn new(dim: usize, name: impl Into<String>) -> Self {
        Self { base: ModuleBase::new(name, dim, dim) }
    }
}

impl NetworkModule for LinearLayer {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Linear
    }

    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn forward_step(&mut self, t: usize) {
        let row = self.base.input.row_owned(t);
        self.base.output.row_mut(t).assign(&row);
    }

    fn backward_step(&mut self, t: usize) {
        let row = self.base.output_error.row_owned(t);
        self.base.input_error.row_mut(t).assign(&row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_signal_through() {
        let mut layer = LinearLayer::new(2, "in");
        layer.grow_to(1);
        layer.base_mut().input.row_mut(0)[0] = 1.5;
        layer.base_mut().input.row_mut(0)[1] = -2.0;
        layer.forward_step(0);
        assert_eq!(layer.base().output.row(0)[0], 1.5);
        assert_eq!(layer.base().output.row(0)[1], -2.0);
    }
}
