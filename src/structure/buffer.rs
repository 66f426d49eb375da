//! Временные буферы модулей.
//!
//! Каждый модуль хранит свои сигналы в буферах, индексируемых по шагу
//! времени: строка `t` соответствует t-му вызову `activate` сети. Буферы
//! растут по мере активации и сохраняют историю шагов, необходимую для
//! обратного распространения во времени (BPTT) и для рекуррентных связей.

use ndarray::{Array1, ArrayView1, ArrayViewMut1};

/// Буфер фиксированной ширины с растущим числом строк-шагов.
///
/// Инвариант: ширина каждой строки равна объявленной ширине буфера,
/// новые строки создаются нулевыми.
#[derive(Debug, Clone)]
pub struct Buffer {
    width: usize,
    rows: Vec<Array1<f32>>,
}

impl Buffer {
    pub fn new(width: usize) -> Self {
        Self { width, rows: Vec::new() }
    }

    /// Ширина одной строки (размерность сигнала).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Число уже выделенных шагов.
    pub fn steps(&self) -> usize {
        self.rows.len()
    }

    /// Гарантирует, что строки `0..steps` существуют.
    pub fn grow_to(&mut self, steps: usize) {
        while self.rows.len() < steps {
            self.rows.push(Array1::zeros(self.width));
        }
    }

    pub fn row(&self, t: usize) -> ArrayView1<'_, f32> {
        self.rows[t].view()
    }

    pub fn row_mut(&mut self, t: usize) -> ArrayViewMut1<'_, f32> {
        self.rows[t].view_mut()
    }

    /// Копия строки, когда нужен владеющий вектор (например, чтобы
    /// одновременно читать источник и писать в приёмник связи).
    pub fn row_owned(&self, t: usize) -> Array1<f32> {
        self.rows[t].clone()
    }

    /// Сбрасывает всю историю шагов. Ширина сохраняется.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_with_zero_rows() {
        let mut b = Buffer::new(3);
        assert_eq!(b.steps(), 0);
        b.grow_to(2);
        assert_eq!(b.steps(), 2);
        assert!(b.row(1).iter().all(|&v| v == 0.0));
        b.row_mut(0)[1] = 5.0;
        b.grow_to(1);
        assert_eq!(b.row(0)[1], 5.0);
    }

    #[test]
    fn clear_keeps_width() {
        let mut b = Buffer::new(4);
        b.grow_to(3);
        b.clear();
        assert_eq!(b.steps(), 0);
        assert_eq!(b.width(), 4);
    }
}
