//! Модуль, реализующий рекуррентную ячейку LSTM.
//!
//! Вход ячейки размерности `dim` состоит из четырёх секций по `dim`:
//! входной гейт, гейт забывания, кандидат состояния и выходной гейт
//! (в этом порядке). Связи, ведущие в ячейку, сами формируют эти секции,
//! поэтому ячейка не владеет никакими параметрами.
//!
//! Передаточные функции:
//!
//! ```text
//! i = σ(x_i)   f = σ(x_f)   g = tanh(x_g)   o = σ(x_o)
//! s[t] = i ⊙ g + f ⊙ s[t-1]
//! y[t] = o ⊙ tanh(s[t])
//! ```
//!
//! Для обратного прохода ячейка хранит активации гейтов и состояние по
//! каждому шагу; ошибка состояния переносится с шага `t` на шаг `t-1`
//! через гейт забывания.

use ndarray::Array1;

use crate::structure::buffer::Buffer;
use crate::structure::module::{ModuleBase, ModuleKind, NetworkModule};

#[derive(Debug, Clone)]
pub struct LstmLayer {
    base: ModuleBase,
    dim: usize,
    state: Buffer,
    state_error: Buffer,
    ingate: Buffer,
    forgetgate: Buffer,
    outgate: Buffer,
    cell_input: Buffer,
}

impl LstmLayer {
    pub fn new(dim: usize, name: impl Into<String>) -> Self {
        Self {
            base: ModuleBase::new(name, 4 * dim, dim),
            dim,
            state: Buffer::new(dim),
            state_error: Buffer::new(dim),
            ingate: Buffer::new(dim),
            forgetgate: Buffer::new(dim),
            outgate: Buffer::new(dim),
            cell_input: Buffer::new(dim),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Состояние ячейки на шаге `t`, для инспекции между вызовами.
    pub fn state(&self, t: usize) -> Array1<f32> {
        self.state.row_owned(t)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl NetworkModule for LstmLayer {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Lstm
    }

    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn grow_to(&mut self, steps: usize) {
        self.base.grow_to(steps);
        self.state.grow_to(steps);
        self.state_error.grow_to(steps);
        self.ingate.grow_to(steps);
        self.forgetgate.grow_to(steps);
        self.outgate.grow_to(steps);
        self.cell_input.grow_to(steps);
    }

    fn reset(&mut self) {
        self.base.clear();
        self.state.clear();
        self.state_error.clear();
        self.ingate.clear();
        self.forgetgate.clear();
        self.outgate.clear();
        self.cell_input.clear();
    }

    fn forward_step(&mut self, t: usize) {
        let dim = self.dim;
        let x = self.base.input.row_owned(t);

        let i: Array1<f32> = x.slice(ndarray::s![0..dim]).mapv(sigmoid);
        let f: Array1<f32> = x.slice(ndarray::s![dim..2 * dim]).mapv(sigmoid);
        let g: Array1<f32> = x.slice(ndarray::s![2 * dim..3 * dim]).mapv(f32::tanh);
        let o: Array1<f32> = x.slice(ndarray::s![3 * dim..4 * dim]).mapv(sigmoid);

        let mut s = &i * &g;
        if t > 0 {
            s = s + &f * &self.state.row_owned(t - 1);
        }
        let y = &o * &s.mapv(f32::tanh);

        self.state.row_mut(t).assign(&s);
        self.ingate.row_mut(t).assign(&i);
        self.forgetgate.row_mut(t).assign(&f);
        self.outgate.row_mut(t).assign(&o);
        self.cell_input.row_mut(t).assign(&g);
        self.base.output.row_mut(t).assign(&y);
    }

    fn backward_step(&mut self, t: usize) {
        let dim = self.dim;
        let outerr = self.base.output_error.row_owned(t);
        let i = self.ingate.row_owned(t);
        let f = self.forgetgate.row_owned(t);
        let g = self.cell_input.row_owned(t);
        let o = self.outgate.row_owned(t);
        let ts = self.state.row_owned(t).mapv(f32::tanh);

        // Полная ошибка состояния: вклад с шага t+1 уже лежит в
        // state_error (его занёс backward_step(t + 1)), вклад через выход
        // добавляется здесь.
        let serr = self.state_error.row_owned(t)
            + &outerr * &o * (1.0 - &ts * &ts);
        self.state_error.row_mut(t).assign(&serr);

        let o_err = &outerr * &ts * &o * (o.mapv(|v| 1.0 - v));
        let g_err = &serr * &i * (1.0 - &g * &g);
        let i_err = &serr * &g * &i * (i.mapv(|v| 1.0 - v));
        let f_err = if t > 0 {
            let carry = &serr * &f;
            let prev = self.state.row_owned(t - 1);
            let mut below = self.state_error.row_mut(t - 1);
            below += &carry;
            &serr * &prev * &f * (f.mapv(|v| 1.0 - v))
        } else {
            Array1::zeros(dim)
        };

        let mut inerr = self.base.input_error.row_mut(t);
        inerr.slice_mut(ndarray::s![0..dim]).assign(&i_err);
        inerr.slice_mut(ndarray::s![dim..2 * dim]).assign(&f_err);
        inerr.slice_mut(ndarray::s![2 * dim..3 * dim]).assign(&g_err);
        inerr.slice_mut(ndarray::s![3 * dim..4 * dim]).assign(&o_err);
    }
}
