//! Определение последовательностного журнала обучения.
//!
//! Во время активации сеть порождает по шагу на каждый такт: вектор
//! лог-правдоподобия выбранного действия и скалярную награду. Обучающие
//! алгоритмы типа policy gradient не читают сами шаги; им достаточно
//! read-only агрегатов «сумма по последовательности». Журнал хранит шаги,
//! сгруппированные в последовательности, и отдаёт эти агрегаты.

use ndarray::{Array1, Array2};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Log-likelihood vector has length {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("append called before the first new_sequence")]
    NoOpenSequence,
}

/// Один шаг эпизода.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub loglh: Array1<f32>,
    pub reward: f32,
}

/// Журнал шагов, сгруппированных в последовательности (эпизоды).
#[derive(Debug, Clone, Default)]
pub struct SequenceDataset {
    loglh_dim: usize,
    steps: Vec<StepRecord>,
    /// Индексы первых шагов каждой последовательности.
    sequence_starts: Vec<usize>,
}

impl SequenceDataset {
    pub fn new(loglh_dim: usize) -> Self {
        Self {
            loglh_dim,
            steps: Vec::new(),
            sequence_starts: Vec::new(),
        }
    }

    /// Открывает новую последовательность; последующие шаги идут в неё.
    pub fn new_sequence(&mut self) {
        self.sequence_starts.push(self.steps.len());
    }

    pub fn append(&mut self, loglh: Array1<f32>, reward: f32) -> Result<(), DatasetError> {
        if self.sequence_starts.is_empty() {
            return Err(DatasetError::NoOpenSequence);
        }
        if loglh.len() != self.loglh_dim {
            return Err(DatasetError::DimensionMismatch {
                expected: self.loglh_dim,
                actual: loglh.len(),
            });
        }
        self.steps.push(StepRecord { loglh, reward });
        Ok(())
    }

    pub fn num_sequences(&self) -> usize {
        self.sequence_starts.len()
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn loglh_dim(&self) -> usize {
        self.loglh_dim
    }

    /// Шаги одной последовательности.
    pub fn sequence(&self, index: usize) -> &[StepRecord] {
        let from = self.sequence_starts[index];
        let to = self
            .sequence_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.steps.len());
        &self.steps[from..to]
    }

    /// Агрегаты «сумма по последовательности»: матрица сумм
    /// лог-правдоподобий `(число последовательностей × размерность)` и
    /// вектор сумм наград. Единственное, что читает обучающий алгоритм.
    pub fn sum_over_sequences(&self) -> (Array2<f32>, Array1<f32>) {
        let n = self.num_sequences();
        let mut loglh_sums = Array2::zeros((n, self.loglh_dim));
        let mut reward_sums = Array1::zeros(n);
        for i in 0..n {
            for step in self.sequence(i) {
                let mut row = loglh_sums.row_mut(i);
                row += &step.loglh;
                reward_sums[i] += step.reward;
            }
        }
        (loglh_sums, reward_sums)
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.sequence_starts.clear();
    }
}
