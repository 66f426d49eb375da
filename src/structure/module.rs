//! Module defining the core `NetworkModule` trait for all network units.

use serde::{Deserialize, Serialize};

use crate::structure::buffer::Buffer;

/// Identifier of a module inside a network (index into the module table).
pub type ModuleId = usize;

/// Closed set of module kinds, used for dispatch-free introspection and
/// for reconstructing a network from its serialized description.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    Linear,
    Sigmoid,
    Tanh,
    Bias,
    Lstm,
}

/// The four signal buffers every module carries, plus its identity.
///
/// Invariant: `input`/`input_error` rows are `indim` wide and
/// `output`/`output_error` rows are `outdim` wide at all times.
#[derive(Debug, Clone)]
pub struct ModuleBase {
    pub name: String,
    pub input: Buffer,
    pub output: Buffer,
    pub input_error: Buffer,
    pub output_error: Buffer,
}

impl ModuleBase {
    pub fn new(name: impl Into<String>, indim: usize, outdim: usize) -> Self {
        Self {
            name: name.into(),
            input: Buffer::new(indim),
            output: Buffer::new(outdim),
            input_error: Buffer::new(indim),
            output_error: Buffer::new(outdim),
        }
    }

    pub fn indim(&self) -> usize {
        self.input.width()
    }

    pub fn outdim(&self) -> usize {
        self.output.width()
    }

    pub fn grow_to(&mut self, steps: usize) {
        self.input.grow_to(steps);
        self.output.grow_to(steps);
        self.input_error.grow_to(steps);
        self.output_error.grow_to(steps);
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
        self.input_error.clear();
        self.output_error.clear();
    }
}

/// Trait defining the common interface for all network units.
///
/// A module transforms the time step's input-buffer row into its
/// output-buffer row (`forward_step`), and mirrors the output-error row
/// into the input-error row (`backward_step`). Both update the buffers in
/// place, so intermediate values stay inspectable between calls.
pub trait NetworkModule {
    fn kind(&self) -> ModuleKind;

    fn base(&self) -> &ModuleBase;

    fn base_mut(&mut self) -> &mut ModuleBase;

    /// Computes the output-buffer row `t` from the input-buffer row `t`
    /// (and, for stateful modules, from the internal state of step `t - 1`).
    fn forward_step(&mut self, t: usize);

    /// Computes the input-error row `t` from the output-error row `t`.
    /// Must only be called for a `t` that `forward_step` has processed.
    fn backward_step(&mut self, t: usize);

    fn name(&self) -> &str {
        &self.base().name
    }

    fn indim(&self) -> usize {
        self.base().indim()
    }

    fn outdim(&self) -> usize {
        self.base().outdim()
    }

    /// Makes buffer rows `0..steps` available. Stateful modules override
    /// this to grow their internal buffers alongside.
    fn grow_to(&mut self, steps: usize) {
        self.base_mut().grow_to(steps);
    }

    /// Clears all buffers and internal state, keeping learned parameters
    /// (modules own none; parameters live in connections).
    fn reset(&mut self) {
        self.base_mut().clear();
    }
}
