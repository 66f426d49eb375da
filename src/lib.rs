//! # rustynet: Buffer-based Neural Network Construction in Rust
//!
//! **rustynet** builds networks out of explicit modules and connections.
//! Every module owns time-indexed signal buffers; connections are
//! parametrized edges between them, and recurrent connections carry state
//! across time steps. Weight-tying across many structural edges goes
//! through shared "mother" parameter stores, which is what makes the
//! multi-dimensional swiping lattices affordable.
//!
//! ## Usage Example
//!
//! ```no_run
//! use rustynet::shortcuts::{build_network, BuildOptions};
//!
//! // 1. Assemble a layered network: 2 inputs, 3 hidden units, 1 output
//! let mut net = build_network(&[2, 3, 1], BuildOptions::default()).unwrap();
//!
//! // 2. Randomize its weights and run one step
//! let mut rng = rand::thread_rng();
//! net.randomize(&mut rng);
//! let out = net.activate(&[0.5, -0.5]).unwrap();
//!
//! // 3. Backpropagate an output error; connection derivatives accumulate
//! net.back_activate(&[out[0] - 1.0]).unwrap();
//! ```

// Declare public modules that constitute the core library API.
pub mod dataset;
pub mod optimizers;
pub mod serialization;
pub mod shortcuts;
pub mod structure;
#[cfg(feature = "viz")]
pub mod viewer;
