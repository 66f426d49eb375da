//! Behavioral tests for recurrent networks: state carry, reset semantics,
//! and the BPTT time cursor.

use rand::SeedableRng;

use rustynet::structure::{
    FullConnection, LinearLayer, LstmLayer, NetworkBuilder, SigmoidLayer, StructureError,
};

fn simple_recurrent() -> rustynet::structure::Network {
    let mut builder = NetworkBuilder::new("rec");
    let input = builder.add_input_module(LinearLayer::new(1, "in"));
    let hidden = builder.add_module(SigmoidLayer::new(3, "hidden"));
    let output = builder.add_output_module(LinearLayer::new(1, "out"));
    let c = FullConnection::new(&builder, input, hidden, "in->hidden").unwrap();
    builder.add_connection(c);
    let c = FullConnection::new(&builder, hidden, output, "hidden->out").unwrap();
    builder.add_connection(c);
    let c = FullConnection::new(&builder, hidden, hidden, "hidden->hidden").unwrap();
    builder.add_recurrent_connection(c);
    builder.finalize().unwrap()
}

#[test]
fn recurrent_connection_carries_state_across_steps() {
    let mut net = simple_recurrent();
    let mut rng = rand::rngs::StdRng::seed_from_u64(31);
    net.randomize(&mut rng);

    // constant input: without the recurrent loop every step would match
    let first = net.activate(&[1.0]).unwrap();
    let second = net.activate(&[1.0]).unwrap();
    assert_ne!(first, second);
}

#[test]
fn reset_restores_determinism() {
    let mut net = simple_recurrent();
    let mut rng = rand::rngs::StdRng::seed_from_u64(32);
    net.randomize(&mut rng);

    let sequence = [vec![0.2], vec![-0.7], vec![1.0], vec![0.0]];
    let run = |net: &mut rustynet::structure::Network| -> Vec<Vec<f32>> {
        sequence.iter().map(|x| net.activate(x).unwrap()).collect()
    };

    let first_run = run(&mut net);
    net.reset();
    let second_run = run(&mut net);
    assert_eq!(first_run, second_run);
}

#[test]
fn lstm_network_is_stateful_and_resettable() {
    let mut builder = NetworkBuilder::new("lstm");
    let input = builder.add_input_module(LinearLayer::new(1, "in"));
    let lstm = builder.add_module(LstmLayer::new(2, "cell"));
    let output = builder.add_output_module(LinearLayer::new(1, "out"));
    let c = FullConnection::new(&builder, input, lstm, "in->cell").unwrap();
    builder.add_connection(c);
    let c = FullConnection::new(&builder, lstm, output, "cell->out").unwrap();
    builder.add_connection(c);
    let mut net = builder.finalize().unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(33);
    net.randomize(&mut rng);

    let a = net.activate(&[0.5]).unwrap();
    let b = net.activate(&[0.5]).unwrap();
    // the internal cell state alone makes the outputs differ
    assert_ne!(a, b);

    net.reset();
    let c = net.activate(&[0.5]).unwrap();
    assert_eq!(a, c);
}

#[test]
fn time_cursor_mirrors_activations() {
    let mut net = simple_recurrent();
    let mut rng = rand::rngs::StdRng::seed_from_u64(34);
    net.randomize(&mut rng);

    net.activate(&[0.1]).unwrap();
    net.activate(&[0.2]).unwrap();
    assert_eq!(net.time(), 2);
    net.back_activate(&[1.0]).unwrap();
    net.back_activate(&[1.0]).unwrap();
    assert_eq!(net.time(), 0);
    assert!(matches!(
        net.back_activate(&[1.0]),
        Err(StructureError::NoPriorActivation)
    ));
}

#[test]
fn derivatives_persist_until_explicitly_reset() {
    let mut net = simple_recurrent();
    let mut rng = rand::rngs::StdRng::seed_from_u64(35);
    net.randomize(&mut rng);

    net.activate(&[0.8]).unwrap();
    net.back_activate(&[1.0]).unwrap();
    let stores = net.param_stores();
    assert!(stores
        .iter()
        .any(|s| s.borrow().derivs().iter().any(|&d| d != 0.0)));

    // buffer reset keeps both parameters and accumulated derivatives
    net.reset();
    assert!(stores
        .iter()
        .any(|s| s.borrow().derivs().iter().any(|&d| d != 0.0)));

    net.reset_derivatives();
    assert!(stores
        .iter()
        .all(|s| s.borrow().derivs().iter().all(|&d| d == 0.0)));
}
