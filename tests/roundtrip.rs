//! Serialization round-trip: a rebuilt network must match the original in
//! structural representation, activation outputs, and kind identity.

use rand::SeedableRng;

use rustynet::serialization::NetworkDescription;
use rustynet::shortcuts::{build_network, BuildOptions};
use rustynet::structure::{
    FullConnection, LinearLayer, LstmLayer, ModuleKind, NetworkBuilder, NetworkModule,
};

#[test]
fn layered_network_round_trips_exactly() {
    let mut net = build_network(&[2, 3, 1], BuildOptions::default()).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(41);
    net.randomize(&mut rng);

    let json = serde_json::to_string(&NetworkDescription::of(&net)).unwrap();
    let description: NetworkDescription = serde_json::from_str(&json).unwrap();
    let mut rebuilt = description.rebuild().unwrap();

    // same representation
    assert_eq!(NetworkDescription::of(&rebuilt), NetworkDescription::of(&net));

    // same function
    let input = [0.3, -0.9];
    let expected = net.activate(&input).unwrap();
    let actual = rebuilt.activate(&input).unwrap();
    assert_eq!(expected, actual);

    // same classes
    for (a, b) in net.modules().iter().zip(rebuilt.modules().iter()) {
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.name(), b.name());
    }
}

#[test]
fn recurrent_lstm_network_round_trips() {
    let mut builder = NetworkBuilder::new("lstm-rt");
    let input = builder.add_input_module(LinearLayer::new(1, "in"));
    let lstm = builder.add_module(LstmLayer::new(2, "cell"));
    let output = builder.add_output_module(LinearLayer::new(1, "out"));
    let c = FullConnection::new(&builder, input, lstm, "in->cell").unwrap();
    builder.add_connection(c);
    let c = FullConnection::new(&builder, lstm, output, "cell->out").unwrap();
    builder.add_connection(c);
    let c = FullConnection::new(&builder, lstm, lstm, "cell->cell").unwrap();
    builder.add_recurrent_connection(c);
    let mut net = builder.finalize().unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    net.randomize(&mut rng);

    let mut rebuilt = NetworkDescription::of(&net).rebuild().unwrap();
    assert_eq!(rebuilt.recurrent_connections().len(), 1);
    assert_eq!(rebuilt.module(lstm).kind(), ModuleKind::Lstm);
    assert_eq!(rebuilt.module(lstm).indim(), 8);

    // identical outputs over a whole sequence, state carry included
    for x in [[0.5], [-0.25], [1.0]] {
        let expected = net.activate(&x).unwrap();
        let actual = rebuilt.activate(&x).unwrap();
        assert_eq!(expected, actual);
    }
}

#[test]
fn weight_tied_network_round_trips_with_one_store() {
    use rustynet::structure::{MotherConnection, SigmoidLayer};

    let mut builder = NetworkBuilder::new("tied-rt");
    let input = builder.add_input_module(LinearLayer::new(2, "in"));
    let a = builder.add_module(SigmoidLayer::new(2, "a"));
    let b = builder.add_module(SigmoidLayer::new(2, "b"));
    let output = builder.add_output_module(LinearLayer::new(2, "out"));

    let mother = MotherConnection::new("m", 4);
    let c = FullConnection::shared(&builder, &mother, input, a, "in->a").unwrap();
    builder.add_connection(c);
    let c = FullConnection::shared(&builder, &mother, input, b, "in->b").unwrap();
    builder.add_connection(c);
    let c = FullConnection::new(&builder, a, output, "a->out").unwrap();
    builder.add_connection(c);
    let c = FullConnection::new(&builder, b, output, "b->out").unwrap();
    builder.add_connection(c);
    let mut net = builder.finalize().unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(43);
    net.randomize(&mut rng);

    let mut rebuilt = NetworkDescription::of(&net).rebuild().unwrap();

    // the rebuilt sharers must reference one physical store again
    assert_eq!(rebuilt.param_stores().len(), net.param_stores().len());
    let expected = net.activate(&[0.4, 0.6]).unwrap();
    let actual = rebuilt.activate(&[0.4, 0.6]).unwrap();
    assert_eq!(expected, actual);
}
