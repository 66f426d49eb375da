//! Structural tests for the swiping-lattice builder.

use rand::SeedableRng;

use rustynet::structure::{
    build_swiping_network, ConnectionKind, LinearLayer, ModuleMesh, MotherConnection,
    NetworkBuilder, NetworkConnection, NetworkModule, PredefinedMothers, StructureError,
    SwipingOptions, TanhLayer,
};

fn lattice_3x3(
    symmetric: bool,
) -> rustynet::structure::Network {
    let mut builder = NetworkBuilder::new("lattice");
    let inmesh = ModuleMesh::build(&mut builder, "in", &[3, 3], |c| {
        Box::new(LinearLayer::new(1, format!("in{:?}", c)))
    })
    .unwrap();
    let outmesh = ModuleMesh::build(&mut builder, "out", &[3, 3], |c| {
        Box::new(LinearLayer::new(1, format!("out{:?}", c)))
    })
    .unwrap();
    let hiddenmesh = ModuleMesh::build(&mut builder, "hidden", &[3, 3, 4], |c| {
        Box::new(TanhLayer::new(2, format!("h{:?}", c)))
    })
    .unwrap();
    let options = SwipingOptions {
        symmetric_dimensions: symmetric,
        ..SwipingOptions::default()
    };
    build_swiping_network(builder, &inmesh, &hiddenmesh, &outmesh, options).unwrap()
}

/// For a (3,3) mesh with hidden mesh (3,3,4), every (cell, axis, direction)
/// triple with an in-bounds predecessor contributes one hidden-to-hidden
/// connection: per swipe and axis that excludes one 3-cell boundary slice,
/// so 6 cells * 2 axes * 4 swipes = 48. Input and output links always
/// exist: 9 cells * 4 swipes each way.
#[test]
fn connection_counts_match_the_boundary_formula() {
    let net = lattice_3x3(true);

    let hidden_to_hidden = net
        .connections()
        .iter()
        .filter(|c| c.mother_name().map_or(false, |m| m.starts_with("hconn")))
        .count();
    assert_eq!(hidden_to_hidden, 48);

    let in_links = net
        .connections()
        .iter()
        .filter(|c| c.mother_name() == Some("inconn"))
        .count();
    let out_links = net
        .connections()
        .iter()
        .filter(|c| c.mother_name() == Some("outconn"))
        .count();
    assert_eq!(in_links, 36);
    assert_eq!(out_links, 36);
    assert_eq!(net.connections().len(), 48 + 36 + 36);

    assert_eq!(net.modules().len(), 9 + 9 + 36);
    assert!(net
        .connections()
        .iter()
        .all(|c| c.kind() == ConnectionKind::SharedFull));
}

/// With symmetric dimensions both axes share one physical store, so the
/// whole lattice carries three parameter stores; without symmetry, four.
#[test]
fn parameter_count_is_independent_of_mesh_size() {
    let symmetric = lattice_3x3(true);
    assert_eq!(symmetric.param_stores().len(), 3);
    // in: 1*2, out: 2*1, hidden: 2*2
    assert_eq!(symmetric.total_parameters(), 2 + 2 + 4);

    let free = lattice_3x3(false);
    assert_eq!(free.param_stores().len(), 4);
    assert_eq!(free.total_parameters(), 2 + 2 + 4 + 4);
}

#[test]
fn lattice_activates_and_stays_deterministic() {
    let mut net = lattice_3x3(true);
    let mut rng = rand::rngs::StdRng::seed_from_u64(21);
    net.randomize(&mut rng);

    let input: Vec<f32> = (0..9).map(|i| (i as f32) / 9.0 - 0.5).collect();
    let first = net.activate(&input).unwrap();
    assert_eq!(first.len(), 9);
    assert!(first.iter().any(|&v| v != 0.0));

    net.reset();
    let second = net.activate(&input).unwrap();
    assert_eq!(first, second);
}

/// The mother connection's accumulated derivative must equal the sum of
/// the per-instance contributions of every structural connection that
/// shares it.
#[test]
fn shared_derivative_is_the_sum_of_instance_contributions() {
    let mut net = lattice_3x3(false);
    let mut rng = rand::rngs::StdRng::seed_from_u64(22);
    net.randomize(&mut rng);
    net.reset_derivatives();

    let input: Vec<f32> = (0..9).map(|i| (i as f32 + 1.0) / 10.0).collect();
    net.activate(&input).unwrap();
    net.back_activate(&vec![1.0; 9]).unwrap();

    for mother in ["inconn", "outconn", "hconn0", "hconn1"] {
        let mut expected = None;
        let mut store = None;
        for conn in net.connections() {
            if conn.mother_name() != Some(mother) {
                continue;
            }
            let base = conn.base();
            let derr = net.module(base.dest).base().input_error.row_owned(0);
            let src = net.module(base.source).base().output.row_owned(0);
            let expected = expected.get_or_insert_with(|| vec![0.0f32; conn.indim() * conn.outdim()]);
            for o in 0..conn.outdim() {
                for i in 0..conn.indim() {
                    expected[o * conn.indim() + i] +=
                        derr[base.out_from + o] * src[base.in_from + i];
                }
            }
            store = conn.parameters().cloned();
        }
        let expected = expected.expect("every mother has at least one instance");
        let store = store.expect("shared connections carry the mother's store");
        let actual = store.borrow().derivs().to_vec();
        assert_eq!(expected.len(), actual.len());
        for (e, a) in expected.iter().zip(actual.iter()) {
            assert!(
                (e - a).abs() < 1e-4,
                "mother '{}' derivative mismatch: {} vs {}",
                mother,
                e,
                a
            );
        }
    }
}

#[test]
fn mismatched_meshes_are_rejected_before_wiring() {
    let mut builder = NetworkBuilder::new("bad");
    let inmesh = ModuleMesh::build(&mut builder, "in", &[3, 3], |c| {
        Box::new(LinearLayer::new(1, format!("in{:?}", c)))
    })
    .unwrap();
    let outmesh = ModuleMesh::build(&mut builder, "out", &[3, 2], |c| {
        Box::new(LinearLayer::new(1, format!("out{:?}", c)))
    })
    .unwrap();
    let hiddenmesh = ModuleMesh::build(&mut builder, "hidden", &[3, 3, 4], |c| {
        Box::new(TanhLayer::new(2, format!("h{:?}", c)))
    })
    .unwrap();
    let result = build_swiping_network(
        builder,
        &inmesh,
        &hiddenmesh,
        &outmesh,
        SwipingOptions::default(),
    );
    assert!(matches!(
        result,
        Err(StructureError::MeshDimensionMismatch { .. })
    ));
}

#[test]
fn single_cell_axes_are_rejected() {
    let mut builder = NetworkBuilder::new("thin");
    let inmesh = ModuleMesh::build(&mut builder, "in", &[1, 3], |c| {
        Box::new(LinearLayer::new(1, format!("in{:?}", c)))
    })
    .unwrap();
    let outmesh = ModuleMesh::build(&mut builder, "out", &[1, 3], |c| {
        Box::new(LinearLayer::new(1, format!("out{:?}", c)))
    })
    .unwrap();
    let hiddenmesh = ModuleMesh::build(&mut builder, "hidden", &[1, 3, 4], |c| {
        Box::new(TanhLayer::new(2, format!("h{:?}", c)))
    })
    .unwrap();
    let result = build_swiping_network(
        builder,
        &inmesh,
        &hiddenmesh,
        &outmesh,
        SwipingOptions::default(),
    );
    assert!(matches!(
        result,
        Err(StructureError::AxisTooSmall { axis: 0, size: 1 })
    ));
}

/// A caller-supplied mother connection of the wrong size is re-raised
/// unchanged, not corrected.
#[test]
fn predefined_mother_of_wrong_size_is_rejected() {
    let mut builder = NetworkBuilder::new("override");
    let inmesh = ModuleMesh::build(&mut builder, "in", &[2, 2], |c| {
        Box::new(LinearLayer::new(1, format!("in{:?}", c)))
    })
    .unwrap();
    let outmesh = ModuleMesh::build(&mut builder, "out", &[2, 2], |c| {
        Box::new(LinearLayer::new(1, format!("out{:?}", c)))
    })
    .unwrap();
    let hiddenmesh = ModuleMesh::build(&mut builder, "hidden", &[2, 2, 4], |c| {
        Box::new(TanhLayer::new(2, format!("h{:?}", c)))
    })
    .unwrap();
    let options = SwipingOptions {
        symmetric_dimensions: true,
        predefined: PredefinedMothers {
            input_to_hidden: Some(MotherConnection::new("inconn", 999)),
            ..PredefinedMothers::default()
        },
    };
    let result = build_swiping_network(builder, &inmesh, &hiddenmesh, &outmesh, options);
    assert!(matches!(
        result,
        Err(StructureError::SharedSizeMismatch { .. })
    ));
}
