//! Shortcut constructors for common layered topologies.

use crate::structure::modules::module_from_kind;
use crate::structure::{
    BiasUnit, FullConnection, LinearLayer, ModuleKind, Network, NetworkBuilder, StructureError,
    StructureResult,
};

/// Options for [`build_network`].
///
/// The closed option set replaces the original's free-form keyword
/// options, so an unknown option is a compile error rather than a
/// runtime one.
#[derive(Debug, Copy, Clone)]
pub struct BuildOptions {
    /// Add a bias unit, fully connected to every hidden layer.
    pub bias: bool,
    /// Also connect the bias unit to the output layer.
    pub output_bias: bool,
    pub hidden_class: ModuleKind,
    pub output_class: ModuleKind,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            bias: true,
            output_bias: true,
            hidden_class: ModuleKind::Sigmoid,
            output_class: ModuleKind::Linear,
        }
    }
}

/// Builds an arbitrarily deep layered network.
///
/// With two sizes this is a flat network with a linear input layer and an
/// output layer of `output_class`; every further size inserts a hidden
/// layer of `hidden_class`. Adjacent layers are fully connected, and the
/// optional bias unit is fully connected to each hidden layer and (with
/// `output_bias`) to the output layer.
pub fn build_network(layers: &[usize], options: BuildOptions) -> StructureResult<Network> {
    if layers.len() < 2 {
        return Err(StructureError::TooFewLayers(layers.len()));
    }
    if options.hidden_class == ModuleKind::Bias || options.output_class == ModuleKind::Bias {
        return Err(StructureError::BadDescription(
            "a bias unit cannot serve as a layer class".to_string(),
        ));
    }

    let mut builder = NetworkBuilder::new("network");
    let input = builder.add_input_module(LinearLayer::new(layers[0], "in"));
    let output_layer = module_from_kind(options.output_class, layers[layers.len() - 1], "out")?;
    let output = builder.add_boxed_module(output_layer);
    builder.mark_output(output)?;

    let bias = if options.bias {
        let id = builder.add_module(BiasUnit::new("bias"));
        if options.output_bias {
            let conn = FullConnection::new(&builder, id, output, "bias->out")?;
            builder.add_connection(conn);
        }
        Some(id)
    } else {
        None
    };

    let mut hidden = Vec::new();
    for (i, &num) in layers[1..layers.len() - 1].iter().enumerate() {
        let name = format!("hidden{}", i);
        let layer = module_from_kind(options.hidden_class, num, name.clone())?;
        let id = builder.add_boxed_module(layer);
        hidden.push(id);
        if let Some(bias_id) = bias {
            let conn = FullConnection::new(&builder, bias_id, id, format!("bias->{}", name))?;
            builder.add_connection(conn);
        }
    }

    for window in hidden.windows(2) {
        let conn = FullConnection::new(
            &builder,
            window[0],
            window[1],
            format!("hidden{}->{}", window[0], window[1]),
        )?;
        builder.add_connection(conn);
    }

    if hidden.is_empty() {
        let conn = FullConnection::new(&builder, input, output, "in->out")?;
        builder.add_connection(conn);
    } else {
        let conn = FullConnection::new(&builder, input, hidden[0], "in->hidden0")?;
        builder.add_connection(conn);
        let last = *hidden.last().unwrap();
        let conn = FullConnection::new(&builder, last, output, "hidden->out")?;
        builder.add_connection(conn);
    }

    log::debug!("layered network {:?}: {} hidden layers", layers, hidden.len());
    builder.finalize()
}

/// A two-layer network without hidden layers.
pub fn build_flat_network(innodes: usize, outnodes: usize, bias: bool) -> StructureResult<Network> {
    let mut builder = NetworkBuilder::new("network");
    let input = builder.add_input_module(LinearLayer::new(innodes, "in"));
    let output = builder.add_output_module(LinearLayer::new(outnodes, "out"));
    let conn = FullConnection::new(&builder, input, output, "in->out")?;
    builder.add_connection(conn);
    if bias {
        let bias_id = builder.add_module(BiasUnit::new("bias"));
        let conn = FullConnection::new(&builder, bias_id, output, "bias->out")?;
        builder.add_connection(conn);
    }
    builder.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layered_network_has_expected_wiring() {
        let net = build_network(&[2, 3, 1], BuildOptions::default()).unwrap();
        // in->hidden0, hidden->out, bias->hidden0, bias->out
        assert_eq!(net.connections().len(), 4);
        assert_eq!(net.modules().len(), 4);
        assert_eq!(net.indim(), 2);
        assert_eq!(net.outdim(), 1);
        assert!(net.module_named("bias").is_some());
    }

    #[test]
    fn zero_weights_give_zero_output() {
        let mut net = build_network(&[2, 3, 1], BuildOptions::default()).unwrap();
        let out = net.activate(&[0.0, 0.0]).unwrap();
        assert_eq!(out, vec![0.0]);
    }

    #[test]
    fn too_few_layers_is_an_error() {
        assert!(matches!(
            build_network(&[5], BuildOptions::default()),
            Err(StructureError::TooFewLayers(1))
        ));
    }

    #[test]
    fn flat_network_connects_input_to_output() {
        let net = build_flat_network(3, 2, true).unwrap();
        assert_eq!(net.connections().len(), 2);
        assert_eq!(net.indim(), 3);
        assert_eq!(net.outdim(), 2);
    }
}
