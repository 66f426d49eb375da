//! Builder for multi-dimensional swiping networks.
//!
//! A swiping network connects three module meshes so that the whole
//! construct behaves like one unit (input + hidden + output at the same
//! coordinate) sweeping across a multi-dimensional input space. For an
//! N-dimensional mesh there are `2^N` sweep direction combinations, and
//! the hidden mesh carries one copy of every cell per combination in its
//! trailing axis. All lattice edges share their weights through mother
//! connections, so the parameter count does not depend on the mesh size.

use crate::structure::connections::{FullConnection, MotherConnection};
use crate::structure::modules::mesh::{Coordinates, ModuleMesh};
use crate::structure::network::{Network, NetworkBuilder};
use crate::structure::{StructureError, StructureResult};

/// Sweep direction along one axis, decoded from the swipe bitmask:
/// bit `d` clear means the sweep moves towards higher coordinates on
/// axis `d` (the signal comes from below), bit set means the opposite.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwipeDirection {
    Increasing,
    Decreasing,
}

impl SwipeDirection {
    pub fn of(swipe: usize, axis: usize) -> Self {
        if (swipe >> axis) & 1 == 0 {
            SwipeDirection::Increasing
        } else {
            SwipeDirection::Decreasing
        }
    }

    /// Coordinate of the predecessor cell along this axis, or `None` when
    /// the sweep enters the mesh at this boundary cell.
    pub fn predecessor(self, coord: usize, axis_size: usize) -> Option<usize> {
        match self {
            SwipeDirection::Increasing => coord.checked_sub(1),
            SwipeDirection::Decreasing => {
                let prev = coord + 1;
                (prev < axis_size).then_some(prev)
            }
        }
    }
}

/// Caller-supplied mother connections, overriding the generated ones.
/// Dimension errors raised by these are propagated unchanged.
#[derive(Default)]
pub struct PredefinedMothers {
    pub input_to_hidden: Option<MotherConnection>,
    pub hidden_to_output: Option<MotherConnection>,
    /// One mother per spatial axis.
    pub hidden_to_hidden: Option<Vec<MotherConnection>>,
}

pub struct SwipingOptions {
    /// Treat all axes as symmetric and share one hidden-to-hidden mother
    /// across them.
    pub symmetric_dimensions: bool,
    pub predefined: PredefinedMothers,
}

impl Default for SwipingOptions {
    fn default() -> Self {
        Self {
            symmetric_dimensions: true,
            predefined: PredefinedMothers::default(),
        }
    }
}

/// Wires the three meshes into a swiping lattice and finalizes the
/// network. The meshes must already be registered in `builder`.
///
/// Validation happens before any wiring: the input and output meshes must
/// share dimensions, the hidden mesh must repeat them plus a trailing axis
/// of size `2^N`, and every spatial axis must be larger than 1.
pub fn build_swiping_network(
    mut builder: NetworkBuilder,
    inmesh: &ModuleMesh,
    hiddenmesh: &ModuleMesh,
    outmesh: &ModuleMesh,
    options: SwipingOptions,
) -> StructureResult<Network> {
    let dims = inmesh.dims().to_vec();
    let swipes = 1usize << dims.len();

    if outmesh.dims() != dims.as_slice() {
        return Err(StructureError::MeshDimensionMismatch {
            mesh: outmesh.name().to_string(),
            expected: dims.clone(),
            actual: outmesh.dims().to_vec(),
        });
    }
    let mut expected_hidden = dims.clone();
    expected_hidden.push(swipes);
    if hiddenmesh.dims() != expected_hidden.as_slice() {
        return Err(StructureError::MeshDimensionMismatch {
            mesh: hiddenmesh.name().to_string(),
            expected: expected_hidden,
            actual: hiddenmesh.dims().to_vec(),
        });
    }
    for (axis, &size) in dims.iter().enumerate() {
        if size < 2 {
            return Err(StructureError::AxisTooSmall { axis, size });
        }
    }

    for &id in inmesh.ids() {
        builder.mark_input(id)?;
    }
    for &id in outmesh.ids() {
        builder.mark_output(id)?;
    }

    let PredefinedMothers {
        input_to_hidden,
        hidden_to_output,
        hidden_to_hidden,
    } = options.predefined;
    let inconn = input_to_hidden.unwrap_or_else(|| {
        MotherConnection::new(
            "inconn",
            inmesh.component_outdim() * hiddenmesh.component_indim(),
        )
    });
    let outconn = hidden_to_output.unwrap_or_else(|| {
        MotherConnection::new(
            "outconn",
            hiddenmesh.component_outdim() * outmesh.component_indim(),
        )
    });
    let hconns = hidden_to_hidden.unwrap_or_else(|| {
        let mut mothers: Vec<MotherConnection> = Vec::with_capacity(dims.len());
        for axis in 0..dims.len() {
            if axis > 0 && options.symmetric_dimensions {
                // a clone shares the underlying store
                mothers.push(mothers[0].clone());
            } else {
                mothers.push(MotherConnection::new(
                    format!("hconn{}", axis),
                    hiddenmesh.component_indim() * hiddenmesh.component_outdim(),
                ));
            }
        }
        mothers
    });

    for coord in Coordinates::new(&dims) {
        for swipe in 0..swipes {
            let mut hcoord = coord.clone();
            hcoord.push(swipe);
            let hid = hiddenmesh.id(&hcoord);

            let conn = FullConnection::shared(
                &builder,
                &inconn,
                inmesh.id(&coord),
                hid,
                format!("in{:?}#{}", coord, swipe),
            )?;
            builder.add_connection(conn);
            let conn = FullConnection::shared(
                &builder,
                &outconn,
                hid,
                outmesh.id(&coord),
                format!("out{:?}#{}", coord, swipe),
            )?;
            builder.add_connection(conn);

            // one swiping connection along every axis, from the cell the
            // sweep is coming from on that axis
            for (axis, &size) in dims.iter().enumerate() {
                let direction = SwipeDirection::of(swipe, axis);
                if let Some(prev) = direction.predecessor(coord[axis], size) {
                    let mut pcoord = hcoord.clone();
                    pcoord[axis] = prev;
                    let conn = FullConnection::shared(
                        &builder,
                        &hconns[axis],
                        hiddenmesh.id(&pcoord),
                        hid,
                        format!("h{:?}#{}a{}", coord, swipe, axis),
                    )?;
                    builder.add_connection(conn);
                }
            }
        }
    }

    log::debug!(
        "swiping lattice over {:?}: {} swipes, {} modules",
        dims,
        swipes,
        builder.module_count()
    );
    builder.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_decoding_matches_bitmask() {
        assert_eq!(SwipeDirection::of(0, 0), SwipeDirection::Increasing);
        assert_eq!(SwipeDirection::of(1, 0), SwipeDirection::Decreasing);
        assert_eq!(SwipeDirection::of(2, 0), SwipeDirection::Increasing);
        assert_eq!(SwipeDirection::of(2, 1), SwipeDirection::Decreasing);
    }

    #[test]
    fn boundary_cells_have_no_predecessor() {
        assert_eq!(SwipeDirection::Increasing.predecessor(0, 3), None);
        assert_eq!(SwipeDirection::Increasing.predecessor(2, 3), Some(1));
        assert_eq!(SwipeDirection::Decreasing.predecessor(2, 3), None);
        assert_eq!(SwipeDirection::Decreasing.predecessor(0, 3), Some(1));
    }
}
