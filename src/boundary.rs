//! Output of every node over a grid of points, the data behind the playground's heat maps.

use rayon::prelude::*;

use crate::{Error, InputFeature, NeuralNetwork, NodeId, Result, construct_input};

/// Node outputs sampled on a `density x density` grid.
#[derive(Debug, Clone)]
pub struct DecisionBoundary {
    density: usize,
    domain: (f32, f32),
    node_ids: Vec<NodeId>,
    /// `grids[node][i][j]`, node in arena order.
    grids: Vec<Vec<Vec<f32>>>,
}

impl DecisionBoundary {
    pub fn density(&self) -> usize {
        self.density
    }

    pub fn domain(&self) -> (f32, f32) {
        self.domain
    }

    /// Grid of one node, indexed `[i][j]` where column `i` runs along x (ascending) and row `j`
    /// along y (descending).
    pub fn node(&self, id: NodeId) -> Option<&[Vec<f32>]> {
        let index = self.node_ids.iter().position(|&node_id| node_id == id)?;
        Some(&self.grids[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[Vec<f32>])> {
        self.node_ids
            .iter()
            .copied()
            .zip(self.grids.iter().map(Vec::as_slice))
    }

    /// The point sampled at grid position `(i, j)`.
    pub fn point(&self, i: usize, j: usize) -> (f32, f32) {
        grid_point(self.domain, self.density, i, j)
    }
}

fn grid_point((lo, hi): (f32, f32), density: usize, i: usize, j: usize) -> (f32, f32) {
    let step = (hi - lo) / (density - 1) as f32;
    (lo + step * i as f32, hi - step * j as f32)
}

/// Evaluates `nn` over a grid spanning `domain` on both axes, feeding each point through
/// `features`. Columns are evaluated in parallel and the network is left untouched.
pub fn decision_boundary(
    nn: &NeuralNetwork,
    features: &[InputFeature],
    density: usize,
    domain: (f32, f32),
) -> Result<DecisionBoundary> {
    if density < 2 {
        return Err(Error::Configuration(format!(
            "grid density must be at least 2, got {density}"
        )));
    }
    if features.len() != nn.n_inputs() {
        return Err(Error::Dimension {
            expected: nn.n_inputs(),
            found: features.len(),
        });
    }
    let n_nodes = nn.nodes().len();
    // columns[i][j] holds every node output at point (i, j).
    let columns: Vec<Vec<Vec<f32>>> = (0..density)
        .into_par_iter()
        .map(|i| {
            (0..density)
                .map(|j| -> Result<Vec<f32>> {
                    let (x, y) = grid_point(domain, density, i, j);
                    let mut outputs = vec![0.0f32; n_nodes];
                    nn.evaluate(&construct_input(features, x, y), &mut outputs)?;
                    Ok(outputs)
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    let grids: Vec<Vec<Vec<f32>>> = (0..n_nodes)
        .map(|node| {
            columns
                .iter()
                .map(|column| column.iter().map(|outputs| outputs[node]).collect())
                .collect()
        })
        .collect();
    Ok(DecisionBoundary {
        density,
        domain,
        node_ids: nn.nodes().iter().map(|node| node.id()).collect(),
        grids,
    })
}
