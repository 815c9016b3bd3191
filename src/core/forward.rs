use crate::{Error, NeuralNetwork, Result, core::arena_index};

fn check_input(nn: &NeuralNetwork, input: &[f32]) -> Result<()> {
    let expected = nn.n_inputs();
    match input.len() {
        found if found == expected => Ok(()),
        found => Err(Error::Dimension { expected, found }),
    }
}

/// Runs the network on `input`, leaving every node's `total_input`, `output` and `output_der`
/// in place for back propagation and inspection.
///
/// Returns the output of the output node.
pub fn forward(nn: &mut NeuralNetwork, input: &[f32]) -> Result<f32> {
    check_input(nn, input)?;
    let n_inputs = input.len();
    let nodes = &mut nn.nodes;
    let links = &nn.links;
    let layer_offsets = &nn.layer_offsets;
    for (node, &x) in nodes[..n_inputs].iter_mut().zip(input) {
        node.output = x;
    }
    // Nodes are stored layer by layer, so every source is computed before its destinations.
    for i in n_inputs..nodes.len() {
        let node = &nodes[i];
        let mut z = node.bias;
        for &link_id in &node.input_links {
            let link = &links[link_id.index()];
            if link.is_dead {
                continue;
            }
            z += link.weight * nodes[arena_index(layer_offsets, link.source)].output;
        }
        let node = &mut nodes[i];
        node.total_input = z;
        node.output = node.activation.apply(z);
        node.output_der = node.activation.deriv(z);
    }
    Ok(nn.output())
}

/// Same computation as [`forward`], but writes node outputs (in arena order) into `outputs`
/// instead of the network.
///
/// `outputs` must hold exactly one slot per node, any other length is a dimension error.
pub fn evaluate(nn: &NeuralNetwork, input: &[f32], outputs: &mut [f32]) -> Result<f32> {
    check_input(nn, input)?;
    let n_nodes = nn.nodes.len();
    if outputs.len() != n_nodes {
        return Err(Error::Dimension {
            expected: n_nodes,
            found: outputs.len(),
        });
    }
    let n_inputs = input.len();
    outputs[..n_inputs].copy_from_slice(input);
    for (i, node) in nn.nodes.iter().enumerate().skip(n_inputs) {
        let mut z = node.bias;
        for &link_id in &node.input_links {
            let link = &nn.links[link_id.index()];
            if link.is_dead {
                continue;
            }
            z += link.weight * outputs[arena_index(&nn.layer_offsets, link.source)];
        }
        outputs[i] = node.activation.apply(z);
    }
    Ok(outputs[n_nodes - 1])
}
