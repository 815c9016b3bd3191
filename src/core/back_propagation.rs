use log::trace;

use crate::{ErrorFunction, NeuralNetwork, core::arena_index};

/// Propagates d error / d output back through the network and accumulates the gradients of
/// every bias and weight for the current mini-batch.
///
/// Must be called right after [`forward`](crate::core::forward) on the same sample, it reads
/// the node state that pass left behind.
pub fn back_propagate(nn: &mut NeuralNetwork, target: f32, error_fn: ErrorFunction) {
    let nodes = &mut nn.nodes;
    let links = &mut nn.links;
    let layer_offsets = &nn.layer_offsets;
    let n_inputs = layer_offsets[1];
    let n_nodes = nodes.len();

    let output_node = &mut nodes[n_nodes - 1];
    output_node.input_der = error_fn.deriv(output_node.output, target) * output_node.output_der;

    // Hidden nodes, last layer first. Each node only depends on the layer after it.
    for i in (n_inputs..n_nodes - 1).rev() {
        let node = &nodes[i];
        let mut da = 0.0f32;
        for &link_id in &node.output_links {
            let link = &links[link_id.index()];
            if link.is_dead {
                continue;
            }
            da += link.weight * nodes[arena_index(layer_offsets, link.dest)].input_der;
        }
        let node = &mut nodes[i];
        node.input_der = node.output_der * da;
    }

    for node in &mut nodes[n_inputs..] {
        node.accumulate();
    }
    for link in links.iter_mut() {
        if link.is_dead {
            continue;
        }
        let source = &nodes[arena_index(layer_offsets, link.source)];
        let dest = &nodes[arena_index(layer_offsets, link.dest)];
        link.accumulate(source.output * dest.input_der);
    }
}

/// Applies the averaged accumulated gradients (and the regularization penalty) to every weight
/// and bias, then clears the accumulators.
///
/// Links and nodes that accumulated nothing since the last update are left alone.
///
/// The rates are taken as given; [`TrainingConfig`](crate::TrainingConfig) is where they are
/// validated.
pub fn update_weights(nn: &mut NeuralNetwork, learning_rate: f32, regularization_rate: f32) {
    let mut n_links_updated = 0usize;
    for link in &mut nn.links {
        if link.num_accumulated_ders == 0 {
            continue;
        }
        link.weight -= learning_rate * (link.acc_error_der / link.num_accumulated_ders as f32);
        if let Some(regularization) = link.regularization {
            if !link.is_dead {
                link.weight -=
                    learning_rate * regularization_rate * regularization.deriv(link.weight);
            }
        }
        link.clear_accumulated();
        n_links_updated += 1;
    }
    for node in &mut nn.nodes {
        if node.num_accumulated_ders == 0 {
            continue;
        }
        node.bias -= learning_rate * (node.acc_input_der / node.num_accumulated_ders as f32);
        node.clear_accumulated();
    }
    trace!("updated {n_links_updated} weights (eta = {learning_rate}, lambda = {regularization_rate})");
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use test_log::test;

    use crate::{Activation, NodeId, Regularization, Topology};

    use super::*;

    fn network(regularization: Option<Regularization>) -> NeuralNetwork {
        let topology = Topology::new([2, 3, 1], ["x", "y"])
            .with_activation_hidden(Activation::Tanh)
            .with_activation_output(Activation::Tanh)
            .with_regularization(regularization);
        NeuralNetwork::build_with_rng(&topology, &mut StdRng::seed_from_u64(42)).unwrap()
    }

    fn node_ders(nn: &NeuralNetwork) -> Vec<f32> {
        nn.nodes().iter().map(|n| n.input_der()).collect()
    }

    #[test]
    fn link_error_der_is_source_output_times_dest_input_der() {
        let mut nn = network(None);
        for (x, y) in [([0.5f32, -0.5], 1.0f32), ([1.0, 2.0], -1.0), ([-0.3, 0.1], 1.0)] {
            nn.forward(&x).unwrap();
            nn.back_propagate(y, ErrorFunction::Square);
            for link in nn.links() {
                let source = nn.node(link.source()).unwrap();
                let dest = nn.node(link.dest()).unwrap();
                assert_eq!(link.error_der(), source.output() * dest.input_der());
            }
        }
        assert!(nn.links().iter().all(|l| l.num_accumulated_ders() == 3));
    }

    #[test]
    fn output_input_der_uses_error_derivative() {
        let mut nn = network(None);
        let output = nn.forward(&[0.2, 0.4]).unwrap();
        nn.back_propagate(1.0, ErrorFunction::Square);
        let node = nn.output_node();
        assert_eq!(node.input_der(), (output - 1.0) * node.output_der());
    }

    #[test]
    fn hidden_input_der_sums_over_outgoing_links() {
        let mut nn = network(None);
        nn.forward(&[0.2, 0.4]).unwrap();
        nn.back_propagate(-1.0, ErrorFunction::Square);
        let output_der = nn.output_node().input_der();
        for node in nn.layer(1).unwrap() {
            let link = nn.link(node.output_links()[0]).unwrap();
            let expected = node.output_der() * link.weight() * output_der;
            assert!((node.input_der() - expected).abs() < 1e-7);
        }
    }

    #[test]
    fn input_layer_accumulates_nothing() {
        let mut nn = network(None);
        nn.forward(&[0.2, 0.4]).unwrap();
        nn.back_propagate(1.0, ErrorFunction::Square);
        assert!(nn.layer(0).unwrap().iter().all(|n| n.num_accumulated_ders() == 0));
        assert!(nn.layer(1).unwrap().iter().all(|n| n.num_accumulated_ders() == 1));
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let mut nn = network(None);
        let (x, y) = ([0.7f32, -0.4], 0.5f32);
        nn.forward(&x).unwrap();
        nn.back_propagate(y, ErrorFunction::Square);
        let analytic: Vec<f32> = nn.links().iter().map(|l| l.error_der()).collect();
        let h = 1e-2f32;
        for (i, &analytic) in analytic.iter().enumerate() {
            let mut shifted = nn.clone();
            let w = shifted.links[i].weight;
            shifted.links[i].weight = w + h;
            let plus = ErrorFunction::Square.error(shifted.forward(&x).unwrap(), y);
            shifted.links[i].weight = w - h;
            let minus = ErrorFunction::Square.error(shifted.forward(&x).unwrap(), y);
            let numeric = (plus - minus) / (2.0 * h);
            assert!(
                (numeric - analytic).abs() < 1e-3,
                "link {i}: numeric {numeric}, analytic {analytic}"
            );
        }
    }

    #[test]
    fn update_applies_mean_gradient_and_resets() {
        let mut nn = network(None);
        let samples = [([0.5f32, -0.5], 1.0f32), ([1.0, 2.0], -1.0)];
        let mut sums = vec![0.0f32; nn.links().len()];
        for (x, y) in &samples {
            nn.forward(x).unwrap();
            nn.back_propagate(*y, ErrorFunction::Square);
            for (sum, link) in sums.iter_mut().zip(nn.links()) {
                *sum += link.error_der();
            }
        }
        let before: Vec<f32> = nn.links().iter().map(|l| l.weight()).collect();
        let acc: Vec<f32> = nn.links().iter().map(|l| l.acc_error_der()).collect();
        nn.update_weights(0.1, 0.0);
        for i in 0..nn.links().len() {
            let link = &nn.links()[i];
            assert_eq!(link.weight(), before[i] - 0.1 * (acc[i] / 2.0));
            assert!((acc[i] - sums[i]).abs() < 1e-6);
            assert_eq!(link.acc_error_der(), 0.0);
            assert_eq!(link.num_accumulated_ders(), 0);
        }
        assert!(nn.nodes().iter().all(|n| n.num_accumulated_ders() == 0));
    }

    #[test]
    fn bias_moves_against_mean_input_der() {
        let mut nn = network(None);
        nn.forward(&[0.3, 0.3]).unwrap();
        nn.back_propagate(1.0, ErrorFunction::Square);
        let node = nn.output_node();
        let expected = node.bias() - 0.5 * node.acc_input_der();
        nn.update_weights(0.5, 0.0);
        assert_eq!(nn.output_node().bias(), expected);
        // Input biases are never trained.
        assert_eq!(nn.node(NodeId::new(0, 0)).unwrap().bias(), 0.1);
    }

    #[test]
    fn l2_regularization_shrinks_weights_after_gradient_step() {
        let mut nn = network(Some(Regularization::L2));
        nn.forward(&[0.3, -0.3]).unwrap();
        nn.back_propagate(0.0, ErrorFunction::Square);
        let expected: Vec<f32> = nn
            .links()
            .iter()
            .map(|l| {
                let w = l.weight() - 0.1 * (l.acc_error_der() / 1.0);
                w - 0.1 * 0.01 * w
            })
            .collect();
        nn.update_weights(0.1, 0.01);
        let actual: Vec<f32> = nn.links().iter().map(|l| l.weight()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn regularization_skips_dead_links() {
        let mut nn = network(Some(Regularization::L1));
        let dead = nn.layer(1).unwrap()[0].input_links()[0];
        nn.link_mut(dead).unwrap().set_dead(true);
        let weight = nn.link(dead).unwrap().weight();
        nn.forward(&[0.3, -0.3]).unwrap();
        nn.back_propagate(1.0, ErrorFunction::Square);
        assert_eq!(nn.link(dead).unwrap().num_accumulated_ders(), 0);
        nn.update_weights(0.1, 1.0);
        assert_eq!(nn.link(dead).unwrap().weight(), weight);
    }

    #[test]
    fn update_without_gradients_is_a_no_op() {
        let mut nn = network(Some(Regularization::L2));
        let before = nn.link_weights();
        let biases = nn.node_states();
        nn.update_weights(0.1, 0.5);
        assert_eq!(nn.link_weights(), before);
        assert_eq!(nn.node_states(), biases);
        assert_eq!(node_ders(&nn), vec![0.0; nn.nodes().len()]);
    }

    #[test]
    fn dead_outgoing_link_drops_out_of_hidden_input_der() {
        let mut nn = network(None);
        let hidden = NodeId::new(1, 1);
        let dead = nn.node(hidden).unwrap().output_links()[0];
        nn.link_mut(dead).unwrap().set_dead(true);
        nn.forward(&[0.2, 0.4]).unwrap();
        nn.back_propagate(-1.0, ErrorFunction::Square);
        let output_der = nn.output_node().input_der();
        assert_ne!(output_der, 0.0);
        // The dead link was the node's only way to the output.
        assert_eq!(nn.node(hidden).unwrap().input_der(), 0.0);
        for position in [0, 2] {
            let node = nn.node(NodeId::new(1, position)).unwrap();
            let link = nn.link(node.output_links()[0]).unwrap();
            let expected = node.output_der() * link.weight() * output_der;
            assert!((node.input_der() - expected).abs() < 1e-7);
        }
    }

    #[test]
    fn zero_learning_rate_only_clears_accumulators() {
        let mut nn = network(Some(Regularization::L2));
        let before = nn.link_weights();
        nn.forward(&[0.3, -0.3]).unwrap();
        nn.back_propagate(1.0, ErrorFunction::Square);
        nn.update_weights(0.0, 0.0);
        assert_eq!(nn.link_weights(), before);
        assert!(nn.links().iter().all(|l| l.num_accumulated_ders() == 0));
    }
}
