use std::ops::Range;

use faer::{Col, Mat};
use log::debug;
use rand::{Rng, rngs::ThreadRng};

use crate::{
    Activation, Error, ErrorFunction, Link, LinkId, Node, NodeId, PrettyPrintLayer,
    Regularization, Result,
    core::{back_propagate, evaluate, forward, mean_loss, mean_loss_par, update_weights},
};

/// Initial bias of every node unless zero-initialization is requested.
pub const INITIAL_BIAS: f32 = 0.1;

/// Configuration a network is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    shape: Vec<usize>,
    input_ids: Vec<String>,
    activation_hidden: Activation,
    activation_output: Activation,
    regularization: Option<Regularization>,
    init_zero: bool,
}

impl Topology {
    /// `shape` counts nodes per layer, input layer first. `input_ids` names the input layer's
    /// nodes in order.
    pub fn new(
        shape: impl Into<Vec<usize>>,
        input_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            shape: shape.into(),
            input_ids: input_ids.into_iter().map(Into::into).collect(),
            activation_hidden: Activation::Tanh,
            activation_output: Activation::Tanh,
            regularization: None,
            init_zero: false,
        }
    }

    pub fn with_activation_hidden(mut self, activation: Activation) -> Self {
        self.activation_hidden = activation;
        self
    }

    pub fn with_activation_output(mut self, activation: Activation) -> Self {
        self.activation_output = activation;
        self
    }

    pub fn with_regularization(mut self, regularization: Option<Regularization>) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_init_zero(mut self, init_zero: bool) -> Self {
        self.init_zero = init_zero;
        self
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn input_ids(&self) -> &[String] {
        &self.input_ids
    }

    pub fn activation_hidden(&self) -> Activation {
        self.activation_hidden
    }

    pub fn activation_output(&self) -> Activation {
        self.activation_output
    }

    pub fn regularization(&self) -> Option<Regularization> {
        self.regularization
    }

    pub fn init_zero(&self) -> bool {
        self.init_zero
    }

    pub fn n_inputs(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn n_layers(&self) -> usize {
        self.shape.len()
    }

    pub fn validate(&self) -> Result<()> {
        let config_error = |msg: String| Err(Error::Configuration(msg));
        if self.shape.len() < 2 {
            return config_error(format!(
                "a network needs at least an input and an output layer, got shape {:?}",
                self.shape
            ));
        }
        if let Some(u) = self.shape.iter().position(|&n| n == 0) {
            return config_error(format!("layer {u} of shape {:?} is empty", self.shape));
        }
        if self.shape[0] != self.input_ids.len() {
            return config_error(format!(
                "input layer has {} nodes but {} input ids were given",
                self.shape[0],
                self.input_ids.len()
            ));
        }
        let n_outputs = self.shape[self.shape.len() - 1];
        if n_outputs != 1 {
            return config_error(format!("output layer must have 1 node, got {n_outputs}"));
        }
        Ok(())
    }
}

/// `(source, dest, weight)` of one link, for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkWeight {
    pub source: NodeId,
    pub dest: NodeId,
    pub weight: f32,
}

/// `(id, bias, output)` of one node, for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeState {
    pub id: NodeId,
    pub bias: f32,
    pub output: f32,
}

/// A fully connected feedforward network.
///
/// Nodes are stored layer after layer in one arena, links in another in creation order.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    topology: Topology,
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    /// `layer_offsets[u]..layer_offsets[u + 1]` is layer `u` in `nodes`.
    pub(crate) layer_offsets: Vec<usize>,
}

/// Builds a network from loose arguments, with weights drawn from the thread RNG.
pub fn build_network(
    shape: &[usize],
    activation_hidden: Activation,
    activation_output: Activation,
    regularization: Option<Regularization>,
    input_ids: &[&str],
    init_zero: bool,
) -> Result<NeuralNetwork> {
    let topology = Topology::new(shape, input_ids.iter().copied())
        .with_activation_hidden(activation_hidden)
        .with_activation_output(activation_output)
        .with_regularization(regularization)
        .with_init_zero(init_zero);
    NeuralNetwork::build(&topology)
}

impl NeuralNetwork {
    pub fn build(topology: &Topology) -> Result<Self> {
        Self::build_with_rng(topology, &mut ThreadRng::default())
    }

    /// Builds the network, drawing initial weights from `rng` in link creation order.
    pub fn build_with_rng<R: Rng>(topology: &Topology, rng: &mut R) -> Result<Self> {
        topology.validate()?;
        let shape = topology.shape();
        let n_layers = shape.len();
        let n_nodes: usize = shape.iter().sum();
        let n_links: usize = shape.windows(2).map(|w| w[0] * w[1]).sum();
        let init_zero = topology.init_zero();
        let mut nodes: Vec<Node> = Vec::with_capacity(n_nodes);
        let mut links: Vec<Link> = Vec::with_capacity(n_links);
        let mut layer_offsets = Vec::with_capacity(n_layers + 1);
        layer_offsets.push(0);
        for (u, &n) in shape.iter().enumerate() {
            let activation = if u == 0 {
                Activation::Linear
            } else if u + 1 == n_layers {
                topology.activation_output()
            } else {
                topology.activation_hidden()
            };
            let bias = if init_zero { 0.0 } else { INITIAL_BIAS };
            for position in 0..n {
                let mut node = Node::new(NodeId::new(u, position), activation, bias);
                match u.checked_sub(1) {
                    None => node.input_id = Some(topology.input_ids()[position].clone()),
                    Some(u_prev) => {
                        for g in 0..shape[u_prev] {
                            let weight = match init_zero {
                                true => 0.0,
                                false => rng.random_range(-0.5..0.5),
                            };
                            let link_id = LinkId::from(links.len());
                            links.push(Link::new(
                                NodeId::new(u_prev, g),
                                node.id,
                                weight,
                                topology.regularization(),
                            ));
                            nodes[layer_offsets[u_prev] + g].output_links.push(link_id);
                            node.input_links.push(link_id);
                        }
                    }
                }
                nodes.push(node);
            }
            layer_offsets.push(nodes.len());
        }
        debug!(
            "built network {:?} ({} hidden, {} output, regularization {:?}): {} nodes, {} links",
            shape,
            topology.activation_hidden(),
            topology.activation_output(),
            topology.regularization(),
            nodes.len(),
            links.len(),
        );
        Ok(Self {
            topology: topology.clone(),
            nodes,
            links,
            layer_offsets,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn n_layers(&self) -> usize {
        self.layer_offsets.len() - 1
    }

    pub fn n_inputs(&self) -> usize {
        self.layer_range(0).len()
    }

    pub fn input_ids(&self) -> &[String] {
        self.topology.input_ids()
    }

    pub(crate) fn layer_range(&self, index: usize) -> Range<usize> {
        self.layer_offsets[index]..self.layer_offsets[index + 1]
    }

    /// Arena index of a node, `None` if the id is out of range.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        if id.layer >= self.n_layers() {
            return None;
        }
        let range = self.layer_range(id.layer);
        (id.position < range.len()).then(|| range.start + id.position)
    }

    /// Nodes of a layer, `None` if `index` is out of range.
    pub fn layer(&self, index: usize) -> Option<&[Node]> {
        (index < self.n_layers()).then(|| &self.nodes[self.layer_range(index)])
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut [Node]> {
        if index < self.n_layers() {
            let range = self.layer_range(index);
            Some(&mut self.nodes[range])
        } else {
            None
        }
    }

    /// All nodes, layer after layer.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links in creation order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.node_index(id).map(|i| &mut self.nodes[i])
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.index())
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.index())
    }

    pub fn output_node(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Output of the last forward pass.
    pub fn output(&self) -> f32 {
        self.output_node().output
    }

    pub fn forward(&mut self, input: &[f32]) -> Result<f32> {
        forward(self, input)
    }

    /// Evaluates the network without touching its state. Node outputs go into `outputs`, which
    /// is resized to the number of nodes.
    pub fn evaluate(&self, input: &[f32], outputs: &mut Vec<f32>) -> Result<f32> {
        outputs.resize(self.nodes.len(), 0.0);
        evaluate(self, input, outputs)
    }

    pub fn back_propagate(&mut self, target: f32, error_fn: ErrorFunction) {
        back_propagate(self, target, error_fn)
    }

    pub fn update_weights(&mut self, learning_rate: f32, regularization_rate: f32) {
        update_weights(self, learning_rate, regularization_rate)
    }

    pub fn mean_loss(
        &mut self,
        samples: &[(impl AsRef<[f32]>, f32)],
        error_fn: ErrorFunction,
    ) -> Result<f32> {
        mean_loss(self, samples, error_fn)
    }

    pub fn mean_loss_par(
        &self,
        samples: &[(impl AsRef<[f32]> + Sync, f32)],
        error_fn: ErrorFunction,
    ) -> Result<f32> {
        mean_loss_par(self, samples, error_fn)
    }

    pub fn link_weights(&self) -> Vec<LinkWeight> {
        self.links
            .iter()
            .map(|link| LinkWeight {
                source: link.source,
                dest: link.dest,
                weight: link.weight,
            })
            .collect()
    }

    pub fn node_states(&self) -> Vec<NodeState> {
        self.nodes
            .iter()
            .map(|node| NodeState {
                id: node.id,
                bias: node.bias,
                output: node.output,
            })
            .collect()
    }

    /// Weights layer by layer, each source node's outgoing links in order.
    pub fn output_weights(&self) -> Vec<f32> {
        let n_sources = self.layer_offsets[self.n_layers() - 1];
        self.nodes[..n_sources]
            .iter()
            .flat_map(|node| node.output_links.iter())
            .map(|&link_id| self.links[link_id.index()].weight)
            .collect()
    }

    /// Weights into layer `index` as a matrix, rows are the layer's nodes and columns the
    /// previous layer's nodes. `None` for the input layer or out of range.
    pub fn weight_matrix(&self, index: usize) -> Option<Mat<f32>> {
        if index == 0 {
            return None;
        }
        let layer = self.layer(index)?;
        let n_previous = self.layer_range(index - 1).len();
        Some(Mat::from_fn(layer.len(), n_previous, |k, g| {
            self.links[layer[k].input_links[g].index()].weight
        }))
    }

    pub fn bias_col(&self, index: usize) -> Option<Col<f32>> {
        let layer = self.layer(index)?;
        Some(Col::from_fn(layer.len(), |k| layer[k].bias))
    }

    pub fn pretty_print_layer(&self, index: usize) -> Option<PrettyPrintLayer> {
        let w = self.weight_matrix(index)?;
        let b = self.bias_col(index)?;
        let phi = self.layer(index)?[0].activation;
        Some(PrettyPrintLayer::new(index, phi, w, b))
    }
}
