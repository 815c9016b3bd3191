//! Nodes and links of a network. Both live in arenas owned by [`NeuralNetwork`] and refer to
//! each other by id, never by reference.
//!
//! [`NeuralNetwork`]: crate::NeuralNetwork

use derive_more::{Display, From, Into};

use crate::{Activation, Regularization};

/// Position of a node in the network.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{layer}_{position}")]
pub struct NodeId {
    pub layer: usize,
    pub position: usize,
}

impl NodeId {
    pub const fn new(layer: usize, position: usize) -> Self {
        Self { layer, position }
    }
}

/// Index of a link in the network's link arena.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
#[display("link#{_0}")]
pub struct LinkId(usize);

impl LinkId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A neuron.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    /// Feature this node reads from, input layer only.
    pub(crate) input_id: Option<String>,
    pub(crate) activation: Activation,
    pub(crate) input_links: Vec<LinkId>,
    pub(crate) output_links: Vec<LinkId>,
    pub(crate) bias: f32,
    /// Weighted sum of inputs plus bias, from the last forward pass.
    pub(crate) total_input: f32,
    pub(crate) output: f32,
    /// phi'(total_input).
    pub(crate) output_der: f32,
    /// d error / d total_input.
    pub(crate) input_der: f32,
    pub(crate) acc_input_der: f32,
    pub(crate) num_accumulated_ders: usize,
}

impl Node {
    pub(crate) fn new(id: NodeId, activation: Activation, bias: f32) -> Self {
        Self {
            id,
            input_id: None,
            activation,
            input_links: Vec::new(),
            output_links: Vec::new(),
            bias,
            total_input: 0.0,
            output: 0.0,
            output_der: 0.0,
            input_der: 0.0,
            acc_input_der: 0.0,
            num_accumulated_ders: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn input_id(&self) -> Option<&str> {
        self.input_id.as_deref()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn input_links(&self) -> &[LinkId] {
        &self.input_links
    }

    pub fn output_links(&self) -> &[LinkId] {
        &self.output_links
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }

    pub fn total_input(&self) -> f32 {
        self.total_input
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn output_der(&self) -> f32 {
        self.output_der
    }

    pub fn input_der(&self) -> f32 {
        self.input_der
    }

    pub fn acc_input_der(&self) -> f32 {
        self.acc_input_der
    }

    pub fn num_accumulated_ders(&self) -> usize {
        self.num_accumulated_ders
    }

    /// Folds the current `input_der` into the mini-batch accumulator.
    pub(crate) fn accumulate(&mut self) {
        self.acc_input_der += self.input_der;
        self.num_accumulated_ders += 1;
    }

    pub(crate) fn clear_accumulated(&mut self) {
        self.acc_input_der = 0.0;
        self.num_accumulated_ders = 0;
    }
}

/// A weighted edge from `source` to `dest`.
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) source: NodeId,
    pub(crate) dest: NodeId,
    pub(crate) weight: f32,
    pub(crate) regularization: Option<Regularization>,
    pub(crate) is_dead: bool,
    /// d error / d weight for the last sample.
    pub(crate) error_der: f32,
    pub(crate) acc_error_der: f32,
    pub(crate) num_accumulated_ders: usize,
}

impl Link {
    pub(crate) fn new(
        source: NodeId,
        dest: NodeId,
        weight: f32,
        regularization: Option<Regularization>,
    ) -> Self {
        Self {
            source,
            dest,
            weight,
            regularization,
            is_dead: false,
            error_der: 0.0,
            acc_error_der: 0.0,
            num_accumulated_ders: 0,
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn dest(&self) -> NodeId {
        self.dest
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn regularization(&self) -> Option<Regularization> {
        self.regularization
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// A dead link is skipped by every pass but stays in the graph.
    pub fn set_dead(&mut self, is_dead: bool) {
        self.is_dead = is_dead;
    }

    pub fn error_der(&self) -> f32 {
        self.error_der
    }

    pub fn acc_error_der(&self) -> f32 {
        self.acc_error_der
    }

    pub fn num_accumulated_ders(&self) -> usize {
        self.num_accumulated_ders
    }

    pub(crate) fn accumulate(&mut self, error_der: f32) {
        self.error_der = error_der;
        self.acc_error_der += error_der;
        self.num_accumulated_ders += 1;
    }

    pub(crate) fn clear_accumulated(&mut self) {
        self.acc_error_der = 0.0;
        self.num_accumulated_ders = 0;
    }
}
