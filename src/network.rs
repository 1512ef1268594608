use crate::error::ConfigError;
use crate::train::TrainId;
use log::*;
use std::collections::HashMap;

pub type NodeId = usize;
pub type RailId = usize;

/// A station or junction. Nodes are only created through [`Network::add_node`],
/// which also keeps the list of touching rails up to date.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    is_city: bool,
    rails: Vec<RailId>,
}

impl Node {
    fn new(name: &str) -> Node {
        Node {
            name: name.to_string(),
            // Naming convention of the network files: cities are "City..."
            is_city: name.starts_with("City"),
            rails: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_city(&self) -> bool {
        self.is_city
    }

    pub fn rails(&self) -> &[RailId] {
        &self.rails
    }
}

/// Undirected track segment between two nodes.
///
/// The occupant list is the only part of a rail that changes after the network
/// has been built; trains enter and leave it as they move along their paths.
#[derive(Debug, Clone)]
pub struct Rail {
    start: NodeId,
    end: NodeId,
    length: f64,
    speed_limit: f64,
    occupants: Vec<TrainId>,
}

impl Rail {
    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Length in km.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Speed limit in km/h.
    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    pub fn occupants(&self) -> &[TrainId] {
        &self.occupants
    }

    pub fn is_occupied(&self) -> bool {
        !self.occupants.is_empty()
    }

    pub fn is_loop(&self) -> bool {
        self.start == self.end
    }

    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// The node at the opposite end from `node`, or `None` if `node` is not an
    /// endpoint of this rail.
    pub fn other_node(&self, node: NodeId) -> Option<NodeId> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

/// Owns every node and rail of the track topology. Nodes and rails refer to
/// each other through [`NodeId`] and [`RailId`] indices into this arena.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<Node>,
    node_names: HashMap<String, NodeId>,
    rails: Vec<Rail>,
}

impl Network {
    pub fn new() -> Network {
        Default::default()
    }

    /// Registers a node, or returns the existing one with the same name.
    pub fn add_node(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.node_names.get(name) {
            return *id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node::new(name));
        self.node_names.insert(name.to_string(), id);
        trace!("Added node {} as n{}", name, id);
        id
    }

    /// Adds a rail between two already registered nodes.
    pub fn add_rail(
        &mut self,
        start: &str,
        end: &str,
        length: f64,
        speed_limit: f64,
    ) -> Result<RailId, ConfigError> {
        let s = self
            .node_id(start)
            .ok_or_else(|| ConfigError::UnknownNode(start.to_string()))?;
        let e = self
            .node_id(end)
            .ok_or_else(|| ConfigError::UnknownNode(end.to_string()))?;
        self.add_rail_between(s, e, length, speed_limit)
    }

    pub fn add_rail_between(
        &mut self,
        start: NodeId,
        end: NodeId,
        length: f64,
        speed_limit: f64,
    ) -> Result<RailId, ConfigError> {
        if start >= self.nodes.len() {
            return Err(ConfigError::UnknownNodeId(start));
        }
        if end >= self.nodes.len() {
            return Err(ConfigError::UnknownNodeId(end));
        }
        // NaN fails both comparisons.
        if !(length > 0.0 && length.is_finite()) {
            return Err(ConfigError::RailLength {
                start: self.nodes[start].name.clone(),
                end: self.nodes[end].name.clone(),
                length,
            });
        }
        if !(speed_limit > 0.0 && speed_limit.is_finite()) {
            return Err(ConfigError::RailSpeedLimit {
                start: self.nodes[start].name.clone(),
                end: self.nodes[end].name.clone(),
                speed_limit,
            });
        }

        let id = self.rails.len();
        self.rails.push(Rail {
            start,
            end,
            length,
            speed_limit,
            occupants: Vec::new(),
        });
        self.nodes[start].rails.push(id);
        if end != start {
            self.nodes[end].rails.push(id);
        } else {
            warn!(
                "Rail r{} starts and ends at {}",
                id, self.nodes[start].name
            );
        }
        trace_rail(self, id);
        Ok(id)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_names.get(name).copied()
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.node_id(name).map(|id| &self.nodes[id])
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node_names.contains_key(name)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn rail(&self, id: RailId) -> &Rail {
        &self.rails[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn rails(&self) -> &[Rail] {
        &self.rails
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.nodes[id].name
    }

    /// Rails connecting `node` to a neighbour, in the order they were added.
    pub fn neighbours(&self, node: NodeId) -> impl Iterator<Item = (RailId, NodeId)> + '_ {
        self.nodes[node].rails.iter().filter_map(move |r| {
            self.rails[*r].other_node(node).map(|other| (*r, other))
        })
    }

    /// First rail, in insertion order, connecting `from` and `to`.
    pub fn rail_between(&self, from: NodeId, to: NodeId) -> Option<RailId> {
        self.nodes
            .get(from)?
            .rails
            .iter()
            .copied()
            .find(|r| self.rails[*r].connects(from, to))
    }

    /// Rails whose two ends are the same node. Permitted, but almost certainly
    /// a mistake in the network description.
    pub fn self_loops(&self) -> impl Iterator<Item = RailId> + '_ {
        (0..self.rails.len()).filter(move |r| self.rails[*r].is_loop())
    }

    pub(crate) fn occupy(&mut self, rail: RailId, train: TrainId) {
        let occupants = &mut self.rails[rail].occupants;
        if !occupants.contains(&train) {
            occupants.push(train);
        }
    }

    pub(crate) fn vacate(&mut self, rail: RailId, train: TrainId) {
        self.rails[rail].occupants.retain(|t| *t != train);
    }

    pub(crate) fn clear_occupancy(&mut self) {
        for rail in self.rails.iter_mut() {
            rail.occupants.clear();
        }
    }
}

fn trace_rail(network: &Network, id: RailId) {
    let rail = &network.rails[id];
    trace!(
        "Added rail r{} {}-{} {}km {}km/h",
        id,
        network.nodes[rail.start].name,
        network.nodes[rail.end].name,
        rail.length,
        rail.speed_limit
    );
}
