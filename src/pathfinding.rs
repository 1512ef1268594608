use crate::network::{Network, NodeId, Rail};
use log::*;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Computes the node sequence a train follows, both endpoints included.
///
/// Implementations return an empty path when no route exists or an endpoint is
/// not part of the network, and `[start]` when `start == end`.
pub trait PathfindingStrategy {
    fn name(&self) -> &str;
    fn find_path(&self, network: &Network, start: NodeId, end: NodeId) -> Vec<NodeId>;
}

/// What a rail costs to traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeCost {
    /// Hours at the speed limit: `length / speed_limit`.
    TravelTime,
    /// Kilometres.
    Distance,
}

impl EdgeCost {
    /// `None` means the rail cannot be used.
    pub fn of(self, rail: &Rail) -> Option<f64> {
        match self {
            EdgeCost::TravelTime => {
                if rail.speed_limit() > 0.0 {
                    Some(rail.length() / rail.speed_limit())
                } else {
                    None
                }
            }
            EdgeCost::Distance => Some(rail.length()),
        }
    }
}

/// Dijkstra's algorithm over the undirected rail graph.
///
/// Among equally cheap frontier nodes the one with the lowest [`NodeId`] is
/// settled first, so results depend only on the graph.
#[derive(Debug, Clone, Copy)]
pub struct Dijkstra {
    cost: EdgeCost,
}

impl Dijkstra {
    /// Minimizes travel time. This is the default strategy of the simulation.
    pub fn fastest() -> Dijkstra {
        Dijkstra {
            cost: EdgeCost::TravelTime,
        }
    }

    pub fn shortest() -> Dijkstra {
        Dijkstra {
            cost: EdgeCost::Distance,
        }
    }

    pub fn edge_cost(&self) -> EdgeCost {
        self.cost
    }
}

impl Default for Dijkstra {
    fn default() -> Self {
        Dijkstra::fastest()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PathfindingStrategy for Dijkstra {
    fn name(&self) -> &str {
        match self.cost {
            EdgeCost::TravelTime => "dijkstra (travel time)",
            EdgeCost::Distance => "dijkstra (distance)",
        }
    }

    fn find_path(&self, network: &Network, start: NodeId, end: NodeId) -> Vec<NodeId> {
        let n = network.nodes().len();
        if start >= n || end >= n {
            return Vec::new();
        }
        if start == end {
            return vec![start];
        }

        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<NodeId>> = vec![None; n];
        let mut settled = vec![false; n];
        let mut heap = BinaryHeap::new();

        dist[start] = 0.0;
        heap.push(Reverse((Cost(0.0), start)));

        while let Some(Reverse((Cost(d), u))) = heap.pop() {
            if settled[u] {
                continue;
            }
            settled[u] = true;
            if u == end {
                break;
            }
            for (rail, v) in network.neighbours(u) {
                if settled[v] {
                    continue;
                }
                let w = match self.cost.of(network.rail(rail)) {
                    Some(w) => w,
                    None => continue,
                };
                let nd = d + w;
                if nd < dist[v] {
                    dist[v] = nd;
                    prev[v] = Some(u);
                    heap.push(Reverse((Cost(nd), v)));
                }
            }
        }

        if prev[end].is_none() {
            debug!(
                "No path from {} to {}",
                network.node_name(start),
                network.node_name(end)
            );
            return Vec::new();
        }

        let mut path = vec![end];
        let mut node = end;
        while let Some(p) = prev[node] {
            path.push(p);
            node = p;
        }
        path.reverse();
        trace!(
            "Path {} -> {}: {:?} cost {}",
            network.node_name(start),
            network.node_name(end),
            path,
            dist[end]
        );
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(network: &Network, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .map(|n| network.node_name(*n).to_string())
            .collect()
    }

    /// A-B-C is slower per km but faster overall than the direct A-C rail.
    fn triangle() -> Network {
        let mut network = Network::new();
        for n in ["A", "B", "C"] {
            network.add_node(n);
        }
        network.add_rail("A", "B", 10.0, 50.0).unwrap();
        network.add_rail("B", "C", 10.0, 100.0).unwrap();
        network.add_rail("A", "C", 30.0, 30.0).unwrap();
        network
    }

    #[test]
    fn prefers_fastest_over_direct() {
        let network = triangle();
        let a = network.node_id("A").unwrap();
        let c = network.node_id("C").unwrap();
        let path = Dijkstra::fastest().find_path(&network, a, c);
        assert_eq!(names(&network, &path), vec!["A", "B", "C"]);
    }

    #[test]
    fn distance_cost_picks_fewer_kilometres() {
        let mut network = triangle();
        network.add_node("D");
        network.add_rail("C", "D", 5.0, 10.0).unwrap();
        network.add_rail("A", "D", 40.0, 200.0).unwrap();
        let a = network.node_id("A").unwrap();
        let d = network.node_id("D").unwrap();

        let fastest = Dijkstra::fastest().find_path(&network, a, d);
        assert_eq!(names(&network, &fastest), vec!["A", "D"]);
        let shortest = Dijkstra::shortest().find_path(&network, a, d);
        assert_eq!(names(&network, &shortest), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let mut network = Network::new();
        for n in ["A", "B1", "B2", "C"] {
            network.add_node(n);
        }
        // Two equally fast routes.
        network.add_rail("A", "B1", 10.0, 100.0).unwrap();
        network.add_rail("A", "B2", 10.0, 100.0).unwrap();
        network.add_rail("B1", "C", 10.0, 100.0).unwrap();
        network.add_rail("B2", "C", 10.0, 100.0).unwrap();
        let a = network.node_id("A").unwrap();
        let c = network.node_id("C").unwrap();

        let first = Dijkstra::default().find_path(&network, a, c);
        for _ in 0..10 {
            assert_eq!(Dijkstra::default().find_path(&network, a, c), first);
        }
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn same_start_and_end() {
        let network = triangle();
        let b = network.node_id("B").unwrap();
        assert_eq!(Dijkstra::default().find_path(&network, b, b), vec![b]);
    }

    #[test]
    fn disconnected_graph_gives_empty_path() {
        let mut network = triangle();
        network.add_node("X");
        network.add_node("Y");
        network.add_rail("X", "Y", 1.0, 10.0).unwrap();
        let a = network.node_id("A").unwrap();
        let y = network.node_id("Y").unwrap();
        assert!(Dijkstra::default().find_path(&network, a, y).is_empty());
        assert!(Dijkstra::default().find_path(&network, y, a).is_empty());
    }

    #[test]
    fn invalid_endpoint_gives_empty_path() {
        let network = triangle();
        assert!(Dijkstra::default().find_path(&network, 0, 99).is_empty());
        assert!(Dijkstra::default().find_path(&network, 99, 0).is_empty());
    }

    #[test]
    fn isolated_node_is_unreachable() {
        let mut network = triangle();
        let lonely = network.add_node("Lonely");
        let a = network.node_id("A").unwrap();
        assert!(Dijkstra::default().find_path(&network, a, lonely).is_empty());
    }
}
