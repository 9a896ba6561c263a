//! Navigation graph storage

use serde::{Deserialize, Serialize};
use warden_math::Vec3;

/// Stable index handle to a node in a [`NavGraph`].
///
/// Nodes reference each other through these handles rather than direct
/// references, so the graph owns all of its storage in one arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Arena index of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A traversable point in the level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavNode {
    /// World position
    pub position: Vec3,
    /// Outgoing edges as (neighbor, traversal cost)
    pub edges: Vec<(NodeId, f32)>,
}

/// Static graph of traversable points, immutable once the level is loaded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavGraph {
    nodes: Vec<NavNode>,
}

impl NavGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at a world position
    pub fn add_node(&mut self, position: Vec3) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NavNode {
            position,
            edges: Vec::new(),
        });
        id
    }

    /// Add a one-way edge with an explicit traversal cost
    pub fn connect(&mut self, from: NodeId, to: NodeId, cost: f32) {
        self.nodes[from.index()].edges.push((to, cost));
    }

    /// Connect two nodes both ways, costed by their straight-line distance
    pub fn link(&mut self, a: NodeId, b: NodeId) {
        let cost = self.position(a).distance(self.position(b));
        self.connect(a, b, cost);
        self.connect(b, a, cost);
    }

    /// World position of a node
    #[inline]
    pub fn position(&self, id: NodeId) -> Vec3 {
        self.nodes[id.index()].position
    }

    /// Outgoing edges of a node
    #[inline]
    pub fn edges(&self, id: NodeId) -> &[(NodeId, f32)] {
        &self.nodes[id.index()].edges
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nearest node to a world point, `None` on an empty graph
    pub fn nearest_node(&self, point: Vec3) -> Option<NodeId> {
        let mut nearest = None;
        let mut nearest_dist = f32::MAX;

        for (idx, node) in self.nodes.iter().enumerate() {
            let dist = node.position.distance_squared(point);
            if dist < nearest_dist {
                nearest_dist = dist;
                nearest = Some(NodeId(idx as u32));
            }
        }

        nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_link() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::new(3.0, 0.0, 4.0));
        graph.link(a, b);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edges(a), &[(b, 5.0)]);
        assert_eq!(graph.edges(b), &[(a, 5.0)]);
    }

    #[test]
    fn test_nearest_node() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::new(10.0, 0.0, 0.0));

        assert_eq!(graph.nearest_node(Vec3::new(1.0, 0.0, 0.0)), Some(a));
        assert_eq!(graph.nearest_node(Vec3::new(9.0, 0.0, 0.0)), Some(b));
    }

    #[test]
    fn test_nearest_node_empty_graph() {
        let graph = NavGraph::new();
        assert_eq!(graph.nearest_node(Vec3::ZERO), None);
    }
}
