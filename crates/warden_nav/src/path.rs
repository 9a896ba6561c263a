//! Planned routes through the navigation graph

use serde::{Deserialize, Serialize};
use warden_math::Vec3;

use crate::graph::{NavGraph, NodeId};

/// An ordered route from a planning call.
///
/// Owned exclusively by the agent that requested it and replaced wholesale
/// on every re-plan - a path is never repaired in place. Waypoint positions
/// are captured at plan time so steering does not need the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavPath {
    /// Nodes along the route, start first
    pub nodes: Vec<NodeId>,
    /// World positions of those nodes
    pub waypoints: Vec<Vec3>,
}

impl NavPath {
    /// Build a path from a node sequence, capturing waypoint positions
    pub fn from_nodes(graph: &NavGraph, nodes: Vec<NodeId>) -> Self {
        let waypoints = nodes.iter().map(|&id| graph.position(id)).collect();
        Self { nodes, waypoints }
    }

    /// Whether the path holds no waypoints
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of waypoints
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Final waypoint of the route
    pub fn destination(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    /// Index of the waypoint nearest to a world position
    pub fn nearest_waypoint(&self, position: Vec3) -> usize {
        let mut nearest = 0;
        let mut nearest_dist = f32::MAX;

        for (idx, waypoint) in self.waypoints.iter().enumerate() {
            let dist = position.distance(*waypoint);
            if dist < nearest_dist {
                nearest_dist = dist;
                nearest = idx;
            }
        }

        nearest
    }

    /// Total length along the waypoints
    pub fn total_length(&self) -> f32 {
        let mut length = 0.0;
        for i in 0..self.waypoints.len().saturating_sub(1) {
            length += self.waypoints[i].distance(self.waypoints[i + 1]);
        }
        length
    }
}
