//! A* route planning over the navigation graph

use std::collections::{HashMap, HashSet};

use warden_math::Vec3;

use crate::graph::{NavGraph, NodeId};

/// Find a route from `start` to `goal`.
///
/// Returns the node sequence from `start` to `goal` inclusive, a
/// single-element sequence when they coincide, or an empty sequence when
/// the goal is unreachable. Unreachable is not an error: callers fall back
/// to steering straight at the destination.
///
/// Ties in the open set are broken by insertion order (the linear minimum
/// scan keeps the first node found), and a neighbor already queued with an
/// equal-or-better known cost is left alone. Changing either rule changes
/// which of several equal-cost routes comes back.
pub fn find_path(graph: &NavGraph, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut open: Vec<NodeId> = vec![start];
    let mut closed: HashSet<NodeId> = HashSet::new();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();

    // g: best known cost from start, f: g plus heuristic to goal
    let mut cost_so_far: HashMap<NodeId, f32> = HashMap::new();
    let mut cost_to_end: HashMap<NodeId, f32> = HashMap::new();

    let goal_pos = graph.position(goal);

    cost_so_far.insert(start, 0.0);
    cost_to_end.insert(start, heuristic(graph.position(start), goal_pos));

    while !open.is_empty() {
        let current_idx = lowest_cost(&open, &cost_to_end);
        let current = open[current_idx];

        if current == goal {
            return reconstruct_path(&came_from, current);
        }

        // remove() keeps the queue in insertion order
        open.remove(current_idx);
        closed.insert(current);

        let current_cost = *cost_so_far.get(&current).unwrap_or(&f32::MAX);

        for &(neighbor, weight) in graph.edges(current) {
            if closed.contains(&neighbor) {
                continue;
            }

            let tentative = current_cost + weight;

            if !open.contains(&neighbor) {
                open.push(neighbor);
            } else if tentative >= *cost_so_far.get(&neighbor).unwrap_or(&f32::MAX) {
                continue;
            }

            came_from.insert(neighbor, current);
            cost_so_far.insert(neighbor, tentative);
            cost_to_end.insert(neighbor, tentative + heuristic(graph.position(neighbor), goal_pos));
        }
    }

    Vec::new() // goal unreachable
}

/// Straight-line distance, admissible for non-negative edge weights
fn heuristic(from: Vec3, to: Vec3) -> f32 {
    from.distance(to)
}

/// Index of the open-set entry with the lowest f-cost, first found wins
fn lowest_cost(open: &[NodeId], costs: &HashMap<NodeId, f32>) -> usize {
    let mut lowest = 0;
    let mut lowest_cost = f32::MAX;

    for (idx, node) in open.iter().enumerate() {
        let cost = *costs.get(node).unwrap_or(&f32::MAX);
        if cost < lowest_cost {
            lowest_cost = cost;
            lowest = idx;
        }
    }

    lowest
}

/// Walk predecessor links back to the start
fn reconstruct_path(came_from: &HashMap<NodeId, NodeId>, mut current: NodeId) -> Vec<NodeId> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
