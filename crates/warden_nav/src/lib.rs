//! # warden_nav - Navigation and Pathfinding
//!
//! A static navigation graph plus A* route planning. The graph is built
//! once at level load and read-only afterwards, so it can be shared across
//! any number of agents without synchronization; all search state lives in
//! the planning call.

pub mod graph;
pub mod path;
pub mod planner;

pub use graph::{NavGraph, NavNode, NodeId};
pub use path::NavPath;
pub use planner::find_path;
