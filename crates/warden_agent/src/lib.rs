//! # warden_agent - Enemy Agent Core
//!
//! The decision-and-navigation engine for a maze-stealth enemy: perceive a
//! target through a vision cone and line-of-sight oracle, pick a behavior
//! (patrol, pursue, search the last known area), plan a route over the
//! navigation graph, and steer along it one fixed tick at a time.
//!
//! The agent holds no engine hooks. An external scheduler calls
//! [`agent::EnemyAgent::step`] once per fixed tick with the current pose
//! and world references, and hands the returned steering command to the
//! physics integrator.
//!
//! # Example
//!
//! ```ignore
//! use warden_agent::prelude::*;
//!
//! let mut agent = EnemyAgent::new(config, graph, bus, patrol_points)?;
//! let command = agent.step(&inputs, &oracle);
//! ```

pub mod agent;
pub mod config;
pub mod decision;
pub mod error;
pub mod perception;
pub mod steering;

pub mod prelude {
    pub use crate::agent::{EnemyAgent, TickInputs};
    pub use crate::config::AgentConfig;
    pub use crate::decision::{AgentState, DecisionEngine, Directive};
    pub use crate::error::{AgentError, Result};
    pub use crate::perception::{OcclusionOracle, PerceptionResult, Pose, Sighting};
    pub use crate::steering::{PhysicsIntegrator, SteeringCommand, SteeringController};
}

pub use prelude::*;
