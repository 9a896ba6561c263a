//! Path-following steering
//!
//! Converts the active path (or the raw destination when no plan exists)
//! into a floating target, then into a velocity and a bounded turn toward
//! it. The command is handed to the external physics integrator; the core
//! never moves the agent itself.

use serde::{Deserialize, Serialize};
use warden_math::{radians, Quat, Vec3};
use warden_nav::NavPath;

use crate::config::AgentConfig;
use crate::perception::Pose;

/// Per-tick velocity decay once inside stopping distance
const DAMPING: f32 = 0.95;

/// Consumes steering output once per tick; implemented by the external
/// physics layer
pub trait PhysicsIntegrator {
    /// Set the agent's linear velocity
    fn set_velocity(&mut self, velocity: Vec3);
    /// Set the agent's heading
    fn set_rotation(&mut self, rotation: Quat);
}

/// One tick of steering output
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteeringCommand {
    /// Desired linear velocity
    pub velocity: Vec3,
    /// Desired heading after this tick's bounded turn
    pub rotation: Quat,
}

impl SteeringCommand {
    /// Hand this command to the physics integrator
    pub fn apply(&self, integrator: &mut dyn PhysicsIntegrator) {
        integrator.set_velocity(self.velocity);
        integrator.set_rotation(self.rotation);
    }
}

/// Converts path and destination into velocity and heading commands
#[derive(Debug, Default)]
pub struct SteeringController {
    velocity: Vec3,
}

impl SteeringController {
    /// Create a controller at rest
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any carried velocity
    pub fn reset(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    /// Velocity carried from the previous tick
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// The point steered toward this tick: the waypoint after the nearest
    /// path waypoint (the terminal one on the last segment), or the raw
    /// destination when no path is active.
    pub fn floating_target(
        position: Vec3,
        path: Option<&NavPath>,
        destination: Option<Vec3>,
    ) -> Option<Vec3> {
        match path {
            Some(path) if !path.is_empty() => {
                let nearest = path.nearest_waypoint(position);
                let next = if nearest + 1 < path.len() {
                    nearest + 1
                } else {
                    nearest
                };
                Some(path.waypoints[next])
            }
            _ => destination,
        }
    }

    /// Produce this tick's steering command.
    ///
    /// Outside stopping distance of the floating target the agent moves at
    /// full speed straight toward it; inside, velocity decays by a fixed
    /// factor per tick so the stop is smooth. The heading turns toward the
    /// velocity at a bounded rate, never snapping.
    pub fn step(
        &mut self,
        pose: &Pose,
        path: Option<&NavPath>,
        destination: Option<Vec3>,
        config: &AgentConfig,
    ) -> SteeringCommand {
        let floating = Self::floating_target(pose.position, path, destination);

        match floating {
            Some(target) if pose.position.distance(target) > config.stopping_distance => {
                let direction = (target - pose.position).normalize();
                self.velocity = direction * config.max_speed;
            }
            _ => {
                self.velocity *= DAMPING;
            }
        }

        let rotation = if self.velocity != Vec3::ZERO {
            let facing = Quat::look_rotation(self.velocity);
            pose.rotation
                .rotate_towards(facing, radians(config.turn_rate))
        } else {
            pose.rotation
        };

        SteeringCommand {
            velocity: self.velocity,
            rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use warden_nav::NavGraph;

    fn config() -> AgentConfig {
        AgentConfig::default()
    }

    #[test]
    fn test_full_speed_toward_destination() {
        let mut steering = SteeringController::new();
        let pose = Pose::at(Vec3::ZERO);
        let dest = Vec3::new(10.0, 0.0, 0.0);

        let command = steering.step(&pose, None, Some(dest), &config());

        assert_relative_eq!(command.velocity.length(), config().max_speed, epsilon = 1e-5);
        assert!(command.velocity.x > 0.0);
    }

    #[test]
    fn test_speed_never_exceeds_max() {
        let mut steering = SteeringController::new();
        let cfg = config();

        for i in 0..50 {
            let pose = Pose::at(Vec3::new(i as f32 * 0.1, 0.0, 0.0));
            let dest = Vec3::new(40.0, 0.0, (i % 7) as f32);
            let command = steering.step(&pose, None, Some(dest), &cfg);
            assert!(command.velocity.length() <= cfg.max_speed + 1e-4);
        }
    }

    #[test]
    fn test_damping_within_stopping_distance() {
        let mut steering = SteeringController::new();
        let cfg = config();

        // Build up speed first
        let far = Pose::at(Vec3::ZERO);
        steering.step(&far, None, Some(Vec3::new(20.0, 0.0, 0.0)), &cfg);
        let full = steering.velocity().length();

        // Now inside stopping distance: geometric decay
        let near = Pose::at(Vec3::new(19.0, 0.0, 0.0));
        let first = steering.step(&near, None, Some(Vec3::new(20.0, 0.0, 0.0)), &cfg);
        assert_relative_eq!(first.velocity.length(), full * DAMPING, epsilon = 1e-4);

        let second = steering.step(&near, None, Some(Vec3::new(20.0, 0.0, 0.0)), &cfg);
        assert_relative_eq!(
            second.velocity.length(),
            full * DAMPING * DAMPING,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_no_target_decays_to_rest() {
        let mut steering = SteeringController::new();
        let cfg = config();
        let pose = Pose::at(Vec3::ZERO);

        steering.step(&pose, None, Some(Vec3::new(20.0, 0.0, 0.0)), &cfg);
        for _ in 0..200 {
            steering.step(&pose, None, None, &cfg);
        }
        assert!(steering.velocity().length() < 0.01);
    }

    #[test]
    fn test_turn_rate_bounded() {
        let mut steering = SteeringController::new();
        let cfg = config();
        // Facing +Z, target off to the side
        let pose = Pose::at(Vec3::ZERO);

        let command = steering.step(&pose, None, Some(Vec3::new(10.0, 0.0, 0.0)), &cfg);

        let turned = pose.rotation.angle_to(command.rotation);
        assert!(turned <= radians(cfg.turn_rate) + 1e-4);
        assert!(turned > 0.0);
    }

    #[test]
    fn test_floating_target_mid_path() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = graph.add_node(Vec3::new(5.0, 0.0, 0.0));
        let c = graph.add_node(Vec3::new(10.0, 0.0, 0.0));
        let path = NavPath::from_nodes(&graph, vec![a, b, c]);

        // Nearest waypoint is b; steer for the one after it
        let target = SteeringController::floating_target(
            Vec3::new(4.0, 0.0, 0.0),
            Some(&path),
            Some(Vec3::new(99.0, 0.0, 0.0)),
        );
        assert_eq!(target, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_floating_target_last_segment() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::new(0.0, 0.0, 0.0));
        let b = graph.add_node(Vec3::new(5.0, 0.0, 0.0));
        let path = NavPath::from_nodes(&graph, vec![a, b]);

        // Already nearest the terminal node: keep steering for it
        let target = SteeringController::floating_target(
            Vec3::new(6.0, 0.0, 0.0),
            Some(&path),
            None,
        );
        assert_eq!(target, Some(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_floating_target_without_path() {
        let dest = Vec3::new(3.0, 0.0, 3.0);
        assert_eq!(
            SteeringController::floating_target(Vec3::ZERO, None, Some(dest)),
            Some(dest)
        );
        assert_eq!(
            SteeringController::floating_target(Vec3::ZERO, None, None),
            None
        );
    }
}
