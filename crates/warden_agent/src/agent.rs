//! The per-tick agent pipeline
//!
//! Order within a tick: drain gameplay signals, run perception, fold the
//! result into the decision engine, commit a destination (re-planning when
//! the intent changed or no path is active), then steer. The agent holds
//! no engine hooks; an external fixed-tick scheduler drives [`EnemyAgent::step`].

use std::sync::Arc;

use crossbeam_channel::Receiver;
use warden_event::{EventBus, Signal, Topic};
use warden_math::Vec3;
use warden_nav::{find_path, NavGraph, NavPath};

use crate::config::AgentConfig;
use crate::decision::{AgentState, DecisionEngine, Directive};
use crate::error::{AgentError, Result};
use crate::perception::{self, OcclusionOracle, PerceptionResult, Pose, Sighting};
use crate::steering::{PhysicsIntegrator, SteeringCommand, SteeringController};

/// World inputs for one tick
#[derive(Clone, Copy, Debug)]
pub struct TickInputs {
    /// The agent's current pose, owned by the physics layer
    pub pose: Pose,
    /// Primary target position, `None` when the target is gone
    pub target: Option<Vec3>,
    /// Point of interest checked while the target is concealed
    pub poi: Option<Vec3>,
}

/// An autonomous enemy agent.
///
/// Owns its behavior state, alert window, and current path exclusively;
/// the navigation graph and signal bus are shared, read-only and
/// fire-and-forget respectively.
pub struct EnemyAgent {
    config: AgentConfig,
    graph: Arc<NavGraph>,
    bus: Arc<EventBus>,
    signal_rx: [Receiver<Signal>; 4],
    decision: DecisionEngine,
    steering: SteeringController,
    path: Option<NavPath>,
    destination: Option<Vec3>,
    patrol_points: [Vec3; 2],
    active: bool,
}

impl EnemyAgent {
    /// Create an agent patrolling between two fixed points.
    ///
    /// Fails when the configuration is invalid or the navigation graph
    /// collaborator is empty - the agent does not attempt to run without
    /// its graph.
    pub fn new(
        config: AgentConfig,
        graph: Arc<NavGraph>,
        bus: Arc<EventBus>,
        patrol_points: [Vec3; 2],
    ) -> Result<Self> {
        config.validate().map_err(|err| {
            log::error!("agent configuration rejected: {err}");
            err
        })?;
        if graph.is_empty() {
            log::error!("navigation graph has no nodes at agent startup");
            return Err(AgentError::EmptyNavGraph);
        }

        let signal_rx =
            [Topic::Alert, Topic::Hide, Topic::UnHide, Topic::TargetLost].map(|t| bus.subscribe(t));

        Ok(Self {
            config,
            graph,
            bus,
            signal_rx,
            decision: DecisionEngine::new(),
            steering: SteeringController::new(),
            path: None,
            destination: None,
            patrol_points,
            active: true,
        })
    }

    /// Current behavior state
    pub fn state(&self) -> AgentState {
        if self.active {
            self.decision.state()
        } else {
            AgentState::Disabled
        }
    }

    /// Whether the pipeline runs
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The active path, if any
    pub fn path(&self) -> Option<&NavPath> {
        self.path.as_ref()
    }

    /// The committed destination, if any
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// The decision engine (behavior state, timers)
    pub fn decision(&self) -> &DecisionEngine {
        &self.decision
    }

    /// Activate or deactivate the whole pipeline.
    ///
    /// Signals queued while disabled are stale by the time the agent wakes
    /// and are dropped on reactivation.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        self.decision.set_disabled(!active);
        if active {
            for i in 0..self.signal_rx.len() {
                while self.signal_rx[i].try_recv().is_ok() {}
            }
        }
    }

    /// Restore startup defaults: patrol state, cleared timers, no path
    pub fn reset(&mut self) {
        self.decision.reset();
        self.steering.reset();
        self.path = None;
        self.destination = None;
        self.active = true;
    }

    /// Run one fixed tick of the pipeline.
    ///
    /// Returns `None` while deactivated. All per-tick failures (absent
    /// target, unreachable goal, missing node mapping) are non-fatal and
    /// retried next tick.
    pub fn step(&mut self, inputs: &TickInputs, oracle: &dyn OcclusionOracle) -> Option<SteeringCommand> {
        if !self.active {
            return None;
        }

        self.drain_signals();

        let seen = self.perceive(inputs, oracle);
        self.decision.observe(&seen, &self.config);

        let directive = self.decision.decide(
            inputs.pose.position,
            self.path.is_some(),
            self.destination,
            self.patrol_points,
            &self.config,
        );
        match directive {
            Directive::FollowPath => {}
            Directive::LeavePath { destination } => {
                // Close enough: drop the route and steer straight in
                self.path = None;
                self.destination = Some(destination);
            }
            Directive::Commit { destination } => {
                self.commit_destination(destination, inputs.pose.position);
            }
        }

        let command =
            self.steering
                .step(&inputs.pose, self.path.as_ref(), self.destination, &self.config);

        self.decision.tick();
        Some(command)
    }

    /// Step and hand the command to the physics integrator.
    ///
    /// Returns whether a command was issued (false while deactivated).
    pub fn drive(
        &mut self,
        inputs: &TickInputs,
        oracle: &dyn OcclusionOracle,
        integrator: &mut dyn PhysicsIntegrator,
    ) -> bool {
        match self.step(inputs, oracle) {
            Some(command) => {
                command.apply(integrator);
                true
            }
            None => false,
        }
    }

    fn drain_signals(&mut self) {
        for i in 0..self.signal_rx.len() {
            while let Ok(signal) = self.signal_rx[i].try_recv() {
                match signal {
                    Signal::Alert { target } => self.decision.hear_alert(target, &self.config),
                    Signal::Hide => {
                        self.decision.hear_hide(&self.config);
                        // The pursuit intent is superseded: discard the
                        // in-flight path before anything reads it again
                        self.path = None;
                        self.destination = None;
                    }
                    Signal::UnHide => self.decision.hear_unhide(),
                    Signal::TargetLost => self.decision.hear_target_lost(),
                }
            }
        }
    }

    fn perceive(&mut self, inputs: &TickInputs, oracle: &dyn OcclusionOracle) -> PerceptionResult {
        if !self.decision.is_hiding() {
            let result = perception::evaluate(
                &inputs.pose,
                inputs.target,
                self.config.view_radius,
                self.config.view_angle,
                self.config.target_proximity,
                oracle,
            );
            if result.source == Some(Sighting::DirectSight) {
                // Re-broadcast every tick sight holds; receivers must
                // tolerate duplicate alerts
                self.bus.publish(Signal::Alert {
                    target: result.position,
                });
            }
            result
        } else if self.decision.poi_check_due(self.config.poi_check_interval) {
            perception::evaluate(
                &inputs.pose,
                inputs.poi,
                self.config.view_radius,
                self.config.view_angle,
                self.config.poi_proximity,
                oracle,
            )
        } else {
            PerceptionResult::hidden()
        }
    }

    /// Commit to a destination, re-planning when the intent changed or no
    /// path is active.
    fn commit_destination(&mut self, destination: Vec3, position: Vec3) {
        let unchanged = self.destination == Some(destination);
        if unchanged && self.path.is_some() {
            return;
        }

        if position.distance(destination) > self.config.min_path_distance {
            let start = self.graph.nearest_node(position);
            let goal = self.graph.nearest_node(destination);
            let (start, goal) = match (start, goal) {
                (Some(start), Some(goal)) => (start, goal),
                _ => {
                    // No graph mapping: skip planning this tick and keep
                    // the previous floating target
                    log::warn!("no graph node near agent or destination, planning skipped");
                    return;
                }
            };

            let nodes = find_path(&self.graph, start, goal);
            self.destination = Some(destination);
            if nodes.is_empty() {
                log::debug!("destination unreachable on graph, steering directly");
                self.path = None;
            } else {
                self.path = Some(NavPath::from_nodes(&self.graph, nodes));
            }
        } else {
            // Close enough that the planner is not worth consulting
            self.destination = Some(destination);
            self.path = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_math::Quat;

    /// Oracle with no geometry at all
    struct OpenField;

    impl OcclusionOracle for OpenField {
        fn is_blocked(&self, _from: Vec3, _to: Vec3, _max_distance: f32) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct RecordingIntegrator {
        velocity: Vec3,
        rotation: Quat,
        calls: u32,
    }

    impl PhysicsIntegrator for RecordingIntegrator {
        fn set_velocity(&mut self, velocity: Vec3) {
            self.velocity = velocity;
            self.calls += 1;
        }
        fn set_rotation(&mut self, rotation: Quat) {
            self.rotation = rotation;
        }
    }

    /// Six-node line along +X, two units apart, linked both ways
    fn line_graph() -> Arc<NavGraph> {
        let mut graph = NavGraph::new();
        let nodes: Vec<_> = (0..=5)
            .map(|i| graph.add_node(Vec3::new(i as f32 * 2.0, 0.0, 0.0)))
            .collect();
        for pair in nodes.windows(2) {
            graph.link(pair[0], pair[1]);
        }
        Arc::new(graph)
    }

    fn patrol_points() -> [Vec3; 2] {
        [Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)]
    }

    fn agent(bus: &Arc<EventBus>) -> EnemyAgent {
        EnemyAgent::new(
            AgentConfig::default(),
            line_graph(),
            Arc::clone(bus),
            patrol_points(),
        )
        .unwrap()
    }

    fn quiet_inputs(position: Vec3) -> TickInputs {
        TickInputs {
            pose: Pose::at(position),
            target: None,
            poi: None,
        }
    }

    #[test]
    fn test_empty_graph_is_fatal() {
        let bus = Arc::new(EventBus::new());
        let result = EnemyAgent::new(
            AgentConfig::default(),
            Arc::new(NavGraph::new()),
            bus,
            patrol_points(),
        );
        assert!(matches!(result, Err(AgentError::EmptyNavGraph)));
    }

    #[test]
    fn test_patrol_plans_toward_first_point() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);

        let command = agent.step(&quiet_inputs(Vec3::ZERO), &OpenField).unwrap();

        assert_eq!(agent.state(), AgentState::Patrolling);
        assert_eq!(agent.destination(), Some(Vec3::new(10.0, 0.0, 0.0)));
        // Patrol point is 10 units out, past the planner threshold
        assert!(agent.path().is_some());
        assert!(command.velocity.x > 0.0);
    }

    #[test]
    fn test_sighting_pursues_and_broadcasts() {
        let bus = Arc::new(EventBus::new());
        let listener = bus.subscribe(Topic::Alert);
        let mut agent = agent(&bus);

        let target = Vec3::new(0.0, 0.0, 5.0); // dead ahead, in range
        let inputs = TickInputs {
            pose: Pose::at(Vec3::ZERO),
            target: Some(target),
            poi: None,
        };
        let command = agent.step(&inputs, &OpenField).unwrap();

        assert_eq!(agent.state(), AgentState::Pursuing);
        assert_eq!(agent.destination(), Some(target));
        assert!(command.velocity.z > 0.0);
        assert_eq!(
            listener.try_recv().unwrap(),
            Signal::Alert {
                target: Some(target)
            }
        );
    }

    #[test]
    fn test_proximity_sighting_does_not_broadcast() {
        let bus = Arc::new(EventBus::new());
        let listener = bus.subscribe(Topic::Alert);
        let mut agent = agent(&bus);

        // Directly behind, one unit away
        let inputs = TickInputs {
            pose: Pose::at(Vec3::ZERO),
            target: Some(Vec3::new(0.0, 0.0, -1.0)),
            poi: None,
        };
        agent.step(&inputs, &OpenField).unwrap();

        assert_eq!(agent.state(), AgentState::Pursuing);
        assert!(listener.try_recv().is_err());
    }

    #[test]
    fn test_alert_signal_drives_search() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);

        let reported = Vec3::new(8.0, 0.0, 0.0);
        bus.publish(Signal::Alert {
            target: Some(reported),
        });

        agent.step(&quiet_inputs(Vec3::ZERO), &OpenField).unwrap();

        assert_eq!(agent.state(), AgentState::SearchingLastKnownArea);
        assert_eq!(agent.destination(), Some(reported));
    }

    #[test]
    fn test_pursuit_expires_back_to_patrol() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);
        let config = AgentConfig::default();

        // Close enough that no route is planned for the search point, so
        // the patrol commit is free to take over once the window closes
        bus.publish(Signal::Alert {
            target: Some(Vec3::new(4.0, 0.0, 0.0)),
        });

        for _ in 0..=config.alert_ticks {
            agent.step(&quiet_inputs(Vec3::ZERO), &OpenField).unwrap();
        }

        assert_eq!(agent.state(), AgentState::Patrolling);
        assert_eq!(agent.destination(), Some(patrol_points()[0]));
    }

    #[test]
    fn test_leave_path_flips_patrol_leg() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);

        // Plan toward patrol point one from the far end
        agent.step(&quiet_inputs(Vec3::ZERO), &OpenField).unwrap();
        assert!(agent.path().is_some());
        assert!(agent.decision().patrol_alternator());

        // Mid-path the agent closes within the leave-path threshold
        agent
            .step(&quiet_inputs(Vec3::new(9.0, 0.0, 0.0)), &OpenField)
            .unwrap();

        assert!(agent.path().is_none());
        assert!(!agent.decision().patrol_alternator());

        // The next patrol commit heads for the second point
        agent
            .step(&quiet_inputs(Vec3::new(9.5, 0.0, 0.0)), &OpenField)
            .unwrap();
        assert_eq!(agent.destination(), Some(patrol_points()[1]));
    }

    #[test]
    fn test_hide_discards_pursuit() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);

        // Get a pursuit path going
        let inputs = TickInputs {
            pose: Pose::at(Vec3::ZERO),
            target: Some(Vec3::new(0.0, 0.0, 8.0)),
            poi: None,
        };
        agent.step(&inputs, &OpenField).unwrap();
        assert_eq!(agent.state(), AgentState::Pursuing);

        bus.publish(Signal::Hide);
        agent.step(&quiet_inputs(Vec3::ZERO), &OpenField).unwrap();

        assert!(agent.decision().is_hiding());
        // Pursuit was abandoned; the agent is back on patrol intent
        assert_eq!(agent.state(), AgentState::Patrolling);
        assert_eq!(agent.decision().alert_timer(), 0);
    }

    #[test]
    fn test_poi_spotted_while_hiding() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);
        let config = AgentConfig::default();

        bus.publish(Signal::Hide);

        let poi = Vec3::new(0.0, 0.0, 4.0); // ahead, in the cone
        let inputs = TickInputs {
            pose: Pose::at(Vec3::ZERO),
            target: Some(Vec3::new(0.0, 0.0, 5.0)), // ignored while hiding
            poi: Some(poi),
        };

        // The check only fires once the interval elapses
        for _ in 0..config.poi_check_interval {
            agent.step(&inputs, &OpenField).unwrap();
            assert_ne!(agent.state(), AgentState::Pursuing);
        }
        agent.step(&inputs, &OpenField).unwrap();

        assert_eq!(agent.state(), AgentState::Pursuing);
        assert_eq!(agent.decision().last_known_target(), Some(poi));

        bus.publish(Signal::UnHide);
        agent.step(&inputs, &OpenField).unwrap();
        assert!(!agent.decision().is_hiding());
    }

    #[test]
    fn test_deactivation_suppresses_pipeline() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);

        agent.set_active(false);
        assert_eq!(agent.state(), AgentState::Disabled);

        let inputs = TickInputs {
            pose: Pose::at(Vec3::ZERO),
            target: Some(Vec3::new(0.0, 0.0, 2.0)),
            poi: None,
        };
        assert!(agent.step(&inputs, &OpenField).is_none());

        // Signals sent while disabled are dropped on reactivation
        bus.publish(Signal::Alert {
            target: Some(Vec3::new(9.0, 0.0, 0.0)),
        });
        agent.set_active(true);
        agent.step(&quiet_inputs(Vec3::ZERO), &OpenField).unwrap();
        assert_eq!(agent.state(), AgentState::Patrolling);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);

        let inputs = TickInputs {
            pose: Pose::at(Vec3::ZERO),
            target: Some(Vec3::new(0.0, 0.0, 8.0)),
            poi: None,
        };
        agent.step(&inputs, &OpenField).unwrap();
        assert!(agent.path().is_some() || agent.destination().is_some());

        agent.reset();

        assert_eq!(agent.state(), AgentState::Patrolling);
        assert!(agent.path().is_none());
        assert!(agent.destination().is_none());
        assert_eq!(agent.decision().alert_timer(), 0);
    }

    #[test]
    fn test_drive_forwards_to_integrator() {
        let bus = Arc::new(EventBus::new());
        let mut agent = agent(&bus);
        let mut integrator = RecordingIntegrator::default();

        assert!(agent.drive(&quiet_inputs(Vec3::ZERO), &OpenField, &mut integrator));
        assert_eq!(integrator.calls, 1);
        assert!(integrator.velocity.x > 0.0);

        agent.set_active(false);
        assert!(!agent.drive(&quiet_inputs(Vec3::ZERO), &OpenField, &mut integrator));
        assert_eq!(integrator.calls, 1);
    }
}
