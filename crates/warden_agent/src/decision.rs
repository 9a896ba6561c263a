//! Behavior selection state machine
//!
//! One decision pass per tick: gameplay signals and the tick's perception
//! result update the behavior state and the alert window, then
//! [`DecisionEngine::decide`] emits the single destination directive the
//! rest of the pipeline commits to.

use serde::{Deserialize, Serialize};
use warden_math::Vec3;

use crate::config::AgentConfig;
use crate::perception::PerceptionResult;

/// Behavior mode, exactly one active at a time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Walking the two-point patrol route
    Patrolling,
    /// Target in sight, closing on it
    Pursuing,
    /// Sight lost but the alert window is still open; heading for the
    /// last known position
    SearchingLastKnownArea,
    /// Externally deactivated; the whole pipeline is suppressed
    Disabled,
}

/// Destination directive for the current tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Directive {
    /// Keep following the active path
    FollowPath,
    /// Drop the path and steer straight at its destination
    LeavePath {
        /// The path's final destination
        destination: Vec3,
    },
    /// Commit to a destination (pursuit target or patrol point)
    Commit {
        /// The committed world point
        destination: Vec3,
    },
}

/// Chooses the agent's behavior and destination each tick
#[derive(Debug)]
pub struct DecisionEngine {
    state: AgentState,
    /// Ticks of pursuit urgency remaining
    alert_timer: u32,
    /// Whether the primary target is treated as concealed
    hiding: bool,
    /// Countdown to the next point-of-interest check while hiding
    poi_timer: u32,
    /// Which of the two patrol points is current
    first_patrol_point: bool,
    /// Last position the target was known to occupy
    last_known_target: Option<Vec3>,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self {
            state: AgentState::Patrolling,
            alert_timer: 0,
            hiding: false,
            poi_timer: 0,
            first_patrol_point: true,
            last_known_target: None,
        }
    }
}

impl DecisionEngine {
    /// Create an engine in the patrol state
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore startup defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current behavior state
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Remaining pursuit window in ticks
    pub fn alert_timer(&self) -> u32 {
        self.alert_timer
    }

    /// Whether the primary target is treated as concealed
    pub fn is_hiding(&self) -> bool {
        self.hiding
    }

    /// Whether the current patrol leg heads for the first point
    pub fn patrol_alternator(&self) -> bool {
        self.first_patrol_point
    }

    /// Last known target position, if any
    pub fn last_known_target(&self) -> Option<Vec3> {
        self.last_known_target
    }

    /// Externally activate or deactivate the engine.
    ///
    /// Deactivation freezes everything in place; timers and the last known
    /// position survive until reactivation.
    pub fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.transition(AgentState::Disabled);
        } else if self.state == AgentState::Disabled {
            self.transition(AgentState::Patrolling);
        }
    }

    /// An alert broadcast arrived, optionally carrying the target position
    pub fn hear_alert(&mut self, target: Option<Vec3>, config: &AgentConfig) {
        if self.state == AgentState::Disabled {
            return;
        }
        self.alert_timer = config.alert_ticks;
        if target.is_some() {
            self.last_known_target = target;
        }
    }

    /// The target went into concealment; pursuit is called off and the
    /// point-of-interest check is armed
    pub fn hear_hide(&mut self, config: &AgentConfig) {
        if self.state == AgentState::Disabled {
            return;
        }
        self.hiding = true;
        self.poi_timer = config.poi_check_interval;
        self.alert_timer = 0;
    }

    /// The target came out of concealment
    pub fn hear_unhide(&mut self) {
        if self.state == AgentState::Disabled {
            return;
        }
        self.hiding = false;
    }

    /// The target was explicitly lost; resume patrol
    pub fn hear_target_lost(&mut self) {
        if self.state == AgentState::Disabled {
            return;
        }
        self.alert_timer = 0;
    }

    /// Whether the point-of-interest check is due this tick.
    ///
    /// The countdown re-arms on expiry so the occlusion query fires once
    /// per interval, not every tick.
    pub fn poi_check_due(&mut self, interval: u32) -> bool {
        if self.poi_timer == 0 {
            self.poi_timer = interval;
            true
        } else {
            self.poi_timer -= 1;
            false
        }
    }

    /// Fold this tick's perception result into the behavior state
    pub fn observe(&mut self, result: &PerceptionResult, config: &AgentConfig) {
        if self.state == AgentState::Disabled {
            return;
        }
        if result.visible {
            self.alert_timer = config.alert_ticks;
            if result.position.is_some() {
                self.last_known_target = result.position;
            }
            self.transition(AgentState::Pursuing);
        } else if self.alert_timer > 0 {
            self.transition(AgentState::SearchingLastKnownArea);
        } else {
            self.transition(AgentState::Patrolling);
        }
    }

    /// Emit the destination directive for this tick.
    ///
    /// With an active path: leave it once the destination is close enough
    /// (flipping the patrol alternator), otherwise keep following it.
    /// Without one: head for the last known target while the alert window
    /// is open, else for the current patrol point.
    pub fn decide(
        &mut self,
        position: Vec3,
        active_path: bool,
        destination: Option<Vec3>,
        patrol_points: [Vec3; 2],
        config: &AgentConfig,
    ) -> Directive {
        if active_path {
            if let Some(dest) = destination {
                if position.distance(dest) < config.leave_path_distance {
                    self.first_patrol_point = !self.first_patrol_point;
                    return Directive::LeavePath { destination: dest };
                }
            }
            return Directive::FollowPath;
        }

        if self.alert_timer > 0 {
            if let Some(target) = self.last_known_target {
                return Directive::Commit {
                    destination: target,
                };
            }
        }

        let point = if self.first_patrol_point {
            patrol_points[0]
        } else {
            patrol_points[1]
        };
        Directive::Commit { destination: point }
    }

    /// Advance the alert window by one tick
    pub fn tick(&mut self) {
        if self.state == AgentState::Disabled {
            return;
        }
        if self.alert_timer > 0 {
            self.alert_timer -= 1;
        }
    }

    fn transition(&mut self, to: AgentState) {
        if self.state != to {
            log::debug!("agent state {:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }
}
