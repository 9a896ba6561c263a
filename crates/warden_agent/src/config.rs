//! Agent tuning parameters

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Tuning for perception, pursuit and steering.
///
/// The defaults are the reference tuning for a standard maze level; levels
/// override individual fields through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Sight range in world units
    pub view_radius: f32,
    /// Full width of the vision cone in degrees
    pub view_angle: f32,
    /// Close-contact range granting visibility of the target regardless
    /// of facing or occlusion
    pub target_proximity: f32,
    /// Close-contact range for the point of interest
    pub poi_proximity: f32,
    /// Top movement speed in units per second
    pub max_speed: f32,
    /// Maximum turn per tick in degrees
    pub turn_rate: f32,
    /// Distance to the floating target below which steering damps to a stop
    pub stopping_distance: f32,
    /// Distance to the destination at which the agent abandons its path
    /// and steers straight in. Must not be less than 1.
    pub leave_path_distance: f32,
    /// Minimum straight-line distance to a destination before the planner
    /// is consulted; anything closer is steered to directly
    pub min_path_distance: f32,
    /// Ticks of pursuit urgency granted by an alert or sighting
    pub alert_ticks: u32,
    /// Ticks between point-of-interest checks while the target is concealed
    pub poi_check_interval: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            view_radius: 10.0,
            view_angle: 90.0,
            target_proximity: 2.0,
            poi_proximity: 1.0,
            max_speed: 5.0,
            turn_rate: 10.0,
            stopping_distance: 1.5,
            leave_path_distance: 2.0,
            min_path_distance: 6.0,
            alert_ticks: 180,
            poi_check_interval: 30,
        }
    }
}

impl AgentConfig {
    /// Validate the tuning, rejecting values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_speed <= 0.0 {
            return Err(AgentError::InvalidConfig("max_speed must be positive".into()));
        }
        if self.turn_rate <= 0.0 {
            return Err(AgentError::InvalidConfig("turn_rate must be positive".into()));
        }
        if self.view_radius <= 0.0 {
            return Err(AgentError::InvalidConfig("view_radius must be positive".into()));
        }
        if !(0.0..=360.0).contains(&self.view_angle) {
            return Err(AgentError::InvalidConfig(
                "view_angle must be within 0..=360 degrees".into(),
            ));
        }
        if self.leave_path_distance < 1.0 {
            return Err(AgentError::InvalidConfig(
                "leave_path_distance must not be less than 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_speed() {
        let config = AgentConfig {
            max_speed: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_short_leave_path() {
        let config = AgentConfig {
            leave_path_distance: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
