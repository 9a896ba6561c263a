//! Field-of-view and line-of-sight perception

use serde::{Deserialize, Serialize};
use warden_math::{radians, Quat, Vec3};

/// Raycast oracle answering whether level geometry blocks a sight line.
///
/// Implemented by the external physics layer; the core only consumes the
/// boolean.
pub trait OcclusionOracle {
    /// Whether geometry blocks the segment from `from` toward `to`,
    /// checked out to `max_distance`
    fn is_blocked(&self, from: Vec3, to: Vec3, max_distance: f32) -> bool;
}

/// Observer pose for a visibility test
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Pose {
    /// World position
    pub position: Vec3,
    /// Heading
    pub rotation: Quat,
}

impl Pose {
    /// Create a pose from a position and heading
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Create a pose at a position with the default heading (+Z)
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Forward direction of the observer
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation.forward()
    }
}

/// How a sighting was made
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sighting {
    /// Inside the vision cone, within range, line of sight clear
    DirectSight,
    /// Close enough that facing and occlusion are irrelevant
    ProximityOverride,
}

/// Per-tick outcome of a visibility test; never persisted across ticks
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionResult {
    /// Whether the target is visible this tick
    pub visible: bool,
    /// Where the target was seen
    pub position: Option<Vec3>,
    /// Which rule granted visibility
    pub source: Option<Sighting>,
}

impl PerceptionResult {
    /// Target not visible
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Target visible at a position through a given rule
    pub fn seen(position: Vec3, source: Sighting) -> Self {
        Self {
            visible: true,
            position: Some(position),
            source: Some(source),
        }
    }
}

/// Evaluate visibility of `target` from `pose`.
///
/// Rules in order, first match wins:
/// 1. bearing within half the view angle, distance within `view_radius`,
///    and the occlusion oracle reports the line clear - direct sight;
/// 2. distance within `proximity` - visible regardless of facing and
///    occlusion (the target bumped into the agent);
/// 3. otherwise hidden.
///
/// An absent target is simply not visible; the caller retries next tick.
pub fn evaluate(
    pose: &Pose,
    target: Option<Vec3>,
    view_radius: f32,
    view_angle_degrees: f32,
    proximity: f32,
    oracle: &dyn OcclusionOracle,
) -> PerceptionResult {
    let Some(target) = target else {
        return PerceptionResult::hidden();
    };

    let to_target = target - pose.position;
    let distance = to_target.length();

    let in_cone = pose.forward().angle_between(to_target) < radians(view_angle_degrees) / 2.0;
    if in_cone
        && distance <= view_radius
        && !oracle.is_blocked(pose.position, target, distance)
    {
        return PerceptionResult::seen(target, Sighting::DirectSight);
    }

    if distance <= proximity {
        return PerceptionResult::seen(target, Sighting::ProximityOverride);
    }

    PerceptionResult::hidden()
}
