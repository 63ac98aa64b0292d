//! Traits the host environment implements for the game layer.
//!
//! The game layer never talks to a scene graph, a physics step, or a player
//! directly. It consumes these seams and the host wires in real
//! implementations; tests wire in the recording fakes below.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// A polyline an agent travels along, in world coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionPath {
    pub points: Vec<Vec3>,
}

impl MotionPath {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn start(&self) -> Option<Vec3> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Vec3> {
        self.points.last().copied()
    }
}

/// Answers the yes/no question a branching piece asks about the world.
pub trait ConditionSource {
    fn evaluate(&self) -> bool;
}

/// A condition with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedCondition(pub bool);

impl ConditionSource for FixedCondition {
    fn evaluate(&self) -> bool {
        self.0
    }
}

/// Moves an agent along paths. Completion is reported back by the caller,
/// not polled: when the agent arrives the host invokes the game layer's
/// arrival handler.
pub trait MotionDriver {
    fn animate_along(&mut self, path: &MotionPath);
    fn cancel(&mut self);
}

/// A motion driver that just records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingMotion {
    pub paths: Vec<MotionPath>,
    pub cancels: usize,
}

impl MotionDriver for RecordingMotion {
    fn animate_along(&mut self, path: &MotionPath) {
        self.paths.push(path.clone());
    }

    fn cancel(&mut self) {
        self.cancels += 1;
    }
}

/// World-space position lookup for host-owned entities.
pub trait PoseProvider<Id> {
    fn position(&self, id: Id) -> Option<Vec3>;
}
