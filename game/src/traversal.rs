//! The agent that executes the assembled road program.
//!
//! One hop at a time: resolve the path from the current input port, hand it
//! to the motion driver, and wait for the host to report arrival via
//! `on_arrived`. The run ends at the terminal port, at an unlinked output
//! (dead end), or at a port no path starts from.

use engine::world::{ConditionSource, MotionDriver};

use crate::road_graph::{NoPath, PortId, RoadGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalFailure {
    /// The agent exited a piece whose output is linked to nothing.
    DeadEnd,
    /// The entered port begins no path on its piece.
    Unresolvable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    Advancing,
    Finished,
    Failed(TraversalFailure),
}

#[derive(Debug)]
pub struct Traversal {
    state: TraversalState,
    terminal: Option<PortId>,
    next_output: Option<PortId>,
}

impl Default for Traversal {
    fn default() -> Self {
        Self::new()
    }
}

impl Traversal {
    pub fn new() -> Self {
        Self {
            state: TraversalState::Idle,
            terminal: None,
            next_output: None,
        }
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Begins a run at `entry`, finishing when the agent reaches `terminal`.
    pub fn start(
        &mut self,
        graph: &mut RoadGraph,
        condition: &dyn ConditionSource,
        motion: &mut dyn MotionDriver,
        entry: PortId,
        terminal: PortId,
    ) -> TraversalState {
        self.terminal = Some(terminal);
        self.next_output = None;
        self.advance(graph, condition, motion, entry)
    }

    /// The host calls this when the motion driver finishes a path.
    pub fn on_arrived(
        &mut self,
        graph: &mut RoadGraph,
        condition: &dyn ConditionSource,
        motion: &mut dyn MotionDriver,
    ) -> TraversalState {
        if self.state != TraversalState::Advancing {
            return self.state;
        }
        let Some(output) = self.next_output else {
            self.state = TraversalState::Failed(TraversalFailure::Unresolvable);
            return self.state;
        };
        if Some(output) == self.terminal {
            self.state = TraversalState::Finished;
            return self.state;
        }
        match graph.port(output).link() {
            Some(next_input) => self.advance(graph, condition, motion, next_input),
            None => {
                self.state = TraversalState::Failed(TraversalFailure::DeadEnd);
                self.state
            }
        }
    }

    /// Cancels an in-flight run. Safe to call in any state, any number of
    /// times.
    pub fn stop(&mut self, motion: &mut dyn MotionDriver) {
        if self.state == TraversalState::Advancing {
            motion.cancel();
        }
        self.state = TraversalState::Idle;
        self.terminal = None;
        self.next_output = None;
    }

    fn advance(
        &mut self,
        graph: &mut RoadGraph,
        condition: &dyn ConditionSource,
        motion: &mut dyn MotionDriver,
        input: PortId,
    ) -> TraversalState {
        match graph.resolve_path(input, condition) {
            Ok((path, exit)) => {
                motion.animate_along(&path);
                self.next_output = Some(exit);
                self.state = TraversalState::Advancing;
            }
            Err(NoPath) => {
                self.state = TraversalState::Failed(TraversalFailure::Unresolvable);
            }
        }
        self.state
    }
}
