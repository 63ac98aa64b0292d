//! Session facade: the level's button row, wired to the placement and
//! traversal engines.

use engine::math::Vec3;
use engine::world::{ConditionSource, MotionDriver};

use crate::catalog::Catalog;
use crate::instructions::{Instruction, InstructionBudget};
use crate::placement::{PlacementEngine, PlacementError};
use crate::traversal::{Traversal, TraversalState};

/// The buttons a level can show the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelButton {
    Action,
    Condition,
    Jump,
    Loop,
    Move,
    TurnLeft,
    TurnRight,
    Undo,
    Restart,
}

impl LevelButton {
    pub fn instruction(self) -> Option<Instruction> {
        match self {
            LevelButton::Action => Some(Instruction::Action),
            LevelButton::Condition => Some(Instruction::Condition),
            LevelButton::Jump => Some(Instruction::Jump),
            LevelButton::Loop => Some(Instruction::Loop),
            LevelButton::Move => Some(Instruction::Move),
            LevelButton::TurnLeft => Some(Instruction::TurnLeft),
            LevelButton::TurnRight => Some(Instruction::TurnRight),
            LevelButton::Undo | LevelButton::Restart => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Editing is locked while the agent is running.
    RunActive,
    /// The component under the cursor has no entry/terminal pair to run.
    InvalidRoad,
    Placement(PlacementError),
}

impl From<PlacementError> for SessionError {
    fn from(e: PlacementError) -> Self {
        SessionError::Placement(e)
    }
}

pub struct RoadSession {
    placement: PlacementEngine,
    traversal: Traversal,
    budget: InstructionBudget,
    running: bool,
}

impl RoadSession {
    pub fn new(
        catalog: Catalog,
        start_marker: Vec3,
        budget: InstructionBudget,
    ) -> Result<Self, PlacementError> {
        Ok(Self {
            placement: PlacementEngine::new(catalog, start_marker)?,
            traversal: Traversal::new(),
            budget,
            running: false,
        })
    }

    pub fn placement(&self) -> &PlacementEngine {
        &self.placement
    }

    pub fn placement_mut(&mut self) -> &mut PlacementEngine {
        &mut self.placement
    }

    pub fn budget(&self) -> &InstructionBudget {
        &self.budget
    }

    pub fn traversal_state(&self) -> TraversalState {
        self.traversal.state()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Routes a button press. Everything except Restart is refused while a
    /// run is active.
    pub fn press(&mut self, button: LevelButton) -> Result<(), SessionError> {
        if self.running && button != LevelButton::Restart {
            return Err(SessionError::RunActive);
        }
        match button.instruction() {
            Some(kind) => self
                .placement
                .place_instruction_button(kind, &mut self.budget)?,
            None => match button {
                LevelButton::Undo => self.placement.undo(&mut self.budget)?,
                LevelButton::Restart => {
                    // the host cancels any in-flight motion when it reloads
                    self.traversal = Traversal::new();
                    self.running = false;
                    self.placement.reset();
                }
                _ => {}
            },
        }
        Ok(())
    }

    /// Starts the agent on the program under the cursor.
    pub fn play(
        &mut self,
        condition: &dyn ConditionSource,
        motion: &mut dyn MotionDriver,
    ) -> Result<TraversalState, SessionError> {
        if self.running {
            return Err(SessionError::RunActive);
        }
        let (entry, terminal) = self
            .placement
            .collect_program()
            .ok_or(SessionError::InvalidRoad)?;
        self.running = true;
        let state = self
            .traversal
            .start(self.placement.graph_mut(), condition, motion, entry, terminal);
        if !matches!(state, TraversalState::Advancing) {
            self.running = false;
        }
        Ok(state)
    }

    /// Forwarded from the host when the motion driver finishes a hop.
    pub fn arrived(
        &mut self,
        condition: &dyn ConditionSource,
        motion: &mut dyn MotionDriver,
    ) -> TraversalState {
        let state = self
            .traversal
            .on_arrived(self.placement.graph_mut(), condition, motion);
        if !matches!(state, TraversalState::Advancing) {
            self.running = false;
        }
        state
    }

    pub fn stop_run(&mut self, motion: &mut dyn MotionDriver) {
        self.traversal.stop(motion);
        self.running = false;
    }

    /// JSON rendering of the live graph, for level dashboards and logs.
    pub fn graph_json(&self) -> serde_json::Value {
        serde_json::to_value(self.placement.graph().snapshot())
            .unwrap_or(serde_json::Value::Null)
    }
}
