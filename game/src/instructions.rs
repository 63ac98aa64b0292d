use serde::{Deserialize, Serialize};

/// The program-building moves a level can grant the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    Action,
    Condition,
    Jump,
    Loop,
    Move,
    TurnLeft,
    TurnRight,
}

impl Instruction {
    pub const ALL: [Instruction; 7] = [
        Instruction::Action,
        Instruction::Condition,
        Instruction::Jump,
        Instruction::Loop,
        Instruction::Move,
        Instruction::TurnLeft,
        Instruction::TurnRight,
    ];

    /// Condition and Loop place dedicated pieces; everything else lives as a
    /// button on a host piece.
    pub fn is_hostable(self) -> bool {
        !matches!(self, Instruction::Condition | Instruction::Loop)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-kind counts of how many instructions the player may still place.
///
/// A unit is consumed when a placement succeeds and refunded when that
/// placement is undone, never earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionBudget {
    counts: [u32; 7],
}

impl InstructionBudget {
    pub fn uniform(count: u32) -> Self {
        Self { counts: [count; 7] }
    }

    pub fn empty() -> Self {
        Self::uniform(0)
    }

    pub fn with(mut self, kind: Instruction, count: u32) -> Self {
        self.counts[kind.index()] = count;
        self
    }

    pub fn remaining(&self, kind: Instruction) -> u32 {
        self.counts[kind.index()]
    }

    pub fn consume(&mut self, kind: Instruction) -> bool {
        let slot = &mut self.counts[kind.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn refund(&mut self, kind: Instruction) {
        self.counts[kind.index()] += 1;
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}
