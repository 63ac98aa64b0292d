//! Building the road: chain insertion, gap backfill, and transactional undo.
//!
//! Every player-visible mutation goes through here. Each successful action
//! pushes one `UndoRecord` capturing the pieces it created, the prior state
//! of every link it rewrote, and the prior cursor, so `undo` can roll the
//! whole action back in one step.

use std::collections::{HashMap, HashSet};

use engine::math::Vec3;

use crate::catalog::{Catalog, PieceTemplate, TemplateMatch};
use crate::instructions::{Instruction, InstructionBudget};
use crate::road_graph::{ButtonId, Direction, PieceId, PieceKind, PortId, PortRole, RoadGraph};
use crate::templates::{NODE_IF_IN, NODE_IF_OUT, NODE_LOOP_IN, NODE_LOOP_OUT, NODE_VERTICAL_BUTTON, ROAD_START};

/// Two ports further apart than this cannot pair up during matching.
pub const ERROR_MARGIN: f32 = 0.3;
/// A link stretched beyond this distance counts as a gap.
pub const MAX_ACCEPTABLE_DISTANCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    /// The cursor sits on the anchor; nothing can be placed behind the start.
    InvalidCursor,
    /// No catalog template fits the requested spot.
    NoMatchingPiece,
    /// A matching query was handed ports from different pieces or directions.
    InvalidTargetSet,
    /// Branch or loop pieces cannot go inside an open condition.
    InsideCondition,
    /// The budget has no unit left for this instruction kind.
    OutOfInstructions,
    /// Undo with nothing to undo.
    EmptyStack,
}

/// What a successful `place_chain` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedChain {
    pub pieces: Vec<PieceId>,
    /// Connectors spawned to backfill gaps opened by the insertion.
    pub filler_pieces: Vec<PieceId>,
    pub cursor: Option<PortId>,
    /// Gaps the catalog had no connector for. The chain itself stands.
    pub unfilled_gaps: usize,
}

#[derive(Debug, Clone)]
struct UndoRecord {
    added_pieces: Vec<PieceId>,
    /// Prior link of every port this action rewired, first write wins.
    relinked_ports: Vec<(PortId, Option<PortId>)>,
    /// A button added to a host that already existed before this action.
    added_control: Option<(PieceId, ButtonId)>,
    previous_cursor: Option<PortId>,
}

impl UndoRecord {
    fn new(previous_cursor: Option<PortId>) -> Self {
        Self {
            added_pieces: Vec::new(),
            relinked_ports: Vec::new(),
            added_control: None,
            previous_cursor,
        }
    }

    fn remember_link(&mut self, graph: &RoadGraph, port: PortId) {
        if self.relinked_ports.iter().any(|&(p, _)| p == port) {
            return;
        }
        self.relinked_ports.push((port, graph.port(port).link()));
    }

    /// Record both endpoints of the link about to be made, plus whatever
    /// either endpoint was linked to before.
    fn remember_relink(&mut self, graph: &RoadGraph, a: PortId, b: PortId) {
        for port in [a, b] {
            self.remember_link(graph, port);
            if let Some(old) = graph.port(port).link() {
                self.remember_link(graph, old);
            }
        }
    }
}

pub struct PlacementEngine {
    graph: RoadGraph,
    catalog: Catalog,
    start_marker: Vec3,
    anchor: PortId,
    cursor: Option<PortId>,
    /// Where the selection marker last was; nearest-selectable searches
    /// measure against this point.
    marker_position: Vec3,
    undo_stack: Vec<UndoRecord>,
}

impl PlacementEngine {
    /// Seeds the world with the start piece, anchored at `start_marker`.
    pub fn new(catalog: Catalog, start_marker: Vec3) -> Result<Self, PlacementError> {
        let mut graph = RoadGraph::new();
        let template = catalog.by_id(ROAD_START).ok_or(PlacementError::NoMatchingPiece)?;
        let start = graph.instantiate(template, Vec3::ZERO);
        let anchor = graph
            .ports_by_direction(start, Direction::Back)
            .first()
            .copied()
            .ok_or(PlacementError::NoMatchingPiece)?;
        graph.move_piece_so_port_at(anchor, start_marker);
        let cursor = graph.ports_by_direction(start, Direction::Forward).first().copied();
        let marker_position = match cursor {
            Some(c) => graph.position(c),
            None => start_marker,
        };
        Ok(Self {
            graph,
            catalog,
            start_marker,
            anchor,
            cursor,
            marker_position,
            undo_stack: Vec::new(),
        })
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut RoadGraph {
        &mut self.graph
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cursor(&self) -> Option<PortId> {
        self.cursor
    }

    pub fn anchor(&self) -> PortId {
        self.anchor
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Moves the cursor, e.g. when the player clicks a port.
    pub fn select(&mut self, port: PortId) {
        self.set_cursor(Some(port));
    }

    fn set_cursor(&mut self, port: Option<PortId>) {
        self.cursor = port;
        if let Some(p) = port {
            self.marker_position = self.graph.position(p);
        }
    }

    /// Instantiates `ids` as a connected chain at the cursor, splices it
    /// into the cursor's link, backfills any gaps the insertion opened, and
    /// advances the cursor. All-or-nothing: a chain that cannot complete
    /// leaves the graph untouched.
    pub fn place_chain(
        &mut self,
        ids: &[&str],
        direction: Direction,
    ) -> Result<PlacedChain, PlacementError> {
        let cursor = self.cursor;
        if cursor == Some(self.anchor) {
            return Err(PlacementError::InvalidCursor);
        }
        let position = match cursor {
            Some(c) => self.graph.position(c),
            None => self.start_marker,
        };

        let mut record = UndoRecord::new(cursor);
        let chain = self.generate_chain(ids, direction, position)?;

        if let Some(cur) = cursor {
            let entry = self.chain_entry(&chain, direction);
            let far = self.graph.port(cur).link();
            record.remember_relink(&self.graph, cur, entry);
            self.graph.connect(cur, entry);
            if let Some(far) = far {
                if let Some(exit) = self.chain_exit(&chain, direction) {
                    record.remember_relink(&self.graph, far, exit);
                    self.graph.connect(far, exit);
                }
            }
        }

        let last = *chain.last().ok_or(PlacementError::NoMatchingPiece)?;
        let (filler_pieces, unfilled_gaps) =
            self.close_gaps(last, direction, chain.len(), &mut record);

        let terminal = self
            .graph
            .ports_by_direction(last, direction)
            .into_iter()
            .find(|&p| {
                let port = self.graph.port(p);
                port.link().is_none() && port.selectable()
            });
        match terminal {
            Some(t) => self.set_cursor(Some(t)),
            None => {
                let from = self.chain_exit(&chain, direction).or(cursor);
                let next = from.and_then(|f| self.nearest_selectable(f)).or(cursor);
                self.set_cursor(next);
            }
        }

        record.added_pieces.extend(chain.iter().copied());
        record.added_pieces.extend(filler_pieces.iter().copied());
        self.undo_stack.push(record);

        Ok(PlacedChain {
            pieces: chain,
            filler_pieces,
            cursor: self.cursor,
            unfilled_gaps,
        })
    }

    /// Places an If block (entry + merge pieces). Rejected inside an open
    /// condition and when the budget is exhausted; the budget unit is
    /// consumed only once the placement stands.
    pub fn place_condition(
        &mut self,
        budget: &mut InstructionBudget,
    ) -> Result<PlacedChain, PlacementError> {
        if budget.remaining(Instruction::Condition) == 0 {
            return Err(PlacementError::OutOfInstructions);
        }
        if self.inside_open_condition() {
            return Err(PlacementError::InsideCondition);
        }
        let placed = self.place_chain(&[NODE_IF_IN, NODE_IF_OUT], Direction::Forward)?;
        budget.consume(Instruction::Condition);
        Ok(placed)
    }

    /// Places a Loop block. Same nesting rule as conditions.
    pub fn place_loop(
        &mut self,
        budget: &mut InstructionBudget,
    ) -> Result<PlacedChain, PlacementError> {
        if budget.remaining(Instruction::Loop) == 0 {
            return Err(PlacementError::OutOfInstructions);
        }
        if self.inside_open_condition() {
            return Err(PlacementError::InsideCondition);
        }
        let placed = self.place_chain(&[NODE_LOOP_IN, NODE_LOOP_OUT], Direction::Forward)?;
        budget.consume(Instruction::Loop);
        Ok(placed)
    }

    /// Places one instruction. Condition/Loop route to their block
    /// placements; every other kind becomes a button on the host piece at
    /// the cursor (or at the cursor's counterpart), spawning a fresh host
    /// when no reusable one is there.
    pub fn place_instruction_button(
        &mut self,
        kind: Instruction,
        budget: &mut InstructionBudget,
    ) -> Result<(), PlacementError> {
        match kind {
            Instruction::Condition => return self.place_condition(budget).map(|_| ()),
            Instruction::Loop => return self.place_loop(budget).map(|_| ()),
            _ => {}
        }
        if budget.remaining(kind) == 0 {
            return Err(PlacementError::OutOfInstructions);
        }

        if let Some(cursor) = self.cursor {
            let mut candidates = vec![(self.graph.port(cursor).piece(), cursor)];
            if let Some(linked) = self.graph.port(cursor).link() {
                candidates.push((self.graph.port(linked).piece(), linked));
            }
            for (host, near) in candidates {
                if !matches!(self.graph.piece(host).kind(), PieceKind::ButtonHost { .. }) {
                    continue;
                }
                if let Ok(button) = self.graph.add_button(host, kind, near) {
                    let mut record = UndoRecord::new(Some(cursor));
                    record.added_control = Some((host, button));
                    self.undo_stack.push(record);
                    budget.consume(kind);
                    return Ok(());
                }
            }
        }

        let placed = self.place_chain(&[NODE_VERTICAL_BUTTON], Direction::Forward)?;
        let host = placed.pieces[0];
        let near = self
            .graph
            .ports_by_direction(host, Direction::Back)
            .first()
            .copied()
            .ok_or(PlacementError::NoMatchingPiece)?;
        if self.graph.add_button(host, kind, near).is_err() {
            let _ = self.undo(budget);
            return Err(PlacementError::NoMatchingPiece);
        }
        budget.consume(kind);
        Ok(())
    }

    /// Rolls back the most recent action: removes its pieces and buttons,
    /// restores every rewired link on both endpoints, refunds the budget,
    /// puts the cursor back, and re-pins the layout to the anchor.
    pub fn undo(&mut self, budget: &mut InstructionBudget) -> Result<(), PlacementError> {
        let record = self.undo_stack.pop().ok_or(PlacementError::EmptyStack)?;

        if let Some((host, button)) = record.added_control {
            if let Ok(kind) = self.graph.remove_button(host, button) {
                budget.refund(kind);
            }
        }

        for &piece in &record.added_pieces {
            if self.graph.try_piece(piece).is_none() {
                continue;
            }
            self.refund_piece(piece, budget);
            self.graph.remove_piece(piece);
        }

        for &(port, previous) in &record.relinked_ports {
            if self.graph.try_port(port).is_none() {
                continue;
            }
            self.graph.restore_link(port, previous);
        }

        match record.previous_cursor {
            Some(cursor) if self.graph.try_port(cursor).is_some() => self.set_cursor(Some(cursor)),
            _ => {
                let fallback = self.nearest_selectable(self.anchor);
                self.set_cursor(fallback);
            }
        }

        self.correct_positions();
        Ok(())
    }

    /// Tears down everything ever placed and reseats the cursor on the
    /// start piece. Budget is not refunded; levels reload it wholesale.
    pub fn reset(&mut self) {
        while let Some(record) = self.undo_stack.pop() {
            for piece in record.added_pieces {
                self.graph.remove_piece(piece);
            }
        }
        let start = self.graph.port(self.anchor).piece();
        self.graph.move_piece_so_port_at(self.anchor, self.start_marker);
        let cursor = self
            .graph
            .ports_by_direction(start, Direction::Forward)
            .first()
            .copied();
        self.set_cursor(cursor);
    }

    /// The endpoints of the program under the cursor: the component's
    /// unlinked input and unlinked output.
    pub fn collect_program(&self) -> Option<(PortId, PortId)> {
        let cursor = self.cursor?;
        let mut processed: HashSet<PieceId> = HashSet::new();
        let mut stack = vec![self.graph.port(cursor).piece()];
        let mut entry = None;
        let mut terminal = None;
        while let Some(piece) = stack.pop() {
            if !processed.insert(piece) {
                continue;
            }
            for &port in self.graph.piece(piece).ports() {
                let info = self.graph.port(port);
                match info.link() {
                    Some(linked) => stack.push(self.graph.port(linked).piece()),
                    None => match info.role() {
                        PortRole::Input => entry = Some(port),
                        PortRole::Output => terminal = Some(port),
                    },
                }
            }
        }
        Some((entry?, terminal?))
    }

    /// Walks the component containing `from` and returns the selectable
    /// port closest to the marker, preferring the output counterpart when
    /// the closest port is a linked input.
    pub fn nearest_selectable(&self, from: PortId) -> Option<PortId> {
        let mut processed: HashSet<PieceId> = HashSet::new();
        let mut stack = vec![self.graph.port(from).piece()];
        let mut best: Option<(f32, PortId)> = None;
        while let Some(piece) = stack.pop() {
            if !processed.insert(piece) {
                continue;
            }
            for &port in self.graph.piece(piece).ports() {
                let info = self.graph.port(port);
                if info.selectable() {
                    let d = self.graph.position(port).distance(self.marker_position);
                    if best.is_none_or(|(bd, _)| d < bd) {
                        best = Some((d, port));
                    }
                }
                if let Some(linked) = info.link() {
                    stack.push(self.graph.port(linked).piece());
                }
            }
        }
        let (_, mut found) = best?;
        let port = self.graph.port(found);
        if port.role() == PortRole::Input {
            if let Some(linked) = port.link() {
                let other = self.graph.port(linked);
                if other.selectable() && other.role() == PortRole::Output {
                    found = linked;
                }
            }
        }
        Some(found)
    }

    fn chain_entry(&self, chain: &[PieceId], direction: Direction) -> PortId {
        self.graph.ports_by_direction(chain[0], direction.opposite())[0]
    }

    fn chain_exit(&self, chain: &[PieceId], direction: Direction) -> Option<PortId> {
        self.graph
            .ports_by_direction(*chain.last()?, direction)
            .first()
            .copied()
    }

    fn generate_chain(
        &mut self,
        ids: &[&str],
        direction: Direction,
        position: Vec3,
    ) -> Result<Vec<PieceId>, PlacementError> {
        let mut chain: Vec<PieceId> = Vec::with_capacity(ids.len());
        match self.try_generate_chain(ids, direction, position, &mut chain) {
            Ok(()) => Ok(chain),
            Err(e) => {
                for piece in chain {
                    self.graph.remove_piece(piece);
                }
                Err(e)
            }
        }
    }

    fn try_generate_chain(
        &mut self,
        ids: &[&str],
        direction: Direction,
        position: Vec3,
        chain: &mut Vec<PieceId>,
    ) -> Result<(), PlacementError> {
        let (first_id, rest) = ids.split_first().ok_or(PlacementError::NoMatchingPiece)?;
        let template = self
            .catalog
            .by_id(first_id)
            .ok_or(PlacementError::NoMatchingPiece)?;
        let first = self.graph.instantiate(template, Vec3::ZERO);
        chain.push(first);
        let entry = self
            .graph
            .ports_by_direction(first, direction.opposite())
            .first()
            .copied()
            .ok_or(PlacementError::NoMatchingPiece)?;
        self.graph.move_piece_so_port_at(entry, position);

        for id in rest {
            let prev = *chain.last().ok_or(PlacementError::NoMatchingPiece)?;
            let targets = self.graph.ports_by_direction(prev, direction);
            let template = self
                .catalog
                .by_id(id)
                .ok_or(PlacementError::NoMatchingPiece)?;
            let matched = self
                .catalog
                .find_matching(&[template], &self.graph, &targets, ERROR_MARGIN)
                .map_err(|_| PlacementError::InvalidTargetSet)?
                .ok_or(PlacementError::NoMatchingPiece)?;
            let piece = self.graph.instantiate(template, Vec3::ZERO);
            chain.push(piece);
            self.attach(piece, &matched, direction)?;
        }
        Ok(())
    }

    /// Wires a freshly instantiated piece to its matched targets and slides
    /// it so the paired ports coincide.
    fn attach(
        &mut self,
        piece: PieceId,
        matched: &TemplateMatch,
        direction: Direction,
    ) -> Result<(), PlacementError> {
        let ports = self.graph.piece(piece).ports().to_vec();
        for &(target, template_index) in &matched.mapping {
            let own = *ports
                .get(template_index)
                .ok_or(PlacementError::NoMatchingPiece)?;
            self.graph.connect(target, own);
        }
        if let Some(entry) = self
            .graph
            .ports_by_direction(piece, direction.opposite())
            .first()
            .copied()
        {
            if let Some(linked) = self.graph.port(entry).link() {
                let target = self.graph.position(linked);
                self.graph.move_piece_so_port_at(entry, target);
            }
        }
        Ok(())
    }

    /// Walks outward from the chain, numbering pieces by how the crossed
    /// link runs relative to the placement direction (+1 along, -1 against,
    /// 0 sideways). Pieces still ahead of the insertion (level > 0) are
    /// pushed along to stay flush; where the numbering returns to zero or
    /// below, a stretched link marks a gap to backfill with connectors.
    fn close_gaps(
        &mut self,
        chain_last: PieceId,
        direction: Direction,
        chain_len: usize,
        record: &mut UndoRecord,
    ) -> (Vec<PieceId>, usize) {
        let mut fillers = Vec::new();
        let mut unfilled = 0usize;
        let mut levels: HashMap<PieceId, i32> = HashMap::new();
        let mut moved: HashSet<PieceId> = HashSet::new();
        let mut seen_ports: HashSet<PortId> = HashSet::new();
        // a stretched link is inspected from several walk ports; count and
        // bridge it once
        let mut attempted: HashSet<PortId> = HashSet::new();

        levels.insert(chain_last, 0);
        moved.insert(chain_last);
        let mut stack: Vec<PortId> = self
            .graph
            .piece(chain_last)
            .ports()
            .iter()
            .copied()
            .filter(|&p| self.graph.port(p).link().is_some())
            .collect();
        seen_ports.extend(stack.iter().copied());

        while let Some(current) = stack.pop() {
            let Some(linked) = self.graph.port(current).link() else {
                continue;
            };
            let here = self.graph.port(current).piece();
            let level = levels.get(&here).copied().unwrap_or(0);
            let current_dir = self.graph.port(current).direction();
            let next_level = if current_dir == direction {
                level + 1
            } else if current_dir == direction.opposite() {
                level - 1
            } else {
                level
            };

            if next_level <= 0 {
                let mut stretched: Vec<(PortId, PortId)> = Vec::new();
                for port in self.graph.ports_by_direction(here, current_dir) {
                    if attempted.contains(&port) {
                        continue;
                    }
                    let Some(far) = self.graph.port(port).link() else {
                        continue;
                    };
                    let gap = self.graph.position(port).distance(self.graph.position(far));
                    if gap > MAX_ACCEPTABLE_DISTANCE {
                        stretched.push((port, far));
                    }
                }
                if !stretched.is_empty() {
                    attempted.extend(stretched.iter().map(|&(p, _)| p));
                    match self.fill_gap(&stretched, chain_len, record) {
                        Ok(new_pieces) => {
                            for &p in &new_pieces {
                                moved.insert(p);
                                levels.insert(p, next_level);
                            }
                            fillers.extend(new_pieces);
                        }
                        Err(_) => {
                            unfilled += 1;
                            eprintln!("no connector bridges the gap at piece {here:?}");
                        }
                    }
                }
                continue;
            }

            let next_piece = self.graph.port(linked).piece();
            levels.entry(next_piece).or_insert(next_level);
            if moved.insert(next_piece) {
                let target = self.graph.position(current);
                self.graph.move_piece_so_port_at(linked, target);
            }
            for port in self.graph.piece(next_piece).ports().to_vec() {
                if self.graph.port(port).link().is_some() && seen_ports.insert(port) {
                    stack.push(port);
                }
            }
        }

        (fillers, unfilled)
    }

    /// Bridges one gap: `stretched` pairs the near-side ports with their
    /// far-side counterparts. Spawns `chain_len` connectors of whichever
    /// connector template fits both sides and splices them in.
    fn fill_gap(
        &mut self,
        stretched: &[(PortId, PortId)],
        chain_len: usize,
        record: &mut UndoRecord,
    ) -> Result<Vec<PieceId>, PlacementError> {
        let near: Vec<PortId> = stretched.iter().map(|&(a, _)| a).collect();
        let far: Vec<PortId> = stretched.iter().map(|&(_, b)| b).collect();

        let connectors: Vec<&PieceTemplate> = self.catalog.connectors();
        let bridge = self
            .catalog
            .find_bridge(&connectors, &self.graph, &far, &near, ERROR_MARGIN)
            .map_err(|_| PlacementError::InvalidTargetSet)?
            .ok_or(PlacementError::NoMatchingPiece)?;

        let ids = vec![bridge.template_id; chain_len.max(1)];
        let far_direction = self.graph.port(far[0]).direction();
        let start_position = self.graph.position(far[0]);
        let fillers = self.generate_chain(&ids, far_direction, start_position)?;

        let first = *fillers.first().ok_or(PlacementError::NoMatchingPiece)?;
        let last = *fillers.last().ok_or(PlacementError::NoMatchingPiece)?;
        let first_ports = self.graph.piece(first).ports().to_vec();
        for &(target, index) in &bridge.side_a.mapping {
            let own = *first_ports
                .get(index)
                .ok_or(PlacementError::NoMatchingPiece)?;
            record.remember_relink(&self.graph, target, own);
            self.graph.connect(target, own);
        }
        let last_ports = self.graph.piece(last).ports().to_vec();
        for &(target, index) in &bridge.side_b.mapping {
            let own = *last_ports
                .get(index)
                .ok_or(PlacementError::NoMatchingPiece)?;
            record.remember_relink(&self.graph, target, own);
            self.graph.connect(target, own);
        }
        Ok(fillers)
    }

    /// Walks backward (against Forward flow) from the cursor; placing a
    /// branch or loop is illegal past an If entry whose merge has not been
    /// crossed yet.
    fn inside_open_condition(&self) -> bool {
        let Some(cursor) = self.cursor else {
            return false;
        };
        let mut stack: Vec<PortId> = self
            .graph
            .ports_by_direction(self.graph.port(cursor).piece(), Direction::Back);
        let mut seen: HashSet<PortId> = stack.iter().copied().collect();
        while let Some(port) = stack.pop() {
            let piece = self.graph.port(port).piece();
            match self.graph.piece(piece).kind() {
                PieceKind::IfIn => return true,
                PieceKind::IfOut => continue,
                _ => {}
            }
            if let Some(linked) = self.graph.port(port).link() {
                let next = self.graph.port(linked).piece();
                for p in self.graph.ports_by_direction(next, Direction::Back) {
                    if seen.insert(p) {
                        stack.push(p);
                    }
                }
            }
        }
        false
    }

    fn refund_piece(&self, piece: PieceId, budget: &mut InstructionBudget) {
        match self.graph.piece(piece).kind() {
            PieceKind::IfIn => budget.refund(Instruction::Condition),
            PieceKind::LoopIn { .. } => budget.refund(Instruction::Loop),
            PieceKind::ButtonHost { .. } => {
                for button in self.graph.buttons_of(piece) {
                    budget.refund(button.kind());
                }
            }
            _ => {}
        }
    }

    /// Re-pins the anchor piece to the start marker and pulls every piece
    /// whose incoming link ended up stretched back into contact.
    fn correct_positions(&mut self) {
        let anchor_piece = self.graph.port(self.anchor).piece();
        self.graph.move_piece_so_port_at(self.anchor, self.start_marker);

        let mut processed: HashSet<PieceId> = HashSet::new();
        processed.insert(anchor_piece);
        let mut stack: Vec<PortId> = self.graph.piece(anchor_piece).ports().to_vec();
        while let Some(port) = stack.pop() {
            let Some(linked) = self.graph.port(port).link() else {
                continue;
            };
            let next = self.graph.port(linked).piece();
            if !processed.insert(next) {
                continue;
            }
            let gap = self.graph.position(port).distance(self.graph.position(linked));
            if gap > MAX_ACCEPTABLE_DISTANCE {
                let target = self.graph.position(port);
                self.graph.move_piece_so_port_at(linked, target);
            }
            stack.extend(self.graph.piece(next).ports().iter().copied());
        }
    }
}
