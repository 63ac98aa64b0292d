//! The road graph: pieces, their ports, and the links between them.
//!
//! Pieces and ports live in arenas and are addressed by stable integer
//! handles. Removing a piece leaves a hole in the arena so every other
//! handle stays valid; a handle to a removed entity is "stale" and filtered
//! out by the `try_*` accessors.

use std::fmt;

use engine::counter::Counter;
use engine::math::Vec3;
use engine::world::{ConditionSource, MotionPath, PoseProvider};
use serde::{Deserialize, Serialize};

use crate::catalog::{PieceTemplate, TemplateKind};
use crate::instructions::Instruction;

pub const BUTTON_SLOTS: usize = 3;
pub const LOOP_COUNTER_MAX: u32 = 9;

/// Path names shared by the branching pieces. Loop pieces follow the same
/// convention: continuation paths end in `Yes`, exit paths end in `No`.
pub const PATH_YES: &str = "Yes";
pub const PATH_NO: &str = "No";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Back,
            Direction::Back => Direction::Forward,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortRole {
    Input,
    Output,
}

/// One connection point on a piece. `local` is the offset from the piece
/// origin; the world position moves with the piece.
#[derive(Debug, Clone)]
pub struct Port {
    piece: PieceId,
    role: PortRole,
    direction: Direction,
    local: Vec3,
    selectable: bool,
    link: Option<PortId>,
}

impl Port {
    pub fn piece(&self) -> PieceId {
        self.piece
    }

    pub fn role(&self) -> PortRole {
        self.role
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn local(&self) -> Vec3 {
        self.local
    }

    pub fn selectable(&self) -> bool {
        self.selectable
    }

    pub fn link(&self) -> Option<PortId> {
        self.link
    }
}

/// A named route through a piece, from one of its input ports to one of its
/// output ports. Points are piece-local.
#[derive(Debug, Clone)]
pub struct PiecePath {
    name: &'static str,
    points: Vec<Vec3>,
    entry: PortId,
    exit: PortId,
}

impl PiecePath {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entry(&self) -> PortId {
        self.entry
    }

    pub fn exit(&self) -> PortId {
        self.exit
    }
}

/// An instruction button sitting in one of a host piece's three slots.
#[derive(Debug, Clone)]
pub struct Button {
    id: ButtonId,
    kind: Instruction,
    position: Vec3,
}

impl Button {
    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub fn kind(&self) -> Instruction {
        self.kind
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

/// What a piece does when the agent enters it. Behavior lives here instead
/// of in per-piece subtypes so callers dispatch over one enum.
#[derive(Debug, Clone)]
pub enum PieceKind {
    Start,
    Straight,
    Connector,
    IfIn,
    IfOut,
    LoopIn { counter: Counter },
    LoopOut,
    ButtonHost { slots: [Option<Button>; BUTTON_SLOTS] },
}

#[derive(Debug, Clone)]
pub struct Piece {
    catalog_id: &'static str,
    connector: bool,
    kind: PieceKind,
    origin: Vec3,
    ports: Vec<PortId>,
    paths: Vec<PiecePath>,
}

impl Piece {
    pub fn catalog_id(&self) -> &'static str {
        self.catalog_id
    }

    pub fn is_connector(&self) -> bool {
        self.connector
    }

    pub fn kind(&self) -> &PieceKind {
        &self.kind
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    pub fn paths(&self) -> &[PiecePath] {
        &self.paths
    }

    fn path_index(&self, entry: PortId, name: Option<&str>) -> Option<usize> {
        self.paths
            .iter()
            .position(|p| p.entry == entry && name.is_none_or(|n| p.name == n))
    }
}

/// The entry port does not begin any path on its piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoPath;

impl fmt::Display for NoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no path starts at this port")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonError {
    HostFull,
    NotFound,
}

#[derive(Debug, Default)]
pub struct RoadGraph {
    pieces: Vec<Option<Piece>>,
    ports: Vec<Option<Port>>,
    next_button: u32,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps a template into the arena at `origin` and returns its handle.
    pub fn instantiate(&mut self, template: &PieceTemplate, origin: Vec3) -> PieceId {
        let piece_id = PieceId(self.pieces.len() as u32);
        let mut ports = Vec::with_capacity(template.ports.len());
        for layout in &template.ports {
            let id = PortId(self.ports.len() as u32);
            self.ports.push(Some(Port {
                piece: piece_id,
                role: layout.role,
                direction: layout.direction,
                local: layout.local,
                selectable: layout.selectable,
                link: None,
            }));
            ports.push(id);
        }
        let paths = template
            .paths
            .iter()
            .map(|route| PiecePath {
                name: route.name,
                points: route.points.clone(),
                entry: ports[route.entry],
                exit: ports[route.exit],
            })
            .collect();
        let kind = match template.kind {
            TemplateKind::Start => PieceKind::Start,
            TemplateKind::Straight => PieceKind::Straight,
            TemplateKind::Connector => PieceKind::Connector,
            TemplateKind::IfIn => PieceKind::IfIn,
            TemplateKind::IfOut => PieceKind::IfOut,
            TemplateKind::LoopIn { iterations } => PieceKind::LoopIn {
                counter: Counter::with_value(LOOP_COUNTER_MAX, iterations),
            },
            TemplateKind::LoopOut => PieceKind::LoopOut,
            TemplateKind::ButtonHost => PieceKind::ButtonHost {
                slots: [None, None, None],
            },
        };
        self.pieces.push(Some(Piece {
            catalog_id: template.id,
            connector: template.connector,
            kind,
            origin,
            ports,
            paths,
        }));
        piece_id
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        match self.pieces.get(id.0 as usize).and_then(Option::as_ref) {
            Some(piece) => piece,
            None => panic!("stale piece handle {id:?}"),
        }
    }

    fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        match self.pieces.get_mut(id.0 as usize).and_then(Option::as_mut) {
            Some(piece) => piece,
            None => panic!("stale piece handle {id:?}"),
        }
    }

    pub fn try_piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0 as usize)?.as_ref()
    }

    pub fn port(&self, id: PortId) -> &Port {
        match self.ports.get(id.0 as usize).and_then(Option::as_ref) {
            Some(port) => port,
            None => panic!("stale port handle {id:?}"),
        }
    }

    fn port_mut(&mut self, id: PortId) -> &mut Port {
        match self.ports.get_mut(id.0 as usize).and_then(Option::as_mut) {
            Some(port) => port,
            None => panic!("stale port handle {id:?}"),
        }
    }

    pub fn try_port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.0 as usize)?.as_ref()
    }

    pub fn live_pieces(&self) -> impl Iterator<Item = (PieceId, &Piece)> {
        self.pieces
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|p| (PieceId(i as u32), p)))
    }

    pub fn live_ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.ports
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|p| (PortId(i as u32), p)))
    }

    pub fn position(&self, port: PortId) -> Vec3 {
        let p = self.port(port);
        self.piece(p.piece).origin + p.local
    }

    pub fn ports_by_direction(&self, piece: PieceId, direction: Direction) -> Vec<PortId> {
        self.piece(piece)
            .ports
            .iter()
            .copied()
            .filter(|&p| self.port(p).direction == direction)
            .collect()
    }

    /// Links `a` and `b` to each other. Whatever either side was linked to
    /// before becomes unlinked on both of its ends.
    pub fn connect(&mut self, a: PortId, b: PortId) {
        self.unlink(a);
        self.unlink(b);
        self.port_mut(a).link = Some(b);
        self.port_mut(b).link = Some(a);
    }

    /// Clears the link on `a` and on its counterpart, if any.
    pub fn disconnect(&mut self, a: PortId) {
        self.unlink(a);
    }

    fn unlink(&mut self, a: PortId) {
        if let Some(old) = self.port_mut(a).link.take() {
            if let Some(port) = self.ports.get_mut(old.0 as usize).and_then(Option::as_mut) {
                port.link = None;
            }
        }
    }

    /// Puts `a` back to a previously observed link state. A counterpart that
    /// no longer exists counts as no link.
    pub fn restore_link(&mut self, a: PortId, previous: Option<PortId>) {
        match previous {
            Some(b) if self.try_port(b).is_some() => self.connect(a, b),
            _ => self.disconnect(a),
        }
    }

    /// Rigidly translates the whole piece so that `port` lands on `target`.
    pub fn move_piece_so_port_at(&mut self, port: PortId, target: Vec3) {
        let delta = target - self.position(port);
        let piece = self.port(port).piece;
        let origin = self.piece(piece).origin + delta;
        self.piece_mut(piece).origin = origin;
    }

    pub fn remove_piece(&mut self, id: PieceId) {
        let Some(piece) = self.pieces.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        for port in piece.ports {
            let Some(taken) = self.ports.get_mut(port.0 as usize).and_then(Option::take) else {
                continue;
            };
            if let Some(other) = taken.link {
                if let Some(o) = self.ports.get_mut(other.0 as usize).and_then(Option::as_mut) {
                    o.link = None;
                }
            }
        }
    }

    pub fn set_loop_iterations(&mut self, piece: PieceId, iterations: u32) -> bool {
        if let PieceKind::LoopIn { counter } = &mut self.piece_mut(piece).kind {
            counter.set(iterations);
            true
        } else {
            false
        }
    }

    pub fn loop_counter(&self, piece: PieceId) -> Option<&Counter> {
        match &self.piece(piece).kind {
            PieceKind::LoopIn { counter } => Some(counter),
            _ => None,
        }
    }

    /// Picks the route the agent takes when it enters `entry`, in world
    /// coordinates, together with the output port the route ends at.
    ///
    /// Branching pieces ask `condition`; loop entries consume one counter
    /// tick per continuation and switch to their exit paths at zero.
    pub fn resolve_path(
        &mut self,
        entry: PortId,
        condition: &dyn ConditionSource,
    ) -> Result<(MotionPath, PortId), NoPath> {
        let piece_id = self.port(entry).piece;
        let (index, decrement) = {
            let piece = self.piece(piece_id);
            match &piece.kind {
                PieceKind::IfIn => {
                    let wanted = if condition.evaluate() { PATH_YES } else { PATH_NO };
                    (piece.path_index(entry, Some(wanted)).ok_or(NoPath)?, false)
                }
                PieceKind::LoopIn { counter } => {
                    let continuing = counter.value() > 0;
                    let index = piece
                        .paths
                        .iter()
                        .position(|p| p.entry == entry && p.name.ends_with(PATH_YES) == continuing)
                        .ok_or(NoPath)?;
                    (index, continuing)
                }
                _ => (piece.path_index(entry, None).ok_or(NoPath)?, false),
            }
        };
        if decrement {
            if let PieceKind::LoopIn { counter } = &mut self.piece_mut(piece_id).kind {
                counter.decrement();
            }
        }
        let piece = self.piece(piece_id);
        let path = &piece.paths[index];
        let points = path.points.iter().map(|&p| piece.origin + p).collect();
        Ok((MotionPath::new(points), path.exit))
    }

    /// The input/output pair a button host hangs its slots between.
    pub fn host_boundary_ports(&self, host: PieceId) -> Option<(PortId, PortId)> {
        let piece = self.try_piece(host)?;
        if !matches!(piece.kind, PieceKind::ButtonHost { .. }) {
            return None;
        }
        let input = piece
            .ports
            .iter()
            .copied()
            .find(|&p| self.port(p).role == PortRole::Input)?;
        let output = piece
            .ports
            .iter()
            .copied()
            .find(|&p| self.port(p).role == PortRole::Output)?;
        Some((input, output))
    }

    /// Adds a button to a host piece next to `near_port` (one of the host's
    /// two boundary ports). Slots sit at 1/4, 1/2 and 3/4 of the way between
    /// the boundary ports; existing buttons shift away from the insertion
    /// side.
    pub fn add_button(
        &mut self,
        host: PieceId,
        kind: Instruction,
        near_port: PortId,
    ) -> Result<ButtonId, ButtonError> {
        let (input, output) = self.host_boundary_ports(host).ok_or(ButtonError::HostFull)?;
        if near_port != input && near_port != output {
            return Err(ButtonError::HostFull);
        }
        let near_input = near_port == input;
        let pos_in = self.position(input);
        let pos_out = self.position(output);
        let mid = pos_in.lerp(pos_out, 0.5);
        let quarter = pos_in.lerp(mid, 0.5);
        let three_quarter = mid.lerp(pos_out, 0.5);

        let id = ButtonId(self.next_button);
        let PieceKind::ButtonHost { slots } = &mut self.piece_mut(host).kind else {
            return Err(ButtonError::HostFull);
        };
        let count = slots.iter().flatten().count();
        match count {
            0 => {
                slots[1] = Some(Button {
                    id,
                    kind,
                    position: mid,
                });
            }
            1 => {
                let mut existing = slots[1].take().ok_or(ButtonError::HostFull)?;
                if near_input {
                    existing.position = three_quarter;
                    slots[2] = Some(existing);
                    slots[0] = Some(Button {
                        id,
                        kind,
                        position: quarter,
                    });
                } else {
                    existing.position = quarter;
                    slots[0] = Some(existing);
                    slots[2] = Some(Button {
                        id,
                        kind,
                        position: three_quarter,
                    });
                }
            }
            2 => {
                // two buttons always occupy the outer slots
                if near_input {
                    let mut shifted = slots[0].take().ok_or(ButtonError::HostFull)?;
                    shifted.position = mid;
                    slots[1] = Some(shifted);
                    slots[0] = Some(Button {
                        id,
                        kind,
                        position: quarter,
                    });
                } else {
                    let mut shifted = slots[2].take().ok_or(ButtonError::HostFull)?;
                    shifted.position = mid;
                    slots[1] = Some(shifted);
                    slots[2] = Some(Button {
                        id,
                        kind,
                        position: three_quarter,
                    });
                }
            }
            _ => return Err(ButtonError::HostFull),
        }
        self.next_button += 1;
        Ok(id)
    }

    /// Removes a button and recompacts the survivors: one button recenters
    /// to the middle slot, two spread to the outer slots.
    pub fn remove_button(
        &mut self,
        host: PieceId,
        button: ButtonId,
    ) -> Result<Instruction, ButtonError> {
        let (input, output) = self.host_boundary_ports(host).ok_or(ButtonError::NotFound)?;
        let pos_in = self.position(input);
        let pos_out = self.position(output);
        let mid = pos_in.lerp(pos_out, 0.5);
        let quarter = pos_in.lerp(mid, 0.5);
        let three_quarter = mid.lerp(pos_out, 0.5);

        let PieceKind::ButtonHost { slots } = &mut self.piece_mut(host).kind else {
            return Err(ButtonError::NotFound);
        };
        let slot = slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|b| b.id == button))
            .ok_or(ButtonError::NotFound)?;
        let removed = slots[slot].take().ok_or(ButtonError::NotFound)?;

        let mut rest: Vec<Button> = slots.iter_mut().filter_map(Option::take).collect();
        match rest.len() {
            1 => {
                let mut only = rest.remove(0);
                only.position = mid;
                slots[1] = Some(only);
            }
            2 => {
                let mut second = rest.pop().ok_or(ButtonError::NotFound)?;
                let mut first = rest.remove(0);
                first.position = quarter;
                second.position = three_quarter;
                slots[0] = Some(first);
                slots[2] = Some(second);
            }
            _ => {}
        }
        Ok(removed.kind)
    }

    pub fn buttons_of(&self, host: PieceId) -> Vec<&Button> {
        match &self.piece(host).kind {
            PieceKind::ButtonHost { slots } => slots.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }

    /// Every link is held by both of its endpoints or by neither.
    pub fn links_are_symmetric(&self) -> bool {
        self.live_ports().all(|(id, port)| match port.link {
            Some(other) => self
                .try_port(other)
                .is_some_and(|o| o.link == Some(id)),
            None => true,
        })
    }

    /// Structural summary of the live graph: piece identities, hosted
    /// buttons, and the link set. Positions are deliberately excluded so a
    /// snapshot is stable under rigid motion.
    pub fn snapshot(&self) -> GraphSnapshot {
        let pieces = self
            .live_pieces()
            .map(|(id, piece)| {
                let buttons = match &piece.kind {
                    PieceKind::ButtonHost { slots } => slots
                        .iter()
                        .flatten()
                        .map(|b| format!("{:?}", b.kind))
                        .collect(),
                    _ => Vec::new(),
                };
                PieceSnapshot {
                    id: id.0,
                    catalog_id: piece.catalog_id.to_string(),
                    buttons,
                }
            })
            .collect();
        let links = self
            .live_ports()
            .filter_map(|(id, port)| {
                let other = port.link?;
                (id.0 < other.0).then_some((id.0, other.0))
            })
            .collect();
        GraphSnapshot { pieces, links }
    }
}

impl PoseProvider<PortId> for RoadGraph {
    fn position(&self, id: PortId) -> Option<Vec3> {
        self.try_port(id)?;
        Some(RoadGraph::position(self, id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieceSnapshot {
    pub id: u32,
    pub catalog_id: String,
    pub buttons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub pieces: Vec<PieceSnapshot>,
    pub links: Vec<(u32, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{self, standard_catalog};
    use engine::world::FixedCondition;

    fn graph_with(ids: &[&str]) -> (RoadGraph, Vec<PieceId>) {
        let catalog = standard_catalog();
        let mut graph = RoadGraph::new();
        let pieces = ids
            .iter()
            .map(|id| {
                let template = catalog.by_id(id).expect("known template");
                graph.instantiate(template, Vec3::ZERO)
            })
            .collect();
        (graph, pieces)
    }

    #[test]
    fn opposite_is_an_involution() {
        for dir in [
            Direction::Forward,
            Direction::Back,
            Direction::Left,
            Direction::Right,
        ] {
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Direction::Forward.opposite(), Direction::Back);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }

    #[test]
    fn connect_is_symmetric_and_replaces_old_links() {
        let (mut graph, pieces) = graph_with(&[
            templates::STRAIGHT,
            templates::STRAIGHT,
            templates::STRAIGHT,
        ]);
        let out0 = graph.ports_by_direction(pieces[0], Direction::Forward)[0];
        let in1 = graph.ports_by_direction(pieces[1], Direction::Back)[0];
        let in2 = graph.ports_by_direction(pieces[2], Direction::Back)[0];

        graph.connect(out0, in1);
        assert_eq!(graph.port(out0).link(), Some(in1));
        assert_eq!(graph.port(in1).link(), Some(out0));

        graph.connect(out0, in2);
        assert_eq!(graph.port(out0).link(), Some(in2));
        assert_eq!(graph.port(in1).link(), None);
        assert!(graph.links_are_symmetric());
    }

    #[test]
    fn disconnect_clears_both_sides() {
        let (mut graph, pieces) = graph_with(&[templates::STRAIGHT, templates::STRAIGHT]);
        let out0 = graph.ports_by_direction(pieces[0], Direction::Forward)[0];
        let in1 = graph.ports_by_direction(pieces[1], Direction::Back)[0];
        graph.connect(out0, in1);
        graph.disconnect(in1);
        assert_eq!(graph.port(out0).link(), None);
        assert_eq!(graph.port(in1).link(), None);
    }

    #[test]
    fn remove_piece_unlinks_counterparts() {
        let (mut graph, pieces) = graph_with(&[templates::STRAIGHT, templates::STRAIGHT]);
        let out0 = graph.ports_by_direction(pieces[0], Direction::Forward)[0];
        let in1 = graph.ports_by_direction(pieces[1], Direction::Back)[0];
        graph.connect(out0, in1);

        graph.remove_piece(pieces[1]);
        assert!(graph.try_piece(pieces[1]).is_none());
        assert_eq!(graph.port(out0).link(), None);
        assert!(graph.links_are_symmetric());
    }

    #[test]
    fn move_piece_translates_every_port() {
        let (mut graph, pieces) = graph_with(&[templates::STRAIGHT]);
        let input = graph.ports_by_direction(pieces[0], Direction::Back)[0];
        let output = graph.ports_by_direction(pieces[0], Direction::Forward)[0];
        let before = graph.position(output) - graph.position(input);

        graph.move_piece_so_port_at(input, Vec3::new(5.0, 1.0, -2.0));
        assert_eq!(graph.position(input), Vec3::new(5.0, 1.0, -2.0));
        assert_eq!(graph.position(output) - graph.position(input), before);
    }

    #[test]
    fn if_piece_routes_by_condition() {
        let (mut graph, pieces) = graph_with(&[templates::NODE_IF_IN]);
        let entry = graph.ports_by_direction(pieces[0], Direction::Back)[0];

        let (_, yes_exit) = graph.resolve_path(entry, &FixedCondition(true)).unwrap();
        let (_, no_exit) = graph.resolve_path(entry, &FixedCondition(false)).unwrap();
        assert_ne!(yes_exit, no_exit);
        assert_eq!(graph.port(yes_exit).role(), PortRole::Output);
    }

    #[test]
    fn loop_entry_decrements_until_zero_then_exits() {
        let (mut graph, pieces) = graph_with(&[templates::NODE_LOOP_IN]);
        let top = graph.ports_by_direction(pieces[0], Direction::Back)[0];
        graph.set_loop_iterations(pieces[0], 1);

        let (_, first) = graph.resolve_path(top, &FixedCondition(true)).unwrap();
        assert_eq!(graph.loop_counter(pieces[0]).unwrap().value(), 0);

        let (_, second) = graph.resolve_path(top, &FixedCondition(true)).unwrap();
        assert_ne!(first, second, "exhausted loop must switch to its exit lane");
    }

    #[test]
    fn resolving_from_an_output_port_fails() {
        let (mut graph, pieces) = graph_with(&[templates::STRAIGHT]);
        let output = graph.ports_by_direction(pieces[0], Direction::Forward)[0];
        assert_eq!(
            graph.resolve_path(output, &FixedCondition(true)),
            Err(NoPath)
        );
    }

    #[test]
    fn button_slots_shift_away_from_the_insertion_side() {
        let (mut graph, pieces) = graph_with(&[templates::NODE_VERTICAL_BUTTON]);
        let host = pieces[0];
        let (input, output) = graph.host_boundary_ports(host).unwrap();

        graph.add_button(host, Instruction::Move, input).unwrap();
        let second = graph.add_button(host, Instruction::Jump, input).unwrap();
        graph.add_button(host, Instruction::Action, output).unwrap();

        let kinds: Vec<Instruction> = graph.buttons_of(host).iter().map(|b| b.kind()).collect();
        // second pushed first toward the output, third shifted it back to the middle
        assert_eq!(
            kinds,
            vec![Instruction::Jump, Instruction::Move, Instruction::Action]
        );

        assert_eq!(
            graph.add_button(host, Instruction::Move, input),
            Err(ButtonError::HostFull)
        );

        assert_eq!(graph.remove_button(host, second), Ok(Instruction::Jump));
        let kinds: Vec<Instruction> = graph.buttons_of(host).iter().map(|b| b.kind()).collect();
        assert_eq!(kinds, vec![Instruction::Move, Instruction::Action]);
    }

    #[test]
    fn single_button_sits_in_the_middle() {
        let (mut graph, pieces) = graph_with(&[templates::NODE_VERTICAL_BUTTON]);
        let host = pieces[0];
        let (input, output) = graph.host_boundary_ports(host).unwrap();
        graph.add_button(host, Instruction::Move, input).unwrap();

        let mid = graph.position(input).lerp(graph.position(output), 0.5);
        assert_eq!(graph.buttons_of(host)[0].position(), mid);
    }

    #[test]
    fn pose_provider_reports_live_ports_only() {
        use engine::world::PoseProvider;

        let (mut graph, pieces) = graph_with(&[templates::STRAIGHT]);
        let out = graph.ports_by_direction(pieces[0], Direction::Forward)[0];
        assert_eq!(PoseProvider::position(&graph, out), Some(graph.position(out)));

        graph.remove_piece(pieces[0]);
        assert_eq!(PoseProvider::position(&graph, out), None);
    }

    #[test]
    fn snapshot_ignores_rigid_motion() {
        let (mut graph, pieces) = graph_with(&[templates::STRAIGHT, templates::STRAIGHT]);
        let out0 = graph.ports_by_direction(pieces[0], Direction::Forward)[0];
        let in1 = graph.ports_by_direction(pieces[1], Direction::Back)[0];
        graph.connect(out0, in1);

        let before = graph.snapshot();
        graph.move_piece_so_port_at(in1, Vec3::new(9.0, 0.0, 9.0));
        assert_eq!(graph.snapshot(), before);
        assert_eq!(before.links, vec![(out0.0.min(in1.0), out0.0.max(in1.0))]);
    }
}
