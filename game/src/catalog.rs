//! Piece templates and geometric matching.
//!
//! Matching answers one question: can some template be dropped into the
//! world so that a set of already-placed target ports all pair up with
//! ports of the new piece? Pairing is by translation only, anchored at the
//! first target port, with a per-pair distance tolerance. Roles must
//! differ in a pair (inputs plug into outputs) and the first pivot and
//! first template that work win; there is no backtracking.

use engine::math::Vec3;

use crate::road_graph::{Direction, PortId, PortRole, RoadGraph};

/// Which runtime behavior a template stamps onto its pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Start,
    Straight,
    Connector,
    IfIn,
    IfOut,
    LoopIn { iterations: u32 },
    LoopOut,
    ButtonHost,
}

#[derive(Debug, Clone)]
pub struct TemplatePort {
    pub role: PortRole,
    pub direction: Direction,
    pub local: Vec3,
    pub selectable: bool,
}

/// `entry` and `exit` index into the template's port list.
#[derive(Debug, Clone)]
pub struct TemplatePath {
    pub name: &'static str,
    pub points: Vec<Vec3>,
    pub entry: usize,
    pub exit: usize,
}

#[derive(Debug, Clone)]
pub struct PieceTemplate {
    pub id: &'static str,
    pub kind: TemplateKind,
    pub connector: bool,
    pub ports: Vec<TemplatePort>,
    pub paths: Vec<TemplatePath>,
}

/// The target ports handed to a match query must all belong to one piece
/// and face one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogError {
    InvalidTargetSet,
}

/// A successful match: which template fit, and which target port pairs
/// with which of its ports (by template port index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    pub template_id: &'static str,
    pub mapping: Vec<(PortId, usize)>,
}

/// A template that fits two facing port sets at once. `side_a` maps onto
/// the first piece of the bridging chain, `side_b` onto the last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMatch {
    pub template_id: &'static str,
    pub side_a: TemplateMatch,
    pub side_b: TemplateMatch,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: Vec<PieceTemplate>,
}

impl Catalog {
    pub fn new(templates: Vec<PieceTemplate>) -> Self {
        Self { templates }
    }

    pub fn by_id(&self, id: &str) -> Option<&PieceTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn templates(&self) -> &[PieceTemplate] {
        &self.templates
    }

    pub fn connectors(&self) -> Vec<&PieceTemplate> {
        self.templates.iter().filter(|t| t.connector).collect()
    }

    /// First candidate whose ports can all pair with `target_ports` under
    /// `error_margin`. `Ok(None)` when nothing fits.
    pub fn find_matching(
        &self,
        candidates: &[&PieceTemplate],
        graph: &RoadGraph,
        target_ports: &[PortId],
        error_margin: f32,
    ) -> Result<Option<TemplateMatch>, CatalogError> {
        let direction = validate_target_set(graph, target_ports)?;
        let wanted = direction.opposite();
        for template in candidates {
            if let Some(mapping) = align_template(graph, target_ports, template, wanted, error_margin)
            {
                return Ok(Some(TemplateMatch {
                    template_id: template.id,
                    mapping,
                }));
            }
        }
        Ok(None)
    }

    /// First candidate that fits both sides of a gap. The two sides must
    /// face each other.
    pub fn find_bridge(
        &self,
        candidates: &[&PieceTemplate],
        graph: &RoadGraph,
        side_a: &[PortId],
        side_b: &[PortId],
        error_margin: f32,
    ) -> Result<Option<BridgeMatch>, CatalogError> {
        let dir_a = validate_target_set(graph, side_a)?;
        let dir_b = validate_target_set(graph, side_b)?;
        if dir_a != dir_b.opposite() {
            return Err(CatalogError::InvalidTargetSet);
        }
        for template in candidates {
            let Some(mapping_a) =
                align_template(graph, side_a, template, dir_a.opposite(), error_margin)
            else {
                continue;
            };
            let Some(mapping_b) =
                align_template(graph, side_b, template, dir_b.opposite(), error_margin)
            else {
                continue;
            };
            return Ok(Some(BridgeMatch {
                template_id: template.id,
                side_a: TemplateMatch {
                    template_id: template.id,
                    mapping: mapping_a,
                },
                side_b: TemplateMatch {
                    template_id: template.id,
                    mapping: mapping_b,
                },
            }));
        }
        Ok(None)
    }
}

fn validate_target_set(graph: &RoadGraph, target_ports: &[PortId]) -> Result<Direction, CatalogError> {
    let first = *target_ports.first().ok_or(CatalogError::InvalidTargetSet)?;
    let piece = graph.port(first).piece();
    let direction = graph.port(first).direction();
    for &id in target_ports {
        let port = graph.port(id);
        if port.piece() != piece || port.direction() != direction {
            return Err(CatalogError::InvalidTargetSet);
        }
    }
    Ok(direction)
}

fn align_template(
    graph: &RoadGraph,
    targets: &[PortId],
    template: &PieceTemplate,
    wanted: Direction,
    error_margin: f32,
) -> Option<Vec<(PortId, usize)>> {
    let candidate_ports: Vec<usize> = template
        .ports
        .iter()
        .enumerate()
        .filter(|(_, p)| p.direction == wanted)
        .map(|(i, _)| i)
        .collect();
    if candidate_ports.len() != targets.len() {
        return None;
    }

    let pivot_target = graph.position(targets[0]);
    for &pivot in &candidate_ports {
        let offset = pivot_target - template.ports[pivot].local;
        let mut mapping: Vec<(PortId, usize)> = Vec::with_capacity(targets.len());
        for &cand in &candidate_ports {
            let cand_pos = template.ports[cand].local + offset;
            let cand_role = template.ports[cand].role;
            for &target in targets {
                if mapping.iter().any(|&(t, _)| t == target) {
                    continue;
                }
                let port = graph.port(target);
                if port.role() == cand_role {
                    continue;
                }
                if graph.position(target).distance(cand_pos) <= error_margin {
                    mapping.push((target, cand));
                    break;
                }
            }
        }
        if mapping.len() == targets.len() {
            return Some(mapping);
        }
    }
    None
}
