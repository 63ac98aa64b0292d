//! The built-in piece roster.
//!
//! Pieces are one unit long along +z; their input side faces Back, their
//! output side Forward. Two-lane pieces put the yes/left lane at -x and the
//! no/right lane at +x, `LANE_OFFSET` from the centerline. Loop pieces add
//! a hidden return lane so the agent can run the body repeatedly: the loop
//! exit routes its yes input back to the loop entry, which decrements its
//! counter on every continuation and switches to the no lane at zero.

use engine::math::Vec3;

use crate::catalog::{Catalog, PieceTemplate, TemplateKind, TemplatePath, TemplatePort};
use crate::road_graph::{Direction, PortRole, PATH_NO, PATH_YES};

pub const ROAD_START: &str = "RoadStart";
pub const STRAIGHT: &str = "Straight";
pub const CONNECTOR_VERTICAL: &str = "ConnectorVertical";
pub const CONNECTOR_DOUBLE: &str = "ConnectorDouble";
pub const NODE_IF_IN: &str = "NodeIfIn";
pub const NODE_IF_OUT: &str = "NodeIfOut";
pub const NODE_LOOP_IN: &str = "NodeLoopIn";
pub const NODE_LOOP_OUT: &str = "NodeLoopOut";
pub const NODE_VERTICAL_BUTTON: &str = "NodeVerticalButton";

pub const PIECE_LENGTH: f32 = 1.0;
pub const LANE_OFFSET: f32 = 0.3;
pub const DEFAULT_LOOP_ITERATIONS: u32 = 2;

pub fn standard_catalog() -> Catalog {
    Catalog::new(vec![
        road_start(),
        straight(),
        connector_vertical(),
        connector_double(),
        node_if_in(),
        node_if_out(),
        node_loop_in(),
        node_loop_out(),
        node_vertical_button(),
    ])
}

fn port(role: PortRole, direction: Direction, local: Vec3) -> TemplatePort {
    TemplatePort {
        role,
        direction,
        local,
        selectable: true,
    }
}

fn hidden_port(role: PortRole, direction: Direction, local: Vec3) -> TemplatePort {
    TemplatePort {
        role,
        direction,
        local,
        selectable: false,
    }
}

fn path(name: &'static str, entry: usize, exit: usize, points: Vec<Vec3>) -> TemplatePath {
    TemplatePath {
        name,
        points,
        entry,
        exit,
    }
}

fn single_lane(id: &'static str, kind: TemplateKind, connector: bool) -> PieceTemplate {
    let input = Vec3::ZERO;
    let output = Vec3::new(0.0, 0.0, PIECE_LENGTH);
    PieceTemplate {
        id,
        kind,
        connector,
        ports: vec![
            port(PortRole::Input, Direction::Back, input),
            port(PortRole::Output, Direction::Forward, output),
        ],
        paths: vec![path("Path", 0, 1, vec![input, output])],
    }
}

fn road_start() -> PieceTemplate {
    single_lane(ROAD_START, TemplateKind::Start, false)
}

fn straight() -> PieceTemplate {
    single_lane(STRAIGHT, TemplateKind::Straight, false)
}

fn connector_vertical() -> PieceTemplate {
    let input = Vec3::ZERO;
    let dip = Vec3::new(0.0, -0.1, PIECE_LENGTH * 0.5);
    let output = Vec3::new(0.0, 0.0, PIECE_LENGTH);
    PieceTemplate {
        id: CONNECTOR_VERTICAL,
        kind: TemplateKind::Connector,
        connector: true,
        ports: vec![
            port(PortRole::Input, Direction::Back, input),
            port(PortRole::Output, Direction::Forward, output),
        ],
        paths: vec![path("Path", 0, 1, vec![input, dip, output])],
    }
}

fn connector_double() -> PieceTemplate {
    let in_a = Vec3::new(-LANE_OFFSET, 0.0, 0.0);
    let in_b = Vec3::new(LANE_OFFSET, 0.0, 0.0);
    let out_a = Vec3::new(-LANE_OFFSET, 0.0, PIECE_LENGTH);
    let out_b = Vec3::new(LANE_OFFSET, 0.0, PIECE_LENGTH);
    PieceTemplate {
        id: CONNECTOR_DOUBLE,
        kind: TemplateKind::Connector,
        connector: true,
        ports: vec![
            port(PortRole::Input, Direction::Back, in_a),
            port(PortRole::Input, Direction::Back, in_b),
            port(PortRole::Output, Direction::Forward, out_a),
            port(PortRole::Output, Direction::Forward, out_b),
        ],
        paths: vec![
            path("A", 0, 2, vec![in_a, out_a]),
            path("B", 1, 3, vec![in_b, out_b]),
        ],
    }
}

fn node_if_in() -> PieceTemplate {
    let input = Vec3::ZERO;
    let out_yes = Vec3::new(-LANE_OFFSET, 0.0, PIECE_LENGTH);
    let out_no = Vec3::new(LANE_OFFSET, 0.0, PIECE_LENGTH);
    PieceTemplate {
        id: NODE_IF_IN,
        kind: TemplateKind::IfIn,
        connector: false,
        ports: vec![
            port(PortRole::Input, Direction::Back, input),
            port(PortRole::Output, Direction::Forward, out_yes),
            port(PortRole::Output, Direction::Forward, out_no),
        ],
        paths: vec![
            path(PATH_YES, 0, 1, vec![input, out_yes]),
            path(PATH_NO, 0, 2, vec![input, out_no]),
        ],
    }
}

fn node_if_out() -> PieceTemplate {
    let in_yes = Vec3::new(-LANE_OFFSET, 0.0, 0.0);
    let in_no = Vec3::new(LANE_OFFSET, 0.0, 0.0);
    let output = Vec3::new(0.0, 0.0, PIECE_LENGTH);
    PieceTemplate {
        id: NODE_IF_OUT,
        kind: TemplateKind::IfOut,
        connector: false,
        ports: vec![
            port(PortRole::Input, Direction::Back, in_yes),
            port(PortRole::Input, Direction::Back, in_no),
            port(PortRole::Output, Direction::Forward, output),
        ],
        paths: vec![
            path(PATH_YES, 0, 2, vec![in_yes, output]),
            path(PATH_NO, 1, 2, vec![in_no, output]),
        ],
    }
}

fn node_loop_in() -> PieceTemplate {
    let top = Vec3::ZERO;
    let out_yes = Vec3::new(-LANE_OFFSET, 0.0, PIECE_LENGTH);
    let out_no = Vec3::new(LANE_OFFSET, 0.0, PIECE_LENGTH);
    let back = Vec3::new(0.0, 0.0, PIECE_LENGTH);
    PieceTemplate {
        id: NODE_LOOP_IN,
        kind: TemplateKind::LoopIn {
            iterations: DEFAULT_LOOP_ITERATIONS,
        },
        connector: false,
        ports: vec![
            port(PortRole::Input, Direction::Back, top),
            port(PortRole::Output, Direction::Forward, out_yes),
            port(PortRole::Output, Direction::Forward, out_no),
            hidden_port(PortRole::Input, Direction::Forward, back),
        ],
        paths: vec![
            path("TopToYes", 0, 1, vec![top, out_yes]),
            path("TopToNo", 0, 2, vec![top, out_no]),
            path("BottomToYes", 3, 1, vec![back, out_yes]),
            path("BottomToNo", 3, 2, vec![back, out_no]),
        ],
    }
}

fn node_loop_out() -> PieceTemplate {
    let in_yes = Vec3::new(-LANE_OFFSET, 0.0, 0.0);
    let in_no = Vec3::new(LANE_OFFSET, 0.0, 0.0);
    let back = Vec3::ZERO;
    let exit = Vec3::new(0.0, 0.0, PIECE_LENGTH);
    PieceTemplate {
        id: NODE_LOOP_OUT,
        kind: TemplateKind::LoopOut,
        connector: false,
        ports: vec![
            port(PortRole::Input, Direction::Back, in_yes),
            port(PortRole::Input, Direction::Back, in_no),
            hidden_port(PortRole::Output, Direction::Back, back),
            port(PortRole::Output, Direction::Forward, exit),
        ],
        paths: vec![
            path("YesToBack", 0, 2, vec![in_yes, back]),
            path("NoToExit", 1, 3, vec![in_no, exit]),
        ],
    }
}

fn node_vertical_button() -> PieceTemplate {
    single_lane(NODE_VERTICAL_BUTTON, TemplateKind::ButtonHost, false)
}
