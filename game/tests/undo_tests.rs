use engine::fingerprint::json_fingerprint;
use engine::math::Vec3;
use game::instructions::{Instruction, InstructionBudget};
use game::placement::{PlacementEngine, PlacementError, MAX_ACCEPTABLE_DISTANCE};
use game::road_graph::{Direction, PieceId};
use game::templates::{self, standard_catalog};

fn engine() -> PlacementEngine {
    PlacementEngine::new(standard_catalog(), Vec3::ZERO).expect("start piece exists")
}

fn fingerprint(engine: &PlacementEngine) -> String {
    json_fingerprint(&engine.graph().snapshot()).expect("snapshot serializes")
}

fn piece_by_id(engine: &PlacementEngine, id: &str) -> PieceId {
    engine
        .graph()
        .live_pieces()
        .find(|(_, p)| p.catalog_id() == id)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("no live piece {id}"))
}

#[test]
fn undo_with_nothing_to_undo_fails() {
    let mut engine = engine();
    let mut budget = InstructionBudget::empty();
    assert_eq!(engine.undo(&mut budget), Err(PlacementError::EmptyStack));
}

#[test]
fn undo_restores_links_on_both_sides() {
    let mut engine = engine();
    let mut budget = InstructionBudget::empty();
    let placed = engine
        .place_chain(&[templates::STRAIGHT, templates::STRAIGHT], Direction::Forward)
        .unwrap();
    let first_out = engine
        .graph()
        .ports_by_direction(placed.pieces[0], Direction::Forward)[0];
    let second_in = engine
        .graph()
        .ports_by_direction(placed.pieces[1], Direction::Back)[0];

    // splice a piece into the middle of the existing link
    engine.select(first_out);
    engine
        .place_chain(&[templates::STRAIGHT], Direction::Forward)
        .unwrap();
    assert_ne!(engine.graph().port(first_out).link(), Some(second_in));

    engine.undo(&mut budget).unwrap();
    assert_eq!(engine.graph().port(first_out).link(), Some(second_in));
    assert_eq!(engine.graph().port(second_in).link(), Some(first_out));
    assert!(engine.graph().links_are_symmetric());
    assert_eq!(engine.cursor(), Some(first_out));
}

#[test]
fn undo_is_the_exact_inverse_of_a_placement() {
    let mut engine = engine();
    let mut budget = InstructionBudget::uniform(3);

    let before_each = [
        fingerprint(&engine),
        {
            engine
                .place_chain(&[templates::STRAIGHT], Direction::Forward)
                .unwrap();
            fingerprint(&engine)
        },
        {
            engine.place_condition(&mut budget).unwrap();
            fingerprint(&engine)
        },
    ];
    engine
        .place_instruction_button(Instruction::Move, &mut budget)
        .unwrap();

    engine.undo(&mut budget).unwrap();
    assert_eq!(fingerprint(&engine), before_each[2]);
    engine.undo(&mut budget).unwrap();
    assert_eq!(fingerprint(&engine), before_each[1]);
    engine.undo(&mut budget).unwrap();
    assert_eq!(fingerprint(&engine), before_each[0]);
    assert_eq!(budget, InstructionBudget::uniform(3));
}

#[test]
fn undo_refunds_exactly_what_each_kind_consumed() {
    for kind in Instruction::ALL {
        let mut engine = engine();
        let mut budget = InstructionBudget::uniform(1);

        engine
            .place_instruction_button(kind, &mut budget)
            .unwrap_or_else(|e| panic!("{kind:?} placement failed: {e:?}"));
        assert_eq!(budget.remaining(kind), 0, "{kind:?} not consumed");

        engine.undo(&mut budget).unwrap();
        assert_eq!(budget.remaining(kind), 1, "{kind:?} not refunded");
    }
}

#[test]
fn undoing_a_reused_host_removes_only_the_button() {
    let mut engine = engine();
    let mut budget = InstructionBudget::uniform(2);
    engine
        .place_instruction_button(Instruction::Move, &mut budget)
        .unwrap();
    engine
        .place_instruction_button(Instruction::Jump, &mut budget)
        .unwrap();

    let host = piece_by_id(&engine, templates::NODE_VERTICAL_BUTTON);
    assert_eq!(engine.graph().buttons_of(host).len(), 2);

    engine.undo(&mut budget).unwrap();
    assert!(engine.graph().try_piece(host).is_some(), "host must survive");
    assert_eq!(engine.graph().buttons_of(host).len(), 1);
    assert_eq!(budget.remaining(Instruction::Jump), 2);
    assert_eq!(budget.remaining(Instruction::Move), 1);
}

#[test]
fn undo_removes_gap_fillers_and_recloses_the_layout() {
    let mut engine = engine();
    let mut budget = InstructionBudget::uniform(1);
    engine.place_condition(&mut budget).unwrap();
    let before = fingerprint(&engine);

    let if_in = piece_by_id(&engine, templates::NODE_IF_IN);
    let yes_out = engine.graph().ports_by_direction(if_in, Direction::Forward)[0];
    engine.select(yes_out);
    let placed = engine
        .place_chain(&[templates::STRAIGHT], Direction::Forward)
        .unwrap();
    assert_eq!(placed.filler_pieces.len(), 1);

    engine.undo(&mut budget).unwrap();
    assert_eq!(fingerprint(&engine), before);
    let widest = engine
        .graph()
        .live_ports()
        .filter_map(|(id, port)| {
            port.link().map(|other| {
                engine
                    .graph()
                    .position(id)
                    .distance(engine.graph().position(other))
            })
        })
        .fold(0.0, f32::max);
    assert!(
        widest <= MAX_ACCEPTABLE_DISTANCE,
        "position correction must pull moved pieces back"
    );
    assert_eq!(engine.cursor(), Some(yes_out));
}

#[test]
fn undo_restores_the_previous_cursor() {
    let mut engine = engine();
    let mut budget = InstructionBudget::empty();
    let placed = engine
        .place_chain(&[templates::STRAIGHT], Direction::Forward)
        .unwrap();
    let cursor_after_first = placed.cursor.expect("cursor advanced");

    engine
        .place_chain(&[templates::STRAIGHT], Direction::Forward)
        .unwrap();
    assert_ne!(engine.cursor(), Some(cursor_after_first));

    engine.undo(&mut budget).unwrap();
    assert_eq!(engine.cursor(), Some(cursor_after_first));
}
