use engine::math::Vec3;
use engine::world::{ConditionSource, FixedCondition, RecordingMotion};
use game::instructions::InstructionBudget;
use game::placement::PlacementEngine;
use game::road_graph::{Direction, PieceId};
use game::templates::{self, standard_catalog};
use game::traversal::{Traversal, TraversalFailure, TraversalState};

fn engine() -> PlacementEngine {
    PlacementEngine::new(standard_catalog(), Vec3::ZERO).expect("start piece exists")
}

fn piece_by_id(engine: &PlacementEngine, id: &str) -> PieceId {
    engine
        .graph()
        .live_pieces()
        .find(|(_, p)| p.catalog_id() == id)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("no live piece {id}"))
}

fn run(
    engine: &mut PlacementEngine,
    condition: &dyn ConditionSource,
    motion: &mut RecordingMotion,
) -> TraversalState {
    let (entry, terminal) = engine.collect_program().expect("program endpoints");
    let mut traversal = Traversal::new();
    let mut state = traversal.start(engine.graph_mut(), condition, motion, entry, terminal);
    let mut hops = 0;
    while state == TraversalState::Advancing {
        state = traversal.on_arrived(engine.graph_mut(), condition, motion);
        hops += 1;
        assert!(hops < 64, "runaway traversal");
    }
    state
}

#[test]
fn straight_program_runs_to_the_terminal() {
    let mut engine = engine();
    engine
        .place_chain(&[templates::STRAIGHT, templates::STRAIGHT], Direction::Forward)
        .unwrap();

    let mut motion = RecordingMotion::default();
    let state = run(&mut engine, &FixedCondition(true), &mut motion);
    assert_eq!(state, TraversalState::Finished);
    // start piece + two straights
    assert_eq!(motion.paths.len(), 3);
}

#[test]
fn false_condition_takes_the_no_lane_to_the_merge() {
    let mut engine = engine();
    let mut budget = InstructionBudget::uniform(1);
    engine.place_condition(&mut budget).unwrap();

    let mut motion = RecordingMotion::default();
    let state = run(&mut engine, &FixedCondition(false), &mut motion);
    assert_eq!(state, TraversalState::Finished);
    assert_eq!(motion.paths.len(), 3);
    // the no lane sits at +x
    assert!(motion.paths[1].end().unwrap().x > 0.0);
}

#[test]
fn true_condition_takes_the_yes_lane() {
    let mut engine = engine();
    let mut budget = InstructionBudget::uniform(1);
    engine.place_condition(&mut budget).unwrap();

    let mut motion = RecordingMotion::default();
    let state = run(&mut engine, &FixedCondition(true), &mut motion);
    assert_eq!(state, TraversalState::Finished);
    assert!(motion.paths[1].end().unwrap().x < 0.0);
}

#[test]
fn loop_runs_its_body_once_per_counter_tick() {
    let mut engine = engine();
    let mut budget = InstructionBudget::uniform(1);
    engine.place_loop(&mut budget).unwrap();

    let loop_in = piece_by_id(&engine, templates::NODE_LOOP_IN);
    engine.graph_mut().set_loop_iterations(loop_in, 2);

    let mut motion = RecordingMotion::default();
    let state = run(&mut engine, &FixedCondition(true), &mut motion);
    assert_eq!(state, TraversalState::Finished);
    // start, enter-body, return, enter-body, return, exit-lane, exit
    assert_eq!(motion.paths.len(), 7);
    assert_eq!(engine.graph().loop_counter(loop_in).unwrap().value(), 0);
}

#[test]
fn zero_iteration_loop_skips_its_body() {
    let mut engine = engine();
    let mut budget = InstructionBudget::uniform(1);
    engine.place_loop(&mut budget).unwrap();

    let loop_in = piece_by_id(&engine, templates::NODE_LOOP_IN);
    engine.graph_mut().set_loop_iterations(loop_in, 0);

    let mut motion = RecordingMotion::default();
    let state = run(&mut engine, &FixedCondition(true), &mut motion);
    assert_eq!(state, TraversalState::Finished);
    // start, exit-lane, exit
    assert_eq!(motion.paths.len(), 3);
}

#[test]
fn unlinked_output_is_a_dead_end() {
    let mut engine = engine();
    engine
        .place_chain(&[templates::STRAIGHT], Direction::Forward)
        .unwrap();

    let (entry, _) = engine.collect_program().unwrap();
    // point the run at a terminal it can never reach
    let bogus_terminal = engine.anchor();
    let mut motion = RecordingMotion::default();
    let mut traversal = Traversal::new();
    let mut state = traversal.start(
        engine.graph_mut(),
        &FixedCondition(true),
        &mut motion,
        entry,
        bogus_terminal,
    );
    while state == TraversalState::Advancing {
        state = traversal.on_arrived(engine.graph_mut(), &FixedCondition(true), &mut motion);
    }
    assert_eq!(state, TraversalState::Failed(TraversalFailure::DeadEnd));
}

#[test]
fn starting_on_an_output_port_is_unresolvable() {
    let mut engine = engine();
    let start = piece_by_id(&engine, templates::ROAD_START);
    let out = engine.graph().ports_by_direction(start, Direction::Forward)[0];

    let mut motion = RecordingMotion::default();
    let mut traversal = Traversal::new();
    let state = traversal.start(
        engine.graph_mut(),
        &FixedCondition(true),
        &mut motion,
        out,
        out,
    );
    assert_eq!(state, TraversalState::Failed(TraversalFailure::Unresolvable));
    assert!(motion.paths.is_empty());
}

#[test]
fn stop_cancels_once_and_is_idempotent() {
    let mut engine = engine();
    engine
        .place_chain(&[templates::STRAIGHT], Direction::Forward)
        .unwrap();

    let (entry, terminal) = engine.collect_program().unwrap();
    let mut motion = RecordingMotion::default();
    let mut traversal = Traversal::new();
    let state = traversal.start(
        engine.graph_mut(),
        &FixedCondition(true),
        &mut motion,
        entry,
        terminal,
    );
    assert_eq!(state, TraversalState::Advancing);

    traversal.stop(&mut motion);
    assert_eq!(traversal.state(), TraversalState::Idle);
    assert_eq!(motion.cancels, 1);

    traversal.stop(&mut motion);
    assert_eq!(motion.cancels, 1, "stop on an idle run must not cancel again");

    // arrival events after stop are ignored
    let state = traversal.on_arrived(engine.graph_mut(), &FixedCondition(true), &mut motion);
    assert_eq!(state, TraversalState::Idle);
    assert_eq!(motion.paths.len(), 1);
}
