use super::*;
use crate::graph::Graph;

const GRID: i64 = 10_000_000;

fn single_edge_graph() -> (Graph, InstitutionTable, HalfEdgeIdx) {
    let mut g = Graph::new(2, 1);
    let mut t = InstitutionTable::new(1);
    // reviewer 0 -> paper (vertex 2), reviewer 1 unused here.
    let e = g.add_edge_pair(VertexId(0), VertexId(2), 6_000_000, GRID);
    t.add(0, /* institution of reviewer 0 */ 1, 6_000_000);
    (g, t, e)
}

#[test]
fn get_or_create_is_idempotent() {
    let mut t = InstitutionTable::new(1);
    let a = t.get_or_create(0, 5);
    let b = t.get_or_create(0, 5);
    assert_eq!(a, b);
    assert_eq!(t.load(a), 0);
}

#[test]
fn add_accumulates_and_creates_on_demand() {
    let mut t = InstitutionTable::new(1);
    t.add(0, 3, 2_000_000);
    t.add(0, 3, 1_000_000);
    let r = t.find(0, 3).unwrap();
    assert_eq!(t.load(r), 3_000_000);
}

#[test]
fn distinct_institutions_do_not_collide() {
    let mut t = InstitutionTable::new(1);
    t.add(0, 1, 4_000_000);
    t.add(0, 2, 5_000_000);
    assert_eq!(t.load(t.find(0, 1).unwrap()), 4_000_000);
    assert_eq!(t.load(t.find(0, 2).unwrap()), 5_000_000);
}

#[test]
fn update_flow_shifts_residual_and_vertex_loads() {
    let (mut g, mut t, e) = single_edge_graph();
    update_flow(&mut g, &mut t, |_r| 1, e, 2_000_000, GRID);
    assert_eq!(g.flow(e), 4_000_000);
    assert_eq!(g.flow(e.partner()), 6_000_000);
    assert_eq!(g.load(VertexId(0)), -2_000_000); // reviewer load decreases by delta
    assert_eq!(g.load(VertexId(2)), 2_000_000); // paper load increases by delta
}

#[test]
fn update_flow_adjusts_institution_entry_on_forward_direction() {
    let (mut g, mut t, e) = single_edge_graph();
    update_flow(&mut g, &mut t, |_r| 1, e, 2_000_000, GRID);
    let r = t.find(0, 1).unwrap();
    assert_eq!(t.load(r), 4_000_000); // started at 6M, forward delta subtracts 2M
}

#[test]
fn update_flow_on_backward_edge_credits_institution() {
    let (mut g, mut t, e) = single_edge_graph();
    let back = e.partner();
    update_flow(&mut g, &mut t, |_r| 1, back, 1_000_000, GRID);
    let r = t.find(0, 1).unwrap();
    assert_eq!(t.load(r), 7_000_000); // pushing along the backward edge adds to the institution load
}

#[test]
fn update_flow_canonicalizes_once_flow_reaches_grid() {
    let (mut g, mut t, e) = single_edge_graph();
    update_flow(&mut g, &mut t, |_r| 1, e, -4_000_000, GRID); // 6M -> 10M
    assert_eq!(g.live_pairs(), 0);
}
