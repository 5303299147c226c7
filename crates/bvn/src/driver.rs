//! Outer loop: alternate path-mode and cycle-mode passes until no fractional
//! edge remains.
//!
//! Each pass resets vertex-visited marks once and then tries seeds in index
//! order, stopping at the first one that closes and pushes. A successful
//! push restarts from the path-mode pass, since cheaper augmenting paths
//! are preferred over cycles whenever one is available, rather than
//! alternating mechanically.

use rand::Rng;

use crate::arith::is_integral;
use crate::error::EngineError;
use crate::graph::{Graph, VertexId};
use crate::load::InstitutionTable;
use crate::search::SearchPass;

/// Run one phase over `seeds` in order, stopping at the first push.
fn try_phase<R: Rng>(
    graph: &mut Graph,
    table: &mut InstitutionTable,
    reviewer_institution: &[i64],
    rng: &mut R,
    grid: i64,
    path_mode: bool,
    seeds: &[VertexId],
) -> bool {
    let mut pass = SearchPass::new(graph, table, reviewer_institution, rng, grid);
    pass.reset_vertex_marks();
    for &v in seeds {
        if pass.run(v, path_mode) {
            return true;
        }
    }
    false
}

/// Repeatedly search-and-push until no live edge pair remains.
///
/// `max_iterations` bounds the number of successful pushes this call will
/// perform before giving up with [`EngineError::NotTerminating`], since no
/// proof is attempted here that every feasible input always admits a push
/// while live edges remain.
pub fn round<R: Rng>(
    graph: &mut Graph,
    table: &mut InstitutionTable,
    reviewer_institution: &[i64],
    rng: &mut R,
    grid: i64,
    max_iterations: usize,
) -> Result<(), EngineError> {
    let all_vertices: Vec<VertexId> = (0..graph.num_vertices()).map(VertexId).collect();

    let mut passes = 0usize;
    while graph.live_pairs() > 0 {
        if passes >= max_iterations {
            return Err(EngineError::NotTerminating {
                live_edges: graph.live_pairs(),
                passes,
            });
        }
        passes += 1;

        let fractional: Vec<VertexId> = all_vertices
            .iter()
            .copied()
            .filter(|&v| !is_integral(graph.load(v)))
            .collect();
        if try_phase(graph, table, reviewer_institution, rng, grid, true, &fractional) {
            continue;
        }
        if try_phase(graph, table, reviewer_institution, rng, grid, false, &all_vertices) {
            continue;
        }
        return Err(EngineError::NotTerminating {
            live_edges: graph.live_pairs(),
            passes,
        });
    }
    Ok(())
}
