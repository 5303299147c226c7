//! Randomized Birkhoff–von Neumann rounding for reviewer/paper assignment.
//!
//! Converts a fractional bipartite assignment matrix into a deterministic
//! integral assignment that preserves row and column marginals in
//! expectation, while trying to preserve each paper's per-institution load
//! as well. See [`run_bvn`] for the entry point and `DESIGN.md` at the
//! workspace root for how each module below maps onto that algorithm.
//!
//! Module layout mirrors the dependency order of the algorithm itself,
//! leaves first: [`arith`] underlies [`graph`] and [`load`], both of which
//! [`search`] mutates, which [`driver`] drives to completion.

pub mod arith;
pub mod driver;
pub mod graph;
pub mod load;
pub mod search;

mod config;
mod error;
mod seed;

pub use config::EngineCfg;
pub use error::EngineError;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use arith::{to_grid, GRID};
use graph::{Graph, VertexId};
use load::InstitutionTable;
use rand::Rng;

/// Round `flows` in place using a fresh, wall-clock-seeded RNG.
///
/// `flows` is paper-major: `flows[p * nrevs + r]` is the fractional
/// probability that reviewer `r` is assigned to paper `p`. On success every
/// entry is rewritten to exactly `0.0` or `1.0`. `subsets[r]` is reviewer
/// `r`'s institution label and must be strictly positive.
pub fn run_bvn(
    flows: &mut [f64],
    subsets: &[i64],
    npaps: usize,
    nrevs: usize,
) -> Result<(), EngineError> {
    let mut rng = seed::new_rng();
    run_bvn_with(flows, subsets, npaps, nrevs, &EngineCfg::default(), &mut rng)
}

/// Same contract as [`run_bvn`], but with an injectable RNG and [`EngineCfg`]
/// for reproducible runs and tests.
pub fn run_bvn_with<R: Rng>(
    flows: &mut [f64],
    subsets: &[i64],
    npaps: usize,
    nrevs: usize,
    cfg: &EngineCfg,
    rng: &mut R,
) -> Result<(), EngineError> {
    if subsets.len() != nrevs || flows.len() != npaps * nrevs {
        return Err(EngineError::InvalidShape {
            expected_flows: npaps * nrevs,
            expected_subsets: nrevs,
        });
    }
    for (r, &inst) in subsets.iter().enumerate() {
        if inst <= 0 {
            return Err(EngineError::InvalidSubset { reviewer: r });
        }
    }

    let mut graph = Graph::new(nrevs, npaps);
    let mut table = InstitutionTable::new(npaps);
    let mut cells: Vec<Option<graph::HalfEdgeIdx>> = vec![None; npaps * nrevs];

    for p in 0..npaps {
        for r in 0..nrevs {
            let flat = p * nrevs + r;
            let z = to_grid(flows[flat]);
            if z == 0 {
                continue;
            }
            let reviewer = VertexId(r);
            let paper = VertexId(nrevs + p);
            let e = graph.add_edge_pair(reviewer, paper, z, GRID);
            graph.add_load(reviewer, z);
            graph.add_load(paper, -z);
            table.add(p, subsets[r], z);
            graph.canonicalize(e, GRID);
            cells[flat] = Some(e);
        }
    }

    driver::round(&mut graph, &mut table, subsets, rng, GRID, cfg.max_iterations)?;

    for (flat, cell) in cells.into_iter().enumerate() {
        flows[flat] = match cell {
            Some(e) => arith::from_grid(graph.flow(e)),
            None => 0.0,
        };
    }

    Ok(())
}
