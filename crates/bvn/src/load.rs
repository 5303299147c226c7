//! Load bookkeeping: vertex loads and the per-paper-institution sparse table.
//!
//! Purpose
//! - `Graph` (see [`crate::graph`]) only knows about flows and adjacency.
//!   Everything about *who* a flow belongs to for institution-preservation
//!   purposes lives here: `ci[p, i]`, the running load paper `p` has
//!   received from institution `i`.
//!
//! Why a `Vec<Vec<_>>` instead of a literal linked list
//! - Per-paper institution degree is small, so a small `Vec` per paper
//!   gives the same linear-scan lookup and the same "never
//!   garbage-collected" lifetime that a hand-rolled list of
//!   (institution-id, current-load, visited-flag) nodes would, without
//!   hand-rolling list nodes in the arena. An idiomatic substitution, not a
//!   behavior change (see DESIGN.md).

use crate::graph::{Graph, HalfEdgeIdx, VertexId};

/// One (institution, running load, visited) entry at a single paper.
#[derive(Clone, Copy, Debug)]
pub struct InstEntry {
    pub institution: i64,
    pub load: i64,
    pub visited: bool,
}

/// Index of an [`InstEntry`] within a paper's row: `(paper_index, slot)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstRef {
    pub paper: usize,
    pub slot: usize,
}

/// Per-paper institution load tables, one row per paper.
#[derive(Clone, Debug)]
pub struct InstitutionTable {
    rows: Vec<Vec<InstEntry>>,
}

impl InstitutionTable {
    pub fn new(npaps: usize) -> Self {
        Self {
            rows: vec![Vec::new(); npaps],
        }
    }

    /// Find the entry for `(paper, institution)`, if any, without creating one.
    pub fn find(&self, paper: usize, institution: i64) -> Option<InstRef> {
        self.rows[paper]
            .iter()
            .position(|e| e.institution == institution)
            .map(|slot| InstRef { paper, slot })
    }

    /// Find-or-create the entry for `(paper, institution)`.
    pub fn get_or_create(&mut self, paper: usize, institution: i64) -> InstRef {
        if let Some(r) = self.find(paper, institution) {
            return r;
        }
        self.rows[paper].push(InstEntry {
            institution,
            load: 0,
            visited: false,
        });
        InstRef {
            paper,
            slot: self.rows[paper].len() - 1,
        }
    }

    /// Add `w` to the running load at `(paper, institution)`, creating the
    /// entry on demand.
    pub fn add(&mut self, paper: usize, institution: i64, w: i64) -> InstRef {
        let r = self.get_or_create(paper, institution);
        self.rows[r.paper][r.slot].load += w;
        r
    }

    #[inline]
    pub fn entry(&self, r: InstRef) -> InstEntry {
        self.rows[r.paper][r.slot]
    }

    #[inline]
    pub fn load(&self, r: InstRef) -> i64 {
        self.rows[r.paper][r.slot].load
    }

    #[inline]
    pub fn institution(&self, r: InstRef) -> i64 {
        self.rows[r.paper][r.slot].institution
    }

    #[inline]
    pub fn set_visited(&mut self, r: InstRef, visited: bool) {
        self.rows[r.paper][r.slot].visited = visited;
    }

    #[inline]
    pub fn is_visited(&self, r: InstRef) -> bool {
        self.rows[r.paper][r.slot].visited
    }

    /// Iterate over all entries at `paper` (paired with their `InstRef`).
    pub fn entries(&self, paper: usize) -> impl Iterator<Item = (InstRef, InstEntry)> + '_ {
        self.rows[paper]
            .iter()
            .enumerate()
            .map(move |(slot, e)| (InstRef { paper, slot }, *e))
    }
}

/// Apply flow change `delta` to the forward half-edge `e`: shifts `f[e]` and
/// its partner, adjusts both endpoints' vertex loads, updates the
/// paper-institution entry on whichever endpoint is a paper, and finally
/// canonicalizes the pair if it has become integral.
///
/// `reviewer_institution` maps a reviewer `VertexId` to its institution id
/// (`subsets[r]` in the external contract); it is threaded in rather than
/// stored on `Graph` so the graph stays free of any reviewer-specific data.
pub fn update_flow(
    graph: &mut Graph,
    table: &mut InstitutionTable,
    reviewer_institution: impl Fn(VertexId) -> i64,
    e: HalfEdgeIdx,
    delta: i64,
    grid: i64,
) {
    let (u, v) = graph.endpoints(e);
    graph.apply_flow_delta(e, delta);
    graph.add_load(u, -delta);
    graph.add_load(v, delta);

    if graph.is_paper(v) {
        // Forward direction lands on a paper: that paper's institution load
        // from the sending reviewer's institution loses `delta`.
        let paper = graph.paper_index(v);
        let inst = reviewer_institution(u);
        table.add(paper, inst, -delta);
    } else if graph.is_paper(u) {
        // Forward direction leaves a paper (this is `e`'s partner direction
        // from the paper's perspective): that paper's institution load from
        // the receiving reviewer's institution gains `delta`.
        let paper = graph.paper_index(u);
        let inst = reviewer_institution(v);
        table.add(paper, inst, delta);
    }

    graph.canonicalize(e, grid);
}

#[cfg(test)]
mod tests;
