//! Augmenting-path/cycle search and randomized flow push.
//!
//! Purpose
//! - This is the one component that actually mutates flow. Given a seed
//!   vertex it walks the residual graph, recursing one live edge at a time,
//!   until it either closes a cycle, closes a path (if path mode is on), or
//!   runs out of edges. On closure it samples a push direction so that each
//!   edge's expected final value equals its current fractional flow, then
//!   applies that push to every edge on the closing segment.
//!
//! Why recursive with a parallel explicit stack
//! - The natural statement of "walk until you return to something you've
//!   seen, then unwind applying residual bounds along the way" is a DFS with
//!   shared mutable search state threaded through the call chain, the same
//!   shape as `oriented_edge`'s `DfsRunner`, generalized from a
//!   best-value branch-and-bound search to a first-closure-wins augmenting
//!   search (there is no notion of "best" here; the first closing structure
//!   found is the one that gets pushed). Recursion depth is bounded by the
//!   number of live edges, since each descent marks its edge visited.
//!
//! Marking scopes (load-bearing)
//! - Edge-visited and institution-entry-visited marks are undone on return
//!   from `go`, so they are scoped to the current root-to-leaf path.
//! - Vertex-visited marks (`vertex_visited`) are *not* undone inside `go`;
//!   they persist for the whole top-level [`SearchPass::run`] call and are
//!   reset once per driver pass, not once per seed (see [`crate::driver`]).

use rand::Rng;

use crate::arith::{ceil_grid, floor_grid, is_integral};
use crate::graph::{Graph, HalfEdgeIdx, VertexId};
use crate::load::{self, InstRef, InstitutionTable};

/// One augmenting-path/cycle search rooted at a single seed vertex.
///
/// Borrows the graph, institution table, and RNG for the lifetime of one
/// driver pass (many [`SearchPass::run`] calls in a row, one per candidate
/// seed), since `vertex_visited` must survive across those calls within a
/// pass but is reset between passes by the driver.
pub struct SearchPass<'a, R: Rng> {
    graph: &'a mut Graph,
    table: &'a mut InstitutionTable,
    reviewer_institution: &'a [i64],
    rng: &'a mut R,
    grid: i64,
    vertex_visited: Vec<bool>,
    edge_visited: Vec<bool>,
    stack: Vec<HalfEdgeIdx>,
    fw: i64,
    bw: i64,
    btm: usize,
}

impl<'a, R: Rng> SearchPass<'a, R> {
    pub fn new(
        graph: &'a mut Graph,
        table: &'a mut InstitutionTable,
        reviewer_institution: &'a [i64],
        rng: &'a mut R,
        grid: i64,
    ) -> Self {
        let n = graph.num_vertices();
        let edge_slots = graph.half_edge_count();
        Self {
            graph,
            table,
            reviewer_institution,
            rng,
            grid,
            vertex_visited: vec![false; n],
            edge_visited: vec![false; edge_slots],
            stack: Vec::new(),
            fw: 0,
            bw: 0,
            btm: 0,
        }
    }

    /// Clear vertex-visited marks. Called once per driver pass, before the
    /// first seed is tried; *not* between seeds within the same pass.
    pub fn reset_vertex_marks(&mut self) {
        self.vertex_visited.iter_mut().for_each(|v| *v = false);
    }

    /// Try to find and push an augmenting structure rooted at `seed`.
    /// `path_mode` selects whether an augmenting path (not just a cycle) is
    /// an acceptable closure. Returns whether a push happened.
    pub fn run(&mut self, seed: VertexId, path_mode: bool) -> bool {
        self.stack.clear();
        self.fw = 0;
        self.bw = 0;
        self.btm = 0;
        self.go(seed, None, path_mode)
    }

    fn go(&mut self, x: VertexId, incoming: Option<HalfEdgeIdx>, path_mode: bool) -> bool {
        if let Some(y) = incoming {
            self.stack.push(y);
        }
        if self.graph.is_reviewer(x) {
            self.go_reviewer(x, incoming, path_mode)
        } else {
            self.go_paper(x, incoming, path_mode)
        }
    }

    fn go_reviewer(&mut self, x: VertexId, incoming: Option<HalfEdgeIdx>, path_mode: bool) -> bool {
        if self.vertex_visited[x.0] {
            self.fw = self.grid;
            self.bw = self.grid;
            self.btm = self.first_stack_index(|g, e| g.tail(e) == x);
            return true;
        }

        if incoming.is_some() && path_mode {
            let c = self.graph.load(x);
            if !is_integral(c) {
                self.fw = ceil_grid(c) - c;
                self.bw = c - floor_grid(c);
                self.btm = 0;
                return true;
            }
        }

        self.vertex_visited[x.0] = true;

        let Some(t) = self.pick_unvisited(x) else {
            self.fw = 0;
            self.bw = 0;
            return false;
        };

        self.edge_visited[t.0] = true;
        self.edge_visited[t.partner().0] = true;
        let ret = self.go(self.graph.head(t), Some(t), path_mode);
        self.edge_visited[t.0] = false;
        self.edge_visited[t.partner().0] = false;
        self.fw = self.fw.min(self.graph.flow(t));
        self.bw = self.bw.min(self.graph.flow(t.partner()));

        self.maybe_push(t, incoming, path_mode, x, None);

        ret
    }

    fn go_paper(&mut self, x: VertexId, incoming: Option<HalfEdgeIdx>, path_mode: bool) -> bool {
        let paper = self.graph.paper_index(x);
        let yi = incoming.map(|y| self.institution_of_edge_source(paper, y));

        // Paper "even" cycle: we have looped back to an institution entry
        // already visited earlier on this same root-to-leaf path.
        if let Some(yi) = yi {
            if self.table.is_visited(yi) {
                self.fw = self.grid;
                self.bw = self.grid;
                let inst = self.table.institution(yi);
                self.btm = self.first_stack_index(|g, e| {
                    g.tail(e) == x && self.reviewer_institution[g.head(e).0] == inst
                });
                return true;
            }
        }

        // Paper "odd" cycle: we have returned to an already-visited paper
        // through a still-fractional institution.
        if let Some(yi) = yi {
            let ci_yi = self.table.load(yi);
            if self.vertex_visited[x.0] && !is_integral(ci_yi) {
                self.fw = ci_yi - floor_grid(ci_yi);
                self.bw = ceil_grid(ci_yi) - ci_yi;
                self.btm = 0;
                let mut wi = None;
                for (i, &e) in self.stack.iter().enumerate() {
                    if self.graph.tail(e) != x {
                        continue;
                    }
                    let w = self.institution_of_edge_target(paper, e);
                    if !is_integral(self.table.load(w)) {
                        self.btm = i;
                        wi = Some(w);
                        break;
                    }
                }
                if let Some(wi) = wi {
                    let ci_wi = self.table.load(wi);
                    self.fw = self.fw.min(ceil_grid(ci_wi) - ci_wi);
                    self.bw = self.bw.min(ci_wi - floor_grid(ci_wi));
                }
                return true;
            }
        }

        // Paper path.
        if let Some(yi) = yi {
            if incoming.is_some() && path_mode {
                let c = self.graph.load(x);
                let ci_yi = self.table.load(yi);
                if !is_integral(c) && !is_integral(ci_yi) {
                    self.fw = (ceil_grid(c) - c).min(ci_yi - floor_grid(ci_yi));
                    self.bw = (c - floor_grid(c)).min(ceil_grid(ci_yi) - ci_yi);
                    self.btm = 0;
                    return true;
                }
            }
        }

        let same_institution_only = yi.is_some_and(|yi| is_integral(self.table.load(yi)));
        let t = if same_institution_only {
            let inst = self.table.institution(yi.unwrap());
            self.pick_paper_edge(x, Some(inst))
        } else {
            self.pick_any_fractional_paper_edge(x, paper)
        };

        let Some(t) = t else {
            self.fw = 0;
            self.bw = 0;
            return false;
        };

        let zi = self.institution_of_edge_target(paper, t);
        self.table.set_visited(zi, true);
        self.edge_visited[t.0] = true;
        self.edge_visited[t.partner().0] = true;
        if !is_integral(self.table.load(zi)) {
            self.vertex_visited[x.0] = true;
        }

        let ret = self.go(self.graph.head(t), Some(t), path_mode);

        self.table.set_visited(zi, false);
        self.edge_visited[t.0] = false;
        self.edge_visited[t.partner().0] = false;
        self.fw = self.fw.min(self.graph.flow(t));
        self.bw = self.bw.min(self.graph.flow(t.partner()));

        self.maybe_push(t, incoming, path_mode, x, Some(zi));

        // Pass-through bookkeeping: tighten by both the outgoing and
        // incoming institution gaps so the push (wherever it lands, maybe
        // further up the call chain) honours feasibility at this paper too.
        if let Some(yi) = yi {
            if yi != zi {
                let ci_zi = self.table.load(zi);
                self.fw = self.fw.min(ceil_grid(ci_zi) - ci_zi);
                self.bw = self.bw.min(ci_zi - floor_grid(ci_zi));
                let ci_yi = self.table.load(yi);
                self.fw = self.fw.min(ci_yi - floor_grid(ci_yi));
                self.bw = self.bw.min(ceil_grid(ci_yi) - ci_yi);
            }
        }

        ret
    }

    /// Fires exactly once per successful search, at the frame whose own
    /// outgoing edge is the edge recorded at `self.btm`.
    fn maybe_push(
        &mut self,
        t: HalfEdgeIdx,
        incoming: Option<HalfEdgeIdx>,
        path_mode: bool,
        x: VertexId,
        zi: Option<InstRef>,
    ) {
        if self.stack.get(self.btm) != Some(&t) || self.fw + self.bw == 0 {
            return;
        }
        if incoming.is_none() && path_mode {
            // Paths always begin at the seed's own first edge (btm == 0),
            // so this is exactly the frame where that happens: fold in the
            // seed vertex's own load gap (and, for a paper seed, its
            // outgoing institution's gap too).
            let c = self.graph.load(x);
            self.fw = self.fw.min(c - floor_grid(c));
            self.bw = self.bw.min(ceil_grid(c) - c);
            if let Some(zi) = zi {
                let ci = self.table.load(zi);
                self.fw = self.fw.min(ceil_grid(ci) - ci);
                self.bw = self.bw.min(ci - floor_grid(ci));
            }
        }
        self.apply_push();
    }

    /// Sample forward/backward and push flow along the closed segment.
    ///
    /// Forward (`delta = +GRID` direction) is chosen with probability
    /// `bw / (fw + bw)`, the complement of its own residual, so each edge's
    /// expected final flow equals its current fractional flow. See
    /// DESIGN.md for the empirical check against a worked two-reviewer
    /// example pinned by a test in `lib.rs`.
    fn apply_push(&mut self) {
        let denom = (self.fw + self.bw) as f64;
        let threshold = self.bw as f64 / denom;
        let sample: f64 = self.rng.gen();
        let (sign, magnitude) = if sample < threshold {
            (1i64, self.fw)
        } else {
            (-1i64, self.bw)
        };
        let delta = sign * magnitude;
        let grid = self.grid;
        let segment: Vec<HalfEdgeIdx> = self.stack[self.btm..].to_vec();
        let reviewer_institution = self.reviewer_institution;
        for e in segment {
            load::update_flow(
                self.graph,
                self.table,
                |r: VertexId| reviewer_institution[r.0],
                e,
                delta,
                grid,
            );
        }
        self.fw = 0;
        self.bw = 0;
    }

    fn institution_of_edge_source(&self, paper: usize, y: HalfEdgeIdx) -> InstRef {
        let reviewer = self.graph.tail(y);
        let inst = self.reviewer_institution[reviewer.0];
        self.table
            .find(paper, inst)
            .expect("a live edge from a reviewer implies that institution was registered at setup")
    }

    fn institution_of_edge_target(&self, paper: usize, t: HalfEdgeIdx) -> InstRef {
        let reviewer = self.graph.head(t);
        let inst = self.reviewer_institution[reviewer.0];
        self.table
            .find(paper, inst)
            .expect("a live edge to a reviewer implies that institution was registered at setup")
    }

    fn pick_unvisited(&self, x: VertexId) -> Option<HalfEdgeIdx> {
        for e in self.graph.adjacency(x) {
            if !self.edge_visited[e.0] {
                return Some(e);
            }
        }
        None
    }

    /// `institution = None` means "any institution"; `Some(i)` restricts to
    /// edges whose reviewer endpoint belongs to institution `i`.
    fn pick_paper_edge(&self, x: VertexId, institution: Option<i64>) -> Option<HalfEdgeIdx> {
        for e in self.graph.adjacency(x) {
            if self.edge_visited[e.0] {
                continue;
            }
            if let Some(inst) = institution {
                if self.reviewer_institution[self.graph.head(e).0] != inst {
                    continue;
                }
            }
            return Some(e);
        }
        None
    }

    fn pick_any_fractional_paper_edge(&self, x: VertexId, paper: usize) -> Option<HalfEdgeIdx> {
        for (_, entry) in self.table.entries(paper) {
            if is_integral(entry.load) {
                continue;
            }
            if let Some(e) = self.pick_paper_edge(x, Some(entry.institution)) {
                return Some(e);
            }
        }
        None
    }

    fn first_stack_index(&self, pred: impl Fn(&Graph, HalfEdgeIdx) -> bool) -> usize {
        self.stack
            .iter()
            .position(|&e| pred(self.graph, e))
            .expect("a repeated-visit closure implies the closing edge is already on the stack")
    }
}

#[cfg(test)]
mod tests;
