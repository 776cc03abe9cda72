//! Wait-for graph construction and cycle search.
//!
//! The graph is intentionally ephemeral: it is rebuilt from the trains'
//! `requesting` fields and the board's holders every tick and thrown away
//! after the search, so no mutable cyclic structure ever outlives a tick.

use rail_core::TrainId;
use rail_fleet::TrainStore;
use rail_track::BlockBoard;

/// Directed wait-for relation over trains: an edge `a → b` means train `a` is
/// blocked on a block currently held by train `b`.
///
/// Stored as index-keyed adjacency lists rather than a hash map so traversal
/// order is ascending `TrainId` — part of the simulation's determinism
/// guarantee.
pub struct WaitForGraph {
    edges: Vec<Vec<TrainId>>,
}

impl WaitForGraph {
    /// Derive the graph from the current `requesting` fields and holders.
    pub fn build(fleet: &TrainStore, board: &BlockBoard) -> Self {
        let mut edges = vec![Vec::new(); fleet.len()];
        for id in fleet.ids() {
            if let Some(wanted) = fleet.get(id).requesting {
                if let Some(owner) = board.holder(wanted) {
                    if owner != id {
                        edges[id.index()].push(owner);
                    }
                }
            }
        }
        Self { edges }
    }

    /// Trains that `id` is waiting on.
    pub fn edges_from(&self, id: TrainId) -> &[TrainId] {
        &self.edges[id.index()]
    }

    /// Three-color depth-first search for a cycle.
    ///
    /// Returns the first cycle discovered (roots tried in ascending id order)
    /// as a closed walk — first and last element are the same train — or
    /// `None` if the graph is acyclic.
    pub fn find_cycle(&self) -> Option<Vec<TrainId>> {
        let n = self.edges.len();
        let mut color  = vec![Color::White; n];
        let mut parent: Vec<Option<TrainId>> = vec![None; n];

        for i in 0..n {
            if color[i] == Color::White {
                if let Some(cycle) = dfs(TrainId(i as u32), &self.edges, &mut color, &mut parent) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

fn dfs(
    u:      TrainId,
    edges:  &[Vec<TrainId>],
    color:  &mut [Color],
    parent: &mut [Option<TrainId>],
) -> Option<Vec<TrainId>> {
    color[u.index()] = Color::Grey;
    for &v in &edges[u.index()] {
        match color[v.index()] {
            Color::White => {
                parent[v.index()] = Some(u);
                if let Some(cycle) = dfs(v, edges, color, parent) {
                    return Some(cycle);
                }
            }
            Color::Grey => {
                // Back-edge u → v: walk parents from u back to v, then close
                // the loop.  Reversing yields the cycle in edge direction.
                let mut cycle = vec![v];
                let mut cur = Some(u);
                while let Some(c) = cur {
                    if c == v {
                        break;
                    }
                    cycle.push(c);
                    cur = parent[c.index()];
                }
                cycle.push(v);
                cycle.reverse();
                return Some(cycle);
            }
            Color::Black => {}
        }
    }
    color[u.index()] = Color::Black;
    None
}
