//! Precedence graph over work items.
//!
//! Built once per run from the items' `blocked_by` sets. The forward
//! direction (item → predecessors) drives earliest-slot computation; the
//! reverse direction (predecessor → successors) is used to release
//! dependents as their predecessors settle, and for diagnostics.
//!
//! Neighbor lists are sorted by item id so every traversal is independent
//! of input order.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3-22.4 (DFS, Topological Sort)

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::models::{Priority, WorkItem};

/// Index-based precedence graph borrowing the run's items.
#[derive(Debug, Clone)]
pub struct PrecedenceGraph<'a> {
    items: &'a [WorkItem],
    index: HashMap<&'a str, usize>,
    blocked_by: Vec<Vec<usize>>,
    blocks: Vec<Vec<usize>>,
    unknown: Vec<(usize, &'a str)>,
}

impl<'a> PrecedenceGraph<'a> {
    /// Builds both adjacency directions.
    ///
    /// When ids repeat, the first occurrence wins the id lookup; duplicates
    /// are reported by [`validate_input`](crate::validation::validate_input).
    /// Predecessor ids with no matching item are kept aside and reported by
    /// [`unknown_references`](Self::unknown_references).
    pub fn build(items: &'a [WorkItem]) -> Self {
        let mut index: HashMap<&'a str, usize> = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            index.entry(item.id.as_str()).or_insert(idx);
        }

        let mut blocked_by = vec![Vec::new(); items.len()];
        let mut blocks = vec![Vec::new(); items.len()];
        let mut unknown = Vec::new();

        for (idx, item) in items.iter().enumerate() {
            // blocked_by is a BTreeSet, so predecessors arrive in id order
            for pred in &item.blocked_by {
                match index.get(pred.as_str()) {
                    Some(&p) => {
                        blocked_by[idx].push(p);
                        blocks[p].push(idx);
                    }
                    None => unknown.push((idx, pred.as_str())),
                }
            }
        }
        for succs in &mut blocks {
            succs.sort_by(|&a, &b| items[a].id.cmp(&items[b].id).then(a.cmp(&b)));
        }

        Self {
            items,
            index,
            blocked_by,
            blocks,
            unknown,
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the graph has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at an index.
    #[inline]
    pub fn item(&self, idx: usize) -> &'a WorkItem {
        &self.items[idx]
    }

    /// Index of an item id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Predecessor indices of an item.
    #[inline]
    pub fn blocked_by(&self, idx: usize) -> &[usize] {
        &self.blocked_by[idx]
    }

    /// Successor indices of an item.
    #[inline]
    pub fn blocks(&self, idx: usize) -> &[usize] {
        &self.blocks[idx]
    }

    /// Ids that must precede `id`.
    pub fn blocked_by_ids(&self, id: &str) -> Vec<&'a str> {
        self.ids(self.index_of(id).map(|i| self.blocked_by(i)))
    }

    /// Ids that `id` blocks.
    pub fn blocks_ids(&self, id: &str) -> Vec<&'a str> {
        self.ids(self.index_of(id).map(|i| self.blocks(i)))
    }

    fn ids(&self, neighbors: Option<&[usize]>) -> Vec<&'a str> {
        neighbors
            .unwrap_or_default()
            .iter()
            .map(|&i| self.items[i].id.as_str())
            .collect()
    }

    /// `(item, predecessor)` pairs naming items not in the input.
    pub fn unknown_references(&self) -> Vec<(&'a str, &'a str)> {
        self.unknown
            .iter()
            .map(|&(idx, pred)| (self.items[idx].id.as_str(), pred))
            .collect()
    }

    /// Earliest slot permitted by the predecessors placed so far.
    ///
    /// `1 + max(slot(p))` over placed predecessors, or slot 1 when none is
    /// placed. Callers must not commit an item while any predecessor is still
    /// unsettled.
    pub fn earliest_slot(&self, idx: usize, slot_of: impl Fn(usize) -> Option<usize>) -> usize {
        self.blocked_by[idx]
            .iter()
            .filter_map(|&p| slot_of(p))
            .max()
            .map_or(1, |latest| latest + 1)
    }

    /// Whether every predecessor of `idx` satisfies `resolved`.
    pub fn predecessors_resolved(&self, idx: usize, resolved: impl Fn(usize) -> bool) -> bool {
        self.blocked_by[idx].iter().all(|&p| resolved(p))
    }

    /// Finds a cycle over `blocked_by` edges.
    ///
    /// Returns the member ids in path order (each blocked by the next, the
    /// last blocked by the first). Roots are visited in id order, so the
    /// reported cycle is deterministic.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut roots: Vec<usize> = (0..self.items.len()).collect();
        roots.sort_by(|&a, &b| self.items[a].id.cmp(&self.items[b].id).then(a.cmp(&b)));

        let mut state = vec![VisitState::Unvisited; self.items.len()];
        let mut path = Vec::new();

        for root in roots {
            if state[root] == VisitState::Unvisited {
                if let Some(cycle) = self.cycle_dfs(root, &mut state, &mut path) {
                    return Some(
                        cycle
                            .into_iter()
                            .map(|i| self.items[i].id.clone())
                            .collect(),
                    );
                }
            }
        }
        None
    }

    fn cycle_dfs(
        &self,
        node: usize,
        state: &mut [VisitState],
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        state[node] = VisitState::OnPath;
        path.push(node);

        for &next in &self.blocked_by[node] {
            match state[next] {
                VisitState::OnPath => {
                    // Back edge: the cycle is the path suffix starting at `next`.
                    let start = path.iter().position(|&n| n == next).unwrap_or(0);
                    return Some(path[start..].to_vec());
                }
                VisitState::Unvisited => {
                    if let Some(cycle) = self.cycle_dfs(next, state, path) {
                        return Some(cycle);
                    }
                }
                VisitState::Done => {}
            }
        }

        path.pop();
        state[node] = VisitState::Done;
        None
    }

    /// Predecessor-first order, lowest `(priority, id)` first among ready items.
    ///
    /// Returns `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let mut waiting: Vec<usize> = self.blocked_by.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<(Priority, &'a str, usize)>> = waiting
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w == 0)
            .map(|(i, _)| Reverse(self.order_entry(i)))
            .collect();

        let mut order = Vec::with_capacity(self.items.len());
        while let Some(Reverse((_, _, idx))) = ready.pop() {
            order.push(idx);
            for &succ in &self.blocks[idx] {
                waiting[succ] -= 1;
                if waiting[succ] == 0 {
                    ready.push(Reverse(self.order_entry(succ)));
                }
            }
        }

        (order.len() == self.items.len()).then_some(order)
    }

    /// Heap entry ordering items by `(priority, id, index)`.
    pub(crate) fn order_entry(&self, idx: usize) -> (Priority, &'a str, usize) {
        let item = &self.items[idx];
        (item.priority, item.id.as_str(), idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnPath,
    Done,
}
