//! Process-tree accumulation of resident memory.
//!
//! `accumulated(e) = resident(e) + sum(accumulated(c))` over every row `c`
//! whose parent is `e`. Children are found through a parent-id index built
//! once per pass, and the tree is walked post-order with an explicit stack,
//! so deep trees do not grow the call stack.
//!
//! Parent ids come from a snapshot and may form a loop. A row reached again
//! while it is still being resolved has its parent edge dropped: it is
//! treated as a root and its id is recorded in the report.

use child_index::ChildIndex;
use log::warn;
use serde::Serialize;

use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Outcome of one accumulation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccumulationReport {
    pub rows: usize,
    /// Rows whose parent edge closed a loop and was ignored
    pub cycles: Vec<u32>,
}

impl AccumulationReport {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

struct Frame {
    idx: usize,
    next_child: usize,
    sum: u64,
}

/// Memoized resolver over the rows of one table
pub struct Accumulator<'a> {
    rows: &'a mut [Entity],
    children: ChildIndex,
    marks: Vec<Mark>,
    cycles: Vec<u32>,
    visits: usize,
}

impl<'a> Accumulator<'a> {
    /// Clear every cached value and index the rows by parent id.
    pub fn new(rows: &'a mut [Entity]) -> Self {
        for row in rows.iter_mut() {
            row.acc_resident = None;
        }
        let children = ChildIndex::build(rows);
        let marks = vec![Mark::Unvisited; rows.len()];

        Self {
            rows,
            children,
            marks,
            cycles: Vec::new(),
            visits: 0,
        }
    }

    /// Accumulated resident value of the row at `idx`.
    ///
    /// Rows already resolved in this pass return their cached value without
    /// walking their subtree again.
    pub fn resolve(&mut self, idx: usize) -> u64 {
        if self.marks[idx] == Mark::Done {
            return self.rows[idx].accumulated_or_raw();
        }

        let mut stack = vec![self.enter(idx)];

        while let Some(frame) = stack.last_mut() {
            let parent_id = self.rows[frame.idx].id;
            let child = self.children.child(parent_id, frame.next_child);

            let Some(child) = child else {
                let finished = stack.pop();
                if let Some(finished) = finished {
                    self.rows[finished.idx].acc_resident = Some(finished.sum);
                    self.marks[finished.idx] = Mark::Done;
                    if let Some(parent) = stack.last_mut() {
                        parent.sum = parent.sum.saturating_add(finished.sum);
                    }
                }
                continue;
            };

            frame.next_child += 1;
            match self.marks[child] {
                Mark::Done => {
                    frame.sum = frame
                        .sum
                        .saturating_add(self.rows[child].accumulated_or_raw());
                }
                Mark::InProgress => {
                    let id = self.rows[child].id;
                    warn!("process {} closes a parent loop, treating it as a root", id);
                    self.cycles.push(id);
                }
                Mark::Unvisited => {
                    let next = self.enter(child);
                    stack.push(next);
                }
            }
        }

        self.rows[idx].accumulated_or_raw()
    }

    fn enter(&mut self, idx: usize) -> Frame {
        self.marks[idx] = Mark::InProgress;
        self.visits += 1;
        Frame {
            idx,
            next_child: 0,
            sum: self.rows[idx].resident,
        }
    }

    /// Resolve every row, in table order.
    pub fn resolve_all(&mut self) {
        for idx in 0..self.rows.len() {
            self.resolve(idx);
        }
    }

    /// Number of rows entered so far in this pass
    pub fn visits(&self) -> usize {
        self.visits
    }

    pub fn finish(self) -> AccumulationReport {
        AccumulationReport {
            rows: self.rows.len(),
            cycles: self.cycles,
        }
    }
}

/// Run a full accumulation pass over `rows`.
pub fn accumulate_resident(rows: &mut [Entity]) -> AccumulationReport {
    let mut accumulator = Accumulator::new(rows);
    accumulator.resolve_all();
    accumulator.finish()
}

mod child_index {
    use std::collections::HashMap;

    use super::Entity;

    /// Parent id → indices of its direct children, in table order
    pub struct ChildIndex {
        by_parent: HashMap<u32, Vec<usize>>,
    }

    impl ChildIndex {
        pub fn build(rows: &[Entity]) -> Self {
            let mut by_parent: HashMap<u32, Vec<usize>> = HashMap::with_capacity(rows.len());
            for (idx, row) in rows.iter().enumerate() {
                // A row naming itself as parent is a root
                if row.parent != row.id {
                    by_parent.entry(row.parent).or_default().push(idx);
                }
            }
            Self { by_parent }
        }

        pub fn child(&self, parent: u32, nth: usize) -> Option<usize> {
            self.by_parent.get(&parent)?.get(nth).copied()
        }
    }
}
