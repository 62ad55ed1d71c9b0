//! Tree ordering of the primary table for display.
//!
//! Rows are grouped under their parent, roots first. Rows that only hang
//! off a parent loop are emitted as extra roots so every row shows up once.

use std::collections::{HashMap, HashSet};

use crate::core::entity::Entity;

/// A row position in the flattened tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedRow {
    /// Index into the table rows
    pub index: usize,
    pub depth: usize,
    pub is_last: bool,
    /// For each ancestor level, whether that ancestor was the last sibling
    pub parent_chain: Vec<bool>,
}

impl FlattenedRow {
    /// Box-drawing prefix placed before the command column.
    ///
    /// Each ancestor level adds a guide unless that ancestor closed its
    /// sibling list; the row itself gets a branch marker below the roots.
    pub fn indent(&self) -> String {
        let guides = self
            .parent_chain
            .iter()
            .map(|&closed| if closed { "  " } else { "│ " });
        let branch = match (self.depth, self.is_last) {
            (0, _) => None,
            (_, true) => Some("└─"),
            (_, false) => Some("├─"),
        };
        guides.chain(branch).collect()
    }
}

/// Flatten `rows` in tree order, largest accumulated subtree first.
pub fn flatten_rows(rows: &[Entity]) -> Vec<FlattenedRow> {
    let ids: HashSet<u32> = rows.iter().map(|r| r.id).collect();

    let mut children: HashMap<u32, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        if row.parent == row.id || !ids.contains(&row.parent) {
            roots.push(idx);
        } else {
            children.entry(row.parent).or_default().push(idx);
        }
    }

    let by_size = |a: &usize, b: &usize| {
        rows[*b]
            .accumulated_or_raw()
            .cmp(&rows[*a].accumulated_or_raw())
            .then(rows[*a].id.cmp(&rows[*b].id))
    };
    roots.sort_by(by_size);
    for list in children.values_mut() {
        list.sort_by(by_size);
    }

    let mut visited = vec![false; rows.len()];
    let mut result = Vec::with_capacity(rows.len());

    let extra_roots: Vec<usize> = (0..rows.len()).collect();
    for root in roots.iter().chain(extra_roots.iter()).copied() {
        if visited[root] {
            continue;
        }
        let mut stack = vec![(root, 0usize, true, Vec::new())];
        while let Some((idx, depth, is_last, chain)) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            if let Some(kids) = children.get(&rows[idx].id) {
                let pending: Vec<usize> = kids.iter().copied().filter(|&k| !visited[k]).collect();
                let mut child_chain = chain.clone();
                if depth > 0 {
                    child_chain.push(is_last);
                }
                // Reverse so the first child is popped first
                for (pos, &kid) in pending.iter().enumerate().rev() {
                    let kid_is_last = pos + 1 == pending.len();
                    stack.push((kid, depth + 1, kid_is_last, child_chain.clone()));
                }
            }

            result.push(FlattenedRow {
                index: idx,
                depth,
                is_last,
                parent_chain: chain,
            });
        }
    }

    result
}
