//! Cycle structure of the reference graph.
//!
//! Targets are the content nodes references finally lead to. There is an
//! edge from target `a` to target `b` when `a`'s subtree contains a
//! reference leading to `b`. Targets in one strongly connected component
//! can reach each other.

use std::collections::HashMap;

use super::{GroundedDoc, NodeId};

#[derive(Debug, Default)]
pub struct ReferenceCycles {
    component: HashMap<NodeId, usize>,
}

impl ReferenceCycles {
    pub fn new(doc: &GroundedDoc) -> Self {
        let mut ids: Vec<NodeId> = Vec::new();
        let mut dense: HashMap<NodeId, usize> = HashMap::new();
        for node in &doc.nodes {
            if let Some(id) = node.reference_target().and_then(|t| doc.final_target(t)) {
                dense.entry(id).or_insert_with(|| {
                    ids.push(id);
                    ids.len() - 1
                });
            }
        }
        let succ: Vec<Vec<usize>> = ids
            .iter()
            .map(|id| {
                references_within(doc, *id)
                    .iter()
                    .filter_map(|t| dense.get(t).copied())
                    .collect()
            })
            .collect();

        let component = strongly_connected(&succ)
            .into_iter()
            .enumerate()
            .map(|(i, c)| (ids[i], c))
            .collect();
        ReferenceCycles { component }
    }

    /// Whether `a` and `b` are the same target or reach each other.
    pub fn same_cycle(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return true;
        }
        match (self.component.get(&a), self.component.get(&b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

/// Final targets of every reference inside the subtree at `root`.
fn references_within(doc: &GroundedDoc, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = doc.node(id) else {
            continue;
        };
        if let Some(target) = node.reference_target() {
            out.extend(doc.final_target(target));
            continue;
        }
        stack.extend(node.entries().iter().map(|e| e.value));
        stack.extend(node.items().iter().copied());
    }
    out
}

/// Tarjan's algorithm without recursion. Returns the component index of
/// every vertex.
fn strongly_connected(succ: &[Vec<usize>]) -> Vec<usize> {
    let n = succ.len();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut low = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut component = vec![0; n];
    let mut next_index = 0;
    let mut next_component = 0;

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }
        let mut work = vec![(root, 0usize)];
        while let Some((v, i)) = work.pop() {
            if i == 0 {
                index[v] = Some(next_index);
                low[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }
            if let Some(&w) = succ[v].get(i) {
                work.push((v, i + 1));
                match index[w] {
                    None => work.push((w, 0)),
                    Some(iw) if on_stack[w] => low[v] = low[v].min(iw),
                    Some(_) => {}
                }
                continue;
            }
            if Some(low[v]) == index[v] {
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component[w] = next_component;
                    if w == v {
                        break;
                    }
                }
                next_component += 1;
            }
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[v]);
            }
        }
    }
    component
}
