//! Saturation-degree graph coloring.
//!
//! A max-priority queue picks the most-constrained node at each step.
//! Colors are [`Location`]s: the six allocatable registers first, then
//! stack slots minted on demand by `new_color` once a node's neighbors
//! have exhausted every register.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};

use crate::ir::{
    graph::InterferenceGraph,
    operand::{Location, Reg, VarKey},
};

/// Colors every `Named` node in `graph`. Register nodes are pre-colored to
/// themselves and never revisited. `unspillable` marks nodes that must be
/// colored before ordinary names; `new_color` mints a fresh stack-slot
/// color when no register is free.
pub fn color(
    graph: &InterferenceGraph,
    unspillable: &AHashSet<VarKey>,
    mut new_color: impl FnMut() -> Location,
) -> AHashMap<VarKey, Location> {
    let mut colors: AHashMap<VarKey, Location> = AHashMap::new();
    let mut saturation: AHashMap<VarKey, AHashSet<Location>> = AHashMap::new();
    let mut pending = BinaryHeap::new();

    for node in graph.nodes() {
        if let VarKey::Reg(r) = node {
            colors.insert(node.clone(), Location::Reg(*r));
        }
    }
    for node in graph.nodes() {
        if colors.contains_key(node) {
            continue;
        }
        let mut sat = AHashSet::new();
        if let Some(neighbors) = graph.neighbors(node) {
            for n in neighbors {
                if let Some(&loc) = colors.get(n) {
                    sat.insert(loc);
                }
            }
        }
        saturation.insert(node.clone(), sat);
        pending.push(Entry {
            priority: u8::from(unspillable.contains(node)),
            saturation: saturation[node].len(),
            degree: graph.degree(node),
            node: node.clone(),
        });
    }

    while let Some(top) = pending.pop() {
        if colors.contains_key(&top.node) {
            continue; // stale entry; saturation changed since it was pushed
        }
        let current_sat = saturation.get(&top.node).cloned().unwrap_or_default();
        if current_sat.len() != top.saturation {
            // Re-queue with up-to-date saturation rather than color on stale data.
            pending.push(Entry {
                priority: top.priority,
                saturation: current_sat.len(),
                degree: top.degree,
                node: top.node,
            });
            continue;
        }

        let assigned = pick_color(&current_sat, &mut new_color);
        colors.insert(top.node.clone(), assigned);

        if let Some(neighbors) = graph.neighbors(&top.node) {
            for n in neighbors {
                if colors.contains_key(n) {
                    continue;
                }
                saturation.entry(n.clone()).or_default().insert(assigned);
            }
        }
    }

    colors
}

fn pick_color(taken: &AHashSet<Location>, new_color: &mut impl FnMut() -> Location) -> Location {
    for r in Reg::allocatable() {
        let loc = Location::Reg(r);
        if !taken.contains(&loc) {
            return loc;
        }
    }
    loop {
        let loc = new_color();
        if !taken.contains(&loc) {
            return loc;
        }
    }
}

struct Entry {
    priority: u8,
    saturation: usize,
    degree: usize,
    node: VarKey,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key() == other.cmp_key()
    }
}
impl Eq for Entry {}

impl Entry {
    fn cmp_key(&self) -> (u8, usize, usize) {
        (self.priority, self.saturation, self.degree)
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key().cmp(&other.cmp_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Name;

    #[test]
    fn disjoint_names_can_share_a_register() {
        let mut graph = InterferenceGraph::new();
        let a = VarKey::Named(Name::from("a"));
        let b = VarKey::Named(Name::from("b"));
        graph.add_node(a.clone());
        graph.add_node(b.clone());

        let mut slots = 0u32;
        let colors = color(&graph, &AHashSet::new(), || {
            slots += 1;
            Location::Stack(slots * 4)
        });
        assert_eq!(colors[&a], colors[&b]);
    }

    #[test]
    fn interfering_names_get_distinct_colors() {
        let mut graph = InterferenceGraph::new();
        let a = VarKey::Named(Name::from("a"));
        let b = VarKey::Named(Name::from("b"));
        graph.add_edge(a.clone(), b.clone());

        let mut slots = 0u32;
        let colors = color(&graph, &AHashSet::new(), || {
            slots += 1;
            Location::Stack(slots * 4)
        });
        assert_ne!(colors[&a], colors[&b]);
    }

    #[test]
    fn exhausting_registers_spills_to_a_fresh_stack_slot() {
        let mut graph = InterferenceGraph::new();
        let names: Vec<VarKey> = (0..Reg::allocatable().len() + 1)
            .map(|i| VarKey::Named(Name::from(format!("n{i}"))))
            .collect();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                graph.add_edge(names[i].clone(), names[j].clone());
            }
        }
        let mut slots = 0u32;
        let colors = color(&graph, &AHashSet::new(), || {
            slots += 1;
            Location::Stack(slots * 4)
        });
        assert!(colors.values().any(Location::is_stack));
    }
}
