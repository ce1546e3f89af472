//! Interference graph construction.
//!
//! All eight physical registers are pre-inserted as nodes so `%esp`/
//! `%ebp` can be excluded from coloring outright and caller-saved
//! registers interfere with whatever is live across a `call` the same
//! way a named temporary would.

use indexmap::IndexMap;

use ahash::AHashSet;

use crate::ir::{
    instr::{syntactic_writes, Instr},
    liveness::{LiveSets, LivePath},
    operand::{Reg, VarKey},
};

/// An undirected graph over [`VarKey`] nodes. Adjacency is stored as an
/// `IndexMap` so iteration order (used to break coloring ties
/// deterministically) matches insertion order rather than hash order.
#[derive(Debug, Default)]
pub struct InterferenceGraph {
    adjacency: IndexMap<VarKey, AHashSet<VarKey>>,
}

impl InterferenceGraph {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self::default();
        for r in Reg::CALLER_SAVED.into_iter().chain(Reg::CALLEE_SAVED).chain(Reg::RESERVED) {
            graph.add_node(VarKey::Reg(r));
        }
        graph
    }

    pub fn add_node(&mut self, v: VarKey) {
        self.adjacency.entry(v).or_default();
    }

    pub fn add_edge(&mut self, a: VarKey, b: VarKey) {
        if a == b {
            return;
        }
        self.add_node(a.clone());
        self.add_node(b.clone());
        self.adjacency.get_mut(&a).unwrap().insert(b.clone());
        self.adjacency.get_mut(&b).unwrap().insert(a);
    }

    #[must_use]
    pub fn neighbors(&self, v: &VarKey) -> Option<&AHashSet<VarKey>> {
        self.adjacency.get(v)
    }

    /// Nodes in insertion order — registers first, then names in the
    /// order they were first written.
    pub fn nodes(&self) -> impl Iterator<Item = &VarKey> {
        self.adjacency.keys()
    }

    #[must_use]
    pub fn degree(&self, v: &VarKey) -> usize {
        self.adjacency.get(v).map_or(0, AHashSet::len)
    }
}

/// Builds the interference graph for a whole instruction sequence, using
/// pre-computed liveness.
#[must_use]
pub fn build(body: &[Instr], live: &LiveSets) -> InterferenceGraph {
    let mut graph = InterferenceGraph::new();
    let mut path = Vec::new();
    walk(body, live, &mut path, &mut graph);
    graph
}

fn walk(body: &[Instr], live: &LiveSets, path: &mut LivePath, graph: &mut InterferenceGraph) {
    for (idx, instr) in body.iter().enumerate() {
        path.push(idx);
        let live_after = live.get(path).cloned().unwrap_or_default();

        match instr {
            Instr::If(_, then, or_else) => {
                for w in syntactic_writes(std::slice::from_ref(instr)) {
                    for v in &live_after {
                        graph.add_edge(w.clone(), v.clone());
                    }
                }
                walk(then, live, path, graph);
                walk(or_else, live, path, graph);
            }
            Instr::Call(_) => {
                // Every caller-saved register interferes with whatever
                // survives the call, and with each other so none is
                // picked as a shared color.
                for w in instr.writes() {
                    for v in &live_after {
                        graph.add_edge(w.clone(), v.clone());
                    }
                }
                for &r in &Reg::CALLER_SAVED {
                    for v in &live_after {
                        graph.add_edge(VarKey::Reg(r), v.clone());
                    }
                }
            }
            _ => {
                for w in instr.writes() {
                    for v in &live_after {
                        if matches!(instr, Instr::Movl(..)) && is_move_source(instr, v) {
                            continue;
                        }
                        graph.add_edge(w.clone(), v.clone());
                    }
                }
            }
        }
        path.pop();
    }
}

/// `movl s, d` does not make `d` interfere with `s` itself — copying a
/// value into its own prior location is fine, and excluding this edge is
/// what lets the allocator eventually coalesce/collapse redundant moves
/// in the peephole pass.
fn is_move_source(instr: &Instr, candidate: &VarKey) -> bool {
    matches!(instr, Instr::Movl(src, _) if src.as_var() == Some(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{atom::Name, ir::{instr::Operand, liveness}};

    #[test]
    fn two_names_simultaneously_live_interfere() {
        let x: Name = "x".into();
        let y: Name = "y".into();
        let body = vec![
            Instr::Movl(Operand::Const(1), Operand::name(x.clone())),
            Instr::Movl(Operand::Const(2), Operand::name(y.clone())),
            Instr::Addl(Operand::name(x.clone()), Operand::name(y.clone())),
        ];
        let live = liveness::analyze(&body);
        let graph = build(&body, &live);
        assert!(graph.neighbors(&VarKey::Named(x.clone())).unwrap().contains(&VarKey::Named(y.clone())));
    }

    #[test]
    fn move_source_does_not_interfere_with_its_own_destination() {
        let x: Name = "x".into();
        let y: Name = "y".into();
        let body = vec![Instr::Movl(Operand::name(x.clone()), Operand::name(y.clone()))];
        let live = liveness::analyze(&body);
        let graph = build(&body, &live);
        assert!(!graph.neighbors(&VarKey::Named(y)).is_some_and(|n| n.contains(&VarKey::Named(x))));
    }

    #[test]
    fn call_makes_caller_saved_registers_interfere_with_live_values() {
        let x: Name = "x".into();
        let body = vec![
            Instr::Movl(Operand::Const(1), Operand::name(x.clone())),
            Instr::Call("add".to_string()),
            Instr::Addl(Operand::Const(0), Operand::name(x.clone())),
        ];
        let live = liveness::analyze(&body);
        let graph = build(&body, &live);
        assert!(graph.neighbors(&VarKey::Reg(Reg::Eax)).unwrap().contains(&VarKey::Named(x)));
    }
}
