//! Backward liveness analysis.
//!
//! Each instruction's `live_after` set is threaded through as a side
//! table keyed by position rather than mutated onto the instruction
//! itself. `if_instr` nodes recurse, so a flat `Vec` index alone would
//! not locate a nested instruction; a path (a stack of indices) is used
//! instead.

use ahash::AHashSet;

use crate::ir::{instr::Instr, operand::VarKey};

/// `live_after` sets, addressed by the same path a depth-first walk of the
/// instruction tree visits nodes in: a top-level index, then zero or more
/// `(branch_is_then, index)` steps into nested `if_instr` bodies.
pub type LivePath = Vec<usize>;

#[derive(Debug, Default)]
pub struct LiveSets {
    table: ahash::AHashMap<LivePath, AHashSet<VarKey>>,
}

impl LiveSets {
    #[must_use]
    pub fn get(&self, path: &LivePath) -> Option<&AHashSet<VarKey>> {
        self.table.get(path)
    }
}

/// Runs liveness over a whole instruction sequence, starting from the
/// empty live-out set (nothing is live after the final instruction).
#[must_use]
pub fn analyze(body: &[Instr]) -> LiveSets {
    let mut sets = LiveSets::default();
    let mut path = Vec::new();
    walk_backward(body, &AHashSet::new(), &mut path, &mut sets);
    sets
}

/// Walks `body` tail-to-head, returning the live set immediately *before*
/// the first instruction (i.e. what the caller's own `live_after` should
/// be updated to, for callers that sit above a nested `if_instr`).
fn walk_backward(body: &[Instr], live_out: &AHashSet<VarKey>, path: &mut LivePath, sets: &mut LiveSets) -> AHashSet<VarKey> {
    let mut live = live_out.clone();
    for (idx, instr) in body.iter().enumerate().rev() {
        path.push(idx);
        sets.table.insert(path.clone(), live.clone());

        if let Instr::If(_, then, or_else) = instr {
            let then_live = walk_backward(then, &live, path, sets);
            let else_live = walk_backward(or_else, &live, path, sets);
            live = then_live.union(&else_live).cloned().collect();
        }

        for w in instr.writes() {
            live.remove(&w);
        }
        live.extend(instr.reads());

        path.pop();
    }
    live
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        atom::Name,
        ir::instr::Operand,
    };

    #[test]
    fn dead_write_has_empty_live_after() {
        let n: Name = "x".into();
        let body = vec![Instr::Movl(Operand::Const(1), Operand::name(n))];
        let sets = analyze(&body);
        assert!(sets.get(&vec![0]).unwrap().is_empty());
    }

    #[test]
    fn a_read_later_keeps_a_name_live_across_the_write_before_it() {
        let x: Name = "x".into();
        let y: Name = "y".into();
        let body = vec![
            Instr::Movl(Operand::Const(1), Operand::name(x.clone())),
            Instr::Movl(Operand::name(x.clone()), Operand::name(y)),
        ];
        let sets = analyze(&body);
        assert!(sets.get(&vec![0]).unwrap().contains(&VarKey::Named(x)));
    }

    #[test]
    fn if_instr_merges_live_out_of_both_branches() {
        let a: Name = "a".into();
        let b: Name = "b".into();
        let test: Name = "t".into();
        let then = vec![Instr::Movl(Operand::Const(1), Operand::name(a.clone()))];
        let or_else = vec![Instr::Movl(Operand::Const(2), Operand::name(b.clone()))];
        let body = vec![
            Instr::If(Operand::name(test), then, or_else),
            Instr::Addl(Operand::name(a), Operand::name(b)),
        ];
        let sets = analyze(&body);
        let before_if = sets.get(&vec![0]).unwrap();
        assert!(before_if.contains(&VarKey::Named("t".into())));
    }
}
