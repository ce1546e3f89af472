//! Allocator driver and spill loop.
//!
//! Recompute liveness, interference, and coloring from scratch each
//! round; patch up any instruction left with two stack operands by
//! routing one through a scratch temp; repeat until a fixed point. No
//! attempt is made to patch the graph incrementally between rounds.

use ahash::{AHashMap, AHashSet};

use crate::{
    atom::Name,
    context::CompileContext,
    ir::{
        graph, liveness,
        color,
        instr::{Instr, Operand},
        operand::{Location, VarKey},
    },
};

/// Runs liveness → interference → coloring → spill-fix to a fixed point.
/// Returns the (possibly spill-patched) instruction stream, the final
/// color assignment for every name, and the stack frame size in bytes
/// those colors required.
#[must_use]
pub fn allocate(ctx: &mut CompileContext, mut body: Vec<Instr>) -> (Vec<Instr>, AHashMap<VarKey, Location>, u32) {
    let mut unspillable: AHashSet<VarKey> = AHashSet::new();

    loop {
        let live = liveness::analyze(&body);
        let interference = graph::build(&body, &live);

        let mut next_slot = 0u32;
        let colors = color::color(&interference, &unspillable, || {
            next_slot += 1;
            Location::Stack(next_slot * 4)
        });

        if !fix_spills(&mut body, &colors, ctx, &mut unspillable) {
            return (body, colors, next_slot * 4);
        }
    }
}

fn resolve(op: &Operand, colors: &AHashMap<VarKey, Location>) -> Option<Location> {
    match op {
        Operand::Const(_) => None,
        Operand::Var(v) => colors.get(v).copied(),
    }
}

/// Walks `body` (recursing into `if_instr` branches) rewriting any
/// two-operand instruction whose coloring left both operands on the
/// stack: a scratch `unspillable_movl` is inserted immediately before it
/// to shuttle the first operand through a register first. Returns whether
/// any rewrite happened.
fn fix_spills(
    body: &mut Vec<Instr>,
    colors: &AHashMap<VarKey, Location>,
    ctx: &mut CompileContext,
    unspillable: &mut AHashSet<VarKey>,
) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        if let Instr::If(_, then, or_else) = &mut body[i] {
            changed |= fix_spills(then, colors, ctx, unspillable);
            changed |= fix_spills(or_else, colors, ctx, unspillable);
            i += 1;
            continue;
        }

        let both_on_stack = body[i]
            .operand_pair()
            .and_then(|(a, b)| Some((resolve(a, colors)?, resolve(b, colors)?)))
            .is_some_and(|(l1, l2)| l1.is_stack() && l2.is_stack());

        if both_on_stack {
            let (first, _) = body[i].operand_pair().unwrap();
            let first = first.clone();
            let scratch: Name = ctx.allocate_temp().into();
            unspillable.insert(VarKey::Named(scratch.clone()));

            body.insert(i, Instr::UnspillableMovl(first, Operand::name(scratch.clone())));
            body[i + 1].set_first_operand(Operand::name(scratch));
            changed = true;
            i += 2;
            continue;
        }

        i += 1;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{Abi, Platform};

    fn ctx() -> CompileContext {
        CompileContext::new(Abi::new(Platform::Linux), false)
    }

    #[test]
    fn unrelated_names_allocate_without_spilling() {
        let mut c = ctx();
        let x: Name = "x".into();
        let y: Name = "y".into();
        let body = vec![
            Instr::Movl(Operand::Const(1), Operand::name(x.clone())),
            Instr::Movl(Operand::Const(2), Operand::name(y.clone())),
        ];
        let (_body, colors, bytes_used) = allocate(&mut c, body);
        assert!(colors.contains_key(&VarKey::Named(x)));
        assert!(colors.contains_key(&VarKey::Named(y)));
        let _ = bytes_used;
    }

    #[test]
    fn two_stack_operands_after_coloring_get_a_scratch_move_inserted() {
        let mut c = ctx();
        // More simultaneously-live names than registers forces at least
        // two of them onto the stack; `Addl` between two such names must
        // not leave both operands in memory.
        let names: Vec<Name> = (0..8).map(|i| Name::from(format!("n{i}"))).collect();
        let mut body: Vec<Instr> = names
            .iter()
            .enumerate()
            .map(|(i, n)| Instr::Movl(Operand::Const(i as i32), Operand::name(n.clone())))
            .collect();
        for pair in names.windows(2) {
            body.push(Instr::Addl(Operand::name(pair[0].clone()), Operand::name(pair[1].clone())));
        }
        let (final_body, colors, bytes_used) = allocate(&mut c, body);

        for instr in &final_body {
            if let Some((a, b)) = instr.operand_pair() {
                let stack_a = resolve(a, &colors).is_some_and(Location::is_stack);
                let stack_b = resolve(b, &colors).is_some_and(Location::is_stack);
                assert!(!(stack_a && stack_b), "{instr:?} has two stack operands after the spill loop");
            }
        }
        assert!(bytes_used > 0);
    }
}
